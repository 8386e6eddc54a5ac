use crate::catalog::SecretLeaf;
use crate::domain::SecretMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    fn step(self, version: u32) -> Option<u32> {
        match self {
            Self::Forward => version.checked_add(1),
            Self::Backward => version.checked_sub(1),
        }
    }
}

/// Next live version from `from` in `direction`, skipping destroyed slots.
/// Returns `None` as soon as a version number is missing from the history.
pub fn advance(metadata: &SecretMetadata, from: u32, direction: Direction) -> Option<u32> {
    let mut probe = direction.step(from)?;
    loop {
        let info = metadata.get(probe)?;
        if !info.destroyed {
            return Some(info.version);
        }
        probe = direction.step(probe)?;
    }
}

/// Moves the leaf's selected version; `false` means the selection stayed put.
pub fn cycle(leaf: &mut SecretLeaf, direction: Direction) -> bool {
    match advance(&leaf.metadata, leaf.selected_version, direction) {
        Some(version) => {
            leaf.selected_version = version;
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SecretKey;
    use crate::domain::fixtures::metadata;

    #[test]
    fn forward_then_backward_returns_to_start() {
        let meta = metadata(&[false, false, false, false]);
        let next = advance(&meta, 2, Direction::Forward).expect("forward");
        assert_eq!(next, 3);
        assert_eq!(advance(&meta, next, Direction::Backward), Some(2));
    }

    #[test]
    fn destroyed_versions_are_skipped() {
        let meta = metadata(&[false, true, true, false]);
        assert_eq!(advance(&meta, 1, Direction::Forward), Some(4));
        assert_eq!(advance(&meta, 4, Direction::Backward), Some(1));
    }

    #[test]
    fn boundaries_leave_selection_unchanged() {
        let meta = metadata(&[false, false, false]);
        assert_eq!(advance(&meta, 3, Direction::Forward), None);
        assert_eq!(advance(&meta, 1, Direction::Backward), None);
    }

    #[test]
    fn only_destroyed_versions_ahead_is_a_noop() {
        let meta = metadata(&[false, false, true, true]);
        assert_eq!(advance(&meta, 2, Direction::Forward), None);
    }

    #[test]
    fn gap_in_numbering_stops_probing() {
        let mut meta = metadata(&[false, false, false, false]);
        meta.versions.remove(&3);
        assert_eq!(advance(&meta, 2, Direction::Forward), None);
        assert_eq!(advance(&meta, 4, Direction::Backward), None);
    }

    #[test]
    fn cycle_updates_leaf_only_on_success() {
        let mut leaf = SecretLeaf {
            key: SecretKey::from_identifier("app"),
            metadata: metadata(&[false, true, false]),
            selected_version: 3,
        };
        assert!(cycle(&mut leaf, Direction::Backward));
        assert_eq!(leaf.selected_version, 1);
        assert!(!cycle(&mut leaf, Direction::Backward));
        assert_eq!(leaf.selected_version, 1);
        assert!(cycle(&mut leaf, Direction::Forward));
        assert_eq!(leaf.selected_version, 3);
    }
}
