use crate::catalog::{CatalogEntry, NodeId, SecretLeaf, SecretTree};
use crate::domain::SecretKey;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Right => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectMode {
    /// Both panes follow the same secret; versions stay independent.
    Single,
    Multiple,
}

impl SelectMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Next,
    Previous,
    First,
    Last,
}

/// What happened to the opposite pane after a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirror {
    Skipped,
    Matched(NodeId),
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    User,
    Mirror,
}

#[derive(Debug, Clone)]
pub struct PaneState {
    pub tree: SecretTree,
    pub current: Option<NodeId>,
    /// Selection-changed notification counter, bumped once per notification
    /// including mirrored ones.
    pub(crate) revision: u64,
}

impl PaneState {
    fn new(tree: SecretTree) -> Self {
        Self {
            tree,
            current: None,
            revision: 0,
        }
    }

    pub fn current_leaf(&self) -> Option<&SecretLeaf> {
        self.current.and_then(|id| self.tree.leaf(id))
    }

    fn current_key(&self) -> Option<SecretKey> {
        self.current_leaf().map(|leaf| leaf.key.clone())
    }
}

#[derive(Debug, Clone)]
pub struct SelectionController {
    panes: [PaneState; 2],
    mode: SelectMode,
    focus: Side,
}

impl SelectionController {
    pub fn new(entries: &[CatalogEntry]) -> Self {
        let tree = SecretTree::build(entries);
        Self {
            panes: [PaneState::new(tree.clone()), PaneState::new(tree)],
            mode: SelectMode::Single,
            focus: Side::Left,
        }
    }

    /// Rebuilds both trees and drops both selections. Mode and focus survive.
    pub fn reset(&mut self, entries: &[CatalogEntry]) {
        let tree = SecretTree::build(entries);
        self.panes = [PaneState::new(tree.clone()), PaneState::new(tree)];
    }

    pub fn pane(&self, side: Side) -> &PaneState {
        &self.panes[side.index()]
    }

    fn pane_mut(&mut self, side: Side) -> &mut PaneState {
        &mut self.panes[side.index()]
    }

    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    pub fn focused_pane(&self) -> Side {
        self.focus
    }

    pub fn switch_focus(&mut self) {
        self.focus = self.focus.other();
    }

    pub fn focus(&mut self, side: Side) {
        self.focus = side;
    }

    pub fn focused_leaf_mut(&mut self) -> Option<&mut SecretLeaf> {
        let pane = self.pane_mut(self.focus);
        let id = pane.current?;
        pane.tree.leaf_mut(id)
    }

    /// User selection of `node` on `side`. Directories and unknown ids are
    /// ignored and yield `None`.
    pub fn select_node(&mut self, side: Side, node: NodeId) -> Option<Mirror> {
        if !self.pane(side).tree.node(node)?.is_selectable() {
            return None;
        }
        self.pane_mut(side).current = Some(node);
        Some(self.notify(side, Origin::User))
    }

    pub fn set_mode(&mut self, mode: SelectMode) -> Mirror {
        debug!(mode = mode.label(), "select mode changed");
        self.mode = mode;
        match mode {
            SelectMode::Single => {
                let key = self.pane(Side::Left).current_key();
                self.mirror_onto(Side::Right, key.as_ref())
            }
            SelectMode::Multiple => Mirror::Skipped,
        }
    }

    /// Moves the cursor of `side` between leaves in display order.
    pub fn navigate(&mut self, side: Side, motion: Motion) -> Option<Mirror> {
        let leaves = self.pane(side).tree.leaves();
        let position = self
            .pane(side)
            .current
            .and_then(|current| leaves.iter().position(|id| *id == current));

        let target = match (motion, position) {
            (Motion::First, _) | (Motion::Next, None) => leaves.first(),
            (Motion::Last, _) | (Motion::Previous, None) => leaves.last(),
            (Motion::Next, Some(idx)) => leaves.get(idx + 1),
            (Motion::Previous, Some(idx)) => idx.checked_sub(1).and_then(|i| leaves.get(i)),
        }
        .copied()?;

        if Some(target) == self.pane(side).current {
            return None;
        }
        self.select_node(side, target)
    }

    /// Selection-changed notification. Only user-originated changes mirror,
    /// so a mirrored change never feeds back into another mirror.
    fn notify(&mut self, side: Side, origin: Origin) -> Mirror {
        self.pane_mut(side).revision += 1;
        match (origin, self.mode) {
            (Origin::Mirror, _) | (Origin::User, SelectMode::Multiple) => Mirror::Skipped,
            (Origin::User, SelectMode::Single) => {
                let key = self.pane(side).current_key();
                self.mirror_onto(side.other(), key.as_ref())
            }
        }
    }

    fn mirror_onto(&mut self, side: Side, key: Option<&SecretKey>) -> Mirror {
        let found = key.and_then(|key| self.pane(side).tree.find_leaf(key));
        self.pane_mut(side).current = found;
        self.notify(side, Origin::Mirror);
        match found {
            Some(id) => Mirror::Matched(id),
            None => {
                debug!(pane = side.label(), "no matching secret, selection cleared");
                Mirror::Cleared
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::entries;

    fn leaf_id(ctrl: &SelectionController, side: Side, id: &str) -> NodeId {
        ctrl.pane(side)
            .tree
            .find_leaf(&SecretKey::from_identifier(id))
            .expect("leaf")
    }

    fn current_id(ctrl: &SelectionController, side: Side) -> Option<String> {
        ctrl.pane(side)
            .current_leaf()
            .map(|leaf| leaf.key.identifier())
    }

    #[test]
    fn starts_single_with_nothing_selected() {
        let ctrl = SelectionController::new(&entries(&["a/b", "d"]));
        assert_eq!(ctrl.mode(), SelectMode::Single);
        assert_eq!(ctrl.focused_pane(), Side::Left);
        assert!(ctrl.pane(Side::Left).current.is_none());
        assert!(ctrl.pane(Side::Right).current.is_none());
    }

    #[test]
    fn single_mode_mirrors_exactly_once() {
        let mut ctrl = SelectionController::new(&entries(&["a/b", "a/c", "d"]));
        let node = leaf_id(&ctrl, Side::Left, "a/c");

        let mirror = ctrl.select_node(Side::Left, node).expect("selectable");

        assert!(matches!(mirror, Mirror::Matched(_)));
        assert_eq!(current_id(&ctrl, Side::Right).as_deref(), Some("a/c"));
        assert_eq!(ctrl.pane(Side::Left).revision, 1);
        assert_eq!(ctrl.pane(Side::Right).revision, 1);
    }

    #[test]
    fn mirroring_works_from_the_right_pane_too() {
        let mut ctrl = SelectionController::new(&entries(&["a/b", "d"]));
        let node = leaf_id(&ctrl, Side::Right, "d");
        ctrl.select_node(Side::Right, node);
        assert_eq!(current_id(&ctrl, Side::Left).as_deref(), Some("d"));
    }

    #[test]
    fn directories_are_not_selectable() {
        let mut ctrl = SelectionController::new(&entries(&["a/b"]));
        let dir = ctrl.pane(Side::Left).tree.children(SecretTree::ROOT)[0];
        assert_eq!(ctrl.select_node(Side::Left, dir), None);
        assert!(ctrl.pane(Side::Left).current.is_none());
        assert_eq!(ctrl.pane(Side::Left).revision, 0);
    }

    #[test]
    fn missing_counterpart_clears_the_other_pane() {
        let mut ctrl = SelectionController::new(&entries(&["a/b", "d"]));
        let right_d = leaf_id(&ctrl, Side::Right, "d");
        ctrl.set_mode(SelectMode::Multiple);
        ctrl.select_node(Side::Right, right_d);

        // Only the left tree knows about "x" after a partial rebuild.
        ctrl.panes[0] = PaneState::new(SecretTree::build(&entries(&["a/b", "d", "x"])));
        ctrl.set_mode(SelectMode::Single);
        let x = leaf_id(&ctrl, Side::Left, "x");

        assert_eq!(ctrl.select_node(Side::Left, x), Some(Mirror::Cleared));
        assert!(ctrl.pane(Side::Right).current.is_none());
    }

    #[test]
    fn multiple_mode_keeps_panes_independent() {
        let mut ctrl = SelectionController::new(&entries(&["a/b", "a/c", "d"]));
        assert_eq!(ctrl.set_mode(SelectMode::Multiple), Mirror::Skipped);

        let b = leaf_id(&ctrl, Side::Left, "a/b");
        let d = leaf_id(&ctrl, Side::Right, "d");
        assert_eq!(ctrl.select_node(Side::Left, b), Some(Mirror::Skipped));
        assert_eq!(ctrl.select_node(Side::Right, d), Some(Mirror::Skipped));

        assert_eq!(current_id(&ctrl, Side::Left).as_deref(), Some("a/b"));
        assert_eq!(current_id(&ctrl, Side::Right).as_deref(), Some("d"));
    }

    #[test]
    fn switching_to_single_forces_right_to_follow_left() {
        let mut ctrl = SelectionController::new(&entries(&["a/b", "a/c", "d"]));
        ctrl.set_mode(SelectMode::Multiple);
        let b = leaf_id(&ctrl, Side::Left, "a/b");
        let d = leaf_id(&ctrl, Side::Right, "d");
        ctrl.select_node(Side::Left, b);
        ctrl.select_node(Side::Right, d);

        assert!(matches!(
            ctrl.set_mode(SelectMode::Single),
            Mirror::Matched(_)
        ));
        assert_eq!(current_id(&ctrl, Side::Right).as_deref(), Some("a/b"));
        assert_eq!(current_id(&ctrl, Side::Left).as_deref(), Some("a/b"));
    }

    #[test]
    fn switching_to_single_with_empty_left_clears_right() {
        let mut ctrl = SelectionController::new(&entries(&["a/b", "d"]));
        ctrl.set_mode(SelectMode::Multiple);
        let d = leaf_id(&ctrl, Side::Right, "d");
        ctrl.select_node(Side::Right, d);

        assert_eq!(ctrl.set_mode(SelectMode::Single), Mirror::Cleared);
        assert!(ctrl.pane(Side::Right).current.is_none());
    }

    #[test]
    fn navigation_skips_directories_and_stops_at_edges() {
        let mut ctrl = SelectionController::new(&entries(&["a/b", "a/c", "d"]));
        ctrl.set_mode(SelectMode::Multiple);

        ctrl.navigate(Side::Left, Motion::Next);
        assert_eq!(current_id(&ctrl, Side::Left).as_deref(), Some("a/b"));
        ctrl.navigate(Side::Left, Motion::Next);
        ctrl.navigate(Side::Left, Motion::Next);
        assert_eq!(current_id(&ctrl, Side::Left).as_deref(), Some("d"));
        assert_eq!(ctrl.navigate(Side::Left, Motion::Next), None);
        assert_eq!(current_id(&ctrl, Side::Left).as_deref(), Some("d"));

        ctrl.navigate(Side::Left, Motion::First);
        assert_eq!(current_id(&ctrl, Side::Left).as_deref(), Some("a/b"));
        assert_eq!(ctrl.navigate(Side::Left, Motion::Previous), None);
        assert!(ctrl.pane(Side::Right).current.is_none());
    }

    #[test]
    fn reset_drops_selection_but_keeps_mode_and_focus() {
        let mut ctrl = SelectionController::new(&entries(&["a/b"]));
        ctrl.set_mode(SelectMode::Multiple);
        ctrl.switch_focus();
        ctrl.navigate(Side::Right, Motion::First);

        ctrl.reset(&entries(&["a/b", "z"]));

        assert_eq!(ctrl.mode(), SelectMode::Multiple);
        assert_eq!(ctrl.focused_pane(), Side::Right);
        assert!(ctrl.pane(Side::Right).current.is_none());
        assert_eq!(ctrl.pane(Side::Left).tree.leaves().len(), 2);
    }

    #[test]
    fn focused_leaf_follows_focus() {
        let mut ctrl = SelectionController::new(&entries(&["a/b", "d"]));
        ctrl.set_mode(SelectMode::Multiple);
        ctrl.navigate(Side::Left, Motion::Last);
        assert_eq!(
            ctrl.focused_leaf_mut().map(|leaf| leaf.key.identifier()),
            Some("d".to_string())
        );
        ctrl.switch_focus();
        assert!(ctrl.focused_leaf_mut().is_none());
    }
}
