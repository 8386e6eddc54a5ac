use crate::catalog::load_catalog;
use crate::cursor::{self, Direction};
use crate::diff::{DiffReport, render_fetched};
use crate::infra::SecretStore;
use crate::pages::{Page, PageStack};
use crate::selection::{SelectMode, SelectionController, Side};
use anyhow::Result;
use ratatui::layout::{Position, Rect};
use tracing::{info, warn};

/// A (secret, version) pair frozen when the diff page was opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffSide {
    pub id: String,
    pub version: u32,
}

impl DiffSide {
    pub fn label(&self) -> String {
        format!("{}:{}", self.id, self.version)
    }
}

#[derive(Debug, Clone)]
pub struct DiffPage {
    pub left: DiffSide,
    pub right: DiffSide,
    pub report: DiffReport,
    pub scroll: usize,
    rows: usize,
    viewport_rows: usize,
}

impl DiffPage {
    fn new(left: DiffSide, right: DiffSide, report: DiffReport) -> Self {
        let rows = report.failures.len() + report.body.line_count();
        Self {
            left,
            right,
            report,
            scroll: 0,
            rows,
            viewport_rows: 1,
        }
    }

    pub fn title(&self) -> String {
        format!(
            "Difference between {} and {}",
            self.left.label(),
            self.right.label()
        )
    }

    /// Records the wrapped height of the page and the rows visible in the
    /// last frame. Until the first draw every line counts as one row.
    pub fn sync_viewport(&mut self, rows: usize, viewport_rows: usize) {
        self.rows = rows;
        self.viewport_rows = viewport_rows.max(1);
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn max_scroll(&self) -> usize {
        self.rows.saturating_sub(self.viewport_rows)
    }
}

/// Where a tree pane was last drawn; used to map mouse clicks to rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeView {
    pub area: Rect,
    pub offset: usize,
}

/// All mutable state of one interactive session.
pub struct App {
    store: Box<dyn SecretStore>,
    pub selection: SelectionController,
    pub pages: PageStack,
    pub diff: Option<DiffPage>,
    pub tree_views: [TreeView; 2],
    pub status: String,
    pub should_quit: bool,
}

impl App {
    pub fn start(store: Box<dyn SecretStore>) -> Result<Self> {
        let entries = load_catalog(store.as_ref())?;
        let status = format!("loaded {} secret(s)", entries.len());
        info!(count = entries.len(), "session started");
        Ok(Self {
            store,
            selection: SelectionController::new(&entries),
            pages: PageStack::new(),
            diff: None,
            tree_views: [TreeView::default(); 2],
            status,
            should_quit: false,
        })
    }

    /// Re-reads the whole catalog. An error leaves the old tree untouched and
    /// is meant to end the session.
    pub fn reload(&mut self) -> Result<()> {
        let entries = load_catalog(self.store.as_ref())?;
        self.selection.reset(&entries);
        self.status = format!("reloaded {} secret(s)", entries.len());
        info!(count = entries.len(), "catalog reloaded");
        Ok(())
    }

    pub fn set_mode(&mut self, mode: SelectMode) {
        self.selection.set_mode(mode);
        self.status = format!("{} select mode", mode.label());
    }

    pub fn switch_focus(&mut self) {
        self.selection.switch_focus();
    }

    pub fn cycle_version(&mut self, direction: Direction) -> bool {
        let Some(leaf) = self.selection.focused_leaf_mut() else {
            return false;
        };
        let moved = cursor::cycle(leaf, direction);
        if moved {
            self.status = format!("selected {}", leaf.reference());
        }
        moved
    }

    pub fn show_help(&mut self) {
        self.pages.show_help();
    }

    /// Snapshots both selections, fetches both bodies and pushes the diff page.
    /// Read failures are shown inside the page instead of aborting it.
    pub fn open_diff(&mut self) -> bool {
        let (Some(left), Some(right)) = (self.captured(Side::Left), self.captured(Side::Right))
        else {
            self.status = "select a secret on both sides first".to_string();
            return false;
        };
        if !self.pages.open_diff() {
            return false;
        }

        let left_content = self.store.content(&left.id, left.version);
        let right_content = self.store.content(&right.id, right.version);
        let report = render_fetched(&left.label(), &right.label(), left_content, right_content);
        for failure in &report.failures {
            warn!("{failure}");
        }
        info!(left = %left.label(), right = %right.label(), "diff opened");

        self.diff = Some(DiffPage::new(left, right, report));
        true
    }

    pub fn dismiss(&mut self, page: Page) -> bool {
        let dismissed = self.pages.dismiss(page);
        if dismissed && page == Page::Diff {
            self.diff = None;
        }
        dismissed
    }

    pub fn scroll_diff_down(&mut self, lines: usize) -> bool {
        let Some(diff) = self.diff.as_mut() else {
            return false;
        };
        let max = diff.max_scroll();
        if diff.scroll >= max {
            return false;
        }
        diff.scroll = (diff.scroll + lines).min(max);
        true
    }

    pub fn scroll_diff_up(&mut self, lines: usize) -> bool {
        let Some(diff) = self.diff.as_mut() else {
            return false;
        };
        if diff.scroll == 0 {
            return false;
        }
        diff.scroll = diff.scroll.saturating_sub(lines);
        true
    }

    /// Focuses the tree under the pointer and selects the clicked row.
    /// Clicks outside both trees or on a directory change nothing else.
    pub fn click_tree(&mut self, column: u16, row: u16) -> bool {
        let position = Position::new(column, row);
        let Some(side) = [Side::Left, Side::Right]
            .into_iter()
            .find(|side| self.tree_views[side.index()].area.contains(position))
        else {
            return false;
        };
        self.selection.focus(side);

        let view = self.tree_views[side.index()];
        let index = view.offset + usize::from(row - view.area.y);
        let Some(target) = self
            .selection
            .pane(side)
            .tree
            .rows()
            .get(index)
            .map(|row| row.id)
        else {
            return false;
        };
        self.selection.select_node(side, target).is_some()
    }

    fn captured(&self, side: Side) -> Option<DiffSide> {
        self.selection
            .pane(side)
            .current_leaf()
            .map(|leaf| DiffSide {
                id: leaf.key.identifier(),
                version: leaf.selected_version,
            })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{app, store};
    use super::*;
    use crate::diff::{DiffBody, READ_FAILURE_MESSAGE};
    use crate::infra::fake::FakeStore;
    use crate::selection::Motion;
    use std::rc::Rc;

    #[test]
    fn start_fails_when_listing_fails() {
        let store = FakeStore {
            fail_listing: true,
            ..FakeStore::default()
        };
        assert!(App::start(Box::new(store)).is_err());
    }

    #[test]
    fn diff_needs_both_sides() {
        let mut app = app();
        assert!(!app.open_diff());
        assert_eq!(app.pages.top(), Page::Browse);
        assert!(app.diff.is_none());
    }

    #[test]
    fn diff_captures_versions_at_open_time() {
        let mut app = app();
        app.selection.navigate(Side::Left, Motion::First);
        assert!(app.cycle_version(Direction::Backward));

        assert!(app.open_diff());
        assert_eq!(app.pages.top(), Page::Diff);
        let diff = app.diff.as_ref().expect("diff page");
        assert_eq!(diff.left.label(), "team/db:2");
        assert_eq!(diff.right.label(), "team/db:3");
        assert_eq!(diff.report.body, DiffBody::Equal);
        assert_eq!(diff.title(), "Difference between team/db:2 and team/db:3");

        app.selection.switch_focus();
        app.cycle_version(Direction::Backward);
        let diff = app.diff.as_ref().expect("diff page");
        assert_eq!(diff.right.label(), "team/db:3");
    }

    #[test]
    fn missing_content_is_reported_inside_the_page() {
        let mut app = app();
        app.set_mode(SelectMode::Multiple);
        app.selection.navigate(Side::Left, Motion::Last);
        app.selection.navigate(Side::Right, Motion::First);

        assert!(app.open_diff());
        let diff = app.diff.as_ref().expect("diff page");
        assert_eq!(diff.report.failures.len(), 1);
        assert!(diff.report.failures[0].contains("root:1"));
        assert!(matches!(diff.report.body, DiffBody::Lines(_)));
    }

    #[test]
    fn transport_failure_still_opens_the_page() {
        let mut store = store();
        store.broken.push("team/api".to_string());
        let calls = Rc::clone(&store.content_calls);
        let mut app = App::start(Box::new(store)).expect("start");
        app.set_mode(SelectMode::Multiple);
        app.selection.navigate(Side::Left, Motion::First);
        app.selection.navigate(Side::Right, Motion::First);
        app.selection.navigate(Side::Right, Motion::Next);

        assert!(app.open_diff());
        assert_eq!(app.pages.top(), Page::Diff);
        let diff = app.diff.as_ref().expect("diff page");
        assert_eq!(diff.report.failures.len(), 1);
        assert!(diff.report.failures[0].starts_with(READ_FAILURE_MESSAGE));
        assert!(diff.report.failures[0].contains("timed out"));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn dismissing_diff_drops_its_state() {
        let mut app = app();
        app.selection.navigate(Side::Left, Motion::First);
        app.open_diff();
        assert!(app.dismiss(Page::Diff));
        assert!(app.diff.is_none());
        assert_eq!(app.pages.top(), Page::Browse);
    }

    #[test]
    fn reload_resets_selection_and_keeps_mode() {
        let mut app = App::start(Box::new(store())).expect("start");
        app.set_mode(SelectMode::Multiple);
        app.selection.navigate(Side::Left, Motion::First);
        app.reload().expect("reload");
        assert!(app.selection.pane(Side::Left).current.is_none());
        assert_eq!(app.selection.mode(), SelectMode::Multiple);
        assert!(app.status.contains("reloaded 3"));
    }

    #[test]
    fn clicks_map_to_tree_rows() {
        let mut app = app();
        app.tree_views[Side::Right.index()] = TreeView {
            area: Rect::new(41, 1, 38, 10),
            offset: 0,
        };

        // Row 0 is the `team` directory.
        assert!(!app.click_tree(45, 1));
        assert_eq!(app.selection.focused_pane(), Side::Right);
        assert!(app.selection.pane(Side::Right).current.is_none());

        assert!(app.click_tree(45, 3));
        let leaf = app.selection.pane(Side::Right).current_leaf().expect("leaf");
        assert_eq!(leaf.reference(), "team/api:3");
        let mirrored = app.selection.pane(Side::Left).current_leaf().expect("mirror");
        assert_eq!(mirrored.reference(), "team/api:3");

        assert!(!app.click_tree(0, 0));
        assert!(!app.click_tree(45, 9));
    }

    #[test]
    fn wrapped_rows_extend_the_scroll_range() {
        let mut app = app();
        app.selection.navigate(Side::Left, Motion::First);
        app.cycle_version(Direction::Backward);
        app.cycle_version(Direction::Backward);
        app.open_diff();

        let diff = app.diff.as_mut().expect("diff");
        diff.sync_viewport(30, 10);
        assert!(app.scroll_diff_down(100));
        assert_eq!(app.diff.as_ref().expect("diff").scroll, 20);

        app.diff.as_mut().expect("diff").sync_viewport(12, 10);
        assert_eq!(app.diff.as_ref().expect("diff").scroll, 2);
    }

    #[test]
    fn version_cycle_without_selection_is_a_noop() {
        let mut app = app();
        assert!(!app.cycle_version(Direction::Forward));
    }

    #[test]
    fn diff_scroll_is_clamped() {
        let mut app = app();
        app.selection.navigate(Side::Left, Motion::First);
        app.cycle_version(Direction::Backward);
        app.cycle_version(Direction::Backward);
        app.open_diff();

        assert!(!app.scroll_diff_up(1));
        assert!(app.scroll_diff_down(100));
        let max = app.diff.as_ref().expect("diff").scroll;
        assert!(max > 0);
        assert!(!app.scroll_diff_down(1));
        assert!(app.scroll_diff_up(100));
        assert_eq!(app.diff.as_ref().expect("diff").scroll, 0);
    }
}
