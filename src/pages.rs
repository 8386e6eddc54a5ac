#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Browse,
    Diff,
    Help,
}

impl Page {
    pub fn title(self) -> &'static str {
        match self {
            Page::Browse => "browse",
            Page::Diff => "diff",
            Page::Help => "help",
        }
    }
}

/// Overlay stack with `Browse` permanently at the bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStack {
    overlays: Vec<Page>,
}

impl Default for PageStack {
    fn default() -> Self {
        Self::new()
    }
}

impl PageStack {
    pub fn new() -> Self {
        Self {
            overlays: Vec::new(),
        }
    }

    pub fn top(&self) -> Page {
        self.overlays.last().copied().unwrap_or(Page::Browse)
    }

    pub fn contains(&self, page: Page) -> bool {
        page == Page::Browse || self.overlays.contains(&page)
    }

    /// Help is only stacked once; diff may sit below it.
    pub fn show_help(&mut self) -> bool {
        if self.top() == Page::Help {
            return false;
        }
        self.overlays.push(Page::Help);
        true
    }

    pub fn open_diff(&mut self) -> bool {
        if self.top() != Page::Browse {
            return false;
        }
        self.overlays.push(Page::Diff);
        true
    }

    /// Pops `page` if it is on top. `Browse` can never be dismissed.
    pub fn dismiss(&mut self, page: Page) -> bool {
        if page == Page::Browse || self.top() != page {
            return false;
        }
        self.overlays.pop();
        true
    }
}
