/// Distance from the bottom, in pixels, still treated as "at the bottom".
pub const DEFAULT_THRESHOLD_PX: f64 = 40.0;

/// Decides when the note list should jump to its newest entry.
///
/// The view sticks to the bottom only if the reader was already there before
/// the list changed; reading older notes is never interrupted.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollFollower {
    threshold_px: f64,
    at_bottom: bool,
    expanded: bool,
    pending: bool,
}

impl Default for ScrollFollower {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD_PX)
    }
}

impl ScrollFollower {
    pub fn new(threshold_px: f64) -> Self {
        Self {
            threshold_px: threshold_px.max(0.0),
            at_bottom: true,
            expanded: true,
            pending: false,
        }
    }

    pub fn is_at_bottom(&self) -> bool {
        self.at_bottom
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    /// Records the reader's scroll position.
    pub fn on_scroll(&mut self, scroll_top: f64, viewport_height: f64, content_height: f64) {
        let remaining = content_height - (scroll_top + viewport_height);
        self.at_bottom = remaining <= self.threshold_px;
    }

    /// New entries arrived.
    pub fn content_changed(&mut self) {
        if self.at_bottom && self.expanded {
            self.pending = true;
        }
    }

    pub fn set_expanded(&mut self, expanded: bool) {
        let opening = expanded && !self.expanded;
        self.expanded = expanded;
        if opening && self.at_bottom {
            self.pending = true;
        }
    }

    /// Whether the view should scroll to the bottom now. Clears the request.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }
}
