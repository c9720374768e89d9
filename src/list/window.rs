use super::layout::LayoutTable;

/// Band of offsets whose items stay mounted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HotRange {
    pub min_top: u32,
    pub max_top: u32,
}

/// Current scroll position and viewport size, in rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollWindow {
    pub scroll_top: u32,
    pub viewport_height: u32,
}

impl ScrollWindow {
    pub const fn new(scroll_top: u32, viewport_height: u32) -> Self {
        Self {
            scroll_top,
            viewport_height,
        }
    }

    pub const fn min_range(&self) -> u32 {
        self.scroll_top
    }

    pub const fn max_range(&self) -> u32 {
        self.scroll_top.saturating_add(self.viewport_height)
    }

    pub fn hot_range(&self) -> HotRange {
        current_hot_range(self.scroll_top, self.viewport_height)
    }

    /// Whether any of the rows `[top, top + height)` fall inside the viewport.
    /// An empty viewport intersects nothing.
    pub fn intersects(&self, top: u32, height: u32) -> bool {
        height > 0
            && self.viewport_height > 0
            && top < self.max_range()
            && top.saturating_add(height) > self.min_range()
    }
}

/// The viewport extended by one viewport height above and below.
pub fn current_hot_range(scroll_top: u32, viewport_height: u32) -> HotRange {
    let gap = viewport_height;
    let max_range = scroll_top.saturating_add(viewport_height);
    HotRange {
        min_top: scroll_top.saturating_sub(gap),
        max_top: max_range.saturating_add(gap),
    }
}

/// Whether a scroll should trigger a visibility pass: some entry whose top is
/// inside `(min_range, max_range]` is still flagged hidden.
pub fn needs_reload(table: &LayoutTable, window: &ScrollWindow) -> bool {
    let (min_range, max_range) = (window.min_range(), window.max_range());
    table.iter().any(|entry| {
        entry.hidden && entry.top.is_some_and(|top| min_range < top && top <= max_range)
    })
}
