//! List widget that places each item at an absolute row offset.
//!
//! Items carry their own `top` in content rows. The widget subtracts the
//! scroll offset and draws whatever part of each item falls inside the
//! area, so items cut by the viewport edges render partially.

use std::ops::Range;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::Line,
    widgets::StatefulWidget,
};

/// Scroll position for the `PositionedList` widget.
#[derive(Debug, Default)]
pub struct PositionedListState {
    scroll_top: u32,
}

impl PositionedListState {
    pub const fn new(scroll_top: u32) -> Self {
        Self { scroll_top }
    }
}

/// One item at content row `top`, one row per line.
pub struct PositionedItem<'a> {
    top: u32,
    lines: Vec<Line<'a>>,
}

impl<'a> PositionedItem<'a> {
    pub const fn new(top: u32, lines: Vec<Line<'a>>) -> Self {
        Self { top, lines }
    }
}

pub struct PositionedList<'a> {
    items: Vec<PositionedItem<'a>>,
}

impl<'a> PositionedList<'a> {
    pub fn new(items: Vec<PositionedItem<'a>>) -> Self {
        Self { items }
    }
}

impl StatefulWidget for PositionedList<'_> {
    type State = PositionedListState;

    fn render(self, area: Rect, buf: &mut Buffer, state: &mut Self::State) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let viewport = u32::from(area.height);
        for item in &self.items {
            let Some(rows) = visible_rows(item.top, item.lines.len(), state.scroll_top, viewport)
            else {
                continue;
            };
            for line_idx in rows {
                let row = item.top + line_idx as u32 - state.scroll_top;
                let y = area.top() + row as u16;
                buf.set_line(area.left(), y, &item.lines[line_idx], area.width);
            }
        }
    }
}

/// Indices of an item's lines that land inside `[scroll_top, scroll_top + viewport)`.
fn visible_rows(top: u32, height: usize, scroll_top: u32, viewport: u32) -> Option<Range<usize>> {
    let height = u32::try_from(height).ok()?;
    let bottom = top.checked_add(height)?;
    let view_bottom = scroll_top.saturating_add(viewport);
    if height == 0 || bottom <= scroll_top || top >= view_bottom {
        return None;
    }
    let first = scroll_top.saturating_sub(top);
    let last = bottom.min(view_bottom) - top;
    Some(first as usize..last as usize)
}
