//! Virtualized, incrementally loaded list.
//!
//! [`ScrollList`] is one list instance. Every input (scroll, resize, item
//! measurement, tick, retry) goes through [`ScrollList::handle`], and fetch
//! results come back through [`ScrollList::complete`]. Each measurement runs
//! the same cascade: record height, place new offsets, recompute hidden
//! flags, move the sentinel, then check whether the sentinel is in view.

mod config;
pub mod layout;
pub mod loader;
pub mod throttle;
pub mod trigger;
pub mod window;

use std::time::Instant;

use tracing::{debug, info};

pub use config::ScrollConfig;
pub use layout::{LayoutEntry, LayoutTable, SentinelPosition, SlotIndex};
pub use loader::{FetchFn, PageRequest, PaginationState, PendingPage, SlotAllocator, TaggedItem};
pub use trigger::TriggerState;
pub use window::{HotRange, ScrollWindow};

use loader::{LoadOutcome, PageLoader};
use throttle::Throttle;
use trigger::VisibilityTrigger;

use crate::source::FetchError;

/// Rows taken by the skeleton placeholder drawn at the sentinel.
pub const PLACEHOLDER_ROWS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvent {
    Scrolled { scroll_top: u32 },
    Resized { viewport_height: u32 },
    /// First render of an item produced `height` rows (`None` if it could not be measured).
    Measured {
        slot: SlotIndex,
        height: Option<u32>,
    },
    /// Periodic wakeup used to flush a throttled scroll evaluation.
    Tick,
    /// Try again after a failed fetch.
    Retry,
}

pub struct ScrollList<T> {
    config: ScrollConfig,
    items: Vec<TaggedItem<T>>,
    layout: LayoutTable,
    loader: PageLoader<T>,
    trigger: VisibilityTrigger,
    window: ScrollWindow,
    throttle: Throttle,
    sentinel: SentinelPosition,
    error: Option<String>,
    alive: bool,
}

impl<T> ScrollList<T> {
    pub fn new(config: ScrollConfig, fetch: FetchFn<T>) -> Self {
        Self {
            loader: PageLoader::new(fetch, config.initial_page),
            throttle: Throttle::new(config.scroll_throttle),
            config,
            items: Vec::new(),
            layout: LayoutTable::new(),
            trigger: VisibilityTrigger::new(),
            window: ScrollWindow::default(),
            sentinel: SentinelPosition::default(),
            error: None,
            alive: true,
        }
    }

    /// Start slot numbering at `seed` instead of 0.
    pub fn with_slot_seed(mut self, seed: SlotIndex) -> Self {
        self.loader = self.loader.with_slots(SlotAllocator::with_seed(seed));
        self
    }

    pub const fn config(&self) -> &ScrollConfig {
        &self.config
    }

    pub fn items(&self) -> &[TaggedItem<T>] {
        &self.items
    }

    pub fn item(&self, slot: SlotIndex) -> Option<&TaggedItem<T>> {
        self.items
            .binary_search_by_key(&slot, |item| item.slot)
            .ok()
            .map(|idx| &self.items[idx])
    }

    pub const fn layout(&self) -> &LayoutTable {
        &self.layout
    }

    pub const fn window(&self) -> ScrollWindow {
        self.window
    }

    pub const fn sentinel(&self) -> SentinelPosition {
        self.sentinel
    }

    pub const fn pagination(&self) -> PaginationState {
        self.loader.state()
    }

    pub const fn trigger_state(&self) -> TriggerState {
        self.trigger.state()
    }

    /// User-facing message for the last failed fetch.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Items that should be rendered this pass.
    pub fn mounted(&self) -> impl Iterator<Item = &TaggedItem<T>> {
        self.items.iter().filter(|item| {
            self.layout
                .get(item.slot)
                .is_none_or(|entry| !entry.hidden)
        })
    }

    pub fn mounted_count(&self) -> usize {
        self.mounted().count()
    }

    /// Slots that still need their first measurement.
    pub fn pending_measurement(&self) -> Vec<SlotIndex> {
        self.items
            .iter()
            .filter(|item| {
                self.layout
                    .get(item.slot)
                    .is_none_or(|entry| !entry.is_measured())
            })
            .map(|item| item.slot)
            .collect()
    }

    /// Rows the sentinel occupies in its current state.
    pub fn sentinel_rows(&self) -> u32 {
        if self.loader.state().exhausted {
            1
        } else if self.error.is_some() {
            2
        } else if self.config.show_loading_placeholder {
            PLACEHOLDER_ROWS
        } else {
            1
        }
    }

    pub fn content_height(&self) -> u32 {
        self.sentinel.top.saturating_add(self.sentinel_rows())
    }

    pub fn max_scroll_top(&self) -> u32 {
        self.content_height()
            .saturating_sub(self.window.viewport_height)
    }

    /// Apply one event. Returns a fetch to run when the event caused a page request.
    pub fn handle(&mut self, event: ListEvent, now: Instant) -> Option<PendingPage<T>> {
        if !self.alive {
            debug!(?event, "list torn down, ignoring event");
            return None;
        }
        match event {
            ListEvent::Scrolled { scroll_top } => {
                self.window.scroll_top = scroll_top;
                if self.throttle.try_fire(now) {
                    self.reevaluate_scroll();
                }
            }
            ListEvent::Resized { viewport_height } => {
                self.window.viewport_height = viewport_height;
                self.refresh_visibility();
            }
            ListEvent::Measured { slot, height } => self.apply_measurement(slot, height),
            ListEvent::Tick => {
                if self.throttle.flush_due(now) {
                    self.reevaluate_scroll();
                }
            }
            ListEvent::Retry => return self.retry(),
        }
        self.observe_sentinel()
    }

    /// Apply a finished fetch. Returns the number of items appended.
    ///
    /// Results that arrive after [`ScrollList::teardown`] are dropped without
    /// touching any state.
    pub fn complete(
        &mut self,
        request: PageRequest,
        result: Result<Vec<T>, FetchError>,
    ) -> Result<usize, FetchError> {
        if !self.alive {
            debug!(page = request.next_page, "list torn down, discarding page");
            return Ok(0);
        }
        match self.loader.complete(request, result) {
            Ok(LoadOutcome::Appended(items)) => {
                let count = items.len();
                for item in &items {
                    self.layout.insert_stub(item.slot);
                }
                self.items.extend(items);
                self.error = None;
                self.trigger.loaded();
                info!(count, total = self.items.len(), "items appended");
                Ok(count)
            }
            Ok(LoadOutcome::Exhausted) => {
                self.trigger.disconnect();
                Ok(0)
            }
            Ok(LoadOutcome::Discarded) => Ok(0),
            Err(err) => {
                self.trigger.failed();
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    /// Forget every offset and height so all items are measured again.
    pub fn reset_layout(&mut self) {
        debug!(items = self.items.len(), "resetting layout");
        self.layout = self
            .items
            .iter()
            .map(|item| LayoutEntry::stub(item.slot))
            .collect();
    }

    /// Mark the list as gone. Later events and fetch results are ignored.
    pub fn teardown(&mut self) {
        if self.alive {
            info!(items = self.items.len(), "list torn down");
        }
        self.alive = false;
    }

    fn apply_measurement(&mut self, slot: SlotIndex, height: Option<u32>) {
        let table = layout::record_measurement(std::mem::take(&mut self.layout), slot, height);
        let table = layout::compute_offsets(table, slot, self.config.item_gap);
        self.layout = layout::compute_visibility(table, self.window.hot_range());
        self.reposition_sentinel();
    }

    fn refresh_visibility(&mut self) {
        self.layout =
            layout::compute_visibility(std::mem::take(&mut self.layout), self.window.hot_range());
    }

    fn reevaluate_scroll(&mut self) {
        if window::needs_reload(&self.layout, &self.window) {
            debug!(scroll_top = self.window.scroll_top, "hidden entries in view, reloading");
            self.refresh_visibility();
        }
    }

    fn reposition_sentinel(&mut self) {
        if let Some(last) = self.items.last()
            && let Some(position) =
                layout::sentinel_position(&self.layout, last.slot, self.config.item_gap)
            && position != self.sentinel
        {
            debug!(top = position.top, "sentinel moved");
            self.sentinel = position;
        }
    }

    fn observe_sentinel(&mut self) -> Option<PendingPage<T>> {
        if !self.layout.is_settled() {
            return None;
        }
        let visible = self
            .window
            .intersects(self.sentinel.top, self.sentinel_rows());
        if self.trigger.observe(visible) {
            debug!(top = self.sentinel.top, "sentinel entered viewport");
            self.request_page()
        } else {
            None
        }
    }

    fn retry(&mut self) -> Option<PendingPage<T>> {
        if self.error.is_none() || !self.trigger.activate() {
            return None;
        }
        self.error = None;
        self.request_page()
    }

    fn request_page(&mut self) -> Option<PendingPage<T>> {
        let pending = self.loader.request_next_page();
        if pending.is_none() {
            if self.loader.state().exhausted {
                self.trigger.disconnect();
            } else {
                self.trigger.stand_down();
            }
        }
        pending
    }
}
