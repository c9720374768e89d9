use std::time::Duration;

pub const DEFAULT_END_OF_LIST_LABEL: &str = "You are up to date!!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollConfig {
    /// Space left between consecutive items, and before the first one.
    pub item_gap: u32,
    /// Page size requested from the source.
    pub items_per_load: usize,
    pub end_of_list_label: String,
    /// Show skeleton rows at the sentinel while more pages may exist.
    pub show_loading_placeholder: bool,
    /// Page counter value before the first request; the first fetch asks for `initial_page + 1`.
    pub initial_page: u32,
    pub scroll_throttle: Duration,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            item_gap: 10,
            items_per_load: 10,
            end_of_list_label: DEFAULT_END_OF_LIST_LABEL.to_string(),
            show_loading_placeholder: true,
            initial_page: 0,
            scroll_throttle: Duration::from_millis(300),
        }
    }
}
