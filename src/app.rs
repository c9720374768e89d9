use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::list::{
    FetchFn, ListEvent, PageRequest, PendingPage, ScrollConfig, ScrollList, SlotIndex,
};
use crate::source::{FetchError, Post};
use crate::theme::ResolvedTheme;
use crate::time::Clock;
use crate::views::feed::{ItemContext, ItemRenderer, post_lines};

/// Rows outside the list: header and status bar.
const CHROME_ROWS: u16 = 2;
pub const DEBUG_PANE_HEIGHT: u16 = 10;
pub const WHEEL_STEP: i32 = 3;

pub enum AsyncResult {
    Page {
        generation: u64,
        task_id: u64,
        request: PageRequest,
        result: Result<Vec<Post>, FetchError>,
    },
}

#[derive(Debug)]
pub struct TaskInfo {
    pub id: u64,
    pub description: String,
    pub started_at: Instant,
}

#[derive(Debug)]
pub struct LogEntry {
    pub message: String,
}

/// Debug panel state: task tracking and log messages.
#[derive(Debug, Default)]
pub struct DebugState {
    pub visible: bool,
    pub running_tasks: Vec<TaskInfo>,
    pub log: VecDeque<LogEntry>,
    next_task_id: u64,
}

impl DebugState {
    const MAX_LOG_ENTRIES: usize = 50;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        self.log.push_back(LogEntry {
            message: msg.into(),
        });
        if self.log.len() > Self::MAX_LOG_ENTRIES {
            self.log.pop_front();
        }
    }

    pub fn start_task(&mut self, description: impl Into<String>) -> u64 {
        let id = self.next_task_id;
        self.next_task_id += 1;
        let desc = description.into();
        debug!(task_id = id, "{desc}");
        self.log(format!("Started: {}", desc));
        self.running_tasks.push(TaskInfo {
            id,
            description: desc,
            started_at: Instant::now(),
        });
        id
    }

    pub fn end_task(&mut self, id: u64, outcome: &str) {
        if let Some(pos) = self.running_tasks.iter().position(|t| t.id == id) {
            let task = self.running_tasks.remove(pos);
            let elapsed = task.started_at.elapsed();
            debug!(task_id = id, outcome, ?elapsed, "{}", task.description);
            self.log(format!("{} {}: {:.2?}", task.description, outcome, elapsed));
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    ScrollTop,
    ScrollBottom,
    ScrollBy(i32),
    Retry,
    Refresh,
    ToggleHelp,
    ToggleDebug,
    Quit,
    Resize { width: u16, height: u16 },
    Tick,
}

pub struct App {
    pub list: ScrollList<Post>,
    pub fetch: FetchFn<Post>,
    pub config: ScrollConfig,
    pub render_item: ItemRenderer,
    pub title: String,
    pub scroll_top: u32,
    pub terminal_size: Option<(u16, u16)>,
    pub should_quit: bool,
    pub show_help: bool,
    pub theme: ResolvedTheme,
    pub clock: Arc<dyn Clock>,
    pub loading_start: Option<Instant>,
    // Async task management
    pub result_tx: mpsc::Sender<AsyncResult>,
    pub result_rx: mpsc::Receiver<AsyncResult>,
    pub generation: u64,
    pub debug: DebugState,
}

impl App {
    pub fn new(config: ScrollConfig, fetch: FetchFn<Post>, theme: ResolvedTheme) -> Self {
        let (result_tx, result_rx) = mpsc::channel(10);
        Self {
            list: ScrollList::new(config.clone(), Arc::clone(&fetch)),
            fetch,
            config,
            render_item: post_lines,
            title: "scrollfeed".to_string(),
            scroll_top: 0,
            terminal_size: None,
            should_quit: false,
            show_help: false,
            theme,
            clock: crate::time::system_clock(),
            loading_start: None,
            result_tx,
            result_rx,
            generation: 0,
            debug: DebugState::new(),
        }
    }

    /// Width and height of the list area, once the terminal size is known.
    pub fn list_viewport(&self) -> Option<(u16, u16)> {
        let (width, height) = self.terminal_size?;
        let pane = if self.debug.visible {
            DEBUG_PANE_HEIGHT
        } else {
            0
        };
        Some((width, height.saturating_sub(CHROME_ROWS + pane)))
    }

    pub fn item_context(&self, width: u16) -> ItemContext<'_> {
        ItemContext {
            theme: &self.theme,
            now: self.clock.now(),
            width,
        }
    }

    pub fn should_show_spinner(&self) -> bool {
        const MIN_SPINNER_DURATION: Duration = Duration::from_millis(500);
        if let Some(start) = self.loading_start {
            self.list.pagination().is_loading || start.elapsed() < MIN_SPINNER_DURATION
        } else {
            false
        }
    }

    pub fn update(&mut self, msg: Message) {
        let now = Instant::now();
        match msg {
            Message::ScrollDown => self.scroll_by(1, now),
            Message::ScrollUp => self.scroll_by(-1, now),
            Message::PageDown => self.scroll_by(self.page_rows(), now),
            Message::PageUp => self.scroll_by(-self.page_rows(), now),
            Message::ScrollTop => self.scroll_to(0, now),
            Message::ScrollBottom => self.scroll_to(self.list.max_scroll_top(), now),
            Message::ScrollBy(delta) => self.scroll_by(delta, now),
            Message::Retry => self.dispatch(ListEvent::Retry, now),
            Message::Refresh => self.refresh(now),
            Message::ToggleHelp => self.show_help = !self.show_help,
            Message::ToggleDebug => {
                self.debug.toggle();
                self.sync_viewport(now);
            }
            Message::Quit => self.should_quit = true,
            Message::Resize { width, height } => self.resize(width, height, now),
            Message::Tick => self.dispatch(ListEvent::Tick, now),
        }
        self.measure_pending(now);
    }

    pub fn handle_async_result(&mut self, result: AsyncResult) {
        match result {
            AsyncResult::Page {
                generation,
                task_id,
                request,
                result,
            } => {
                if generation != self.generation {
                    self.debug.end_task(task_id, "discarded (stale)");
                    return;
                }
                self.debug.end_task(
                    task_id,
                    if result.is_ok() {
                        "completed"
                    } else {
                        "failed"
                    },
                );
                match self.list.complete(request, result) {
                    Ok(_) if self.list.pagination().exhausted => {
                        self.debug.log("Source exhausted");
                    }
                    Ok(count) => self.debug.log(format!("Appended {count} items")),
                    Err(e) => self.debug.log(format!("Load failed: {e}")),
                }
                self.measure_pending(Instant::now());
            }
        }
    }

    /// Render every item still waiting for its first measurement and report
    /// the line counts as heights.
    pub fn measure_pending(&mut self, now: Instant) {
        for (slot, height) in self.pending_heights() {
            self.dispatch(ListEvent::Measured { slot, height }, now);
        }
        self.scroll_to(self.scroll_top, now);
    }

    /// Heights of unmeasured items at the current width.
    pub fn pending_heights(&self) -> Vec<(SlotIndex, Option<u32>)> {
        let Some((width, _)) = self.list_viewport() else {
            return vec![];
        };
        let ctx = self.item_context(width);
        self.list
            .pending_measurement()
            .into_iter()
            .filter_map(|slot| {
                let item = self.list.item(slot)?;
                let lines = (self.render_item)(item, &ctx);
                Some((slot, u32::try_from(lines.len()).ok()))
            })
            .collect()
    }

    /// Stop applying results. Called once on the way out.
    pub fn shutdown(&mut self) {
        self.list.teardown();
    }

    fn dispatch(&mut self, event: ListEvent, now: Instant) {
        if let Some(pending) = self.list.handle(event, now) {
            self.spawn_page_fetch(pending);
        }
    }

    fn scroll_by(&mut self, delta: i32, now: Instant) {
        let target = if delta < 0 {
            self.scroll_top.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll_top.saturating_add(delta.unsigned_abs())
        };
        self.scroll_to(target, now);
    }

    fn scroll_to(&mut self, target: u32, now: Instant) {
        let target = target.min(self.list.max_scroll_top());
        if target != self.scroll_top {
            self.scroll_top = target;
            self.dispatch(ListEvent::Scrolled { scroll_top: target }, now);
        }
    }

    fn page_rows(&self) -> i32 {
        let rows = self.list.window().viewport_height.saturating_sub(1).max(1);
        i32::try_from(rows).unwrap_or(i32::MAX)
    }

    fn resize(&mut self, width: u16, height: u16, now: Instant) {
        let old_width = self.terminal_size.map(|(w, _)| w);
        self.terminal_size = Some((width, height));
        if old_width.is_some_and(|w| w != width) {
            info!(from = old_width, to = width, "width changed, relayout");
            self.debug.log(format!("Relayout at width {width}"));
            self.list.reset_layout();
        }
        self.sync_viewport(now);
    }

    fn sync_viewport(&mut self, now: Instant) {
        if let Some((_, height)) = self.list_viewport() {
            self.dispatch(
                ListEvent::Resized {
                    viewport_height: u32::from(height),
                },
                now,
            );
        }
    }

    fn refresh(&mut self, now: Instant) {
        self.generation += 1;
        self.list.teardown();
        self.list = ScrollList::new(self.config.clone(), Arc::clone(&self.fetch));
        self.scroll_top = 0;
        self.loading_start = None;
        self.debug.log("Refreshed feed");
        self.sync_viewport(now);
    }

    fn spawn_page_fetch(&mut self, pending: PendingPage<Post>) {
        let tx = self.result_tx.clone();
        let generation = self.generation;
        let request = pending.request;
        let task_id = self
            .debug
            .start_task(format!("Load page {}", request.next_page));
        self.loading_start = Some(Instant::now());

        tokio::spawn(async move {
            let result = pending.fetch.await;
            let _ = tx
                .send(AsyncResult::Page {
                    generation,
                    task_id,
                    request,
                    result,
                })
                .await;
        });
    }
}
