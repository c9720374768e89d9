//! Test data builders and a scripted page source.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::FutureExt;

use crate::app::App;
use crate::list::{FetchFn, ListEvent, PageRequest, ScrollConfig};
use crate::source::{FetchError, Post};
use crate::theme::ResolvedTheme;
use crate::time::fixed_clock;

/// Fixed timestamp for deterministic tests: 2023-11-15 00:00:00 UTC.
/// Sample posts are stamped relative to it.
pub const TEST_NOW: i64 = 1700092800;

type Script<T> = VecDeque<Result<Vec<T>, FetchError>>;

/// Page source that answers requests from a fixed script, in order, and
/// records every request it sees. An exhausted script answers with an
/// empty page.
pub struct ScriptedSource<T> {
    script: Arc<Mutex<Script<T>>>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl<T: Send + 'static> ScriptedSource<T> {
    pub fn new(script: Vec<Result<Vec<T>, FetchError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn fetcher(&self) -> FetchFn<T> {
        let script = Arc::clone(&self.script);
        let requests = Arc::clone(&self.requests);
        Arc::new(move |request| {
            requests.lock().unwrap().push(request);
            let answer = script.lock().unwrap().pop_front().unwrap_or(Ok(vec![]));
            futures::future::ready(answer).boxed()
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }
}

pub struct PostBuilder {
    id: u64,
    title: String,
    author: String,
    score: u32,
    time: u64,
    body: Option<String>,
}

impl Default for PostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl PostBuilder {
    pub fn new() -> Self {
        Self {
            id: 1,
            title: "Test Post".to_string(),
            author: "testuser".to_string(),
            score: 100,
            time: TEST_NOW as u64 - 3600,
            body: None,
        }
    }

    pub fn id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    pub fn score(mut self, score: u32) -> Self {
        self.score = score;
        self
    }

    pub fn time(mut self, time: u64) -> Self {
        self.time = time;
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = Some(body.to_string());
        self
    }

    pub fn build(self) -> Post {
        Post {
            id: self.id,
            title: self.title,
            author: self.author,
            score: self.score,
            time: self.time,
            body: self.body,
        }
    }
}

/// Builds an [`App`] whose list already holds one page, without running
/// any fetch tasks.
pub struct TestAppBuilder {
    posts: Vec<Post>,
    config: ScrollConfig,
    size: (u16, u16),
    scroll_top: u32,
    exhausted: bool,
    error: Option<FetchError>,
    show_help: bool,
    show_debug: bool,
    theme: ResolvedTheme,
}

impl Default for TestAppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(dead_code)]
impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            posts: Vec::new(),
            config: ScrollConfig {
                item_gap: 1,
                ..Default::default()
            },
            size: (60, 20),
            scroll_top: 0,
            exhausted: false,
            error: None,
            show_help: false,
            show_debug: false,
            theme: ResolvedTheme::dark(),
        }
    }

    pub fn with_posts(mut self, posts: Vec<Post>) -> Self {
        self.posts = posts;
        self
    }

    pub fn config(mut self, config: ScrollConfig) -> Self {
        self.config = config;
        self
    }

    pub fn size(mut self, width: u16, height: u16) -> Self {
        self.size = (width, height);
        self
    }

    pub fn scroll_top(mut self, scroll_top: u32) -> Self {
        self.scroll_top = scroll_top;
        self
    }

    /// Answer the follow-up request with an empty page.
    pub fn exhausted(mut self) -> Self {
        self.exhausted = true;
        self
    }

    /// Fail the first request instead of delivering posts.
    pub fn error(mut self, error: FetchError) -> Self {
        self.error = Some(error);
        self
    }

    pub fn show_help(mut self) -> Self {
        self.show_help = true;
        self
    }

    pub fn show_debug(mut self) -> Self {
        self.show_debug = true;
        self
    }

    pub fn theme(mut self, theme: ResolvedTheme) -> Self {
        self.theme = theme;
        self
    }

    pub fn build(self) -> App {
        let source = ScriptedSource::<Post>::new(vec![]);
        let mut app = App::new(self.config, source.fetcher(), self.theme);
        app.clock = fixed_clock(TEST_NOW);
        app.show_help = self.show_help;
        app.debug.visible = self.show_debug;
        app.terminal_size = Some(self.size);

        let now = Instant::now();
        let (_, height) = app.list_viewport().unwrap_or_default();
        let resized = ListEvent::Resized {
            viewport_height: u32::from(height),
        };
        if let Some(first) = app.list.handle(resized, now) {
            let result = match self.error {
                Some(err) => Err(err),
                None => Ok(self.posts),
            };
            let _ = app.list.complete(first.request, result);
        }

        let mut next = None;
        for (slot, height) in app.pending_heights() {
            if let Some(pending) = app.list.handle(ListEvent::Measured { slot, height }, now) {
                next = Some(pending);
            }
        }
        if self.scroll_top > 0 {
            app.scroll_top = self.scroll_top.min(app.list.max_scroll_top());
            let scrolled = ListEvent::Scrolled {
                scroll_top: app.scroll_top,
            };
            if let Some(pending) = app.list.handle(scrolled, now) {
                next = Some(pending);
            }
        }
        if let Some(pending) = next
            && self.exhausted
        {
            let _ = app.list.complete(pending.request, Ok(vec![]));
        }
        app
    }
}

pub fn sample_posts() -> Vec<Post> {
    vec![
        PostBuilder::new()
            .id(1)
            .title("Show HN: A virtualized list for the terminal")
            .author("dang")
            .score(142)
            .time(TEST_NOW as u64 - 600)
            .body("Only rows near the viewport stay mounted. Everything else keeps its offset.")
            .build(),
        PostBuilder::new()
            .id(2)
            .title("Why forward-only layout is enough")
            .author("pg")
            .score(89)
            .time(TEST_NOW as u64 - 7200)
            .build(),
        PostBuilder::new()
            .id(3)
            .title("Ask HN: How do you paginate?")
            .author("sama")
            .score(56)
            .time(TEST_NOW as u64 - 86400)
            .body("Page numbers, cursors, or something else?")
            .build(),
        PostBuilder::new()
            .id(4)
            .title("Measuring rendered height before layout")
            .author("tptacek")
            .score(234)
            .time(TEST_NOW as u64 - 172800)
            .build(),
        PostBuilder::new()
            .id(5)
            .title("Intersection observers, explained")
            .author("patio11")
            .score(167)
            .time(TEST_NOW as u64 - 30)
            .build(),
    ]
}
