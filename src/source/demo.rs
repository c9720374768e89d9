use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt;
use tracing::debug;

use super::{FetchError, PageSource, Post, page_slice};
use crate::list::{PageRequest, loader::FetchFuture};

const WORDS: &[&str] = &[
    "scroll", "layout", "render", "offset", "page", "window", "measure", "sentinel", "viewport",
    "slot", "height", "gap", "fetch", "terminal", "row", "frame",
];

const AUTHORS: &[&str] = &["ada", "brian", "grace", "ken", "linus", "margaret"];

/// In-memory source with simulated latency and optional failure injection.
#[derive(Clone)]
pub struct DemoSource {
    posts: Arc<Vec<Post>>,
    page_size: usize,
    latency: Duration,
    fail_first: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl DemoSource {
    pub fn new(total: usize, page_size: usize, now: u64) -> Self {
        Self {
            posts: Arc::new((0..total).map(|i| generate_post(i, now)).collect()),
            page_size,
            latency: Duration::ZERO,
            fail_first: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the first fetch fail so the retry path can be exercised.
    pub fn fail_first(self, fail: bool) -> Self {
        self.fail_first.store(fail, Ordering::SeqCst);
        self
    }

    #[cfg(test)]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PageSource for DemoSource {
    fn fetch_page(&self, request: PageRequest) -> FetchFuture<Post> {
        let source = self.clone();
        async move {
            source.calls.fetch_add(1, Ordering::SeqCst);
            if !source.latency.is_zero() {
                tokio::time::sleep(source.latency).await;
            }
            if source.fail_first.swap(false, Ordering::SeqCst) {
                debug!(page = request.next_page, "injecting demo failure");
                return Err(FetchError::Unavailable("simulated failure".into()));
            }
            Ok(page_slice(&source.posts, request.next_page, source.page_size))
        }
        .boxed()
    }
}

/// Deterministic post `index`. Body length varies so item heights differ.
fn generate_post(index: usize, now: u64) -> Post {
    let id = index as u64 + 1;
    let word = |n: usize| WORDS[(index * 7 + n * 3) % WORDS.len()];
    let body = match index % 4 {
        0 => None,
        shape => {
            let count = shape * 9 + index % 5;
            Some((0..count).map(word).collect::<Vec<_>>().join(" "))
        }
    };
    Post {
        id,
        title: format!("Item {id}: {} {}", word(0), word(1)),
        author: AUTHORS[index % AUTHORS.len()].to_string(),
        score: ((index * 37) % 500) as u32,
        time: now.saturating_sub(id * 1800),
        body,
    }
}
