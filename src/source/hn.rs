use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{FetchError, PageSource, Post, page_slice};
use crate::list::{PageRequest, loader::FetchFuture};

const API_BASE: &str = "https://hacker-news.firebaseio.com/v0";
const CACHE_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Deserialize)]
struct HnItem {
    id: u64,
    by: Option<String>,
    time: Option<u64>,
    text: Option<String>,
    score: Option<u32>,
    title: Option<String>,
    deleted: Option<bool>,
    dead: Option<bool>,
}

impl HnItem {
    fn into_post(self) -> Option<Post> {
        if self.deleted.unwrap_or(false) || self.dead.unwrap_or(false) {
            return None;
        }
        Some(Post {
            id: self.id,
            title: self.title?,
            author: self.by.unwrap_or_else(|| "[deleted]".to_string()),
            score: self.score.unwrap_or(0),
            time: self.time.unwrap_or(0),
            body: self.text.as_deref().map(html_to_text).filter(|t| !t.is_empty()),
        })
    }
}

struct CacheEntry<T> {
    data: T,
    fetched_at: Instant,
}

impl<T> CacheEntry<T> {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < CACHE_TTL
    }
}

/// Hacker News top stories, paged client-side over the id list.
#[derive(Clone)]
pub struct HnSource {
    http: reqwest::Client,
    base_url: String,
    page_size: usize,
    item_cache: Arc<RwLock<HashMap<u64, CacheEntry<HnItem>>>>,
    /// Pages skipped because nothing on them survived filtering. Added to
    /// every requested page so later requests don't repeat posts.
    skipped_pages: Arc<AtomicU32>,
}

impl HnSource {
    pub fn new(page_size: usize) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            http,
            base_url: API_BASE.to_string(),
            page_size,
            item_cache: Arc::new(RwLock::new(HashMap::new())),
            skipped_pages: Arc::new(AtomicU32::new(0)),
        })
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_ids(&self) -> Result<Vec<u64>, FetchError> {
        let url = format!("{}/topstories.json", self.base_url);
        let ids = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(ids)
    }

    /// `Ok(None)` for ids the API answers with `null`.
    async fn fetch_item(&self, id: u64) -> Result<Option<HnItem>, FetchError> {
        {
            let cache = self.item_cache.read().await;
            if let Some(entry) = cache.get(&id)
                && entry.is_fresh()
            {
                return Ok(Some(entry.data.clone()));
            }
        }

        let url = format!("{}/item/{}.json", self.base_url, id);
        let item: Option<HnItem> = self
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(item) = &item {
            let mut cache = self.item_cache.write().await;
            cache.retain(|_, entry| entry.is_fresh());
            cache.insert(
                id,
                CacheEntry {
                    data: item.clone(),
                    fetched_at: Instant::now(),
                },
            );
        }
        Ok(item)
    }

    /// Posts on 1-based `page`. Fails only if every item on the page failed.
    ///
    /// A page whose items were all null, deleted or dead is skipped, so an
    /// empty result always means the id list ran out.
    pub async fn fetch_posts(&self, page: u32) -> Result<Vec<Post>, FetchError> {
        if page <= 1 {
            self.skipped_pages.store(0, Ordering::SeqCst);
        }
        let ids = self.fetch_ids().await?;
        let mut source_page = page.saturating_add(self.skipped_pages.load(Ordering::SeqCst));
        loop {
            let page_ids = page_slice(&ids, source_page, self.page_size);
            if page_ids.is_empty() {
                debug!(page, source_page, total = ids.len(), "no ids left");
                return Ok(vec![]);
            }
            let posts = self.fetch_page_items(source_page, &page_ids).await?;
            if !posts.is_empty() {
                return Ok(posts);
            }
            debug!(page, source_page, "nothing on the page survived filtering, skipping");
            self.skipped_pages.fetch_add(1, Ordering::SeqCst);
            source_page = source_page.saturating_add(1);
        }
    }

    async fn fetch_page_items(
        &self,
        page: u32,
        page_ids: &[u64],
    ) -> Result<Vec<Post>, FetchError> {
        let futures: Vec<_> = page_ids.iter().map(|&id| self.fetch_item(id)).collect();
        let results = futures::future::join_all(futures).await;

        let mut first_error = None;
        let mut posts = Vec::with_capacity(results.len());
        let mut failures = 0;
        for result in results {
            match result {
                Ok(item) => posts.extend(item.and_then(HnItem::into_post)),
                Err(err) => {
                    failures += 1;
                    first_error.get_or_insert(err);
                }
            }
        }
        if failures > 0 {
            warn!(page, failures, requested = page_ids.len(), "some items failed to load");
        }
        match first_error {
            Some(err) if failures == page_ids.len() => Err(err),
            _ => Ok(posts),
        }
    }
}

impl PageSource for HnSource {
    fn fetch_page(&self, request: PageRequest) -> FetchFuture<Post> {
        let source = self.clone();
        async move { source.fetch_posts(request.next_page).await }.boxed()
    }
}

/// Flatten HN's comment-style HTML into plain paragraphs.
fn html_to_text(html: &str) -> String {
    let flattened = html
        .replace("<p>", "\n")
        .replace("</p>", "")
        .replace("<br>", "\n");
    let mut text = String::with_capacity(flattened.len());
    let mut in_tag = false;
    for ch in flattened.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(ch),
            _ => {}
        }
    }
    html_escape::decode_html_entities(&text)
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
