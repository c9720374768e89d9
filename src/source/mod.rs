//! Page sources that feed the list.

mod demo;
mod error;
mod hn;

use std::sync::Arc;

pub use demo::DemoSource;
pub use error::FetchError;
pub use hn::HnSource;

use crate::list::{FetchFn, PageRequest, loader::FetchFuture};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub score: u32,
    pub time: u64,
    /// Body text. Posts without one render as a title and byline only.
    pub body: Option<String>,
}

/// Anything that can serve numbered pages of posts.
pub trait PageSource: Send + Sync + 'static {
    fn fetch_page(&self, request: PageRequest) -> FetchFuture<Post>;
}

/// Wrap a source into the fetch callback the list consumes.
pub fn fetcher<S: PageSource>(source: S) -> FetchFn<Post> {
    let source = Arc::new(source);
    Arc::new(move |request| source.fetch_page(request))
}

/// The items on 1-based `page`: `[(page - 1) * size, page * size)`.
///
/// Page 0 and pages past the end are empty.
pub fn page_slice<T: Clone>(items: &[T], page: u32, size: usize) -> Vec<T> {
    let Some(index) = (page as usize).checked_sub(1) else {
        return vec![];
    };
    let start = index.saturating_mul(size);
    if start >= items.len() {
        return vec![];
    }
    let end = start.saturating_add(size).min(items.len());
    items[start..end].to_vec()
}
