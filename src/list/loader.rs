//! Single-flight page loading.
//!
//! [`PageLoader`] owns the pagination state and the slot counter. A request
//! hands back the pending fetch instead of awaiting it, so the caller decides
//! where it runs (a spawned task in the app, a direct `.await` in tests) and
//! feeds the result back through [`PageLoader::complete`].

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, info, warn};

use super::layout::SlotIndex;
use crate::source::FetchError;

pub type FetchFuture<T> = BoxFuture<'static, Result<Vec<T>, FetchError>>;

/// Caller-supplied page fetch. Resolving to an empty vec signals end of data.
pub type FetchFn<T> = Arc<dyn Fn(PageRequest) -> FetchFuture<T> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub current_page: u32,
    pub next_page: u32,
}

/// A fetched record and the slot index it was given on arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedItem<T> {
    pub slot: SlotIndex,
    pub data: T,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationState {
    pub current_page: u32,
    pub is_loading: bool,
    pub exhausted: bool,
}

/// Hands out slot indices. Owned by one list, never shared.
#[derive(Debug, Clone, Default)]
pub struct SlotAllocator {
    next: SlotIndex,
}

impl SlotAllocator {
    pub const fn with_seed(seed: SlotIndex) -> Self {
        Self { next: seed }
    }

    pub const fn peek(&self) -> SlotIndex {
        self.next
    }

    pub fn allocate(&mut self) -> SlotIndex {
        let slot = self.next;
        self.next += 1;
        slot
    }
}

/// A fetch that has been started but not applied.
pub struct PendingPage<T> {
    pub request: PageRequest,
    pub fetch: FetchFuture<T>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoadOutcome<T> {
    Appended(Vec<TaggedItem<T>>),
    Exhausted,
    /// The completion did not match the request in flight.
    Discarded,
}

pub struct PageLoader<T> {
    fetch: FetchFn<T>,
    state: PaginationState,
    slots: SlotAllocator,
    in_flight: Option<PageRequest>,
}

impl<T> PageLoader<T> {
    pub fn new(fetch: FetchFn<T>, initial_page: u32) -> Self {
        Self {
            fetch,
            state: PaginationState {
                current_page: initial_page,
                ..Default::default()
            },
            slots: SlotAllocator::default(),
            in_flight: None,
        }
    }

    pub fn with_slots(mut self, slots: SlotAllocator) -> Self {
        self.slots = slots;
        self
    }

    pub const fn state(&self) -> PaginationState {
        self.state
    }

    pub const fn in_flight(&self) -> Option<PageRequest> {
        self.in_flight
    }

    /// Start fetching the page after `current_page`.
    ///
    /// Returns `None` without calling the fetch function while a request is
    /// in flight or once the source is exhausted.
    pub fn request_next_page(&mut self) -> Option<PendingPage<T>> {
        if self.state.exhausted {
            debug!("source exhausted, ignoring page request");
            return None;
        }
        if self.state.is_loading {
            debug!(in_flight = ?self.in_flight, "page request already in flight");
            return None;
        }

        let request = PageRequest {
            current_page: self.state.current_page,
            next_page: self.state.current_page + 1,
        };
        self.state.is_loading = true;
        self.in_flight = Some(request);
        debug!(page = request.next_page, "requesting page");

        Some(PendingPage {
            request,
            fetch: (self.fetch)(request),
        })
    }

    /// Apply the result of the fetch started for `request`.
    ///
    /// A failure clears the loading flag and leaves `current_page` where it
    /// was, so the next request asks for the same page again.
    pub fn complete(
        &mut self,
        request: PageRequest,
        result: Result<Vec<T>, FetchError>,
    ) -> Result<LoadOutcome<T>, FetchError> {
        if self.in_flight != Some(request) {
            warn!(
                page = request.next_page,
                in_flight = ?self.in_flight,
                "completion for a request that is not in flight"
            );
            return Ok(LoadOutcome::Discarded);
        }
        self.in_flight = None;
        self.state.is_loading = false;

        let records = result.inspect_err(|err| {
            warn!(page = request.next_page, %err, "page fetch failed");
        })?;

        if records.is_empty() {
            info!(page = request.next_page, "source exhausted");
            self.state.exhausted = true;
            return Ok(LoadOutcome::Exhausted);
        }

        self.state.current_page = request.next_page;
        let tagged: Vec<TaggedItem<T>> = records
            .into_iter()
            .map(|data| TaggedItem {
                slot: self.slots.allocate(),
                data,
            })
            .collect();
        debug!(
            page = request.next_page,
            count = tagged.len(),
            next_slot = self.slots.peek(),
            "page loaded"
        );
        Ok(LoadOutcome::Appended(tagged))
    }

    /// Request, await and apply the next page in one step.
    ///
    /// Returns `None` when the request was a no-op.
    pub async fn load_next_page(&mut self) -> Option<Result<LoadOutcome<T>, FetchError>> {
        let pending = self.request_next_page()?;
        let result = pending.fetch.await;
        Some(self.complete(pending.request, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::ScriptedSource;
    use futures::FutureExt;
    use tokio::sync::oneshot;
    use tokio_test::{assert_pending, assert_ready};

    fn numbers(range: std::ops::RangeInclusive<u32>) -> Vec<u32> {
        range.collect()
    }

    fn slots<T>(outcome: &LoadOutcome<T>) -> Vec<SlotIndex> {
        match outcome {
            LoadOutcome::Appended(items) => items.iter().map(|i| i.slot).collect(),
            _ => vec![],
        }
    }

    #[tokio::test]
    async fn slots_increase_across_pages_without_gaps() {
        let source = ScriptedSource::new(vec![
            Ok(numbers(1..=3)),
            Ok(numbers(4..=5)),
            Ok(numbers(6..=9)),
        ]);
        let mut loader = PageLoader::new(source.fetcher(), 0);

        let mut seen = Vec::new();
        for _ in 0..3 {
            let outcome = loader.load_next_page().await.unwrap().unwrap();
            seen.extend(slots(&outcome));
        }

        assert_eq!(seen, (0..9).collect::<Vec<SlotIndex>>());
    }

    #[tokio::test]
    async fn slot_seed_is_respected() {
        let source = ScriptedSource::new(vec![Ok(numbers(1..=2))]);
        let mut loader =
            PageLoader::new(source.fetcher(), 0).with_slots(SlotAllocator::with_seed(40));

        let outcome = loader.load_next_page().await.unwrap().unwrap();
        assert_eq!(slots(&outcome), vec![40, 41]);
    }

    #[test]
    fn second_request_while_loading_is_ignored() {
        let source = ScriptedSource::new(vec![Ok(numbers(1..=10))]);
        let mut loader = PageLoader::new(source.fetcher(), 0);

        let first = loader.request_next_page();
        assert!(first.is_some());
        assert!(loader.state().is_loading);

        assert!(loader.request_next_page().is_none());
        assert!(loader.request_next_page().is_none());
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn request_carries_current_and_next_page() {
        let source = ScriptedSource::new(vec![Ok(numbers(1..=2))]);
        let mut loader = PageLoader::new(source.fetcher(), 3);

        let pending = loader.request_next_page().unwrap();
        assert_eq!(
            pending.request,
            PageRequest {
                current_page: 3,
                next_page: 4,
            }
        );
        assert_eq!(source.requests(), vec![pending.request]);
    }

    #[tokio::test]
    async fn scenario_three_pages_then_exhausted() {
        let source = ScriptedSource::new(vec![
            Ok(numbers(1..=10)),
            Ok(numbers(11..=20)),
            Ok(vec![]),
        ]);
        let mut loader = PageLoader::new(source.fetcher(), 0);

        let mut items = Vec::new();
        for _ in 0..3 {
            if let Some(Ok(LoadOutcome::Appended(page))) = loader.load_next_page().await {
                items.extend(page);
            }
        }

        assert_eq!(items.len(), 20);
        assert!(loader.state().exhausted);
        assert!(!loader.state().is_loading);
        assert!(loader.load_next_page().await.is_none());
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn empty_page_does_not_advance_current_page() {
        let source = ScriptedSource::new(vec![Ok(numbers(1..=2)), Ok(vec![])]);
        let mut loader = PageLoader::new(source.fetcher(), 0);

        loader.load_next_page().await;
        assert_eq!(loader.state().current_page, 1);
        let outcome = loader.load_next_page().await.unwrap().unwrap();
        assert_eq!(outcome, LoadOutcome::Exhausted);
        assert_eq!(loader.state().current_page, 1);
    }

    #[tokio::test]
    async fn failure_resets_loading_and_retries_same_page() {
        let source = ScriptedSource::new(vec![
            Err(FetchError::Unavailable("down".into())),
            Ok(numbers(1..=4)),
        ]);
        let mut loader = PageLoader::new(source.fetcher(), 0);

        let result = loader.load_next_page().await.unwrap();
        assert_eq!(result, Err(FetchError::Unavailable("down".into())));
        assert!(!loader.state().is_loading);
        assert_eq!(loader.state().current_page, 0);

        let outcome = loader.load_next_page().await.unwrap();
        tokio_test::assert_ok!(outcome);
        assert_eq!(source.calls(), 2);
        let pages: Vec<u32> = source.requests().iter().map(|r| r.next_page).collect();
        assert_eq!(pages, vec![1, 1]);
    }

    #[test]
    fn mismatched_completion_is_discarded() {
        let source = ScriptedSource::new(vec![Ok(numbers(1..=2))]);
        let mut loader = PageLoader::new(source.fetcher(), 0);
        let pending = loader.request_next_page().unwrap();

        let stray = PageRequest {
            current_page: 7,
            next_page: 8,
        };
        let outcome = loader.complete(stray, Ok(vec![99])).unwrap();
        assert_eq!(outcome, LoadOutcome::Discarded);
        assert!(loader.state().is_loading);
        assert_eq!(loader.in_flight(), Some(pending.request));
    }

    #[test]
    fn pending_fetch_stays_pending_until_source_answers() {
        let (tx, rx) = oneshot::channel::<Vec<u32>>();
        let rx = std::sync::Mutex::new(Some(rx));
        let fetch: FetchFn<u32> = Arc::new(move |_| {
            let rx = rx.lock().unwrap().take();
            async move {
                match rx {
                    Some(rx) => rx
                        .await
                        .map_err(|_| FetchError::Unavailable("sender dropped".into())),
                    None => Ok(vec![]),
                }
            }
            .boxed()
        });
        let mut loader = PageLoader::new(fetch, 0);

        let pending = loader.request_next_page().unwrap();
        let request = pending.request;
        let mut task = tokio_test::task::spawn(pending.fetch);
        assert_pending!(task.poll());
        assert!(loader.request_next_page().is_none());

        tx.send(vec![5, 6]).unwrap();
        let result = assert_ready!(task.poll());
        let outcome = loader.complete(request, result).unwrap();
        assert_eq!(slots(&outcome), vec![0, 1]);
        assert!(!loader.state().is_loading);
    }
}
