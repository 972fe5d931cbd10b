use crate::bridge::ContinuationBridge;
use crate::models::{ErrorKind, ResultBox, SearchResult, SearchSettings};
use crate::state::{DEFAULT_QUEUE_CAPACITY, DomainError, IsolatedDomain};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

const SEARCH: ContinuationBridge = ContinuationBridge::new("search");

/// A search backend callable from any task
pub trait SearchService: Send + Sync + 'static {
    fn search(&self, query: &str) -> impl Future<Output = ResultBox<Vec<SearchResult>>> + Send;
}

/// Search over [`SearchResult::samples`] with simulated latency
///
/// Backed by a timer callback bridged into a future. A search whose caller
/// stopped waiting before the timer fired is abandoned with
/// [`ErrorKind::Cancelled`].
#[derive(Debug, Clone)]
pub struct MockSearchService {
    corpus: Arc<Vec<SearchResult>>,
    latency: Duration,
    runtime: Handle,
}

impl MockSearchService {
    pub fn new(corpus: Vec<SearchResult>, latency: Duration, runtime: Handle) -> Self {
        Self {
            corpus: Arc::new(corpus),
            latency,
            runtime,
        }
    }

    /// Sample corpus on the current runtime; panics outside a tokio runtime
    pub fn with_samples(latency: Duration) -> Self {
        Self::new(SearchResult::samples(), latency, Handle::current())
    }
}

impl SearchService for MockSearchService {
    fn search(&self, query: &str) -> impl Future<Output = ResultBox<Vec<SearchResult>>> + Send {
        let query = query.trim().to_string();
        let corpus = Arc::clone(&self.corpus);
        let latency = self.latency;

        SEARCH.invoke(|k| {
            self.runtime.spawn(async move {
                tokio::time::sleep(latency).await;

                if k.is_cancelled() {
                    let _ = k.fail(ErrorKind::Cancelled);
                    return;
                }

                let hits: Vec<SearchResult> = corpus
                    .iter()
                    .filter(|r| r.matches(&query))
                    .cloned()
                    .collect();
                let _ = k.succeed(hits);
            });
        })
    }
}

/// Query state owned by a [`SearchCoordinator`]'s domain
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    pub query: String,
    /// Bumped on every submitted query; only the latest may publish results
    pub generation: u64,
    pub results: Vec<SearchResult>,
    pub is_searching: bool,
    pub last_error: Option<ErrorKind>,
}

/// Realtime search: debounced, latest query wins.
///
/// Each call to [`search()`](Self::search) supersedes every earlier one.
/// Superseded calls resolve with [`ErrorKind::Cancelled`] and never publish
/// their results into the shared state.
pub struct SearchCoordinator<S> {
    service: Arc<S>,
    state: IsolatedDomain<SearchState>,
    debounce: Duration,
}

// Manual Clone implementation to avoid requiring S: Clone
impl<S> Clone for SearchCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            state: self.state.clone(),
            debounce: self.debounce,
        }
    }
}

impl<S: SearchService> SearchCoordinator<S> {
    pub fn new(service: S, settings: &SearchSettings) -> Result<Self, DomainError> {
        Self::with_capacity(service, settings, DEFAULT_QUEUE_CAPACITY)
    }

    /// Like [`new()`](Self::new), with an explicit admission queue bound for the
    /// search state domain
    pub fn with_capacity(
        service: S,
        settings: &SearchSettings,
        capacity: usize,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            service: Arc::new(service),
            state: IsolatedDomain::with_capacity("search", SearchState::default(), capacity)?,
            debounce: settings.debounce(),
        })
    }

    /// Submit `query` and wait for its results
    ///
    /// An empty query clears the results immediately.
    pub async fn search(&self, query: &str) -> ResultBox<Vec<SearchResult>> {
        let query = query.trim().to_string();

        if query.is_empty() {
            self.state
                .hop(|s| {
                    s.generation += 1;
                    s.query.clear();
                    s.results.clear();
                    s.is_searching = false;
                    s.last_error = None;
                })
                .await?;
            return Ok(Vec::new());
        }

        let submitted = query.clone();
        let generation = self
            .state
            .hop(move |s| {
                s.generation += 1;
                s.query = submitted;
                s.is_searching = true;
                s.generation
            })
            .await?;
        let mut in_flight = InFlight {
            state: &self.state,
            generation,
            armed: true,
        };

        tokio::time::sleep(self.debounce).await;
        if !self.is_current(generation).await? {
            tracing::debug!(%query, generation, "Query superseded during debounce");
            return Err(ErrorKind::Cancelled);
        }

        let outcome = self.service.search(&query).await;

        let published = self
            .state
            .hop(move |s| {
                if s.generation != generation {
                    return Err(ErrorKind::Cancelled);
                }
                s.is_searching = false;
                match outcome {
                    Ok(results) => {
                        s.results = results.clone();
                        s.last_error = None;
                        Ok(results)
                    }
                    Err(kind) => {
                        s.last_error = Some(kind);
                        Err(kind)
                    }
                }
            })
            .await;
        in_flight.armed = false;
        published?
    }

    /// Current query state
    pub async fn snapshot(&self) -> Result<SearchState, DomainError> {
        self.state.hop(|s| s.clone()).await
    }

    async fn is_current(&self, generation: u64) -> Result<bool, DomainError> {
        self.state.hop(move |s| s.generation == generation).await
    }

    #[cfg(test)]
    fn capacity(&self) -> usize {
        self.state.capacity()
    }
}

// Clears `is_searching` when a search future is dropped before publishing
struct InFlight<'a> {
    state: &'a IsolatedDomain<SearchState>,
    generation: u64,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let generation = self.generation;
        let cleared = self.state.try_post(move |s| {
            if s.generation == generation {
                s.is_searching = false;
            }
        });
        if let Err(error) = cleared {
            tracing::debug!(generation, %error, "Could not clear abandoned search");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(debounce_ms: u64) -> SearchSettings {
        SearchSettings {
            debounce_ms,
            latency_ms: 10,
        }
    }

    #[tokio::test]
    async fn test_mock_service_filters() {
        let service = MockSearchService::with_samples(Duration::from_millis(5));

        let hits = service.search("swift").await.unwrap();
        assert_eq!(hits.len(), 3);

        let none = service.search("rust").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_coordinator_publishes_results() {
        let service = MockSearchService::with_samples(Duration::from_millis(5));
        let coordinator = SearchCoordinator::new(service, &settings(10)).unwrap();

        let hits = coordinator.search("deep dive").await.unwrap();
        assert_eq!(hits.len(), 1);

        let state = coordinator.snapshot().await.unwrap();
        assert_eq!(state.query, "deep dive");
        assert_eq!(state.results, hits);
        assert!(!state.is_searching);
    }

    #[tokio::test]
    async fn test_latest_query_wins() {
        let service = MockSearchService::with_samples(Duration::from_millis(5));
        let coordinator = SearchCoordinator::new(service, &settings(50)).unwrap();

        let first = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move { coordinator.search("swift").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = coordinator.search("async").await;

        assert_eq!(first.await.unwrap(), Err(ErrorKind::Cancelled));
        assert_eq!(second.unwrap().len(), 2);

        let state = coordinator.snapshot().await.unwrap();
        assert_eq!(state.query, "async");
        assert_eq!(state.generation, 2);
    }

    #[tokio::test]
    async fn test_abandoned_search_clears_searching_flag() {
        let service = MockSearchService::with_samples(Duration::from_millis(200));
        let coordinator = SearchCoordinator::new(service, &settings(5)).unwrap();

        let abandoned =
            tokio::time::timeout(Duration::from_millis(50), coordinator.search("swift")).await;
        assert!(abandoned.is_err());

        let state = coordinator.snapshot().await.unwrap();
        assert_eq!(state.query, "swift");
        assert!(!state.is_searching);
        assert!(state.results.is_empty());
    }

    #[tokio::test]
    async fn test_abandoned_stale_search_leaves_newer_one_searching() {
        let service = MockSearchService::with_samples(Duration::from_millis(200));
        let coordinator = SearchCoordinator::new(service, &settings(5)).unwrap();

        let newer = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                coordinator.search("async").await
            })
        };
        let stale =
            tokio::time::timeout(Duration::from_millis(60), coordinator.search("swift")).await;
        assert!(stale.is_err());

        let state = coordinator.snapshot().await.unwrap();
        assert_eq!(state.query, "async");
        assert!(state.is_searching);

        assert_eq!(newer.await.unwrap().unwrap().len(), 2);
        assert!(!coordinator.snapshot().await.unwrap().is_searching);
    }

    #[tokio::test]
    async fn test_with_capacity_sizes_state_domain() {
        let service = MockSearchService::with_samples(Duration::from_millis(5));
        let sized = SearchCoordinator::with_capacity(service.clone(), &settings(5), 4).unwrap();
        assert_eq!(sized.capacity(), 4);

        let default = SearchCoordinator::new(service, &settings(5)).unwrap();
        assert_eq!(default.capacity(), DEFAULT_QUEUE_CAPACITY);
    }

    #[tokio::test]
    async fn test_empty_query_clears_results() {
        let service = MockSearchService::with_samples(Duration::from_millis(5));
        let coordinator = SearchCoordinator::new(service, &settings(5)).unwrap();

        coordinator.search("swift").await.unwrap();
        assert_eq!(coordinator.search("   ").await, Ok(Vec::new()));

        let state = coordinator.snapshot().await.unwrap();
        assert!(state.results.is_empty());
        assert!(state.query.is_empty());
    }
}
