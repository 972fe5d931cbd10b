use crate::metrics::DomainMetrics;
use crate::models::ErrorKind;
use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Default bound of a domain's admission queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

static NEXT_DOMAIN_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    // Id of the domain whose executor owns this thread, 0 elsewhere
    static CURRENT_DOMAIN: Cell<u64> = const { Cell::new(0) };
}

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Errors surfaced at a hop's return point
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("domain '{domain}' is closed")]
    Closed { domain: String },

    #[error("domain '{domain}' queue is full")]
    Busy { domain: String },

    #[error("operation panicked inside domain '{domain}'")]
    OperationPanicked { domain: String },

    #[error("blocking hop into domain '{domain}' from its own executor")]
    Reentrant { domain: String },

    #[error("failed to start executor for domain '{domain}'")]
    Spawn {
        domain: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<DomainError> for ErrorKind {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::Closed { .. } | DomainError::Reentrant { .. } => ErrorKind::Cancelled,
            DomainError::Busy { .. }
            | DomainError::OperationPanicked { .. }
            | DomainError::Spawn { .. } => ErrorKind::ServerFailure,
        }
    }
}

/// A piece of state confined to one serialized executor.
///
/// The state is moved into a dedicated executor thread at construction and is
/// only ever lent, as `&mut S`, to operations admitted through the queue.
/// Nothing else can name it, so reading or writing it outside a hop does not
/// compile.
///
/// Operations run one at a time in admission (FIFO) order. Each runs to
/// completion before the next starts, so concurrent callers always observe
/// the effect of some total order.
///
/// Handles are cheap to clone and all refer to the same state. The executor
/// stops, dropping the state, when the last handle is gone.
///
/// # Usage
///
/// - [`hop()`](Self::hop) / [`hop_blocking()`](Self::hop_blocking): run a
///   closure against the state and get its return value back
/// - [`post()`](Self::post) / [`try_post()`](Self::try_post): enqueue a
///   closure without waiting for it to run
/// - [`name()`](Self::name), [`metrics()`](Self::metrics),
///   [`queue_depth()`](Self::queue_depth): non-isolated, never touch the state
pub struct IsolatedDomain<S> {
    id: u64,
    name: Arc<str>,
    queue: mpsc::Sender<Job<S>>,
    capacity: usize,
    metrics: Arc<DomainMetrics>,
}

// Manual Clone implementation to avoid requiring S: Clone
impl<S> Clone for IsolatedDomain<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: Arc::clone(&self.name),
            queue: self.queue.clone(),
            capacity: self.capacity,
            metrics: Arc::clone(&self.metrics),
        }
    }
}

impl<S> std::fmt::Debug for IsolatedDomain<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsolatedDomain")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}

impl<S: Send + 'static> IsolatedDomain<S> {
    /// Create a domain owning `state` with the default queue bound
    pub fn new(name: impl Into<String>, state: S) -> Result<Self, DomainError> {
        Self::with_capacity(name, state, DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a domain owning `state`
    ///
    /// # Arguments
    /// * `name` - Used for the executor thread name and in logs
    /// * `state` - Moved into the executor; unreachable except through hops
    /// * `capacity` - Admission queue bound; admission waits while it is full
    pub fn with_capacity(
        name: impl Into<String>,
        state: S,
        capacity: usize,
    ) -> Result<Self, DomainError> {
        let name: Arc<str> = Arc::from(name.into());
        let capacity = capacity.max(1);
        let id = NEXT_DOMAIN_ID.fetch_add(1, Ordering::Relaxed);
        let metrics = Arc::new(DomainMetrics::new());
        let (queue, jobs) = mpsc::channel::<Job<S>>(capacity);

        let executor_name = Arc::clone(&name);
        let executor_metrics = Arc::clone(&metrics);
        std::thread::Builder::new()
            .name(format!("domain-{}", name))
            .spawn(move || run_executor(id, executor_name, state, jobs, executor_metrics))
            .map_err(|source| DomainError::Spawn {
                domain: name.to_string(),
                source,
            })?;

        tracing::info!(domain = %name, id, capacity, "Isolated domain started");

        Ok(Self {
            id,
            name,
            queue,
            capacity,
            metrics,
        })
    }

    /// Run `f` with exclusive access to the state and return its result
    ///
    /// Suspends until the operations admitted before this one have drained
    /// and `f` has run. Usable from any async context, including detached
    /// tasks. Once admitted, `f` runs even if the caller stops waiting.
    pub async fn hop<R, F>(&self, f: F) -> Result<R, DomainError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        let (reply, result) = oneshot::channel();
        self.admit(Box::new(move |state: &mut S| {
            let _ = reply.send(f(state));
        }))
        .await?;

        result.await.map_err(|_| self.panicked())
    }

    /// [`hop()`](Self::hop) for plain OS threads
    ///
    /// Panics if called from within an async execution context. Returns
    /// [`DomainError::Reentrant`] when called from this domain's own
    /// executor, where it would deadlock.
    pub fn hop_blocking<R, F>(&self, f: F) -> Result<R, DomainError>
    where
        F: FnOnce(&mut S) -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_current() {
            return Err(DomainError::Reentrant {
                domain: self.name.to_string(),
            });
        }

        let (reply, result) = oneshot::channel();
        self.queue
            .blocking_send(Box::new(move |state: &mut S| {
                let _ = reply.send(f(state));
            }))
            .map_err(|_| self.closed())?;
        self.metrics.record_admitted();

        result.blocking_recv().map_err(|_| self.panicked())
    }

    /// Enqueue `f` without waiting for it to run
    ///
    /// Waits only for admission. Ordering against other operations on this
    /// domain is preserved; the result, if any, is dropped.
    pub async fn post<F>(&self, f: F) -> Result<(), DomainError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        self.admit(Box::new(f)).await
    }

    /// Enqueue `f` without waiting at all
    ///
    /// Returns [`DomainError::Busy`] instead of waiting when the queue is full.
    pub fn try_post<F>(&self, f: F) -> Result<(), DomainError>
    where
        F: FnOnce(&mut S) + Send + 'static,
    {
        match self.queue.try_send(Box::new(f)) {
            Ok(()) => {
                self.metrics.record_admitted();
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.metrics.record_busy_rejection();
                Err(DomainError::Busy {
                    domain: self.name.to_string(),
                })
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(self.closed()),
        }
    }

    async fn admit(&self, job: Job<S>) -> Result<(), DomainError> {
        self.queue.send(job).await.map_err(|_| self.closed())?;
        self.metrics.record_admitted();
        tracing::trace!(domain = %self.name, "Operation admitted");
        Ok(())
    }
}

impl<S> IsolatedDomain<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn metrics(&self) -> &DomainMetrics {
        &self.metrics
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Operations currently waiting in the queue
    pub fn queue_depth(&self) -> usize {
        self.capacity - self.queue.capacity()
    }

    /// Whether the executor has stopped
    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }

    /// Whether the calling thread is this domain's executor
    pub fn is_current(&self) -> bool {
        CURRENT_DOMAIN.with(|current| current.get() == self.id)
    }

    /// Whether both handles refer to the same state
    pub fn same_domain(&self, other: &Self) -> bool {
        self.queue.same_channel(&other.queue)
    }

    fn closed(&self) -> DomainError {
        DomainError::Closed {
            domain: self.name.to_string(),
        }
    }

    fn panicked(&self) -> DomainError {
        DomainError::OperationPanicked {
            domain: self.name.to_string(),
        }
    }
}

/// Run `f` inside `domain`; see [`IsolatedDomain::hop`]
pub async fn hop<S, R, F>(domain: &IsolatedDomain<S>, f: F) -> Result<R, DomainError>
where
    S: Send + 'static,
    F: FnOnce(&mut S) -> R + Send + 'static,
    R: Send + 'static,
{
    domain.hop(f).await
}

/// Whether the calling thread is any domain's executor
pub fn in_any_domain() -> bool {
    CURRENT_DOMAIN.with(|current| current.get() != 0)
}

fn run_executor<S>(
    id: u64,
    name: Arc<str>,
    mut state: S,
    mut jobs: mpsc::Receiver<Job<S>>,
    metrics: Arc<DomainMetrics>,
) {
    CURRENT_DOMAIN.with(|current| current.set(id));
    tracing::debug!(domain = %name, "Domain executor started");

    while let Some(job) = jobs.blocking_recv() {
        let started = Instant::now();
        match panic::catch_unwind(AssertUnwindSafe(|| job(&mut state))) {
            Ok(()) => metrics.record_executed(started.elapsed()),
            Err(_) => {
                metrics.record_panicked();
                tracing::error!(domain = %name, "Operation panicked; domain keeps serving");
            }
        }
    }

    tracing::debug!(domain = %name, "All handles dropped, domain executor stopped");
}
