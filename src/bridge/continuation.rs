use crate::metrics::BRIDGE_METRICS;
use crate::models::{ErrorKind, ResultBox};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::oneshot;

/// Errors returned to code that resumes a continuation
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeError {
    #[error("continuation already resumed")]
    AlreadyResumed,
}

/// What happened to a successfully accepted resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The waiting caller received the result
    Delivered,

    /// The caller had already stopped waiting; the result was dropped
    Discarded,
}

/// Adapter that turns one callback-driven operation into a future.
///
/// The bridge only carries a label used in logs; each call to
/// [`invoke()`](Self::invoke) creates a fresh single-use completion slot.
///
/// # Example
/// ```ignore
/// let handle = ContinuationBridge::new("fetch_message").invoke(|k| {
///     legacy_fetch(move |text| {
///         let _ = k.succeed(text);
///     });
/// });
/// let text = handle.await?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ContinuationBridge {
    label: &'static str,
}

impl ContinuationBridge {
    pub const fn new(label: &'static str) -> Self {
        Self { label }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Start the wrapped operation and return the handle to await its result
    ///
    /// `start` runs immediately, on the calling thread, with the continuation
    /// it must eventually resume. Awaiting the returned handle suspends until
    /// that happens. If every clone of the continuation is dropped without a
    /// resume, the handle resolves with [`ErrorKind::NetworkFailure`].
    pub fn invoke<T, F>(&self, start: F) -> BridgeHandle<T>
    where
        F: FnOnce(Continuation<T>),
    {
        let (sender, receiver) = oneshot::channel();
        let resolved = Arc::new(AtomicBool::new(false));

        let continuation = Continuation {
            slot: Arc::new(Slot {
                resolved: Arc::clone(&resolved),
                sender: Mutex::new(Some(sender)),
                label: self.label,
            }),
        };

        BRIDGE_METRICS.record_started();
        tracing::trace!(bridge = self.label, "Bridge started");

        start(continuation);

        BridgeHandle {
            receiver,
            resolved,
            label: self.label,
        }
    }
}

/// Shorthand for an unlabeled [`ContinuationBridge::invoke`]
pub fn with_continuation<T, F>(start: F) -> BridgeHandle<T>
where
    F: FnOnce(Continuation<T>),
{
    ContinuationBridge::new("anonymous").invoke(start)
}

/// Single-use completion slot shared by all clones of a continuation
struct Slot<T> {
    resolved: Arc<AtomicBool>,
    sender: Mutex<Option<oneshot::Sender<ResultBox<T>>>>,
    label: &'static str,
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        // The sender drops with us, which wakes the caller with a receive error
        if !self.resolved.load(Ordering::Acquire) {
            BRIDGE_METRICS.record_owner_gone();
            tracing::debug!(
                bridge = self.label,
                "Continuation dropped before resume; caller resolves with NetworkFailure"
            );
        }
    }
}

/// The resume side of a bridge, handed to the callback-driven operation.
///
/// Clones share one slot. Only the first [`resume()`](Self::resume) across
/// all clones is honored.
pub struct Continuation<T> {
    slot: Arc<Slot<T>>,
}

// Manual Clone implementation to avoid requiring T: Clone
impl<T> Clone for Continuation<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> std::fmt::Debug for Continuation<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Continuation")
            .field("label", &self.slot.label)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<T> Continuation<T> {
    /// Fill the slot with `result`
    ///
    /// # Returns
    /// - `Ok(Delivery::Delivered)` if the caller received it
    /// - `Ok(Delivery::Discarded)` if the caller stopped waiting first
    /// - `Err(ResumeError::AlreadyResumed)` on any later attempt; the caller
    ///   is not resumed again and keeps the first result
    pub fn resume(&self, result: ResultBox<T>) -> Result<Delivery, ResumeError> {
        if self.slot.resolved.swap(true, Ordering::AcqRel) {
            BRIDGE_METRICS.record_double_resume();
            tracing::error!(
                bridge = self.slot.label,
                "Continuation resumed more than once; extra result rejected"
            );
            return Err(ResumeError::AlreadyResumed);
        }

        let sender = self
            .slot
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(sender) = sender else {
            return Err(ResumeError::AlreadyResumed);
        };

        match sender.send(result) {
            Ok(()) => {
                BRIDGE_METRICS.record_delivered();
                tracing::trace!(bridge = self.slot.label, "Bridge resumed");
                Ok(Delivery::Delivered)
            }
            Err(_late) => {
                BRIDGE_METRICS.record_discarded();
                tracing::debug!(
                    bridge = self.slot.label,
                    "Caller stopped waiting; late result discarded"
                );
                Ok(Delivery::Discarded)
            }
        }
    }

    pub fn succeed(&self, value: T) -> Result<Delivery, ResumeError> {
        self.resume(Ok(value))
    }

    pub fn fail(&self, kind: ErrorKind) -> Result<Delivery, ResumeError> {
        self.resume(Err(kind))
    }

    /// Whether some clone has already filled the slot
    pub fn is_resolved(&self) -> bool {
        self.slot.resolved.load(Ordering::Acquire)
    }

    /// Whether the awaiting caller has gone away
    ///
    /// Sources that can stop early poll this and resolve with
    /// [`ErrorKind::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        self.slot
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|sender| sender.is_closed())
    }

    /// Convert into a plain completion callback for callback-style APIs
    ///
    /// Rejected resumes are already logged by [`resume()`](Self::resume).
    pub fn into_completion(self) -> impl FnOnce(ResultBox<T>) + Send + 'static
    where
        T: Send + 'static,
    {
        move |result| {
            let _ = self.resume(result);
        }
    }
}

/// The awaiting side of a bridge: a future resolving to the single result
#[must_use = "a bridge handle does nothing unless awaited"]
pub struct BridgeHandle<T> {
    receiver: oneshot::Receiver<ResultBox<T>>,
    resolved: Arc<AtomicBool>,
    label: &'static str,
}

impl<T> BridgeHandle<T> {
    /// Whether the completion slot has been filled
    pub fn is_resolved(&self) -> bool {
        self.resolved.load(Ordering::Acquire)
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Block the current thread until the result arrives
    ///
    /// For plain OS threads only; panics if called from within an async
    /// execution context.
    pub fn wait_blocking(self) -> ResultBox<T> {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(ErrorKind::NetworkFailure))
    }
}

impl<T> Future for BridgeHandle<T> {
    type Output = ResultBox<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(_)) => {
                tracing::debug!(
                    bridge = this.label,
                    "Continuation gone, resolving with NetworkFailure"
                );
                Poll::Ready(Err(ErrorKind::NetworkFailure))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl<T> std::fmt::Debug for BridgeHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeHandle")
            .field("label", &self.label)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}
