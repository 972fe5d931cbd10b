// Composition of bridged operations
//
// Sequential composition is the default: it short-circuits and never starts
// the second step after a failure. Parallel composition is opt-in and uses
// first-failure-wins.

use crate::models::{ErrorKind, ResultBox};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinError;

/// Run `op_a`, then `op_b`, and pair their payloads
///
/// Both steps are factories so that nothing starts before it is its turn.
/// If `op_a` fails, `op_b` is never called and the composition fails with
/// `op_a`'s error.
pub async fn sequence<A, B, FA, FutA, FB, FutB>(op_a: FA, op_b: FB) -> ResultBox<(A, B)>
where
    FA: FnOnce() -> FutA,
    FutA: Future<Output = ResultBox<A>>,
    FB: FnOnce() -> FutB,
    FutB: Future<Output = ResultBox<B>>,
{
    let a = op_a().await.inspect_err(|error| {
        tracing::debug!(%error, "First step failed, second step not started");
    })?;
    let b = op_b().await?;
    Ok((a, b))
}

/// Like [`sequence`], but the second step is built from the first payload
pub async fn sequence_with<A, B, FutA, FB, FutB>(op_a: FutA, op_b: FB) -> ResultBox<(A, B)>
where
    FutA: Future<Output = ResultBox<A>>,
    FB: FnOnce(&A) -> FutB,
    FutB: Future<Output = ResultBox<B>>,
{
    let a = op_a.await.inspect_err(|error| {
        tracing::debug!(%error, "First step failed, second step not started");
    })?;
    let b = op_b(&a).await?;
    Ok((a, b))
}

/// Run `op_a` and `op_b` concurrently on the worker pool
///
/// Fails with the first error observed. When both finish in the same poll,
/// `op_a` is checked first. The branch still running after a failure is not
/// aborted; it completes on the pool and its result is dropped. A branch that
/// panics re-raises its panic in the caller once it is observed.
pub async fn parallel<A, B, FutA, FutB>(op_a: FutA, op_b: FutB) -> ResultBox<(A, B)>
where
    A: Send + 'static,
    B: Send + 'static,
    FutA: Future<Output = ResultBox<A>> + Send + 'static,
    FutB: Future<Output = ResultBox<B>> + Send + 'static,
{
    let mut task_a = tokio::spawn(op_a);
    let mut task_b = tokio::spawn(op_b);

    tokio::select! {
        biased;

        joined_a = &mut task_a => {
            let a = flatten(joined_a).inspect_err(|error| {
                tracing::debug!(%error, "Left branch failed first, right branch left to drain");
            })?;
            let b = flatten(task_b.await)?;
            Ok((a, b))
        }
        joined_b = &mut task_b => {
            let b = flatten(joined_b).inspect_err(|error| {
                tracing::debug!(%error, "Right branch failed first, left branch left to drain");
            })?;
            let a = flatten(task_a.await)?;
            Ok((a, b))
        }
    }
}

/// Run every operation concurrently, preserving input order in the output
///
/// Same failure policy as [`parallel`]: the first error observed wins and the
/// remaining operations run to completion unobserved. A panicking operation
/// re-raises its panic in the caller, as in [`parallel`].
pub async fn parallel_all<T, Fut, I>(ops: I) -> ResultBox<Vec<T>>
where
    T: Send + 'static,
    Fut: Future<Output = ResultBox<T>> + Send + 'static,
    I: IntoIterator<Item = Fut>,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut slots: Vec<Option<T>> = Vec::new();
    let mut tasks = Vec::new();

    for (index, op) in ops.into_iter().enumerate() {
        let tx = tx.clone();
        tasks.push(tokio::spawn(async move {
            let result = op.await;
            // Receiver is gone once another branch failed; nothing to report to
            let _ = tx.send((index, result));
        }));
        slots.push(None);
    }
    drop(tx);

    while let Some((index, result)) = rx.recv().await {
        let value = result.inspect_err(|error| {
            tracing::debug!(
                index,
                %error,
                "Operation failed, remaining operations left to drain"
            );
        })?;
        slots[index] = Some(value);
    }

    let mut values = Vec::with_capacity(slots.len());
    for (slot, task) in slots.into_iter().zip(tasks) {
        match slot {
            Some(value) => values.push(value),
            // Only a task that died before reporting leaves its slot empty
            None => values.push(flatten(task.await.map(|()| Err(ErrorKind::Cancelled)))?),
        }
    }
    Ok(values)
}

fn flatten<T>(joined: Result<ResultBox<T>, JoinError>) -> ResultBox<T> {
    match joined {
        Ok(result) => result,
        Err(error) if error.is_panic() => std::panic::resume_unwind(error.into_panic()),
        Err(_) => Err(ErrorKind::Cancelled),
    }
}
