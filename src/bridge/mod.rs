//! Continuation bridge - callback-driven operations as single-result futures.
//!
//! # Components
//!
//! - [`ContinuationBridge`]: starts a callback-style operation and hands it a
//!   [`Continuation`]; returns a [`BridgeHandle`] that resolves exactly once
//! - [`compose`]: sequential and parallel composition of bridged operations
//!
//! # Guarantees
//!
//! - The completion slot is filled at most once. Extra resumes are rejected
//!   with [`ResumeError::AlreadyResumed`] and logged; the caller keeps the
//!   first result.
//! - A continuation dropped without a resume (its owner was torn down)
//!   resolves the caller with [`ErrorKind::NetworkFailure`](crate::models::ErrorKind).
//! - A caller that stops waiting does not break the source: the late result
//!   is accepted and discarded.

pub mod compose;
pub mod continuation;

pub use compose::{parallel, parallel_all, sequence, sequence_with};
pub use continuation::{
    BridgeHandle, Continuation, ContinuationBridge, Delivery, ResumeError, with_continuation,
};
