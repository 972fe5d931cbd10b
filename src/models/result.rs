use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Closed set of failures a bridged operation can resolve with.
///
/// The variants carry no payload: a caller only ever needs to know which
/// class of failure happened, not the transport details behind it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Transport failed, or the object owning the callback was torn down.
    #[error("network failure")]
    NetworkFailure,

    /// The request was valid but nothing matched it.
    #[error("not found")]
    NotFound,

    /// The payload could not be decoded.
    #[error("decoding failure")]
    DecodingFailure,

    /// Generic upstream failure.
    #[error("server failure")]
    ServerFailure,

    /// The suspended work was abandoned.
    #[error("cancelled")]
    Cancelled,
}

impl ErrorKind {
    /// All variants, in declaration order.
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::NetworkFailure,
        ErrorKind::NotFound,
        ErrorKind::DecodingFailure,
        ErrorKind::ServerFailure,
        ErrorKind::Cancelled,
    ];

    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::NetworkFailure | ErrorKind::ServerFailure)
    }
}

/// The value every bridged operation resolves to, exactly once.
pub type ResultBox<T> = Result<T, ErrorKind>;
