//! Errors reported by [`Proxy`](super::Proxy) operations.

use thiserror::Error;

use crate::fragment::SplitError;

/// Errors returned by [`Proxy::send`](super::Proxy::send).
#[derive(Debug, Error)]
pub enum SendError {
    /// The message could not be encoded or split.
    #[error(transparent)]
    Split(#[from] SplitError),
    /// The outbound pump has stopped.
    #[error("outbound queue closed")]
    Closed,
}

/// Errors returned by [`Proxy::start`](super::Proxy::start).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ProxyError {
    /// The pumps were already spawned.
    #[error("proxy already started")]
    AlreadyStarted,
}
