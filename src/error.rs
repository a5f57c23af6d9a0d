//! Error types for zero-engine.

use std::time::Duration;

use thiserror::Error;

/// Result type for zero-engine operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Message fragments that identify an engine fault caused by the worker or
/// link going away. Matched case-insensitively.
const LINK_TERMINATED_MARKERS: &[&str] = &[
    "worker terminated",
    "worker has been terminated",
    "worker was terminated",
    "link terminated",
    "connection closed by worker",
    "detached",
];

/// Error type for zero-engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The bindings surface lost its execution context while a pending query
    /// was waiting for its header.
    #[error("Link detached before the query produced a result header")]
    LinkDetached,

    /// An engine fault that indicates the worker or link is gone.
    #[error("Link terminated: {0}")]
    LinkTerminated(String),

    /// The engine rejected the call (malformed query, unknown table, ...)
    #[error("Engine error: {0}")]
    Engine(String),

    /// A retry loop exceeded `Opts::retry_timeout`.
    #[error("Timed out after {0:?} waiting for the engine")]
    Timeout(Duration),

    /// The connection was closed; derived handles can no longer be used.
    #[error("Connection is closed")]
    ConnectionClosed,

    /// Protocol error (a reply the state machine cannot accept in its current state)
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid usage (e.g., a second query while a result stream is active)
    #[error("Invalid usage: {0}")]
    InvalidUsage(String),

    /// A prefetch task failed to complete.
    #[cfg(feature = "tokio")]
    #[error("Prefetch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Build an engine error from any message.
    pub fn engine(message: impl Into<String>) -> Self {
        Error::Engine(message.into())
    }

    /// Turn an engine fault that reports a dead worker into `LinkTerminated`.
    ///
    /// Every other error is returned unchanged.
    pub fn normalize(self) -> Self {
        match self {
            Error::Engine(message) if indicates_link_terminated(&message) => {
                Error::LinkTerminated(message)
            }
            other => other,
        }
    }

    /// Returns true if the error means the link to the engine is gone.
    pub fn is_link_lost(&self) -> bool {
        matches!(self, Error::LinkDetached | Error::LinkTerminated(_))
    }

    /// Returns true if the error indicates the connection cannot be reused.
    pub fn is_connection_broken(&self) -> bool {
        self.is_link_lost() || matches!(self, Error::ConnectionClosed)
    }
}

impl From<std::convert::Infallible> for Error {
    fn from(err: std::convert::Infallible) -> Self {
        match err {}
    }
}

fn indicates_link_terminated(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    LINK_TERMINATED_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}
