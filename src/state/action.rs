//! Action types for state machine requests.

use std::time::Duration;

use crate::chunk::Chunk;

/// How long the driver should pause before issuing the next call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Issue the call right away.
    Immediately,
    /// Give other work a chance to run first (thread or task yield).
    Yield,
    /// Sleep (or suspend) for the given duration.
    Sleep(Duration),
}

/// Action requested by a state machine.
///
/// The driver performs the requested call and feeds its reply back through
/// the machine's `step()` method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Check `is_detached()`, then call `poll_pending_query`.
    ///
    /// If the link is detached, the driver must call `detach()` on the
    /// machine instead of polling.
    PollPendingQuery(Wait),

    /// Call `fetch_query_results`.
    FetchQueryResults(Wait),

    /// Hand this chunk to the caller.
    Yield(Chunk),

    /// The pending query produced its header; take it with `take_header()`.
    Finished,
}
