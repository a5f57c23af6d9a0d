//! Asynchronous client for suspending bindings, using Tokio.
//!
//! Result streams prefetch: while the caller processes chunk k, a spawned
//! task already fetches chunk k+1 (see [`Opts::prefetch`](crate::Opts::prefetch)).

mod conn;
mod prepared;
mod stream;

pub use conn::{CancelHandle, Conn};
pub use prepared::PreparedStatement;
pub use stream::ResultStream;

use crate::state::Wait;

/// Suspend the current task as requested by a state machine.
async fn wait(wait: Wait) {
    match wait {
        Wait::Immediately => {}
        Wait::Yield => tokio::task::yield_now().await,
        Wait::Sleep(duration) => tokio::time::sleep(duration).await,
    }
}
