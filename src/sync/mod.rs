//! Synchronous client for directly-returning bindings.
//!
//! Calls into [`Bindings`](crate::Bindings) return immediately; "not ready"
//! replies are retried on the calling thread, yielding and then sleeping
//! according to the connection's retry options.

mod conn;
mod prepared;
mod stream;

pub use conn::{CancelHandle, Conn};
pub use prepared::PreparedStatement;
pub use stream::ResultStream;

use crate::state::Wait;

/// Pause the current thread as requested by a state machine.
fn wait(wait: Wait) {
    match wait {
        Wait::Immediately => {}
        Wait::Yield => std::thread::yield_now(),
        Wait::Sleep(duration) => std::thread::sleep(duration),
    }
}
