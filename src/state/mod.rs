//! Sans-I/O state machines for the pending-query and result-stream protocol.
//!
//! These state machines hold the protocol logic without calling the bindings.
//! They produce `Action` values that tell the driver what to call next; the
//! `sync` and `tokio` clients are two drivers over the same machines.

pub mod action;
pub mod pending;
pub mod retry;
pub mod stream;

pub use action::{Action, Wait};
pub use pending::PendingQueryStateMachine;
pub use retry::Backoff;
pub use stream::ResultStreamStateMachine;
