//! Pending query state machine: start, then poll until a header arrives.

use crate::error::{Error, Result};
use crate::opts::Opts;

use super::action::{Action, Wait};
use super::retry::Backoff;

/// Pending query state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// `start_pending_query` was issued; its reply is not known yet.
    Started,
    /// The start reply was "not ready"; polling.
    AwaitingHeader,
    /// A header arrived. `None` once it has been taken.
    Ready(Option<Vec<u8>>),
    /// The link went away before a header arrived. Terminal.
    Detached,
}

/// Pending query state machine.
///
/// Usage:
/// 1. Call `start_pending_query` on the bindings.
/// 2. Feed its reply to [`step`](Self::step).
/// 3. On `Action::PollPendingQuery`, check `is_detached()`: if detached call
///    [`detach`](Self::detach) and stop, otherwise poll and feed the reply to
///    `step` again.
/// 4. On `Action::Finished`, take the header.
#[derive(Debug)]
pub struct PendingQueryStateMachine {
    state: State,
    backoff: Backoff,
    polls: u32,
}

impl PendingQueryStateMachine {
    /// Create a state machine for a query whose start call has been issued.
    pub fn new(opts: &Opts) -> Self {
        Self {
            state: State::Started,
            backoff: Backoff::new(opts),
            polls: 0,
        }
    }

    /// Number of polls requested so far.
    pub fn polls(&self) -> u32 {
        self.polls
    }

    /// Whether the header has arrived.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, State::Ready(_))
    }

    /// Process the reply of the start call or of the last poll.
    pub fn step(&mut self, reply: Option<Vec<u8>>) -> Result<Action> {
        match (&self.state, reply) {
            (State::Started | State::AwaitingHeader, Some(header)) => {
                tracing::trace!(polls = self.polls, len = header.len(), "pending query ready");
                self.state = State::Ready(Some(header));
                Ok(Action::Finished)
            }
            (State::Started, None) => {
                self.state = State::AwaitingHeader;
                self.polls += 1;
                Ok(Action::PollPendingQuery(Wait::Immediately))
            }
            (State::AwaitingHeader, None) => {
                let wait = self.backoff.next_wait()?;
                self.polls += 1;
                Ok(Action::PollPendingQuery(wait))
            }
            (state, _) => Err(Error::Protocol(format!(
                "Unexpected reply in pending query state {:?}",
                state
            ))),
        }
    }

    /// The link was found detached before a poll.
    ///
    /// Moves to the terminal detached state and returns the error to surface.
    pub fn detach(&mut self) -> Error {
        tracing::debug!(polls = self.polls, "link detached while awaiting header");
        self.state = State::Detached;
        Error::LinkDetached
    }

    /// Take the header after `Action::Finished`.
    pub fn take_header(&mut self) -> Option<Vec<u8>> {
        match &mut self.state {
            State::Ready(header) => header.take(),
            _ => None,
        }
    }
}
