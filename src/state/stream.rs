//! Result stream state machine: header first, then chunks until an empty one.

use crate::chunk::Chunk;
use crate::error::{Error, Result};
use crate::opts::Opts;

use super::action::{Action, Wait};
use super::retry::Backoff;

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    /// The header has not been handed out yet.
    NotStarted { header: Vec<u8> },
    /// Between chunks, or waiting for the reply of a fetch.
    Streaming,
    /// An empty chunk arrived or a call failed. No further fetches.
    Depleted,
}

/// Result stream state machine.
///
/// Every `next` call on a stream starts with [`next`](Self::next). A
/// `FetchQueryResults` action is answered by feeding the fetch reply to
/// [`step`](Self::step) until the machine yields a chunk.
#[derive(Debug)]
pub struct ResultStreamStateMachine {
    state: State,
    backoff: Backoff,
    chunks: u64,
}

impl ResultStreamStateMachine {
    pub fn new(header: Vec<u8>, opts: &Opts) -> Self {
        Self {
            state: State::NotStarted { header },
            backoff: Backoff::new(opts),
            chunks: 0,
        }
    }

    /// Whether the stream has ended. No bindings call happens after this.
    pub fn is_depleted(&self) -> bool {
        self.state == State::Depleted
    }

    /// Whether the header has been handed out.
    pub fn is_started(&self) -> bool {
        !matches!(self.state, State::NotStarted { .. })
    }

    /// Data chunks handed out so far (header and terminal excluded).
    pub fn chunks(&self) -> u64 {
        self.chunks
    }

    /// Begin producing the next element.
    pub fn next(&mut self) -> Action {
        match std::mem::replace(&mut self.state, State::Streaming) {
            State::NotStarted { header } => Action::Yield(Chunk::Header(header)),
            State::Streaming => {
                self.backoff.reset();
                Action::FetchQueryResults(Wait::Immediately)
            }
            State::Depleted => {
                self.state = State::Depleted;
                Action::Yield(Chunk::Done)
            }
        }
    }

    /// Process the reply of a fetch.
    ///
    /// `None` (not ready) asks for another fetch after a pause. An empty
    /// buffer ends the stream.
    pub fn step(&mut self, reply: Option<Vec<u8>>) -> Result<Action> {
        if self.state != State::Streaming {
            return Err(Error::Protocol(format!(
                "Unexpected fetch reply in result stream state {:?}",
                self.state
            )));
        }
        match reply {
            None => {
                let wait = self.backoff.next_wait()?;
                tracing::trace!(attempts = self.backoff.attempts(), "chunk not ready");
                Ok(Action::FetchQueryResults(wait))
            }
            Some(buffer) if buffer.is_empty() => {
                tracing::trace!(chunks = self.chunks, "result stream depleted");
                self.state = State::Depleted;
                Ok(Action::Yield(Chunk::Done))
            }
            Some(buffer) => {
                self.chunks += 1;
                Ok(Action::Yield(Chunk::Data(buffer)))
            }
        }
    }

    /// A call failed; end the stream without further fetches.
    pub fn fail(&mut self) {
        self.state = State::Depleted;
    }
}
