//! Blocking result stream.

use std::sync::Arc;

use crate::bindings::{Bindings, ConnectionId};
use crate::chunk::Chunk;
use crate::error::{Error, Result};
use crate::handler::ChunkHandler;
use crate::link::{ActiveQuery, Link};
use crate::opts::Opts;
use crate::state::action::Action;
use crate::state::stream::ResultStreamStateMachine;

/// Pull-based stream of result chunks.
///
/// Created by [`Conn::send`](super::Conn::send) and
/// [`PreparedStatement::send`](super::PreparedStatement::send). Each
/// [`next_chunk`](Self::next_chunk) call fetches the next chunk on demand,
/// retrying while the engine reports "not ready".
///
/// # Example
///
/// ```ignore
/// let mut stream = conn.send("SELECT * FROM big", true)?;
/// loop {
///     match stream.next_chunk()? {
///         Chunk::Header(header) => open_reader(&header),
///         Chunk::Data(chunk) => decode(&chunk),
///         Chunk::Done => break,
///     }
/// }
/// ```
pub struct ResultStream {
    bindings: Arc<dyn Bindings>,
    link: Arc<Link>,
    active: ActiveQuery,
    state: ResultStreamStateMachine,
}

impl ResultStream {
    pub(crate) fn new(
        bindings: Arc<dyn Bindings>,
        link: Arc<Link>,
        active: ActiveQuery,
        header: Vec<u8>,
        opts: &Opts,
    ) -> Self {
        Self {
            bindings,
            link,
            active,
            state: ResultStreamStateMachine::new(header, opts),
        }
    }

    /// Get the engine connection handle the stream reads from.
    pub fn connection_id(&self) -> ConnectionId {
        self.link.id()
    }

    /// Whether the stream has ended, either at its last chunk or by failure.
    pub fn is_depleted(&self) -> bool {
        self.state.is_depleted()
    }

    /// Get the next element: the header first, then data chunks, then
    /// `Chunk::Done` on every further call.
    ///
    /// After an error the stream is depleted and yields no further data.
    pub fn next_chunk(&mut self) -> Result<Chunk> {
        let result = self.next_inner();
        match &result {
            Ok(Chunk::Done) => self.active.release(),
            Ok(_) => {}
            Err(_) => {
                self.state.fail();
                self.active.release();
            }
        }
        result
    }

    fn next_inner(&mut self) -> Result<Chunk> {
        let mut action = self.state.next();
        loop {
            match action {
                Action::Yield(chunk) => return Ok(chunk),
                Action::FetchQueryResults(pause) => {
                    super::wait(pause);
                    self.link.ensure_open()?;
                    let reply = self
                        .link
                        .check(self.bindings.fetch_query_results(self.link.id()))?;
                    action = self.state.step(reply)?;
                }
                other => {
                    return Err(Error::Protocol(format!(
                        "Unexpected action in result stream: {:?}",
                        other
                    )));
                }
            }
        }
    }

    /// Drive the stream to depletion through a handler.
    pub fn drain<H: ChunkHandler>(&mut self, handler: &mut H) -> Result<()> {
        loop {
            match self.next_chunk()? {
                Chunk::Header(header) => handler.header(&header)?,
                Chunk::Data(chunk) => handler.chunk(&chunk)?,
                Chunk::Done => return handler.end(),
            }
        }
    }
}

/// Iterates over the header and data chunks; the terminal element ends
/// the iteration.
impl Iterator for ResultStream {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_chunk() {
            Ok(chunk) => chunk.into_bytes().map(Ok),
            Err(e) => Some(Err(e)),
        }
    }
}
