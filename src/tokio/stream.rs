//! Prefetching result stream.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::bindings::{AsyncBindings, ConnectionId};
use crate::chunk::Chunk;
use crate::error::{Error, Result};
use crate::handler::ChunkHandler;
use crate::link::{ActiveQuery, Link};
use crate::opts::Opts;
use crate::state::action::Action;
use crate::state::stream::ResultStreamStateMachine;

type Fetch = JoinHandle<Result<Option<Vec<u8>>>>;

/// Pull-based stream of result chunks.
///
/// Created by [`Conn::send`](super::Conn::send) and
/// [`PreparedStatement::send`](super::PreparedStatement::send).
///
/// With `Opts::prefetch` enabled, handing out the header or a data chunk
/// spawns the fetch of the following chunk and yields once, so the fetch is
/// issued before chunk k reaches the caller, also on a current-thread
/// runtime. At most one fetch is in flight. Dropping the stream aborts it.
///
/// # Example
///
/// ```ignore
/// let mut stream = conn.send("SELECT * FROM big", true).await?;
/// loop {
///     match stream.next_chunk().await? {
///         Chunk::Header(header) => open_reader(&header),
///         Chunk::Data(chunk) => decode(&chunk),
///         Chunk::Done => break,
///     }
/// }
/// ```
pub struct ResultStream {
    bindings: Arc<dyn AsyncBindings>,
    link: Arc<Link>,
    active: ActiveQuery,
    state: ResultStreamStateMachine,
    prefetch: bool,
    in_flight: Option<Fetch>,
}

impl ResultStream {
    pub(crate) fn new(
        bindings: Arc<dyn AsyncBindings>,
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
            prefetch: opts.prefetch,
            in_flight: None,
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

    /// Whether a prefetch is currently in flight.
    pub fn is_prefetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Get the next element: the header first, then data chunks, then
    /// `Chunk::Done` on every further call.
    ///
    /// After an error the stream is depleted and yields no further data.
    pub async fn next_chunk(&mut self) -> Result<Chunk> {
        let result = self.next_inner().await;
        match &result {
            Ok(Chunk::Done) => self.active.release(),
            Ok(_) => {}
            Err(_) => {
                self.state.fail();
                self.abort_prefetch();
                self.active.release();
            }
        }
        result
    }

    async fn next_inner(&mut self) -> Result<Chunk> {
        let mut action = self.state.next();
        loop {
            match action {
                Action::Yield(chunk) => {
                    if self.prefetch && !chunk.is_final() && self.spawn_prefetch() {
                        // Let the fetch task reach the bindings before the chunk is handed out
                        tokio::task::yield_now().await;
                    }
                    return Ok(chunk);
                }
                Action::FetchQueryResults(pause) => {
                    let reply = match self.in_flight.take() {
                        Some(fetch) => fetch.await?,
                        None => {
                            super::wait(pause).await;
                            self.link.ensure_open()?;
                            self.bindings.fetch_query_results(self.link.id()).await
                        }
                    };
                    action = self.state.step(self.link.check(reply)?)?;
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

    /// Spawn the fetch of the next chunk. Returns false if one is already in flight.
    fn spawn_prefetch(&mut self) -> bool {
        if self.in_flight.is_some() {
            return false;
        }
        let bindings = Arc::clone(&self.bindings);
        let link = Arc::clone(&self.link);
        tracing::trace!(conn = %link.id(), chunks = self.state.chunks(), "prefetching next chunk");
        self.in_flight = Some(tokio::spawn(async move {
            link.ensure_open()?;
            bindings.fetch_query_results(link.id()).await
        }));
        true
    }

    fn abort_prefetch(&mut self) {
        if let Some(fetch) = self.in_flight.take() {
            fetch.abort();
        }
    }

    /// Drive the stream to depletion through a handler.
    pub async fn drain<H: ChunkHandler>(&mut self, handler: &mut H) -> Result<()> {
        loop {
            match self.next_chunk().await? {
                Chunk::Header(header) => handler.header(&header)?,
                Chunk::Data(chunk) => handler.chunk(&chunk)?,
                Chunk::Done => return handler.end(),
            }
        }
    }
}

impl Drop for ResultStream {
    fn drop(&mut self) {
        self.abort_prefetch();
    }
}
