//! Synchronous engine connection.

use std::path::Path;
use std::sync::Arc;

use crate::bindings::{Bindings, ConnectionId};
use crate::error::{Error, Result};
use crate::handler::ChunkHandler;
use crate::insert::{
    ArrowInsertOptions, CsvInsertOptions, JsonInsertOptions, validate_table_name,
};
use crate::link::Link;
use crate::log::{LogEntry, LogEvent, LogTopic, Logger, TracingLogger};
use crate::opts::Opts;
use crate::state::action::Action;
use crate::state::pending::PendingQueryStateMachine;

use super::prepared::PreparedStatement;
use super::stream::ResultStream;

/// Synchronous engine connection.
///
/// At most one query may be in flight per connection: while a
/// [`ResultStream`] from [`send`](Self::send) is unfinished, further queries
/// on this connection (or its prepared statements) fail with
/// `Error::InvalidUsage`. Drain or drop the stream to release it.
pub struct Conn {
    bindings: Arc<dyn Bindings>,
    link: Arc<Link>,
    opts: Opts,
    logger: Option<Arc<dyn Logger>>,
}

impl Conn {
    /// Open a connection on the given bindings.
    pub fn new<O: TryInto<Opts>>(bindings: Arc<dyn Bindings>, opts: O) -> Result<Self>
    where
        Error: From<O::Error>,
    {
        let opts = opts.try_into()?;
        let id = bindings.connect().map_err(Error::normalize)?;
        tracing::debug!(conn = %id, "connected");

        let logger: Option<Arc<dyn Logger>> = if opts.log_queries {
            Some(Arc::new(TracingLogger))
        } else {
            None
        };

        Ok(Self {
            bindings,
            link: Link::new(id),
            opts,
            logger,
        })
    }

    /// Get the engine connection handle.
    pub fn connection_id(&self) -> ConnectionId {
        self.link.id()
    }

    /// Get the options this connection was opened with.
    pub fn opts(&self) -> &Opts {
        &self.opts
    }

    /// Check if the link to the engine has been lost.
    pub fn is_broken(&self) -> bool {
        self.link.is_broken()
    }

    /// Replace the query logger.
    ///
    /// Entries are emitted before each query, independent of `Opts::log_queries`,
    /// which only selects whether the default logger is installed.
    pub fn set_logger<L: Logger + 'static>(&mut self, logger: L) {
        self.logger = Some(Arc::new(logger));
    }

    /// Stop logging queries.
    pub fn clear_logger(&mut self) {
        self.logger = None;
    }

    fn log(&self, topic: LogTopic, event: LogEvent, sql: &str) {
        if let Some(logger) = &self.logger {
            logger.log(LogEntry::client(topic, event, sql));
        }
    }

    /// Run a query to completion and return the encoded result.
    pub fn query(&mut self, sql: &str) -> Result<Vec<u8>> {
        let _active = self.link.begin()?;
        self.log(LogTopic::Query, LogEvent::Run, sql);
        self.link
            .check(self.bindings.run_query(self.link.id(), sql))
    }

    /// Send a query and stream its result.
    ///
    /// With `allow_stream_result` the engine may produce chunks incrementally;
    /// otherwise it materializes the whole result before the header.
    ///
    /// Fails with `Error::LinkDetached` if the bindings detach before the
    /// header arrives; no stream is created in that case.
    pub fn send(&mut self, sql: &str, allow_stream_result: bool) -> Result<ResultStream> {
        let active = self.link.begin()?;
        self.log(LogTopic::Query, LogEvent::Send, sql);
        let header = self.await_header(sql, allow_stream_result)?;
        Ok(ResultStream::new(
            Arc::clone(&self.bindings),
            Arc::clone(&self.link),
            active,
            header,
            &self.opts,
        ))
    }

    /// Send a query and drive its result stream through a handler.
    pub fn send_drain<H: ChunkHandler>(
        &mut self,
        sql: &str,
        allow_stream_result: bool,
        handler: &mut H,
    ) -> Result<()> {
        self.send(sql, allow_stream_result)?.drain(handler)
    }

    /// Start a pending query and poll until its header arrives.
    fn await_header(&self, sql: &str, allow_stream_result: bool) -> Result<Vec<u8>> {
        let conn = self.link.id();
        let mut state_machine = PendingQueryStateMachine::new(&self.opts);

        let reply = self.link.check(
            self.bindings
                .start_pending_query(conn, sql, allow_stream_result),
        )?;
        let mut action = state_machine.step(reply)?;

        // Drive the state machine
        loop {
            match action {
                Action::PollPendingQuery(pause) => {
                    super::wait(pause);
                    if self.bindings.is_detached() {
                        return Err(self.link.fail(state_machine.detach()));
                    }
                    let reply = self
                        .link
                        .check(self.bindings.poll_pending_query(conn))?;
                    action = state_machine.step(reply)?;
                }
                Action::Finished => break,
                other => {
                    return Err(Error::Protocol(format!(
                        "Unexpected action while awaiting header: {:?}",
                        other
                    )));
                }
            }
        }

        tracing::debug!(conn = %conn, polls = state_machine.polls(), "query header ready");
        state_machine
            .take_header()
            .ok_or_else(|| Error::Protocol("No result header".into()))
    }

    /// Cancel the query most recently sent on this connection.
    ///
    /// Returns whether the engine applied the cancellation. Reading further
    /// from the cancelled query's stream is up to the caller; the engine is
    /// not required to produce more chunks.
    pub fn cancel_sent(&self) -> Result<bool> {
        cancel(self.bindings.as_ref(), &self.link)
    }

    /// Get a handle that can cancel this connection's query from another thread.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            bindings: Arc::clone(&self.bindings),
            link: Arc::clone(&self.link),
        }
    }

    /// List the tables referenced by a query.
    pub fn get_table_names(&mut self, sql: &str) -> Result<Vec<String>> {
        self.link.ensure_open()?;
        self.link
            .check(self.bindings.get_table_names(self.link.id(), sql))
    }

    /// Prepare a statement.
    pub fn prepare(&mut self, sql: &str) -> Result<PreparedStatement> {
        self.link.ensure_open()?;
        let id = self
            .link
            .check(self.bindings.create_prepared(self.link.id(), sql))?;
        tracing::debug!(conn = %self.link.id(), stmt = %id, "prepared statement");
        Ok(PreparedStatement::new(
            Arc::clone(&self.bindings),
            Arc::clone(&self.link),
            id,
            sql.to_owned(),
            self.opts.clone(),
            self.logger.clone(),
        ))
    }

    /// Insert a CSV file into a table.
    pub fn insert_csv_from_path(
        &mut self,
        path: impl AsRef<Path>,
        options: &CsvInsertOptions,
    ) -> Result<()> {
        self.link.ensure_open()?;
        validate_table_name(&options.name)?;
        self.log(LogTopic::Insert, LogEvent::Run, &options.name);
        self.link.check(self.bindings.insert_csv_from_path(
            self.link.id(),
            path.as_ref(),
            options,
        ))
    }

    /// Insert a JSON file into a table.
    pub fn insert_json_from_path(
        &mut self,
        path: impl AsRef<Path>,
        options: &JsonInsertOptions,
    ) -> Result<()> {
        self.link.ensure_open()?;
        validate_table_name(&options.name)?;
        self.log(LogTopic::Insert, LogEvent::Run, &options.name);
        self.link.check(self.bindings.insert_json_from_path(
            self.link.id(),
            path.as_ref(),
            options,
        ))
    }

    /// Insert an Arrow IPC stream into a table.
    pub fn insert_arrow_from_ipc_stream(
        &mut self,
        buffer: &[u8],
        options: &ArrowInsertOptions,
    ) -> Result<()> {
        self.link.ensure_open()?;
        validate_table_name(&options.name)?;
        self.log(LogTopic::Insert, LogEvent::Run, &options.name);
        self.link.check(self.bindings.insert_arrow_from_ipc_stream(
            self.link.id(),
            buffer,
            options,
        ))
    }

    /// Close the connection.
    ///
    /// Prepared statements and result streams of this connection fail with
    /// `Error::ConnectionClosed` afterwards.
    pub fn close(self) -> Result<()> {
        if self.link.close() {
            tracing::debug!(conn = %self.link.id(), "disconnecting");
            self.link
                .check(self.bindings.disconnect(self.link.id()))?;
        }
        Ok(())
    }
}

impl Drop for Conn {
    fn drop(&mut self) {
        // Disconnect if not closed explicitly, ignore errors
        if self.link.close() {
            let _ = self.bindings.disconnect(self.link.id());
        }
    }
}

/// Cloneable handle for cancelling a connection's query from another thread.
#[derive(Clone)]
pub struct CancelHandle {
    bindings: Arc<dyn Bindings>,
    link: Arc<Link>,
}

impl CancelHandle {
    /// Get the engine connection handle this handle cancels on.
    pub fn connection_id(&self) -> ConnectionId {
        self.link.id()
    }

    /// Same as [`Conn::cancel_sent`].
    pub fn cancel_sent(&self) -> Result<bool> {
        cancel(self.bindings.as_ref(), &self.link)
    }
}

fn cancel(bindings: &dyn Bindings, link: &Link) -> Result<bool> {
    link.ensure_open()?;
    let cancelled = link.check(bindings.cancel_pending_query(link.id()))?;
    tracing::debug!(conn = %link.id(), cancelled, "cancel pending query");
    Ok(cancelled)
}
