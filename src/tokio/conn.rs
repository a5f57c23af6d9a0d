//! Asynchronous engine connection.

use std::path::Path;
use std::sync::Arc;

use crate::bindings::{AsyncBindings, ConnectionId};
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

/// Asynchronous engine connection.
///
/// At most one query may be in flight per connection: while a
/// [`ResultStream`] from [`send`](Self::send) is unfinished, further queries
/// on this connection (or its prepared statements) fail with
/// `Error::InvalidUsage`.
pub struct Conn {
    bindings: Arc<dyn AsyncBindings>,
    link: Arc<Link>,
    opts: Opts,
    logger: Option<Arc<dyn Logger>>,
}

impl Conn {
    /// Open a connection on the given bindings.
    pub async fn new<O: TryInto<Opts>>(bindings: Arc<dyn AsyncBindings>, opts: O) -> Result<Self>
    where
        Error: From<O::Error>,
    {
        let opts = opts.try_into()?;
        let id = bindings.connect().await.map_err(Error::normalize)?;
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
    pub async fn query(&mut self, sql: &str) -> Result<Vec<u8>> {
        let _active = self.link.begin()?;
        self.log(LogTopic::Query, LogEvent::Run, sql);
        let result = self.bindings.run_query(self.link.id(), sql).await;
        self.link.check(result)
    }

    /// Send a query and stream its result.
    ///
    /// Fails with `Error::LinkDetached` if the bindings detach before the
    /// header arrives; no stream is created in that case.
    pub async fn send(&mut self, sql: &str, allow_stream_result: bool) -> Result<ResultStream> {
        let active = self.link.begin()?;
        self.log(LogTopic::Query, LogEvent::Send, sql);
        let header = self.await_header(sql, allow_stream_result).await?;
        Ok(ResultStream::new(
            Arc::clone(&self.bindings),
            Arc::clone(&self.link),
            active,
            header,
            &self.opts,
        ))
    }

    /// Send a query and drive its result stream through a handler.
    pub async fn send_drain<H: ChunkHandler>(
        &mut self,
        sql: &str,
        allow_stream_result: bool,
        handler: &mut H,
    ) -> Result<()> {
        self.send(sql, allow_stream_result)
            .await?
            .drain(handler)
            .await
    }

    /// Start a pending query and poll until its header arrives.
    async fn await_header(&self, sql: &str, allow_stream_result: bool) -> Result<Vec<u8>> {
        let conn = self.link.id();
        let mut state_machine = PendingQueryStateMachine::new(&self.opts);

        let reply = self
            .bindings
            .start_pending_query(conn, sql, allow_stream_result)
            .await;
        let mut action = state_machine.step(self.link.check(reply)?)?;

        // Drive the state machine
        loop {
            match action {
                Action::PollPendingQuery(pause) => {
                    super::wait(pause).await;
                    if self.bindings.is_detached() {
                        return Err(self.link.fail(state_machine.detach()));
                    }
                    let reply = self.bindings.poll_pending_query(conn).await;
                    action = state_machine.step(self.link.check(reply)?)?;
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
    /// from the cancelled query's stream is up to the caller.
    pub async fn cancel_sent(&self) -> Result<bool> {
        cancel(self.bindings.as_ref(), &self.link).await
    }

    /// Get a handle that can cancel this connection's query from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            bindings: Arc::clone(&self.bindings),
            link: Arc::clone(&self.link),
        }
    }

    /// List the tables referenced by a query.
    pub async fn get_table_names(&mut self, sql: &str) -> Result<Vec<String>> {
        self.link.ensure_open()?;
        let result = self.bindings.get_table_names(self.link.id(), sql).await;
        self.link.check(result)
    }

    /// Prepare a statement.
    pub async fn prepare(&mut self, sql: &str) -> Result<PreparedStatement> {
        self.link.ensure_open()?;
        let result = self.bindings.create_prepared(self.link.id(), sql).await;
        let id = self.link.check(result)?;
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
    pub async fn insert_csv_from_path(
        &mut self,
        path: impl AsRef<Path>,
        options: &CsvInsertOptions,
    ) -> Result<()> {
        self.link.ensure_open()?;
        validate_table_name(&options.name)?;
        self.log(LogTopic::Insert, LogEvent::Run, &options.name);
        let result = self
            .bindings
            .insert_csv_from_path(self.link.id(), path.as_ref(), options)
            .await;
        self.link.check(result)
    }

    /// Insert a JSON file into a table.
    pub async fn insert_json_from_path(
        &mut self,
        path: impl AsRef<Path>,
        options: &JsonInsertOptions,
    ) -> Result<()> {
        self.link.ensure_open()?;
        validate_table_name(&options.name)?;
        self.log(LogTopic::Insert, LogEvent::Run, &options.name);
        let result = self
            .bindings
            .insert_json_from_path(self.link.id(), path.as_ref(), options)
            .await;
        self.link.check(result)
    }

    /// Insert an Arrow IPC stream into a table.
    pub async fn insert_arrow_from_ipc_stream(
        &mut self,
        buffer: &[u8],
        options: &ArrowInsertOptions,
    ) -> Result<()> {
        self.link.ensure_open()?;
        validate_table_name(&options.name)?;
        self.log(LogTopic::Insert, LogEvent::Run, &options.name);
        let result = self
            .bindings
            .insert_arrow_from_ipc_stream(self.link.id(), buffer, options)
            .await;
        self.link.check(result)
    }

    /// Close the connection gracefully.
    ///
    /// Prepared statements and result streams of this connection fail with
    /// `Error::ConnectionClosed` afterwards.
    pub async fn close(self) -> Result<()> {
        if self.link.close() {
            tracing::debug!(conn = %self.link.id(), "disconnecting");
            let result = self.bindings.disconnect(self.link.id()).await;
            self.link.check(result)?;
        }
        Ok(())
    }
}

impl Drop for Conn {
    fn drop(&mut self) {
        // Disconnect in the background if not closed explicitly
        if self.link.close()
            && let Ok(runtime) = tokio::runtime::Handle::try_current()
        {
            let bindings = Arc::clone(&self.bindings);
            let id = self.link.id();
            runtime.spawn(async move {
                let _ = bindings.disconnect(id).await;
            });
        }
    }
}

/// Cloneable handle for cancelling a connection's query from another task.
#[derive(Clone)]
pub struct CancelHandle {
    bindings: Arc<dyn AsyncBindings>,
    link: Arc<Link>,
}

impl CancelHandle {
    /// Get the engine connection handle this handle cancels on.
    pub fn connection_id(&self) -> ConnectionId {
        self.link.id()
    }

    /// Same as [`Conn::cancel_sent`].
    pub async fn cancel_sent(&self) -> Result<bool> {
        cancel(self.bindings.as_ref(), &self.link).await
    }
}

async fn cancel(bindings: &dyn AsyncBindings, link: &Link) -> Result<bool> {
    link.ensure_open()?;
    let result = bindings.cancel_pending_query(link.id()).await;
    let cancelled = link.check(result)?;
    tracing::debug!(conn = %link.id(), cancelled, "cancel pending query");
    Ok(cancelled)
}
