//! Asynchronous prepared statement.

use std::sync::Arc;

use crate::bindings::{AsyncBindings, StatementId};
use crate::error::Result;
use crate::link::Link;
use crate::log::{LogEntry, LogEvent, LogTopic, Logger};
use crate::opts::Opts;
use crate::types::ToParams;

use super::stream::ResultStream;

/// A statement prepared on a [`Conn`](super::Conn).
///
/// The statement is only valid while its connection is open; afterwards
/// every call fails with `Error::ConnectionClosed`.
pub struct PreparedStatement {
    bindings: Arc<dyn AsyncBindings>,
    link: Arc<Link>,
    id: StatementId,
    sql: String,
    opts: Opts,
    logger: Option<Arc<dyn Logger>>,
}

impl PreparedStatement {
    pub(crate) fn new(
        bindings: Arc<dyn AsyncBindings>,
        link: Arc<Link>,
        id: StatementId,
        sql: String,
        opts: Opts,
        logger: Option<Arc<dyn Logger>>,
    ) -> Self {
        Self {
            bindings,
            link,
            id,
            sql,
            opts,
            logger,
        }
    }

    /// Get the engine statement handle.
    pub fn id(&self) -> StatementId {
        self.id
    }

    /// Get the statement text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    fn log(&self, event: LogEvent) {
        if let Some(logger) = &self.logger {
            logger.log(LogEntry::client(LogTopic::PreparedStatement, event, &self.sql));
        }
    }

    /// Run the statement to completion with positional parameters.
    pub async fn query<P: ToParams>(&mut self, params: P) -> Result<Vec<u8>> {
        let _active = self.link.begin()?;
        self.log(LogEvent::Run);
        let params = params.to_params();
        let result = self
            .bindings
            .run_prepared(self.link.id(), self.id, &params)
            .await;
        self.link.check(result)
    }

    /// Execute the statement and stream its result.
    ///
    /// There is no start/poll phase: the bindings return the header of a
    /// prepared execution directly.
    pub async fn send<P: ToParams>(&mut self, params: P) -> Result<ResultStream> {
        let active = self.link.begin()?;
        self.log(LogEvent::Send);
        let params = params.to_params();
        let result = self
            .bindings
            .send_prepared(self.link.id(), self.id, &params)
            .await;
        let header = self.link.check(result)?;
        Ok(ResultStream::new(
            Arc::clone(&self.bindings),
            Arc::clone(&self.link),
            active,
            header,
            &self.opts,
        ))
    }

    /// Release the statement on the engine.
    pub async fn close(self) -> Result<()> {
        self.link.ensure_open()?;
        tracing::debug!(conn = %self.link.id(), stmt = %self.id, "closing prepared statement");
        let result = self.bindings.close_prepared(self.link.id(), self.id).await;
        self.link.check(result)
    }
}
