//! The bindings surface the client drives.
//!
//! An engine is reached only through opaque connection and statement handles.
//! Implement [`Bindings`] for an engine whose calls return directly, or
//! [`AsyncBindings`] for one whose calls suspend.
//!
//! Three operations may answer "not ready yet" with `Ok(None)`:
//! `start_pending_query`, `poll_pending_query` and `fetch_query_results`.
//! The client retries those itself. For `fetch_query_results`, `Ok(Some(buf))`
//! with an empty `buf` marks the end of the result stream.

use std::path::Path;

use crate::error::Result;
use crate::insert::{ArrowInsertOptions, CsvInsertOptions, JsonInsertOptions};
use crate::types::Param;

/// Opaque handle of an engine connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u32);

/// Opaque handle of a prepared statement, valid only on its connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatementId(pub u32);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

impl std::fmt::Display for StatementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stmt#{}", self.0)
    }
}

/// Directly-returning bindings surface.
///
/// Every call returns immediately. Readiness is established only by the
/// client retrying the "not ready" operations.
pub trait Bindings: Send + Sync {
    /// Open a new connection.
    fn connect(&self) -> Result<ConnectionId>;

    /// Release a connection.
    fn disconnect(&self, conn: ConnectionId) -> Result<()>;

    /// Run a query to completion and return the encoded result.
    fn run_query(&self, conn: ConnectionId, sql: &str) -> Result<Vec<u8>>;

    /// Start a query. Returns the result header, or `None` if the caller must poll.
    fn start_pending_query(
        &self,
        conn: ConnectionId,
        sql: &str,
        allow_stream_result: bool,
    ) -> Result<Option<Vec<u8>>>;

    /// Poll the pending query. Invalid once [`is_detached`](Self::is_detached) is true.
    fn poll_pending_query(&self, conn: ConnectionId) -> Result<Option<Vec<u8>>>;

    /// Whether the execution context behind the bindings has been torn down.
    fn is_detached(&self) -> bool;

    /// Cancel the pending query. Returns whether the cancellation applied.
    fn cancel_pending_query(&self, conn: ConnectionId) -> Result<bool>;

    /// Fetch the next result chunk.
    fn fetch_query_results(&self, conn: ConnectionId) -> Result<Option<Vec<u8>>>;

    /// List the tables a query references.
    fn get_table_names(&self, conn: ConnectionId, sql: &str) -> Result<Vec<String>>;

    fn create_prepared(&self, conn: ConnectionId, sql: &str) -> Result<StatementId>;

    fn close_prepared(&self, conn: ConnectionId, stmt: StatementId) -> Result<()>;

    /// Run a prepared statement to completion.
    fn run_prepared(
        &self,
        conn: ConnectionId,
        stmt: StatementId,
        params: &[Param],
    ) -> Result<Vec<u8>>;

    /// Execute a prepared statement and return its result header.
    fn send_prepared(
        &self,
        conn: ConnectionId,
        stmt: StatementId,
        params: &[Param],
    ) -> Result<Vec<u8>>;

    fn insert_csv_from_path(
        &self,
        conn: ConnectionId,
        path: &Path,
        options: &CsvInsertOptions,
    ) -> Result<()>;

    fn insert_json_from_path(
        &self,
        conn: ConnectionId,
        path: &Path,
        options: &JsonInsertOptions,
    ) -> Result<()>;

    fn insert_arrow_from_ipc_stream(
        &self,
        conn: ConnectionId,
        buffer: &[u8],
        options: &ArrowInsertOptions,
    ) -> Result<()>;
}

/// Suspending bindings surface.
///
/// Same contract as [`Bindings`]; calls may suspend the caller without
/// blocking other tasks.
#[async_trait::async_trait]
pub trait AsyncBindings: Send + Sync + 'static {
    async fn connect(&self) -> Result<ConnectionId>;

    async fn disconnect(&self, conn: ConnectionId) -> Result<()>;

    async fn run_query(&self, conn: ConnectionId, sql: &str) -> Result<Vec<u8>>;

    async fn start_pending_query(
        &self,
        conn: ConnectionId,
        sql: &str,
        allow_stream_result: bool,
    ) -> Result<Option<Vec<u8>>>;

    async fn poll_pending_query(&self, conn: ConnectionId) -> Result<Option<Vec<u8>>>;

    /// Whether the execution context behind the bindings has been torn down.
    ///
    /// This is a plain flag check and never suspends.
    fn is_detached(&self) -> bool;

    async fn cancel_pending_query(&self, conn: ConnectionId) -> Result<bool>;

    async fn fetch_query_results(&self, conn: ConnectionId) -> Result<Option<Vec<u8>>>;

    async fn get_table_names(&self, conn: ConnectionId, sql: &str) -> Result<Vec<String>>;

    async fn create_prepared(&self, conn: ConnectionId, sql: &str) -> Result<StatementId>;

    async fn close_prepared(&self, conn: ConnectionId, stmt: StatementId) -> Result<()>;

    async fn run_prepared(
        &self,
        conn: ConnectionId,
        stmt: StatementId,
        params: &[Param],
    ) -> Result<Vec<u8>>;

    async fn send_prepared(
        &self,
        conn: ConnectionId,
        stmt: StatementId,
        params: &[Param],
    ) -> Result<Vec<u8>>;

    async fn insert_csv_from_path(
        &self,
        conn: ConnectionId,
        path: &Path,
        options: &CsvInsertOptions,
    ) -> Result<()>;

    async fn insert_json_from_path(
        &self,
        conn: ConnectionId,
        path: &Path,
        options: &JsonInsertOptions,
    ) -> Result<()>;

    async fn insert_arrow_from_ipc_stream(
        &self,
        conn: ConnectionId,
        buffer: &[u8],
        options: &ArrowInsertOptions,
    ) -> Result<()>;
}
