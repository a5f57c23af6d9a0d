//! Scripted in-memory bindings shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use zero_engine::log::{LogEntry, Logger};
use zero_engine::{
    ArrowInsertOptions, AsyncBindings, Bindings, ConnectionId, CsvInsertOptions, Error,
    JsonInsertOptions, Param, Result, StatementId,
};

type Reply = Result<Option<Vec<u8>>>;

/// Engine whose replies are queued up front by the test.
///
/// Empty queues answer "not ready" for start and poll, and the end-of-stream
/// buffer for fetch.
#[derive(Default)]
pub struct MockEngine {
    starts: Mutex<VecDeque<Reply>>,
    polls: Mutex<VecDeque<Reply>>,
    fetches: Mutex<VecDeque<Reply>>,
    cancel_reply: Mutex<Option<bool>>,
    detach_after_polls: Mutex<Option<usize>>,
    pub calls: Calls,
    pub last_params: Mutex<Vec<Param>>,
    pub inserted: Mutex<Vec<String>>,
}

#[derive(Default)]
pub struct Calls {
    pub connect: AtomicUsize,
    pub disconnect: AtomicUsize,
    pub run_query: AtomicUsize,
    pub start: AtomicUsize,
    pub poll: AtomicUsize,
    pub fetch: AtomicUsize,
    pub cancel: AtomicUsize,
    pub prepare: AtomicUsize,
    pub close_prepared: AtomicUsize,
    pub send_prepared: AtomicUsize,
}

fn count(counter: &AtomicUsize) -> usize {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

impl MockEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_start(&self, reply: Reply) -> &Self {
        self.starts.lock().unwrap().push_back(reply);
        self
    }

    pub fn push_poll(&self, reply: Reply) -> &Self {
        self.polls.lock().unwrap().push_back(reply);
        self
    }

    pub fn push_fetch(&self, reply: Reply) -> &Self {
        self.fetches.lock().unwrap().push_back(reply);
        self
    }

    /// Header on start, then the given chunks, then the end-of-stream buffer.
    pub fn script_stream(&self, header: &[u8], chunks: &[&[u8]]) {
        self.push_start(Ok(Some(header.to_vec())));
        for chunk in chunks {
            self.push_fetch(Ok(Some(chunk.to_vec())));
        }
        self.push_fetch(Ok(Some(Vec::new())));
    }

    pub fn set_cancel_reply(&self, applied: bool) {
        *self.cancel_reply.lock().unwrap() = Some(applied);
    }

    /// Report detached once this many polls have happened.
    pub fn detach_after_polls(&self, polls: usize) {
        *self.detach_after_polls.lock().unwrap() = Some(polls);
    }

    pub fn starts(&self) -> usize {
        self.calls.start.load(Ordering::SeqCst)
    }

    pub fn polls(&self) -> usize {
        self.calls.poll.load(Ordering::SeqCst)
    }

    pub fn fetches(&self) -> usize {
        self.calls.fetch.load(Ordering::SeqCst)
    }

    pub fn cancels(&self) -> usize {
        self.calls.cancel.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.calls.disconnect.load(Ordering::SeqCst)
    }

    pub fn send_prepared_calls(&self) -> usize {
        self.calls.send_prepared.load(Ordering::SeqCst)
    }

    fn next_reply(queue: &Mutex<VecDeque<Reply>>, empty: Reply) -> Reply {
        queue.lock().unwrap().pop_front().unwrap_or(empty)
    }
}

impl Bindings for MockEngine {
    fn connect(&self) -> Result<ConnectionId> {
        let n = count(&self.calls.connect);
        Ok(ConnectionId(n as u32))
    }

    fn disconnect(&self, _conn: ConnectionId) -> Result<()> {
        count(&self.calls.disconnect);
        Ok(())
    }

    fn run_query(&self, _conn: ConnectionId, sql: &str) -> Result<Vec<u8>> {
        count(&self.calls.run_query);
        if sql.contains("terminate") {
            return Err(Error::engine("Worker Terminated unexpectedly"));
        }
        if sql.contains("missing_table") {
            return Err(Error::engine("Catalog Error: table missing_table does not exist"));
        }
        Ok(sql.as_bytes().to_vec())
    }

    fn start_pending_query(
        &self,
        _conn: ConnectionId,
        _sql: &str,
        _allow_stream_result: bool,
    ) -> Result<Option<Vec<u8>>> {
        count(&self.calls.start);
        Self::next_reply(&self.starts, Ok(None))
    }

    fn poll_pending_query(&self, _conn: ConnectionId) -> Result<Option<Vec<u8>>> {
        count(&self.calls.poll);
        Self::next_reply(&self.polls, Ok(None))
    }

    fn is_detached(&self) -> bool {
        match *self.detach_after_polls.lock().unwrap() {
            Some(after) => self.polls() >= after,
            None => false,
        }
    }

    fn cancel_pending_query(&self, _conn: ConnectionId) -> Result<bool> {
        count(&self.calls.cancel);
        Ok(self.cancel_reply.lock().unwrap().unwrap_or(false))
    }

    fn fetch_query_results(&self, _conn: ConnectionId) -> Result<Option<Vec<u8>>> {
        count(&self.calls.fetch);
        Self::next_reply(&self.fetches, Ok(Some(Vec::new())))
    }

    fn get_table_names(&self, _conn: ConnectionId, sql: &str) -> Result<Vec<String>> {
        Ok(sql
            .split_whitespace()
            .skip_while(|word| !word.eq_ignore_ascii_case("from"))
            .skip(1)
            .take(1)
            .map(str::to_owned)
            .collect())
    }

    fn create_prepared(&self, _conn: ConnectionId, _sql: &str) -> Result<StatementId> {
        let n = count(&self.calls.prepare);
        Ok(StatementId(n as u32))
    }

    fn close_prepared(&self, _conn: ConnectionId, _stmt: StatementId) -> Result<()> {
        count(&self.calls.close_prepared);
        Ok(())
    }

    fn run_prepared(
        &self,
        _conn: ConnectionId,
        _stmt: StatementId,
        params: &[Param],
    ) -> Result<Vec<u8>> {
        *self.last_params.lock().unwrap() = params.to_vec();
        Ok(vec![params.len() as u8])
    }

    fn send_prepared(
        &self,
        _conn: ConnectionId,
        _stmt: StatementId,
        params: &[Param],
    ) -> Result<Vec<u8>> {
        count(&self.calls.send_prepared);
        *self.last_params.lock().unwrap() = params.to_vec();
        Ok(b"prepared-header".to_vec())
    }

    fn insert_csv_from_path(
        &self,
        _conn: ConnectionId,
        path: &Path,
        options: &CsvInsertOptions,
    ) -> Result<()> {
        self.inserted
            .lock()
            .unwrap()
            .push(format!("csv:{}:{}", options.name, path.display()));
        Ok(())
    }

    fn insert_json_from_path(
        &self,
        _conn: ConnectionId,
        path: &Path,
        options: &JsonInsertOptions,
    ) -> Result<()> {
        self.inserted
            .lock()
            .unwrap()
            .push(format!("json:{}:{}", options.name, path.display()));
        Ok(())
    }

    fn insert_arrow_from_ipc_stream(
        &self,
        _conn: ConnectionId,
        buffer: &[u8],
        options: &ArrowInsertOptions,
    ) -> Result<()> {
        self.inserted
            .lock()
            .unwrap()
            .push(format!("arrow:{}:{}", options.name, buffer.len()));
        Ok(())
    }
}

#[async_trait::async_trait]
impl AsyncBindings for MockEngine {
    async fn connect(&self) -> Result<ConnectionId> {
        Bindings::connect(self)
    }

    async fn disconnect(&self, conn: ConnectionId) -> Result<()> {
        Bindings::disconnect(self, conn)
    }

    async fn run_query(&self, conn: ConnectionId, sql: &str) -> Result<Vec<u8>> {
        Bindings::run_query(self, conn, sql)
    }

    async fn start_pending_query(
        &self,
        conn: ConnectionId,
        sql: &str,
        allow_stream_result: bool,
    ) -> Result<Option<Vec<u8>>> {
        Bindings::start_pending_query(self, conn, sql, allow_stream_result)
    }

    async fn poll_pending_query(&self, conn: ConnectionId) -> Result<Option<Vec<u8>>> {
        Bindings::poll_pending_query(self, conn)
    }

    fn is_detached(&self) -> bool {
        Bindings::is_detached(self)
    }

    async fn cancel_pending_query(&self, conn: ConnectionId) -> Result<bool> {
        Bindings::cancel_pending_query(self, conn)
    }

    async fn fetch_query_results(&self, conn: ConnectionId) -> Result<Option<Vec<u8>>> {
        Bindings::fetch_query_results(self, conn)
    }

    async fn get_table_names(&self, conn: ConnectionId, sql: &str) -> Result<Vec<String>> {
        Bindings::get_table_names(self, conn, sql)
    }

    async fn create_prepared(&self, conn: ConnectionId, sql: &str) -> Result<StatementId> {
        Bindings::create_prepared(self, conn, sql)
    }

    async fn close_prepared(&self, conn: ConnectionId, stmt: StatementId) -> Result<()> {
        Bindings::close_prepared(self, conn, stmt)
    }

    async fn run_prepared(
        &self,
        conn: ConnectionId,
        stmt: StatementId,
        params: &[Param],
    ) -> Result<Vec<u8>> {
        Bindings::run_prepared(self, conn, stmt, params)
    }

    async fn send_prepared(
        &self,
        conn: ConnectionId,
        stmt: StatementId,
        params: &[Param],
    ) -> Result<Vec<u8>> {
        Bindings::send_prepared(self, conn, stmt, params)
    }

    async fn insert_csv_from_path(
        &self,
        conn: ConnectionId,
        path: &Path,
        options: &CsvInsertOptions,
    ) -> Result<()> {
        Bindings::insert_csv_from_path(self, conn, path, options)
    }

    async fn insert_json_from_path(
        &self,
        conn: ConnectionId,
        path: &Path,
        options: &JsonInsertOptions,
    ) -> Result<()> {
        Bindings::insert_json_from_path(self, conn, path, options)
    }

    async fn insert_arrow_from_ipc_stream(
        &self,
        conn: ConnectionId,
        buffer: &[u8],
        options: &ArrowInsertOptions,
    ) -> Result<()> {
        Bindings::insert_arrow_from_ipc_stream(self, conn, buffer, options)
    }
}

/// Logger that keeps every entry for inspection.
#[derive(Clone, Default)]
pub struct RecordingLogger {
    pub entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl RecordingLogger {
    pub fn values(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|entry| entry.value.clone())
            .collect()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, entry: LogEntry) {
        self.entries.lock().unwrap().push(entry);
    }
}
