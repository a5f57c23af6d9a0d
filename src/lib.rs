//! A client for embedded analytical engines reached through a bindings layer.
//!
//! # Features
//!
//! - **Sans-I/O state machines**: Start/poll and fetch logic is separated from the bindings calls
//! - **Sync and async APIs**: Drive directly-returning bindings from a thread, or suspending bindings from tokio
//! - **Streaming results**: Header first, then chunks, with prefetch of the next chunk on tokio
//! - **One query per connection**: Overlapping use is rejected instead of corrupting the engine state
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use zero_engine::sync::Conn;
//! use zero_engine::{Chunk, Opts};
//!
//! fn main() -> zero_engine::Result<()> {
//!     let bindings = Arc::new(MyEngine::open()?);
//!     let mut conn = Conn::new(bindings, Opts::default())?;
//!
//!     let mut stream = conn.send("SELECT * FROM lineitem", true)?;
//!     while let Chunk::Header(bytes) | Chunk::Data(bytes) = stream.next_chunk()? {
//!         println!("{} bytes", bytes.len());
//!     }
//!
//!     conn.close()?;
//!     Ok(())
//! }
//! ```

pub mod bindings;
pub mod chunk;
pub mod error;
pub mod handler;
pub mod insert;
mod link;
pub mod log;
pub mod opts;
pub mod state;
pub mod types;

#[cfg(feature = "sync")]
pub mod sync;

#[cfg(feature = "tokio")]
pub mod tokio;

pub use bindings::{AsyncBindings, Bindings, ConnectionId, StatementId};
pub use chunk::Chunk;
pub use error::{Error, Result};
pub use handler::{ChunkHandler, CollectHandler, DropHandler};
pub use insert::{ArrowInsertOptions, CsvInsertOptions, JsonInsertOptions, JsonShape};
pub use log::{LogEntry, LogEvent, LogTopic, Logger, TracingLogger};
pub use opts::Opts;
pub use types::{Param, ToParam, ToParams};
