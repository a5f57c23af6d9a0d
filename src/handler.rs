//! Result stream handlers.

use crate::error::Result;

/// Handler for the chunks of a result stream.
///
/// Callback pattern: `header` → `chunk*` → `end`
pub trait ChunkHandler {
    /// Called once with the result header.
    fn header(&mut self, header: &[u8]) -> Result<()> {
        let _ = header;
        Ok(())
    }

    /// Called for each non-empty result chunk.
    fn chunk(&mut self, chunk: &[u8]) -> Result<()>;

    /// Called when the stream is depleted.
    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A handler that discards all chunks, counting them.
#[derive(Debug, Default)]
pub struct DropHandler {
    chunks: usize,
    bytes: usize,
}

impl DropHandler {
    /// Create a new drop handler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of data chunks seen (header excluded).
    pub fn chunks(&self) -> usize {
        self.chunks
    }

    /// Total bytes of the data chunks seen.
    pub fn bytes(&self) -> usize {
        self.bytes
    }
}

impl ChunkHandler for DropHandler {
    fn chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.chunks += 1;
        self.bytes += chunk.len();
        Ok(())
    }
}

/// Handler that keeps the header and every chunk.
///
/// # Example
///
/// ```ignore
/// let mut handler = CollectHandler::new();
/// conn.send("SELECT * FROM big", true)?.drain(&mut handler)?;
/// for chunk in handler.chunks() {
///     decode(chunk);
/// }
/// ```
#[derive(Debug, Default)]
pub struct CollectHandler {
    header: Option<Vec<u8>>,
    chunks: Vec<Vec<u8>>,
    complete: bool,
}

impl CollectHandler {
    /// Create a new collect handler.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header_bytes(&self) -> Option<&[u8]> {
        self.header.as_deref()
    }

    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    /// Whether `end` was called.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Take the header and chunks.
    pub fn into_parts(self) -> (Option<Vec<u8>>, Vec<Vec<u8>>) {
        (self.header, self.chunks)
    }
}

impl ChunkHandler for CollectHandler {
    fn header(&mut self, header: &[u8]) -> Result<()> {
        self.header = Some(header.to_vec());
        Ok(())
    }

    fn chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.chunks.push(chunk.to_vec());
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.complete = true;
        Ok(())
    }
}
