//! Elements produced by a result stream.

/// One element of a result stream.
///
/// A stream yields exactly one [`Header`](Chunk::Header) first, then zero or
/// more [`Data`](Chunk::Data) chunks, then [`Done`](Chunk::Done) for as
/// long as it is polled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// The result header, produced once the query is ready.
    Header(Vec<u8>),
    /// A non-empty encoded result chunk.
    Data(Vec<u8>),
    /// End of stream. Carries no payload.
    Done,
}

impl Chunk {
    /// True only for [`Chunk::Done`].
    pub fn is_final(&self) -> bool {
        matches!(self, Chunk::Done)
    }

    /// The encoded payload; empty for [`Chunk::Done`].
    pub fn bytes(&self) -> &[u8] {
        match self {
            Chunk::Header(b) | Chunk::Data(b) => b,
            Chunk::Done => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes().is_empty()
    }

    /// Take the payload, or `None` for [`Chunk::Done`].
    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Chunk::Header(b) | Chunk::Data(b) => Some(b),
            Chunk::Done => None,
        }
    }
}
