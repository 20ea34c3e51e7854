use std::collections::VecDeque;
use std::io;

use bytes::Bytes;

use crate::error::BridgeError;
use crate::source::ChunkSource;

/// A [`ChunkSource`] over chunks already held in memory.
///
/// Useful wherever the whole input is available up front but should still
/// flow through the streaming decoder: synchronous decoding, tests that
/// replay a specific chunk split, benchmarks and fuzzing. No runtime is
/// needed to drive it.
///
/// # Example
///
/// ```rust
/// use framejson_bridge::MemoryChunks;
///
/// // Deliver the input three bytes at a time
/// let chunks = MemoryChunks::split(&b"13 {\"quux\":true}"[..], 3);
/// assert_eq!(chunks.remaining(), 6);
/// ```
#[derive(Debug, Default)]
pub struct MemoryChunks {
    chunks: VecDeque<Bytes>,
    /// Error reported once all chunks have been pulled.
    error: Option<io::Error>,
    failed: bool,
    cancelled: bool,
}

impl MemoryChunks {
    /// Deliver `chunks` in order, then finish cleanly.
    pub fn new<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Bytes>,
    {
        Self {
            chunks: chunks.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Deliver `data` as a single chunk.
    pub fn full(data: impl Into<Bytes>) -> Self {
        Self::new([data.into()])
    }

    /// Deliver `data` in chunks of at most `chunk_size` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn split(data: impl Into<Bytes>, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be non-zero");
        let mut data = data.into();
        let mut chunks = VecDeque::with_capacity(data.len().div_ceil(chunk_size));
        while !data.is_empty() {
            let at = chunk_size.min(data.len());
            chunks.push_back(data.split_to(at));
        }
        Self {
            chunks,
            ..Self::default()
        }
    }

    /// Fail with `err` after the last chunk instead of finishing cleanly.
    #[must_use]
    pub fn with_error(mut self, err: io::Error) -> Self {
        self.error = Some(err);
        self
    }

    /// Number of chunks not yet pulled.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }

    fn pull(&mut self) -> Result<Option<Bytes>, BridgeError> {
        if self.cancelled {
            return Err(BridgeError::Cancelled);
        }
        if self.failed {
            return Err(BridgeError::SourceFailed);
        }
        if let Some(chunk) = self.chunks.pop_front() {
            return Ok(Some(chunk));
        }
        match self.error.take() {
            Some(err) => {
                self.failed = true;
                Err(BridgeError::Source(err))
            }
            None => Ok(None),
        }
    }
}

impl ChunkSource for MemoryChunks {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, BridgeError> {
        self.pull()
    }

    fn cancel(&mut self) {
        self.cancelled = true;
        self.chunks.clear();
    }
}
