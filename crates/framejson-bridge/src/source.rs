use std::future::Future;

use bytes::Bytes;

use crate::error::BridgeError;

/// A pull-based supplier of byte chunks.
///
/// This is the seam between the frame decoder and whatever produces bytes.
/// The decoder only ever has one pull outstanding, and `&mut self`
/// receivers make overlapping pulls a compile error rather than a lost
/// wakeup.
///
/// Implementations:
///
/// ```text
/// ┌──────────────┬──────────────────────────────────────────────────┐
/// │ Type         │ Backed by                                        │
/// ├──────────────┼──────────────────────────────────────────────────┤
/// │ ChunkBridge  │ a push-based producer (ChunkSink, AsyncRead,     │
/// │              │ Stream) with one chunk in flight                 │
/// │ MemoryChunks │ a pre-split list of chunks held in memory        │
/// └──────────────┴──────────────────────────────────────────────────┘
/// ```
pub trait ChunkSource {
    /// Wait for the next chunk.
    ///
    /// Returns `Ok(Some(chunk))` for each chunk in producer order,
    /// `Ok(None)` once the producer finished cleanly, or `Err` when the
    /// producer failed or the source was cancelled.
    fn next_chunk(&mut self) -> impl Future<Output = Result<Option<Bytes>, BridgeError>> + Send;

    /// Detach from the producer and release it. Calling this more than
    /// once has no further effect.
    fn cancel(&mut self);
}
