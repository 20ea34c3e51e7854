/// Errors surfaced to the consumer side of a chunk bridge.
///
/// ```text
///   BridgeError
///   ├── Source(io::Error)  ← the producer failed; handed out exactly once
///   ├── SourceFailed       ← any pull after the Source error was delivered
///   └── Cancelled          ← the consumer cancelled the bridge
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The producer reported an error. The original error is passed
    /// through untouched.
    #[error(transparent)]
    Source(#[from] std::io::Error),

    /// The producer error was already delivered by an earlier pull.
    #[error("chunk source already failed")]
    SourceFailed,

    /// The bridge was cancelled; no further chunks will be delivered.
    #[error("chunk bridge was cancelled")]
    Cancelled,
}

/// Errors returned to the producer side by [`ChunkSink::send`](crate::ChunkSink::send).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SendError {
    /// The consumer cancelled or dropped the bridge. The chunk was discarded.
    #[error("consumer cancelled the chunk bridge")]
    Cancelled,

    /// The sink already finished or failed.
    #[error("chunk sink is closed")]
    Closed,
}
