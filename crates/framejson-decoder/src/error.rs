use framejson_bridge::BridgeError;
use framejson_wire::WireError;

/// Errors that can occur while decoding a framed JSON stream.
///
/// Every error ends the decoding session: once [`FrameDecoder::next`]
/// has failed, later calls return [`DecodeError::Terminated`]. To retry,
/// open a new source and start a new decoder.
///
/// Error hierarchy:
///
/// ```text
///   DecodeError
///   ├── Wire(WireError)        ← bad length prefix, stream ended mid-frame
///   ├── InvalidUtf8            ← payload bytes are not UTF-8
///   ├── InvalidJson            ← payload is not a valid JSON document
///   ├── PayloadTooLarge        ← length prefix exceeds the configured limit
///   ├── Bridge(BridgeError)    ← producer failure, passed through verbatim
///   ├── Terminated             ← called again after an error
///   └── Interrupted            ← called again after a dropped mid-frame call
/// ```
///
/// [`FrameDecoder::next`]: crate::FrameDecoder::next
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// A framing error: the length prefix could not be parsed, or input
    /// ended inside a frame.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// The payload is not valid UTF-8 text.
    #[error("invalid UTF-8 in payload of frame starting at offset {offset}")]
    InvalidUtf8 { offset: u64 },

    /// The payload is not valid JSON (or does not match the requested
    /// type when decoding with `next_as`).
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The length prefix announced more bytes than the decoder accepts.
    ///
    /// Raised before any payload byte is buffered, so a hostile prefix
    /// cannot force a large allocation.
    #[error("payload length {length} exceeds limit {limit}")]
    PayloadTooLarge { length: usize, limit: usize },

    /// The underlying chunk source failed or was cancelled.
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// The session already failed; the decoder must not be reused.
    #[error("decoder already failed; start a new session")]
    Terminated,

    /// A previous `next` call was dropped while a frame was half read.
    #[error("previous read was interrupted mid-frame; start a new session")]
    Interrupted,
}
