/// Configuration for a [`FrameDecoder`](crate::FrameDecoder).
///
/// ```text
/// ┌─────────────────┬───────────────────────────────────────────────────┐
/// │ Field           │ Purpose                                           │
/// ├─────────────────┼───────────────────────────────────────────────────┤
/// │ end_of_stream   │ Whether input may end at a frame boundary         │
/// │ max_payload_len │ Largest accepted length prefix, in bytes          │
/// └─────────────────┴───────────────────────────────────────────────────┘
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecoderConfig {
    /// End-of-input handling at a frame boundary.
    pub end_of_stream: EndOfStream,

    /// Frames whose length prefix exceeds this are rejected with
    /// `DecodeError::PayloadTooLarge` before the payload is read.
    /// Unlimited by default; set it when the producer is untrusted.
    pub max_payload_len: usize,
}

impl Default for DecoderConfig {
    /// Lenient end of stream, no payload limit.
    fn default() -> Self {
        Self {
            end_of_stream: EndOfStream::default(),
            max_payload_len: usize::MAX,
        }
    }
}

impl DecoderConfig {
    /// Configuration for producers that never close the stream on their
    /// own, where any end of input means the connection was lost.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            end_of_stream: EndOfStream::Strict,
            ..Self::default()
        }
    }
}

/// What end of input means when it arrives between frames.
///
/// ```text
/// ┌─────────┬───────────────────────────────────────────────────────┐
/// │ Mode    │ End of input in leading whitespace                    │
/// ├─────────┼───────────────────────────────────────────────────────┤
/// │ Lenient │ Clean end: `next` returns `Next::Done`                │
/// │ Strict  │ Error: `WireError::UnexpectedEof` at `Token::Boundary`│
/// └─────────┴───────────────────────────────────────────────────────┘
/// ```
///
/// End of input inside a frame is an error in both modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EndOfStream {
    #[default]
    Lenient,
    Strict,
}
