use std::fmt;

/// The grammar element that was being read when input ran out.
///
/// A frame is `WS* DIGIT+ WS* PAYLOAD`; only the leading whitespace run
/// may legitimately be cut short by end of input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    /// The leading whitespace run. Only reported in strict mode.
    Boundary,
    /// The decimal length prefix.
    LengthPrefix,
    /// The whitespace run between the length prefix and the payload.
    Separator,
    /// The fixed-size payload.
    Payload,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Boundary => "frame boundary",
            Self::LengthPrefix => "length prefix",
            Self::Separator => "separator",
            Self::Payload => "payload",
        })
    }
}

/// Framing errors shared by the slice reader and the streaming decoder.
///
/// Offsets are absolute byte positions from the start of the stream,
/// so a failure deep inside a long-lived connection can still be located.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The digit run was empty, too long, or does not fit a `usize`.
    #[error("failed to parse response size {digits:?} at offset {offset}")]
    InvalidLength { digits: String, offset: u64 },

    /// Input ended while a frame was only partially read.
    #[error("unexpected end of stream in {token} at offset {offset}")]
    UnexpectedEof { token: Token, offset: u64 },

    /// I/O error while writing a frame.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl WireError {
    /// Shift the error's offset by `base`, turning a position relative to
    /// a sub-slice into an absolute stream position.
    #[must_use]
    pub fn with_base(self, base: u64) -> Self {
        match self {
            Self::InvalidLength { digits, offset } => Self::InvalidLength {
                digits,
                offset: offset + base,
            },
            Self::UnexpectedEof { token, offset } => Self::UnexpectedEof {
                token,
                offset: offset + base,
            },
            other @ Self::Io(_) => other,
        }
    }
}
