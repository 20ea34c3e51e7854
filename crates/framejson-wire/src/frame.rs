use crate::charclass::{is_digit, is_whitespace, run_length};
use crate::error::{Token, WireError};
use crate::length::{MAX_LENGTH_DIGITS, parse_length, significant_digits};

/// One length-prefixed message as it travels on the wire.
///
/// ```text
/// ┌──────────────────────────────────────────────────────┐
/// │ leading ws   (SP HT CR LF FF, any count, optional)   │
/// │ length       (ASCII decimal digits, at least one)    │
/// │ separator ws (SP HT CR LF FF, any count, optional)   │
/// │ payload      [length bytes, UTF-8 JSON text]         │
/// └──────────────────────────────────────────────────────┘
/// ```
///
/// The length counts bytes, not characters. Consecutive frames need no
/// delimiter beyond the next frame's own leading whitespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    /// The raw payload bytes (exactly `length` bytes from the wire).
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Write this frame as `"<len> <payload>"`.
    ///
    /// # Returns
    ///
    /// Total number of bytes written.
    pub fn write_to(&self, w: &mut impl std::io::Write) -> Result<usize, WireError> {
        let prefix = format!("{} ", self.payload.len());
        w.write_all(prefix.as_bytes())?;
        w.write_all(&self.payload)?;
        Ok(prefix.len() + self.payload.len())
    }

    /// Read one frame from the start of a complete in-memory buffer.
    ///
    /// # Returns
    ///
    /// `Some((frame, bytes_consumed))` when a frame was read, or `None`
    /// when the remainder of `buf` is only whitespace (a clean end).
    ///
    /// # Errors
    ///
    /// - [`WireError::InvalidLength`] if the length prefix is missing or
    ///   unparsable.
    /// - [`WireError::UnexpectedEof`] if `buf` ends inside a frame.
    ///
    /// Offsets in errors are relative to the start of `buf`.
    pub fn read_from(buf: &[u8]) -> Result<Option<(Self, usize)>, WireError> {
        // 1. Leading whitespace; running out here is a clean end
        let mut cursor = run_length(buf, is_whitespace);
        if cursor == buf.len() {
            return Ok(None);
        }

        // 2. Length prefix
        let digits_start = cursor;
        cursor += run_length(&buf[cursor..], is_digit);
        let digits = &buf[digits_start..cursor];
        let significant = significant_digits(digits);
        if significant.len() > MAX_LENGTH_DIGITS {
            return Err(WireError::InvalidLength {
                digits: String::from_utf8_lossy(significant).into_owned(),
                offset: digits_start as u64,
            });
        }
        if cursor == buf.len() {
            return Err(WireError::UnexpectedEof {
                token: Token::LengthPrefix,
                offset: cursor as u64,
            });
        }
        let length = parse_length(digits, digits_start as u64)?;

        // 3. Separator whitespace
        cursor += run_length(&buf[cursor..], is_whitespace);
        if cursor == buf.len() {
            return Err(WireError::UnexpectedEof {
                token: Token::Separator,
                offset: cursor as u64,
            });
        }

        // 4. Payload bytes
        let end = match cursor.checked_add(length) {
            Some(end) if end <= buf.len() => end,
            _ => {
                return Err(WireError::UnexpectedEof {
                    token: Token::Payload,
                    offset: buf.len() as u64,
                });
            }
        };

        Ok(Some((Self::new(&buf[cursor..end]), end)))
    }
}
