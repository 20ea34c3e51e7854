use framejson_wire::Frame;
use framejson_wire::charclass::{is_whitespace, run_length};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::decoder::parse_payload;
use crate::error::DecodeError;

/// Decode every message in a complete in-memory buffer.
///
/// Equivalent to feeding `buf` through a [`FrameDecoder`] as a single
/// chunk, without the async machinery. Trailing whitespace after the last
/// frame is a clean end; anything else left over is an error.
///
/// # Errors
///
/// The same framing and payload errors as [`FrameDecoder::next`], with
/// offsets measured from the start of `buf`.
///
/// # Example
///
/// ```rust
/// use framejson_decoder::decode_slice;
/// use serde_json::json;
///
/// let values = decode_slice(br#"13 {"quux":true} 4 null"#).unwrap();
/// assert_eq!(values, vec![json!({"quux": true}), json!(null)]);
/// ```
///
/// [`FrameDecoder`]: crate::FrameDecoder
/// [`FrameDecoder::next`]: crate::FrameDecoder::next
pub fn decode_slice(buf: &[u8]) -> Result<Vec<Value>, DecodeError> {
    decode_slice_as(buf)
}

/// Like [`decode_slice`], deserializing each payload into `T`.
///
/// # Errors
///
/// See [`decode_slice`]. A payload that does not fit `T` is reported as
/// [`DecodeError::InvalidJson`].
pub fn decode_slice_as<T: DeserializeOwned>(buf: &[u8]) -> Result<Vec<T>, DecodeError> {
    let mut values = Vec::new();
    let mut cursor = 0usize;

    while let Some((frame, consumed)) =
        Frame::read_from(&buf[cursor..]).map_err(|e| e.with_base(cursor as u64))?
    {
        let start = cursor + run_length(&buf[cursor..], is_whitespace);
        values.push(parse_payload(&frame.payload, start as u64)?);
        cursor += consumed;
    }

    Ok(values)
}
