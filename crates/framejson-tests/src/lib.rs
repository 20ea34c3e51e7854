//! Shared fixtures for the integration tests and benchmarks.
//!
//! Streams are built from `serde_json::Value`s with [`Frame::write_to`],
//! so every fixture is produced by the same writer the tests check the
//! decoder against.

use bytes::Bytes;
use framejson_wire::Frame;
use serde_json::{Value, json};

/// Encode `values` back to back with the canonical `"<len> "` prefix.
pub fn encode(values: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();
    for value in values {
        let payload = serde_json::to_vec(value).unwrap_or_default();
        Frame::new(payload)
            .write_to(&mut out)
            .unwrap_or_else(|e| panic!("writing to a Vec cannot fail: {e}"));
    }
    out
}

/// Encode `values` with `leading` before each length prefix and
/// `separator` between the prefix and the payload.
///
/// Both strings must consist only of frame whitespace (`SP HT CR LF FF`).
/// With an empty `separator`, a payload that starts with a digit would
/// run into its own length prefix.
pub fn encode_with(values: &[Value], leading: &str, separator: &str) -> Vec<u8> {
    let mut out = Vec::new();
    for value in values {
        let payload = serde_json::to_vec(value).unwrap_or_default();
        out.extend_from_slice(leading.as_bytes());
        out.extend_from_slice(payload.len().to_string().as_bytes());
        out.extend_from_slice(separator.as_bytes());
        out.extend_from_slice(&payload);
    }
    out
}

/// Split `data` into chunks at each of `points` (sorted, in range).
pub fn split_at_points(data: &[u8], points: &[usize]) -> Vec<Bytes> {
    let data = Bytes::copy_from_slice(data);
    let mut chunks = Vec::with_capacity(points.len() + 1);
    let mut last = 0;
    for &point in points {
        chunks.push(data.slice(last..point));
        last = point;
    }
    chunks.push(data.slice(last..));
    chunks
}

/// A varied set of messages: nested objects, arrays, escapes, multi-byte
/// UTF-8, scalars and empty containers.
pub fn sample_values() -> Vec<Value> {
    vec![
        json!({"quux": false, "quuxx": {"foo": "bar"}}),
        json!({"quux": true}),
        json!([]),
        json!({}),
        json!(null),
        json!(0),
        json!(-12.5),
        json!("héllo wörld ✓"),
        json!({"escaped": "line\nbreak \"quoted\" \\ tab\t"}),
        json!({"list": [1, 2, 3, {"deep": [[], [null]]}], "emoji": "🦀"}),
    ]
}

/// A stream of `count` similar messages of roughly `payload_size` bytes.
pub fn bulk_stream(count: usize, payload_size: usize) -> Vec<u8> {
    let filler = "x".repeat(payload_size.saturating_sub(32));
    let values: Vec<Value> = (0..count)
        .map(|i| json!({"seq": i, "data": filler}))
        .collect();
    encode_with(&values, "\n", " ")
}
