//! Conformance tests: error messages pinned with insta inline snapshots.
//!
//! Callers log and match on these messages, so a change in wording or in
//! the reported offset should be a deliberate, reviewed diff. Each test
//! drives a real decoder over a small stream and snapshots the `Display`
//! output of the resulting error.
//!
//! To accept a deliberate change:
//!
//! ```bash
//! cargo insta review -p framejson-tests
//! ```

use std::io;

use framejson_decoder::{
    DecodeError, DecoderConfig, FrameDecoder, MemoryChunks, Next, channel, decode_slice,
};
use futures::executor::block_on;
use insta::assert_snapshot;

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Decode `source` to the first error and return it.
fn first_error(source: MemoryChunks, config: DecoderConfig) -> DecodeError {
    block_on(async {
        let mut decoder = FrameDecoder::with_config(source, config);
        loop {
            match decoder.next().await {
                Ok(Next::Value(_)) => {}
                Ok(Next::Done) => panic!("stream decoded without error"),
                Err(e) => return e,
            }
        }
    })
}

fn error_for(chunks: &[&'static str]) -> DecodeError {
    first_error(
        MemoryChunks::new(chunks.iter().copied()),
        DecoderConfig::default(),
    )
}

// ── Framing ───────────────────────────────────────────────────────────────────

#[test]
fn invalid_length_message() {
    let err = error_for(&[r#"14{"quux":false}.13{"quux":true}"#]);
    assert_snapshot!(err, @r#"failed to parse response size "" at offset 16"#);
}

#[test]
fn overlong_length_message() {
    let err = error_for(&["1234567890", "12345678901", " {}"]);
    assert_snapshot!(err, @r#"failed to parse response size "123456789012345678901" at offset 0"#);
}

#[test]
fn eof_messages() {
    assert_snapshot!(
        error_for(&["   3", "8"]),
        @"unexpected end of stream in length prefix at offset 5"
    );
    assert_snapshot!(
        error_for(&["2 {}\n12", "\t"]),
        @"unexpected end of stream in separator at offset 8"
    );
    assert_snapshot!(
        error_for(&[r#"13 {"quux""#]),
        @"unexpected end of stream in payload at offset 10"
    );
}

#[test]
fn strict_boundary_message() {
    let err = first_error(MemoryChunks::new(["2 {} "]), DecoderConfig::strict());
    assert_snapshot!(err, @"unexpected end of stream in frame boundary at offset 5");
}

// ── Payloads ──────────────────────────────────────────────────────────────────

#[test]
fn invalid_utf8_message() {
    let err = decode_slice(b"2 []  2 \xc3\x28").unwrap_err();
    assert_snapshot!(err, @"invalid UTF-8 in payload of frame starting at offset 6");
}

#[test]
fn payload_too_large_message() {
    let config = DecoderConfig {
        max_payload_len: 16,
        ..DecoderConfig::default()
    };
    let err = first_error(MemoryChunks::new(["17 "]), config);
    assert_snapshot!(err, @"payload length 17 exceeds limit 16");
}

// ── Session ───────────────────────────────────────────────────────────────────

#[test]
fn producer_error_is_verbatim() {
    let source = MemoryChunks::new(["2 {}"]).with_error(io::Error::other("stream error"));
    let err = first_error(source, DecoderConfig::default());
    assert_snapshot!(err, @"stream error");
}

#[test]
fn terminated_message() {
    block_on(async {
        let mut decoder = FrameDecoder::new(MemoryChunks::new(["?"]));
        assert!(decoder.next().await.is_err());
        assert_snapshot!(
            decoder.next().await.unwrap_err(),
            @"decoder already failed; start a new session"
        );
    });
}

#[tokio::test]
async fn interrupted_message() {
    let (sink, bridge) = channel();
    let mut decoder = FrameDecoder::new(bridge);

    let producer = tokio::spawn(async move {
        // Half a frame, then silence
        sink.send("13 {").await.unwrap();
        sink.cancelled().await;
    });

    let timed_out = tokio::time::timeout(std::time::Duration::from_millis(20), decoder.next()).await;
    assert!(timed_out.is_err());

    assert_snapshot!(
        decoder.next().await.unwrap_err(),
        @"previous read was interrupted mid-frame; start a new session"
    );

    decoder.cancel();
    producer.await.unwrap();
}
