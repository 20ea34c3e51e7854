#![no_main]

use libfuzzer_sys::fuzz_target;

// Fuzz target: Frame::read_from over arbitrary bytes.
//
// Catches bugs in:
// - Length prefix overflow
// - Truncated frames
// - Payload lengths past the end of the buffer
fuzz_target!(|data: &[u8]| {
    if let Ok(Some((frame, consumed))) = framejson_wire::Frame::read_from(data) {
        assert!(consumed <= data.len());
        assert!(frame.payload.len() <= consumed);
    }
});
