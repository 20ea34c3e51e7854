#![no_main]

use framejson_wire::Frame;
use libfuzzer_sys::fuzz_target;

// Fuzz target: Frame write->read roundtrip.
//
// Any payload bytes, JSON or not, must come back unchanged and the whole
// written frame must be consumed.
fuzz_target!(|data: &[u8]| {
    let frame = Frame::new(data);

    let mut wire = Vec::new();
    let written = frame.write_to(&mut wire).unwrap();
    assert_eq!(written, wire.len());

    let (parsed, consumed) = Frame::read_from(&wire).unwrap().unwrap();
    assert_eq!(parsed, frame);
    assert_eq!(consumed, wire.len());
});
