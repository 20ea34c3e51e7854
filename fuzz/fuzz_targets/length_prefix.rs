#![no_main]

use framejson_wire::length::parse_length;
use libfuzzer_sys::fuzz_target;

// Fuzz target: parse_length must agree with str::parse for digit runs,
// zero-padded ones included.
fuzz_target!(|data: &[u8]| {
    let ours = parse_length(data, 0).ok();
    let reference = std::str::from_utf8(data)
        .ok()
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<usize>().ok());
    assert_eq!(ours, reference);
});
