#![no_main]

use arbitrary::Arbitrary;
use framejson_decoder::{decode_slice, FrameDecoder, MemoryChunks, Next};
use futures::executor::block_on;
use libfuzzer_sys::fuzz_target;

// Fuzz target: the streaming decoder must agree with decode_slice no
// matter how the input is split into chunks.
//
// Input format (via Arbitrary):
//   splits: chunk lengths, cycled over the input
//   data:   the byte stream
#[derive(Arbitrary, Debug)]
struct Input {
    splits: Vec<u8>,
    data: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let mut chunks = Vec::new();
    let mut rest = &input.data[..];
    let mut sizes = input.splits.iter().map(|&s| usize::from(s)).cycle();
    while !rest.is_empty() {
        let size = sizes.next().unwrap_or(rest.len()).clamp(1, rest.len());
        let (chunk, tail) = rest.split_at(size);
        chunks.push(chunk.to_vec());
        rest = tail;
    }

    let streamed = block_on(async {
        let mut decoder = FrameDecoder::new(MemoryChunks::new(chunks));
        let mut values = Vec::new();
        loop {
            match decoder.next().await {
                Ok(Next::Value(value)) => values.push(value),
                Ok(Next::Done) => return Ok(values),
                Err(e) => return Err(e.to_string()),
            }
        }
    });

    match (streamed, decode_slice(&input.data)) {
        (Ok(a), Ok(b)) => assert_eq!(a, b),
        (Err(_), Err(_)) => {}
        (a, b) => panic!("streaming {a:?} disagrees with slice {b:?}"),
    }
});
