//! Fuzz target for the frame reassembly codec.
//!
//! Feeds arbitrary byte streams, split at arbitrary points, into the codec
//! to find:
//! - Parser panics or integer overflows in length handling
//! - Unbounded buffering (memory DoS)
//! - Split-sensitivity (chunking changing the parse)
//!
//! # Invariants
//!
//! - `push` never panics, whatever the input
//! - The internal buffer never exceeds `MAX_BUFFER`
//! - Chunked input parses to the same frames as the whole stream

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use meshcore_proto::{FrameCodec, MAX_BUFFER};

#[derive(Debug, Arbitrary)]
struct Input {
    data: Vec<u8>,
    cuts: Vec<u16>,
}

fuzz_target!(|input: Input| {
    // Reference parse: the whole stream at once.
    let mut whole = FrameCodec::new();
    let expected = whole.push(&input.data).frames;
    assert!(whole.buffered() <= MAX_BUFFER);

    // Chunked parse at arbitrary cut points.
    let mut positions: Vec<usize> =
        input.cuts.iter().map(|&c| usize::from(c) % (input.data.len() + 1)).collect();
    positions.sort_unstable();
    positions.push(input.data.len());

    let mut codec = FrameCodec::new();
    let mut got = Vec::new();
    let mut start = 0;
    for end in positions {
        if end < start {
            continue;
        }
        got.extend(codec.push(&input.data[start..end]).frames);
        assert!(codec.buffered() <= MAX_BUFFER);
        start = end;
    }

    assert_eq!(got, expected);
});
