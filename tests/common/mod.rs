// Shared helpers for the integration tests: deterministic data
// generators (no RNG dependency) and a round-trip harness.

#![allow(dead_code)]

use deflate::{Compressor, Decompressor};

/// xorshift64* byte stream; deterministic for a given seed.
pub fn random_bytes(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2685821657736338717).max(1);
    let mut out = Vec::with_capacity(len);
    while out.len() < len {
        state ^= state >> 12;
        state ^= state << 25;
        state ^= state >> 27;
        let word = state.wrapping_mul(2685821657736338717);
        out.extend_from_slice(&word.to_le_bytes());
    }
    out.truncate(len);
    out
}

/// Repetitive English-like filler with mild variation; compresses well.
pub fn sample_text(len: usize) -> Vec<u8> {
    const PHRASES: [&str; 4] = [
        "the quick brown fox jumps over the lazy dog. ",
        "pack my box with five dozen liquor jugs. ",
        "how vexingly quick daft zebras jump! ",
        "sphinx of black quartz, judge my vow. ",
    ];
    let mut out = Vec::with_capacity(len + 64);
    let mut i = 0usize;
    while out.len() < len {
        out.extend_from_slice(PHRASES[i % PHRASES.len()].as_bytes());
        if i % 7 == 0 {
            out.extend_from_slice(i.to_string().as_bytes());
        }
        i += 1;
    }
    out.truncate(len);
    out
}

/// Compress at `level`, decompress, assert byte equality; returns the
/// compressed stream.
pub fn roundtrip(level: u32, data: &[u8]) -> Vec<u8> {
    let mut c = Compressor::new(level).expect("valid level");
    let mut buf = vec![0u8; c.compress_bound(data.len())];
    let n = c.compress(data, &mut buf);
    assert!(n > 0, "level {level}: compressed output did not fit in bound");
    assert!(n <= c.compress_bound(data.len()));
    buf.truncate(n);

    let mut d = Decompressor::new();
    let mut out = vec![0u8; data.len()];
    let written = d.decompress(&buf, &mut out).expect("decompression failed");
    assert_eq!(written, data.len());
    assert_eq!(out, data, "level {level}: round trip mismatch");
    buf
}
