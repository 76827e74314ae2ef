// Round-trip coverage across every level and the data shapes that
// exercise distinct code paths:
//   - empty, single byte, tiny inputs
//   - compressible text, incompressible bytes, single-byte runs
//   - inputs spanning multiple windows and multiple blocks
//   - output always within compress_bound

#[path = "../common/mod.rs"]
mod common;

use common::{random_bytes, roundtrip, sample_text};

#[test]
fn empty_input_every_level() {
    for level in 0..=12 {
        let out = roundtrip(level, b"");
        assert!(!out.is_empty());
    }
}

#[test]
fn single_byte_every_level() {
    for level in 0..=12 {
        roundtrip(level, b"x");
    }
}

#[test]
fn tiny_inputs_every_level() {
    for level in 0..=12 {
        roundtrip(level, b"abc");
        roundtrip(level, b"aaaaaaa");
        roundtrip(level, b"Hello, world!\n");
    }
}

#[test]
fn text_every_level() {
    let data = sample_text(60_000);
    for level in 0..=12 {
        roundtrip(level, &data);
    }
}

#[test]
fn random_data_every_level() {
    let data = random_bytes(42, 60_000);
    for level in 0..=12 {
        let out = roundtrip(level, &data);
        // Incompressible data cannot shrink meaningfully; the bound
        // assertion inside roundtrip() covers the other direction.
        assert!(out.len() + 200 >= data.len());
    }
}

#[test]
fn runs_every_level() {
    let data = vec![0x7Au8; 50_000];
    for level in 0..=12 {
        let out = roundtrip(level, &data);
        if level > 0 {
            assert!(out.len() < 2_000, "level {level}: run compressed to {}", out.len());
        }
    }
}

#[test]
fn multi_window_text() {
    // Crosses the 32 KiB window several times; levels from each family.
    let data = sample_text(150_000);
    for level in [1, 3, 6, 9, 10] {
        roundtrip(level, &data);
    }
}

#[test]
fn multi_block_text() {
    // Longer than SOFT_MAX_BLOCK_LENGTH, forcing at least two blocks.
    let data = sample_text(650_000);
    for level in [2, 6, 12] {
        roundtrip(level, &data);
    }
}

#[test]
fn mixed_content() {
    // Compressible and incompressible regions interleaved.
    let mut data = Vec::new();
    data.extend_from_slice(&sample_text(40_000));
    data.extend_from_slice(&random_bytes(7, 40_000));
    data.extend_from_slice(&vec![0u8; 40_000]);
    data.extend_from_slice(&sample_text(40_000));
    for level in [1, 4, 6, 9, 11] {
        roundtrip(level, &data);
    }
}

#[test]
fn binary_structured_data() {
    // Small alphabet raises the per-block minimum match length.
    let mut data = Vec::with_capacity(80_000);
    for i in 0..20_000u32 {
        data.extend_from_slice(&(i % 7).to_le_bytes());
    }
    for level in [2, 6, 10] {
        roundtrip(level, &data);
    }
}

#[test]
fn compressor_is_reusable() {
    let mut c = deflate::Compressor::new(6).unwrap();
    let mut d = deflate::Decompressor::new();
    for seed in 0..5u64 {
        let data = random_bytes(seed, 10_000 + seed as usize * 3_000);
        let mut buf = vec![0u8; c.compress_bound(data.len())];
        let n = c.compress(&data, &mut buf);
        assert!(n > 0);
        let mut out = vec![0u8; data.len()];
        d.decompress(&buf[..n], &mut out).unwrap();
        assert_eq!(out, data, "reuse iteration {seed}");
    }
}

#[test]
fn output_too_small_returns_zero() {
    let data = sample_text(10_000);
    let mut c = deflate::Compressor::new(6).unwrap();
    let mut tiny = [0u8; 16];
    assert_eq!(c.compress(&data, &mut tiny), 0);

    // A failed attempt must not poison the next one.
    let mut buf = vec![0u8; c.compress_bound(data.len())];
    let n = c.compress(&data, &mut buf);
    assert!(n > 0);
    let mut out = vec![0u8; data.len()];
    deflate::Decompressor::new().decompress(&buf[..n], &mut out).unwrap();
    assert_eq!(out, data);
}
