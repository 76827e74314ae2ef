// Surface-level API contracts:
//   - level range and construction
//   - compress_bound dominates actual output at every level and size
//   - handles are Send
//   - Default for Decompressor

use deflate::{compress_bound, Compressor, Decompressor, MAX_COMPRESSION_LEVEL};

#[path = "common/mod.rs"]
mod common;

#[test]
fn levels_0_through_12_construct() {
    for level in 0..=MAX_COMPRESSION_LEVEL {
        let c = Compressor::new(level).expect("level in range");
        assert_eq!(c.level(), level);
    }
}

#[test]
fn out_of_range_levels_are_rejected() {
    assert!(Compressor::new(13).is_none());
    assert!(Compressor::new(100).is_none());
    assert!(Compressor::new(u32::MAX).is_none());
}

#[test]
fn bound_is_monotonic_and_covers_input() {
    let mut prev = 0;
    for len in [0usize, 1, 10, 100, 65_535, 100_000, 1 << 20] {
        let bound = compress_bound(len);
        assert!(bound > len);
        assert!(bound >= prev);
        prev = bound;
    }
}

#[test]
fn bound_dominates_output_across_levels_and_sizes() {
    for len in [0usize, 1, 100, 4_096, 65_535] {
        let text = common::sample_text(len.max(1))[..len].to_vec();
        let noise = common::random_bytes(3, len);
        for level in 0..=MAX_COMPRESSION_LEVEL {
            for data in [&text, &noise] {
                let mut c = Compressor::new(level).unwrap();
                let mut buf = vec![0u8; c.compress_bound(len)];
                let n = c.compress(data, &mut buf);
                assert!(n > 0, "level {level} len {len} did not fit the bound");
                assert!(n <= c.compress_bound(len));
            }
        }
    }
}

#[test]
fn handles_are_send() {
    fn assert_send<T: Send>() {}
    assert_send::<Compressor>();
    assert_send::<Decompressor>();
}

#[test]
fn decompressor_default_matches_new() {
    let data = b"default construction";
    let mut c = Compressor::new(5).unwrap();
    let mut buf = vec![0u8; c.compress_bound(data.len())];
    let n = c.compress(data, &mut buf);

    let mut d = Decompressor::default();
    let mut out = vec![0u8; data.len()];
    d.decompress(&buf[..n], &mut out).unwrap();
    assert_eq!(&out, data);
}

#[test]
fn error_type_displays() {
    use deflate::DecompressError;
    assert!(!DecompressError::BadData.to_string().is_empty());
    assert!(!DecompressError::ShortOutput.to_string().is_empty());
    assert!(!DecompressError::InsufficientSpace.to_string().is_empty());
    let _: &dyn std::error::Error = &DecompressError::BadData;
}
