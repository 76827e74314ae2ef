// Cross-implementation checks against flate2:
//   - flate2 inflates our raw / zlib / gzip output byte-for-byte
//   - we inflate flate2's output byte-for-byte

use std::io::{Read, Write};

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, GzEncoder, ZlibEncoder};
use flate2::Compression;

use deflate::{Compressor, Decompressor};

#[path = "../tests/common/mod.rs"]
mod common;

fn test_corpus() -> Vec<Vec<u8>> {
    vec![
        Vec::new(),
        b"Hello, world!\n".to_vec(),
        common::sample_text(10_000),
        common::random_bytes(11, 10_000),
        vec![0u8; 40_000],
        common::sample_text(120_000),
    ]
}

#[test]
fn flate2_inflates_our_raw_deflate() {
    for level in [0u32, 1, 2, 6, 9, 12] {
        for data in test_corpus() {
            let mut c = Compressor::new(level).unwrap();
            let mut buf = vec![0u8; c.compress_bound(data.len())];
            let n = c.compress(&data, &mut buf);
            assert!(n > 0);

            let mut decoder = DeflateDecoder::new(&buf[..n]);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out).expect("flate2 rejected our stream");
            assert_eq!(out, data, "level {level}, len {}", data.len());
        }
    }
}

#[test]
fn flate2_inflates_our_zlib() {
    for level in [1u32, 6, 11] {
        for data in test_corpus() {
            let mut c = Compressor::new(level).unwrap();
            let mut buf = vec![0u8; c.zlib_compress_bound(data.len())];
            let n = c.zlib_compress(&data, &mut buf);
            assert!(n > 0);

            let mut decoder = ZlibDecoder::new(&buf[..n]);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out).expect("flate2 rejected our zlib stream");
            assert_eq!(out, data, "level {level}");
        }
    }
}

#[test]
fn flate2_inflates_our_gzip() {
    for level in [1u32, 6, 10] {
        for data in test_corpus() {
            let mut c = Compressor::new(level).unwrap();
            let mut buf = vec![0u8; c.gzip_compress_bound(data.len())];
            let n = c.gzip_compress(&data, &mut buf);
            assert!(n > 0);

            let mut decoder = GzDecoder::new(&buf[..n]);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out).expect("flate2 rejected our gzip stream");
            assert_eq!(out, data, "level {level}");
        }
    }
}

#[test]
fn we_inflate_flate2_raw_deflate() {
    for flate2_level in [1u32, 6, 9] {
        for data in test_corpus() {
            let mut enc = DeflateEncoder::new(Vec::new(), Compression::new(flate2_level));
            enc.write_all(&data).unwrap();
            let stream = enc.finish().unwrap();

            let mut out = vec![0u8; data.len()];
            let (consumed, written) =
                Decompressor::new().decompress_ex(&stream, &mut out).expect("we rejected flate2");
            assert_eq!(consumed, stream.len());
            assert_eq!(written, data.len());
            assert_eq!(out, data);
        }
    }
}

#[test]
fn we_inflate_flate2_zlib() {
    for data in test_corpus() {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&data).unwrap();
        let stream = enc.finish().unwrap();

        let mut out = vec![0u8; data.len()];
        Decompressor::new().zlib_decompress(&stream, &mut out).expect("we rejected flate2 zlib");
        assert_eq!(out, data);
    }
}

#[test]
fn we_inflate_flate2_gzip() {
    for data in test_corpus() {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&data).unwrap();
        let stream = enc.finish().unwrap();

        let mut out = vec![0u8; data.len()];
        Decompressor::new().gzip_decompress(&stream, &mut out).expect("we rejected flate2 gzip");
        assert_eq!(out, data);
    }
}
