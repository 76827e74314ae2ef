// End-to-end scenarios pinning down observable behaviour:
//   - empty input compresses to a static empty block
//   - run-heavy, diverse, and split-worthy inputs round-trip
//   - wrapper trailers carry the exact checksums and lengths

use deflate::{Compressor, DecompressError, Decompressor};

#[path = "../tests/common/mod.rs"]
mod common;

fn compress(level: u32, data: &[u8]) -> Vec<u8> {
    let mut c = Compressor::new(level).unwrap();
    let mut buf = vec![0u8; c.compress_bound(data.len())];
    let n = c.compress(data, &mut buf);
    assert!(n > 0);
    buf.truncate(n);
    buf
}

#[test]
fn empty_input_level_6_is_a_static_empty_block() {
    let stream = compress(6, b"");
    // BFINAL=1, BTYPE=01 (static): low three bits 0b011.
    assert_eq!(stream[0] & 0b111, 0b011);
    assert!(stream.len() <= 3);

    let mut out = [0u8; 0];
    let written = Decompressor::new().decompress(&stream, &mut out).unwrap();
    assert_eq!(written, 0);
}

#[test]
fn hundred_a_level_1_roundtrips_with_known_adler() {
    let data = vec![b'a'; 100];
    let mut c = Compressor::new(1).unwrap();
    let mut buf = vec![0u8; c.zlib_compress_bound(data.len())];
    let n = c.zlib_compress(&data, &mut buf);
    assert!(n > 0);
    buf.truncate(n);

    // Adler-32 of one hundred 'a' bytes: s1 = 1 + 100*0x61 = 0x25E5,
    // s2 = 100 + 0x61 * 5050 = 0x7A47.
    let trailer = &buf[buf.len() - 4..];
    assert_eq!(u32::from_be_bytes(trailer.try_into().unwrap()), 0x7A47_25E5);

    let mut out = vec![0u8; 100];
    Decompressor::new().zlib_decompress(&buf, &mut out).unwrap();
    assert_eq!(out, data);
}

#[test]
fn every_byte_value_level_9_roundtrips() {
    let data: Vec<u8> = (0..=255u8).collect();
    let stream = compress(9, &data);
    let mut out = vec![0u8; 256];
    Decompressor::new().decompress(&stream, &mut out).unwrap();
    assert_eq!(out, data);
}

#[test]
fn zeroes_then_random_megabyte_level_10() {
    const HALF: usize = 512 * 1024;
    let mut data = vec![0u8; HALF];
    data.extend_from_slice(&common::random_bytes(2024, HALF));

    let stream = compress(10, &data);
    // The zero half must nearly vanish; the random half cannot shrink.
    assert!(stream.len() < HALF + 16 * 1024, "compressed to {}", stream.len());
    assert!(stream.len() > HALF / 2);

    let mut out = vec![0u8; data.len()];
    Decompressor::new().decompress(&stream, &mut out).unwrap();
    assert_eq!(out[..HALF], data[..HALF]);
    assert_eq!(out[HALF..], data[HALF..]);
}

#[test]
fn gzip_hello_world_carries_isize_and_crc() {
    let data = b"Hello, world!\n";
    let mut c = Compressor::new(6).unwrap();
    let mut buf = vec![0u8; c.gzip_compress_bound(data.len())];
    let n = c.gzip_compress(data, &mut buf);
    assert!(n > 0);
    buf.truncate(n);

    let isize_bytes: [u8; 4] = buf[buf.len() - 4..].try_into().unwrap();
    assert_eq!(u32::from_le_bytes(isize_bytes), 14);

    let mut out = vec![0u8; data.len()];
    let written = Decompressor::new().gzip_decompress(&buf, &mut out).unwrap();
    assert_eq!(written, 14);
    assert_eq!(&out, data);
}

#[test]
fn precode_repeat_first_stream_is_rejected() {
    use deflate::bitio::BitWriter;
    let mut raw = [0u8; 32];
    let mut w = BitWriter::new(&mut raw);
    w.add_bits(1, 1);
    w.add_bits(0b10, 2);
    w.add_bits(0, 5);
    w.add_bits(0, 5);
    w.add_bits(0, 4);
    w.flush();
    for bits in [1u64, 0, 0, 1] {
        w.add_bits(bits, 3);
    }
    w.add_bits(1, 1); // symbol 16 with no previous length
    w.add_bits(0, 2);
    let n = w.finish().unwrap();

    let mut out = [0u8; 32];
    let err = Decompressor::new().decompress_ex(&raw[..n], &mut out).unwrap_err();
    assert_eq!(err, DecompressError::BadData);
}
