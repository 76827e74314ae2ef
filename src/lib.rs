//! Whole-buffer DEFLATE, zlib, and gzip codec.
//!
//! The library compresses and decompresses complete in-memory buffers;
//! there is no streaming state machine.  Thirteen compression levels
//! trade speed for ratio, from stored-only (0) through hash-table (1),
//! hash-chain greedy/lazy (2..=9) to binary-tree near-optimal parsing
//! (10..=12).
//!
//! ```
//! let mut c = deflate::Compressor::new(6).unwrap();
//! let data = b"Hello, world! Hello, world!";
//! let mut buf = vec![0u8; c.compress_bound(data.len())];
//! let n = c.compress(data, &mut buf);
//! assert!(n > 0);
//!
//! let mut d = deflate::Decompressor::new();
//! let mut out = vec![0u8; data.len()];
//! d.decompress(&buf[..n], &mut out).unwrap();
//! assert_eq!(&out, data);
//! ```

pub mod bitio;
pub mod compress;
pub mod constants;
pub mod decompress;
pub mod gzip;
pub mod huffman;
pub mod matchfinder;
pub mod zlib;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level re-exports for the common API entry points.
// ─────────────────────────────────────────────────────────────────────────────

/// Reusable compressor handle; one per level.
pub use compress::Compressor;
/// Reusable decompressor handle.
pub use decompress::Decompressor;
/// Closed set of decompression failures.
pub use decompress::DecompressError;

/// Worst-case raw DEFLATE output size for a given input size.
pub use compress::compress_bound;
/// Worst-case zlib-wrapped output size for a given input size.
pub use zlib::zlib_compress_bound;
/// Worst-case gzip-wrapped output size for a given input size.
pub use gzip::gzip_compress_bound;

/// Highest supported compression level.
pub use compress::MAX_COMPRESSION_LEVEL;
