//! Zlib (RFC 1950) framing over the raw DEFLATE codec.
//!
//! Two header bytes, the raw stream, then a big-endian Adler-32 of the
//! uncompressed data.

use log::debug;
use simd_adler32::Adler32;

use crate::compress::{compress_bound, Compressor};
use crate::decompress::{DecompressError, Decompressor};

/// Header plus trailer bytes around the raw stream.
pub const ZLIB_OVERHEAD: usize = 2 + 4;

const CM_DEFLATE: u8 = 8;
const CINFO_32K: u8 = 7;

/// Worst-case zlib-wrapped size for `in_len` input bytes.
pub fn zlib_compress_bound(in_len: usize) -> usize {
    ZLIB_OVERHEAD + compress_bound(in_len)
}

fn adler32(data: &[u8]) -> u32 {
    let mut hasher = Adler32::new();
    hasher.write(data);
    hasher.finish()
}

impl Compressor {
    /// Compress `input` as a zlib stream.  Returns the total size, or 0
    /// if it does not fit in `output`.
    pub fn zlib_compress(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        if output.len() < ZLIB_OVERHEAD {
            return 0;
        }

        let cmf = (CINFO_32K << 4) | CM_DEFLATE;
        // FLEVEL hints the effort; FCHECK makes the pair a multiple of 31.
        let flevel: u8 = match self.level() {
            0..=2 => 0,
            3..=5 => 1,
            6 => 2,
            _ => 3,
        };
        let mut flg = flevel << 6;
        let rem = (u16::from(cmf) * 256 + u16::from(flg)) % 31;
        if rem != 0 {
            flg += (31 - rem) as u8;
        }
        debug_assert_eq!((u16::from(cmf) * 256 + u16::from(flg)) % 31, 0);

        output[0] = cmf;
        output[1] = flg;

        let trailer_space = output.len() - 2 - 4;
        let n = self.compress(input, &mut output[2..2 + trailer_space]);
        if n == 0 {
            return 0;
        }

        output[2 + n..2 + n + 4].copy_from_slice(&adler32(input).to_be_bytes());
        2 + n + 4
    }

    /// Worst-case zlib-wrapped size for `in_len` input bytes.
    pub fn zlib_compress_bound(&self, in_len: usize) -> usize {
        zlib_compress_bound(in_len)
    }
}

impl Decompressor {
    /// Decompress a zlib stream, filling `output` exactly.
    pub fn zlib_decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize, DecompressError> {
        let (_, written) = self.zlib_decompress_ex(input, output)?;
        if written != output.len() {
            return Err(DecompressError::ShortOutput);
        }
        Ok(written)
    }

    /// Decompress a zlib stream that need not fill `output`.  Returns
    /// `(input bytes consumed, output bytes written)`.
    pub fn zlib_decompress_ex(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize), DecompressError> {
        if input.len() < ZLIB_OVERHEAD {
            return Err(DecompressError::BadData);
        }
        let cmf = input[0];
        let flg = input[1];

        if cmf & 0xF != CM_DEFLATE || cmf >> 4 > CINFO_32K {
            debug!("rejecting zlib header: CM {} CINFO {}", cmf & 0xF, cmf >> 4);
            return Err(DecompressError::BadData);
        }
        if (u16::from(cmf) * 256 + u16::from(flg)) % 31 != 0 {
            return Err(DecompressError::BadData);
        }
        // Preset dictionaries are not supported.
        if flg & 0x20 != 0 {
            return Err(DecompressError::BadData);
        }

        let (consumed, written) = self.decompress_ex(&input[2..], output)?;

        let trailer_at = 2 + consumed;
        let trailer = input
            .get(trailer_at..trailer_at + 4)
            .ok_or(DecompressError::BadData)?;
        let stored = u32::from_be_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        if stored != adler32(&output[..written]) {
            return Err(DecompressError::BadData);
        }
        if input.len() != trailer_at + 4 {
            return Err(DecompressError::BadData);
        }
        Ok((trailer_at + 4, written))
    }
}
