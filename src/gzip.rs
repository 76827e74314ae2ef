//! Gzip (RFC 1952) framing over the raw DEFLATE codec.
//!
//! A 10-byte fixed header with optional extra/name/comment/CRC16
//! fields, the raw stream, then little-endian CRC-32 and ISIZE.

use crc32fast::Hasher;
use log::debug;

use crate::compress::{compress_bound, Compressor};
use crate::decompress::{DecompressError, Decompressor};

/// Fixed header plus trailer bytes around the raw stream.
pub const GZIP_OVERHEAD: usize = 10 + 8;

const GZIP_ID1: u8 = 0x1F;
const GZIP_ID2: u8 = 0x8B;
const CM_DEFLATE: u8 = 8;

const FLG_FTEXT: u8 = 0x01;
const FLG_FHCRC: u8 = 0x02;
const FLG_FEXTRA: u8 = 0x04;
const FLG_FNAME: u8 = 0x08;
const FLG_FCOMMENT: u8 = 0x10;
const FLG_RESERVED: u8 = 0xE0;

const XFL_SLOWEST: u8 = 2;
const XFL_FASTEST: u8 = 4;

const OS_UNKNOWN: u8 = 255;

/// Worst-case gzip-wrapped size for `in_len` input bytes.
pub fn gzip_compress_bound(in_len: usize) -> usize {
    GZIP_OVERHEAD + compress_bound(in_len)
}

fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

impl Compressor {
    /// Compress `input` as a gzip member.  Returns the total size, or 0
    /// if it does not fit in `output`.
    pub fn gzip_compress(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        if output.len() < GZIP_OVERHEAD {
            return 0;
        }

        let xfl = match self.level() {
            1 => XFL_FASTEST,
            10..=12 => XFL_SLOWEST,
            _ => 0,
        };
        output[0] = GZIP_ID1;
        output[1] = GZIP_ID2;
        output[2] = CM_DEFLATE;
        output[3] = 0; // FLG: no optional fields
        output[4..8].fill(0); // MTIME
        output[8] = xfl;
        output[9] = OS_UNKNOWN;

        let body_space = output.len() - GZIP_OVERHEAD;
        let n = self.compress(input, &mut output[10..10 + body_space]);
        if n == 0 {
            return 0;
        }

        output[10 + n..10 + n + 4].copy_from_slice(&crc32(input).to_le_bytes());
        output[10 + n + 4..10 + n + 8]
            .copy_from_slice(&(input.len() as u32).to_le_bytes());
        10 + n + 8
    }

    /// Worst-case gzip-wrapped size for `in_len` input bytes.
    pub fn gzip_compress_bound(&self, in_len: usize) -> usize {
        gzip_compress_bound(in_len)
    }
}

impl Decompressor {
    /// Decompress a gzip member, filling `output` exactly.
    pub fn gzip_decompress(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<usize, DecompressError> {
        let (_, written) = self.gzip_decompress_ex(input, output)?;
        if written != output.len() {
            return Err(DecompressError::ShortOutput);
        }
        Ok(written)
    }

    /// Decompress a gzip member that need not fill `output`.  Returns
    /// `(input bytes consumed, output bytes written)`.
    pub fn gzip_decompress_ex(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize), DecompressError> {
        let data_start = parse_header(input)?;

        let (consumed, written) = self.decompress_ex(&input[data_start..], output)?;

        let trailer_at = data_start + consumed;
        let trailer = input
            .get(trailer_at..trailer_at + 8)
            .ok_or(DecompressError::BadData)?;
        let stored_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let stored_isize = u32::from_le_bytes([trailer[4], trailer[5], trailer[6], trailer[7]]);

        if stored_crc != crc32(&output[..written]) {
            return Err(DecompressError::BadData);
        }
        if stored_isize != written as u32 {
            return Err(DecompressError::BadData);
        }
        if input.len() != trailer_at + 8 {
            return Err(DecompressError::BadData);
        }
        Ok((trailer_at + 8, written))
    }
}

/// Validate the header and every optional field it announces.  Returns
/// the offset of the compressed data.
fn parse_header(input: &[u8]) -> Result<usize, DecompressError> {
    if input.len() < GZIP_OVERHEAD {
        return Err(DecompressError::BadData);
    }
    if input[0] != GZIP_ID1 || input[1] != GZIP_ID2 || input[2] != CM_DEFLATE {
        return Err(DecompressError::BadData);
    }
    let flg = input[3];
    if flg & FLG_RESERVED != 0 {
        debug!("rejecting gzip header with reserved flags {flg:#x}");
        return Err(DecompressError::BadData);
    }
    // MTIME, XFL, and OS carry no constraints.
    let mut pos = 10;

    if flg & FLG_FEXTRA != 0 {
        let xlen_bytes = input.get(pos..pos + 2).ok_or(DecompressError::BadData)?;
        let xlen = u16::from_le_bytes([xlen_bytes[0], xlen_bytes[1]]) as usize;
        pos += 2;
        if input.len() < pos + xlen {
            return Err(DecompressError::BadData);
        }
        pos += xlen;
    }
    if flg & FLG_FNAME != 0 {
        pos = skip_nul_terminated(input, pos)?;
    }
    if flg & FLG_FCOMMENT != 0 {
        pos = skip_nul_terminated(input, pos)?;
    }
    if flg & FLG_FHCRC != 0 {
        // Present but not verified; the whole-stream CRC-32 covers the
        // payload.
        if input.len() < pos + 2 {
            return Err(DecompressError::BadData);
        }
        pos += 2;
    }
    let _ = flg & FLG_FTEXT; // advisory only
    Ok(pos)
}

fn skip_nul_terminated(input: &[u8], from: usize) -> Result<usize, DecompressError> {
    match input[from..].iter().position(|&b| b == 0) {
        Some(i) => Ok(from + i + 1),
        None => Err(DecompressError::BadData),
    }
}
