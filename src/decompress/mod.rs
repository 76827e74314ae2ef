//! Whole-buffer DEFLATE decompression.
//!
//! A [`Decompressor`] owns the three decode tables and their scratch;
//! it holds no per-stream state between calls, so one handle can be
//! reused across any number of independent buffers.

mod core;

use static_assertions::const_assert;

use crate::constants::{
    LENGTH_EXTRA_BITS, LENGTH_SLOT_BASE, MAX_NUM_SYMS, NUM_LITLEN_SYMS, NUM_OFFSET_SYMS,
    NUM_PRECODE_SYMS, OFFSET_EXTRA_BITS, OFFSET_SLOT_BASE,
};
use crate::huffman::decode_table::{
    HUFFDEC_END_OF_BLOCK, HUFFDEC_EXCEPTIONAL, HUFFDEC_LITERAL, HUFFDEC_RESULT_SHIFT,
};

/// Why a decompression call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecompressError {
    /// The input is not a valid stream of the expected format.
    BadData,
    /// The stream ended cleanly but produced fewer bytes than the
    /// output buffer expected.
    ShortOutput,
    /// The output buffer filled up before the stream ended.
    InsufficientSpace,
}

impl std::fmt::Display for DecompressError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            DecompressError::BadData => "invalid compressed data",
            DecompressError::ShortOutput => "stream produced less data than expected",
            DecompressError::InsufficientSpace => "output buffer too small",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for DecompressError {}

// Main-table index widths.
pub(crate) const PRECODE_TABLEBITS: usize = 7;
pub(crate) const LITLEN_TABLEBITS: usize = 10;
pub(crate) const OFFSET_TABLEBITS: usize = 8;

// Worst-case table sizes (main table plus all subtables) over every
// valid codeword-length assignment.
pub(crate) const PRECODE_ENOUGH: usize = 128;
pub(crate) const LITLEN_ENOUGH: usize = 1334;
pub(crate) const OFFSET_ENOUGH: usize = 402;

const_assert!(PRECODE_ENOUGH >= 1 << PRECODE_TABLEBITS);
const_assert!(LITLEN_ENOUGH >= 1 << LITLEN_TABLEBITS);
const_assert!(OFFSET_ENOUGH >= 1 << OFFSET_TABLEBITS);

/// Worst-case overrun of the length-sequence array: 137 surplus zeroes
/// when a repeat of 138 lands on the last expected entry.
pub(crate) const LENS_OVERRUN: usize = 137;

pub(crate) const NUM_LENS: usize = NUM_LITLEN_SYMS + NUM_OFFSET_SYMS + LENS_OVERRUN;

// Static decode-result tables: the per-symbol part of each table entry.

pub(crate) const PRECODE_DECODE_RESULTS: [u32; NUM_PRECODE_SYMS] = build_precode_results();

const fn build_precode_results() -> [u32; NUM_PRECODE_SYMS] {
    let mut results = [0u32; NUM_PRECODE_SYMS];
    let mut sym = 0;
    while sym < NUM_PRECODE_SYMS {
        results[sym] = (sym as u32) << HUFFDEC_RESULT_SHIFT;
        sym += 1;
    }
    results
}

pub(crate) const LITLEN_DECODE_RESULTS: [u32; NUM_LITLEN_SYMS] = build_litlen_results();

const fn build_litlen_results() -> [u32; NUM_LITLEN_SYMS] {
    let mut results = [0u32; NUM_LITLEN_SYMS];
    let mut sym = 0;
    while sym < 256 {
        results[sym] = HUFFDEC_LITERAL | ((sym as u32) << HUFFDEC_RESULT_SHIFT);
        sym += 1;
    }
    results[256] = HUFFDEC_EXCEPTIONAL | HUFFDEC_END_OF_BLOCK;
    let mut slot = 0;
    while slot < LENGTH_SLOT_BASE.len() {
        results[257 + slot] = ((LENGTH_SLOT_BASE[slot] as u32) << HUFFDEC_RESULT_SHIFT)
            | LENGTH_EXTRA_BITS[slot] as u32;
        slot += 1;
    }
    // The two reserved symbols decode like the last length slot; a
    // stream that uses them is invalid but must not be able to index
    // out of range.
    results[286] = 258 << HUFFDEC_RESULT_SHIFT;
    results[287] = 258 << HUFFDEC_RESULT_SHIFT;
    results
}

pub(crate) const OFFSET_DECODE_RESULTS: [u32; NUM_OFFSET_SYMS] = build_offset_results();

const fn build_offset_results() -> [u32; NUM_OFFSET_SYMS] {
    let mut results = [0u32; NUM_OFFSET_SYMS];
    let mut slot = 0;
    while slot < OFFSET_SLOT_BASE.len() {
        results[slot] = ((OFFSET_SLOT_BASE[slot] as u32) << HUFFDEC_RESULT_SHIFT)
            | OFFSET_EXTRA_BITS[slot] as u32;
        slot += 1;
    }
    // Reserved symbols: offsets past the window, so the in-bounds check
    // against produced output rejects any stream that reaches them.
    results[30] = (32769 << HUFFDEC_RESULT_SHIFT) | 14;
    results[31] = (49153 << HUFFDEC_RESULT_SHIFT) | 14;
    results
}

/// A reusable DEFLATE decompressor.
///
/// All working memory is owned by the handle: the three decode tables,
/// the decoded length sequence, and the symbol-sorting scratch.
pub struct Decompressor {
    pub(crate) precode_lens: [u8; NUM_PRECODE_SYMS],
    pub(crate) lens: [u8; NUM_LENS],
    pub(crate) precode_table: [u32; PRECODE_ENOUGH],
    pub(crate) litlen_table: [u32; LITLEN_ENOUGH],
    pub(crate) offset_table: [u32; OFFSET_ENOUGH],
    pub(crate) sorted_syms: [u16; MAX_NUM_SYMS],
    pub(crate) static_codes_loaded: bool,
}

impl Decompressor {
    pub fn new() -> Decompressor {
        Decompressor {
            precode_lens: [0; NUM_PRECODE_SYMS],
            lens: [0; NUM_LENS],
            precode_table: [0; PRECODE_ENOUGH],
            litlen_table: [0; LITLEN_ENOUGH],
            offset_table: [0; OFFSET_ENOUGH],
            sorted_syms: [0; MAX_NUM_SYMS],
            static_codes_loaded: false,
        }
    }

    /// Decompress a raw DEFLATE stream, filling `output` exactly.
    ///
    /// Returns the number of bytes written (always `output.len()`).
    /// A stream that ends early returns [`DecompressError::ShortOutput`].
    pub fn decompress(&mut self, input: &[u8], output: &mut [u8]) -> Result<usize, DecompressError> {
        let (_, written) = self.decompress_core(input, output)?;
        if written != output.len() {
            return Err(DecompressError::ShortOutput);
        }
        Ok(written)
    }

    /// Decompress a raw DEFLATE stream that need not fill `output`.
    ///
    /// Returns `(input bytes consumed, output bytes written)`.
    pub fn decompress_ex(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize), DecompressError> {
        self.decompress_core(input, output)
    }
}

impl Default for Decompressor {
    fn default() -> Decompressor {
        Decompressor::new()
    }
}
