//! Sequence store and per-block symbol statistics.

use crate::constants::{
    load_static_litlen_lens, load_static_offset_lens, offset_slot,
    COMPRESSOR_MAX_LITLEN_CODEWORD_LEN, END_OF_BLOCK, FIRST_LEN_SYM, LENGTH_SLOT,
    MAX_OFFSET_CODEWORD_LEN, NUM_LITLEN_SYMS, NUM_OFFSET_SLOTS, NUM_OFFSET_SYMS,
};
use crate::huffman::code::{compute_codewords_from_lens, make_huffman_code};

/// Number of sequences the greedy and lazy parsers buffer per block; the
/// block is cut when the store fills.
pub const SEQ_STORE_LENGTH: usize = 50_000;

/// A run of literals (length only; the bytes are re-read from the input)
/// followed by one match.  A zero `length` terminates the block and
/// carries the final literal run.
#[derive(Debug, Clone, Copy)]
pub struct Sequence {
    pub litrunlen: u32,
    pub length: u16,
    pub offset: u16,
    pub length_slot: u8,
    pub offset_slot: u8,
}

impl Sequence {
    pub fn match_seq(litrunlen: u32, length: usize, offset: usize) -> Sequence {
        Sequence {
            litrunlen,
            length: length as u16,
            offset: offset as u16,
            length_slot: LENGTH_SLOT[length],
            offset_slot: offset_slot(offset) as u8,
        }
    }

    pub fn terminator(litrunlen: u32) -> Sequence {
        Sequence { litrunlen, length: 0, offset: 0, length_slot: 0, offset_slot: 0 }
    }
}

/// Symbol frequency counters for one block.
pub struct FreqCounters {
    pub litlen: [u32; NUM_LITLEN_SYMS],
    pub offset: [u32; NUM_OFFSET_SYMS],
}

impl FreqCounters {
    pub fn new() -> FreqCounters {
        FreqCounters { litlen: [0; NUM_LITLEN_SYMS], offset: [0; NUM_OFFSET_SYMS] }
    }

    pub fn reset(&mut self) {
        self.litlen.fill(0);
        self.offset.fill(0);
    }

    #[inline(always)]
    pub fn tally_literal(&mut self, literal: u8) {
        self.litlen[literal as usize] += 1;
    }

    #[inline(always)]
    pub fn tally_match(&mut self, length_slot: u8, offset_slot: u8) {
        self.litlen[FIRST_LEN_SYM + length_slot as usize] += 1;
        self.offset[offset_slot as usize] += 1;
    }

    #[inline(always)]
    pub fn tally_end_of_block(&mut self) {
        self.litlen[END_OF_BLOCK] += 1;
    }
}

/// Codeword lengths and bit-reversed codewords for one litlen/offset
/// code pair.
pub struct HuffmanCodes {
    pub litlen_codewords: [u32; NUM_LITLEN_SYMS],
    pub litlen_lens: [u8; NUM_LITLEN_SYMS],
    pub offset_codewords: [u32; NUM_OFFSET_SYMS],
    pub offset_lens: [u8; NUM_OFFSET_SYMS],
}

impl HuffmanCodes {
    pub fn new() -> HuffmanCodes {
        HuffmanCodes {
            litlen_codewords: [0; NUM_LITLEN_SYMS],
            litlen_lens: [0; NUM_LITLEN_SYMS],
            offset_codewords: [0; NUM_OFFSET_SYMS],
            offset_lens: [0; NUM_OFFSET_SYMS],
        }
    }

    /// Build the dynamic code pair for a block's frequencies.
    pub fn build_from_freqs(&mut self, freqs: &FreqCounters) {
        make_huffman_code(
            NUM_LITLEN_SYMS,
            COMPRESSOR_MAX_LITLEN_CODEWORD_LEN,
            &freqs.litlen,
            &mut self.litlen_lens,
            &mut self.litlen_codewords,
        );
        self.offset_lens[NUM_OFFSET_SLOTS..].fill(0);
        make_huffman_code(
            NUM_OFFSET_SLOTS,
            MAX_OFFSET_CODEWORD_LEN,
            &freqs.offset[..NUM_OFFSET_SLOTS],
            &mut self.offset_lens[..NUM_OFFSET_SLOTS],
            &mut self.offset_codewords[..NUM_OFFSET_SLOTS],
        );
    }

    /// The fixed RFC 1951 code pair.
    pub fn build_static() -> HuffmanCodes {
        let mut codes = HuffmanCodes::new();
        load_static_litlen_lens(&mut codes.litlen_lens);
        load_static_offset_lens(&mut codes.offset_lens);
        compute_codewords_from_lens(&codes.litlen_lens, &mut codes.litlen_codewords, 9);
        compute_codewords_from_lens(&codes.offset_lens, &mut codes.offset_codewords, 5);
        codes
    }
}
