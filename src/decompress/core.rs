//! The block loop: header parsing, table building, and the two inner
//! decode loops (fastloop with bounds margins, generic tail).

use crate::bitio::BitReader;
use crate::constants::{
    load_static_litlen_lens, load_static_offset_lens, BLOCKTYPE_DYNAMIC_HUFFMAN,
    BLOCKTYPE_STATIC_HUFFMAN, BLOCKTYPE_UNCOMPRESSED, MAX_LITLEN_CODEWORD_LEN, MAX_MATCH_LEN,
    MAX_OFFSET_CODEWORD_LEN, MAX_PRE_CODEWORD_LEN, NUM_LITLEN_SYMS, NUM_OFFSET_SYMS,
    NUM_PRECODE_SYMS, PRECODE_LENS_PERMUTATION,
};
use crate::huffman::decode_table::{
    build_decode_table, HUFFDEC_END_OF_BLOCK, HUFFDEC_EXCEPTIONAL, HUFFDEC_LITERAL,
    HUFFDEC_SUBTABLE_POINTER,
};

use super::{
    DecompressError, Decompressor, LITLEN_DECODE_RESULTS, LITLEN_TABLEBITS,
    OFFSET_DECODE_RESULTS, OFFSET_TABLEBITS, PRECODE_DECODE_RESULTS, PRECODE_TABLEBITS,
};

/// One fastloop iteration writes at most 3 literals, one maximum-length
/// match, and a 7-byte word-copy overshoot.
const FASTLOOP_MAX_BYTES_WRITTEN: usize = 3 + MAX_MATCH_LEN + 8;

/// A full literal-or-match step needs at most 48 bits: a 15-bit litlen
/// codeword with 5 extra bits, then a 15-bit offset codeword with 13
/// extra bits.  One refill covers it.
const SEQUENCE_BITS: u32 = 48;

#[inline(always)]
fn extra_mask(n: u32) -> u64 {
    (1u64 << n) - 1
}

impl Decompressor {
    /// Decode a complete DEFLATE stream.  Returns
    /// `(input bytes consumed, output bytes written)`.
    pub(crate) fn decompress_core(
        &mut self,
        input: &[u8],
        output: &mut [u8],
    ) -> Result<(usize, usize), DecompressError> {
        let mut r = BitReader::new(input);
        let mut out_pos = 0usize;

        loop {
            r.ensure(3);
            let is_final = r.pop_bits(1) != 0;
            let block_type = r.pop_bits(2) as u32;

            match block_type {
                BLOCKTYPE_DYNAMIC_HUFFMAN => {
                    let (num_litlen, num_offset) = self.read_dynamic_header(&mut r)?;
                    self.build_block_tables(num_litlen, num_offset)?;
                    self.static_codes_loaded = false;
                    self.decode_huffman_block(&mut r, output, &mut out_pos)?;
                }
                BLOCKTYPE_STATIC_HUFFMAN => {
                    if !self.static_codes_loaded {
                        load_static_litlen_lens(&mut self.lens[..NUM_LITLEN_SYMS]);
                        load_static_offset_lens(
                            &mut self.lens[NUM_LITLEN_SYMS..NUM_LITLEN_SYMS + NUM_OFFSET_SYMS],
                        );
                        self.build_block_tables(NUM_LITLEN_SYMS, NUM_OFFSET_SYMS)?;
                        self.static_codes_loaded = true;
                    }
                    self.decode_huffman_block(&mut r, output, &mut out_pos)?;
                }
                BLOCKTYPE_UNCOMPRESSED => copy_uncompressed(&mut r, output, &mut out_pos)?,
                _ => return Err(DecompressError::BadData),
            }

            if is_final {
                break;
            }
        }

        // A truncated stream may have limped here on phantom zero bits.
        if r.consumed_phantom_bytes() {
            return Err(DecompressError::BadData);
        }
        r.align_to_byte();
        Ok((r.raw_position(), out_pos))
    }

    /// Read HLIT/HDIST/HCLEN, build the precode table, and decode the
    /// run-length-encoded litlen+offset length sequence into
    /// `self.lens`.
    fn read_dynamic_header(
        &mut self,
        r: &mut BitReader,
    ) -> Result<(usize, usize), DecompressError> {
        r.ensure(14);
        let num_litlen_syms = 257 + r.pop_bits(5) as usize;
        let num_offset_syms = 1 + r.pop_bits(5) as usize;
        let num_explicit_lens = 4 + r.pop_bits(4) as usize;

        self.precode_lens.fill(0);
        for &presym in PRECODE_LENS_PERMUTATION.iter().take(num_explicit_lens) {
            r.ensure(3);
            self.precode_lens[presym as usize] = r.pop_bits(3) as u8;
        }

        let ok = build_decode_table(
            &mut self.precode_table,
            &self.precode_lens,
            NUM_PRECODE_SYMS,
            &PRECODE_DECODE_RESULTS,
            PRECODE_TABLEBITS,
            MAX_PRE_CODEWORD_LEN,
            &mut self.sorted_syms,
        );
        if !ok {
            return Err(DecompressError::BadData);
        }

        let num_lens = num_litlen_syms + num_offset_syms;
        let mut i = 0;
        while i < num_lens {
            r.ensure((MAX_PRE_CODEWORD_LEN + 7) as u32);
            let entry = self.precode_table[r.peek(PRECODE_TABLEBITS as u32) as usize];
            r.consume(entry & 0xFF);
            let presym = (entry >> 16) as usize;

            if presym < 16 {
                // Explicit codeword length.
                self.lens[i] = presym as u8;
                i += 1;
                continue;
            }

            // Run-length encoded lengths.  The lens array carries enough
            // slack for the worst-case overrun, so the repeat counts
            // never need a range check; the fixed-width fills dodge the
            // branch on the actual count.
            match presym {
                16 => {
                    if i == 0 {
                        return Err(DecompressError::BadData);
                    }
                    let prev = self.lens[i - 1];
                    let rep = 3 + r.pop_bits(2) as usize;
                    self.lens[i..i + 6].fill(prev);
                    i += rep;
                }
                17 => {
                    let rep = 3 + r.pop_bits(3) as usize;
                    self.lens[i..i + 10].fill(0);
                    i += rep;
                }
                _ => {
                    let rep = 11 + r.pop_bits(7) as usize;
                    self.lens[i..i + rep].fill(0);
                    i += rep;
                }
            }
        }

        Ok((num_litlen_syms, num_offset_syms))
    }

    /// Build the offset table, then the litlen table.  The offset table
    /// is built first so that implementations overlaying `lens` with
    /// the litlen table see the same observable order.
    fn build_block_tables(
        &mut self,
        num_litlen_syms: usize,
        num_offset_syms: usize,
    ) -> Result<(), DecompressError> {
        let ok = build_decode_table(
            &mut self.offset_table,
            &self.lens[num_litlen_syms..num_litlen_syms + num_offset_syms],
            num_offset_syms,
            &OFFSET_DECODE_RESULTS,
            OFFSET_TABLEBITS,
            MAX_OFFSET_CODEWORD_LEN,
            &mut self.sorted_syms,
        );
        if !ok {
            return Err(DecompressError::BadData);
        }

        let ok = build_decode_table(
            &mut self.litlen_table,
            &self.lens[..num_litlen_syms],
            num_litlen_syms,
            &LITLEN_DECODE_RESULTS,
            LITLEN_TABLEBITS,
            MAX_LITLEN_CODEWORD_LEN,
            &mut self.sorted_syms,
        );
        if !ok {
            return Err(DecompressError::BadData);
        }
        Ok(())
    }

    /// Decode literals and matches until the end-of-block symbol.
    fn decode_huffman_block(
        &self,
        r: &mut BitReader,
        output: &mut [u8],
        out_pos_ref: &mut usize,
    ) -> Result<(), DecompressError> {
        let mut out_pos = *out_pos_ref;

        // ── Fastloop: enough output margin to skip per-write checks.
        'fastloop: while out_pos + FASTLOOP_MAX_BYTES_WRITTEN <= output.len() {
            r.ensure(SEQUENCE_BITS);
            let mut entry = self.litlen_table[r.peek(LITLEN_TABLEBITS as u32) as usize];

            // Main-table literals are at most 10 bits, so after the
            // refill two can be decoded back to back and a third
            // lookup is still valid.
            let mut lits = 0;
            while entry & HUFFDEC_LITERAL != 0 && lits < 2 {
                r.consume(entry & 0xFF);
                output[out_pos] = (entry >> 16) as u8;
                out_pos += 1;
                lits += 1;
                entry = self.litlen_table[r.peek(LITLEN_TABLEBITS as u32) as usize];
            }
            if entry & HUFFDEC_LITERAL != 0 {
                r.consume(entry & 0xFF);
                output[out_pos] = (entry >> 16) as u8;
                out_pos += 1;
                continue 'fastloop;
            }
            if lits > 0 {
                // Not enough bit budget left for a whole match; redo
                // this entry with a fresh refill.
                continue 'fastloop;
            }

            if entry & HUFFDEC_EXCEPTIONAL != 0 {
                if entry & HUFFDEC_SUBTABLE_POINTER != 0 {
                    r.consume(entry & 0xFF);
                    let sub_bits = (entry >> 8) & 0x3F;
                    entry = self.litlen_table
                        [(entry >> 16) as usize + r.peek(sub_bits) as usize];
                    if entry & HUFFDEC_LITERAL != 0 {
                        r.consume(entry & 0xFF);
                        output[out_pos] = (entry >> 16) as u8;
                        out_pos += 1;
                        continue 'fastloop;
                    }
                }
                if entry & HUFFDEC_END_OF_BLOCK != 0 {
                    r.consume(entry & 0xFF);
                    *out_pos_ref = out_pos;
                    return Ok(());
                }
            }

            // Length, then offset.  The extra bits are pulled from the
            // pre-consume image of the bit buffer.
            let saved = r.peek_all();
            r.consume(entry & 0xFF);
            let codeword_bits = (entry >> 8) & 0xF;
            let num_extra = (entry & 0xFF) - codeword_bits;
            let length =
                (entry >> 16) as usize + ((saved >> codeword_bits) & extra_mask(num_extra)) as usize;

            let offset = self.decode_offset(r);
            if offset > out_pos {
                return Err(DecompressError::BadData);
            }

            let src = out_pos - offset;
            if offset == 1 {
                // Run of a single byte.
                let b = output[src];
                output[out_pos..out_pos + length].fill(b);
            } else if offset >= 8 {
                // Word-sized chunks; the margin absorbs the overshoot.
                let mut copied = 0;
                while copied < length {
                    let chunk: [u8; 8] =
                        output[src + copied..src + copied + 8].try_into().unwrap();
                    output[out_pos + copied..out_pos + copied + 8].copy_from_slice(&chunk);
                    copied += 8;
                }
            } else {
                for j in 0..length {
                    output[out_pos + j] = output[src + j];
                }
            }
            out_pos += length;
        }

        // ── Generic tail: full bounds checks, byte-wise copies.
        loop {
            r.ensure(SEQUENCE_BITS);
            let mut entry = self.litlen_table[r.peek(LITLEN_TABLEBITS as u32) as usize];
            if entry & HUFFDEC_EXCEPTIONAL != 0 && entry & HUFFDEC_SUBTABLE_POINTER != 0 {
                r.consume(entry & 0xFF);
                let sub_bits = (entry >> 8) & 0x3F;
                entry = self.litlen_table[(entry >> 16) as usize + r.peek(sub_bits) as usize];
            }

            let saved = r.peek_all();
            r.consume(entry & 0xFF);

            if entry & HUFFDEC_LITERAL != 0 {
                if out_pos == output.len() {
                    return Err(DecompressError::InsufficientSpace);
                }
                output[out_pos] = (entry >> 16) as u8;
                out_pos += 1;
                continue;
            }
            if entry & HUFFDEC_END_OF_BLOCK != 0 {
                *out_pos_ref = out_pos;
                return Ok(());
            }

            let codeword_bits = (entry >> 8) & 0xF;
            let num_extra = (entry & 0xFF) - codeword_bits;
            let length =
                (entry >> 16) as usize + ((saved >> codeword_bits) & extra_mask(num_extra)) as usize;

            let offset = self.decode_offset(r);
            if offset > out_pos {
                return Err(DecompressError::BadData);
            }
            if length > output.len() - out_pos {
                return Err(DecompressError::InsufficientSpace);
            }

            let src = out_pos - offset;
            for j in 0..length {
                output[out_pos + j] = output[src + j];
            }
            out_pos += length;
        }
    }

    /// Decode one offset, subtable and extra bits included.
    #[inline(always)]
    fn decode_offset(&self, r: &mut BitReader) -> usize {
        let mut entry = self.offset_table[r.peek(OFFSET_TABLEBITS as u32) as usize];
        if entry & HUFFDEC_EXCEPTIONAL != 0 {
            // Only subtable pointers are exceptional in the offset table.
            r.consume(entry & 0xFF);
            let sub_bits = (entry >> 8) & 0x3F;
            entry = self.offset_table[(entry >> 16) as usize + r.peek(sub_bits) as usize];
        }
        let saved = r.peek_all();
        r.consume(entry & 0xFF);
        let codeword_bits = (entry >> 8) & 0xF;
        let num_extra = (entry & 0xFF) - codeword_bits;
        (entry >> 16) as usize + ((saved >> codeword_bits) & extra_mask(num_extra)) as usize
    }
}

/// Stored block: byte-align, check LEN/NLEN, copy.
fn copy_uncompressed(
    r: &mut BitReader,
    output: &mut [u8],
    out_pos: &mut usize,
) -> Result<(), DecompressError> {
    r.align_to_byte();
    let len = r.read_u16_le().ok_or(DecompressError::BadData)? as usize;
    let nlen = r.read_u16_le().ok_or(DecompressError::BadData)?;
    if nlen != !(len as u16) {
        return Err(DecompressError::BadData);
    }
    if len > r.bytes_remaining() {
        return Err(DecompressError::BadData);
    }
    if len > output.len() - *out_pos {
        return Err(DecompressError::InsufficientSpace);
    }
    let copied = r.copy_bytes(&mut output[*out_pos..*out_pos + len]);
    debug_assert!(copied);
    *out_pos += len;
    Ok(())
}
