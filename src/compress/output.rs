//! Block emission: choose the cheapest block type and write it.
//!
//! For every finished block the writer prices a dynamic-Huffman, a
//! static-Huffman and a stored rendition, header overhead and all, and
//! emits the cheapest.  Dynamic blocks carry their code pair as a
//! run-length-encoded length sequence under a 19-symbol precode.

use log::trace;

use crate::bitio::BitWriter;
use crate::constants::{
    offset_slot, BLOCKTYPE_DYNAMIC_HUFFMAN, BLOCKTYPE_STATIC_HUFFMAN, BLOCKTYPE_UNCOMPRESSED,
    END_OF_BLOCK, FIRST_LEN_SYM, LENGTH_EXTRA_BITS, LENGTH_SLOT, LENGTH_SLOT_BASE,
    MAX_PRE_CODEWORD_LEN, NUM_LITLEN_SYMS, NUM_OFFSET_SYMS, NUM_PRECODE_SYMS, OFFSET_EXTRA_BITS,
    OFFSET_SLOT_BASE, PRECODE_LENS_PERMUTATION,
};
use crate::huffman::code::make_huffman_code;

use super::near_optimal::OptimumNode;
use super::seq::{FreqCounters, HuffmanCodes, Sequence};

/// Largest payload of a single stored chunk.
pub const MAX_STORED_CHUNK: usize = 65_535;

/// What a block's body is read from.
pub enum BlockContent<'a> {
    /// Greedy/lazy sequences; literal bytes come from the block data.
    Sequences(&'a [Sequence]),
    /// The chosen path through a near-optimal node array.
    Items(&'a [OptimumNode]),
}

/// Precode construction scratch, reused across blocks.
pub struct PrecodeState {
    freqs: [u32; NUM_PRECODE_SYMS],
    lens: [u8; NUM_PRECODE_SYMS],
    codewords: [u32; NUM_PRECODE_SYMS],
    /// Each item is `sym | (extra_bits_value << 5)`.
    items: [u32; NUM_LITLEN_SYMS + NUM_OFFSET_SYMS],
    num_items: usize,
    num_explicit_lens: usize,
}

impl PrecodeState {
    pub fn new() -> PrecodeState {
        PrecodeState {
            freqs: [0; NUM_PRECODE_SYMS],
            lens: [0; NUM_PRECODE_SYMS],
            codewords: [0; NUM_PRECODE_SYMS],
            items: [0; NUM_LITLEN_SYMS + NUM_OFFSET_SYMS],
            num_items: 0,
            num_explicit_lens: 0,
        }
    }

    /// Run-length encode `lens` into precode items: symbol 16 repeats
    /// the previous length 3..=6 times, 17 covers 3..=10 zeroes, 18
    /// covers 11..=138 zeroes.
    fn compute_items(&mut self, lens: &[u8]) {
        self.freqs.fill(0);
        self.num_items = 0;

        let num_lens = lens.len();
        let mut run_start = 0;
        while run_start != num_lens {
            let len = lens[run_start];
            let mut run_end = run_start;
            while run_end != num_lens && lens[run_end] == len {
                run_end += 1;
            }

            if len == 0 {
                while run_end - run_start >= 11 {
                    let extra = (run_end - run_start - 11).min(0x7F) as u32;
                    self.freqs[18] += 1;
                    self.push_item(18 | (extra << 5));
                    run_start += 11 + extra as usize;
                }
                if run_end - run_start >= 3 {
                    let extra = (run_end - run_start - 3).min(0x7) as u32;
                    self.freqs[17] += 1;
                    self.push_item(17 | (extra << 5));
                    run_start += 3 + extra as usize;
                }
            } else if run_end - run_start >= 4 {
                self.freqs[len as usize] += 1;
                self.push_item(u32::from(len));
                run_start += 1;
                loop {
                    let extra = (run_end - run_start - 3).min(0x3) as u32;
                    self.freqs[16] += 1;
                    self.push_item(16 | (extra << 5));
                    run_start += 3 + extra as usize;
                    if run_end - run_start < 3 {
                        break;
                    }
                }
            }

            while run_start != run_end {
                self.freqs[len as usize] += 1;
                self.push_item(u32::from(len));
                run_start += 1;
            }
        }
    }

    #[inline(always)]
    fn push_item(&mut self, item: u32) {
        self.items[self.num_items] = item;
        self.num_items += 1;
    }

    fn build(&mut self, lens: &[u8]) {
        self.compute_items(lens);
        make_huffman_code(
            NUM_PRECODE_SYMS,
            MAX_PRE_CODEWORD_LEN,
            &self.freqs,
            &mut self.lens,
            &mut self.codewords,
        );
        let mut n = NUM_PRECODE_SYMS;
        while n > 4 && self.lens[PRECODE_LENS_PERMUTATION[n - 1] as usize] == 0 {
            n -= 1;
        }
        self.num_explicit_lens = n;
    }

    /// Bits for HLIT/HDIST/HCLEN, the explicit precode lengths, and the
    /// encoded length sequence.
    fn cost(&self) -> u64 {
        let mut cost = (5 + 5 + 4) + 3 * self.num_explicit_lens as u64;
        for &item in &self.items[..self.num_items] {
            let sym = (item & 0x1F) as usize;
            cost += u64::from(self.lens[sym]);
            cost += match sym {
                16 => 2,
                17 => 3,
                18 => 7,
                _ => 0,
            };
        }
        cost
    }
}

/// Number of bits to encode every symbol occurrence in `freqs` with the
/// given code pair, extra bits included.
fn body_cost(freqs: &FreqCounters, codes: &HuffmanCodes) -> u64 {
    let mut cost = 0u64;
    for sym in 0..FIRST_LEN_SYM {
        cost += u64::from(freqs.litlen[sym]) * u64::from(codes.litlen_lens[sym]);
    }
    for slot in 0..LENGTH_SLOT_BASE.len() {
        let sym = FIRST_LEN_SYM + slot;
        cost += u64::from(freqs.litlen[sym])
            * u64::from(codes.litlen_lens[sym] + LENGTH_EXTRA_BITS[slot]);
    }
    for slot in 0..OFFSET_SLOT_BASE.len() {
        cost += u64::from(freqs.offset[slot])
            * u64::from(codes.offset_lens[slot] + OFFSET_EXTRA_BITS[slot]);
    }
    cost
}

/// Emit one finished block, choosing its type by cost.
///
/// `freqs` must already include the end-of-block symbol.
pub fn flush_block(
    w: &mut BitWriter,
    block_data: &[u8],
    is_final: bool,
    freqs: &FreqCounters,
    codes: &mut HuffmanCodes,
    static_codes: &HuffmanCodes,
    precode: &mut PrecodeState,
    content: BlockContent,
) {
    debug_assert!(freqs.litlen[END_OF_BLOCK] > 0);

    codes.build_from_freqs(freqs);

    let mut num_litlen_syms = NUM_LITLEN_SYMS;
    while num_litlen_syms > 257 && codes.litlen_lens[num_litlen_syms - 1] == 0 {
        num_litlen_syms -= 1;
    }
    let mut num_offset_syms = NUM_OFFSET_SYMS;
    while num_offset_syms > 1 && codes.offset_lens[num_offset_syms - 1] == 0 {
        num_offset_syms -= 1;
    }

    // The transmitted length sequence is the two length arrays
    // back to back.
    let mut lens_scratch = [0u8; NUM_LITLEN_SYMS + NUM_OFFSET_SYMS];
    lens_scratch[..num_litlen_syms].copy_from_slice(&codes.litlen_lens[..num_litlen_syms]);
    lens_scratch[num_litlen_syms..num_litlen_syms + num_offset_syms]
        .copy_from_slice(&codes.offset_lens[..num_offset_syms]);
    precode.build(&lens_scratch[..num_litlen_syms + num_offset_syms]);

    let dynamic_cost = 3 + precode.cost() + body_cost(freqs, codes);
    let static_cost = 3 + body_cost(freqs, static_codes);
    let stored_cost = stored_cost_bits(w.pending_bits(), block_data.len());

    let (use_stored, use_static) = if stored_cost < dynamic_cost.min(static_cost) {
        (true, false)
    } else {
        (false, static_cost <= dynamic_cost)
    };
    trace!(
        "block len {}: dynamic {} / static {} / stored {} bits",
        block_data.len(),
        dynamic_cost,
        static_cost,
        stored_cost
    );

    if use_stored {
        write_stored_block(w, block_data, is_final);
        return;
    }

    w.add_bits(u64::from(is_final), 1);
    if use_static {
        w.add_bits(u64::from(BLOCKTYPE_STATIC_HUFFMAN), 2);
        w.flush();
        write_body(w, static_codes, content, block_data);
    } else {
        w.add_bits(u64::from(BLOCKTYPE_DYNAMIC_HUFFMAN), 2);
        w.add_bits((num_litlen_syms - 257) as u64, 5);
        w.add_bits((num_offset_syms - 1) as u64, 5);
        w.add_bits((precode.num_explicit_lens - 4) as u64, 4);
        w.flush();

        for i in 0..precode.num_explicit_lens {
            w.add_bits(u64::from(precode.lens[PRECODE_LENS_PERMUTATION[i] as usize]), 3);
            w.flush();
        }
        for &item in &precode.items[..precode.num_items] {
            let sym = (item & 0x1F) as usize;
            w.add_bits(u64::from(precode.codewords[sym]), u32::from(precode.lens[sym]));
            match sym {
                16 => w.add_bits(u64::from(item >> 5), 2),
                17 => w.add_bits(u64::from(item >> 5), 3),
                18 => w.add_bits(u64::from(item >> 5), 7),
                _ => {}
            }
            w.flush();
        }
        write_body(w, codes, content, block_data);
    }
}

/// Cost in bits of storing `len` bytes verbatim, starting `pending`
/// bits past a byte boundary: the 3 header bits and alignment of the
/// first chunk, 32 bits of LEN/NLEN per chunk, 40 further bits of
/// header per extra chunk, and the payload.
fn stored_cost_bits(pending: u32, len: usize) -> u64 {
    let chunks = (len / MAX_STORED_CHUNK + usize::from(len % MAX_STORED_CHUNK != 0)).max(1) as u64;
    let align = u64::from((8 - ((pending + 3) & 7)) & 7);
    3 + align + 32 + 40 * (chunks - 1) + 8 * len as u64
}

/// Emit `data` as stored chunks of at most [`MAX_STORED_CHUNK`] bytes.
pub fn write_stored_block(w: &mut BitWriter, data: &[u8], is_final: bool) {
    let chunks = (data.len() / MAX_STORED_CHUNK
        + usize::from(data.len() % MAX_STORED_CHUNK != 0))
    .max(1);
    for i in 0..chunks {
        let chunk = &data[i * MAX_STORED_CHUNK..data.len().min((i + 1) * MAX_STORED_CHUNK)];
        let last = i == chunks - 1;
        w.add_bits(u64::from(is_final && last), 1);
        w.add_bits(u64::from(BLOCKTYPE_UNCOMPRESSED), 2);
        w.align_to_byte();
        let len = chunk.len() as u16;
        w.write_bytes(&len.to_le_bytes());
        w.write_bytes(&(!len).to_le_bytes());
        w.write_bytes(chunk);
    }
}

fn write_body(w: &mut BitWriter, codes: &HuffmanCodes, content: BlockContent, block_data: &[u8]) {
    match content {
        BlockContent::Sequences(seqs) => {
            let mut in_idx = 0;
            for seq in seqs {
                for _ in 0..seq.litrunlen {
                    write_literal(w, codes, block_data[in_idx]);
                    in_idx += 1;
                }
                if seq.length == 0 {
                    break;
                }
                write_match(
                    w,
                    codes,
                    seq.length as usize,
                    seq.offset as usize,
                    seq.length_slot as usize,
                    seq.offset_slot as usize,
                );
                in_idx += seq.length as usize;
            }
        }
        BlockContent::Items(nodes) => {
            let block_len = nodes.len() - 1;
            let mut i = 0;
            while i < block_len {
                let (value, length) = nodes[i].decode_item();
                if length == 1 {
                    write_literal(w, codes, value as u8);
                } else {
                    write_match(
                        w,
                        codes,
                        length,
                        value,
                        LENGTH_SLOT[length] as usize,
                        offset_slot(value),
                    );
                }
                i += length;
            }
        }
    }
    // End of block.
    w.add_bits(
        u64::from(codes.litlen_codewords[END_OF_BLOCK]),
        u32::from(codes.litlen_lens[END_OF_BLOCK]),
    );
    w.flush();
}

#[inline(always)]
fn write_literal(w: &mut BitWriter, codes: &HuffmanCodes, literal: u8) {
    w.add_bits(
        u64::from(codes.litlen_codewords[literal as usize]),
        u32::from(codes.litlen_lens[literal as usize]),
    );
    w.flush();
}

#[inline(always)]
fn write_match(
    w: &mut BitWriter,
    codes: &HuffmanCodes,
    length: usize,
    offset: usize,
    length_slot: usize,
    offset_slot: usize,
) {
    let len_sym = FIRST_LEN_SYM + length_slot;
    w.add_bits(u64::from(codes.litlen_codewords[len_sym]), u32::from(codes.litlen_lens[len_sym]));
    w.add_bits(
        (length - LENGTH_SLOT_BASE[length_slot] as usize) as u64,
        u32::from(LENGTH_EXTRA_BITS[length_slot]),
    );
    w.flush();
    w.add_bits(
        u64::from(codes.offset_codewords[offset_slot]),
        u32::from(codes.offset_lens[offset_slot]),
    );
    w.add_bits(
        (offset - OFFSET_SLOT_BASE[offset_slot] as usize) as u64,
        u32::from(OFFSET_EXTRA_BITS[offset_slot]),
    );
    w.flush();
}
