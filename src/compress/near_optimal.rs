//! Near-optimal parsing (levels 10..=12).
//!
//! Two phases per block.  The matchfinding phase runs the binary-tree
//! matchfinder over the input once, caching every distinct-length match
//! at each position plus a sentinel carrying the literal byte and the
//! match count; positions inside a nice-length match are skipped with
//! empty sentinels.  The optimisation phase then runs a backward
//! shortest-path over the cached matches under a fixed-point cost
//! model, re-deriving the Huffman codes (and the costs) between passes.
//!
//! When the block splitter fires partway through a scan, the cache is
//! rewound to the last approved checkpoint; the tail entries are kept
//! and become the head of the next block's cache.

use crate::bitio::BitWriter;
use crate::constants::{
    offset_slot, LENGTH_EXTRA_BITS, LENGTH_SLOT, MAX_MATCH_LEN, MIN_MATCH_LEN, NUM_OFFSET_SLOTS,
    OFFSET_EXTRA_BITS, WINDOW_SIZE,
};
use crate::matchfinder::{BtMatchfinder, Match};

use super::output::{flush_block, BlockContent, PrecodeState};
use super::seq::{FreqCounters, HuffmanCodes};
use super::splitter::{BlockSplitStats, MIN_BLOCK_LENGTH};
use super::{MIN_SEARCH_REMAINING, SOFT_MAX_BLOCK_LENGTH};

/// Fixed-point scale for all symbol costs: 16 units per output bit.
pub const BIT_COST: u32 = 16;

/// Maximum number of cached entries (matches plus sentinels).
pub const MATCH_CACHE_LENGTH: usize = SOFT_MAX_BLOCK_LENGTH * 5;

/// Worst-case entries one scanned position can append: every distinct
/// match length, the sentinel, and the skip sentinels of a nice match.
const MAX_CACHE_PER_POS: usize = (MAX_MATCH_LEN - MIN_MATCH_LEN + 1) + 1 + MAX_MATCH_LEN;

/// A block may overshoot the soft limit by one match.
pub const MAX_BLOCK_LENGTH: usize = SOFT_MAX_BLOCK_LENGTH + MAX_MATCH_LEN;

const OPTIMUM_OFFSET_SHIFT: u32 = 9;
const OPTIMUM_LEN_MASK: u32 = (1 << OPTIMUM_OFFSET_SHIFT) - 1;

/// One node per input position: the cheapest cost from here to the end
/// of the block, and the first step of that path, packed as
/// `(offset_or_literal << 9) | length` with length 1 meaning a literal.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptimumNode {
    pub cost_to_end: u32,
    item: u32,
}

impl OptimumNode {
    /// `(offset_or_literal, length)`.
    #[inline(always)]
    pub fn decode_item(&self) -> (usize, usize) {
        ((self.item >> OPTIMUM_OFFSET_SHIFT) as usize, (self.item & OPTIMUM_LEN_MASK) as usize)
    }
}

pub struct OptimalConfig {
    pub max_search_depth: u32,
    pub nice_match_len: usize,
    pub num_optim_passes: u32,
}

/// Estimated share of positions that will be matches, used to pick the
/// starting cost table.
#[derive(Clone, Copy, PartialEq, Eq)]
enum MatchProbability {
    Few,
    Neutral,
    Many,
}

/// Fixed-point cost of each symbol choice, by literal value, by match
/// length (slot and extra bits folded in), and by offset slot.
pub struct CostModel {
    literal: [u32; 256],
    length: [u32; MAX_MATCH_LEN + 1],
    offset_slot: [u32; NUM_OFFSET_SLOTS],
}

impl CostModel {
    pub fn new() -> CostModel {
        CostModel {
            literal: [0; 256],
            length: [0; MAX_MATCH_LEN + 1],
            offset_slot: [0; NUM_OFFSET_SLOTS],
        }
    }

    /// Seed costs for the first pass of the first block: a deterministic
    /// piecewise model keyed on literal diversity and expected match
    /// density.
    fn set_defaults(&mut self, num_used_literals: usize, prob: MatchProbability) {
        let diversity_bits = if num_used_literals <= 1 {
            2
        } else {
            (num_used_literals.ilog2() + 1).clamp(4, 9)
        };
        let (lit_shift, len_sym_bits, off_sym_bits) = match prob {
            MatchProbability::Few => (0, 12, 8),
            MatchProbability::Neutral => (1, 10, 7),
            MatchProbability::Many => (2, 8, 6),
        };
        let lit_bits = (diversity_bits + lit_shift).min(12);
        self.literal.fill(lit_bits * BIT_COST);
        for len in MIN_MATCH_LEN..=MAX_MATCH_LEN {
            let slot = LENGTH_SLOT[len] as usize;
            self.length[len] = (len_sym_bits + u32::from(LENGTH_EXTRA_BITS[slot])) * BIT_COST;
        }
        for slot in 0..NUM_OFFSET_SLOTS {
            self.offset_slot[slot] =
                (off_sym_bits + u32::from(OFFSET_EXTRA_BITS[slot])) * BIT_COST;
        }
    }

    /// Seed costs for a later block: average the previous block's final
    /// costs with the defaults for the new block's shape.
    fn blend_defaults(&mut self, num_used_literals: usize, prob: MatchProbability) {
        let mut defaults = CostModel::new();
        defaults.set_defaults(num_used_literals, prob);
        for (c, d) in self.literal.iter_mut().zip(defaults.literal.iter()) {
            *c = (*c + *d) / 2;
        }
        for (c, d) in self.length.iter_mut().zip(defaults.length.iter()) {
            *c = (*c + *d) / 2;
        }
        for (c, d) in self.offset_slot.iter_mut().zip(defaults.offset_slot.iter()) {
            *c = (*c + *d) / 2;
        }
    }

    /// Derive costs from actual codeword lengths after a pass.  Unused
    /// symbols keep a finite cost so they stay candidates next pass.
    fn set_from_codes(&mut self, codes: &HuffmanCodes) {
        for lit in 0..256 {
            let bits = match codes.litlen_lens[lit] {
                0 => 13,
                l => u32::from(l),
            };
            self.literal[lit] = bits * BIT_COST;
        }
        for len in MIN_MATCH_LEN..=MAX_MATCH_LEN {
            let slot = LENGTH_SLOT[len] as usize;
            let sym_bits = match codes.litlen_lens[257 + slot] {
                0 => 12,
                l => u32::from(l),
            };
            self.length[len] = (sym_bits + u32::from(LENGTH_EXTRA_BITS[slot])) * BIT_COST;
        }
        for slot in 0..NUM_OFFSET_SLOTS {
            let sym_bits = match codes.offset_lens[slot] {
                0 => 8,
                l => u32::from(l),
            };
            self.offset_slot[slot] = (sym_bits + u32::from(OFFSET_EXTRA_BITS[slot])) * BIT_COST;
        }
    }
}

#[inline(always)]
fn maybe_rebase(mf: &mut BtMatchfinder, base: &mut usize, pos: usize) {
    if pos - *base >= WINDOW_SIZE {
        mf.rebase();
        *base += WINDOW_SIZE;
    }
}

#[allow(clippy::too_many_arguments)]
pub fn compress(
    mf: &mut BtMatchfinder,
    cfg: &OptimalConfig,
    input: &[u8],
    w: &mut BitWriter,
    cache: &mut Vec<Match>,
    nodes: &mut Vec<OptimumNode>,
    costs: &mut CostModel,
    freqs: &mut FreqCounters,
    codes: &mut HuffmanCodes,
    static_codes: &HuffmanCodes,
    precode: &mut PrecodeState,
    splitter: &mut BlockSplitStats,
) {
    mf.reset();
    cache.clear();
    splitter.init_block();

    let in_end = input.len();
    if in_end == 0 {
        nodes.clear();
        nodes.push(OptimumNode::default());
        freqs.reset();
        freqs.tally_end_of_block();
        flush_block(w, input, true, freqs, codes, static_codes, precode, BlockContent::Items(nodes));
        return;
    }

    let mut base = 0usize;
    let mut block_begin = 0usize;
    let mut scan_pos = 0usize;
    let mut checkpoint: Option<(usize, usize)> = None; // (position, cache length)
    let mut first_block = true;

    loop {
        // ── Matchfinding: scan one position (or one nice-length match).
        let remaining = in_end - scan_pos;
        if remaining >= MIN_SEARCH_REMAINING {
            maybe_rebase(mf, &mut base, scan_pos);
            let max_len = MAX_MATCH_LEN.min(remaining);
            let before = cache.len();
            let best_len = mf.advance_one_byte(
                input,
                base,
                scan_pos,
                max_len,
                cfg.nice_match_len,
                cfg.max_search_depth,
                &mut |m| cache.push(m),
            );
            let count = (cache.len() - before) as u16;
            cache.push(Match { length: count, offset: u16::from(input[scan_pos]) });

            if best_len >= MIN_MATCH_LEN && best_len >= cfg.nice_match_len.min(max_len) {
                // Too good to bother optimising around: skip through it,
                // caching an empty sentinel per covered position.
                splitter.observe_match(best_len);
                for p in scan_pos + 1..scan_pos + best_len {
                    if in_end - p >= MIN_SEARCH_REMAINING {
                        maybe_rebase(mf, &mut base, p);
                        mf.skip_position(input, base, p, cfg.nice_match_len, cfg.max_search_depth);
                    }
                    cache.push(Match { length: 0, offset: u16::from(input[p]) });
                }
                scan_pos += best_len;
            } else {
                splitter.observe_literal(input[scan_pos]);
                scan_pos += 1;
            }
        } else {
            cache.push(Match { length: 0, offset: u16::from(input[scan_pos]) });
            splitter.observe_literal(input[scan_pos]);
            scan_pos += 1;
        }

        // ── Block-split check.
        if splitter.ready_to_check()
            && scan_pos - block_begin >= MIN_BLOCK_LENGTH
            && in_end - scan_pos >= MIN_BLOCK_LENGTH
        {
            if splitter.should_end_block(scan_pos - block_begin) {
                // Rewind to the last approved checkpoint; entries past
                // it carry over as the head of the next block's cache.
                let (cut_pos, cut_cache_len) = checkpoint.unwrap_or((scan_pos, cache.len()));
                optimize_and_flush(
                    input,
                    block_begin,
                    cut_pos,
                    &cache[..cut_cache_len],
                    false,
                    cfg.num_optim_passes,
                    first_block,
                    costs,
                    nodes,
                    freqs,
                    codes,
                    static_codes,
                    precode,
                    w,
                );
                cache.drain(..cut_cache_len);
                block_begin = cut_pos;
                checkpoint = None;
                first_block = false;
                splitter.begin_block_after_split();
                continue;
            }
            checkpoint = Some((scan_pos, cache.len()));
        }

        // ── Hard block boundaries.
        let cache_nearly_full = cache.len() + MAX_CACHE_PER_POS > MATCH_CACHE_LENGTH;
        if scan_pos >= block_begin + SOFT_MAX_BLOCK_LENGTH
            || cache_nearly_full
            || scan_pos == in_end
        {
            let is_final = scan_pos == in_end;
            optimize_and_flush(
                input,
                block_begin,
                scan_pos,
                cache,
                is_final,
                cfg.num_optim_passes,
                first_block,
                costs,
                nodes,
                freqs,
                codes,
                static_codes,
                precode,
                w,
            );
            if is_final {
                return;
            }
            cache.clear();
            block_begin = scan_pos;
            checkpoint = None;
            first_block = false;
            splitter.init_block();
        }
    }
}

/// Run the optimisation passes over one block and emit it.
#[allow(clippy::too_many_arguments)]
fn optimize_and_flush(
    input: &[u8],
    block_begin: usize,
    block_end: usize,
    cache: &[Match],
    is_final: bool,
    num_passes: u32,
    first_block: bool,
    costs: &mut CostModel,
    nodes: &mut Vec<OptimumNode>,
    freqs: &mut FreqCounters,
    codes: &mut HuffmanCodes,
    static_codes: &HuffmanCodes,
    precode: &mut PrecodeState,
    w: &mut BitWriter,
) {
    let block = &input[block_begin..block_end];
    let block_len = block.len();
    debug_assert!(block_len <= MAX_BLOCK_LENGTH);

    nodes.clear();
    nodes.resize(block_len + 1, OptimumNode::default());

    // Shape statistics for the starting cost table: literal diversity
    // and the share of positions that found matches.
    let mut used = [false; 256];
    for &b in block {
        used[b as usize] = true;
    }
    let num_used_literals = used.iter().filter(|&&u| u).count();

    let mut match_positions = 0usize;
    let mut idx = cache.len();
    for _ in 0..block_len {
        let sent = cache[idx - 1];
        idx -= 1 + sent.length as usize;
        match_positions += usize::from(sent.length > 0);
    }
    debug_assert_eq!(idx, 0);

    let prob = if match_positions * 8 < block_len {
        MatchProbability::Few
    } else if match_positions * 2 > block_len {
        MatchProbability::Many
    } else {
        MatchProbability::Neutral
    };

    if first_block {
        costs.set_defaults(num_used_literals, prob);
    } else {
        costs.blend_defaults(num_used_literals, prob);
    }

    for pass in 0..num_passes {
        run_shortest_path(block_len, cache, costs, nodes);
        tally_path(block_len, nodes, freqs);
        codes.build_from_freqs(freqs);
        if pass + 1 < num_passes {
            costs.set_from_codes(codes);
        }
    }

    flush_block(w, block, is_final, freqs, codes, static_codes, precode, BlockContent::Items(nodes));
}

/// Backward minimum-cost path over the cached matches.  Among the
/// matches at a position, each length is priced with the first (and so
/// smallest) offset that reaches it.
fn run_shortest_path(block_len: usize, cache: &[Match], costs: &CostModel, nodes: &mut [OptimumNode]) {
    nodes[block_len].cost_to_end = 0;

    let mut cache_idx = cache.len();
    for i in (0..block_len).rev() {
        let sent = cache[cache_idx - 1];
        let count = sent.length as usize;
        cache_idx -= 1 + count;
        let literal = u32::from(sent.offset) & 0xFF;

        let mut best_cost = costs.literal[literal as usize] + nodes[i + 1].cost_to_end;
        let mut best_item = (literal << OPTIMUM_OFFSET_SHIFT) | 1;

        if count > 0 {
            let usable = block_len - i;
            let mut len = MIN_MATCH_LEN;
            for m in &cache[cache_idx..cache_idx + count] {
                let offset = m.offset as usize;
                let offset_cost = costs.offset_slot[offset_slot(offset)];
                let match_limit = (m.length as usize).min(usable);
                while len <= match_limit {
                    let cost = offset_cost + costs.length[len] + nodes[i + len].cost_to_end;
                    if cost < best_cost {
                        best_cost = cost;
                        best_item = ((offset as u32) << OPTIMUM_OFFSET_SHIFT) | len as u32;
                    }
                    len += 1;
                }
            }
        }

        nodes[i].cost_to_end = best_cost;
        nodes[i].item = best_item;
    }
}

/// Count the symbol frequencies along the chosen path.
fn tally_path(block_len: usize, nodes: &[OptimumNode], freqs: &mut FreqCounters) {
    freqs.reset();
    let mut i = 0;
    while i < block_len {
        let (value, length) = nodes[i].decode_item();
        if length == 1 {
            freqs.tally_literal(value as u8);
        } else {
            freqs.tally_match(LENGTH_SLOT[length], offset_slot(value) as u8);
        }
        i += length;
    }
    freqs.tally_end_of_block();
}
