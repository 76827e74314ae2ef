//! Greedy and lazy parsing over the hash-chain matchfinder.
//!
//! Greedy takes the longest acceptable match at every position.  Lazy
//! holds a match back and probes the next position (at half the search
//! depth, to keep the effort on the first match); if the later match
//! wins by enough estimated bits, the held match decays to a literal.
//! Lazy-2 additionally probes two positions ahead at a quarter depth.

use crate::bitio::BitWriter;
use crate::constants::{MAX_MATCH_LEN, MIN_MATCH_LEN, WINDOW_SIZE};
use crate::matchfinder::{HcMatchfinder, Match};

use super::output::{flush_block, BlockContent, PrecodeState};
use super::seq::{FreqCounters, HuffmanCodes, Sequence, SEQ_STORE_LENGTH};
use super::splitter::{BlockSplitStats, MIN_BLOCK_LENGTH};
use super::{calculate_min_match_len, MIN_SEARCH_REMAINING, SOFT_MAX_BLOCK_LENGTH};

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Greedy,
    Lazy,
    Lazy2,
}

pub struct ParseConfig {
    pub mode: ParseMode,
    pub max_search_depth: u32,
    pub nice_match_len: usize,
}

/// Tracks everything a block accumulates while parsing.
struct BlockAcc<'a> {
    seqs: &'a mut Vec<Sequence>,
    freqs: &'a mut FreqCounters,
    splitter: &'a mut BlockSplitStats,
    litrunlen: u32,
}

impl BlockAcc<'_> {
    #[inline(always)]
    fn literal(&mut self, byte: u8) {
        self.freqs.tally_literal(byte);
        self.splitter.observe_literal(byte);
        self.litrunlen += 1;
    }

    #[inline(always)]
    fn match_(&mut self, m: Match) {
        let seq = Sequence::match_seq(self.litrunlen, m.length as usize, m.offset as usize);
        self.freqs.tally_match(seq.length_slot, seq.offset_slot);
        self.splitter.observe_match(m.length as usize);
        self.seqs.push(seq);
        self.litrunlen = 0;
    }
}

#[inline(always)]
fn maybe_rebase(mf: &mut HcMatchfinder, base: &mut usize, pos: usize) {
    if pos - *base >= WINDOW_SIZE {
        mf.rebase();
        *base += WINDOW_SIZE;
    }
}

/// Insert every position in `[mf_next, target)` without searching.
#[inline]
fn skip_to(
    mf: &mut HcMatchfinder,
    input: &[u8],
    base: &mut usize,
    mf_next: &mut usize,
    target: usize,
) {
    while *mf_next < target {
        maybe_rebase(mf, base, *mf_next);
        mf.advance(input, *base, *mf_next);
        *mf_next += 1;
    }
}

/// A match worth emitting at all: at least the block's minimum length,
/// or a minimum-length match that is close enough to be cheap.
#[inline(always)]
fn acceptable(m: Match, min_len: usize) -> bool {
    m.length as usize >= min_len || (m.length == 3 && m.offset <= 4096)
}

/// Estimated-bits advantage of match `b` over match `a`.
#[inline(always)]
fn advantage(a: Match, b: Match) -> i32 {
    4 * (i32::from(b.length) - i32::from(a.length))
        + (u32::from(a.offset).ilog2() as i32 - u32::from(b.offset).ilog2() as i32)
}

#[allow(clippy::too_many_arguments)]
pub fn compress(
    mf: &mut HcMatchfinder,
    cfg: &ParseConfig,
    input: &[u8],
    w: &mut BitWriter,
    seqs: &mut Vec<Sequence>,
    freqs: &mut FreqCounters,
    codes: &mut HuffmanCodes,
    static_codes: &HuffmanCodes,
    precode: &mut PrecodeState,
    splitter: &mut BlockSplitStats,
) {
    mf.reset();
    let in_end = input.len();
    let mut base = 0usize;
    let mut pos = 0usize;
    let mut mf_next = 0usize;

    loop {
        let block_begin = pos;
        let block_max_end = in_end.min(block_begin + SOFT_MAX_BLOCK_LENGTH);
        freqs.reset();
        splitter.init_block();
        seqs.clear();

        let min_len =
            calculate_min_match_len(&input[block_begin..block_max_end], cfg.max_search_depth);

        let mut acc = BlockAcc {
            seqs: &mut *seqs,
            freqs: &mut *freqs,
            splitter: &mut *splitter,
            litrunlen: 0,
        };

        while pos < block_max_end && acc.seqs.len() < SEQ_STORE_LENGTH {
            match cfg.mode {
                ParseMode::Greedy => {
                    parse_greedy(mf, cfg, input, &mut base, &mut pos, &mut mf_next, min_len, &mut acc)
                }
                ParseMode::Lazy | ParseMode::Lazy2 => {
                    parse_lazy(mf, cfg, input, &mut base, &mut pos, &mut mf_next, min_len, &mut acc)
                }
            }

            if acc.splitter.ready_to_check()
                && pos - block_begin >= MIN_BLOCK_LENGTH
                && in_end - pos >= MIN_BLOCK_LENGTH
                && acc.splitter.should_end_block(pos - block_begin)
            {
                break;
            }
        }

        let litrunlen = acc.litrunlen;
        seqs.push(Sequence::terminator(litrunlen));
        freqs.tally_end_of_block();

        let is_final = pos == in_end;
        flush_block(
            w,
            &input[block_begin..pos],
            is_final,
            freqs,
            codes,
            static_codes,
            precode,
            BlockContent::Sequences(seqs),
        );
        if is_final {
            return;
        }
    }
}

/// One greedy decision: longest match or literal, then advance.
#[allow(clippy::too_many_arguments)]
fn parse_greedy(
    mf: &mut HcMatchfinder,
    cfg: &ParseConfig,
    input: &[u8],
    base: &mut usize,
    pos: &mut usize,
    mf_next: &mut usize,
    min_len: usize,
    acc: &mut BlockAcc,
) {
    let in_end = input.len();
    let remaining = in_end - *pos;

    if remaining >= MIN_SEARCH_REMAINING {
        maybe_rebase(mf, base, *pos);
        let max_len = MAX_MATCH_LEN.min(remaining);
        let found = mf.longest_match(
            input,
            *base,
            *pos,
            max_len,
            cfg.nice_match_len,
            cfg.max_search_depth,
            MIN_MATCH_LEN - 1,
        );
        *mf_next = *pos + 1;

        if let Some(m) = found {
            if acceptable(m, min_len) {
                acc.match_(m);
                let target = *pos + m.length as usize;
                skip_to(mf, input, base, mf_next, target);
                *pos = target;
                return;
            }
        }
    }

    acc.literal(input[*pos]);
    *pos += 1;
}

/// One lazy decision: may emit a few deferred literals before a match.
#[allow(clippy::too_many_arguments)]
fn parse_lazy(
    mf: &mut HcMatchfinder,
    cfg: &ParseConfig,
    input: &[u8],
    base: &mut usize,
    pos: &mut usize,
    mf_next: &mut usize,
    min_len: usize,
    acc: &mut BlockAcc,
) {
    let in_end = input.len();
    let remaining = in_end - *pos;

    if remaining < MIN_SEARCH_REMAINING {
        acc.literal(input[*pos]);
        *pos += 1;
        return;
    }

    maybe_rebase(mf, base, *pos);
    let max_len = MAX_MATCH_LEN.min(remaining);
    let found = mf.longest_match(
        input,
        *base,
        *pos,
        max_len,
        cfg.nice_match_len,
        cfg.max_search_depth,
        MIN_MATCH_LEN - 1,
    );
    *mf_next = *pos + 1;

    let mut cur = match found {
        Some(m) if acceptable(m, min_len) => m,
        _ => {
            acc.literal(input[*pos]);
            *pos += 1;
            return;
        }
    };

    // A minimum-length match at a distant offset costs more than the
    // three literals it replaces often enough to refuse outright.
    if cur.length as usize == MIN_MATCH_LEN && cur.offset > 8192 {
        acc.literal(input[*pos]);
        *pos += 1;
        return;
    }

    loop {
        let nice = cfg.nice_match_len.min(in_end - *pos);
        if cur.length as usize >= nice {
            break;
        }

        // Probe the next position at half depth; only matches that beat
        // `cur` outright are returned.
        let next_pos = *pos + 1;
        if in_end - next_pos >= MIN_SEARCH_REMAINING {
            maybe_rebase(mf, base, next_pos);
            let max1 = MAX_MATCH_LEN.min(in_end - next_pos);
            let probe = mf.longest_match(
                input,
                *base,
                next_pos,
                max1,
                cfg.nice_match_len,
                cfg.max_search_depth / 2,
                cur.length as usize,
            );
            *mf_next = next_pos + 1;
            if let Some(next) = probe {
                if advantage(cur, next) > 2 {
                    acc.literal(input[*pos]);
                    *pos = next_pos;
                    cur = next;
                    continue;
                }
            }
        }

        if cfg.mode == ParseMode::Lazy2 {
            let two_pos = *pos + 2;
            if in_end > two_pos && in_end - two_pos >= MIN_SEARCH_REMAINING {
                maybe_rebase(mf, base, two_pos);
                let max2 = MAX_MATCH_LEN.min(in_end - two_pos);
                let probe = mf.longest_match(
                    input,
                    *base,
                    two_pos,
                    max2,
                    cfg.nice_match_len,
                    cfg.max_search_depth / 4,
                    cur.length as usize,
                );
                *mf_next = two_pos + 1;
                if let Some(next) = probe {
                    if advantage(cur, next) > 6 {
                        acc.literal(input[*pos]);
                        acc.literal(input[*pos + 1]);
                        *pos = two_pos;
                        cur = next;
                        continue;
                    }
                }
            }
        }
        break;
    }

    acc.match_(cur);
    let target = *pos + cur.length as usize;
    skip_to(mf, input, base, mf_next, target);
    *pos = target;
}
