//! The two cheapest strategies: stored-only (level 0) and the
//! single-probe hash-table parser (level 1).

use crate::bitio::BitWriter;
use crate::constants::{MAX_MATCH_LEN, WINDOW_SIZE};
use crate::matchfinder::{HtMatchfinder, HT_MIN_MATCH_LEN};

use super::output::{flush_block, write_stored_block, BlockContent, PrecodeState};
use super::seq::{FreqCounters, HuffmanCodes, Sequence, SEQ_STORE_LENGTH};
use super::MIN_SEARCH_REMAINING;

/// Level 1 cuts blocks at the stored-chunk size and does not run the
/// splitter.
const FAST_SOFT_MAX_BLOCK_LENGTH: usize = 65_535;

/// Level 0: the input verbatim, framed in stored blocks.
pub fn compress_stored_only(input: &[u8], w: &mut BitWriter) {
    write_stored_block(w, input, true);
}

/// Level 1: greedy over the single-slot hash-table matchfinder.
#[allow(clippy::too_many_arguments)]
pub fn compress(
    mf: &mut HtMatchfinder,
    input: &[u8],
    w: &mut BitWriter,
    seqs: &mut Vec<Sequence>,
    freqs: &mut FreqCounters,
    codes: &mut HuffmanCodes,
    static_codes: &HuffmanCodes,
    precode: &mut PrecodeState,
) {
    mf.reset();
    let in_end = input.len();
    let mut base = 0usize;
    let mut pos = 0usize;

    loop {
        let block_begin = pos;
        let block_max_end = in_end.min(block_begin + FAST_SOFT_MAX_BLOCK_LENGTH);
        freqs.reset();
        seqs.clear();
        let mut litrunlen = 0u32;

        while pos < block_max_end && seqs.len() < SEQ_STORE_LENGTH {
            let remaining = in_end - pos;
            if remaining >= MIN_SEARCH_REMAINING {
                if pos - base >= WINDOW_SIZE {
                    mf.rebase();
                    base += WINDOW_SIZE;
                }
                let max_len = MAX_MATCH_LEN.min(remaining);
                if let Some(m) = mf.longest_match(input, base, pos, max_len) {
                    debug_assert!(m.length as usize >= HT_MIN_MATCH_LEN);
                    let seq = Sequence::match_seq(litrunlen, m.length as usize, m.offset as usize);
                    freqs.tally_match(seq.length_slot, seq.offset_slot);
                    seqs.push(seq);
                    litrunlen = 0;
                    for p in pos + 1..pos + m.length as usize {
                        if p - base >= WINDOW_SIZE {
                            mf.rebase();
                            base += WINDOW_SIZE;
                        }
                        mf.advance(input, base, p);
                    }
                    pos += m.length as usize;
                    continue;
                }
            }
            freqs.tally_literal(input[pos]);
            litrunlen += 1;
            pos += 1;
        }

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
