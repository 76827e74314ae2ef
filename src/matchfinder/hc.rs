//! Hash-chain matchfinder (levels 2..=9).
//!
//! One table maps a 3-byte hash to the most recent position with that
//! hash; a second maps each position slot to the previous position on
//! the same chain.  Chains are strictly decreasing in position, so a
//! walk terminates as soon as it steps out of the window.

use crate::constants::{MAX_MATCH_LEN, MIN_MATCH_LEN, WINDOW_SIZE};

use super::{
    hash3, init_positions, lz_extend, position_slot, rebase_positions, Match, MATCHFINDER_INITVAL,
};

const HC_HASH_ORDER: u32 = 15;

pub struct HcMatchfinder {
    hash_tab: Box<[i16]>,
    next_tab: Box<[i16]>,
}

impl HcMatchfinder {
    pub fn new() -> HcMatchfinder {
        HcMatchfinder {
            hash_tab: vec![MATCHFINDER_INITVAL; 1 << HC_HASH_ORDER].into_boxed_slice(),
            next_tab: vec![MATCHFINDER_INITVAL; WINDOW_SIZE].into_boxed_slice(),
        }
    }

    pub fn reset(&mut self) {
        init_positions(&mut self.hash_tab);
        init_positions(&mut self.next_tab);
    }

    pub fn rebase(&mut self) {
        rebase_positions(&mut self.hash_tab);
        rebase_positions(&mut self.next_tab);
    }

    /// Insert `pos` and walk its chain for the longest match.
    ///
    /// `best_len` seeds the search: only strictly longer matches are
    /// reported, which lets the lazy parser skip candidates that cannot
    /// beat the match it already holds.  Stops at `nice_len`, at
    /// `max_depth` visited candidates, or at the end of the window.
    #[allow(clippy::too_many_arguments)]
    pub fn longest_match(
        &mut self,
        input: &[u8],
        base: usize,
        pos: usize,
        max_len: usize,
        nice_len: usize,
        max_depth: u32,
        mut best_len: usize,
    ) -> Option<Match> {
        debug_assert!(pos + MIN_MATCH_LEN <= input.len());
        debug_assert!(max_len <= MAX_MATCH_LEN && pos + max_len <= input.len());

        let cur_pos = (pos - base) as i32;
        debug_assert!(cur_pos < WINDOW_SIZE as i32);
        let cutoff = cur_pos - WINDOW_SIZE as i32;
        let nice_len = nice_len.min(max_len);

        let hash = hash3(input, pos, HC_HASH_ORDER);
        let mut candidate = i32::from(self.hash_tab[hash]);
        self.next_tab[position_slot(cur_pos)] = self.hash_tab[hash];
        self.hash_tab[hash] = cur_pos as i16;

        if best_len >= max_len {
            return None;
        }

        let mut best: Option<Match> = None;
        let mut depth = max_depth;

        while candidate > cutoff && depth > 0 {
            depth -= 1;
            let cand_abs = (base as i64 + i64::from(candidate)) as usize;

            // Cheap reject: the byte that would have to extend the best
            // match so far.
            if input[cand_abs + best_len] == input[pos + best_len] {
                let len = lz_extend(input, pos, cand_abs, 0, max_len);
                if len > best_len {
                    best_len = len;
                    best = Some(Match { length: len as u16, offset: (pos - cand_abs) as u16 });
                    if len >= nice_len {
                        break;
                    }
                }
            }
            candidate = i32::from(self.next_tab[position_slot(candidate)]);
        }
        best
    }

    /// Insert `pos` into its chain without searching.
    #[inline]
    pub fn advance(&mut self, input: &[u8], base: usize, pos: usize) {
        if pos + MIN_MATCH_LEN > input.len() {
            return;
        }
        let cur_pos = (pos - base) as i32;
        let hash = hash3(input, pos, HC_HASH_ORDER);
        self.next_tab[position_slot(cur_pos)] = self.hash_tab[hash];
        self.hash_tab[hash] = cur_pos as i16;
    }
}
