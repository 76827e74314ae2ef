//! Hash-table matchfinder (level 1): one candidate per bucket, no chain.

use crate::constants::{MAX_MATCH_LEN, WINDOW_SIZE};

use super::{hash4, init_positions, lz_extend, rebase_positions, Match, MATCHFINDER_INITVAL};

const HT_HASH_ORDER: u32 = 15;

/// Minimum match length used by the hash-table matchfinder; it hashes 4
/// bytes, so 3-byte matches are invisible to it.
pub const HT_MIN_MATCH_LEN: usize = 4;

pub struct HtMatchfinder {
    hash_tab: Box<[i16]>,
}

impl HtMatchfinder {
    pub fn new() -> HtMatchfinder {
        HtMatchfinder { hash_tab: vec![MATCHFINDER_INITVAL; 1 << HT_HASH_ORDER].into_boxed_slice() }
    }

    pub fn reset(&mut self) {
        init_positions(&mut self.hash_tab);
    }

    pub fn rebase(&mut self) {
        rebase_positions(&mut self.hash_tab);
    }

    /// Insert `pos` and try the single stored candidate.
    pub fn longest_match(
        &mut self,
        input: &[u8],
        base: usize,
        pos: usize,
        max_len: usize,
    ) -> Option<Match> {
        debug_assert!(pos + HT_MIN_MATCH_LEN <= input.len());
        debug_assert!(max_len <= MAX_MATCH_LEN && pos + max_len <= input.len());

        let cur_pos = (pos - base) as i32;
        let cutoff = cur_pos - WINDOW_SIZE as i32;

        let hash = hash4(input, pos, HT_HASH_ORDER);
        let candidate = i32::from(self.hash_tab[hash]);
        self.hash_tab[hash] = cur_pos as i16;

        if candidate <= cutoff || max_len < HT_MIN_MATCH_LEN {
            return None;
        }
        let cand_abs = (base as i64 + i64::from(candidate)) as usize;
        if input[cand_abs..cand_abs + 4] != input[pos..pos + 4] {
            return None;
        }
        let len = lz_extend(input, pos, cand_abs, 4, max_len);
        Some(Match { length: len as u16, offset: (pos - cand_abs) as u16 })
    }

    /// Insert `pos` without searching.
    #[inline]
    pub fn advance(&mut self, input: &[u8], base: usize, pos: usize) {
        if pos + HT_MIN_MATCH_LEN > input.len() {
            return;
        }
        let hash = hash4(input, pos, HT_HASH_ORDER);
        self.hash_tab[hash] = (pos - base) as i16;
    }
}
