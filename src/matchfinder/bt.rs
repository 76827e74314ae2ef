//! Binary-tree matchfinder (levels 10..=12).
//!
//! Each 3-byte-hash bucket holds the root of a binary search tree keyed
//! lexicographically on the bytes starting at each node's position.
//! Visiting a position re-roots its bucket at that position and splices
//! the visited nodes into the new tree via two pending child slots.
//! Children are strictly older than their parents, so the structure is
//! acyclic by construction.

use crate::constants::{MAX_MATCH_LEN, MIN_MATCH_LEN, WINDOW_SIZE};

use super::{
    hash3, init_positions, lz_extend, position_slot, rebase_positions, Match, MATCHFINDER_INITVAL,
};

const BT_HASH_ORDER: u32 = 16;

pub struct BtMatchfinder {
    hash_tab: Box<[i16]>,
    /// Two entries per window slot: left child, right child.
    child_tab: Box<[i16]>,
}

impl BtMatchfinder {
    pub fn new() -> BtMatchfinder {
        BtMatchfinder {
            hash_tab: vec![MATCHFINDER_INITVAL; 1 << BT_HASH_ORDER].into_boxed_slice(),
            child_tab: vec![MATCHFINDER_INITVAL; 2 * WINDOW_SIZE].into_boxed_slice(),
        }
    }

    pub fn reset(&mut self) {
        init_positions(&mut self.hash_tab);
        init_positions(&mut self.child_tab);
    }

    pub fn rebase(&mut self) {
        rebase_positions(&mut self.hash_tab);
        rebase_positions(&mut self.child_tab);
    }

    /// Insert `pos` as the new root of its bucket, restructure the tree,
    /// and report each strictly-longer match encountered (in increasing
    /// length order) through `record`.  Returns the best length found.
    ///
    /// The descent resumes each comparison at the shorter of the best
    /// lengths seen on the two sides, since that prefix is already known
    /// to be common.
    pub fn advance_one_byte<F: FnMut(Match)>(
        &mut self,
        input: &[u8],
        base: usize,
        pos: usize,
        max_len: usize,
        nice_len: usize,
        max_depth: u32,
        record: &mut F,
    ) -> usize {
        debug_assert!(pos + MIN_MATCH_LEN <= input.len());
        debug_assert!(max_len <= MAX_MATCH_LEN && pos + max_len <= input.len());

        let cur_pos = (pos - base) as i32;
        let cutoff = cur_pos - WINDOW_SIZE as i32;
        let nice_len = nice_len.min(max_len);

        let hash = hash3(input, pos, BT_HASH_ORDER);
        let mut node = i32::from(self.hash_tab[hash]);
        self.hash_tab[hash] = cur_pos as i16;

        let cur_slot = position_slot(cur_pos);
        let mut pending_lt = 2 * cur_slot;
        let mut pending_gt = 2 * cur_slot + 1;
        let mut best_lt_len = 0usize;
        let mut best_gt_len = 0usize;
        let mut best_len = MIN_MATCH_LEN - 1;
        let mut depth = max_depth;

        loop {
            if node <= cutoff || depth == 0 {
                self.child_tab[pending_lt] = MATCHFINDER_INITVAL;
                self.child_tab[pending_gt] = MATCHFINDER_INITVAL;
                break;
            }
            depth -= 1;

            let node_abs = (base as i64 + i64::from(node)) as usize;
            let len = lz_extend(input, pos, node_abs, best_lt_len.min(best_gt_len), max_len);

            if len > best_len {
                best_len = len;
                record(Match { length: len as u16, offset: (pos - node_abs) as u16 });
            }
            if len >= nice_len || len == max_len {
                // Good enough (or indistinguishable): adopt the node's
                // subtrees wholesale and stop.
                let node_slot = position_slot(node);
                self.child_tab[pending_lt] = self.child_tab[2 * node_slot];
                self.child_tab[pending_gt] = self.child_tab[2 * node_slot + 1];
                break;
            }

            let node_slot = position_slot(node);
            if input[node_abs + len] < input[pos + len] {
                // Node's string sorts below the current one: it becomes
                // the pending less-than child, and the search continues
                // among the nodes above it.
                self.child_tab[pending_lt] = node as i16;
                pending_lt = 2 * node_slot + 1;
                node = i32::from(self.child_tab[pending_lt]);
                best_lt_len = len;
            } else {
                self.child_tab[pending_gt] = node as i16;
                pending_gt = 2 * node_slot;
                node = i32::from(self.child_tab[pending_gt]);
                best_gt_len = len;
            }
        }
        best_len
    }

    /// Insert `pos` and restructure without reporting matches.
    pub fn skip_position(&mut self, input: &[u8], base: usize, pos: usize, nice_len: usize, max_depth: u32) {
        if pos + MIN_MATCH_LEN + 2 > input.len() {
            return;
        }
        let max_len = MAX_MATCH_LEN.min(input.len() - pos);
        self.advance_one_byte(input, base, pos, max_len, nice_len, max_depth, &mut |_| {});
    }
}
