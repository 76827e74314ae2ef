//! Canonical, length-limited Huffman code construction.
//!
//! Given symbol frequencies, produces codeword lengths (zero for unused
//! symbols) and bit-reversed codewords ready for LSB-first emission.
//! The construction is the classic in-place one:
//!
//! 1. Counting-sort the used symbols by frequency (bucket clamped at
//!    `num_syms - 1`), packing `(freq << 10) | sym` so ties break on the
//!    symbol value.
//! 2. Build only the internal nodes of the Huffman tree in the same
//!    array, each entry holding its parent's index.
//! 3. Walk the nodes from the root, converting parent indices to depths
//!    and maintaining per-length leaf counts, capping any depth at the
//!    requested maximum by stealing a shallower slot.  The result is an
//!    approximate length-limited code that always satisfies Kraft
//!    equality.
//! 4. Hand lengths to the symbols in frequency order and assign canonical
//!    codewords, bit-reversed.

use crate::constants::{MAX_CODEWORD_LEN, MAX_NUM_SYMS};

const NUM_SYMBOL_BITS: u32 = 10;
const SYMBOL_MASK: u32 = (1 << NUM_SYMBOL_BITS) - 1;

/// Build a canonical Huffman code for `num_syms` symbols with codeword
/// lengths capped at `max_codeword_len`.
///
/// `lens[i]` is set to zero exactly when `freqs[i]` is zero, except in
/// the one-symbol degenerate case, which gets a second length-1 codeword
/// on symbol 0 (or 1) so the code stays decodable.
///
/// The frequencies must total less than `1 << 22` so the packed
/// `(freq << 10) | sym` entries cannot overflow; block lengths keep the
/// real counters far below that.
pub fn make_huffman_code(
    num_syms: usize,
    max_codeword_len: usize,
    freqs: &[u32],
    lens: &mut [u8],
    codewords: &mut [u32],
) {
    debug_assert!(num_syms <= MAX_NUM_SYMS);
    debug_assert!(max_codeword_len <= MAX_CODEWORD_LEN);

    let mut a = [0u32; MAX_NUM_SYMS];
    let sym_count = sort_symbols(num_syms, freqs, lens, &mut a);

    if sym_count == 0 {
        codewords[..num_syms].fill(0);
        return;
    }
    if sym_count == 1 {
        let sym = (a[0] & SYMBOL_MASK) as usize;
        let other = if sym != 0 { 0 } else { 1 };
        codewords[sym] = u32::from(sym != 0);
        lens[sym] = 1;
        codewords[other] = u32::from(other != 0);
        lens[other] = 1;
        return;
    }

    build_tree(&mut a[..sym_count]);

    let mut len_counts = [0u32; MAX_CODEWORD_LEN + 1];
    compute_length_counts(&mut a[..sym_count], &mut len_counts, max_codeword_len);

    gen_codewords(&a, lens, codewords, &len_counts, max_codeword_len, num_syms);
}

/// Compute bit-reversed canonical codewords for an externally given set
/// of codeword lengths (the static codes).
pub fn compute_codewords_from_lens(lens: &[u8], codewords: &mut [u32], max_codeword_len: usize) {
    let mut len_counts = [0u32; MAX_CODEWORD_LEN + 1];
    for &len in lens {
        len_counts[len as usize] += 1;
    }
    len_counts[0] = 0;
    let mut next_codewords = [0u32; MAX_CODEWORD_LEN + 1];
    for len in 2..=max_codeword_len {
        next_codewords[len] = (next_codewords[len - 1] + len_counts[len - 1]) << 1;
    }
    for (sym, &len) in lens.iter().enumerate() {
        if len == 0 {
            codewords[sym] = 0;
            continue;
        }
        codewords[sym] = reverse_codeword(next_codewords[len as usize], len);
        next_codewords[len as usize] += 1;
    }
}

/// Bit-reverse a codeword of the given length.
#[inline]
pub fn reverse_codeword(codeword: u32, len: u8) -> u32 {
    debug_assert!(len >= 1 && len <= 16);
    u32::from((codeword as u16).reverse_bits() >> (16 - len))
}

/// Counting-sort the used symbols by (frequency, symbol), packed as
/// `(freq << 10) | sym`.  Returns the number of used symbols; `lens` is
/// zeroed as a side effect.  Frequencies at or above the clamp share the
/// last bucket, which is ordered afterwards on the packed keys.
fn sort_symbols(num_syms: usize, freqs: &[u32], lens: &mut [u8], a: &mut [u32]) -> usize {
    let clamp = (num_syms - 1) as u32;
    let mut counters = [0u32; MAX_NUM_SYMS];

    for sym in 0..num_syms {
        counters[freqs[sym].min(clamp) as usize] += 1;
    }

    // Prefix sums over the nonzero buckets only; zero-frequency symbols
    // are excluded from the packed array.
    let mut offsets = [0u32; MAX_NUM_SYMS];
    let mut total = 0u32;
    for bucket in 1..=clamp as usize {
        offsets[bucket] = total;
        total += counters[bucket];
    }
    let sym_count = total as usize;

    for sym in 0..num_syms {
        let freq = freqs[sym];
        lens[sym] = 0;
        if freq != 0 {
            let bucket = freq.min(clamp) as usize;
            a[offsets[bucket] as usize] = (freq << NUM_SYMBOL_BITS) | sym as u32;
            offsets[bucket] += 1;
        }
    }

    let clamped_start = sym_count - counters[clamp as usize] as usize;
    a[clamped_start..sym_count].sort_unstable();

    sym_count
}

/// Build the internal nodes of the Huffman tree in place.
///
/// On entry `a` holds the packed, frequency-sorted leaves.  On exit the
/// first `len - 1` entries are internal nodes whose high bits hold their
/// parent's index (the root, at `len - 2`, has none); low bits keep the
/// symbol values untouched for the length assignment later.
fn build_tree(a: &mut [u32]) {
    let sym_count = a.len();
    let last_idx = sym_count - 1;
    let mut i = 0; // lowest-frequency unconsumed leaf
    let mut b = 0; // lowest-frequency parentless internal node

    for e in 0..last_idx {
        let mut new_freq = 0u32;
        for _ in 0..2 {
            let take_leaf =
                i <= last_idx && (b == e || (a[i] >> NUM_SYMBOL_BITS) <= (a[b] >> NUM_SYMBOL_BITS));
            if take_leaf {
                new_freq += a[i] >> NUM_SYMBOL_BITS;
                i += 1;
            } else {
                new_freq += a[b] >> NUM_SYMBOL_BITS;
                a[b] = ((e as u32) << NUM_SYMBOL_BITS) | (a[b] & SYMBOL_MASK);
                b += 1;
            }
        }
        // Both children were consumed first, so slot e is free.
        a[e] = (new_freq << NUM_SYMBOL_BITS) | (a[e] & SYMBOL_MASK);
    }
}

/// Convert parent indices to depths and produce the number of codewords
/// of each length, capping at `max_codeword_len`.
fn compute_length_counts(a: &mut [u32], len_counts: &mut [u32], max_codeword_len: usize) {
    let root = a.len() - 2;

    len_counts.fill(0);
    len_counts[1] = 2;

    a[root] &= SYMBOL_MASK; // depth 0

    for node in (0..root).rev() {
        let parent = (a[node] >> NUM_SYMBOL_BITS) as usize;
        let parent_depth = (a[parent] >> NUM_SYMBOL_BITS) as usize;
        let uncapped_depth = parent_depth + 1;
        a[node] = ((uncapped_depth as u32) << NUM_SYMBOL_BITS) | (a[node] & SYMBOL_MASK);

        // An internal node at depth d turns one leaf slot at d into two
        // at d + 1.  If d would breach the cap, steal the deepest
        // shallower slot instead; Kraft equality is preserved.
        let mut depth = uncapped_depth;
        if depth >= max_codeword_len {
            depth = max_codeword_len;
            loop {
                depth -= 1;
                if len_counts[depth] != 0 {
                    break;
                }
            }
        }
        len_counts[depth] -= 1;
        len_counts[depth + 1] += 2;
    }
}

/// Assign lengths to symbols (longest codes to rarest symbols) and
/// generate the canonical codewords, bit-reversed.
fn gen_codewords(
    a: &[u32],
    lens: &mut [u8],
    codewords: &mut [u32],
    len_counts: &[u32],
    max_codeword_len: usize,
    num_syms: usize,
) {
    let mut i = 0;
    for len in (1..=max_codeword_len).rev() {
        for _ in 0..len_counts[len] {
            lens[(a[i] & SYMBOL_MASK) as usize] = len as u8;
            i += 1;
        }
    }

    let mut next_codewords = [0u32; MAX_CODEWORD_LEN + 1];
    for len in 2..=max_codeword_len {
        next_codewords[len] = (next_codewords[len - 1] + len_counts[len - 1]) << 1;
    }

    for sym in 0..num_syms {
        let len = lens[sym];
        if len == 0 {
            codewords[sym] = 0;
            continue;
        }
        codewords[sym] = reverse_codeword(next_codewords[len as usize], len);
        next_codewords[len as usize] += 1;
    }
}
