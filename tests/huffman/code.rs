// Integration tests for canonical Huffman code construction:
//   - Lengths are zero exactly for unused symbols (bar the degenerate case)
//   - Lengths never exceed the requested cap
//   - Kraft equality holds for every non-degenerate code
//   - Codewords, being bit-reversed canonical, decode back through a
//     table built from the same lengths

use deflate::constants::MAX_NUM_SYMS;
use deflate::huffman::code::{compute_codewords_from_lens, make_huffman_code, reverse_codeword};
use deflate::huffman::decode_table::{build_decode_table, HUFFDEC_RESULT_SHIFT};

#[path = "../common/mod.rs"]
mod common;

fn kraft_sum_2_15(lens: &[u8]) -> u64 {
    lens.iter().filter(|&&l| l != 0).map(|&l| 1u64 << (15 - u32::from(l))).sum()
}

/// Pseudorandom frequency sets keyed off the shared byte generator.
fn frequency_set(seed: u64, num_syms: usize, spread: u32) -> Vec<u32> {
    common::random_bytes(seed, num_syms * 4)
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]) % spread)
        .collect()
}

#[test]
fn lens_zero_iff_freq_zero() {
    let freqs = frequency_set(7, 64, 50);
    let mut lens = [0u8; 64];
    let mut cw = [0u32; 64];
    make_huffman_code(64, 15, &freqs, &mut lens, &mut cw);
    let used = freqs.iter().filter(|&&f| f != 0).count();
    if used >= 2 {
        for (sym, (&f, &l)) in freqs.iter().zip(lens.iter()).enumerate() {
            assert_eq!(f == 0, l == 0, "symbol {sym}");
        }
    }
}

#[test]
fn length_cap_is_respected() {
    for max_len in [7usize, 9, 14, 15] {
        for seed in 0..20u64 {
            let freqs = frequency_set(seed, 288, 1 << 12);
            let mut lens = [0u8; 288];
            let mut cw = [0u32; 288];
            make_huffman_code(288, max_len, &freqs, &mut lens, &mut cw);
            assert!(
                lens.iter().all(|&l| usize::from(l) <= max_len),
                "cap {max_len} exceeded (seed {seed})"
            );
            assert_eq!(kraft_sum_2_15(&lens), 1 << 15, "Kraft (seed {seed})");
        }
    }
}

#[test]
fn highly_skewed_frequencies_stay_length_limited() {
    let mut freqs = [0u32; 30];
    let mut f = 1u32;
    for slot in freqs.iter_mut() {
        *slot = f;
        f = f.saturating_mul(3).min(1 << 15);
    }
    let mut lens = [0u8; 30];
    let mut cw = [0u32; 30];
    make_huffman_code(30, 15, &freqs, &mut lens, &mut cw);
    assert!(lens.iter().all(|&l| (1..=15).contains(&l)));
    assert_eq!(kraft_sum_2_15(&lens), 1 << 15);
}

/// Decode one bit-reversed codeword through a freshly built table.
fn decode_one(table: &[u32], codeword: u32, table_bits: usize) -> (u32, u32) {
    let entry = table[(codeword as usize) & ((1 << table_bits) - 1)];
    if entry & deflate::huffman::decode_table::HUFFDEC_SUBTABLE_POINTER != 0 {
        let sub_bits = (entry >> 8) & 0x3F;
        let idx = (entry >> HUFFDEC_RESULT_SHIFT) as usize
            + ((codeword as usize >> table_bits) & ((1 << sub_bits) - 1));
        let sub = table[idx];
        (sub >> HUFFDEC_RESULT_SHIFT, (sub & 0xFF) + table_bits as u32)
    } else {
        (entry >> HUFFDEC_RESULT_SHIFT, entry & 0xFF)
    }
}

#[test]
fn codewords_decode_back_to_their_symbols() {
    const NUM: usize = 120;
    const TABLE_BITS: usize = 7;
    for seed in 0..10u64 {
        let freqs = frequency_set(seed.wrapping_add(100), NUM, 200);
        let mut lens = [0u8; NUM];
        let mut cw = [0u32; NUM];
        make_huffman_code(NUM, 15, &freqs, &mut lens, &mut cw);
        if freqs.iter().filter(|&&f| f != 0).count() < 2 {
            continue;
        }

        // Identity decode results: entry result is the symbol itself.
        let results: Vec<u32> = (0..NUM as u32).map(|s| s << HUFFDEC_RESULT_SHIFT).collect();
        let mut table = vec![0u32; 4096];
        let mut sorted = [0u16; MAX_NUM_SYMS];
        let ok = build_decode_table(&mut table, &lens, NUM, &results, TABLE_BITS, 15, &mut sorted);
        assert!(ok, "lengths from the builder must form a valid code");

        for sym in 0..NUM {
            if lens[sym] == 0 {
                continue;
            }
            let (decoded, used_bits) = decode_one(&table, cw[sym], TABLE_BITS);
            assert_eq!(decoded, sym as u32, "seed {seed} symbol {sym}");
            assert_eq!(used_bits, u32::from(lens[sym]), "seed {seed} symbol {sym} length");
        }
    }
}

#[test]
fn static_codeword_generation_matches_rfc_examples() {
    // Litlen symbol 0 in the static code is the 8-bit codeword 0b00110000;
    // bit-reversed that is 0b00001100.
    let mut lens = [0u8; 288];
    deflate::constants::load_static_litlen_lens(&mut lens);
    let mut cw = [0u32; 288];
    compute_codewords_from_lens(&lens, &mut cw, 9);
    assert_eq!(cw[0], reverse_codeword(0b0011_0000, 8));
    assert_eq!(cw[256], reverse_codeword(0b000_0000, 7));
    assert_eq!(cw[255], reverse_codeword(0b1_1111_1111, 9));
    assert_eq!(cw[280], reverse_codeword(0b1100_0000, 8));
}

#[test]
fn reverse_codeword_involution() {
    for len in 1..=15u8 {
        for value in [0u32, 1, 2, (1 << len) - 1, (1 << len) >> 1] {
            let rev = reverse_codeword(value, len);
            assert!(rev < (1 << len));
            assert_eq!(reverse_codeword(rev, len), value);
        }
    }
}
