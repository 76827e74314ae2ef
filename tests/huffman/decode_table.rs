// Integration tests for decode-table construction:
//   - Over-subscribed length sets are rejected
//   - Incomplete length sets are rejected, except the empty code and
//     the single-codeword-of-length-1 code
//   - Subtables resolve codewords longer than the table order
//   - Unused codespace of the permitted incomplete codes still decodes

use deflate::constants::MAX_NUM_SYMS;
use deflate::huffman::decode_table::{
    build_decode_table, HUFFDEC_RESULT_SHIFT, HUFFDEC_SUBTABLE_POINTER,
};

const TABLE_BITS: usize = 7;

fn identity_results(n: usize) -> Vec<u32> {
    (0..n as u32).map(|s| s << HUFFDEC_RESULT_SHIFT).collect()
}

fn try_build(lens: &[u8], max_len: usize) -> Option<Vec<u32>> {
    let mut table = vec![0u32; 4096];
    let mut sorted = [0u16; MAX_NUM_SYMS];
    let results = identity_results(lens.len());
    build_decode_table(&mut table, lens, lens.len(), &results, TABLE_BITS, max_len, &mut sorted)
        .then_some(table)
}

#[test]
fn complete_code_is_accepted() {
    // 2, 2, 2, 3, 3: kraft = 3/4 + 1/4 = 1.
    assert!(try_build(&[2, 2, 2, 3, 3], 15).is_some());
}

#[test]
fn oversubscribed_code_is_rejected() {
    assert!(try_build(&[1, 1, 1], 15).is_none());
    assert!(try_build(&[1, 2, 2, 2], 15).is_none());
    assert!(try_build(&[2, 2, 2, 2, 2], 15).is_none());
}

#[test]
fn incomplete_code_is_rejected() {
    assert!(try_build(&[2, 2, 2], 15).is_none()); // kraft 3/4
    assert!(try_build(&[0, 2, 0, 0], 15).is_none()); // one len-2 codeword
    assert!(try_build(&[1, 3, 0, 0], 15).is_none());
}

#[test]
fn empty_code_is_accepted_and_fully_initialised() {
    let table = try_build(&[0, 0, 0, 0], 15).expect("empty code");
    for &entry in &table[..1 << TABLE_BITS] {
        assert_eq!(entry >> HUFFDEC_RESULT_SHIFT, 0);
        assert_eq!(entry & HUFFDEC_SUBTABLE_POINTER, 0);
    }
}

#[test]
fn single_length_one_codeword_is_accepted() {
    let table = try_build(&[0, 0, 1, 0], 15).expect("one-symbol code");
    // Both the 0 and 1 codes land on the used symbol.
    assert_eq!(table[0] >> HUFFDEC_RESULT_SHIFT, 2);
    assert_eq!(table[1] >> HUFFDEC_RESULT_SHIFT, 2);
}

#[test]
fn codewords_longer_than_table_bits_use_subtables() {
    // One symbol per length 1..=9 except the deepest pair; lengths above
    // TABLE_BITS force subtable entries.
    let lens = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 9];
    let table = try_build(&lens, 15).expect("valid code");
    assert!(
        table[..1 << TABLE_BITS]
            .iter()
            .any(|&e| e & HUFFDEC_SUBTABLE_POINTER != 0),
        "expected at least one subtable pointer"
    );

    // The all-ones 7-bit prefix leads to the deep codewords.
    let ptr = table[(1 << TABLE_BITS) - 1];
    assert!(ptr & HUFFDEC_SUBTABLE_POINTER != 0);
    assert_eq!(ptr & 0xFF, TABLE_BITS as u32);
}

#[test]
fn main_table_entries_replicate_short_codewords() {
    // Symbol 0 has the single 1-bit codeword 0; every even index must
    // decode to it.
    let lens = [1u8, 2, 3, 3];
    let table = try_build(&lens, 15).expect("valid code");
    for i in (0..1 << TABLE_BITS).step_by(2) {
        assert_eq!(table[i] >> HUFFDEC_RESULT_SHIFT, 0, "index {i}");
        assert_eq!(table[i] & 0xFF, 1);
    }
}
