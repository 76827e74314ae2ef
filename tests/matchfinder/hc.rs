// Integration tests for the hash-chain matchfinder:
//   - Every reported match is a real byte-for-byte match
//   - Offsets never exceed the window size
//   - Obvious repetitions are found
//   - Rebasing across window slides keeps matches valid

use deflate::constants::{MAX_MATCH_LEN, MIN_MATCH_LEN, WINDOW_SIZE};
use deflate::matchfinder::HcMatchfinder;

#[path = "../common/mod.rs"]
mod common;

/// Walk `input` position by position, verifying every reported match.
fn scan_and_verify(input: &[u8], depth: u32, nice: usize) -> usize {
    let mut mf = HcMatchfinder::new();
    mf.reset();
    let mut base = 0usize;
    let mut found = 0usize;
    for pos in 0..input.len().saturating_sub(5) {
        if pos - base >= WINDOW_SIZE {
            mf.rebase();
            base += WINDOW_SIZE;
        }
        let max_len = MAX_MATCH_LEN.min(input.len() - pos);
        if let Some(m) = mf.longest_match(input, base, pos, max_len, nice, depth, MIN_MATCH_LEN - 1)
        {
            let len = m.length as usize;
            let off = m.offset as usize;
            assert!(len >= MIN_MATCH_LEN && len <= max_len);
            assert!(off >= 1 && off <= WINDOW_SIZE, "offset {off} out of window");
            assert!(off <= pos);
            assert_eq!(
                &input[pos..pos + len],
                &input[pos - off..pos - off + len],
                "bogus match at {pos}: len {len} offset {off}"
            );
            found += 1;
        }
    }
    found
}

#[test]
fn matches_are_genuine_on_text() {
    let data = common::sample_text(20_000);
    let found = scan_and_verify(&data, 32, 64);
    assert!(found > 100, "repetitive text should produce matches, got {found}");
}

#[test]
fn matches_are_genuine_on_random_data() {
    let data = common::random_bytes(99, 20_000);
    scan_and_verify(&data, 32, 64);
}

#[test]
fn finds_immediate_repetition() {
    let mut data = Vec::new();
    data.extend_from_slice(b"abcdefghij");
    data.extend_from_slice(b"abcdefghij");
    data.extend_from_slice(b"xxxxxxxxxx");
    let mut mf = HcMatchfinder::new();
    mf.reset();
    for pos in 0..10 {
        mf.advance(&data, 0, pos);
    }
    let m = mf
        .longest_match(&data, 0, 10, MAX_MATCH_LEN.min(data.len() - 10), 258, 16, MIN_MATCH_LEN - 1)
        .expect("repetition not found");
    assert_eq!(m.offset, 10);
    assert!(m.length >= 10);
}

#[test]
fn survives_window_slides() {
    // Repetitive data spanning several windows.
    let mut data = common::sample_text(3 * WINDOW_SIZE + 1000);
    // Plant an exact far repetition near the end, within the window.
    let tail = data.len() - 100;
    let plant = tail - 20_000;
    let pattern: Vec<u8> = data[plant..plant + 40].to_vec();
    data[tail..tail + 40].copy_from_slice(&pattern);
    scan_and_verify(&data, 64, 258);
}
