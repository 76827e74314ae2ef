// Integration tests for the binary-tree matchfinder:
//   - Every recorded match is genuine and in-window
//   - Matches are reported in strictly increasing length order
//   - Skipped positions keep the trees consistent

use deflate::constants::{MAX_MATCH_LEN, MIN_MATCH_LEN, WINDOW_SIZE};
use deflate::matchfinder::{BtMatchfinder, Match};

#[path = "../common/mod.rs"]
mod common;

fn scan_and_verify(input: &[u8], depth: u32, nice: usize) -> usize {
    let mut mf = BtMatchfinder::new();
    mf.reset();
    let mut base = 0usize;
    let mut total = 0usize;
    let mut matches: Vec<Match> = Vec::new();

    for pos in 0..input.len().saturating_sub(5) {
        if pos - base >= WINDOW_SIZE {
            mf.rebase();
            base += WINDOW_SIZE;
        }
        let max_len = MAX_MATCH_LEN.min(input.len() - pos);
        matches.clear();
        let best =
            mf.advance_one_byte(input, base, pos, max_len, nice, depth, &mut |m| matches.push(m));

        let mut prev_len = MIN_MATCH_LEN - 1;
        for m in &matches {
            let len = m.length as usize;
            let off = m.offset as usize;
            assert!(len > prev_len, "lengths must strictly increase at {pos}");
            prev_len = len;
            assert!(len <= max_len);
            assert!(off >= 1 && off <= WINDOW_SIZE && off <= pos);
            assert_eq!(
                &input[pos..pos + len],
                &input[pos - off..pos - off + len],
                "bogus match at {pos}: len {len} offset {off}"
            );
        }
        if let Some(last) = matches.last() {
            assert_eq!(last.length as usize, best);
        }
        total += matches.len();
    }
    total
}

#[test]
fn matches_are_genuine_on_text() {
    let data = common::sample_text(20_000);
    let total = scan_and_verify(&data, 32, 64);
    assert!(total > 200, "repetitive text should cache matches, got {total}");
}

#[test]
fn matches_are_genuine_on_random_data() {
    let data = common::random_bytes(1234, 20_000);
    scan_and_verify(&data, 32, 64);
}

#[test]
fn matches_are_genuine_on_runs() {
    // Long single-byte runs stress the equal-string path.
    let mut data = vec![0u8; 4000];
    data.extend_from_slice(&common::random_bytes(5, 500));
    data.extend(std::iter::repeat(7u8).take(4000));
    scan_and_verify(&data, 16, 32);
}

#[test]
fn skip_then_search_still_finds_matches() {
    let phrase = b"abcdefghijklmnopqrstuvwxyz012345";
    let mut data = Vec::new();
    for _ in 0..8 {
        data.extend_from_slice(phrase);
    }
    let mut mf = BtMatchfinder::new();
    mf.reset();
    // Insert the first two copies, skipping the second.
    for pos in 0..phrase.len() {
        mf.advance_one_byte(&data, 0, pos, MAX_MATCH_LEN.min(data.len() - pos), 16, 16, &mut |_| {});
    }
    for pos in phrase.len()..2 * phrase.len() {
        mf.skip_position(&data, 0, pos, 16, 16);
    }
    let pos = 2 * phrase.len();
    let mut matches = Vec::new();
    let best = mf.advance_one_byte(
        &data,
        0,
        pos,
        MAX_MATCH_LEN.min(data.len() - pos),
        258,
        32,
        &mut |m| matches.push(m),
    );
    assert!(best >= phrase.len(), "expected a long match, got {best}");
    let last = matches.last().unwrap();
    assert_eq!(last.offset as usize % phrase.len(), 0);
}
