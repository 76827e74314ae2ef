// Integration tests for the single-slot hash-table matchfinder:
//   - Matches are genuine, at least 4 bytes, and in-window
//   - The most recent candidate wins the bucket

use deflate::constants::{MAX_MATCH_LEN, WINDOW_SIZE};
use deflate::matchfinder::{HtMatchfinder, HT_MIN_MATCH_LEN};

#[path = "../common/mod.rs"]
mod common;

#[test]
fn matches_are_genuine() {
    let data = common::sample_text(30_000);
    let mut mf = HtMatchfinder::new();
    mf.reset();
    let mut found = 0;
    for pos in 0..data.len() - 5 {
        let max_len = MAX_MATCH_LEN.min(data.len() - pos);
        if let Some(m) = mf.longest_match(&data, 0, pos, max_len) {
            let len = m.length as usize;
            let off = m.offset as usize;
            assert!(len >= HT_MIN_MATCH_LEN && len <= max_len);
            assert!(off >= 1 && off <= WINDOW_SIZE && off <= pos);
            assert_eq!(&data[pos..pos + len], &data[pos - off..pos - off + len]);
            found += 1;
        }
    }
    assert!(found > 100);
}

#[test]
fn most_recent_candidate_wins() {
    let mut data = Vec::new();
    data.extend_from_slice(b"wxyz0000");
    data.extend_from_slice(b"wxyz1111");
    data.extend_from_slice(b"wxyz2222");
    let mut mf = HtMatchfinder::new();
    mf.reset();
    for pos in 0..=8 {
        mf.advance(&data, 0, pos);
    }
    let m = mf.longest_match(&data, 0, 16, data.len() - 16).expect("match");
    // The bucket holds position 8, not position 0.
    assert_eq!(m.offset, 8);
    assert_eq!(m.length, 4);
}
