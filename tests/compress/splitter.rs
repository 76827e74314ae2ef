// Integration tests for the block splitter:
//   - No verdict before a full observation batch
//   - Homogeneous data never splits
//   - A hard distribution change splits
//   - A pending batch can seed the next block's statistics

use deflate::compress::splitter::{BlockSplitStats, NUM_OBSERVATIONS_PER_BLOCK_CHECK};

fn observe_literals(stats: &mut BlockSplitStats, byte: u8, n: u32) {
    for _ in 0..n {
        stats.observe_literal(byte);
    }
}

fn observe_matches(stats: &mut BlockSplitStats, length: usize, n: u32) {
    for _ in 0..n {
        stats.observe_match(length);
    }
}

#[test]
fn not_ready_before_batch_completes() {
    let mut stats = BlockSplitStats::new();
    stats.init_block();
    observe_literals(&mut stats, b'a', NUM_OBSERVATIONS_PER_BLOCK_CHECK - 1);
    assert!(!stats.ready_to_check());
    stats.observe_literal(b'a');
    assert!(stats.ready_to_check());
}

#[test]
fn homogeneous_data_never_splits() {
    let mut stats = BlockSplitStats::new();
    stats.init_block();
    for batch in 0..40 {
        observe_literals(&mut stats, b'e', NUM_OBSERVATIONS_PER_BLOCK_CHECK / 2);
        observe_literals(&mut stats, b'Q', NUM_OBSERVATIONS_PER_BLOCK_CHECK / 4);
        observe_matches(&mut stats, 20, NUM_OBSERVATIONS_PER_BLOCK_CHECK / 4);
        assert!(stats.ready_to_check());
        let block_len = 12_000 + batch * 512;
        assert!(!stats.should_end_block(block_len), "split on homogeneous batch {batch}");
    }
}

#[test]
fn distribution_flip_splits() {
    let mut stats = BlockSplitStats::new();
    stats.init_block();
    // Establish a literal-heavy history.
    for _ in 0..8 {
        observe_literals(&mut stats, b'a', NUM_OBSERVATIONS_PER_BLOCK_CHECK);
        assert!(!stats.should_end_block(20_000));
    }
    // Then a match-heavy region arrives.
    observe_matches(&mut stats, 100, NUM_OBSERVATIONS_PER_BLOCK_CHECK);
    assert!(stats.should_end_block(24_000), "flip must end the block");
}

#[test]
fn long_blocks_split_more_eagerly() {
    // The same mild drift that a short block tolerates ends a very long
    // block, because the length term grows.
    let make_drift = |stats: &mut BlockSplitStats| {
        for _ in 0..4 {
            observe_literals(stats, b'a', NUM_OBSERVATIONS_PER_BLOCK_CHECK);
            assert!(!stats.should_end_block(15_000));
        }
        observe_literals(stats, b'a', (NUM_OBSERVATIONS_PER_BLOCK_CHECK * 7) / 8);
        observe_matches(stats, 4, NUM_OBSERVATIONS_PER_BLOCK_CHECK / 8);
    };

    let mut short = BlockSplitStats::new();
    short.init_block();
    make_drift(&mut short);
    let short_verdict = short.should_end_block(15_000);

    let mut long = BlockSplitStats::new();
    long.init_block();
    make_drift(&mut long);
    let long_verdict = long.should_end_block(2_000_000);

    assert!(long_verdict, "the length term must force a split eventually");
    assert!(!short_verdict, "mild drift should not split a short block");
}

#[test]
fn carrying_a_batch_into_the_next_block() {
    let mut stats = BlockSplitStats::new();
    stats.init_block();
    for _ in 0..4 {
        observe_literals(&mut stats, b'a', NUM_OBSERVATIONS_PER_BLOCK_CHECK);
        assert!(!stats.should_end_block(20_000));
    }
    observe_matches(&mut stats, 100, NUM_OBSERVATIONS_PER_BLOCK_CHECK);
    assert!(stats.should_end_block(20_000));

    // The match-heavy batch becomes the new block's baseline, so more
    // match-heavy data looks homogeneous now.
    stats.begin_block_after_split();
    observe_matches(&mut stats, 100, NUM_OBSERVATIONS_PER_BLOCK_CHECK);
    assert!(!stats.should_end_block(11_000));
}
