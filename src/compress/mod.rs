//! Whole-buffer DEFLATE compression.
//!
//! A [`Compressor`] is built once for a level and reused across calls;
//! each call resets the matchfinder and produces a complete DEFLATE
//! stream.  Levels map onto four strategies:
//!
//! | level | strategy |
//! |-------|----------|
//! | 0     | stored blocks only |
//! | 1     | hash-table greedy, 4-byte minimum matches |
//! | 2..=4 | hash-chain greedy, growing search depth |
//! | 5..=7 | hash-chain lazy |
//! | 8..=9 | hash-chain lazy with two-ahead probing |
//! | 10..=12 | binary-tree near-optimal, 2 to 4 passes |

pub mod fastest;
pub mod greedy_lazy;
pub mod near_optimal;
pub mod output;
pub mod seq;
pub mod splitter;

use crate::bitio::BitWriter;
use crate::constants::MIN_MATCH_LEN;
use crate::matchfinder::{BtMatchfinder, HcMatchfinder, HtMatchfinder, Match};

use greedy_lazy::{ParseConfig, ParseMode};
use near_optimal::{CostModel, OptimalConfig, OptimumNode, MATCH_CACHE_LENGTH, MAX_BLOCK_LENGTH};
use output::PrecodeState;
use seq::{FreqCounters, HuffmanCodes, Sequence, SEQ_STORE_LENGTH};
use splitter::{BlockSplitStats, MIN_BLOCK_LENGTH};

/// Upper bound on the length of a block chosen by cost, not format.
pub const SOFT_MAX_BLOCK_LENGTH: usize = 300_000;

/// Searching stops this close to the end of the input; the tail is
/// emitted as literals.  Keeps every matchfinder probe 4-byte safe.
pub(crate) const MIN_SEARCH_REMAINING: usize = 5;

/// Bytes the bit writer may address past the last committed byte.
pub const OUTPUT_END_PADDING: usize = 8;

/// Highest supported compression level.
pub const MAX_COMPRESSION_LEVEL: u32 = 12;

/// Worst-case compressed size for `in_len` input bytes at any level.
pub fn compress_bound(in_len: usize) -> usize {
    let max_blocks = ((in_len + MIN_BLOCK_LENGTH - 1) / MIN_BLOCK_LENGTH).max(1);
    5 * max_blocks + in_len + 1 + OUTPUT_END_PADDING
}

enum Strategy {
    Stored,
    Fastest {
        mf: Box<HtMatchfinder>,
    },
    GreedyLazy {
        mf: Box<HcMatchfinder>,
        cfg: ParseConfig,
    },
    NearOptimal {
        mf: Box<BtMatchfinder>,
        cfg: OptimalConfig,
        cache: Vec<Match>,
        nodes: Vec<OptimumNode>,
        costs: Box<CostModel>,
    },
}

/// A reusable DEFLATE compressor for one compression level.
pub struct Compressor {
    level: u32,
    strategy: Strategy,
    seqs: Vec<Sequence>,
    freqs: Box<FreqCounters>,
    codes: Box<HuffmanCodes>,
    static_codes: Box<HuffmanCodes>,
    precode: Box<PrecodeState>,
    splitter: BlockSplitStats,
}

impl Compressor {
    /// Create a compressor for `level`, or `None` for levels above 12.
    pub fn new(level: u32) -> Option<Compressor> {
        let strategy = match level {
            0 => Strategy::Stored,
            1 => Strategy::Fastest { mf: Box::new(HtMatchfinder::new()) },
            2..=9 => {
                let (mode, max_search_depth, nice_match_len) = match level {
                    2 => (ParseMode::Greedy, 6, 10),
                    3 => (ParseMode::Greedy, 12, 14),
                    4 => (ParseMode::Greedy, 24, 30),
                    5 => (ParseMode::Lazy, 20, 30),
                    6 => (ParseMode::Lazy, 40, 65),
                    7 => (ParseMode::Lazy, 100, 130),
                    8 => (ParseMode::Lazy2, 300, 200),
                    _ => (ParseMode::Lazy2, 600, 258),
                };
                Strategy::GreedyLazy {
                    mf: Box::new(HcMatchfinder::new()),
                    cfg: ParseConfig { mode, max_search_depth, nice_match_len },
                }
            }
            10..=12 => {
                let (max_search_depth, nice_match_len, num_optim_passes) = match level {
                    10 => (35, 75, 2),
                    11 => (100, 150, 3),
                    _ => (300, 258, 4),
                };
                Strategy::NearOptimal {
                    mf: Box::new(BtMatchfinder::new()),
                    cfg: OptimalConfig { max_search_depth, nice_match_len, num_optim_passes },
                    cache: Vec::with_capacity(MATCH_CACHE_LENGTH),
                    nodes: Vec::with_capacity(MAX_BLOCK_LENGTH + 1),
                    costs: Box::new(CostModel::new()),
                }
            }
            _ => return None,
        };

        Some(Compressor {
            level,
            strategy,
            seqs: Vec::with_capacity(SEQ_STORE_LENGTH + 1),
            freqs: Box::new(FreqCounters::new()),
            codes: Box::new(HuffmanCodes::new()),
            static_codes: Box::new(HuffmanCodes::build_static()),
            precode: Box::new(PrecodeState::new()),
            splitter: BlockSplitStats::new(),
        })
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    /// Compress `input` into `output` as a raw DEFLATE stream.
    /// Returns the compressed size, or 0 if it does not fit.
    pub fn compress(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        let mut w = BitWriter::new(output);
        match &mut self.strategy {
            Strategy::Stored => fastest::compress_stored_only(input, &mut w),
            Strategy::Fastest { mf } => fastest::compress(
                mf,
                input,
                &mut w,
                &mut self.seqs,
                &mut self.freqs,
                &mut self.codes,
                &self.static_codes,
                &mut self.precode,
            ),
            Strategy::GreedyLazy { mf, cfg } => greedy_lazy::compress(
                mf,
                cfg,
                input,
                &mut w,
                &mut self.seqs,
                &mut self.freqs,
                &mut self.codes,
                &self.static_codes,
                &mut self.precode,
                &mut self.splitter,
            ),
            Strategy::NearOptimal { mf, cfg, cache, nodes, costs } => near_optimal::compress(
                mf,
                cfg,
                input,
                &mut w,
                cache,
                nodes,
                costs,
                &mut self.freqs,
                &mut self.codes,
                &self.static_codes,
                &mut self.precode,
                &mut self.splitter,
            ),
        }
        w.finish().unwrap_or(0)
    }

    /// Worst-case compressed size for `in_len` input bytes.
    pub fn compress_bound(&self, in_len: usize) -> usize {
        compress_bound(in_len)
    }
}

/// Minimum match length worth emitting in this block, judged from a
/// sample of its literal diversity: the fewer distinct bytes, the
/// cheaper literals code, and the longer a match must be to pay for
/// itself.
pub(crate) fn calculate_min_match_len(data: &[u8], max_search_depth: u32) -> usize {
    if data.len() < 512 {
        return MIN_MATCH_LEN;
    }
    let sample = &data[..data.len().min(4096)];
    let mut used = [false; 256];
    for &b in sample {
        used[b as usize] = true;
    }
    let num_used = used.iter().filter(|&&u| u).count();
    choose_min_match_len(num_used, max_search_depth)
}

fn choose_min_match_len(num_used_literals: usize, max_search_depth: u32) -> usize {
    let min_len = match num_used_literals {
        0..=5 => 9,
        6..=9 => 8,
        10..=14 => 7,
        15..=29 => 6,
        30..=59 => 5,
        60..=99 => 4,
        _ => 3,
    };
    // Shallow searches rarely find long matches; do not starve them.
    if max_search_depth < 16 {
        min_len.min(5)
    } else {
        min_len
    }
}
