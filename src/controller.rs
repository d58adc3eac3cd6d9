//! Multiply-accumulate controller.
//!
//! Runs one packed sparse word per pass. Both exponents of the word are
//! rotation streams over the same dense operand: the accumulator receives
//! `x^high·h + x^low·h`, one 32-bit word per step.
//!
//! Pass states: `Idle → InitialAlignment → Streaming(load_idx) → Done`.
//!
//! - InitialAlignment: the accumulator word `shift / 32` of each stream gets
//!   the dense head word spliced with the bits that wrap around from the
//!   dense tail. The tail word only holds `n mod 32` valid bits (5 for
//!   HQC-1), so the splice needs either one or two tail words depending on
//!   `shift mod 32`.
//! - Streaming: every step loads the next dense word into the shift window,
//!   looks up two adjacent words per stream and lets the XOR adder fold both
//!   slices into one accumulator word. The low stream trails the high stream
//!   by `diff` window positions.
//! - Once the accumulator index passes the last word, the short tail word has
//!   been consumed: every later slice sits `n mod 32` bits lower in the dense
//!   stream. Each stream either moves its slice offset up (and reads one
//!   position deeper, the latency flag) or restarts at a small offset.
//!
//! A window too shallow for a word's `diff` produces a wrong result, never a
//! panic; such passes are counted in [`PassReport::window_overruns`].

use core::ops::RangeInclusive;

use subtle::{ConditionallySelectable, ConstantTimeLess};
use tracing::{debug, trace, warn};

use crate::{
    ParameterSet,
    dummy::PackedSparseWord,
    memory::BitWordMemory,
    param::WORD_BITS,
    rotate_xor::{RotateXor, WordPair},
    window::ShiftWindow,
};

/// Where the controller is within a pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PassState {
    /// No pass started yet
    #[default]
    Idle,
    /// Writing the wraparound words
    InitialAlignment,
    /// Streaming step with the given load index
    Streaming(usize),
    /// Last pass finished
    Done,
}

/// Per-pass bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassReport {
    /// Sparse word processed
    pub word: PackedSparseWord,
    /// Word distance between the two streams
    pub diff: usize,
    /// Streaming steps executed
    pub steps: usize,
    /// Load index at which the latency correction fired (0 = during alignment)
    pub boundary_step: Option<usize>,
    /// Lookups that needed history the window no longer held
    pub window_overruns: usize,
}

/// Reports of every pass in one multiply.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    /// One entry per packed sparse word, in order
    pub passes: Vec<PassReport>,
}

impl ExecutionReport {
    /// Total lookback overruns across all passes.
    pub fn window_overruns(&self) -> usize {
        self.passes.iter().map(|p| p.window_overruns).sum()
    }

    /// Largest stream distance seen.
    pub fn max_diff(&self) -> usize {
        self.passes.iter().map(|p| p.diff).max().unwrap_or(0)
    }
}

/// One rotation stream: `acc_start_idx`, `acc_shift_idx` and its latency flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Stream {
    shift: u32,
    start_idx: usize,
    shift_idx: u32,
    latency: usize,
}

impl Stream {
    fn new(shift: u32) -> Self {
        Self {
            shift,
            start_idx: (shift / WORD_BITS) as usize,
            shift_idx: WORD_BITS - shift % WORD_BITS,
            latency: 0,
        }
    }

    fn remainder(&self) -> u32 {
        self.shift % WORD_BITS
    }

    fn range(&self) -> RangeInclusive<u32> {
        self.shift_idx..=self.shift_idx + WORD_BITS - 1
    }

    /// Latency update after the tail word has gone by.
    fn cross_boundary(&mut self, tail_bits: u32) {
        let r = self.remainder();
        let deeper = !r.ct_lt(&tail_bits);
        self.shift_idx = u32::conditional_select(
            &tail_bits.wrapping_sub(r),
            &(self.shift_idx + tail_bits),
            deeper,
        );
        self.latency = u32::conditional_select(&0, &1, deeper) as usize;
    }
}

/// Window positions of a stream's `(left, right)` words.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Lookback {
    left: Option<usize>,
    right: Option<usize>,
    overrun: bool,
}

impl Lookback {
    const IDLE: Self = Self {
        left: None,
        right: None,
        overrun: false,
    };

    /// Positions for a stream reading `depth + latency` words behind the
    /// newest. A slice starting at bit 32 never touches the right word, so
    /// only a missing word that feeds the slice counts as an overrun.
    fn resolve(size: usize, depth: usize, latency: usize, shift_idx: u32) -> Self {
        let left = size.checked_sub(1 + depth + latency);
        let right = size.checked_sub(2 + depth + latency);
        Self {
            left,
            right,
            overrun: left.is_none() || (right.is_none() && shift_idx < WORD_BITS),
        }
    }
}

#[inline]
fn low_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Wraparound word for a stream whose shift leaves `remainder = shift % 32`.
///
/// The top `32 - remainder` bits are the dense head word; the low
/// `remainder` bits wrap around from the end of the operand. When
/// `remainder` reaches past the tail word's valid bits the rest comes from
/// the word before it. Both compositions are formed and one is selected
/// without branching on the (secret) shift.
pub fn boundary_word(dense: &BitWordMemory, remainder: u32) -> u32 {
    debug_assert!(remainder < WORD_BITS);
    let tail = dense.tail_bits();
    let n_words = dense.num_words();
    let shift_idx = WORD_BITS - remainder;

    let head = u64::from(dense.word(0)) & low_mask(shift_idx);
    let last = u64::from(dense.word(n_words - 1));
    let prev = u64::from(dense.word(n_words.wrapping_sub(2)));

    // remainder >= tail: head | whole tail word | top bits of the word before it
    let remaining = remainder.saturating_sub(tail);
    let spliced = (head << (WORD_BITS - shift_idx))
        | ((last & low_mask(tail)) << remaining)
        | ((prev >> (WORD_BITS - remaining)) & low_mask(remaining));

    // remainder < tail: everything wrapped fits in the tail word
    let direct =
        (head << remainder) | ((last >> tail.saturating_sub(remainder)) & low_mask(remainder));

    let use_spliced = !remainder.ct_lt(&tail);
    u32::conditional_select(&(direct as u32), &(spliced as u32), use_spliced)
}

/// Sparse x dense multiply-accumulate engine.
///
/// Owns the shift window; the dense operand is borrowed and the accumulator
/// is borrowed mutably for the length of each pass.
#[derive(Clone, Debug)]
pub struct MultiplyAccumulateController<P: ParameterSet> {
    window: ShiftWindow<P>,
    state: PassState,
    high: Stream,
    low: Option<Stream>,
    diff: usize,
}

impl<P: ParameterSet> Default for MultiplyAccumulateController<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ParameterSet> MultiplyAccumulateController<P> {
    /// Idle controller with an empty window.
    pub fn new() -> Self {
        Self {
            window: ShiftWindow::new(),
            state: PassState::Idle,
            high: Stream::default(),
            low: None,
            diff: 0,
        }
    }

    /// Current pass state.
    pub fn state(&self) -> PassState {
        self.state
    }

    /// The shift window as left by the last step.
    pub fn window(&self) -> &ShiftWindow<P> {
        &self.window
    }

    /// Drop buffered history and return to `Idle`.
    pub fn clear(&mut self) {
        self.window.clear();
        self.state = PassState::Idle;
    }

    /// Run every packed word through the engine, accumulating into `acc`.
    #[tracing::instrument(skip_all, name = "Controller.execute", fields(words = words.len()))]
    pub fn execute(
        &mut self,
        dense: &BitWordMemory,
        words: &[PackedSparseWord],
        acc: &mut BitWordMemory,
    ) -> ExecutionReport {
        let passes = words
            .iter()
            .map(|&word| {
                self.clear();
                self.process_word(dense, acc, word)
            })
            .collect();
        ExecutionReport { passes }
    }

    /// One full pass: XOR `x^high·dense + x^low·dense` into `acc`.
    pub fn process_word(
        &mut self,
        dense: &BitWordMemory,
        acc: &mut BitWordMemory,
        word: PackedSparseWord,
    ) -> PassReport {
        debug_assert_eq!(dense.total_bits(), acc.total_bits());
        let n_words = dense.num_words();
        let tail = dense.tail_bits();

        self.window.clear();
        self.load_streams(word);
        debug_assert!((self.high.shift as usize) < dense.total_bits());
        let diff = self.diff;
        debug!(
            %word,
            high_start = self.high.start_idx,
            high_shift_idx = self.high.shift_idx,
            low_start = self.low.map(|s| s.start_idx),
            low_shift_idx = self.low.map(|s| s.shift_idx),
            diff,
            "pass parameters"
        );

        let mut report = PassReport {
            word,
            diff,
            steps: 0,
            boundary_step: None,
            window_overruns: 0,
        };

        self.state = PassState::InitialAlignment;
        self.window.push(dense.word(0), 0);
        for stream in core::iter::once(self.high).chain(self.low) {
            acc.xor_word(
                stream.start_idx % n_words,
                boundary_word(dense, stream.remainder()),
            );
        }
        if self.high.start_idx == n_words - 1 {
            self.cross_boundary(tail);
            report.boundary_step = Some(0);
        }

        for load_idx in 1..n_words + diff {
            self.state = PassState::Streaming(load_idx);
            let source = load_idx % n_words;
            self.window.push(dense.word(source), source);
            let size = self.window.len();

            let high_at = if load_idx >= n_words {
                Lookback::IDLE
            } else {
                Lookback::resolve(size, 0, self.high.latency, self.high.shift_idx)
            };
            let low_at = match self.low {
                Some(low) if load_idx > diff => {
                    Lookback::resolve(size, diff, low.latency, low.shift_idx)
                }
                _ => Lookback::IDLE,
            };
            report.window_overruns += usize::from(high_at.overrun) + usize::from(low_at.overrun);

            let (hl, hr) = self.window.pair_at(high_at.left, high_at.right);
            let (ll, lr) = self.window.pair_at(low_at.left, low_at.right);
            let low_range = self.low.unwrap_or(self.high).range();

            let acc_idx = (load_idx + self.high.start_idx) % n_words;
            let result = RotateXor::combine(
                WordPair::new(hl, hr),
                WordPair::new(ll, lr),
                acc.word(acc_idx),
                &self.high.range(),
                &low_range,
            );
            acc.set_word(acc_idx, result);
            trace!(
                load_idx,
                acc_idx,
                high = ?(high_at.left, high_at.right),
                low = ?(low_at.left, low_at.right),
                result = format_args!("{result:#010x}"),
            );

            if acc_idx == n_words - 1 {
                self.cross_boundary(tail);
                report.boundary_step = Some(load_idx);
            }
            report.steps += 1;
        }

        acc.mask_padding();
        self.state = PassState::Done;
        if report.window_overruns > 0 {
            warn!(
                %word,
                diff,
                capacity = self.window.capacity(),
                overruns = report.window_overruns,
                "stream distance exceeds shift window; accumulator is incorrect"
            );
        }
        report
    }

    fn load_streams(&mut self, word: PackedSparseWord) {
        let high = u32::from(word.high());
        match word.low().map(u32::from) {
            Some(low) => {
                let (lead, trail) = if low < high { (low, high) } else { (high, low) };
                self.high = Stream::new(lead);
                self.low = Some(Stream::new(trail));
            }
            None => {
                self.high = Stream::new(high);
                self.low = None;
            }
        }
        self.diff = self.low.map_or(0, |low| low.start_idx - self.high.start_idx);
    }

    fn cross_boundary(&mut self, tail: u32) {
        self.high.cross_boundary(tail);
        if let Some(low) = self.low.as_mut() {
            low.cross_boundary(tail);
        }
        trace!(
            high_shift_idx = self.high.shift_idx,
            high_latency = self.high.latency,
            low_shift_idx = self.low.map(|s| s.shift_idx),
            low_latency = self.low.map(|s| s.latency),
            "latency correction"
        );
    }
}
