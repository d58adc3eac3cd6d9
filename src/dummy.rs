//! Dummy insertion and sparse-word packing.
//!
//! The accelerator consumes the sparse operand two exponents per 32-bit word
//! and streams both rotations at once. How far apart the two exponents of a
//! word are determines how much dense history the shift window must hold, and
//! it leaks through timing. Splitting the widest pairs with dummy pairs
//! `(d, d)` bounds that distance without changing the product, since
//! `x^d·h + x^d·h = 0` over GF(2).
//!
//! Algorithm:
//! 1. Pair consecutive exponents `(p[2i], p[2i+1])` and rank the pairs by
//!    gap, widest first; equal gaps rank the later pair first.
//! 2. Walk the first `num_dummy_pairs` ranked pairs with a budget of
//!    `num_dummy_pairs` dummy pairs. The first pair wider than the threshold
//!    (while two units remain) is split in thirds with two dummy pairs; every
//!    other selected pair gets one dummy pair at its midpoint.
//! 3. Pack the padded list two at a time, `(high << 16) | low`, rejecting any
//!    word whose gap exceeds the threshold.
//!
//! The thirds split happens at most once per call even when several gaps
//! exceed the threshold; wider inputs surface as a packing overflow.

use core::fmt;

use tracing::{Level, debug, trace};

use crate::{
    Config,
    error::{Error, Result},
    param::EXPONENT_BITS,
};

/// Two exponents sharing one 32-bit sparse word.
///
/// A lone trailing exponent has no low half; the hardware word carries a zero
/// there, and the engine leaves that stream idle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PackedSparseWord {
    high: u16,
    low: Option<u16>,
}

impl PackedSparseWord {
    /// Word carrying both exponents.
    pub fn pair(high: u16, low: u16) -> Self {
        Self {
            high,
            low: Some(low),
        }
    }

    /// Word carrying a single trailing exponent.
    pub fn single(high: u16) -> Self {
        Self { high, low: None }
    }

    /// Decode a raw hardware word; both halves are taken as live.
    pub fn from_bits(bits: u32) -> Self {
        Self::pair((bits >> EXPONENT_BITS) as u16, bits as u16)
    }

    /// Exponent in bits 16..32.
    pub fn high(&self) -> u16 {
        self.high
    }

    /// Exponent in bits 0..16, if present.
    pub fn low(&self) -> Option<u16> {
        self.low
    }

    /// Raw 32-bit word as written to the sparse memory.
    pub fn to_bits(self) -> u32 {
        (u32::from(self.high) << EXPONENT_BITS) | u32::from(self.low.unwrap_or(0))
    }

    /// Distance between the two exponents; 0 for a single.
    pub fn gap(&self) -> u32 {
        self.low
            .map_or(0, |low| u32::from(low).abs_diff(u32::from(self.high)))
    }
}

impl fmt::Display for PackedSparseWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.low {
            Some(low) => write!(f, "({}, {})", self.high, low),
            None => write!(f, "({}, -)", self.high),
        }
    }
}

/// How a selected pair is split.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Split {
    /// One dummy pair at the midpoint
    Midpoint(u32),
    /// Two dummy pairs at the 1/3 and 2/3 points
    Thirds(u32, u32),
}

impl Split {
    fn values(self) -> impl Iterator<Item = u32> {
        let (a, b) = match self {
            Split::Midpoint(d) => (Some(d), None),
            Split::Thirds(d1, d2) => (Some(d1), Some(d2)),
        };
        a.into_iter().chain(b).flat_map(|d| [d, d])
    }
}

/// Origin of a padded position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PositionKind {
    /// Exponent of the input polynomial
    Original,
    /// Inserted cancelling value
    Dummy,
}

/// Output of [`DummyInsertion::process`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaddedSparse {
    /// Exponents with dummy pairs spliced in, in stream order
    pub positions: Vec<u32>,
    /// `positions` packed two per word
    pub words: Vec<PackedSparseWord>,
}

/// Dummy pair insertion for the sparse operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DummyInsertion {
    num_dummy_pairs: usize,
    gap_threshold: u32,
}

impl From<&Config> for DummyInsertion {
    fn from(config: &Config) -> Self {
        Self::new(config.num_dummy_pairs, config.gap_threshold)
    }
}

impl DummyInsertion {
    /// Insertion with a budget of `num_dummy_pairs` and the given threshold.
    pub fn new(num_dummy_pairs: usize, gap_threshold: u32) -> Self {
        Self {
            num_dummy_pairs,
            gap_threshold,
        }
    }

    /// Dummy pair budget.
    pub fn num_dummy_pairs(&self) -> usize {
        self.num_dummy_pairs
    }

    /// Maximum gap allowed inside one packed word.
    pub fn gap_threshold(&self) -> u32 {
        self.gap_threshold
    }

    /// Sort the exponents and check they fit the 16-bit word halves.
    pub fn normalize(positions: &[u32]) -> Result<Vec<u32>> {
        let mut sorted = positions.to_vec();
        sorted.sort_unstable();
        if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
            return Err(Error::malformed(
                "sparse exponents",
                format!("duplicate exponent {}", w[0]),
            ));
        }
        if let Some(&p) = sorted.iter().find(|&&p| p > u32::from(u16::MAX)) {
            return Err(Error::malformed(
                "sparse exponents",
                format!("exponent {p} does not fit a 16-bit slot"),
            ));
        }
        Ok(sorted)
    }

    /// Which pairs receive dummies, indexed by pair number.
    ///
    /// `positions` must be sorted.
    pub fn plan(&self, positions: &[u32]) -> Vec<Option<Split>> {
        let gaps: Vec<u32> = positions.chunks_exact(2).map(|p| p[1] - p[0]).collect();

        let mut ranked: Vec<usize> = (0..gaps.len()).collect();
        ranked.sort_unstable_by(|&a, &b| gaps[b].cmp(&gaps[a]).then(b.cmp(&a)));
        ranked.truncate(self.num_dummy_pairs);

        let mut plan = vec![None; gaps.len()];
        let mut budget = self.num_dummy_pairs;
        let mut thirds_used = false;
        for pair in ranked {
            let base = positions[2 * pair];
            let gap = gaps[pair];
            if gap > self.gap_threshold && budget >= 2 && !thirds_used {
                plan[pair] = Some(Split::Thirds(base + gap / 3, base + 2 * gap / 3));
                budget -= 2;
                thirds_used = true;
            } else if budget >= 1 {
                plan[pair] = Some(Split::Midpoint(base + gap / 2));
                budget -= 1;
            }
        }
        plan
    }

    /// Splice the planned dummy pairs into the exponent list.
    pub fn insert(&self, positions: &[u32]) -> Vec<u32> {
        let plan = self.plan(positions);
        let mut padded = Vec::with_capacity(positions.len() + 4 * plan.len());
        for (i, &p) in positions.iter().enumerate() {
            padded.push(p);
            if i % 2 == 0
                && let Some(Some(split)) = plan.get(i / 2)
            {
                padded.extend(split.values());
            }
        }
        padded
    }

    /// Pack exponents two per word; an odd last exponent is packed alone.
    pub fn pack(&self, positions: &[u32]) -> Result<Vec<PackedSparseWord>> {
        let mut words = Vec::with_capacity(positions.len().div_ceil(2));
        for (word, chunk) in positions.chunks(2).enumerate() {
            let high = slot(chunk[0])?;
            let packed = match chunk.get(1) {
                Some(&low) => {
                    let gap = low.abs_diff(chunk[0]);
                    if gap > self.gap_threshold {
                        return Err(Error::PackingOverflow {
                            word,
                            high: chunk[0],
                            low,
                            gap,
                            threshold: self.gap_threshold,
                        });
                    }
                    PackedSparseWord::pair(high, slot(low)?)
                }
                None => PackedSparseWord::single(high),
            };
            trace!(word, bits = format_args!("{:#010x}", packed.to_bits()), %packed);
            words.push(packed);
        }
        Ok(words)
    }

    /// Sort, pad and pack a sparse exponent list.
    #[tracing::instrument(skip_all, name = "DummyInsertion.process")]
    pub fn process(&self, positions: &[u32]) -> Result<PaddedSparse> {
        let sorted = Self::normalize(positions)?;
        let padded = self.insert(&sorted);
        if tracing::enabled!(Level::TRACE) {
            let kinds = Self::classify(&sorted, &padded);
            for (index, (&position, kind)) in padded.iter().zip(kinds).enumerate() {
                if kind == PositionKind::Dummy {
                    trace!(index, position, "dummy");
                }
            }
        }
        let words = self.pack(&padded)?;
        debug!(
            original = sorted.len(),
            padded = padded.len(),
            words = words.len(),
            max_gap = words.iter().map(PackedSparseWord::gap).max().unwrap_or(0),
            "dummy insertion done"
        );
        Ok(PaddedSparse {
            positions: padded,
            words,
        })
    }

    /// Tag every padded position as original or dummy.
    pub fn classify(original: &[u32], padded: &[u32]) -> Vec<PositionKind> {
        padded
            .iter()
            .map(|p| {
                if original.contains(p) {
                    PositionKind::Original
                } else {
                    PositionKind::Dummy
                }
            })
            .collect()
    }
}

fn slot(exponent: u32) -> Result<u16> {
    u16::try_from(exponent).map_err(|_| {
        Error::malformed(
            "sparse exponents",
            format!("exponent {exponent} does not fit a 16-bit slot"),
        )
    })
}
