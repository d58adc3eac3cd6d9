//! Runtime tunables.
//!
//! The parameter set fixes the geometry of an accelerator build; the dummy
//! budget and the packing threshold are knobs a run may override.

use tracing::warn;

use crate::{
    ParameterSet,
    error::{Error, Result},
    hqc1::Hqc1Params,
    param::{WORD_BITS, num_words_for, tail_bits_for, total_bits, window_capacity},
};

/// Per-run configuration of dummy insertion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Dummy pairs available per sparse operand
    pub num_dummy_pairs: usize,
    /// Largest exponent distance allowed inside one packed word
    pub gap_threshold: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_params::<Hqc1Params>()
    }
}

impl Config {
    /// Defaults of parameter set `P`.
    pub fn for_params<P: ParameterSet>() -> Self {
        Self {
            num_dummy_pairs: P::NUM_DUMMY_PAIRS,
            gap_threshold: P::GAP_THRESHOLD,
        }
    }

    /// Override the dummy pair budget.
    pub fn with_dummy_pairs(mut self, num_dummy_pairs: usize) -> Self {
        self.num_dummy_pairs = num_dummy_pairs;
        self
    }

    /// Override the packing threshold.
    pub fn with_gap_threshold(mut self, gap_threshold: u32) -> Self {
        self.gap_threshold = gap_threshold;
        self
    }

    /// Largest pair gap a `P` shift window reproduces exactly, for every
    /// start offset.
    ///
    /// The trailing stream reads its `(left, right)` words `diff + latency`
    /// positions behind the newest one. The right word is only needed while
    /// the slice starts below bit 32. A gap fits when both phases of the
    /// stream, before and after the latency correction, stay inside the
    /// window for all 32 start offsets.
    pub fn bridgeable_gap<P: ParameterSet>() -> u32 {
        let capacity = window_capacity::<P>() as u32;
        let tail = tail_bits_for(total_bits::<P>());
        let mut gap = 0;
        while gap_fits(capacity, tail, gap + 1) {
            gap += 1;
        }
        gap
    }

    /// Check that this configuration can drive parameter set `P`.
    ///
    /// A threshold above [`Config::bridgeable_gap`] is accepted: packing
    /// passes, and affected passes report window overruns.
    pub fn validate<P: ParameterSet>(&self) -> Result<()> {
        if num_words_for(total_bits::<P>()) < 2 {
            return Err(Error::InvalidConfig("operand must span at least two words"));
        }
        if window_capacity::<P>() < 3 {
            return Err(Error::InvalidConfig("shift window must hold at least three words"));
        }
        if total_bits::<P>() > usize::from(u16::MAX) + 1 {
            return Err(Error::InvalidConfig("exponents must fit a 16-bit slot"));
        }
        let bridgeable = Self::bridgeable_gap::<P>();
        if self.gap_threshold > bridgeable {
            warn!(
                gap_threshold = self.gap_threshold,
                bridgeable,
                capacity = window_capacity::<P>(),
                "gap threshold exceeds what the shift window can bridge"
            );
        }
        Ok(())
    }
}

/// Whether a pair `gap` bits wide streams without touching evicted history.
fn gap_fits(capacity: u32, tail: u32, gap: u32) -> bool {
    (0..WORD_BITS).all(|offset| {
        let end = offset + gap;
        let (diff, r) = (end / WORD_BITS, end % WORD_BITS);
        let corrected = if r >= tail {
            (diff + 1, WORD_BITS - r + tail)
        } else {
            (diff, tail - r)
        };
        [(diff, WORD_BITS - r), corrected]
            .into_iter()
            .all(|(depth, shift_idx)| {
                depth < capacity && (shift_idx >= WORD_BITS || depth + 2 <= capacity)
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hqc1_defaults() {
        let config = Config::default();
        assert_eq!(config.num_dummy_pairs, 17);
        assert_eq!(config.gap_threshold, 1024);
        assert!(config.validate::<Hqc1Params>().is_ok());
    }

    #[test]
    fn overrides() {
        let config = Config::default().with_dummy_pairs(0).with_gap_threshold(511);
        assert_eq!(config, Config { num_dummy_pairs: 0, gap_threshold: 511 });
    }

    #[test]
    fn hqc1_window_bridges_518_bits() {
        // diff 17 is reachable while the trailing slice stays at or above
        // the tail width: 31 + 518 = 32 * 17 + 5
        assert_eq!(Config::bridgeable_gap::<Hqc1Params>(), 518);
        assert!(gap_fits(19, 5, 512));
        assert!(!gap_fits(19, 5, 519));
    }

    #[test]
    fn shallow_window_bridges_nothing() {
        assert!(!gap_fits(1, 5, 1));
        assert!(!gap_fits(0, 32, 1));
    }

    /// Every start offset with the widest bridgeable gap streams exactly; one
    /// bit wider corrupts some offset and reports it.
    #[test]
    fn widest_bridgeable_gap_is_exact_everywhere() {
        use crate::{
            controller::MultiplyAccumulateController,
            dummy::PackedSparseWord,
            golden::cyclic_product,
            memory::BitWordMemory,
            test_util::{TestRng, dense_memory},
        };

        let gap = Config::bridgeable_gap::<Hqc1Params>();
        let mut rng = TestRng::with_seed(512);
        let dense = dense_memory::<Hqc1Params>(&rng.dense_positions(17669, 2));
        let mut ctrl = MultiplyAccumulateController::<Hqc1Params>::new();
        for a in (0..17669 - gap).step_by(7).chain(0..32) {
            let mut acc = BitWordMemory::for_params::<Hqc1Params>();
            let word = PackedSparseWord::pair(a as u16, (a + gap) as u16);
            let report = ctrl.process_word(&dense, &mut acc, word);
            assert_eq!(report.window_overruns, 0, "pair ({a}, {})", a + gap);
            assert_eq!(
                acc,
                cyclic_product(&dense, &[a, a + gap]).unwrap(),
                "pair ({a}, {})",
                a + gap
            );
        }

        let wider = gap + 1;
        let mut flagged = 0;
        for a in 0..64u32 {
            let mut acc = BitWordMemory::for_params::<Hqc1Params>();
            let word = PackedSparseWord::pair(a as u16, (a + wider) as u16);
            let report = ctrl.process_word(&dense, &mut acc, word);
            let exact = acc == cyclic_product(&dense, &[a, a + wider]).unwrap();
            // a wrong product is always flagged
            assert!(exact || report.window_overruns > 0, "pair ({a}, {})", a + wider);
            flagged += usize::from(report.window_overruns > 0);
        }
        assert!(flagged > 0);
    }

    #[test]
    fn threshold_at_window_reach_validates() {
        let config = Config::default().with_gap_threshold(518);
        assert!(config.validate::<Hqc1Params>().is_ok());
    }
}
