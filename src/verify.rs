//! Result verification against an expected position set.

use core::fmt;
use std::collections::BTreeSet;

use crate::memory::BitWordMemory;

/// Outcome of comparing an accumulator with the expected product.
///
/// A mismatch is data, not an error: `ok` is false and the differing
/// positions are listed.
#[derive(Clone, Debug, PartialEq)]
pub struct Verification {
    /// True iff `missing` and `extra` are both empty
    pub ok: bool,
    /// Expected positions absent from the accumulator
    pub missing: BTreeSet<u32>,
    /// Accumulator positions that were not expected
    pub extra: BTreeSet<u32>,
    /// Positions present in both
    pub matches: BTreeSet<u32>,
    /// `(|missing| + |extra|) / |missing ∪ extra ∪ matches| · 100`
    pub error_rate: f64,
    /// `|matches| / |expected| · 100`
    pub accuracy: f64,
}

/// Compares accumulator 1-bits with an expected set.
pub struct ResultVerifier;

impl ResultVerifier {
    /// Compare the valid bits of `acc` with `expected`.
    pub fn verify(acc: &BitWordMemory, expected: &[u32]) -> Verification {
        let actual: BTreeSet<u32> = acc.positions().into_iter().collect();
        let expected: BTreeSet<u32> = expected.iter().copied().collect();

        let missing: BTreeSet<u32> = expected.difference(&actual).copied().collect();
        let extra: BTreeSet<u32> = actual.difference(&expected).copied().collect();
        let matches: BTreeSet<u32> = actual.intersection(&expected).copied().collect();

        // the three sets are disjoint
        let union = missing.len() + extra.len() + matches.len();
        let error_rate = percent(missing.len() + extra.len(), union);
        let accuracy = percent(matches.len(), expected.len());

        Verification {
            ok: missing.is_empty() && extra.is_empty(),
            missing,
            extra,
            matches,
            error_rate,
            accuracy,
        }
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "status:     {}", if self.ok { "PASS" } else { "FAIL" })?;
        writeln!(f, "matches:    {}", self.matches.len())?;
        writeln!(f, "missing:    {} {:?}", self.missing.len(), self.missing)?;
        writeln!(f, "extra:      {} {:?}", self.extra.len(), self.extra)?;
        writeln!(f, "accuracy:   {:.2}%", self.accuracy)?;
        write!(f, "error rate: {:.2}%", self.error_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(positions: &[u32]) -> BitWordMemory {
        BitWordMemory::from_positions(17669, positions).unwrap()
    }

    #[test]
    fn empty_accumulator_empty_expectation() {
        let v = ResultVerifier::verify(&BitWordMemory::new(17669), &[]);
        assert!(v.ok);
        assert_eq!(v.error_rate, 0.0);
        assert_eq!(v.accuracy, 0.0);
        assert!(v.matches.is_empty());
    }

    #[test]
    fn exact_match() {
        let v = ResultVerifier::verify(&memory(&[5, 6, 21, 100]), &[100, 21, 6, 5]);
        assert!(v.ok);
        assert_eq!(v.matches.len(), 4);
        assert_eq!(v.error_rate, 0.0);
        assert_eq!(v.accuracy, 100.0);
    }

    #[test]
    fn mismatch_lists_differences() {
        let v = ResultVerifier::verify(&memory(&[1, 2, 3]), &[2, 3, 4]);
        assert!(!v.ok);
        assert_eq!(v.missing, BTreeSet::from([4]));
        assert_eq!(v.extra, BTreeSet::from([1]));
        assert_eq!(v.matches, BTreeSet::from([2, 3]));
        assert_eq!(v.error_rate, 50.0);
        let report = v.to_string();
        assert!(report.starts_with("status:     FAIL"));
        assert!(report.contains("missing:    1 {4}"));
    }

    #[test]
    fn padding_bits_are_not_compared() {
        let mut acc = memory(&[0]);
        acc.set_word(552, u32::MAX);
        let v = ResultVerifier::verify(&acc, &[0, 17664, 17665, 17666, 17667, 17668]);
        assert!(v.ok, "{v}");
    }
}
