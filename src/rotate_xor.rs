//! Rotate-and-XOR adder.
//!
//! Each cycle the datapath sees two adjacent dense-word pairs, one per
//! rotation stream. A pair concatenates into 64 bits with the newer (higher
//! address) word on top; the 32-bit slice that starts at the stream's shift
//! offset is exactly the piece of the rotated dense operand landing on the
//! current accumulator word. Both slices are XORed into that word.

use core::ops::RangeInclusive;

/// Two adjacent dense words feeding one rotation stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WordPair {
    /// Newer word, occupies bits 32..64 of the concatenation
    pub left: u32,
    /// Older word, occupies bits 0..32
    pub right: u32,
}

impl WordPair {
    /// Pair from `(left, right)`.
    #[inline]
    pub fn new(left: u32, right: u32) -> Self {
        Self { left, right }
    }

    /// `(left << 32) | right`
    #[inline]
    pub fn concat(self) -> u64 {
        (u64::from(self.left) << 32) | u64::from(self.right)
    }
}

/// The XOR adder.
pub struct RotateXor;

impl RotateXor {
    /// Bits `range.start()..=range.end()` of `value`, shifted down to bit 0.
    ///
    /// Bits beyond 63 read as zero.
    #[inline]
    pub fn extract(value: u64, range: &RangeInclusive<u32>) -> u32 {
        let (start, end) = (*range.start(), *range.end());
        debug_assert!(end >= start, "empty extraction range {start}..={end}");
        let len = end - start + 1;
        let mask = if len >= 64 {
            u64::MAX
        } else {
            (1u64 << len) - 1
        };
        (value.checked_shr(start).unwrap_or(0) & mask) as u32
    }

    /// `acc ^ slice(high) ^ slice(low)`
    #[inline]
    pub fn combine(
        high: WordPair,
        low: WordPair,
        acc: u32,
        high_range: &RangeInclusive<u32>,
        low_range: &RangeInclusive<u32>,
    ) -> u32 {
        let high_bits = Self::extract(high.concat(), high_range);
        let low_bits = Self::extract(low.concat(), low_range);
        acc ^ high_bits ^ low_bits
    }
}
