use core::fmt::Debug;

use hybrid_array::{ArraySize, typenum::Unsigned};

/// Width of every memory word moved through the accelerator datapath.
pub const WORD_BITS: u32 = 32;

/// Width of one exponent slot inside a packed sparse word.
pub const EXPONENT_BITS: u32 = 16;

/// Accelerator parameter set
///
/// Fixes the ring size, the sparse weight and the hardware buffer geometry of
/// one accelerator build. The runtime tunables in [`crate::Config`] take their
/// defaults from here.
pub trait ParameterSet: Default + Clone + Debug + PartialEq + Eq {
    /// HQC_N: length of the ambient space, the `n` in `x^n + 1`
    const HQC_N: u32;

    /// HQC_OMEGA: Hamming weight of the sparse operand
    const HQC_OMEGA: u32;

    /// Default dummy pair budget handed to dummy insertion
    const NUM_DUMMY_PAIRS: usize;

    /// Default maximum exponent distance inside one packed sparse word
    const GAP_THRESHOLD: u32;

    /// Depth of the shift window (dense words of lookback history)
    type WindowCapacity: ArraySize;
}

/// Number of bits held by the dense operand and the accumulator.
#[inline]
pub fn total_bits<P: ParameterSet>() -> usize {
    P::HQC_N as usize
}

/// Number of 32-bit words needed to store `total_bits` bits: ceil(n / 32)
#[inline]
pub const fn num_words_for(total_bits: usize) -> usize {
    total_bits.div_ceil(WORD_BITS as usize)
}

/// Valid (non-padding) bits in the final word of an n-bit memory.
///
/// 5 for HQC-1: 17669 - 32 * 552.
#[inline]
pub const fn tail_bits_for(total_bits: usize) -> u32 {
    let rem = (total_bits % WORD_BITS as usize) as u32;
    if rem == 0 { WORD_BITS } else { rem }
}

/// Shift window depth as a runtime value
#[inline]
pub fn window_capacity<P: ParameterSet>() -> usize {
    P::WindowCapacity::USIZE
}
