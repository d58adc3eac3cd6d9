#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

//!
//! # Scope
//!
//! This crate models one hardware sub-block bit for bit. It is not a
//! cryptographic library and makes no claim about HQC's security.
//!
//! # Usage
//!
//! ```
//! use sparsemul::{Config, Multiplier, hqc1::Hqc1Params, memory::BitWordMemory};
//!
//! let dense = BitWordMemory::from_positions(17669, &[0, 1, 16])?;
//! let mut mul = Multiplier::<Hqc1Params>::new(Config::default())?;
//! let product = mul.multiply(&dense, &[5, 100])?;
//! assert_eq!(product.accumulator.positions(), vec![5, 6, 21, 100, 101, 116]);
//! # Ok::<(), sparsemul::Error>(())
//! ```

#[cfg(test)]
mod test_util;

mod param;

mod config;

mod error;

/// Packed 32-bit word memory
pub mod memory;

/// Dummy pair insertion and sparse-word packing
pub mod dummy;

/// Bounded lookback buffer of dense words
pub mod window;

/// Slice-and-XOR datapath
pub mod rotate_xor;

/// Streaming multiply-accumulate engine
pub mod controller;

/// Accumulator comparison
pub mod verify;

/// Bit-level reference product
pub mod golden;

/// Seeded operand generation
pub mod sampling;

/// Comma-separated dataset rows
pub mod dataset;

/// One-call multiply and verify
pub mod pipeline;

pub use config::Config;
pub use controller::{ExecutionReport, MultiplyAccumulateController, PassReport, PassState};
pub use dummy::{DummyInsertion, PackedSparseWord};
pub use error::{Error, Result};
pub use param::{
    EXPONENT_BITS, ParameterSet, WORD_BITS, num_words_for, tail_bits_for, total_bits,
    window_capacity,
};
pub use pipeline::{DatasetOutcome, Multiplier, Product};
pub use verify::{ResultVerifier, Verification};

/// HQC-1 accelerator build (NIST Security Level 1)
pub mod hqc1 {
    use super::ParameterSet;
    use hybrid_array::sizes::U19;

    /// HQC-1 parameter set implementation
    #[derive(Default, Clone, Debug, PartialEq, Eq)]
    pub struct Hqc1Params;

    impl ParameterSet for Hqc1Params {
        const HQC_N: u32 = 17669;
        const HQC_OMEGA: u32 = 66;
        const NUM_DUMMY_PAIRS: usize = 17;
        const GAP_THRESHOLD: u32 = 1024;

        type WindowCapacity = U19;
    }
}

/// HQC-3 ring on the HQC-1 datapath geometry
pub mod hqc3 {
    use super::ParameterSet;
    use hybrid_array::sizes::U19;

    /// HQC-3 parameter set implementation
    #[derive(Default, Clone, Debug, PartialEq, Eq)]
    pub struct Hqc3Params;

    impl ParameterSet for Hqc3Params {
        const HQC_N: u32 = 35851;
        const HQC_OMEGA: u32 = 100;
        const NUM_DUMMY_PAIRS: usize = 25;
        const GAP_THRESHOLD: u32 = 1024;

        type WindowCapacity = U19;
    }
}

/// HQC-5 ring on the HQC-1 datapath geometry
pub mod hqc5 {
    use super::ParameterSet;
    use hybrid_array::sizes::U19;

    /// HQC-5 parameter set implementation
    #[derive(Default, Clone, Debug, PartialEq, Eq)]
    pub struct Hqc5Params;

    impl ParameterSet for Hqc5Params {
        const HQC_N: u32 = 57637;
        const HQC_OMEGA: u32 = 131;
        const NUM_DUMMY_PAIRS: usize = 33;
        const GAP_THRESHOLD: u32 = 1024;

        type WindowCapacity = U19;
    }
}
