//! Error taxonomy.
//!
//! Only two conditions are fatal to a dataset: a packed sparse pair that the
//! hardware buffer cannot bridge, and input that never parsed into a valid
//! position list. A verification mismatch is a result, see
//! [`crate::verify::Verification`].

/// Errors raised before a multiply pass starts.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A packed sparse pair spans more than the gap threshold.
    ///
    /// Raised at packing time, before any streaming. The dummy budget or the
    /// threshold has to be reconfigured; retrying the same input fails again.
    #[error(
        "packing overflow: word {word} packs ({high}, {low}), gap {gap} exceeds threshold {threshold}"
    )]
    PackingOverflow {
        /// Index of the offending packed word
        word: usize,
        /// Exponent in the high half
        high: u32,
        /// Exponent in the low half
        low: u32,
        /// `low - high`
        gap: u32,
        /// Configured gap threshold
        threshold: u32,
    },

    /// A position list is non-numeric, truncated or otherwise unusable.
    #[error("malformed input ({context}): {reason}")]
    MalformedInput {
        /// Where the list came from, e.g. `sparse row 3`
        context: String,
        /// What is wrong with it
        reason: String,
    },

    /// A coefficient position lies outside `[0, total_bits)`.
    #[error("position {position} out of range for a {total_bits}-bit operand")]
    PositionOutOfRange {
        /// Offending position
        position: u32,
        /// Operand length in bits
        total_bits: usize,
    },

    /// The runtime configuration cannot drive this parameter set.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Reading a dataset stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedInput {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that only invalidate the current dataset; the caller
    /// reports them and moves on to the next one.
    pub fn is_dataset_local(&self) -> bool {
        matches!(
            self,
            Error::PackingOverflow { .. }
                | Error::MalformedInput { .. }
                | Error::PositionOutOfRange { .. }
        )
    }
}

/// Result alias used across the crate
pub type Result<T> = core::result::Result<T, Error>;
