//! End-to-end multiply of one dataset.
//!
//! Dummy insertion, operand load, one controller pass per packed word and,
//! for datasets with an expected product, verification.

use tracing::{debug, info};

use crate::{
    Config, ParameterSet,
    controller::{ExecutionReport, MultiplyAccumulateController},
    dataset::Dataset,
    dummy::{DummyInsertion, PaddedSparse},
    error::{Error, Result},
    memory::BitWordMemory,
    param::total_bits,
    verify::{ResultVerifier, Verification},
};

/// Output of one multiply.
#[derive(Clone, Debug)]
pub struct Product {
    /// `Σ x^p · dense mod (x^n + 1)` as produced by the engine
    pub accumulator: BitWordMemory,
    /// Sparse operand after dummy insertion
    pub padded: PaddedSparse,
    /// Per-pass bookkeeping
    pub report: ExecutionReport,
}

/// A verified dataset.
#[derive(Clone, Debug)]
pub struct DatasetOutcome {
    /// Row index of the dataset
    pub index: usize,
    /// Engine output
    pub product: Product,
    /// Comparison with the expected product
    pub verification: Verification,
}

/// Sparse x dense multiplier for parameter set `P`.
#[derive(Clone, Debug)]
pub struct Multiplier<P: ParameterSet> {
    config: Config,
    insertion: DummyInsertion,
    controller: MultiplyAccumulateController<P>,
}

impl<P: ParameterSet> Multiplier<P> {
    /// Multiplier running with `config`.
    pub fn new(config: Config) -> Result<Self> {
        config.validate::<P>()?;
        Ok(Self {
            config,
            insertion: DummyInsertion::from(&config),
            controller: MultiplyAccumulateController::new(),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Multiply a loaded dense operand by a sparse exponent list.
    #[tracing::instrument(skip_all, name = "Multiplier.multiply", fields(weight = sparse.len()))]
    pub fn multiply(&mut self, dense: &BitWordMemory, sparse: &[u32]) -> Result<Product> {
        let n = total_bits::<P>();
        if dense.total_bits() != n {
            return Err(Error::InvalidConfig("dense operand does not match the parameter set"));
        }
        if let Some(&position) = sparse.iter().find(|&&p| p as usize >= n) {
            return Err(Error::PositionOutOfRange {
                position,
                total_bits: n,
            });
        }

        let padded = self.insertion.process(sparse)?;
        let mut accumulator = BitWordMemory::for_params::<P>();
        let report = self
            .controller
            .execute(dense, &padded.words, &mut accumulator);
        debug!(
            passes = report.passes.len(),
            max_diff = report.max_diff(),
            overruns = report.window_overruns(),
            "multiply done"
        );
        Ok(Product {
            accumulator,
            padded,
            report,
        })
    }

    /// Multiply a dataset and verify against its expected product.
    #[tracing::instrument(skip_all, name = "Multiplier.run_dataset", fields(index = dataset.index))]
    pub fn run_dataset(&mut self, dataset: &Dataset) -> Result<DatasetOutcome> {
        let dense = BitWordMemory::from_positions(total_bits::<P>(), &dataset.dense)?;
        let product = self.multiply(&dense, &dataset.sparse)?;
        let verification = ResultVerifier::verify(&product.accumulator, &dataset.expected);
        info!(
            index = dataset.index,
            ok = verification.ok,
            error_rate = verification.error_rate,
            "dataset verified"
        );
        Ok(DatasetOutcome {
            index: dataset.index,
            product,
            verification,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::golden::cyclic_product;
    use crate::hqc1::Hqc1Params;
    use crate::test_util::{TestRng, dense_memory};

    #[test]
    fn concrete_dataset_verifies() {
        let mut mul = Multiplier::<Hqc1Params>::new(Config::default().with_dummy_pairs(0)).unwrap();
        let dataset = Dataset {
            index: 0,
            sparse: vec![100, 5],
            dense: vec![0, 1, 16],
            expected: vec![5, 6, 21, 100, 101, 116],
        };
        let outcome = mul.run_dataset(&dataset).unwrap();
        assert!(outcome.verification.ok);
        assert_eq!(outcome.product.padded.words.len(), 1);
    }

    #[test]
    fn dummies_do_not_change_the_product() {
        let mut rng = TestRng::with_seed(3);
        let dense = dense_memory::<Hqc1Params>(&rng.dense_positions(17669, 2));
        let sparse = rng.segmented_support(17669, 66, 512);

        let mut plain = Multiplier::<Hqc1Params>::new(Config::default().with_dummy_pairs(0)).unwrap();
        let mut padded = Multiplier::<Hqc1Params>::new(Config::default()).unwrap();
        let a = plain.multiply(&dense, &sparse).unwrap();
        let b = padded.multiply(&dense, &sparse).unwrap();

        assert_eq!(b.padded.positions.len(), 66 + 2 * 17);
        assert_eq!(b.report.window_overruns(), 0);
        assert_eq!(a.accumulator, b.accumulator);
        assert_eq!(a.accumulator, cyclic_product(&dense, &sparse).unwrap());
    }

    #[test]
    fn out_of_range_exponent_is_rejected() {
        let mut mul = Multiplier::<Hqc1Params>::new(Config::default()).unwrap();
        let dense = BitWordMemory::for_params::<Hqc1Params>();
        let err = mul.multiply(&dense, &[1, 17669]).unwrap_err();
        assert!(matches!(err, Error::PositionOutOfRange { position: 17669, .. }));
        assert!(err.is_dataset_local());
    }

    #[test]
    fn wide_gap_is_a_packing_overflow() {
        let mut mul = Multiplier::<Hqc1Params>::new(Config::default().with_dummy_pairs(0)).unwrap();
        let dense = BitWordMemory::for_params::<Hqc1Params>();
        let err = mul.multiply(&dense, &[0, 2000]).unwrap_err();
        assert!(matches!(err, Error::PackingOverflow { gap: 2000, .. }));
    }
}
