//! Reference product over GF(2)[x]/(x^n + 1).
//!
//! Bit-level, no windowing, no word boundaries: the oracle the streaming
//! engine is checked against.

use crate::{
    error::{Error, Result},
    memory::BitWordMemory,
};

fn check_sparse(n: usize, sparse: &[u32]) -> Result<()> {
    match sparse.iter().find(|&&p| p as usize >= n) {
        Some(&position) => Err(Error::PositionOutOfRange {
            position,
            total_bits: n,
        }),
        None => Ok(()),
    }
}

/// `Σ x^p · dense mod (x^n + 1)` by rotating the dense support.
pub fn cyclic_product(dense: &BitWordMemory, sparse: &[u32]) -> Result<BitWordMemory> {
    let n = dense.total_bits();
    check_sparse(n, sparse)?;
    let support = dense.positions();
    let mut out = BitWordMemory::new(n);
    for &p in sparse {
        for &q in &support {
            let pos = (p as usize + q as usize) % n;
            out.xor_word(pos / 32, 1 << (pos % 32));
        }
    }
    Ok(out)
}

/// Same product as a full convolution of degree `< 2n - 1`, then one fold of
/// the upper half onto the lower.
pub fn fold_product(dense: &BitWordMemory, sparse: &[u32]) -> Result<BitWordMemory> {
    let n = dense.total_bits();
    check_sparse(n, sparse)?;
    let support = dense.positions();
    let mut full = BitWordMemory::new(2 * n);
    for &p in sparse {
        for &q in &support {
            let pos = p as usize + q as usize;
            full.xor_word(pos / 32, 1 << (pos % 32));
        }
    }
    let mut out = BitWordMemory::new(n);
    for pos in full.positions() {
        let pos = pos as usize % n;
        out.xor_word(pos / 32, 1 << (pos % 32));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::TestRng;

    #[test]
    fn concrete_product() {
        let dense = BitWordMemory::from_positions(17669, &[0, 1, 16]).unwrap();
        let out = cyclic_product(&dense, &[5, 100]).unwrap();
        assert_eq!(out.positions(), vec![5, 6, 21, 100, 101, 116]);
    }

    #[test]
    fn wraps_modulo_n() {
        let dense = BitWordMemory::from_positions(17669, &[17668]).unwrap();
        let out = cyclic_product(&dense, &[1, 2]).unwrap();
        assert_eq!(out.positions(), vec![0, 1]);
    }

    #[test]
    fn rotation_and_fold_agree() {
        let mut rng = TestRng::new();
        for n in [100usize, 17669] {
            let dense = BitWordMemory::from_positions(n, &rng.dense_positions(n, 2)).unwrap();
            let sparse = rng.sorted_distinct(n, 10);
            assert_eq!(
                cyclic_product(&dense, &sparse).unwrap(),
                fold_product(&dense, &sparse).unwrap()
            );
        }
    }

    #[test]
    fn rejects_out_of_range_exponent() {
        let dense = BitWordMemory::new(100);
        assert!(matches!(
            cyclic_product(&dense, &[3, 100]),
            Err(Error::PositionOutOfRange { position: 100, .. })
        ));
    }
}
