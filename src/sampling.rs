//! Seeded test-vector generation.
//!
//! A SHAKE256 stream keyed by a seed and a domain byte. The sparse support
//! uses HQC's rejection sampler: 24-bit big-endian samples, reject above the
//! largest multiple of `n`, reduce, drop duplicates. Reads are squeezed in
//! 8-byte chunks so the stream position only depends on how many batches
//! were drawn.

use sha3::digest::{ExtendableOutput, Update, XofReader};
use sha3::{Shake256, Shake256Reader};

use crate::{memory::BitWordMemory, param::WORD_BITS};

/// Domain byte for dense operands
pub const DENSE_DOMAIN: u8 = 1;

/// Domain byte for sparse supports
pub const SPARSE_DOMAIN: u8 = 2;

const BARRETT_SHIFT: u64 = 32;

/// Largest multiple of `n` below 2^24.
const fn rejection_threshold_24bit(n: u32) -> u32 {
    let max_24bit = (1u32 << 24) - 1;
    (max_24bit / n) * n
}

/// `x mod n` for `x` below the 24-bit rejection threshold.
#[inline]
fn reduce_mod_n(x: u32, n: u32) -> u32 {
    debug_assert!(x < rejection_threshold_24bit(n));
    let q = (u64::from(x) * ((1u64 << BARRETT_SHIFT) / u64::from(n))) >> BARRETT_SHIFT;
    let res = x - q as u32 * n;
    if res >= n { res - n } else { res }
}

/// SHAKE256-backed sampler.
pub struct VectorSampler {
    reader: Shake256Reader,
}

impl VectorSampler {
    /// Sampler over `SHAKE256(seed || domain)`.
    pub fn new(seed: &[u8], domain: u8) -> Self {
        let mut hasher = Shake256::default();
        hasher.update(seed);
        hasher.update(&[domain]);
        Self {
            reader: hasher.finalize_xof(),
        }
    }

    /// Fill `out`, consuming the stream in whole 8-byte chunks.
    fn squeeze_aligned(&mut self, out: &mut [u8]) {
        const CHUNK: usize = 8;
        let rem = out.len() % CHUNK;
        let main_len = out.len() - rem;
        if main_len > 0 {
            self.reader.read(&mut out[..main_len]);
        }
        if rem != 0 {
            let mut tmp = [0u8; CHUNK];
            self.reader.read(&mut tmp);
            out[main_len..].copy_from_slice(&tmp[..rem]);
        }
    }

    /// Uniform `n`-bit operand; padding bits are zero.
    pub fn dense(&mut self, n: usize) -> BitWordMemory {
        let mut bytes = vec![0u8; n.div_ceil(8)];
        self.squeeze_aligned(&mut bytes);
        let words: Vec<u32> = bytes
            .chunks(WORD_BITS as usize / 8)
            .map(|chunk| {
                let mut le = [0u8; 4];
                le[..chunk.len()].copy_from_slice(chunk);
                u32::from_le_bytes(le)
            })
            .collect();
        let mut mem = BitWordMemory::new(n);
        mem.set_words(0, &words);
        mem.mask_padding();
        mem
    }

    /// `weight` distinct exponents in `[0, n)`, ascending.
    pub fn sparse_support(&mut self, n: u32, weight: usize) -> Vec<u32> {
        debug_assert!(weight as u64 <= u64::from(n));
        let threshold = rejection_threshold_24bit(n);
        let mut batch = vec![0u8; 3 * weight.max(1)];
        let mut byte_idx = batch.len();
        let mut support: Vec<u32> = Vec::with_capacity(weight);

        while support.len() < weight {
            if byte_idx + 3 > batch.len() {
                self.squeeze_aligned(&mut batch);
                byte_idx = 0;
            }
            let sample = (u32::from(batch[byte_idx]) << 16)
                | (u32::from(batch[byte_idx + 1]) << 8)
                | u32::from(batch[byte_idx + 2]);
            byte_idx += 3;

            if sample >= threshold {
                continue;
            }
            let position = reduce_mod_n(sample, n);
            if !support.contains(&position) {
                support.push(position);
            }
        }
        support.sort_unstable();
        support
    }
}

/// Seed of dataset row `index` under `seed`.
pub fn row_seed(seed: u64, index: usize) -> [u8; 16] {
    let mut out = [0u8; 16];
    out[..8].copy_from_slice(&seed.to_le_bytes());
    out[8..].copy_from_slice(&(index as u64).to_le_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barrett_matches_remainder() {
        for n in [100u32, 17669, 35851] {
            let threshold = rejection_threshold_24bit(n);
            for x in (0..threshold).step_by(997).chain([threshold - 1]) {
                assert_eq!(reduce_mod_n(x, n), x % n, "x {x} n {n}");
            }
        }
    }

    #[test]
    fn sparse_support_is_sorted_distinct_and_in_range() {
        let mut sampler = VectorSampler::new(b"support", SPARSE_DOMAIN);
        let support = sampler.sparse_support(17669, 66);
        assert_eq!(support.len(), 66);
        assert!(support.windows(2).all(|w| w[0] < w[1]));
        assert!(support.iter().all(|&p| p < 17669));
    }

    #[test]
    fn same_seed_same_vectors() {
        let seed = row_seed(42, 3);
        let a = VectorSampler::new(&seed, DENSE_DOMAIN).dense(17669);
        let b = VectorSampler::new(&seed, DENSE_DOMAIN).dense(17669);
        assert_eq!(a, b);
        let c = VectorSampler::new(&row_seed(42, 4), DENSE_DOMAIN).dense(17669);
        assert_ne!(a, c);
    }

    #[test]
    fn dense_padding_is_clear() {
        let dense = VectorSampler::new(b"pad", DENSE_DOMAIN).dense(17669);
        assert_eq!(dense.words().len(), 553);
        assert_eq!(dense.words()[552] >> 5, 0);
        // roughly half the bits set
        let weight = dense.weight();
        assert!((8000..9700).contains(&weight), "weight {weight}");
    }
}
