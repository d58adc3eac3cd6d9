use rand_chacha::rand_core::{RngCore, SeedableRng};

use crate::{
    ParameterSet,
    memory::BitWordMemory,
    param::{WORD_BITS, total_bits},
};

/// Deterministic tiny RNG for repeatable tests
pub struct TestRng {
    rng: rand_chacha::ChaCha8Rng,
}

impl TestRng {
    pub fn new() -> Self {
        Self::with_seed(0xdead_beef)
    }

    pub fn with_seed(seed: u64) -> Self {
        let rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        Self { rng }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    pub fn gen_usize(&mut self, upper: usize) -> usize {
        (self.next_u32() as usize) % upper
    }

    /// `count` distinct positions in `[0, n)`, ascending.
    pub fn sorted_distinct(&mut self, n: usize, count: usize) -> Vec<u32> {
        let mut out: Vec<u32> = Vec::with_capacity(count);
        while out.len() < count {
            let p = self.gen_usize(n) as u32;
            if !out.contains(&p) {
                out.push(p);
            }
        }
        out.sort_unstable();
        out
    }

    /// Dense operand with each bit set with probability `1 / every`.
    pub fn dense_positions(&mut self, n: usize, every: usize) -> Vec<u32> {
        (0..n as u32).filter(|_| self.gen_usize(every) == 0).collect()
    }

    /// Sorted support of `weight` exponents whose consecutive pairs sit in
    /// disjoint segments of `[0, n)`, so each pair's gap is below `width`.
    pub fn segmented_support(&mut self, n: usize, weight: usize, width: usize) -> Vec<u32> {
        let pairs = weight / 2;
        let stride = n / pairs;
        assert!(width <= stride, "segments must not overlap");
        let mut out = Vec::with_capacity(weight);
        for seg in 0..pairs {
            let base = seg * stride;
            let a = self.gen_usize(width);
            let mut b = self.gen_usize(width);
            while b == a {
                b = self.gen_usize(width);
            }
            out.push((base + a.min(b)) as u32);
            out.push((base + a.max(b)) as u32);
        }
        out
    }
}

impl Default for TestRng {
    fn default() -> Self {
        Self::new()
    }
}

/// Dense memory for the parameter set with the given positions set.
pub fn dense_memory<P: ParameterSet>(positions: &[u32]) -> BitWordMemory {
    BitWordMemory::from_positions(total_bits::<P>(), positions).expect("positions in range")
}

/// Bit-by-bit left rotation by `shift` in `x^n + 1`: bit `j` of the result is
/// bit `(j - shift) mod n` of `mem`.
pub fn rotate_bits(mem: &BitWordMemory, shift: usize) -> BitWordMemory {
    let n = mem.total_bits();
    let mut out = BitWordMemory::new(n);
    for j in 0..n {
        if mem.bit((j + n - shift % n) % n) {
            out.xor_word(j / WORD_BITS as usize, 1 << (j % WORD_BITS as usize));
        }
    }
    out
}
