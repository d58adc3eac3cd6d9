//! Packed bit-vector memory.
//!
//! Backs the dense operand and the accumulator. Bit `p` lives in word
//! `p / 32` at offset `p % 32` (LSB-first). The high
//! `num_words * 32 - total_bits` bits of the final word are padding.

use core::fmt;

use crate::{
    ParameterSet,
    error::{Error, Result},
    param::{WORD_BITS, num_words_for, tail_bits_for, total_bits},
};

/// Fixed-size word memory holding one polynomial over GF(2).
#[derive(Clone, PartialEq, Eq)]
pub struct BitWordMemory {
    total_bits: usize,
    words: Vec<u32>,
}

impl BitWordMemory {
    /// Zeroed memory of `total_bits` bits. Never resized afterwards.
    pub fn new(total_bits: usize) -> Self {
        Self {
            total_bits,
            words: vec![0; num_words_for(total_bits)],
        }
    }

    /// Zeroed memory sized for the parameter set's ring.
    pub fn for_params<P: ParameterSet>() -> Self {
        Self::new(total_bits::<P>())
    }

    /// Memory with the given positions set.
    pub fn from_positions(total_bits: usize, positions: &[u32]) -> Result<Self> {
        let mut mem = Self::new(total_bits);
        mem.set_positions(positions)?;
        Ok(mem)
    }

    /// Number of coefficient bits.
    pub fn total_bits(&self) -> usize {
        self.total_bits
    }

    /// Width of one memory word in bits.
    pub fn word_size(&self) -> usize {
        WORD_BITS as usize
    }

    /// ceil(total_bits / 32)
    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    /// Valid bits held by the final word.
    pub fn tail_bits(&self) -> u32 {
        tail_bits_for(self.total_bits)
    }

    /// Raw word contents, padding included.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Set every listed bit to 1.
    ///
    /// Fails on the first position outside `[0, total_bits)`; earlier
    /// positions of the list stay set.
    pub fn set_positions(&mut self, positions: &[u32]) -> Result<()> {
        for &pos in positions {
            if pos as usize >= self.total_bits {
                return Err(Error::PositionOutOfRange {
                    position: pos,
                    total_bits: self.total_bits,
                });
            }
            self.words[(pos / WORD_BITS) as usize] |= 1 << (pos % WORD_BITS);
        }
        Ok(())
    }

    /// Store consecutive words starting at `start`; words past the end are dropped.
    pub fn set_words(&mut self, start: usize, words: &[u32]) {
        for (slot, &word) in self.words.iter_mut().skip(start).zip(words) {
            *slot = word;
        }
    }

    /// Word at `idx`, or 0 past the end (unloaded memory reads as zero).
    #[inline]
    pub fn word(&self, idx: usize) -> u32 {
        self.words.get(idx).copied().unwrap_or(0)
    }

    /// Overwrite the word at `idx`. Out-of-range writes are ignored.
    #[inline]
    pub fn set_word(&mut self, idx: usize, value: u32) {
        debug_assert!(idx < self.words.len(), "word index {idx} out of range");
        if let Some(slot) = self.words.get_mut(idx) {
            *slot = value;
        }
    }

    /// XOR `value` into the word at `idx` (GF(2) addition).
    #[inline]
    pub fn xor_word(&mut self, idx: usize, value: u32) {
        debug_assert!(idx < self.words.len(), "word index {idx} out of range");
        if let Some(slot) = self.words.get_mut(idx) {
            *slot ^= value;
        }
    }

    /// Bit at `pos`; false past `total_bits`.
    pub fn bit(&self, pos: usize) -> bool {
        if pos >= self.total_bits {
            return false;
        }
        (self.words[pos / WORD_BITS as usize] >> (pos % WORD_BITS as usize)) & 1 == 1
    }

    /// Zero the padding bits of the final word.
    pub fn mask_padding(&mut self) {
        let tail = self.tail_bits();
        if tail < WORD_BITS
            && let Some(last) = self.words.last_mut()
        {
            *last &= (1u32 << tail) - 1;
        }
    }

    /// Ascending positions of all valid 1-bits.
    pub fn positions(&self) -> Vec<u32> {
        let mut out = Vec::new();
        for (i, &word) in self.words.iter().enumerate() {
            let mut w = word;
            while w != 0 {
                let pos = i * WORD_BITS as usize + w.trailing_zeros() as usize;
                if pos < self.total_bits {
                    out.push(pos as u32);
                }
                w &= w - 1;
            }
        }
        out
    }

    /// Hamming weight over the valid range.
    pub fn weight(&self) -> usize {
        self.positions().len()
    }

    /// Reset every word to zero.
    pub fn clear(&mut self) {
        self.words.fill(0);
    }

    /// Each word as a 32-character binary string, MSB first, padding masked.
    pub fn binary_words(&self) -> Vec<String> {
        let last = self.words.len().saturating_sub(1);
        let tail_mask = match self.tail_bits() {
            WORD_BITS => u32::MAX,
            t => (1u32 << t) - 1,
        };
        self.words
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                let w = if i == last { w & tail_mask } else { w };
                format!("{w:032b}")
            })
            .collect()
    }

    /// Memory-image lines for a hardware test bench.
    ///
    /// `width` is 32, 64 or 128. Consecutive 32-bit words are packed
    /// LSB-first into each line and rendered MSB-first; the last line is
    /// zero-extended.
    pub fn mem_lines(&self, width: usize) -> Result<Vec<String>> {
        let per_line = match width {
            32 | 64 | 128 => width / WORD_BITS as usize,
            _ => return Err(Error::InvalidConfig("memory image width must be 32, 64 or 128")),
        };
        let mut masked = self.clone();
        masked.mask_padding();
        Ok(masked
            .words
            .chunks(per_line)
            .map(|chunk| {
                let line: u128 = chunk
                    .iter()
                    .enumerate()
                    .fold(0, |acc, (k, &w)| acc | (u128::from(w) << (k * WORD_BITS as usize)));
                format!("{line:0width$b}")
            })
            .collect())
    }
}

impl fmt::Debug for BitWordMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitWordMemory")
            .field("total_bits", &self.total_bits)
            .field("num_words", &self.words.len())
            .field("weight", &self.weight())
            .finish()
    }
}

impl fmt::Display for BitWordMemory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.binary_words().iter().enumerate() {
            writeln!(f, "Word {i}: {line}")?;
        }
        Ok(())
    }
}
