//! Shift window: the accelerator's bounded history of streamed dense words.
//!
//! A fixed-capacity ring buffer. Pushing into a full window evicts the oldest
//! entry. Lookups address entries by position relative to the oldest entry
//! still held, so position `len() - 1` is always the newest word.

use hybrid_array::Array;

use crate::ParameterSet;

/// One buffered dense word and the memory index it was loaded from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowEntry {
    /// Word value
    pub word: u32,
    /// Index of the word in the dense memory
    pub source_index: usize,
}

/// Bounded FIFO of dense words with indexed lookback.
#[derive(Clone, Debug)]
pub struct ShiftWindow<P: ParameterSet> {
    slots: Array<WindowEntry, P::WindowCapacity>,
    head: usize,
    len: usize,
}

impl<P: ParameterSet> Default for ShiftWindow<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: ParameterSet> ShiftWindow<P> {
    /// Empty window.
    pub fn new() -> Self {
        Self {
            slots: Array::default(),
            head: 0,
            len: 0,
        }
    }

    /// Maximum number of entries held.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of entries currently held.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been pushed since the last clear.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every entry. Storage is reused.
    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Append a word, evicting the oldest entry when full.
    #[inline]
    pub fn push(&mut self, word: u32, source_index: usize) {
        let cap = self.capacity();
        let entry = WindowEntry { word, source_index };
        if self.len == cap {
            self.slots[self.head] = entry;
            self.head = (self.head + 1) % cap;
        } else {
            self.slots[(self.head + self.len) % cap] = entry;
            self.len += 1;
        }
    }

    /// Entry at window-relative position `idx` (0 = oldest held).
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&WindowEntry> {
        if idx >= self.len {
            return None;
        }
        Some(&self.slots[(self.head + idx) % self.capacity()])
    }

    /// Word at `idx`; absent history reads as an implicit zero word.
    #[inline]
    pub fn word_at(&self, idx: Option<usize>) -> u32 {
        idx.and_then(|i| self.get(i)).map_or(0, |e| e.word)
    }

    /// The two words at positions `(left, right)`.
    #[inline]
    pub fn pair_at(&self, left: Option<usize>, right: Option<usize>) -> (u32, u32) {
        (self.word_at(left), self.word_at(right))
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &WindowEntry> + '_ {
        (0..self.len).filter_map(move |i| self.get(i))
    }
}
