//! Dataset rows.
//!
//! One dataset per line index across three streams: the sparse exponents, the
//! dense operand's 1-positions and the expected product's 1-positions, each a
//! comma-separated list of integers.

use std::io::{BufRead, Lines};

use crate::{
    dummy::PackedSparseWord,
    error::{Error, Result},
    param::EXPONENT_BITS,
};

/// Parse one comma-separated row of positions.
pub fn parse_row(line: &str, context: &str) -> Result<Vec<u32>> {
    let line = line.trim();
    if line.is_empty() {
        return Err(Error::malformed(context, "empty row"));
    }
    line.split(',')
        .map(|token| {
            let token = token.trim();
            token
                .parse::<u32>()
                .map_err(|e| Error::malformed(context, format!("bad token {token:?}: {e}")))
        })
        .collect()
}

/// Render positions as a row.
pub fn format_row(positions: &[u32]) -> String {
    positions
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Sparse exponents as memory-image lines, one `EXPONENT_BITS`-wide binary
/// exponent per line, MSB first.
pub fn exponent_lines(positions: &[u32]) -> Result<Vec<String>> {
    let width = EXPONENT_BITS as usize;
    positions
        .iter()
        .map(|&position| {
            if position >> EXPONENT_BITS != 0 {
                return Err(Error::PositionOutOfRange {
                    position,
                    total_bits: 1 << width,
                });
            }
            Ok(format!("{position:0width$b}"))
        })
        .collect()
}

/// Packed sparse words as 32-bit binary memory-image lines, MSB first.
pub fn packed_lines(words: &[PackedSparseWord]) -> Vec<String> {
    words.iter().map(|w| format!("{:032b}", w.to_bits())).collect()
}

/// One multiply-and-verify case.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dataset {
    /// Zero-based row index
    pub index: usize,
    /// Sparse exponents
    pub sparse: Vec<u32>,
    /// Dense operand 1-positions
    pub dense: Vec<u32>,
    /// Expected product 1-positions
    pub expected: Vec<u32>,
}

/// Iterator over datasets read row by row from three streams.
///
/// A row that fails to parse yields its error and iteration continues with the
/// next row. Streams of unequal length end iteration with a final error.
pub struct Datasets<S, D, E> {
    sparse: Lines<S>,
    dense: Lines<D>,
    expected: Lines<E>,
    index: usize,
    done: bool,
}

/// Zip three row streams into datasets.
pub fn datasets<S: BufRead, D: BufRead, E: BufRead>(
    sparse: S,
    dense: D,
    expected: E,
) -> Datasets<S, D, E> {
    Datasets {
        sparse: sparse.lines(),
        dense: dense.lines(),
        expected: expected.lines(),
        index: 0,
        done: false,
    }
}

impl<S: BufRead, D: BufRead, E: BufRead> Datasets<S, D, E> {
    fn row(&self, kind: &str) -> String {
        format!("{kind} row {}", self.index)
    }

    fn parse(&self, line: std::io::Result<String>, kind: &str) -> Result<Vec<u32>> {
        parse_row(&line?, &self.row(kind))
    }

    fn dataset(
        &self,
        sparse: std::io::Result<String>,
        dense: std::io::Result<String>,
        expected: std::io::Result<String>,
    ) -> Result<Dataset> {
        Ok(Dataset {
            index: self.index,
            sparse: self.parse(sparse, "sparse")?,
            dense: self.parse(dense, "dense")?,
            expected: self.parse(expected, "expected")?,
        })
    }
}

impl<S: BufRead, D: BufRead, E: BufRead> Iterator for Datasets<S, D, E> {
    type Item = Result<Dataset>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let rows = (self.sparse.next(), self.dense.next(), self.expected.next());
        let (sparse, dense, expected) = match rows {
            (None, None, None) => {
                self.done = true;
                return None;
            }
            (Some(s), Some(d), Some(e)) => (s, d, e),
            (s, d, e) => {
                self.done = true;
                let streams = [
                    ("sparse", s.is_none()),
                    ("dense", d.is_none()),
                    ("expected", e.is_none()),
                ];
                let missing: Vec<&str> = streams
                    .into_iter()
                    .filter_map(|(name, absent)| absent.then_some(name))
                    .collect();
                return Some(Err(Error::malformed(
                    format!("row {}", self.index),
                    format!("truncated input: no {} row", missing.join("/")),
                )));
            }
        };

        let result = self.dataset(sparse, dense, expected);
        self.index += 1;
        Some(result)
    }
}
