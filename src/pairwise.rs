//! Global pairwise alignment with affine gap penalties.
//!
//! Three score tables are filled row by row: `M` holds the value of each
//! cell, `Ix` the best score ending in a gap that consumes a position of the
//! first sequence only and `Iy` the symmetric case for the second sequence.
//!
//! ```text
//! Ix[i][j] = max(Ix[i-1][j] - extend, M[i-1][j] - open)
//! Iy[i][j] = max(Iy[i][j-1] - extend, M[i][j-1] - open)
//! M[i][j]  = max(M[i-1][j-1] + w(i, j), Ix[i][j], Iy[i][j])
//! ```
//!
//! The diagonal step always continues from `M`. Ties between the three
//! candidates resolve as diagonal, then vertical, then horizontal.

use crate::alignment::GAP;
use crate::scoring::{GapModel, SubstitutionScore};
use std::ops::Index;

/// The move recorded for a cell of the dynamic programming table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Both positions are aligned to each other.
    Diagonal,
    /// The first sequence's position is aligned to a gap.
    Up,
    /// The second sequence's position is aligned to a gap.
    Left,
}

/// A dense row-major table of scores.
#[derive(Clone, Debug, PartialEq)]
struct ScoreMatrix {
    cols: usize,
    cells: Vec<f64>,
}

impl ScoreMatrix {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            cells: vec![0.0; rows * cols],
        }
    }

    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.cells[i * self.cols + j] = value;
    }
}

impl Index<(usize, usize)> for ScoreMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.cells[i * self.cols + j]
    }
}

/// An alignment expressed as positions into the two inputs, `None` marking a gap.
#[derive(Clone, Debug)]
pub struct IndexAlignment {
    pub first: Vec<Option<usize>>,
    pub second: Vec<Option<usize>>,
    pub score: f64,
}

/// A pairwise alignment of two concrete sequences.
#[derive(Clone, Debug)]
pub struct PairwiseAlignment {
    pub first: Vec<u8>,
    pub second: Vec<u8>,
    pub score: f64,
}

/// Aligns two abstract sequences of length `len1` and `len2` whose
/// positions are compared by `weight(i, j)`.
pub fn align_indices<F>(len1: usize, len2: usize, mut weight: F, gaps: &GapModel) -> IndexAlignment
where
    F: FnMut(usize, usize) -> f64,
{
    let (open, extend) = (gaps.open(), gaps.extend());
    let cols = len2 + 1;

    let mut m = ScoreMatrix::new(len1 + 1, cols);
    let mut trace = vec![Direction::Diagonal; (len1 + 1) * cols];

    for i in 1..=len1 {
        m.set(i, 0, -gaps.run_cost(i));
        trace[i * cols] = Direction::Up;
    }
    for j in 1..=len2 {
        m.set(0, j, -gaps.run_cost(j));
        trace[j] = Direction::Left;
    }

    // Ix of the previous row; a vertical gap cannot start above row 0.
    let mut ix_prev = vec![f64::NEG_INFINITY; cols];
    let mut ix_row = vec![f64::NEG_INFINITY; cols];

    for i in 1..=len1 {
        ix_row[0] = -gaps.run_cost(i);
        // Iy of the current row, carried left to right.
        let mut iy = f64::NEG_INFINITY;

        for j in 1..=len2 {
            let diagonal = m[(i - 1, j - 1)] + weight(i - 1, j - 1);
            let ix = (ix_prev[j] - extend).max(m[(i - 1, j)] - open);
            iy = (iy - extend).max(m[(i, j - 1)] - open);
            ix_row[j] = ix;

            let (value, direction) = if diagonal >= ix && diagonal >= iy {
                (diagonal, Direction::Diagonal)
            } else if ix >= iy {
                (ix, Direction::Up)
            } else {
                (iy, Direction::Left)
            };
            m.set(i, j, value);
            trace[i * cols + j] = direction;
        }

        std::mem::swap(&mut ix_prev, &mut ix_row);
    }

    let (first, second) = traceback(&trace, len1, len2);
    let score = m[(len1, len2)];

    IndexAlignment {
        first,
        second,
        score,
    }
}

fn traceback(
    trace: &[Direction],
    len1: usize,
    len2: usize,
) -> (Vec<Option<usize>>, Vec<Option<usize>>) {
    let cols = len2 + 1;
    let capacity = len1 + len2;
    let mut first = Vec::with_capacity(capacity);
    let mut second = Vec::with_capacity(capacity);
    let (mut i, mut j) = (len1, len2);

    while i > 0 && j > 0 {
        match trace[i * cols + j] {
            Direction::Diagonal => {
                first.push(Some(i - 1));
                second.push(Some(j - 1));
                i -= 1;
                j -= 1;
            }
            Direction::Up => {
                first.push(Some(i - 1));
                second.push(None);
                i -= 1;
            }
            Direction::Left => {
                first.push(None);
                second.push(Some(j - 1));
                j -= 1;
            }
        }
    }
    while i > 0 {
        first.push(Some(i - 1));
        second.push(None);
        i -= 1;
    }
    while j > 0 {
        first.push(None);
        second.push(Some(j - 1));
        j -= 1;
    }

    first.reverse();
    second.reverse();
    (first, second)
}

/// Substitutes each aligned position with the symbol of `row`, or a gap.
#[must_use]
pub fn resolve(row: &[u8], positions: &[Option<usize>]) -> Vec<u8> {
    positions
        .iter()
        .map(|pos| pos.map_or(GAP, |p| row[p]))
        .collect()
}

/// Globally aligns two sequences, scoring symbol pairs with `substitution`.
pub fn align<S>(seq1: &[u8], seq2: &[u8], substitution: &S, gaps: &GapModel) -> PairwiseAlignment
where
    S: SubstitutionScore + ?Sized,
{
    let alignment = align_indices(
        seq1.len(),
        seq2.len(),
        |i, j| substitution.substitution(seq1[i], seq2[j]),
        gaps,
    );

    PairwiseAlignment {
        first: resolve(seq1, &alignment.first),
        second: resolve(seq2, &alignment.second),
        score: alignment.score,
    }
}
