//! Pairwise distance matrix built from global alignment scores.

use crate::error::{Error, Result};
use crate::pairwise::align;
use crate::scoring::{GapModel, SubstitutionScore};
use itertools::Itertools;
use log::trace;
use rayon::prelude::*;
use std::ops::Index;

/// A symmetric `n x n` matrix of dissimilarities between sequences.
///
/// `d(i, j) = 1 - score(i, j) / max(len(i), len(j))`. Values below zero are
/// possible when the alignment score exceeds the longer length. The diagonal
/// is stored as 0 and carries no meaning.
#[derive(Clone, Debug, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    /// Aligns every unordered pair of `sequences` and converts the scores
    /// into distances.
    #[allow(clippy::cast_precision_loss)]
    pub fn build<S, W>(sequences: &[S], substitution: &W, gaps: &GapModel) -> Result<Self>
    where
        S: AsRef<[u8]> + Sync,
        W: SubstitutionScore + ?Sized,
    {
        if sequences.is_empty() {
            return Err(Error::InvalidInput("no sequences to compare".to_string()));
        }
        if let Some(idx) = sequences.iter().position(|s| s.as_ref().is_empty()) {
            return Err(Error::InvalidInput(format!("sequence {idx} is empty")));
        }

        let size = sequences.len();
        let pairs: Vec<(usize, usize)> = (0..size).tuple_combinations().collect();
        let distances: Vec<f64> = pairs
            .par_iter()
            .map(|&(i, j)| {
                let (x, y) = (sequences[i].as_ref(), sequences[j].as_ref());
                let alignment = align(x, y, substitution, gaps);
                trace!(
                    "Aligned sequences {i} and {j} (score {:.4}):\n{}\n{}",
                    alignment.score,
                    String::from_utf8_lossy(&alignment.first),
                    String::from_utf8_lossy(&alignment.second)
                );
                1.0 - alignment.score / x.len().max(y.len()) as f64
            })
            .collect();

        let mut values = vec![0.0; size * size];
        for (&(i, j), &d) in pairs.iter().zip_eq(&distances) {
            trace!("Distance between sequences {i} and {j}: {d:.4}");
            values[i * size + j] = d;
            values[j * size + i] = d;
        }

        Ok(Self { size, values })
    }

    /// Wraps precomputed row-major values.
    #[cfg(test)]
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let size = rows.len();
        if size == 0 {
            return Err(Error::InvalidInput("empty distance matrix".to_string()));
        }
        if rows.iter().any(|row| row.len() != size) {
            return Err(Error::InvalidInput(
                "distance matrix must be square".to_string(),
            ));
        }
        for i in 0..size {
            for j in 0..i {
                if rows[i][j] != rows[j][i] {
                    return Err(Error::InvalidInput(format!(
                        "distance matrix is not symmetric at ({i}, {j})"
                    )));
                }
            }
        }
        Ok(Self {
            size,
            values: rows.concat(),
        })
    }

    /// Number of sequences.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Rows of the matrix as owned vectors.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.values.chunks(self.size).map(<[f64]>::to_vec).collect()
    }
}

impl Index<(usize, usize)> for DistanceMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.values[i * self.size + j]
    }
}
