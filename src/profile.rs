//! Profiles (groups of mutually aligned rows) and profile-profile alignment.
//!
//! Two profiles are aligned with the affine engine of [`crate::pairwise`],
//! treating each column as one position. How a pair of columns is scored
//! depends on the [`Scoring`] in use:
//!
//! * with a weight table, the score is the mean table weight over every pair
//!   of rows drawn from the two columns;
//! * with constant scores, every pair of rows is counted as a match, a
//!   mismatch or a gap, and the sum is divided by the number of counted pairs.
//!   Under an affine gap model this count also charges `extend` instead of
//!   `open` when the previous row pair had its gap on the other column.

use crate::alignment::is_gap_char;
use crate::error::{Error, Result};
use crate::pairwise::{align_indices, resolve};
use crate::scoring::{GapModel, MatchScores, Scoring, WeightMatrix};
use itertools::Itertools;
use log::debug;

/// A set of aligned rows of identical length.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    rows: Vec<Vec<u8>>,
}

impl Profile {
    /// A profile holding a single sequence.
    #[must_use]
    pub fn singleton(sequence: Vec<u8>) -> Self {
        Self {
            rows: vec![sequence],
        }
    }

    /// Wraps already aligned rows, which must be non-empty and equally long.
    pub fn from_rows(rows: Vec<Vec<u8>>) -> Result<Self> {
        if rows.is_empty() {
            return Err(Error::InvalidInput("a profile needs at least one row".to_string()));
        }
        if !rows.iter().map(Vec::len).all_equal() {
            return Err(Error::InvalidInput(
                "profile rows have different lengths".to_string(),
            ));
        }
        Ok(Self { rows })
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<u8>] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Vec<u8>> {
        self.rows
    }

    /// The profile transposed into columns.
    fn columns(&self) -> Vec<Vec<u8>> {
        (0..self.num_columns())
            .map(|col| self.rows.iter().map(|row| row[col]).collect())
            .collect()
    }
}

/// Count-based column score under a linear gap model.
///
/// Pairs of two gaps are skipped; the result is 0 when nothing was counted.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn count_score(column_a: &[u8], column_b: &[u8], scores: &MatchScores, gap: f64) -> f64 {
    let mut score = 0.0;
    let mut count = 0usize;
    for (&a, &b) in column_a.iter().cartesian_product(column_b) {
        let (gap_a, gap_b) = (is_gap_char(a), is_gap_char(b));
        if gap_a && gap_b {
            continue;
        } else if a == b {
            score += scores.match_score;
        } else if gap_a || gap_b {
            score -= gap;
        } else {
            score -= scores.mismatch;
        }
        count += 1;
    }
    mean(score, count)
}

/// Count-based column score under an affine gap model.
///
/// Row pairs are visited in order (every row of `column_a` against every row
/// of `column_b`). A gap against a symbol costs `extend` when the previous
/// pair had a gap on the opposite side, `open` otherwise. A pair of two gaps
/// is not counted but marks both sides as gapped.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn count_score_affine(
    column_a: &[u8],
    column_b: &[u8],
    scores: &MatchScores,
    open: f64,
    extend: f64,
) -> f64 {
    let mut score = 0.0;
    let mut count = 0usize;
    let (mut prev_gap_a, mut prev_gap_b) = (false, false);
    for (&a, &b) in column_a.iter().cartesian_product(column_b) {
        let (gap_a, gap_b) = (is_gap_char(a), is_gap_char(b));
        if gap_a && gap_b {
            prev_gap_a = true;
            prev_gap_b = true;
            continue;
        } else if a == b {
            score += scores.match_score;
        } else if gap_a || gap_b {
            if (gap_a && prev_gap_b) || (gap_b && prev_gap_a) {
                score -= extend;
            } else {
                score -= open;
            }
        } else {
            score -= scores.mismatch;
        }
        prev_gap_a = gap_a;
        prev_gap_b = gap_b;
        count += 1;
    }
    mean(score, count)
}

/// Mean table weight over every pair of rows of the two columns.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn table_score(column_a: &[u8], column_b: &[u8], table: &WeightMatrix) -> f64 {
    let total: f64 = column_a
        .iter()
        .cartesian_product(column_b)
        .map(|(&a, &b)| table.get(a, b).unwrap_or(0.0))
        .sum();
    mean(total, column_a.len() * column_b.len())
}

#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
fn mean(total: f64, count: usize) -> f64 {
    if count == 0 || total == 0.0 {
        0.0
    } else {
        total / count as f64
    }
}

/// Aligns two profiles and returns the merged profile: the rows of `a`
/// followed by the rows of `b`, gap-padded to a common length.
pub fn align_profiles(
    a: &Profile,
    b: &Profile,
    scoring: &Scoring,
    gaps: &GapModel,
) -> Result<Profile> {
    scoring.check_alphabet(a.rows())?;
    scoring.check_alphabet(b.rows())?;

    let (columns_a, columns_b) = (a.columns(), b.columns());
    let weight = |i: usize, j: usize| -> f64 {
        let (col_a, col_b) = (&columns_a[i], &columns_b[j]);
        match (scoring, gaps) {
            (Scoring::Table(table), _) => table_score(col_a, col_b, table),
            (Scoring::Counts(scores), GapModel::Linear { gap }) => {
                count_score(col_a, col_b, scores, *gap)
            }
            (Scoring::Counts(scores), GapModel::Affine { open, extend }) => {
                count_score_affine(col_a, col_b, scores, *open, *extend)
            }
        }
    };

    let alignment = align_indices(a.num_columns(), b.num_columns(), weight, gaps);
    debug!(
        "Merged profiles of {}x{} and {}x{} into {} columns (score {:.4})",
        a.num_rows(),
        a.num_columns(),
        b.num_rows(),
        b.num_columns(),
        alignment.first.len(),
        alignment.score
    );

    let rows = a
        .rows()
        .iter()
        .map(|row| resolve(row, &alignment.first))
        .chain(b.rows().iter().map(|row| resolve(row, &alignment.second)))
        .collect();

    Profile::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::NUCLEOTIDES;
    use float_cmp::approx_eq;

    fn profile(rows: &[&str]) -> Profile {
        Profile::from_rows(rows.iter().map(|r| r.as_bytes().to_vec()).collect()).unwrap()
    }

    fn dna_table() -> WeightMatrix {
        WeightMatrix::from_constants(NUCLEOTIDES, MatchScores::default(), 1.0)
    }

    #[test]
    fn rejects_ragged_rows() {
        assert!(Profile::from_rows(vec![b"AC".to_vec(), b"A".to_vec()]).is_err());
        assert!(Profile::from_rows(vec![]).is_err());
    }

    #[test]
    fn simple_count_score() {
        let scores = MatchScores::new(1.0, 1.0);
        // A/A match, A/C mismatch, -/A gap, -/C gap
        assert!(approx_eq!(
            f64,
            count_score(b"A-", b"AC", &scores, 2.0),
            (1.0 - 1.0 - 2.0 - 2.0) / 4.0
        ));
        assert!(approx_eq!(f64, count_score(b"--", b"-", &scores, 2.0), 0.0));
        // Score sums to zero.
        assert!(approx_eq!(f64, count_score(b"A", b"AC", &scores, 2.0), 0.0));
    }

    #[test]
    fn affine_count_score_extends_runs() {
        let scores = MatchScores::new(1.0, 1.0);
        // Both gaps sit on the same side, so each one opens.
        assert!(approx_eq!(
            f64,
            count_score_affine(b"--", b"A", &scores, 2.0, 0.5),
            -2.0
        ));
        assert!(approx_eq!(
            f64,
            count_score_affine(b"A-", b"-A", &scores, 2.0, 0.5),
            // A/- opens, A/A matches, -/- is skipped, -/A follows a gap and extends
            (-2.0 + 1.0 - 0.5) / 3.0
        ));
        assert!(approx_eq!(
            f64,
            count_score_affine(b"-", b"-", &scores, 2.0, 0.5),
            0.0
        ));
    }

    #[test]
    fn table_score_is_a_mean() {
        let table = dna_table();
        // A-A 1, A-C -1, --A -1, --C -1
        assert!(approx_eq!(f64, table_score(b"A-", b"AC", &table), -0.5));
        assert!(approx_eq!(f64, table_score(b"-", b"-", &table), 0.0));
    }

    #[test]
    fn all_zero_table_scores_zero() {
        let zero = WeightMatrix::from_constants(NUCLEOTIDES, MatchScores::new(0.0, 0.0), 0.0);
        assert_eq!(table_score(b"AC-", b"GT", &zero), 0.0);
        assert_eq!(table_score(b"--", b"-", &zero), 0.0);

        let a = Profile::singleton(b"ACGT".to_vec());
        let b = profile(&["AGT", "TTT"]);
        let merged = align_profiles(&a, &b, &Scoring::Table(zero.clone()), &GapModel::default())
            .unwrap();
        assert_eq!(merged.num_rows(), 3);
        assert_eq!(merged.num_columns(), 4);
        assert!(merged.rows().iter().map(Vec::len).all_equal());
        assert_eq!(crate::alignment::strip_gaps(&merged.rows()[1]), b"AGT");
        assert_eq!(crate::alignment::strip_gaps(&merged.rows()[2]), b"TTT");

        // One gap run is the only cost left.
        let (columns_a, columns_b) = (a.columns(), b.columns());
        let alignment = align_indices(
            a.num_columns(),
            b.num_columns(),
            |i, j| table_score(&columns_a[i], &columns_b[j], &zero),
            &GapModel::default(),
        );
        assert!(alignment.score.is_finite());
        assert!(approx_eq!(f64, alignment.score, -1.0));
    }

    #[test]
    fn merged_profile_keeps_row_order_and_length() {
        let a = profile(&["ACGT", "AC-T"]);
        let b = profile(&["AGT", "CGT", "AGA"]);
        for scoring in [
            Scoring::Table(dna_table()),
            Scoring::Counts(MatchScores::default()),
        ] {
            for gaps in [GapModel::default(), GapModel::Linear { gap: 1.0 }] {
                let merged = align_profiles(&a, &b, &scoring, &gaps).unwrap();
                assert_eq!(merged.num_rows(), 5);
                assert!(merged.num_columns() >= 4);
                assert!(merged.rows().iter().map(Vec::len).all_equal());
                let stripped: Vec<Vec<u8>> = merged
                    .rows()
                    .iter()
                    .map(|r| crate::alignment::strip_gaps(r))
                    .collect();
                assert_eq!(stripped[0], b"ACGT");
                assert_eq!(stripped[1], b"ACT");
                assert_eq!(stripped[2], b"AGT");
                assert_eq!(stripped[3], b"CGT");
                assert_eq!(stripped[4], b"AGA");
            }
        }
    }

    #[test]
    fn previous_gaps_are_preserved() {
        let a = profile(&["AC-T", "ACGT"]);
        let b = Profile::singleton(b"ACGT".to_vec());
        let merged = align_profiles(&a, &b, &Scoring::Table(dna_table()), &GapModel::default())
            .unwrap();
        assert_eq!(
            merged.into_rows(),
            vec![b"AC-T".to_vec(), b"ACGT".to_vec(), b"ACGT".to_vec()]
        );
    }

    #[test]
    fn singleton_profiles_align_like_sequences() {
        let a = Profile::singleton(b"ACGT".to_vec());
        let b = Profile::singleton(b"ACT".to_vec());
        let merged = align_profiles(&a, &b, &Scoring::Table(dna_table()), &GapModel::default())
            .unwrap();
        assert_eq!(merged.rows()[0], b"ACGT");
        assert_eq!(merged.rows()[1], b"AC-T");
    }

    #[test]
    fn unknown_symbol_fails_before_alignment() {
        let a = Profile::singleton(b"ACGT".to_vec());
        let b = Profile::singleton(b"ACXT".to_vec());
        let result = align_profiles(&a, &b, &Scoring::Table(dna_table()), &GapModel::default());
        assert!(matches!(
            result,
            Err(Error::IncompatibleAlphabet { symbol: 'X' })
        ));
    }
}
