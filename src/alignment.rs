//! Gap symbols and summary metrics of a finished alignment.

use itertools::Itertools;

/// The gap symbol written into aligned rows.
pub const GAP: u8 = b'-';

#[inline]
pub const fn is_gap_char(byte: u8) -> bool {
    byte == b'-' || byte == b'.'
}

/// Removes every gap symbol from a previously aligned sequence.
#[must_use]
pub fn strip_gaps(sequence: &[u8]) -> Vec<u8> {
    sequence
        .iter()
        .copied()
        .filter(|&b| !is_gap_char(b))
        .collect()
}

/// Returns `true` when every row has the same, non-gap symbol at `column`.
#[must_use]
pub fn is_conserved_column(rows: &[Vec<u8>], column: usize) -> bool {
    rows.iter()
        .map(|row| row[column])
        .all_equal_value()
        .is_ok_and(|b| !is_gap_char(b))
}

/// Metrics describing a multiple sequence alignment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AlignmentMetrics {
    pub sequence_count: usize,
    pub alignment_length: usize,
    pub conserved_columns: usize,
    pub gap_free_columns: usize,
    pub gap_symbols: usize,
}

impl AlignmentMetrics {
    /// Computes the metrics of equal-length aligned rows.
    #[must_use]
    pub fn from_rows(rows: &[Vec<u8>]) -> Self {
        let alignment_length = rows.first().map_or(0, Vec::len);
        let conserved_columns = (0..alignment_length)
            .filter(|&col| is_conserved_column(rows, col))
            .count();
        let gap_free_columns = (0..alignment_length)
            .filter(|&col| rows.iter().all(|row| !is_gap_char(row[col])))
            .count();
        let gap_symbols = rows
            .iter()
            .map(|row| row.iter().filter(|&&b| is_gap_char(b)).count())
            .sum();

        Self {
            sequence_count: rows.len(),
            alignment_length,
            conserved_columns,
            gap_free_columns,
            gap_symbols,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_both_gap_symbols() {
        assert_eq!(strip_gaps(b"A-C.G--T"), b"ACGT".to_vec());
        assert!(strip_gaps(b"---").is_empty());
    }

    #[test]
    fn conserved_columns() {
        let rows = vec![b"AC-T".to_vec(), b"AG-T".to_vec(), b"AGCT".to_vec()];
        assert!(is_conserved_column(&rows, 0));
        assert!(!is_conserved_column(&rows, 1));
        assert!(!is_conserved_column(&rows, 2));
        assert!(is_conserved_column(&rows, 3));
    }

    #[test]
    fn metrics() {
        let rows = vec![b"AC-T".to_vec(), b"AG-T".to_vec(), b"AGCT".to_vec()];
        let metrics = AlignmentMetrics::from_rows(&rows);
        assert_eq!(
            metrics,
            AlignmentMetrics {
                sequence_count: 3,
                alignment_length: 4,
                conserved_columns: 2,
                gap_free_columns: 3,
                gap_symbols: 2,
            }
        );
        assert_eq!(AlignmentMetrics::from_rows(&[]), AlignmentMetrics::default());
    }
}
