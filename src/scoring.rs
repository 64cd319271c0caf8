//! Scoring schemes: gap penalties, constant match/mismatch scores and
//! symbol-pair weight matrices.

use crate::alignment::GAP;
use crate::error::{Error, Result};
use itertools::Itertools;

const NUM_SYMBOLS: usize = 1 + (u8::MAX as usize);

/// Nucleotide alphabet used for constant-derived weight tables.
pub const NUCLEOTIDES: &[u8] = b"ATGC";

const BLOSUM62_SYMBOLS: &[u8] = b"ARNDCQEGHILKMFPSTWYVBZX";

/// Offset added to every BLOSUM62 entry so that residue pairs outscore gaps.
const BLOSUM62_SHIFT: f64 = 5.0;

#[rustfmt::skip]
const BLOSUM62: [[i8; 23]; 23] = [
    //A   R   N   D   C   Q   E   G   H   I   L   K   M   F   P   S   T   W   Y   V   B   Z   X
    [ 4, -1, -2, -2,  0, -1, -1,  0, -2, -1, -1, -1, -1, -2, -1,  1,  0, -3, -2,  0, -2, -1,  0], // A
    [-1,  5,  0, -2, -3,  1,  0, -2,  0, -3, -2,  2, -1, -3, -2, -1, -1, -3, -2, -3, -1,  0, -1], // R
    [-2,  0,  6,  1, -3,  0,  0,  0,  1, -3, -3,  0, -2, -3, -2,  1,  0, -4, -2, -3,  3,  0, -1], // N
    [-2, -2,  1,  6, -3,  0,  2, -1, -1, -3, -4, -1, -3, -3, -1,  0, -1, -4, -3, -3,  4,  1, -1], // D
    [ 0, -3, -3, -3,  9, -3, -4, -3, -3, -1, -1, -3, -1, -2, -3, -1, -1, -2, -2, -1, -3, -3, -2], // C
    [-1,  1,  0,  0, -3,  5,  2, -2,  0, -3, -2,  1,  0, -3, -1,  0, -1, -2, -1, -2,  0,  3, -1], // Q
    [-1,  0,  0,  2, -4,  2,  5, -2,  0, -3, -3,  1, -2, -3, -1,  0, -1, -3, -2, -2,  1,  4, -1], // E
    [ 0, -2,  0, -1, -3, -2, -2,  6, -2, -4, -4, -2, -3, -3, -2,  0, -2, -2, -3, -3, -1, -2, -1], // G
    [-2,  0,  1, -1, -3,  0,  0, -2,  8, -3, -3, -1, -2, -1, -2, -1, -2, -2,  2, -3,  0,  0, -1], // H
    [-1, -3, -3, -3, -1, -3, -3, -4, -3,  4,  2, -3,  1,  0, -3, -2, -1, -3, -1,  3, -3, -3, -1], // I
    [-1, -2, -3, -4, -1, -2, -3, -4, -3,  2,  4, -2,  2,  0, -3, -2, -1, -2, -1,  1, -4, -3, -1], // L
    [-1,  2,  0, -1, -3,  1,  1, -2, -1, -3, -2,  5, -1, -3, -1,  0, -1, -3, -2, -2,  0,  1, -1], // K
    [-1, -1, -2, -3, -1,  0, -2, -3, -2,  1,  2, -1,  5,  0, -2, -1, -1, -1, -1,  1, -3, -1, -1], // M
    [-2, -3, -3, -3, -2, -3, -3, -3, -1,  0,  0, -3,  0,  6, -4, -2, -2,  1,  3, -1, -3, -3, -1], // F
    [-1, -2, -2, -1, -3, -1, -1, -2, -2, -3, -3, -1, -2, -4,  7, -1, -1, -4, -3, -2, -2, -1, -2], // P
    [ 1, -1,  1,  0, -1,  0,  0,  0, -1, -2, -2,  0, -1, -2, -1,  4,  1, -3, -2, -2,  0,  0,  0], // S
    [ 0, -1,  0, -1, -1, -1, -1, -2, -2, -1, -1, -1, -1, -2, -1,  1,  5, -2, -2,  0, -1, -1,  0], // T
    [-3, -3, -4, -4, -2, -2, -3, -2, -2, -3, -2, -3, -1,  1, -4, -3, -2, 11,  2, -3, -4, -3, -2], // W
    [-2, -2, -2, -3, -2, -1, -2, -3,  2, -1, -1, -2, -1,  3, -3, -2, -2,  2,  7, -1, -3, -2, -1], // Y
    [ 0, -3, -3, -3, -1, -2, -2, -3, -3,  3,  1, -2,  1, -1, -2, -2,  0, -3, -1,  4, -3, -2, -1], // V
    [-2, -1,  3,  4, -3,  0,  1, -1,  0, -3, -4,  0, -3, -3, -2,  0, -1, -4, -3, -3,  4,  1, -1], // B
    [-1,  0,  0,  1, -3,  3,  4, -2,  0, -3, -3,  1, -1, -3, -1,  0, -1, -3, -2, -2,  1,  4, -1], // Z
    [ 0, -1, -1, -1, -2, -1, -1, -1, -1, -1, -1, -1, -1, -1, -2,  0,  0, -2, -1, -1, -1, -1, -1], // X
];

/// The kind of sequences being aligned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Molecule {
    #[default]
    Dna,
    Protein,
}

impl std::fmt::Display for Molecule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dna => write!(f, "DNA"),
            Self::Protein => write!(f, "protein"),
        }
    }
}

impl std::str::FromStr for Molecule {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dna" => Ok(Self::Dna),
            "protein" => Ok(Self::Protein),
            _ => Err(format!("invalid molecule '{s}': must be 'DNA' or 'protein'")),
        }
    }
}

impl Molecule {
    /// The weight table for this molecule: constant-derived for nucleotides,
    /// BLOSUM62 for proteins.
    #[must_use]
    pub fn weight_matrix(self, scores: MatchScores, gap: f64) -> WeightMatrix {
        match self {
            Self::Dna => WeightMatrix::from_constants(NUCLEOTIDES, scores, gap),
            Self::Protein => WeightMatrix::blosum62(),
        }
    }
}

/// How profile columns are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnScoring {
    /// Mean weight-table score over all row pairs.
    #[default]
    Table,
    /// Match, mismatch and gap counts over all row pairs.
    Counts,
}

impl std::fmt::Display for ColumnScoring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Counts => write!(f, "counts"),
        }
    }
}

impl std::str::FromStr for ColumnScoring {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "table" => Ok(Self::Table),
            "counts" => Ok(Self::Counts),
            _ => Err(format!(
                "invalid column scoring '{s}': must be 'table' or 'counts'"
            )),
        }
    }
}

/// Gap penalties, expressed as positive costs that are subtracted from the score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GapModel {
    /// Every gap position costs the same.
    Linear { gap: f64 },
    /// The first position of a gap run costs `open`, every further one `extend`.
    Affine { open: f64, extend: f64 },
}

impl Default for GapModel {
    fn default() -> Self {
        Self::Affine {
            open: 1.0,
            extend: 0.5,
        }
    }
}

impl GapModel {
    /// Cost of opening a gap run.
    #[must_use]
    pub fn open(&self) -> f64 {
        match *self {
            Self::Linear { gap } => gap,
            Self::Affine { open, .. } => open,
        }
    }

    /// Cost of each additional position of a gap run.
    #[must_use]
    pub fn extend(&self) -> f64 {
        match *self {
            Self::Linear { gap } => gap,
            Self::Affine { extend, .. } => extend,
        }
    }

    /// Total cost of a run of `length` consecutive gap positions.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn run_cost(&self, length: usize) -> f64 {
        if length == 0 {
            0.0
        } else {
            self.open() + (length - 1) as f64 * self.extend()
        }
    }

    /// Rejects non-positive or non-finite gap costs.
    pub fn validate(&self) -> Result<()> {
        let (open, extend) = (self.open(), self.extend());
        if !open.is_finite() || open <= 0.0 {
            return Err(Error::ParameterError(format!(
                "gap opening penalty must be positive, got {open}"
            )));
        }
        if !extend.is_finite() || extend <= 0.0 {
            return Err(Error::ParameterError(format!(
                "gap extension penalty must be positive, got {extend}"
            )));
        }
        Ok(())
    }
}

/// Scores a pair of (non-gap) symbols.
pub trait SubstitutionScore: Sync {
    fn substitution(&self, a: u8, b: u8) -> f64;
}

/// Constant match bonus and mismatch penalty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchScores {
    pub match_score: f64,
    pub mismatch: f64,
}

impl Default for MatchScores {
    fn default() -> Self {
        Self {
            match_score: 1.0,
            mismatch: 1.0,
        }
    }
}

impl MatchScores {
    #[must_use]
    pub const fn new(match_score: f64, mismatch: f64) -> Self {
        Self {
            match_score,
            mismatch,
        }
    }
}

impl SubstitutionScore for MatchScores {
    #[inline]
    fn substitution(&self, a: u8, b: u8) -> f64 {
        if a == b {
            self.match_score
        } else {
            -self.mismatch
        }
    }
}

/// A symmetric table of scores for every defined pair of symbols, gap included.
#[derive(Clone)]
pub struct WeightMatrix {
    scores: Vec<Option<f64>>,
}

impl Default for WeightMatrix {
    fn default() -> Self {
        Self {
            scores: vec![None; NUM_SYMBOLS * NUM_SYMBOLS],
        }
    }
}

impl std::fmt::Debug for WeightMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let defined = self.scores.iter().filter(|s| s.is_some()).count();
        f.debug_struct("WeightMatrix")
            .field("defined_pairs", &defined)
            .finish()
    }
}

impl WeightMatrix {
    /// Sets the score of `(a, b)` and `(b, a)`.
    #[must_use]
    pub fn with_score(mut self, a: u8, b: u8, score: f64) -> Self {
        self.scores[index(a, b)] = Some(score);
        self.scores[index(b, a)] = Some(score);
        self
    }

    /// Builds a table over `alphabet` from constant scores: `match` on the
    /// diagonal, `-mismatch` off it, `-gap` against a gap and 0 for two gaps.
    #[must_use]
    pub fn from_constants(alphabet: &[u8], scores: MatchScores, gap: f64) -> Self {
        let mut matrix = Self::default().with_score(GAP, GAP, 0.0);
        for (&a, &b) in alphabet.iter().cartesian_product(alphabet) {
            matrix = matrix.with_score(a, b, scores.substitution(a, b));
        }
        for &a in alphabet {
            matrix = matrix.with_score(a, GAP, -gap);
        }
        matrix
    }

    /// BLOSUM62 shifted by a constant so that every residue pair scores
    /// non-negative; gaps score 0 against anything.
    #[must_use]
    pub fn blosum62() -> Self {
        let mut matrix = Self::default().with_score(GAP, GAP, 0.0);
        for (i, &a) in BLOSUM62_SYMBOLS.iter().enumerate() {
            for (j, &b) in BLOSUM62_SYMBOLS.iter().enumerate() {
                matrix = matrix.with_score(a, b, f64::from(BLOSUM62[i][j]) + BLOSUM62_SHIFT);
            }
            matrix = matrix.with_score(a, GAP, 0.0);
        }
        matrix
    }

    /// Looks up the score of a symbol pair.
    #[inline]
    #[must_use]
    pub fn get(&self, a: u8, b: u8) -> Option<f64> {
        self.scores[index(a, b)]
    }

    /// Checks that every symbol of every sequence is scored against itself and
    /// against a gap in both orders.
    pub fn check_alphabet<S: AsRef<[u8]>>(&self, sequences: &[S]) -> Result<()> {
        let mut seen = [false; NUM_SYMBOLS];
        for &symbol in sequences.iter().flat_map(|s| s.as_ref()) {
            if std::mem::replace(&mut seen[symbol as usize], true) {
                continue;
            }
            let defined = self.get(symbol, symbol).is_some()
                && self.get(symbol, GAP).is_some()
                && self.get(GAP, symbol).is_some();
            if !defined {
                return Err(Error::IncompatibleAlphabet {
                    symbol: char::from(symbol),
                });
            }
        }
        Ok(())
    }
}

impl SubstitutionScore for WeightMatrix {
    /// Undefined pairs score 0; run [`WeightMatrix::check_alphabet`] on the
    /// inputs first.
    #[inline]
    fn substitution(&self, a: u8, b: u8) -> f64 {
        self.get(a, b).unwrap_or(0.0)
    }
}

/// How symbol pairs and profile columns are scored.
#[derive(Clone, Debug)]
pub enum Scoring {
    /// Constant scores; profile columns are compared by counting agreements.
    Counts(MatchScores),
    /// A weight table; profile columns are compared by their mean pair weight.
    Table(WeightMatrix),
}

impl Scoring {
    /// Chooses the scoring for a run from its command-line settings.
    #[must_use]
    pub fn new(
        molecule: Molecule,
        columns: ColumnScoring,
        scores: MatchScores,
        gaps: &GapModel,
    ) -> Self {
        match columns {
            ColumnScoring::Table => Self::Table(molecule.weight_matrix(scores, gaps.open())),
            ColumnScoring::Counts => Self::Counts(scores),
        }
    }

    /// Checks the symbols of `sequences` against the weight table, if any.
    pub fn check_alphabet<S: AsRef<[u8]>>(&self, sequences: &[S]) -> Result<()> {
        match self {
            Self::Counts(_) => Ok(()),
            Self::Table(table) => table.check_alphabet(sequences),
        }
    }
}

impl SubstitutionScore for Scoring {
    #[inline]
    fn substitution(&self, a: u8, b: u8) -> f64 {
        match self {
            Self::Counts(scores) => scores.substitution(a, b),
            Self::Table(table) => table.substitution(a, b),
        }
    }
}

#[inline]
const fn index(a: u8, b: u8) -> usize {
    (a as usize) * NUM_SYMBOLS + b as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn affine_run_cost() {
        let gaps = GapModel::Affine {
            open: 1.0,
            extend: 0.5,
        };
        assert!(approx_eq!(f64, gaps.run_cost(0), 0.0));
        assert!(approx_eq!(f64, gaps.run_cost(1), 1.0));
        assert!(approx_eq!(f64, gaps.run_cost(4), 2.5));
    }

    #[test]
    fn linear_run_cost() {
        let gaps = GapModel::Linear { gap: 2.0 };
        assert!(approx_eq!(f64, gaps.open(), 2.0));
        assert!(approx_eq!(f64, gaps.extend(), 2.0));
        assert!(approx_eq!(f64, gaps.run_cost(3), 6.0));
    }

    #[test]
    fn gap_validation() {
        assert!(GapModel::default().validate().is_ok());
        assert!(GapModel::Linear { gap: 0.0 }.validate().is_err());
        assert!(
            GapModel::Affine {
                open: 1.0,
                extend: -0.5
            }
            .validate()
            .is_err()
        );
        assert!(
            GapModel::Affine {
                open: 1.0,
                extend: 0.0
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn constant_table() {
        let table = WeightMatrix::from_constants(NUCLEOTIDES, MatchScores::new(2.0, 1.0), 3.0);
        assert_eq!(table.get(b'A', b'A'), Some(2.0));
        assert_eq!(table.get(b'A', b'T'), Some(-1.0));
        assert_eq!(table.get(b'T', b'A'), Some(-1.0));
        assert_eq!(table.get(b'G', GAP), Some(-3.0));
        assert_eq!(table.get(GAP, b'G'), Some(-3.0));
        assert_eq!(table.get(GAP, GAP), Some(0.0));
        assert_eq!(table.get(b'N', b'N'), None);
    }

    #[test]
    fn blosum62_is_shifted_and_symmetric() {
        let table = WeightMatrix::blosum62();
        assert_eq!(table.get(b'W', b'W'), Some(16.0));
        assert_eq!(table.get(b'A', b'R'), Some(4.0));
        assert_eq!(table.get(b'R', b'A'), Some(4.0));
        assert_eq!(table.get(b'L', GAP), Some(0.0));
        for &a in BLOSUM62_SYMBOLS {
            for &b in BLOSUM62_SYMBOLS {
                assert_eq!(table.get(a, b), table.get(b, a));
            }
        }
    }

    #[test]
    fn alphabet_check() {
        let table = WeightMatrix::from_constants(NUCLEOTIDES, MatchScores::default(), 1.0);
        assert!(table.check_alphabet(&[b"ACGT".to_vec(), b"GATTACA".to_vec()]).is_ok());

        let err = table.check_alphabet(&[b"ACGT".to_vec(), b"MKV".to_vec()]);
        assert!(matches!(err, Err(Error::IncompatibleAlphabet { symbol: 'M' })));
    }

    #[test]
    fn scoring_selection() {
        let gaps = GapModel::Linear { gap: 2.0 };
        let scores = MatchScores::default();
        let scoring = Scoring::new(Molecule::Dna, ColumnScoring::Table, scores, &gaps);
        assert!(matches!(&scoring, Scoring::Table(t) if t.get(b'A', GAP) == Some(-2.0)));

        let scoring = Scoring::new(Molecule::Protein, ColumnScoring::Table, scores, &gaps);
        assert!(matches!(&scoring, Scoring::Table(t) if t.get(b'W', b'W') == Some(16.0)));

        let scores = MatchScores::new(2.0, 1.0);
        let scoring = Scoring::new(Molecule::Protein, ColumnScoring::Counts, scores, &gaps);
        assert!(approx_eq!(f64, scoring.substitution(b'W', b'W'), 2.0));
        assert!(scoring.check_alphabet(&[b"ANYTHING"]).is_ok());
    }

    #[test]
    fn molecule_names() {
        assert_eq!("DNA".parse::<Molecule>(), Ok(Molecule::Dna));
        assert_eq!("Protein".parse::<Molecule>(), Ok(Molecule::Protein));
        assert!("rna".parse::<Molecule>().is_err());
    }

    #[test]
    fn match_scores() {
        let scores = MatchScores::new(1.0, 2.0);
        assert!(approx_eq!(f64, scores.substitution(b'A', b'A'), 1.0));
        assert!(approx_eq!(f64, scores.substitution(b'A', b'C'), -2.0));
    }
}
