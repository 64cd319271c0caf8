//! Progressive multiple sequence alignment.
//!
//! Distances from all pairwise alignments drive UPGMA clustering; the guide
//! tree is then walked bottom-up, aligning the two child profiles at every
//! internal node.

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::profile::{Profile, align_profiles};
use crate::scoring::{GapModel, Scoring};
use crate::tree::{GuideTree, Merge, upgma};
use log::info;

/// The result of a progressive alignment.
#[derive(Clone, Debug)]
pub struct MultipleAlignment {
    /// Aligned rows, all of the same length.
    pub rows: Vec<Vec<u8>>,
    /// Original index of the sequence in each row.
    pub order: Vec<usize>,
    pub tree: GuideTree,
    pub merges: Vec<Merge>,
}

/// Rejects an empty sequence list or any empty sequence.
pub fn validate_sequences<S: AsRef<[u8]>>(sequences: &[S]) -> Result<()> {
    if sequences.is_empty() {
        return Err(Error::InvalidInput("no sequences to align".to_string()));
    }
    if let Some(idx) = sequences.iter().position(|s| s.as_ref().is_empty()) {
        return Err(Error::InvalidInput(format!(
            "sequence {idx} has no symbols to align"
        )));
    }
    Ok(())
}

/// Aligns `sequences` progressively along a UPGMA guide tree.
pub fn progressive_alignment<S>(
    sequences: &[S],
    scoring: &Scoring,
    gaps: &GapModel,
) -> Result<MultipleAlignment>
where
    S: AsRef<[u8]> + Sync,
{
    gaps.validate()?;
    validate_sequences(sequences)?;
    scoring.check_alphabet(sequences)?;

    let distances = DistanceMatrix::build(sequences, scoring, gaps)?;
    let clustering = upgma(&distances);
    info!("Built guide tree {}", clustering.tree);

    let profile = align_tree(&clustering.tree, sequences, scoring, gaps)?;
    let order = clustering.tree.leaf_order();
    let rows = profile.into_rows();
    debug_assert_eq!(rows.len(), order.len());

    Ok(MultipleAlignment {
        rows,
        order,
        tree: clustering.tree,
        merges: clustering.merges,
    })
}

/// Walks `tree` post-order: a leaf becomes a single-row profile of its
/// sequence, an internal node the alignment of its children's profiles.
/// Rows come out in `tree.leaf_order()`.
pub fn align_tree<S: AsRef<[u8]>>(
    tree: &GuideTree,
    sequences: &[S],
    scoring: &Scoring,
    gaps: &GapModel,
) -> Result<Profile> {
    match tree {
        GuideTree::Leaf { index } => sequences
            .get(*index)
            .map(|s| Profile::singleton(s.as_ref().to_vec()))
            .ok_or_else(|| {
                Error::InvalidInput(format!("guide tree refers to missing sequence {index}"))
            }),
        GuideTree::Internal { left, right, .. } => {
            let left = align_tree(left, sequences, scoring, gaps)?;
            let right = align_tree(right, sequences, scoring, gaps)?;
            align_profiles(&left, &right, scoring, gaps)
        }
    }
}
