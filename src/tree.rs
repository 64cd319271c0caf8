//! Guide tree construction by average-linkage clustering (UPGMA).
//!
//! The tree owns its nodes outright; an internal node's left-to-right leaf
//! order is the row order that progressive alignment produces for it.

use crate::distance::DistanceMatrix;
use itertools::Itertools;
use log::debug;
use std::fmt;

/// A node of a rooted binary guide tree.
#[derive(Clone, Debug, PartialEq)]
pub enum GuideTree {
    Leaf {
        index: usize,
    },
    Internal {
        left: Box<GuideTree>,
        right: Box<GuideTree>,
        height: f64,
        size: usize,
    },
}

impl GuideTree {
    #[must_use]
    pub const fn leaf(index: usize) -> Self {
        Self::Leaf { index }
    }

    /// Joins two subtrees under a new internal node at `height`.
    #[must_use]
    pub fn join(left: Self, right: Self, height: f64) -> Self {
        let size = left.size() + right.size();
        Self::Internal {
            left: Box::new(left),
            right: Box::new(right),
            height,
            size,
        }
    }

    /// Number of leaves below this node.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Leaf { .. } => 1,
            Self::Internal { size, .. } => *size,
        }
    }

    /// Half the distance at which the node was created; leaves sit at 0.
    #[must_use]
    pub const fn height(&self) -> f64 {
        match self {
            Self::Leaf { .. } => 0.0,
            Self::Internal { height, .. } => *height,
        }
    }

    /// Original sequence indices in left-to-right order.
    #[must_use]
    pub fn leaf_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.size());
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Self::Leaf { index } => order.push(*index),
                Self::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        order
    }

    /// Renders the tree in Newick format, labelling leaves with `names`.
    /// Branch lengths are height differences between parent and child.
    #[must_use]
    pub fn to_newick<S: AsRef<str>>(&self, names: &[S]) -> String {
        let mut out = String::new();
        self.write_newick(names, &mut out);
        out.push(';');
        out
    }

    fn write_newick<S: AsRef<str>>(&self, names: &[S], out: &mut String) {
        match self {
            Self::Leaf { index } => match names.get(*index) {
                Some(name) => out.push_str(name.as_ref()),
                None => out.push_str(&index.to_string()),
            },
            Self::Internal {
                left,
                right,
                height,
                ..
            } => {
                out.push('(');
                for (i, child) in [left, right].into_iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    child.write_newick(names, out);
                    out.push_str(&format!(":{:.5}", height - child.height()));
                }
                out.push(')');
            }
        }
    }
}

impl fmt::Display for GuideTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf { index } => write!(f, "{index}"),
            Self::Internal { left, right, .. } => write!(f, "({left},{right})"),
        }
    }
}

/// One agglomeration step of the clustering.
#[derive(Clone, Debug, PartialEq)]
pub struct Merge {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub distance: f64,
    pub size: usize,
}

/// The guide tree and the merges that produced it, in order.
#[derive(Clone, Debug)]
pub struct Upgma {
    pub tree: GuideTree,
    pub merges: Vec<Merge>,
}

/// Clusters the sequences of `distances` by average linkage.
///
/// The closest pair is merged first; among equal distances the first pair in
/// row-major order of the working matrix wins. The merged cluster replaces
/// both inputs at the end of the working set.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn upgma(distances: &DistanceMatrix) -> Upgma {
    let mut clusters: Vec<GuideTree> = (0..distances.size()).map(GuideTree::leaf).collect();
    let mut working = distances.to_rows();
    for (i, row) in working.iter_mut().enumerate() {
        row[i] = f64::INFINITY;
    }
    let mut merges = Vec::with_capacity(clusters.len().saturating_sub(1));

    while clusters.len() > 1 {
        let (i, j) = closest_pair(&working);
        let distance = working[i][j];
        let (size_i, size_j) = (clusters[i].size() as f64, clusters[j].size() as f64);

        let linkage: Vec<f64> = (0..clusters.len())
            .filter(|&k| k != i && k != j)
            .map(|k| (working[i][k] * size_i + working[j][k] * size_j) / (size_i + size_j))
            .collect();

        let right = clusters.remove(j);
        let left = clusters.remove(i);
        let merge = Merge {
            left: left.leaf_order(),
            right: right.leaf_order(),
            distance,
            size: left.size() + right.size(),
        };
        debug!(
            "Merging clusters [{}] and [{}] at distance {:.4}",
            merge.left.iter().join(", "),
            merge.right.iter().join(", "),
            distance
        );
        merges.push(merge);

        let merged = GuideTree::join(left, right, distance / 2.0);
        clusters.push(merged);

        working = shrink(&working, i, j, &linkage);
    }

    let tree = clusters.pop().unwrap_or(GuideTree::leaf(0));
    Upgma { tree, merges }
}

/// First minimal off-diagonal cell in row-major order; `i < j` by symmetry.
fn closest_pair(working: &[Vec<f64>]) -> (usize, usize) {
    let mut best = (0, 1);
    for (i, row) in working.iter().enumerate() {
        for (j, &d) in row.iter().enumerate() {
            if i != j && d < working[best.0][best.1] {
                best = (i, j);
            }
        }
    }
    best
}

/// Drops rows and columns `i` and `j` and appends the merged cluster's.
fn shrink(working: &[Vec<f64>], i: usize, j: usize, linkage: &[f64]) -> Vec<Vec<f64>> {
    let kept: Vec<usize> = (0..working.len()).filter(|&k| k != i && k != j).collect();
    let mut next: Vec<Vec<f64>> = kept
        .iter()
        .zip(linkage)
        .map(|(&r, &d)| {
            let mut row: Vec<f64> = kept.iter().map(|&c| working[r][c]).collect();
            row.push(d);
            row
        })
        .collect();
    let mut last = linkage.to_vec();
    last.push(f64::INFINITY);
    next.push(last);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::{GapModel, MatchScores};
    use float_cmp::approx_eq;

    fn matrix(rows: &[&[f64]]) -> DistanceMatrix {
        let rows: Vec<Vec<f64>> = rows.iter().map(|r| r.to_vec()).collect();
        DistanceMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn single_sequence_is_a_leaf() {
        let result = upgma(&matrix(&[&[0.0]]));
        assert_eq!(result.tree, GuideTree::leaf(0));
        assert!(result.merges.is_empty());
    }

    #[test]
    fn closest_sequences_merge_first() {
        let distances = DistanceMatrix::build(
            &["AAA", "AAT", "TTT"],
            &MatchScores::default(),
            &GapModel::default(),
        )
        .unwrap();
        let result = upgma(&distances);

        assert_eq!(result.merges.len(), 2);
        assert_eq!(result.merges[0].left, vec![0]);
        assert_eq!(result.merges[0].right, vec![1]);
        assert_eq!(result.merges[1].left, vec![2]);
        assert_eq!(result.merges[1].right, vec![0, 1]);
        assert_eq!(result.tree.size(), 3);
        assert_eq!(result.tree.leaf_order(), vec![2, 0, 1]);
        assert_eq!(result.tree.to_string(), "(2,(0,1))");
    }

    #[test]
    fn average_linkage_heights() {
        let result = upgma(&matrix(&[
            &[0.0, 2.0, 6.0, 10.0],
            &[2.0, 0.0, 8.0, 12.0],
            &[6.0, 8.0, 0.0, 4.0],
            &[10.0, 12.0, 4.0, 0.0],
        ]));

        assert_eq!(result.merges.len(), 3);
        assert!(approx_eq!(f64, result.merges[0].distance, 2.0));
        assert!(approx_eq!(f64, result.merges[1].distance, 4.0));
        // ((6 + 8) / 2 + (10 + 12) / 2) / 2
        assert!(approx_eq!(f64, result.merges[2].distance, 9.0));
        assert!(approx_eq!(f64, result.tree.height(), 4.5));
        assert_eq!(result.tree.size(), 4);
        assert_eq!(result.tree.leaf_order(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn size_weighted_update() {
        // After merging 0 and 1, d(01, 2) = (3 * 1 + 6 * 1) / 2 = 4.5, while
        // d(01, 3) = (5 + 5) / 2 = 5. The next merge is then {2, 01}.
        let result = upgma(&matrix(&[
            &[0.0, 1.0, 3.0, 5.0],
            &[1.0, 0.0, 6.0, 5.0],
            &[3.0, 6.0, 0.0, 7.0],
            &[5.0, 5.0, 7.0, 0.0],
        ]));
        assert_eq!(result.merges[1].left, vec![2]);
        assert_eq!(result.merges[1].right, vec![0, 1]);
        assert!(approx_eq!(f64, result.merges[1].distance, 4.5));
        // d(201, 3) = (7 * 1 + 5 * 2) / 3
        assert!(approx_eq!(f64, result.merges[2].distance, 17.0 / 3.0));
        assert_eq!(result.tree.leaf_order(), vec![3, 2, 0, 1]);
    }

    #[test]
    fn ties_take_first_pair_in_row_major_order() {
        let result = upgma(&matrix(&[
            &[0.0, 3.0, 1.0, 1.0],
            &[3.0, 0.0, 1.0, 3.0],
            &[1.0, 1.0, 0.0, 3.0],
            &[1.0, 3.0, 3.0, 0.0],
        ]));
        assert_eq!(result.merges[0].left, vec![0]);
        assert_eq!(result.merges[0].right, vec![2]);
    }

    #[test]
    fn n_minus_one_merges() {
        let n = 7;
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i: usize| (0..n).map(|j: usize| i.abs_diff(j) as f64).collect())
            .collect();
        let result = upgma(&DistanceMatrix::from_rows(&rows).unwrap());
        assert_eq!(result.merges.len(), n - 1);
        assert_eq!(result.tree.size(), n);
        assert_eq!(
            result.tree.leaf_order().into_iter().sorted().collect_vec(),
            (0..n).collect_vec()
        );
    }

    #[test]
    fn leaf_order_handles_multi_digit_indices() {
        let tree = GuideTree::join(
            GuideTree::join(GuideTree::leaf(12), GuideTree::leaf(3), 0.5),
            GuideTree::leaf(105),
            1.0,
        );
        assert_eq!(tree.leaf_order(), vec![12, 3, 105]);
        assert_eq!(tree.size(), 3);
    }

    #[test]
    fn newick() {
        let tree = GuideTree::join(
            GuideTree::leaf(2),
            GuideTree::join(GuideTree::leaf(0), GuideTree::leaf(1), 0.25),
            1.0,
        );
        assert_eq!(
            tree.to_newick(&["a", "b", "c"]),
            "(c:1.00000,(a:0.25000,b:0.25000):0.75000);"
        );
        assert_eq!(GuideTree::leaf(4).to_newick::<&str>(&[]), "4;");
    }
}
