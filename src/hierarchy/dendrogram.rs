//! Dendrogram projection for hierarchical clustering visualization.
//!
//! A dendrogram draws the nested structure of a [`LinkageMatrix`]. This
//! module only computes *what* to draw: branch geometry, truncation and
//! colors. Pixels are somebody else's job.
//!
//! # Truncation
//!
//! The root merge sits at level 0. Merged clusters deeper than `depth`
//! levels are collapsed into a single leaf labeled with its true record
//! count, e.g. `(37)`.
//!
//! ```text
//! level 0          ┌────┴────┐
//! level 1        ┌─┴─┐     ┌─┴─┐
//! level 2 (cut)  (12) 3   (7) (18)
//! ```
//!
//! # Colors
//!
//! Every maximal subtree whose merges all lie below the color threshold
//! gets its own color group; merges at or above the threshold are
//! [`BranchColor::Neutral`].

use super::linkage::LinkageMatrix;
use crate::error::{Error, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Horizontal spacing between adjacent leaves.
const LEAF_SPACING: f64 = 10.0;

/// Color assignment of a branch or leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BranchColor {
    /// At or above the color threshold.
    Neutral,
    /// Below the threshold; groups numbered left to right from 0.
    Group(usize),
}

/// Reference from a branch to one of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BranchChild {
    /// Index into [`DendrogramStructure::branches`].
    Branch(usize),
    /// Index into [`DendrogramStructure::leaves`].
    Leaf(usize),
}

/// A drawn merge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Branch {
    /// Linkage cluster id (`n + step`).
    pub cluster_id: usize,
    /// Merge distance (branch height).
    pub distance: f64,
    /// Records under this branch.
    pub size: usize,
    /// Left child.
    pub left: BranchChild,
    /// Right child.
    pub right: BranchChild,
    /// Color assignment.
    pub color: BranchColor,
    /// x of the U-shaped link: `[left, left, right, right]`.
    pub xs: [f64; 4],
    /// y of the U-shaped link: `[left, height, height, right]`.
    pub ys: [f64; 4],
}

/// A drawn leaf: a record or a collapsed subtree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DendrogramLeaf {
    /// Record index, or linkage cluster id when collapsed.
    pub cluster_id: usize,
    /// Text under the leaf.
    pub label: String,
    /// Records represented.
    pub count: usize,
    /// `true` when this leaf stands for a truncated subtree.
    pub collapsed: bool,
    /// Heights of the merges hidden inside a collapsed leaf.
    pub contracted: Vec<f64>,
    /// Color of the group the leaf falls in.
    pub color: BranchColor,
    /// x position.
    pub x: f64,
}

/// Rendering-ready projection of a linkage matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DendrogramStructure {
    /// Color threshold used.
    pub threshold: f64,
    /// Truncation depth used.
    pub depth: usize,
    /// Drawn merges in left-to-right post order (root last).
    pub branches: Vec<Branch>,
    /// Leaves left to right.
    pub leaves: Vec<DendrogramLeaf>,
    /// Number of below-threshold color groups.
    pub n_groups: usize,
}

impl DendrogramStructure {
    /// The root branch.
    pub fn root(&self) -> Option<&Branch> {
        self.branches.last()
    }

    /// Leaf label to record count, left to right.
    pub fn leaf_counts(&self) -> Vec<(String, usize)> {
        self.leaves
            .iter()
            .map(|l| (l.label.clone(), l.count))
            .collect()
    }

    /// Total records under all leaves.
    pub fn total_count(&self) -> usize {
        self.leaves.iter().map(|l| l.count).sum()
    }

    /// Leaf labels left to right.
    pub fn labels(&self) -> Vec<&str> {
        self.leaves.iter().map(|l| l.label.as_str()).collect()
    }

    /// Element counts for a textual summary.
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            ("branches", self.branches.len()),
            ("leaves", self.leaves.len()),
            (
                "collapsed_leaves",
                self.leaves.iter().filter(|l| l.collapsed).count(),
            ),
            ("color_groups", self.n_groups),
            ("records", self.total_count()),
        ])
    }
}

impl fmt::Display for DendrogramStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, count) in self.summary() {
            writeln!(f, "dendrogram.{name}: {count}")?;
        }
        Ok(())
    }
}

/// Builds a [`DendrogramStructure`] from a linkage matrix.
#[derive(Debug, Clone)]
pub struct DendrogramProjector {
    depth: usize,
    threshold: f64,
}

impl DendrogramProjector {
    /// Expand `depth` levels below the root; color merges below `threshold`.
    pub fn new(depth: usize, threshold: f64) -> Self {
        Self { depth, threshold }
    }

    /// Project `linkage`. Read-only.
    pub fn project(&self, linkage: &LinkageMatrix) -> Result<DendrogramStructure> {
        if self.depth == 0 {
            return Err(Error::argument("depth", "truncation depth must be at least 1"));
        }
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::argument(
                "color_threshold",
                format!("{} is outside [0, 1]", self.threshold),
            ));
        }
        let root = linkage.root().ok_or_else(|| {
            Error::argument(
                "linkage",
                format!(
                    "expected {} merges, found {}",
                    linkage.n_items().saturating_sub(1),
                    linkage.n_merges()
                ),
            )
        })?;

        let mut walk = Walk {
            linkage,
            depth: self.depth,
            threshold: self.threshold,
            branches: Vec::with_capacity(linkage.n_merges()),
            leaves: Vec::new(),
            n_groups: 0,
        };
        walk.run(root);

        Ok(DendrogramStructure {
            threshold: self.threshold,
            depth: self.depth,
            branches: walk.branches,
            leaves: walk.leaves,
            n_groups: walk.n_groups,
        })
    }
}

struct Walk<'a> {
    linkage: &'a LinkageMatrix,
    depth: usize,
    threshold: f64,
    branches: Vec<Branch>,
    leaves: Vec<DendrogramLeaf>,
    n_groups: usize,
}

/// Pending work for the post-order walk.
enum Frame {
    /// Decide how to draw `id`.
    Enter {
        id: usize,
        level: usize,
        group: Option<usize>,
    },
    /// Both children of `id` are drawn; emit its branch.
    Exit {
        id: usize,
        distance: f64,
        size: usize,
        group: Option<usize>,
    },
}

impl Walk<'_> {
    /// Post-order walk from `root` on an explicit stack; a caterpillar
    /// hierarchy is n levels deep.
    fn run(&mut self, root: usize) {
        let mut frames = vec![Frame::Enter {
            id: root,
            level: 0,
            group: None,
        }];
        // Child reference plus its (x, y) attachment point.
        let mut drawn: Vec<(BranchChild, f64, f64)> = Vec::new();

        while let Some(frame) = frames.pop() {
            match frame {
                Frame::Enter { id, level, group } => {
                    let Some(&merge) = self.linkage.merge_for(id) else {
                        let color = group.map_or(BranchColor::Neutral, BranchColor::Group);
                        drawn.push(self.leaf(id, id.to_string(), 1, false, Vec::new(), color));
                        continue;
                    };
                    let group = if merge.distance < self.threshold {
                        group.or_else(|| {
                            self.n_groups += 1;
                            Some(self.n_groups - 1)
                        })
                    } else {
                        None
                    };

                    if level > self.depth {
                        let contracted = self.contracted_heights(id);
                        let label = format!("({})", merge.size);
                        let color = group.map_or(BranchColor::Neutral, BranchColor::Group);
                        drawn.push(self.leaf(id, label, merge.size, true, contracted, color));
                        continue;
                    }

                    frames.push(Frame::Exit {
                        id,
                        distance: merge.distance,
                        size: merge.size,
                        group,
                    });
                    for child in [merge.right, merge.left] {
                        frames.push(Frame::Enter {
                            id: child,
                            level: level + 1,
                            group,
                        });
                    }
                }
                Frame::Exit {
                    id,
                    distance,
                    size,
                    group,
                } => {
                    let (Some((right, xr, yr)), Some((left, xl, yl))) = (drawn.pop(), drawn.pop())
                    else {
                        break;
                    };
                    self.branches.push(Branch {
                        cluster_id: id,
                        distance,
                        size,
                        left,
                        right,
                        color: group.map_or(BranchColor::Neutral, BranchColor::Group),
                        xs: [xl, xl, xr, xr],
                        ys: [yl, distance, distance, yr],
                    });
                    drawn.push((
                        BranchChild::Branch(self.branches.len() - 1),
                        (xl + xr) / 2.0,
                        distance,
                    ));
                }
            }
        }
    }

    fn leaf(
        &mut self,
        cluster_id: usize,
        label: String,
        count: usize,
        collapsed: bool,
        contracted: Vec<f64>,
        color: BranchColor,
    ) -> (BranchChild, f64, f64) {
        let x = LEAF_SPACING / 2.0 + LEAF_SPACING * self.leaves.len() as f64;
        self.leaves.push(DendrogramLeaf {
            cluster_id,
            label,
            count,
            collapsed,
            contracted,
            color,
            x,
        });
        (BranchChild::Leaf(self.leaves.len() - 1), x, 0.0)
    }

    /// Heights of every merge inside the subtree rooted at `id`.
    fn contracted_heights(&self, id: usize) -> Vec<f64> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(c) = stack.pop() {
            if let Some(m) = self.linkage.merge_for(c) {
                out.push(m.distance);
                stack.push(m.right);
                stack.push(m.left);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 6 records: {0,1} 0.1, {2,3} 0.15, {4,5} 0.2, {0,1}+{2,3} 0.4, root 0.8.
    fn linkage() -> LinkageMatrix {
        LinkageMatrix::from_rows(
            6,
            &[
                (0, 1, 0.1, 2),
                (2, 3, 0.15, 2),
                (4, 5, 0.2, 2),
                (6, 7, 0.4, 4),
                (8, 9, 0.8, 6),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_full_expansion() {
        let d = DendrogramProjector::new(10, 0.3).project(&linkage()).unwrap();
        assert_eq!(d.branches.len(), 5);
        // Root is (8, 9), so {4,5} is drawn first.
        assert_eq!(d.labels(), vec!["4", "5", "0", "1", "2", "3"]);
        assert_eq!(d.total_count(), 6);
        assert_eq!(d.root().unwrap().cluster_id, 10);
        assert_eq!(d.root().unwrap().ys, [0.2, 0.8, 0.8, 0.4]);
    }

    #[test]
    fn test_colors_follow_threshold() {
        let d = DendrogramProjector::new(10, 0.3).project(&linkage()).unwrap();
        // {4,5}, {0,1} and {2,3} are below 0.3; the 0.4 merge is not.
        assert_eq!(d.n_groups, 3);
        let by_id: BTreeMap<usize, BranchColor> =
            d.branches.iter().map(|b| (b.cluster_id, b.color)).collect();
        assert_eq!(by_id[&8], BranchColor::Group(0));
        assert_eq!(by_id[&6], BranchColor::Group(1));
        assert_eq!(by_id[&7], BranchColor::Group(2));
        assert_eq!(by_id[&9], BranchColor::Neutral);
        assert_eq!(by_id[&10], BranchColor::Neutral);
        assert_eq!(d.leaves[5].color, BranchColor::Group(2));

        let d = DendrogramProjector::new(10, 0.5).project(&linkage()).unwrap();
        assert_eq!(d.n_groups, 2);
        let right = d.branches.iter().find(|b| b.cluster_id == 9).unwrap();
        assert_eq!(right.color, BranchColor::Group(1));
        assert!(d.leaves[2..].iter().all(|l| l.color == BranchColor::Group(1)));
    }

    #[test]
    fn test_truncation_keeps_true_counts() {
        let d = DendrogramProjector::new(1, 0.3).project(&linkage()).unwrap();
        // Root (level 0) and its children (level 1) are drawn; level 2 collapses.
        assert_eq!(d.labels(), vec!["4", "5", "(2)", "(2)"]);
        assert_eq!(d.total_count(), 6);
        assert_eq!(d.leaves[2].contracted, vec![0.1]);
        assert_eq!(d.leaves[3].contracted, vec![0.15]);
        assert_eq!(d.summary()["collapsed_leaves"], 2);
        assert_eq!(d.summary()["branches"], 3);
        // Collapsed subtrees below the threshold still get their own colors.
        assert_eq!(d.leaves[2].color, BranchColor::Group(1));
        assert_eq!(d.leaves[3].color, BranchColor::Group(2));
    }

    #[test]
    fn test_coordinates() {
        let d = DendrogramProjector::new(10, 0.3).project(&linkage()).unwrap();
        let first = &d.branches[0];
        assert_eq!(first.cluster_id, 8);
        assert_eq!(first.xs, [5.0, 5.0, 15.0, 15.0]);
        assert_eq!(first.ys, [0.0, 0.2, 0.2, 0.0]);
        assert_eq!(d.branches[1].xs, [25.0, 25.0, 35.0, 35.0]);
        assert_eq!(d.leaves[5].x, 55.0);
    }

    #[test]
    fn test_invalid_arguments() {
        let z = linkage();
        assert!(matches!(
            DendrogramProjector::new(0, 0.3).project(&z),
            Err(Error::Argument { name: "depth", .. })
        ));
        for t in [-0.1, 1.5, f64::NAN] {
            assert!(matches!(
                DendrogramProjector::new(3, t).project(&z),
                Err(Error::Argument {
                    name: "color_threshold",
                    ..
                })
            ));
        }
        let partial = LinkageMatrix::from_rows(3, &[(0, 1, 0.1, 2)]).unwrap();
        assert!(DendrogramProjector::new(3, 0.3).project(&partial).is_err());
    }

    #[test]
    fn test_display_summary() {
        let d = DendrogramProjector::new(10, 0.3).project(&linkage()).unwrap();
        let text = d.to_string();
        assert!(text.contains("dendrogram.leaves: 6"));
        assert!(text.contains("dendrogram.color_groups: 3"));
    }

    #[test]
    fn test_deep_caterpillar_does_not_recurse() {
        // Identical records chain onto one growing cluster.
        let n = 5000;
        let mut rows = vec![(0, 1, 0.0, 2)];
        for i in 2..n {
            rows.push((i, n + i - 2, 0.0, i + 1));
        }
        let z = LinkageMatrix::from_rows(n, &rows).unwrap();
        let d = DendrogramProjector::new(n, 0.5).project(&z).unwrap();

        assert_eq!(d.branches.len(), n - 1);
        assert_eq!(d.leaves.len(), n);
        assert_eq!(d.total_count(), n);
        assert_eq!(d.n_groups, 1);
        assert_eq!(d.root().unwrap().cluster_id, 2 * n - 2);
        assert!(d.leaves.iter().all(|l| l.color == BranchColor::Group(0)));
    }
}
