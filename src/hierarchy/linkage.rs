//! Linkage matrix: the ordered merge history of agglomerative clustering.
//!
//! Ids follow the usual convention:
//! - records: `0..n`
//! - merge `i` creates cluster `n + i`

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A single merge event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    /// Smaller of the two merged ids.
    pub left: usize,
    /// Larger of the two merged ids.
    pub right: usize,
    /// Linkage distance at which the merge happened.
    pub distance: f64,
    /// Number of records under the new cluster.
    pub size: usize,
}

/// Ordered sequence of n-1 merges over n records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkageMatrix {
    n_items: usize,
    merges: Vec<Merge>,
    /// Merges whose raw distance was raised to keep the sequence monotonic.
    #[serde(default)]
    clamped: Vec<usize>,
}

impl LinkageMatrix {
    /// Empty merge history for `n_items` records.
    pub fn new(n_items: usize) -> Self {
        Self {
            n_items,
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            clamped: Vec::new(),
        }
    }

    /// Build from `(left, right, distance, size)` rows, e.g. an imported table.
    ///
    /// Ids are bounds-checked and distances must be finite and
    /// non-decreasing; completeness is not checked (see
    /// [`validate_linkage`](super::validate_linkage)).
    pub fn from_rows(n_items: usize, rows: &[(usize, usize, f64, usize)]) -> Result<Self> {
        let mut linkage = Self::new(n_items);
        let mut previous = f64::NEG_INFINITY;
        for (step, &(a, b, distance, size)) in rows.iter().enumerate() {
            if !distance.is_finite() || distance < previous {
                return Err(Error::Input(format!(
                    "merge distance {distance} at row {step} is not a finite value >= {previous}"
                )));
            }
            previous = distance;
            let limit = n_items + step;
            if a >= limit || b >= limit || a == b {
                return Err(Error::shape(
                    format!("two distinct ids below {limit} at row {step}"),
                    format!("({a}, {b})"),
                ));
            }
            linkage.add_merge(a, b, distance, size);
        }
        Ok(linkage)
    }

    /// Record a merge. The pair is stored with the smaller id first.
    pub fn add_merge(&mut self, cluster_a: usize, cluster_b: usize, distance: f64, size: usize) {
        self.merges.push(Merge {
            left: cluster_a.min(cluster_b),
            right: cluster_a.max(cluster_b),
            distance,
            size,
        });
    }

    pub(crate) fn mark_clamped(&mut self, step: usize) {
        self.clamped.push(step);
    }

    /// Number of original records.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// `true` once all records have been merged into one root.
    pub fn is_complete(&self) -> bool {
        self.n_items > 0 && self.merges.len() == self.n_items - 1
    }

    /// Merge by step index.
    pub fn merge(&self, step: usize) -> Option<&Merge> {
        self.merges.get(step)
    }

    /// All merges in order.
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Steps whose distance was clamped up to the previous merge.
    pub fn clamped_steps(&self) -> &[usize] {
        &self.clamped
    }

    /// Merge for a cluster id `>= n`, `None` for records.
    pub fn merge_for(&self, cluster_id: usize) -> Option<&Merge> {
        cluster_id
            .checked_sub(self.n_items)
            .and_then(|step| self.merges.get(step))
    }

    /// Number of records under `cluster_id`.
    pub fn size_of(&self, cluster_id: usize) -> usize {
        self.merge_for(cluster_id).map_or(1, |m| m.size)
    }

    /// Id of the root cluster, once complete.
    pub fn root(&self) -> Option<usize> {
        self.is_complete().then(|| 2 * self.n_items - 2)
    }

    /// The merge distances (for visualization).
    pub fn distances(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.distance).collect()
    }

    /// Rows as `[id1, id2, dist, n]`, the tabular export layout.
    pub fn to_rows(&self) -> Vec<[f64; 4]> {
        self.merges
            .iter()
            .map(|m| [m.left as f64, m.right as f64, m.distance, m.size as f64])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linkage_creation() {
        let linkage = LinkageMatrix::new(5);
        assert_eq!(linkage.n_items(), 5);
        assert_eq!(linkage.n_merges(), 0);
        assert!(!linkage.is_complete());
        assert_eq!(linkage.root(), None);
    }

    #[test]
    fn test_linkage_merge() {
        let mut linkage = LinkageMatrix::new(4);
        linkage.add_merge(1, 0, 0.5, 2);
        linkage.add_merge(2, 3, 0.7, 2);
        linkage.add_merge(4, 5, 1.0, 4);

        assert_eq!(linkage.n_merges(), 3);
        assert!(linkage.is_complete());
        assert_eq!(linkage.root(), Some(6));
        assert_eq!(linkage.merges()[0].left, 0);
        assert_eq!(linkage.size_of(6), 4);
        assert_eq!(linkage.size_of(2), 1);
        assert_eq!(linkage.to_rows()[2], [4.0, 5.0, 1.0, 4.0]);
    }

    #[test]
    fn test_from_rows_bounds() {
        assert!(LinkageMatrix::from_rows(3, &[(0, 1, 0.1, 2), (2, 3, 0.2, 3)]).is_ok());
        assert!(LinkageMatrix::from_rows(3, &[(0, 3, 0.1, 2)]).is_err());
        assert!(LinkageMatrix::from_rows(3, &[(1, 1, 0.1, 2)]).is_err());
    }

    #[test]
    fn test_from_rows_rejects_unsorted_distances() {
        let err = LinkageMatrix::from_rows(4, &[(0, 1, 0.9, 2), (2, 3, 0.1, 2), (4, 5, 1.0, 4)])
            .unwrap_err();
        assert!(matches!(err, Error::Input(_)));

        let err = LinkageMatrix::from_rows(2, &[(0, 1, f64::NAN, 2)]).unwrap_err();
        assert!(matches!(err, Error::Input(_)));

        // equal heights are fine
        assert!(LinkageMatrix::from_rows(3, &[(0, 1, 0.4, 2), (2, 3, 0.4, 3)]).is_ok());
    }
}
