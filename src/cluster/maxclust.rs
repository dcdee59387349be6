//! Flat clusters from a linkage matrix, fixed cluster count ("maxclust").
//!
//! Merges are sorted by distance, so dropping the k-1 largest ones means
//! replaying only the first n-k. The flat clusters are the connected
//! components of that partial replay.

use crate::error::{Error, Result};
use crate::hierarchy::LinkageMatrix;
use crate::table::{Table, Value};
use petgraph::unionfind::UnionFind;
use serde::Serialize;
use std::collections::BTreeMap;

/// One label in `1..=k` per record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterLabeling {
    k: usize,
    labels: Vec<usize>,
}

impl ClusterLabeling {
    /// Requested cluster count.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Labels by record index.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Label of one record.
    pub fn label(&self, record: usize) -> Option<usize> {
        self.labels.get(record).copied()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// `true` for an empty labeling.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Record indices per label.
    pub fn members(&self) -> BTreeMap<usize, Vec<usize>> {
        let mut out: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, &l) in self.labels.iter().enumerate() {
            out.entry(l).or_default().push(i);
        }
        out
    }

    /// Append the labels to `table` as a new column.
    pub fn append_to(&self, table: &mut Table, name: impl Into<String>) -> Result<()> {
        let values = self
            .labels
            .iter()
            .map(|&l| Value::Number(l as f64))
            .collect();
        table.push_column(name, values)
    }
}

/// Cuts a linkage matrix into exactly k flat clusters.
#[derive(Debug, Clone)]
pub struct ClusterAssigner {
    k: usize,
}

impl ClusterAssigner {
    /// Target cluster count.
    pub fn new(k: usize) -> Self {
        Self { k }
    }

    /// Target cluster count.
    pub fn n_clusters(&self) -> usize {
        self.k
    }

    /// Assign labels `1..=k`, numbered by first appearance in record order.
    pub fn assign(&self, linkage: &LinkageMatrix) -> Result<ClusterLabeling> {
        let n = linkage.n_items();
        let k = self.k;
        if k == 0 || k > n {
            return Err(Error::argument(
                "k",
                format!("cannot create {k} clusters from {n} records"),
            ));
        }
        if linkage.n_merges() + 1 < n {
            return Err(Error::argument(
                "linkage",
                format!(
                    "expected {} merges for {n} records, found {}",
                    n - 1,
                    linkage.n_merges()
                ),
            ));
        }

        if let Some(step) = linkage
            .merges()
            .windows(2)
            .position(|w| !(w[1].distance >= w[0].distance))
        {
            return Err(Error::argument(
                "linkage",
                format!("merge distances decrease at step {}", step + 1),
            ));
        }

        let mut components = UnionFind::<usize>::new(2 * n - 1);
        for (step, merge) in linkage.merges().iter().take(n - k).enumerate() {
            let id = n + step;
            components.union(merge.left, id);
            components.union(merge.right, id);
        }

        let mut label_of_root: BTreeMap<usize, usize> = BTreeMap::new();
        let labels = (0..n)
            .map(|i| {
                let root = components.find(i);
                let next = label_of_root.len() + 1;
                *label_of_root.entry(root).or_insert(next)
            })
            .collect();

        Ok(ClusterLabeling { k, labels })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn linkage() -> LinkageMatrix {
        // {0,1} 0.1, {2,3} 0.2, {4} + {2,3} 0.5, all 0.9
        LinkageMatrix::from_rows(
            5,
            &[
                (0, 1, 0.1, 2),
                (2, 3, 0.2, 2),
                (4, 6, 0.5, 3),
                (5, 7, 0.9, 5),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_cut_to_k() {
        let z = linkage();
        let two = ClusterAssigner::new(2).assign(&z).unwrap();
        assert_eq!(two.labels(), &[1, 1, 2, 2, 2]);

        let three = ClusterAssigner::new(3).assign(&z).unwrap();
        assert_eq!(three.labels(), &[1, 1, 2, 2, 3]);

        let members = three.members();
        assert_eq!(members[&2], vec![2, 3]);
    }

    #[test]
    fn test_extremes() {
        let z = linkage();
        let one = ClusterAssigner::new(1).assign(&z).unwrap();
        assert_eq!(one.labels(), &[1; 5]);
        let all = ClusterAssigner::new(5).assign(&z).unwrap();
        assert_eq!(all.labels(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_invalid_k() {
        let z = linkage();
        for k in [0, 6] {
            let err = ClusterAssigner::new(k).assign(&z).unwrap_err();
            assert!(matches!(err, Error::Argument { name: "k", .. }));
        }
    }

    #[test]
    fn test_incomplete_linkage() {
        let z = LinkageMatrix::from_rows(4, &[(0, 1, 0.1, 2)]).unwrap();
        let err = ClusterAssigner::new(2).assign(&z).unwrap_err();
        assert!(matches!(err, Error::Argument { name: "linkage", .. }));
    }

    #[test]
    fn test_unsorted_linkage_is_rejected() {
        // 0.9 before 0.1: replaying by position would drop the wrong merge.
        let mut z = LinkageMatrix::new(4);
        z.add_merge(0, 1, 0.9, 2);
        z.add_merge(2, 3, 0.1, 2);
        z.add_merge(4, 5, 1.0, 4);
        let err = ClusterAssigner::new(3).assign(&z).unwrap_err();
        assert!(matches!(err, Error::Argument { name: "linkage", .. }));
    }

    #[test]
    fn test_append_column() {
        let mut table = Table::from_columns(vec![(
            "year".into(),
            (0..5).map(|y| Value::from(2000 + y)).collect(),
        )])
        .unwrap();
        let labels = ClusterAssigner::new(2).assign(&linkage()).unwrap();
        labels.append_to(&mut table, "grupo_2").unwrap();
        assert_eq!(table.row(4).unwrap()[1], Value::Number(2.0));
    }

    proptest! {
        #[test]
        fn caterpillar_cut_has_k_labels(n in 2usize..40, k_frac in 0.0f64..1.0) {
            // 0+1, then each next record joins the running cluster.
            let mut rows = vec![(0, 1, 0.0, 2)];
            for i in 2..n {
                rows.push((i, n + i - 2, (i - 1) as f64, i + 1));
            }
            let z = LinkageMatrix::from_rows(n, &rows).unwrap();
            let k = 1 + ((n - 1) as f64 * k_frac) as usize;
            let labeling = ClusterAssigner::new(k).assign(&z).unwrap();

            let mut distinct = labeling.labels().to_vec();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(distinct, (1..=k).collect::<Vec<_>>());
            prop_assert_eq!(labeling.labels()[0], 1);
        }
    }
}
