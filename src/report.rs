//! Summaries of a flat clustering against the input table.
//!
//! | Function | Output |
//! |----------|--------|
//! | [`cluster_sizes`] | records per label |
//! | [`crosstab_normalized`] | label share per attribute value, rows sum to 1 |
//!
//! # Example
//!
//! ```rust
//! use mixclust::cluster::{ClusterAssigner};
//! use mixclust::hierarchy::LinkageMatrix;
//! use mixclust::report::{cluster_sizes, crosstab_normalized};
//! use mixclust::table::Value;
//!
//! let z = LinkageMatrix::from_rows(4, &[(0, 1, 0.1, 2), (2, 3, 0.2, 2), (4, 5, 0.9, 4)]).unwrap();
//! let labels = ClusterAssigner::new(2).assign(&z).unwrap();
//! assert_eq!(cluster_sizes(&labels)[&1], 2);
//!
//! let years: Vec<Value> = [1999, 1999, 2005, 1999].into_iter().map(Value::from).collect();
//! let tab = crosstab_normalized(&years, &labels).unwrap();
//! assert_eq!(tab.share("1999", 1), Some(2.0 / 3.0));
//! ```

use crate::cluster::ClusterLabeling;
use crate::error::{Error, Result};
use crate::table::Value;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Records per cluster label, by label.
pub fn cluster_sizes(labeling: &ClusterLabeling) -> BTreeMap<usize, usize> {
    let mut sizes = BTreeMap::new();
    for &l in labeling.labels() {
        *sizes.entry(l).or_insert(0) += 1;
    }
    sizes
}

/// Row-normalized cross-tabulation of attribute values against labels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    /// Attribute values, one per row.
    pub rows: Vec<String>,
    /// Cluster labels, one per column.
    pub columns: Vec<usize>,
    /// `shares[r][c]`: fraction of records with value `rows[r]` labeled `columns[c]`.
    pub shares: Vec<Vec<f64>>,
}

impl CrossTab {
    /// Share for one (value, label) cell.
    pub fn share(&self, row: &str, label: usize) -> Option<f64> {
        let r = self.rows.iter().position(|v| v == row)?;
        let c = self.columns.iter().position(|&l| l == label)?;
        Some(self.shares[r][c])
    }
}

impl fmt::Display for CrossTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>10}", "")?;
        for c in &self.columns {
            write!(f, " {:>10}", c)?;
        }
        writeln!(f)?;
        for (row, shares) in self.rows.iter().zip(&self.shares) {
            write!(f, "{:>10}", row)?;
            for s in shares {
                write!(f, " {:>8.2} %", s * 100.0)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Share of each label among records with each attribute value.
///
/// Rows are ordered numerically when every value is numeric, otherwise by
/// label text. Missing values form their own row.
pub fn crosstab_normalized(values: &[Value], labeling: &ClusterLabeling) -> Result<CrossTab> {
    if values.len() != labeling.len() {
        return Err(Error::shape(
            format!("{} values", labeling.len()),
            format!("{} values", values.len()),
        ));
    }

    let table = build_contingency_table(values, labeling.labels());

    let mut rows: Vec<&Value> = Vec::new();
    for v in values {
        if !rows.iter().any(|r| r.label() == v.label()) {
            rows.push(v);
        }
    }
    if rows.iter().all(|v| v.as_f64().is_some()) {
        rows.sort_by(|a, b| {
            let (x, y) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            x.total_cmp(&y)
        });
    } else {
        rows.sort_by_key(|v| v.label());
    }
    let rows: Vec<String> = rows.into_iter().map(Value::label).collect();
    let columns: Vec<usize> = cluster_sizes(labeling).into_keys().collect();

    let shares = rows
        .iter()
        .map(|r| {
            let total: usize = columns
                .iter()
                .map(|c| table.get(&(r.clone(), *c)).copied().unwrap_or(0))
                .sum();
            columns
                .iter()
                .map(|c| {
                    let count = table.get(&(r.clone(), *c)).copied().unwrap_or(0);
                    count as f64 / total as f64
                })
                .collect()
        })
        .collect();

    Ok(CrossTab {
        rows,
        columns,
        shares,
    })
}

fn build_contingency_table(
    values: &[Value],
    labels: &[usize],
) -> HashMap<(String, usize), usize> {
    let mut table = HashMap::new();
    for (v, &l) in values.iter().zip(labels.iter()) {
        *table.entry((v.label(), l)).or_insert(0) += 1;
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterAssigner;
    use crate::hierarchy::LinkageMatrix;

    fn labels() -> ClusterLabeling {
        let z = LinkageMatrix::from_rows(
            5,
            &[(0, 1, 0.1, 2), (2, 3, 0.2, 2), (4, 6, 0.5, 3), (5, 7, 0.9, 5)],
        )
        .unwrap();
        ClusterAssigner::new(3).assign(&z).unwrap()
    }

    #[test]
    fn test_cluster_sizes() {
        let sizes = cluster_sizes(&labels());
        assert_eq!(sizes, BTreeMap::from([(1, 2), (2, 2), (3, 1)]));
    }

    #[test]
    fn test_crosstab_rows_sum_to_one() {
        let years: Vec<Value> = [2019, 1999, 2005, 2019, 1999]
            .into_iter()
            .map(Value::from)
            .collect();
        let tab = crosstab_normalized(&years, &labels()).unwrap();

        assert_eq!(tab.rows, vec!["1999", "2005", "2019"]);
        assert_eq!(tab.columns, vec![1, 2, 3]);
        for row in &tab.shares {
            assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        }
        // 1999: record 1 (label 1) and record 4 (label 3)
        assert_eq!(tab.share("1999", 1), Some(0.5));
        assert_eq!(tab.share("1999", 3), Some(0.5));
        assert_eq!(tab.share("2005", 2), Some(1.0));
        assert!(tab.to_string().contains("50.00 %"));
    }

    #[test]
    fn test_crosstab_length_mismatch() {
        let err = crosstab_normalized(&[Value::from("PA")], &labels());
        assert!(matches!(err, Err(Error::Shape { .. })));
    }
}
