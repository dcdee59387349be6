//! Gower dissimilarity over mixed numeric/categorical records.

use super::matrix::DistanceMatrix;
use crate::error::{Error, Result};
use crate::table::{check_kinds, FeatureKind, Table, Value};
use ndarray::Array2;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Per-column view prepared once before the pairwise pass.
enum Column<'a> {
    Numeric {
        values: Vec<Option<f64>>,
        /// Observed max - min; `None` when the column has no observations.
        range: Option<f64>,
    },
    Categorical {
        values: Vec<&'a Value>,
    },
}

impl<'a> Column<'a> {
    fn prepare(table: &'a Table, j: usize, kind: FeatureKind) -> Self {
        match kind {
            FeatureKind::Numeric => {
                let values: Vec<Option<f64>> = table.column(j).map(Value::as_f64).collect();
                let (lo, hi) = values
                    .iter()
                    .flatten()
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| {
                        (lo.min(x), hi.max(x))
                    });
                let range = (lo <= hi).then_some(hi - lo);
                Column::Numeric { values, range }
            }
            FeatureKind::Categorical => Column::Categorical {
                values: table.column(j).collect(),
            },
        }
    }

    /// Contribution of this attribute to d(i, j), or `None` if excluded.
    #[inline]
    fn contribution(&self, i: usize, j: usize) -> Option<f64> {
        match self {
            Column::Numeric { values, range } => {
                let range = (*range)?;
                let (a, b) = (values[i]?, values[j]?);
                if range == 0.0 {
                    Some(0.0)
                } else {
                    Some((a - b).abs() / range)
                }
            }
            Column::Categorical { values } => {
                let (a, b) = (values[i], values[j]);
                match (a.is_missing(), b.is_missing()) {
                    (true, true) => None,
                    (true, false) | (false, true) => Some(1.0),
                    (false, false) => Some(if a.same_category(b) { 0.0 } else { 1.0 }),
                }
            }
        }
    }
}

/// Gower distance calculator.
///
/// Every attribute is weighted equally. Numeric attributes are normalized
/// by their observed range; categorical attributes score a mismatch as 1.
/// Attributes that cannot be compared for a pair drop out of that pair's
/// average instead of counting as 0 or 1.
#[derive(Debug, Clone)]
pub struct Gower {
    parallel: bool,
}

impl Default for Gower {
    fn default() -> Self {
        Self::new()
    }
}

impl Gower {
    /// Create a calculator. Rows are computed in parallel when the
    /// `parallel` feature is enabled.
    pub fn new() -> Self {
        Self { parallel: true }
    }

    /// Toggle row-parallel computation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Compute the full n × n distance matrix.
    pub fn compute(&self, table: &Table, kinds: &[FeatureKind]) -> Result<DistanceMatrix> {
        check_kinds(table, kinds)?;

        let n = table.n_rows();
        let columns: Vec<Column<'_>> = kinds
            .iter()
            .enumerate()
            .map(|(j, &kind)| Column::prepare(table, j, kind))
            .collect();

        let excluded = columns
            .iter()
            .filter(|c| matches!(c, Column::Numeric { range: None, .. }))
            .count();
        debug!(
            n_records = n,
            n_features = columns.len(),
            excluded_columns = excluded,
            "computing gower distances"
        );

        // Each task owns the upper-triangle tail of one row.
        let upper = |i: usize| -> Result<Vec<f64>> {
            ((i + 1)..n).map(|j| pair_distance(&columns, i, j)).collect()
        };

        #[cfg(feature = "parallel")]
        let rows: Vec<Vec<f64>> = if self.parallel {
            (0..n).into_par_iter().map(upper).collect::<Result<_>>()?
        } else {
            (0..n).map(upper).collect::<Result<_>>()?
        };

        #[cfg(not(feature = "parallel"))]
        let rows: Vec<Vec<f64>> = (0..n).map(upper).collect::<Result<_>>()?;

        let mut data = Array2::<f64>::zeros((n, n));
        for (i, tail) in rows.into_iter().enumerate() {
            for (offset, d) in tail.into_iter().enumerate() {
                let j = i + 1 + offset;
                data[[i, j]] = d;
                data[[j, i]] = d;
            }
        }

        Ok(DistanceMatrix::from_square(data))
    }
}

fn pair_distance(columns: &[Column<'_>], i: usize, j: usize) -> Result<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for c in columns {
        if let Some(s) = c.contribution(i, j) {
            sum += s;
            count += 1;
        }
    }
    if count == 0 {
        return Err(Error::Input(format!(
            "distance between records {i} and {j} is undefined: no attribute observed for both"
        )));
    }
    Ok((sum / count as f64).clamp(0.0, 1.0))
}
