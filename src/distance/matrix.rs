//! Dense symmetric distance matrix.

use crate::error::{Error, Result};
use ndarray::Array2;
use serde::Serialize;

/// Symmetric n × n dissimilarity matrix with a zero diagonal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceMatrix {
    data: Array2<f64>,
}

impl DistanceMatrix {
    /// Wrap a square array. Symmetry is checked when condensing.
    pub fn from_array(data: Array2<f64>) -> Result<Self> {
        if data.nrows() != data.ncols() {
            return Err(Error::shape(
                "square matrix",
                format!("{}x{}", data.nrows(), data.ncols()),
            ));
        }
        Ok(Self { data })
    }

    /// Wrap an array already known to be square.
    pub(crate) fn from_square(data: Array2<f64>) -> Self {
        debug_assert_eq!(data.nrows(), data.ncols());
        Self { data }
    }

    /// Build from nested rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let n = rows.len();
        let mut flat = Vec::with_capacity(n * n);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(Error::shape(
                    format!("{n} columns in every row"),
                    format!("{} columns in row {i}", row.len()),
                ));
            }
            flat.extend_from_slice(row);
        }
        let data = Array2::from_shape_vec((n, n), flat)
            .map_err(|e| Error::shape(format!("{n}x{n}"), e.to_string()))?;
        Ok(Self { data })
    }

    /// Number of records.
    pub fn n(&self) -> usize {
        self.data.nrows()
    }

    /// Distance between records `i` and `j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[[i, j]]
    }

    /// Underlying array.
    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// Consume into the underlying array.
    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    /// Row-major nested copy, for tabular export.
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.data.rows().into_iter().map(|r| r.to_vec()).collect()
    }

    /// `true` if symmetric within `tol`, zero on the diagonal and bounded in [0, 1].
    pub fn is_valid(&self, tol: f64) -> bool {
        let n = self.n();
        for i in 0..n {
            if self.data[[i, i]] != 0.0 {
                return false;
            }
            for j in (i + 1)..n {
                let a = self.data[[i, j]];
                let b = self.data[[j, i]];
                if (a - b).abs() > tol || !(0.0..=1.0).contains(&a) {
                    return false;
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows() {
        let m = DistanceMatrix::from_rows(&[vec![0.0, 0.5], vec![0.5, 0.0]]).unwrap();
        assert_eq!(m.n(), 2);
        assert_eq!(m.get(0, 1), 0.5);
        assert!(m.is_valid(0.0));
        assert_eq!(m.to_rows(), vec![vec![0.0, 0.5], vec![0.5, 0.0]]);
    }

    #[test]
    fn test_non_square_rejected() {
        assert!(DistanceMatrix::from_rows(&[vec![0.0, 0.5]]).is_err());
        assert!(DistanceMatrix::from_array(Array2::zeros((2, 3))).is_err());
    }

    #[test]
    fn test_invalid_entries_detected() {
        let m = DistanceMatrix::from_rows(&[vec![0.0, 1.5], vec![1.5, 0.0]]).unwrap();
        assert!(!m.is_valid(0.0));
        let m = DistanceMatrix::from_rows(&[vec![0.0, 0.2], vec![0.3, 0.0]]).unwrap();
        assert!(!m.is_valid(1e-9));
    }
}
