//! Condensed (upper-triangle) pairwise distance vectors.
//!
//! For n records the condensed vector stores the n(n-1)/2 entries above
//! the diagonal, row by row:
//!
//! ```text
//!      0   1   2   3
//! 0  [ .  d0  d1  d2 ]
//! 1  [    .   d3  d4 ]      ->  [d0, d1, d2, d3, d4, d5]
//! 2  [        .   d5 ]
//! 3  [            .  ]
//! ```

use super::matrix::DistanceMatrix;
use crate::error::{Error, Result};
use ndarray::Array2;
use serde::Serialize;

/// Upper-triangular entries of a [`DistanceMatrix`], `i < j`, row-major.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CondensedVector {
    n: usize,
    values: Vec<f64>,
}

/// Flatten a symmetric, zero-diagonal matrix.
///
/// Fails with a shape error unless the matrix is exactly symmetric with an
/// exactly zero diagonal.
pub fn to_condensed(matrix: &DistanceMatrix) -> Result<CondensedVector> {
    let a = matrix.as_array();
    let n = matrix.n();
    let mut values = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        if a[[i, i]] != 0.0 {
            return Err(Error::shape(
                "zero diagonal",
                format!("entry ({i}, {i}) = {}", a[[i, i]]),
            ));
        }
        for j in (i + 1)..n {
            if a[[i, j]] != a[[j, i]] {
                return Err(Error::shape(
                    "symmetric matrix",
                    format!("({i}, {j}) = {} but ({j}, {i}) = {}", a[[i, j]], a[[j, i]]),
                ));
            }
            values.push(a[[i, j]]);
        }
    }
    Ok(CondensedVector { n, values })
}

impl CondensedVector {
    /// Wrap a flat vector, inferring n. Fails unless the length is n(n-1)/2.
    pub fn from_vec(values: Vec<f64>) -> Result<Self> {
        let m = values.len();
        let n = n_from_len(m).ok_or_else(|| {
            Error::shape("length n(n-1)/2 for some n", format!("length {m}"))
        })?;
        Ok(Self { n, values })
    }

    /// Number of records the vector describes.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when there are no pairs (n < 2).
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flat pair distances.
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Consume into the flat pair distances.
    pub fn into_vec(self) -> Vec<f64> {
        self.values
    }

    /// Offset of pair `(i, j)`, `i != j`, in the flat vector.
    #[inline]
    pub fn index(&self, i: usize, j: usize) -> usize {
        debug_assert!(i != j && i < self.n && j < self.n);
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        self.n * i - i * (i + 1) / 2 + (j - i - 1)
    }

    /// Distance between records `i` and `j` (0 when `i == j`).
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i == j {
            0.0
        } else {
            self.values[self.index(i, j)]
        }
    }

    /// Rebuild the square matrix.
    pub fn expand(&self) -> DistanceMatrix {
        let n = self.n;
        let mut data = Array2::<f64>::zeros((n, n));
        let mut k = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                data[[i, j]] = self.values[k];
                data[[j, i]] = self.values[k];
                k += 1;
            }
        }
        DistanceMatrix::from_square(data)
    }
}

/// Solve m = n(n-1)/2 for n.
fn n_from_len(m: usize) -> Option<usize> {
    let disc = 1 + 8 * m;
    let mut s = (disc as f64).sqrt() as usize;
    while s * s > disc {
        s -= 1;
    }
    while (s + 1) * (s + 1) <= disc {
        s += 1;
    }
    if s * s != disc {
        return None;
    }
    Some((1 + s) / 2)
}
