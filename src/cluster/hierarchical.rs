//! Hierarchical (agglomerative) clustering with complete linkage.
//!
//! Bottom-up clustering that builds a **linkage matrix** by iteratively
//! merging the closest clusters. Cut the result at any k afterwards with
//! [`ClusterAssigner`](super::ClusterAssigner).
//!
//! # Complete Linkage
//!
//! The distance between two clusters is the largest distance between any
//! member of one and any member of the other:
//!
//! ```text
//! d(A, B) = max { d(a, b) : a ∈ A, b ∈ B }
//! ```
//!
//! After merging A and B the distance to any other cluster X follows from
//! the previous state alone (Lance-Williams form):
//!
//! ```text
//! d(A ∪ B, X) = max(d(A, X), d(B, X))
//! ```
//!
//! so the working matrix is updated in place instead of being recomputed
//! from the records. Compact, roughly spherical clusters result.
//!
//! # Determinism
//!
//! Each cluster lives in the slot of its smallest record index. Ties on
//! distance go to the pair with the lowest `(slot, slot)` ordering, so
//! identical input always yields an identical merge sequence.
//!
//! # Cost
//!
//! O(n²) memory for the working matrix. Every cluster caches its nearest
//! neighbour; a merge rescans only the rows whose neighbour was consumed.
//! Inherently sequential.

use crate::distance::CondensedVector;
use crate::error::{Error, Result};
use crate::hierarchy::LinkageMatrix;
use tracing::{debug, warn};

/// Default allowed dip in merge distance before a clamp is reported.
pub const DEFAULT_MONOTONIC_TOLERANCE: f64 = 1e-9;

/// Complete-linkage agglomerative clustering over a condensed vector.
#[derive(Debug, Clone)]
pub struct CompleteLinkage {
    /// Allowed dip in merge distance before it is reported.
    tolerance: f64,
    /// Fail instead of warning when a dip exceeds the tolerance.
    strict: bool,
}

impl Default for CompleteLinkage {
    fn default() -> Self {
        Self::new()
    }
}

impl CompleteLinkage {
    /// Create a builder with the default tolerance.
    pub fn new() -> Self {
        Self {
            tolerance: DEFAULT_MONOTONIC_TOLERANCE,
            strict: false,
        }
    }

    /// Set the monotonicity tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Return a numeric guard error instead of clamping large dips.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Build the full merge hierarchy (n-1 merges).
    pub fn fit(&self, condensed: &CondensedVector) -> Result<LinkageMatrix> {
        let n = condensed.n();
        if n < 2 {
            return Err(Error::Input(format!(
                "linkage needs at least 2 records, got {n}"
            )));
        }
        if let Some(k) = condensed.as_slice().iter().position(|d| !d.is_finite()) {
            return Err(Error::Input(format!(
                "non-finite distance at condensed offset {k}"
            )));
        }
        debug!(n_records = n, "building complete linkage");

        let mut state = State::new(condensed);
        let mut linkage = LinkageMatrix::new(n);
        let mut previous = f64::NEG_INFINITY;

        for step in 0..(n - 1) {
            let (a, b, raw) = state.closest_pair();
            let size = state.merge(a, b, n + step);

            let (distance, clamped) = self.guard(step, previous, raw)?;
            if clamped {
                linkage.mark_clamped(step);
            }
            previous = distance;

            linkage.add_merge(state.id_before[0], state.id_before[1], distance, size);
        }

        Ok(linkage)
    }

    /// Keep merge distances non-decreasing.
    ///
    /// Returns the distance to record and whether it was raised. Dips beyond
    /// the tolerance are logged, or rejected in strict mode.
    fn guard(&self, step: usize, previous: f64, raw: f64) -> Result<(f64, bool)> {
        if raw >= previous {
            return Ok((raw, false));
        }
        if previous - raw > self.tolerance {
            if self.strict {
                return Err(Error::NumericGuard {
                    step,
                    distance: raw,
                    previous,
                    tolerance: self.tolerance,
                });
            }
            warn!(
                step,
                distance = raw,
                previous,
                "non-monotonic merge distance clamped"
            );
        }
        Ok((previous, true))
    }
}

/// Working state of the agglomeration.
struct State {
    n: usize,
    /// Dense working distances between slots, row-major.
    dist: Vec<f64>,
    active: Vec<bool>,
    /// Current cluster id held by each slot.
    id: Vec<usize>,
    size: Vec<usize>,
    /// Nearest active neighbour per slot: (slot, distance).
    nearest: Vec<(usize, f64)>,
    /// Ids of the last merged pair, before relabeling.
    id_before: [usize; 2],
}

impl State {
    fn new(condensed: &CondensedVector) -> Self {
        let n = condensed.n();
        let mut dist = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = condensed.get(i, j);
                dist[i * n + j] = d;
                dist[j * n + i] = d;
            }
        }
        let mut state = Self {
            n,
            dist,
            active: vec![true; n],
            id: (0..n).collect(),
            size: vec![1; n],
            nearest: vec![(usize::MAX, f64::INFINITY); n],
            id_before: [0, 0],
        };
        for i in 0..n {
            state.nearest[i] = state.scan(i);
        }
        state
    }

    #[inline]
    fn d(&self, i: usize, j: usize) -> f64 {
        self.dist[i * self.n + j]
    }

    /// Nearest active slot to `i`; the lowest slot wins ties.
    fn scan(&self, i: usize) -> (usize, f64) {
        let mut best = (usize::MAX, f64::INFINITY);
        for j in 0..self.n {
            if j == i || !self.active[j] {
                continue;
            }
            let d = self.d(i, j);
            if d < best.1 {
                best = (j, d);
            }
        }
        best
    }

    /// Pair with the smallest `(distance, low slot, high slot)`.
    fn closest_pair(&self) -> (usize, usize, f64) {
        let mut best: Option<(f64, usize, usize)> = None;
        for i in 0..self.n {
            if !self.active[i] {
                continue;
            }
            let (j, d) = self.nearest[i];
            if j == usize::MAX {
                continue;
            }
            let cand = (d, i.min(j), i.max(j));
            let better = match best {
                None => true,
                Some(b) => cand
                    .0
                    .total_cmp(&b.0)
                    .then(cand.1.cmp(&b.1))
                    .then(cand.2.cmp(&b.2))
                    .is_lt(),
            };
            if better {
                best = Some(cand);
            }
        }
        let (d, a, b) = best.unwrap_or((f64::INFINITY, 0, 0));
        (a, b, d)
    }

    /// Merge slot `b` into slot `a` (`a < b`) as cluster `new_id`.
    /// Returns the size of the merged cluster.
    fn merge(&mut self, a: usize, b: usize, new_id: usize) -> usize {
        let n = self.n;
        for x in 0..n {
            if !self.active[x] || x == a || x == b {
                continue;
            }
            let d = self.d(a, x).max(self.d(b, x));
            self.dist[a * n + x] = d;
            self.dist[x * n + a] = d;
        }

        self.id_before = [self.id[a], self.id[b]];
        self.active[b] = false;
        self.id[a] = new_id;
        self.size[a] += self.size[b];

        // Distances to the merged slot only grow, so rows pointing elsewhere stay valid.
        for x in 0..n {
            if !self.active[x] || x == a {
                continue;
            }
            let (nn, _) = self.nearest[x];
            if nn == a || nn == b {
                self.nearest[x] = self.scan(x);
            }
        }
        self.nearest[a] = self.scan(a);
        self.nearest[b] = (usize::MAX, f64::INFINITY);

        self.size[a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::{to_condensed, DistanceMatrix};

    fn condensed(rows: &[Vec<f64>]) -> CondensedVector {
        to_condensed(&DistanceMatrix::from_rows(rows).unwrap()).unwrap()
    }

    #[test]
    fn test_complete_linkage_basic() {
        // Two tight pairs far apart.
        let c = condensed(&[
            vec![0.0, 0.1, 0.8, 0.9],
            vec![0.1, 0.0, 0.7, 0.85],
            vec![0.8, 0.7, 0.0, 0.2],
            vec![0.9, 0.85, 0.2, 0.0],
        ]);
        let z = CompleteLinkage::new().fit(&c).unwrap();

        assert_eq!(z.n_merges(), 3);
        let m = z.merges();
        assert_eq!((m[0].left, m[0].right, m[0].distance, m[0].size), (0, 1, 0.1, 2));
        assert_eq!((m[1].left, m[1].right, m[1].distance, m[1].size), (2, 3, 0.2, 2));
        // max over members, not min
        assert_eq!((m[2].left, m[2].right, m[2].distance, m[2].size), (4, 5, 0.9, 4));
    }

    #[test]
    fn test_complete_uses_maximum() {
        // Single linkage would join 2 to {0,1} at 0.3; complete waits for 0.6.
        let c = condensed(&[
            vec![0.0, 0.1, 0.3, 0.9],
            vec![0.1, 0.0, 0.6, 0.9],
            vec![0.3, 0.6, 0.0, 0.5],
            vec![0.9, 0.9, 0.5, 0.0],
        ]);
        let z = CompleteLinkage::new().fit(&c).unwrap();
        assert_eq!(z.merges()[1].left, 2);
        assert_eq!(z.merges()[1].right, 3);
        assert_eq!(z.merges()[1].distance, 0.5);
        assert_eq!(z.merges()[2].distance, 0.9);
    }

    #[test]
    fn test_ties_prefer_lowest_indices() {
        let c = condensed(&[
            vec![0.0, 0.5, 0.5, 0.5],
            vec![0.5, 0.0, 0.5, 0.5],
            vec![0.5, 0.5, 0.0, 0.5],
            vec![0.5, 0.5, 0.5, 0.0],
        ]);
        let z = CompleteLinkage::new().fit(&c).unwrap();
        let pairs: Vec<(usize, usize)> = z.merges().iter().map(|m| (m.left, m.right)).collect();
        assert_eq!(pairs, vec![(0, 1), (2, 4), (3, 5)]);
    }

    #[test]
    fn test_too_few_records() {
        let c = CondensedVector::from_vec(vec![]).unwrap();
        assert!(matches!(CompleteLinkage::new().fit(&c), Err(Error::Input(_))));
    }

    #[test]
    fn test_non_finite_rejected() {
        let c = CondensedVector::from_vec(vec![0.1, f64::NAN, 0.3]).unwrap();
        assert!(matches!(CompleteLinkage::new().fit(&c), Err(Error::Input(_))));
    }

    #[test]
    fn test_two_records() {
        let c = CondensedVector::from_vec(vec![0.4]).unwrap();
        let z = CompleteLinkage::new().fit(&c).unwrap();
        assert_eq!(z.merges(), &[crate::hierarchy::Merge {
            left: 0,
            right: 1,
            distance: 0.4,
            size: 2
        }]);
        assert!(z.clamped_steps().is_empty());
    }

    #[test]
    fn test_guard_passes_increasing_distances() {
        let cl = CompleteLinkage::new();
        assert_eq!(cl.guard(0, f64::NEG_INFINITY, 0.3).unwrap(), (0.3, false));
        assert_eq!(cl.guard(1, 0.3, 0.3).unwrap(), (0.3, false));
    }

    #[test]
    fn test_guard_clamps_small_dip() {
        let cl = CompleteLinkage::new().with_tolerance(1e-9);
        assert_eq!(cl.guard(3, 0.5, 0.5 - 1e-12).unwrap(), (0.5, true));
        // strict mode tolerates dips within the tolerance
        let strict = cl.with_strict(true);
        assert_eq!(strict.guard(3, 0.5, 0.5 - 1e-12).unwrap(), (0.5, true));
    }

    #[test]
    fn test_guard_clamps_large_dip_when_lenient() {
        let cl = CompleteLinkage::new().with_tolerance(1e-9);
        assert_eq!(cl.guard(2, 0.5, 0.4).unwrap(), (0.5, true));
    }

    #[test]
    fn test_guard_strict_rejects_large_dip() {
        let cl = CompleteLinkage::new().with_tolerance(1e-9).with_strict(true);
        let err = cl.guard(2, 0.5, 0.4).unwrap_err();
        match err {
            Error::NumericGuard {
                step,
                distance,
                previous,
                tolerance,
            } => {
                assert_eq!(step, 2);
                assert_eq!(distance, 0.4);
                assert_eq!(previous, 0.5);
                assert_eq!(tolerance, 1e-9);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
