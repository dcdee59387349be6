//! Content-addressed cache for Gower distance matrices.
//!
//! The key is a SHA-256 fingerprint of the table's values and the type-tag
//! vector. Entries are written once and shared as `Arc`s. Nothing is
//! invalidated behind the caller's back: changed data produces a new key,
//! and removal is explicit (or, under [`CachePolicy::Bounded`], oldest
//! insertion first).

use super::gower::Gower;
use super::matrix::DistanceMatrix;
use crate::error::Result;
use crate::table::{FeatureKind, Table, Value};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Fingerprint of a table plus its feature kinds.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    /// Fingerprint `table` and `kinds`.
    pub fn of(table: &Table, kinds: &[FeatureKind]) -> Self {
        let mut h = Sha256::new();
        h.update((table.n_rows() as u64).to_le_bytes());
        h.update((table.n_cols() as u64).to_le_bytes());
        h.update((kinds.len() as u64).to_le_bytes());
        for kind in kinds {
            h.update([match kind {
                FeatureKind::Numeric => 0u8,
                FeatureKind::Categorical => 1u8,
            }]);
        }
        for row in table.rows() {
            for value in row {
                match value {
                    v if v.is_missing() => h.update([0u8]),
                    Value::Number(x) => {
                        h.update([1u8]);
                        // -0.0 and 0.0 compare equal, so hash them equal.
                        h.update((if *x == 0.0 { 0.0f64 } else { *x }).to_bits().to_le_bytes());
                    }
                    Value::Bool(b) => h.update([2u8, u8::from(*b)]),
                    Value::Text(s) => {
                        h.update([3u8]);
                        h.update((s.len() as u64).to_le_bytes());
                        h.update(s.as_bytes());
                    }
                    Value::Missing => h.update([0u8]),
                }
            }
        }
        Self(h.finalize().into())
    }

    /// Use a caller-chosen key.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Raw digest.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", &self.to_hex()[..16])
    }
}

/// Eviction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Keep every entry until removed explicitly.
    #[default]
    Unbounded,
    /// Keep at most this many entries, evicting the oldest insertion.
    Bounded(usize),
}

/// Hit/miss counters and current size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to compute.
    pub misses: u64,
    /// Entries currently stored.
    pub entries: usize,
}

#[derive(Default)]
struct Store {
    map: HashMap<CacheKey, Arc<DistanceMatrix>>,
    order: VecDeque<CacheKey>,
}

/// Explicit memo for [`Gower::compute`].
pub struct GowerCache {
    store: RwLock<Store>,
    policy: CachePolicy,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Default for GowerCache {
    fn default() -> Self {
        Self::new(CachePolicy::Unbounded)
    }
}

impl fmt::Debug for GowerCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GowerCache")
            .field("policy", &self.policy)
            .field("stats", &self.stats())
            .finish()
    }
}

impl GowerCache {
    /// Create an empty cache.
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            store: RwLock::new(Store::default()),
            policy,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Eviction policy in force.
    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Look up an entry.
    pub fn get(&self, key: &CacheKey) -> Option<Arc<DistanceMatrix>> {
        self.store.read().map.get(key).cloned()
    }

    /// Store `matrix` under `key` unless an entry already exists.
    ///
    /// Returns the stored entry, which is the earlier one on a race.
    pub fn insert(&self, key: CacheKey, matrix: DistanceMatrix) -> Arc<DistanceMatrix> {
        let mut store = self.store.write();
        if let Some(existing) = store.map.get(&key) {
            return Arc::clone(existing);
        }
        if let CachePolicy::Bounded(max) = self.policy {
            while store.map.len() >= max.max(1) {
                let Some(oldest) = store.order.pop_front() else {
                    break;
                };
                store.map.remove(&oldest);
                warn!(key = ?oldest, "evicted gower matrix from bounded cache");
            }
        }
        let entry = Arc::new(matrix);
        store.map.insert(key, Arc::clone(&entry));
        store.order.push_back(key);
        entry
    }

    /// Return the cached matrix for `key`, computing it with `compute` on a miss.
    ///
    /// No lock is held while `compute` runs.
    pub fn get_or_compute<F>(&self, key: CacheKey, compute: F) -> Result<Arc<DistanceMatrix>>
    where
        F: FnOnce() -> Result<DistanceMatrix>,
    {
        if let Some(hit) = self.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(?key, "gower cache hit");
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(?key, "gower cache miss");
        let matrix = compute()?;
        Ok(self.insert(key, matrix))
    }

    /// Fingerprint the inputs and compute through the cache.
    pub fn distances(
        &self,
        gower: &Gower,
        table: &Table,
        kinds: &[FeatureKind],
    ) -> Result<Arc<DistanceMatrix>> {
        let key = CacheKey::of(table, kinds);
        self.get_or_compute(key, || gower.compute(table, kinds))
    }

    /// Drop one entry.
    pub fn remove(&self, key: &CacheKey) -> Option<Arc<DistanceMatrix>> {
        let mut store = self.store.write();
        store.order.retain(|k| k != key);
        store.map.remove(key)
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        let mut store = self.store.write();
        store.map.clear();
        store.order.clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.store.read().map.len()
    }

    /// `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::classify_columns;

    fn table(years: &[i32]) -> Table {
        Table::from_columns(vec![
            ("year".into(), years.iter().map(|&y| Value::from(y)).collect()),
            (
                "state".into(),
                years
                    .iter()
                    .map(|y| Value::from(if y % 2 == 0 { "A" } else { "B" }))
                    .collect(),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_key_is_content_addressed() {
        let a = table(&[1999, 2005, 2019]);
        let b = table(&[1999, 2005, 2019]);
        let c = table(&[1999, 2005, 2018]);
        let kinds = classify_columns(&a);

        assert_eq!(CacheKey::of(&a, &kinds), CacheKey::of(&b, &kinds));
        assert_ne!(CacheKey::of(&a, &kinds), CacheKey::of(&c, &kinds));
        assert_ne!(
            CacheKey::of(&a, &kinds),
            CacheKey::of(&a, &[FeatureKind::Categorical, FeatureKind::Categorical])
        );
    }

    #[test]
    fn test_hit_returns_same_entry() {
        let cache = GowerCache::default();
        let gower = Gower::new();
        let t = table(&[1999, 2005, 2019]);
        let kinds = classify_columns(&t);

        let first = cache.distances(&gower, &t, &kinds).unwrap();
        let second = cache.distances(&gower, &t, &kinds).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );

        let changed = table(&[1999, 2005, 2020]);
        let third = cache.distances(&gower, &changed, &kinds).unwrap();
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failed_compute_is_not_cached() {
        let cache = GowerCache::default();
        let key = CacheKey::from_bytes([7; 32]);
        let err = cache.get_or_compute(key, || Err(crate::Error::Input("boom".into())));
        assert!(err.is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bounded_policy_evicts_oldest() {
        let cache = GowerCache::new(CachePolicy::Bounded(2));
        let m = DistanceMatrix::from_rows(&[vec![0.0]]).unwrap();
        let keys: Vec<CacheKey> = (0..3u8).map(|i| CacheKey::from_bytes([i; 32])).collect();
        for k in &keys {
            cache.insert(*k, m.clone());
        }
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&keys[0]).is_none());
        assert!(cache.get(&keys[2]).is_some());

        cache.remove(&keys[2]);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
