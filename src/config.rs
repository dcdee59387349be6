//! Pipeline configuration.
//!
//! Every field has a default, so a config file only needs the parts it
//! changes:
//!
//! ```json
//! {
//!   "cluster_counts": [3, 4],
//!   "dendrograms": [
//!     { "threshold": 0.53, "depth": 6 },
//!     { "threshold": 0.50 }
//!   ],
//!   "cache": { "bounded": 8 }
//! }
//! ```
//!
//! Dendrogram color thresholds have no default: they depend on the data
//! and must be chosen by the caller.

use crate::cluster::DEFAULT_MONOTONIC_TOLERANCE;
use crate::distance::CachePolicy;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default number of dendrogram levels expanded below the root.
pub const DEFAULT_TRUNCATION_DEPTH: usize = 6;

fn default_depth() -> usize {
    DEFAULT_TRUNCATION_DEPTH
}

/// One dendrogram rendering request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DendrogramRequest {
    /// Merges below this distance are colored by subtree.
    pub threshold: f64,
    /// Levels expanded below the root before subtrees collapse.
    #[serde(default = "default_depth")]
    pub depth: usize,
}

impl DendrogramRequest {
    /// Request with the default truncation depth.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            depth: DEFAULT_TRUNCATION_DEPTH,
        }
    }

    /// Set the truncation depth.
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }
}

/// Settings for [`Pipeline`](crate::pipeline::Pipeline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Flat cluster counts evaluated by `run_configured`.
    pub cluster_counts: Vec<usize>,
    /// Dendrograms projected by `run_configured`.
    pub dendrograms: Vec<DendrogramRequest>,
    /// Allowed dip in merge distance before it is reported.
    pub monotonic_tolerance: f64,
    /// Fail instead of clamping when a dip exceeds the tolerance.
    pub strict_monotonic: bool,
    /// Compute Gower rows in parallel.
    pub parallel: bool,
    /// Distance cache eviction policy.
    pub cache: CachePolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cluster_counts: vec![3, 4],
            dendrograms: Vec::new(),
            monotonic_tolerance: DEFAULT_MONOTONIC_TOLERANCE,
            strict_monotonic: false,
            parallel: true,
            cache: CachePolicy::Unbounded,
        }
    }
}

impl PipelineConfig {
    /// Parse from JSON and validate.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the cluster counts.
    pub fn with_cluster_counts(mut self, counts: impl Into<Vec<usize>>) -> Self {
        self.cluster_counts = counts.into();
        self
    }

    /// Add a dendrogram request.
    pub fn with_dendrogram(mut self, request: DendrogramRequest) -> Self {
        self.dendrograms.push(request);
        self
    }

    /// Set the monotonicity tolerance.
    pub fn with_monotonic_tolerance(mut self, tolerance: f64) -> Self {
        self.monotonic_tolerance = tolerance;
        self
    }

    /// Fail on large monotonicity violations instead of clamping.
    pub fn with_strict_monotonic(mut self, strict: bool) -> Self {
        self.strict_monotonic = strict;
        self
    }

    /// Toggle parallel distance computation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set the cache policy.
    pub fn with_cache(mut self, policy: CachePolicy) -> Self {
        self.cache = policy;
        self
    }

    /// Reject values no stage could accept.
    ///
    /// Cluster counts above the record count are only known to be invalid
    /// once data arrives, so they fail later in the assign stage.
    pub fn validate(&self) -> Result<()> {
        if self.cluster_counts.contains(&0) {
            return Err(Error::argument("cluster_counts", "cluster counts must be at least 1"));
        }
        if !(self.monotonic_tolerance >= 0.0) {
            return Err(Error::argument(
                "monotonic_tolerance",
                format!("{} is not a non-negative number", self.monotonic_tolerance),
            ));
        }
        for req in &self.dendrograms {
            if req.depth == 0 {
                return Err(Error::argument("depth", "truncation depth must be at least 1"));
            }
            if !(0.0..=1.0).contains(&req.threshold) {
                return Err(Error::argument(
                    "color_threshold",
                    format!("{} is outside [0, 1]", req.threshold),
                ));
            }
        }
        if self.cache == CachePolicy::Bounded(0) {
            return Err(Error::argument("cache", "bounded cache needs room for one entry"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.cluster_counts, vec![3, 4]);
        assert!(config.dendrograms.is_empty());
        assert_eq!(config.monotonic_tolerance, 1e-9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json() {
        let config = PipelineConfig::from_json_str(
            r#"{
                "cluster_counts": [3, 4],
                "dendrograms": [
                    { "threshold": 0.53, "depth": 6 },
                    { "threshold": 0.5 }
                ],
                "cache": { "bounded": 8 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.dendrograms[1], DendrogramRequest::new(0.5));
        assert_eq!(config.cache, CachePolicy::Bounded(8));
        assert!(config.parallel);
    }

    #[test]
    fn test_invalid_values() {
        let err = PipelineConfig::from_json_str(r#"{ "cluster_counts": [0] }"#).unwrap_err();
        assert!(matches!(err, Error::Argument { name: "cluster_counts", .. }));

        let err = PipelineConfig::from_json_str(r#"{ "dendrograms": [{ "threshold": -1.0 }] }"#)
            .unwrap_err();
        assert!(matches!(err, Error::Argument { name: "color_threshold", .. }));

        let err = PipelineConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_builder() {
        let config = PipelineConfig::default()
            .with_cluster_counts([2])
            .with_dendrogram(DendrogramRequest::new(0.4).with_depth(3))
            .with_strict_monotonic(true)
            .with_cache(CachePolicy::Bounded(2));
        assert_eq!(config.cluster_counts, vec![2]);
        assert_eq!(config.dendrograms[0].depth, 3);
        assert!(config.validate().is_ok());
    }
}
