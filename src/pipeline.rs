//! End-to-end orchestration: distances, condensed vector, linkage, and the
//! per-request cuts and dendrograms on top.
//!
//! ```rust
//! use mixclust::pipeline::Pipeline;
//! use mixclust::table::{classify_columns, Table, Value};
//! use mixclust::PipelineConfig;
//!
//! let table = Table::new(
//!     vec!["year".into(), "state".into()],
//!     vec![
//!         vec![Value::from(2019), Value::from("PA")],
//!         vec![Value::from(2019), Value::from("PA")],
//!         vec![Value::from(2020), Value::from("AM")],
//!         vec![Value::from(2020), Value::from("AM")],
//!     ],
//! )
//! .unwrap();
//! let kinds = classify_columns(&table);
//!
//! let pipeline = Pipeline::new(PipelineConfig::default());
//! let run = pipeline.run(&table, &kinds).unwrap();
//! assert_eq!(run.labels(2).unwrap().labels(), &[1, 1, 2, 2]);
//! ```

use crate::cluster::{ClusterAssigner, ClusterLabeling, CompleteLinkage};
use crate::config::PipelineConfig;
use crate::distance::{to_condensed, CacheKey, CondensedVector, DistanceMatrix, Gower, GowerCache};
use crate::error::{Result, Stage};
use crate::hierarchy::{
    DendrogramProjector, DendrogramStructure, HealthCheck, HealthReport, LinkageMatrix,
};
use crate::table::{FeatureKind, Table};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Runs the clustering stages with a shared distance cache.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    gower: Gower,
    linkage: CompleteLinkage,
    cache: Arc<GowerCache>,
}

impl Pipeline {
    /// Build a pipeline with its own cache.
    pub fn new(config: PipelineConfig) -> Self {
        let cache = Arc::new(GowerCache::new(config.cache));
        Self::with_cache(config, cache)
    }

    /// Build a pipeline over an existing cache, e.g. one shared with
    /// another pipeline. The config's cache policy is ignored.
    pub fn with_cache(config: PipelineConfig, cache: Arc<GowerCache>) -> Self {
        let gower = Gower::new().with_parallel(config.parallel);
        let linkage = CompleteLinkage::new()
            .with_tolerance(config.monotonic_tolerance)
            .with_strict(config.strict_monotonic);
        Self {
            config,
            gower,
            linkage,
            cache,
        }
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Distance cache.
    pub fn cache(&self) -> &Arc<GowerCache> {
        &self.cache
    }

    /// Compute distances (through the cache), condense, and link.
    ///
    /// Nothing is returned unless all three stages succeed.
    #[instrument(skip_all, fields(n_records = table.n_rows(), n_features = table.n_cols()))]
    pub fn run(&self, table: &Table, kinds: &[FeatureKind]) -> Result<PipelineRun> {
        let key = CacheKey::of(table, kinds);
        let distances = self
            .cache
            .get_or_compute(key, || self.gower.compute(table, kinds))
            .map_err(|e| e.at(Stage::Distance))?;
        let condensed = to_condensed(&distances).map_err(|e| e.at(Stage::Condense))?;
        let linkage = self
            .linkage
            .fit(&condensed)
            .map_err(|e| e.at(Stage::Linkage))?;

        let health = linkage.health_check();
        if !health.is_healthy() {
            warn!(report = %health.validation, "linkage failed validation");
        }
        info!(
            n_records = table.n_rows(),
            n_clamped = health.n_clamped,
            root_distance = linkage.merges().last().map(|m| m.distance),
            "linkage complete"
        );
        Ok(PipelineRun {
            key,
            distances,
            condensed,
            linkage,
        })
    }

    /// [`run`](Self::run), then every cluster count and dendrogram request
    /// in the config.
    #[instrument(skip_all)]
    pub fn run_configured(&self, table: &Table, kinds: &[FeatureKind]) -> Result<ConfiguredRun> {
        let run = self.run(table, kinds)?;
        let labelings = self
            .config
            .cluster_counts
            .iter()
            .map(|&k| run.labels(k))
            .collect::<Result<Vec<_>>>()?;
        let dendrograms = self
            .config
            .dendrograms
            .iter()
            .map(|req| run.dendrogram(req.threshold, req.depth))
            .collect::<Result<Vec<_>>>()?;

        info!(
            labelings = labelings.len(),
            dendrograms = dendrograms.len(),
            "pipeline complete"
        );
        Ok(ConfiguredRun {
            run,
            labelings,
            dendrograms,
        })
    }
}

/// Artifacts of one successful [`Pipeline::run`].
///
/// Cuts and projections only read the linkage, so an invalid `k` or
/// threshold leaves the run usable for the next request.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    key: CacheKey,
    distances: Arc<DistanceMatrix>,
    condensed: CondensedVector,
    linkage: LinkageMatrix,
}

impl PipelineRun {
    /// Cache key of the input.
    pub fn key(&self) -> CacheKey {
        self.key
    }

    /// Dense Gower matrix.
    pub fn distances(&self) -> &DistanceMatrix {
        &self.distances
    }

    /// Upper triangle of the distance matrix.
    pub fn condensed(&self) -> &CondensedVector {
        &self.condensed
    }

    /// Merge history.
    pub fn linkage(&self) -> &LinkageMatrix {
        &self.linkage
    }

    /// Structural checks and summary statistics of the merge history.
    pub fn health(&self) -> HealthReport {
        self.linkage.health_check()
    }

    /// Cut into exactly `k` flat clusters.
    pub fn labels(&self, k: usize) -> Result<ClusterLabeling> {
        ClusterAssigner::new(k)
            .assign(&self.linkage)
            .map_err(|e| e.at(Stage::Assign))
    }

    /// Project a truncated, colored dendrogram.
    pub fn dendrogram(&self, threshold: f64, depth: usize) -> Result<DendrogramStructure> {
        DendrogramProjector::new(depth, threshold)
            .project(&self.linkage)
            .map_err(|e| e.at(Stage::Dendrogram))
    }
}

/// A [`PipelineRun`] plus the labelings and dendrograms the config asked for,
/// in config order.
#[derive(Debug, Clone)]
pub struct ConfiguredRun {
    /// Underlying artifacts.
    pub run: PipelineRun,
    /// One labeling per configured cluster count.
    pub labelings: Vec<ClusterLabeling>,
    /// One structure per configured dendrogram request.
    pub dendrograms: Vec<DendrogramStructure>,
}
