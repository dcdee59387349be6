//! # mixclust
//!
//! Hierarchical clustering of mixed numeric/categorical records: Gower
//! distances, complete linkage, truncated colored dendrograms, and fixed-k
//! flat cuts.
//!
//! ```text
//! Table ─► Gower ─► DistanceMatrix ─► CondensedVector ─► CompleteLinkage
//!                    (cached)                               │
//!                                          LinkageMatrix ◄──┘
//!                                           │          │
//!                             DendrogramProjector   ClusterAssigner
//! ```
//!
//! **Default build** enables row-parallel distance computation (`parallel`).
//! [`Pipeline`] wires the stages together; each stage is also usable on its own.

pub mod cluster;
pub mod config;
pub mod distance;
/// Error types used across `mixclust`.
pub mod error;
pub mod hierarchy;
pub mod pipeline;
pub mod report;
pub mod table;

pub use cluster::{ClusterAssigner, ClusterLabeling, CompleteLinkage};
pub use config::{DendrogramRequest, PipelineConfig};
pub use distance::{CachePolicy, CondensedVector, DistanceMatrix, Gower, GowerCache};
pub use error::{Error, Result, Stage};
pub use hierarchy::{DendrogramProjector, DendrogramStructure, LinkageMatrix};
pub use pipeline::{ConfiguredRun, Pipeline, PipelineRun};
pub use report::{cluster_sizes, crosstab_normalized, CrossTab};
pub use table::{classify_columns, FeatureKind, Table, Value};
