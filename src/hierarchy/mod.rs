//! Merge hierarchies and their projections.
//!
//! # Linkage Matrix
//!
//! Agglomerative clustering records its complete merge history as a
//! [`LinkageMatrix`]: one row per merge, ordered by distance.
//!
//! ```text
//!  step │ left  right  distance  size
//! ──────┼──────────────────────────────
//!    0  │   0     1      0.10      2     -> cluster 4
//!    1  │   2     3      0.20      2     -> cluster 5
//!    2  │   4     5      0.90      4     -> cluster 6 (root)
//! ```
//!
//! Drawn as a tree:
//!
//! ```text
//!         6 (height=0.9)
//!        / \
//!       4   5 (height=0.1, 0.2)
//!      / \ / \
//!     0  1 2  3 (leaves)
//! ```
//!
//! Key property: "cut" at any height to get any number of clusters
//! (see [`ClusterAssigner`](crate::cluster::ClusterAssigner)).
//!
//! # Projections
//!
//! - [`DendrogramProjector`]: truncated, threshold-colored drawing data
//! - [`validate_linkage`]: structural invariants as a [`ValidationReport`]

mod dendrogram;
mod linkage;
mod validate;

pub use dendrogram::{
    Branch, BranchChild, BranchColor, DendrogramLeaf, DendrogramProjector, DendrogramStructure,
};
pub use linkage::{LinkageMatrix, Merge};
pub use validate::{
    validate_linkage, HealthCheck, HealthReport, Severity, ValidationIssue, ValidationReport,
};
