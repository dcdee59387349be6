//! Agglomerative clustering and flat cuts.
//!
//! ## Hierarchical (Agglomerative) Clustering
//!
//! Bottom-up: start with each record as its own cluster, repeatedly merge
//! the two closest clusters until one remains. The merge history forms a
//! [`LinkageMatrix`](crate::hierarchy::LinkageMatrix) you can cut at any k.
//!
//! **Linkage methods** determine "distance between clusters":
//!
//! | Linkage | Distance | Effect |
//! |---------|----------|--------|
//! | Single | min(pairwise) | Chaining; elongated clusters |
//! | Complete | max(pairwise) | Compact, spherical clusters |
//!
//! Only complete linkage is provided. It works on any dissimilarity,
//! including Gower, since it never needs centroids.
//!
//! ## Maxclust Cuts
//!
//! [`ClusterAssigner`] fixes the number of clusters in advance and derives
//! the cut height from the hierarchy.
//!
//! ## Usage
//!
//! ```rust
//! use mixclust::cluster::{ClusterAssigner, CompleteLinkage};
//! use mixclust::distance::CondensedVector;
//!
//! // 0-1 and 2-3 are close; the pairs are far apart.
//! let c = CondensedVector::from_vec(vec![0.1, 0.8, 0.9, 0.7, 0.85, 0.2]).unwrap();
//! let z = CompleteLinkage::new().fit(&c).unwrap();
//! let labels = ClusterAssigner::new(2).assign(&z).unwrap();
//! assert_eq!(labels.labels(), &[1, 1, 2, 2]);
//! ```

mod hierarchical;
mod maxclust;

pub use hierarchical::{CompleteLinkage, DEFAULT_MONOTONIC_TOLERANCE};
pub use maxclust::{ClusterAssigner, ClusterLabeling};
