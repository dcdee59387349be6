//! Mixed-type dissimilarities and their pairwise representations.
//!
//! # Gower Distance
//!
//! Records mixing numeric and categorical attributes have no natural
//! Minkowski norm: a dummy indicator and a year cannot share one scale
//! without implicit, arbitrary weighting. Gower's coefficient sidesteps
//! this by scoring each attribute on its own [0, 1] scale and averaging:
//!
//! ```text
//! numeric:      s_f(i, j) = |x_if - x_jf| / range_f
//! categorical:  s_f(i, j) = 0 if x_if == x_jf else 1
//!
//! d(i, j) = Σ_f δ_f(i, j) s_f(i, j) / Σ_f δ_f(i, j)
//! ```
//!
//! where `δ_f(i, j)` is 0 when attribute f cannot be compared for the pair
//! (missing values) and 1 otherwise.
//!
//! # Representations
//!
//! | Type | Storage | Use |
//! |------|---------|-----|
//! | [`DistanceMatrix`] | n × n dense | Inspection, export |
//! | [`CondensedVector`] | n(n-1)/2 upper triangle | Linkage input |
//!
//! [`GowerCache`] memoizes [`Gower::compute`] under an explicit content key.

mod cache;
pub mod condensed;
mod gower;
mod matrix;

pub use cache::{CacheKey, CachePolicy, CacheStats, GowerCache};
pub use condensed::{to_condensed, CondensedVector};
pub use gower::Gower;
pub use matrix::DistanceMatrix;
