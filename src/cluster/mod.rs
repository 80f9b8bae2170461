//! Clustering of the spectral embedding.
//!
//! ## K-means
//!
//! Assign each point to the nearest centroid, then move each centroid to the
//! mean of its points. Repeat.
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! On the `n × 1` Fiedler embedding the clusters are intervals of the
//! Fiedler vector, so k-means is effectively a data-driven threshold.
//! Labels are only defined up to permutation.
//!
//! ## Usage
//!
//! ```rust
//! use fiedler::cluster::{Clustering, Kmeans};
//! use ndarray::array;
//!
//! let data = array![[0.0, 0.0], [0.1, 0.1], [10.0, 10.0], [10.1, 10.1]];
//!
//! let labels = Kmeans::new(2).with_seed(42).fit_predict(data.view()).unwrap();
//! assert_eq!(labels[0], labels[1]);  // First two together
//! assert_ne!(labels[0], labels[2]);  // Separate from last two
//! ```
//!
//! The confidence stage that follows clustering currently passes labels
//! through unchanged.

mod confidence;
mod kmeans;
mod traits;

pub use confidence::ConfidenceStage;
pub use kmeans::{Kmeans, KmeansStage};
pub use traits::Clustering;
