//! # fiedler
//!
//! Spectral clustering as a pipeline of swappable stages:
//!
//! ```text
//! standardisation → affinity → refinement → laplacian
//!     → decomposition → embedding → clustering → confidence
//! ```
//!
//! Each stage is chosen by a typed variant in [`PipelineConfig`]. The
//! configuration is validated once, when [`SpectralClustering`] is built, and
//! every stage checks the kind of matrix it receives, so a bad combination
//! fails before any data is touched or with an error naming the stage.
//!
//! ```rust
//! use fiedler::{datasets::make_moons, metrics::ari, SpectralClustering};
//!
//! let (points, truth) = make_moons(200, 0.01, 42).unwrap();
//! let model = SpectralClustering::from_options(2, &[("refinement", "eps"), ("eps", "0.4")]).unwrap();
//! let labels = model.fit(&points).unwrap();
//! assert!(ari(&labels, &truth) > 0.9);
//! ```
//!
//! **Default build** uses dense solvers from `faer` plus the `sprs`-backed
//! sparse solvers. `parallel` spreads the pairwise-distance loop and k-means
//! assignment over `rayon`.

pub mod affinity;
pub mod bench;
pub mod cluster;
pub mod config;
pub mod datasets;
/// Error types used across `fiedler`.
pub mod error;
pub mod graph;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod spectral;
pub mod standardise;

pub use config::{
    ClusteringMethod, Confidence, Decomposition, Embedding, LaplacianKind, Metric,
    PipelineConfig, Refinement, Standardisation, StageVariant,
};
pub use error::{Error, Result};
pub use metrics::{ari, nmi, purity, same_partition};
pub use model::{FitReport, SpectralClustering};
pub use pipeline::{Artifact, Diagnostics, Pipeline, Stage};
pub use spectral::EigenPairs;
