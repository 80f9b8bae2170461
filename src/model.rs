//! Spectral clustering facade.
//!
//! # Example
//!
//! ```rust
//! use fiedler::{PipelineConfig, SpectralClustering};
//! use ndarray::array;
//!
//! let points = array![
//!     [0.0, 0.0], [0.1, 0.0], [0.0, 0.1],  // Cluster 1
//!     [5.0, 5.0], [5.1, 5.0], [5.0, 5.1],  // Cluster 2
//! ];
//!
//! let config = PipelineConfig::from_pairs(&[("refinement", "knn"), ("k", "2")]).unwrap();
//! let model = SpectralClustering::new(2, config).unwrap();
//! let labels = model.fit(&points).unwrap();
//! assert_eq!(labels[0], labels[1]);
//! assert_ne!(labels[0], labels[3]);
//! ```

use std::time::Duration;

use log::info;
use ndarray::{Array2, ArrayView2};

use crate::cluster::Clustering;
use crate::config::{PipelineConfig, StageVariant};
use crate::error::{Error, Result};
use crate::pipeline::{Diagnostics, Pipeline};

/// Labels plus everything the pipeline observed while producing them.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    /// One label per input row, in `[0, num_clusters)`.
    pub labels: Vec<usize>,
    /// Per-stage timings and spectral diagnostics.
    pub diagnostics: Diagnostics,
}

impl FitReport {
    /// Stage names in execution order.
    pub fn stages(&self) -> Vec<&'static str> {
        self.diagnostics.timings.iter().map(|t| t.stage).collect()
    }

    /// λ₂ was not distinguishable from zero.
    pub fn disconnected(&self) -> bool {
        self.diagnostics.disconnected
    }

    /// Total wall-clock time across stages.
    pub fn elapsed(&self) -> Duration {
        self.diagnostics.total()
    }
}

/// Spectral clustering configuration and runner.
///
/// The configuration is validated and the stages are built once, at
/// construction; `fit` only checks the data against them.
#[derive(Debug)]
pub struct SpectralClustering {
    num_clusters: usize,
    config: PipelineConfig,
    pipeline: Pipeline,
}

impl SpectralClustering {
    /// Validate `config` and build the pipeline.
    pub fn new(num_clusters: usize, config: PipelineConfig) -> Result<Self> {
        let pipeline = Pipeline::new(&config, num_clusters)?;
        Ok(Self {
            num_clusters,
            config,
            pipeline,
        })
    }

    /// Default configuration.
    pub fn with_defaults(num_clusters: usize) -> Result<Self> {
        Self::new(num_clusters, PipelineConfig::default())
    }

    /// Configuration from `(stage, variant)` / `(parameter, value)` string pairs.
    pub fn from_options(num_clusters: usize, options: &[(&str, &str)]) -> Result<Self> {
        Self::new(num_clusters, PipelineConfig::from_pairs(options)?)
    }

    /// The validated configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Number of clusters requested.
    pub fn num_clusters(&self) -> usize {
        self.num_clusters
    }

    /// Cluster the rows of `points`.
    pub fn fit(&self, points: &Array2<f64>) -> Result<Vec<usize>> {
        self.fit_report(points).map(|report| report.labels)
    }

    /// Cluster the rows of `points`, keeping per-stage diagnostics.
    pub fn fit_report(&self, points: &Array2<f64>) -> Result<FitReport> {
        let (n, d) = points.dim();
        if n == 0 || d == 0 {
            return Err(Error::EmptyInput);
        }
        self.config.validate_for(self.num_clusters, n)?;
        info!(
            "spectral clustering: {n} points, {d} features, {} clusters [{}]",
            self.num_clusters, self.config
        );

        let (artifact, diagnostics) = self.pipeline.run(points)?;
        let labels = artifact.into_labels("fit")?;
        if diagnostics.disconnected {
            info!(
                "fit finished on a disconnected graph (λ₂ = {:e})",
                diagnostics.lambda2.unwrap_or(0.0)
            );
        }
        Ok(FitReport {
            labels,
            diagnostics,
        })
    }

    /// Out-of-sample assignment.
    ///
    /// Spectral embeddings do not extend to unseen points, so this always fails.
    pub fn predict(&self, _points: &Array2<f64>) -> Result<Vec<usize>> {
        Err(Error::Unsupported(format!(
            "predict is not available for spectral clustering with '{}' clustering; refit on \
             the combined data instead",
            self.config.clustering.name()
        )))
    }
}

impl Clustering for SpectralClustering {
    fn fit_predict(&self, data: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        self.fit(&data.to_owned())
    }

    fn n_clusters(&self) -> usize {
        self.num_clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Refinement;
    use ndarray::array;

    fn two_groups() -> Array2<f64> {
        array![
            [0.0, 0.0],
            [0.1, 0.0],
            [0.0, 0.1],
            [5.0, 5.0],
            [5.1, 5.0],
            [5.0, 5.1],
        ]
    }

    #[test]
    fn fit_separates_two_groups() {
        let model = SpectralClustering::from_options(2, &[("refinement", "knn"), ("k", "2")])
            .unwrap();
        let labels = model.fit(&two_groups()).unwrap();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[0], labels[2]);
        assert_eq!(labels[3], labels[4]);
        assert_ne!(labels[0], labels[3]);
    }

    #[test]
    fn fit_report_lists_every_stage() {
        let model = SpectralClustering::with_defaults(2).unwrap();
        let report = model.fit_report(&two_groups()).unwrap();
        assert_eq!(report.stages().len(), 8);
        assert_eq!(report.stages()[5], "embedding");
        // eps = 0.4 cannot bridge the two groups
        assert!(report.disconnected());
    }

    #[test]
    fn empty_input_rejected() {
        let model = SpectralClustering::with_defaults(2).unwrap();
        assert_eq!(model.fit(&Array2::zeros((0, 2))), Err(Error::EmptyInput));
        assert_eq!(model.fit(&Array2::zeros((4, 0))), Err(Error::EmptyInput));
    }

    #[test]
    fn too_few_rows_rejected() {
        let model = SpectralClustering::with_defaults(3).unwrap();
        assert!(matches!(
            model.fit(&array![[0.0], [1.0]]),
            Err(Error::InvalidClusterCount {
                requested: 3,
                n_items: 2
            })
        ));
    }

    #[test]
    fn k_must_be_below_n() {
        let config = PipelineConfig::default().with_refinement(Refinement::Knn { k: 6 });
        let model = SpectralClustering::new(2, config).unwrap();
        assert!(matches!(
            model.fit(&two_groups()),
            Err(Error::InvalidParameter { name: "k", .. })
        ));
    }

    #[test]
    fn invalid_config_fails_at_construction() {
        assert!(SpectralClustering::with_defaults(1).is_err());
        assert!(matches!(
            SpectralClustering::from_options(2, &[("refinement", "bogus")]),
            Err(Error::UnknownVariant {
                stage: "refinement",
                ..
            })
        ));
    }

    #[test]
    fn predict_is_unsupported() {
        let model = SpectralClustering::with_defaults(2).unwrap();
        let err = model.predict(&two_groups()).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
        assert!(err.to_string().contains("kmeans"));
    }
}
