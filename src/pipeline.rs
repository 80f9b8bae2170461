//! The pipeline engine.
//!
//! A [`Pipeline`] is an immutable, ordered list of boxed [`Stage`]s built once
//! from a validated [`PipelineConfig`]. Running it threads one [`Artifact`]
//! through every stage:
//!
//! ```text
//! Points ─standardise─▶ Points ─affinity─▶ Distances ─refine─▶ Adjacency
//!        ─laplacian─▶ Laplacian ─decompose─▶ Spectrum ─embed─▶ Embedding
//!        ─cluster─▶ Labels ─confidence─▶ Labels
//! ```
//!
//! Each stage checks the artifact kind it receives and fails with
//! [`Error::StageContract`] on a mismatch. After every stage the engine checks
//! the produced matrix for NaN/inf, so a numerical failure anywhere aborts the
//! whole run with a single error naming the stage.

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info, trace};
use ndarray::Array2;

use crate::affinity::AffinityStage;
use crate::cluster::{ConfidenceStage, KmeansStage};
use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::graph::{LaplacianStage, RefineStage};
use crate::spectral::{DecomposeStage, EigenPairs, EmbedStage};
use crate::standardise::StandardiseStage;

/// Data flowing between stages.
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    /// `n × d` point matrix.
    Points(Array2<f64>),
    /// `n × n` pairwise distances.
    Distances(Array2<f64>),
    /// `n × n` graph adjacency.
    Adjacency(Array2<f64>),
    /// `n × n` graph Laplacian.
    Laplacian(Array2<f64>),
    /// Eigenvalue/eigenvector pairs of the Laplacian.
    Spectrum(EigenPairs),
    /// `n × m` spectral coordinates.
    Embedding(Array2<f64>),
    /// One cluster label per point.
    Labels(Vec<usize>),
}

impl Artifact {
    /// Human-readable kind, used in contract errors and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Artifact::Points(_) => "point matrix",
            Artifact::Distances(_) => "distance matrix",
            Artifact::Adjacency(_) => "adjacency matrix",
            Artifact::Laplacian(_) => "laplacian matrix",
            Artifact::Spectrum(_) => "eigenpair set",
            Artifact::Embedding(_) => "embedding matrix",
            Artifact::Labels(_) => "cluster labels",
        }
    }

    /// Shape of the carried matrix (`(n, 1)` for labels).
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Artifact::Points(m)
            | Artifact::Distances(m)
            | Artifact::Adjacency(m)
            | Artifact::Laplacian(m)
            | Artifact::Embedding(m) => m.dim(),
            Artifact::Spectrum(pairs) => pairs.vectors.dim(),
            Artifact::Labels(labels) => (labels.len(), 1),
        }
    }

    fn is_finite(&self) -> bool {
        match self {
            Artifact::Points(m)
            | Artifact::Distances(m)
            | Artifact::Adjacency(m)
            | Artifact::Laplacian(m)
            | Artifact::Embedding(m) => m.iter().all(|v| v.is_finite()),
            Artifact::Spectrum(pairs) => pairs.is_finite(),
            Artifact::Labels(_) => true,
        }
    }

    fn mismatch(self, stage: &'static str, expected: &'static str) -> Error {
        Error::StageContract {
            stage,
            expected,
            found: self.kind(),
        }
    }

    /// Unwrap a point matrix or report a contract violation for `stage`.
    pub fn into_points(self, stage: &'static str) -> Result<Array2<f64>> {
        match self {
            Artifact::Points(m) => Ok(m),
            other => Err(other.mismatch(stage, "point matrix")),
        }
    }

    /// Unwrap a distance matrix or report a contract violation for `stage`.
    pub fn into_distances(self, stage: &'static str) -> Result<Array2<f64>> {
        match self {
            Artifact::Distances(m) => Ok(m),
            other => Err(other.mismatch(stage, "distance matrix")),
        }
    }

    /// Unwrap an adjacency matrix or report a contract violation for `stage`.
    pub fn into_adjacency(self, stage: &'static str) -> Result<Array2<f64>> {
        match self {
            Artifact::Adjacency(m) => Ok(m),
            other => Err(other.mismatch(stage, "adjacency matrix")),
        }
    }

    /// Unwrap a Laplacian or report a contract violation for `stage`.
    pub fn into_laplacian(self, stage: &'static str) -> Result<Array2<f64>> {
        match self {
            Artifact::Laplacian(m) => Ok(m),
            other => Err(other.mismatch(stage, "laplacian matrix")),
        }
    }

    /// Unwrap an eigenpair set or report a contract violation for `stage`.
    pub fn into_spectrum(self, stage: &'static str) -> Result<EigenPairs> {
        match self {
            Artifact::Spectrum(pairs) => Ok(pairs),
            other => Err(other.mismatch(stage, "eigenpair set")),
        }
    }

    /// Unwrap an embedding or report a contract violation for `stage`.
    pub fn into_embedding(self, stage: &'static str) -> Result<Array2<f64>> {
        match self {
            Artifact::Embedding(m) => Ok(m),
            other => Err(other.mismatch(stage, "embedding matrix")),
        }
    }

    /// Unwrap cluster labels or report a contract violation for `stage`.
    pub fn into_labels(self, stage: &'static str) -> Result<Vec<usize>> {
        match self {
            Artifact::Labels(labels) => Ok(labels),
            other => Err(other.mismatch(stage, "cluster labels")),
        }
    }
}

/// Wall-clock time spent in one stage.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTiming {
    /// Stage name.
    pub stage: &'static str,
    /// Elapsed time.
    pub elapsed: Duration,
}

/// Side information collected while a pipeline runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    /// Per-stage timings, in execution order.
    pub timings: Vec<StageTiming>,
    /// Smallest eigenvalue seen by the embedding stage.
    pub lambda1: Option<f64>,
    /// Second-smallest eigenvalue seen by the embedding stage.
    pub lambda2: Option<f64>,
    /// The embedding stage found λ₂ non-positive (graph disconnected or degenerate).
    pub disconnected: bool,
}

impl Diagnostics {
    /// Total time across all stages.
    pub fn total(&self) -> Duration {
        self.timings.iter().map(|t| t.elapsed).sum()
    }
}

/// One transformation step of the pipeline.
pub trait Stage: fmt::Debug + Send + Sync {
    /// Stage name (matches the configuration field).
    fn name(&self) -> &'static str;

    /// Consume the previous stage's output and produce this stage's output.
    fn transform(&self, input: Artifact, diagnostics: &mut Diagnostics) -> Result<Artifact>;
}

/// Ordered sequence of stages built from one configuration.
#[derive(Debug)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Validate `config` and build its stages.
    pub fn new(config: &PipelineConfig, num_clusters: usize) -> Result<Self> {
        config.validate(num_clusters)?;
        debug!("building pipeline: {config}");

        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(StandardiseStage::new(config.standardisation)),
            Box::new(AffinityStage::new(config.affinity)),
            Box::new(RefineStage::new(config.refinement)),
            Box::new(LaplacianStage::new(config.laplacian)),
            Box::new(DecomposeStage::new(config.decomposition)),
            Box::new(EmbedStage::new(config.embedding)),
            Box::new(KmeansStage::new(config.clustering, num_clusters)),
            Box::new(ConfidenceStage::new(config.confidence)),
        ];
        Ok(Self { stages })
    }

    /// Build a pipeline from arbitrary stages (no validation).
    pub fn from_stages(stages: Vec<Box<dyn Stage>>) -> Self {
        Self { stages }
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage and return the final artifact.
    pub fn run(&self, points: &Array2<f64>) -> Result<(Artifact, Diagnostics)> {
        self.run_through(points, None)
    }

    /// Run up to and including the stage called `last`.
    ///
    /// Useful for inspecting intermediate matrices.
    pub fn run_until(&self, points: &Array2<f64>, last: &str) -> Result<Artifact> {
        if !self.stages.iter().any(|s| s.name() == last) {
            return Err(Error::Other(format!(
                "no stage named '{last}' in pipeline [{}]",
                self.stage_names().join(", ")
            )));
        }
        self.run_through(points, Some(last)).map(|(artifact, _)| artifact)
    }

    fn run_through(
        &self,
        points: &Array2<f64>,
        last: Option<&str>,
    ) -> Result<(Artifact, Diagnostics)> {
        let (n, d) = points.dim();
        info!("running {} stages on {n}x{d} points", self.stages.len());

        let mut diagnostics = Diagnostics::default();
        let mut artifact = Artifact::Points(points.clone());
        if !artifact.is_finite() {
            return Err(Error::NonFinite {
                stage: "input",
                matrix: "point matrix",
            });
        }

        for stage in &self.stages {
            let name = stage.name();
            let started = Instant::now();
            artifact = stage.transform(artifact, &mut diagnostics)?;
            let elapsed = started.elapsed();

            if !artifact.is_finite() {
                return Err(Error::NonFinite {
                    stage: name,
                    matrix: artifact.kind(),
                });
            }

            let (rows, cols) = artifact.shape();
            trace!("stage '{name}' -> {} {rows}x{cols} in {elapsed:?}", artifact.kind());
            diagnostics.timings.push(StageTiming {
                stage: name,
                elapsed,
            });

            if last == Some(name) {
                break;
            }
        }

        debug!("pipeline finished in {:?}", diagnostics.total());
        Ok((artifact, diagnostics))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[derive(Debug)]
    struct Poison;

    impl Stage for Poison {
        fn name(&self) -> &'static str {
            "poison"
        }

        fn transform(&self, input: Artifact, _: &mut Diagnostics) -> Result<Artifact> {
            let mut points = input.into_points(self.name())?;
            points[[0, 0]] = f64::NAN;
            Ok(Artifact::Points(points))
        }
    }

    fn points() -> Array2<f64> {
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
    fn default_pipeline_has_eight_stages_in_order() {
        let pipeline = Pipeline::new(&PipelineConfig::default(), 2).unwrap();
        assert_eq!(
            pipeline.stage_names(),
            vec![
                "standardisation",
                "affinity",
                "refinement",
                "laplacian",
                "decomposition",
                "embedding",
                "clustering",
                "confidence"
            ]
        );
    }

    #[test]
    fn invalid_config_fails_before_running() {
        let config = PipelineConfig::default()
            .with_refinement(crate::config::Refinement::Epsilon { eps: 0.0 });
        assert!(Pipeline::new(&config, 2).is_err());
    }

    #[test]
    fn run_until_stops_at_named_stage() {
        let pipeline = Pipeline::new(&PipelineConfig::default(), 2).unwrap();
        let out = pipeline.run_until(&points(), "affinity").unwrap();
        assert_eq!(out.kind(), "distance matrix");
        assert_eq!(out.shape(), (6, 6));

        assert!(pipeline.run_until(&points(), "missing").is_err());
    }

    #[test]
    fn run_returns_labels_and_timings() {
        let pipeline = Pipeline::new(&PipelineConfig::default(), 2).unwrap();
        let (out, diagnostics) = pipeline.run(&points()).unwrap();
        let labels = out.into_labels("test").unwrap();
        assert_eq!(labels.len(), 6);
        assert_eq!(diagnostics.timings.len(), 8);
        assert!(diagnostics.lambda2.is_some());
    }

    #[test]
    fn non_finite_output_aborts_run() {
        let pipeline = Pipeline::from_stages(vec![
            Box::new(Poison),
            Box::new(AffinityStage::new(Default::default())),
        ]);
        let err = pipeline.run(&points()).unwrap_err();
        assert_eq!(
            err,
            Error::NonFinite {
                stage: "poison",
                matrix: "point matrix"
            }
        );
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let mut bad = points();
        bad[[2, 1]] = f64::INFINITY;
        let pipeline = Pipeline::new(&PipelineConfig::default(), 2).unwrap();
        assert!(matches!(
            pipeline.run(&bad),
            Err(Error::NonFinite { stage: "input", .. })
        ));
    }

    #[test]
    fn stage_rejects_wrong_artifact() {
        let pipeline = Pipeline::from_stages(vec![
            Box::new(AffinityStage::new(Default::default())),
            Box::new(AffinityStage::new(Default::default())),
        ]);
        let err = pipeline.run(&points()).unwrap_err();
        assert_eq!(
            err,
            Error::StageContract {
                stage: "affinity",
                expected: "point matrix",
                found: "distance matrix"
            }
        );
    }
}
