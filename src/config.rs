//! Pipeline configuration.
//!
//! Every stage is selected by a typed enum carrying its own parameters. The
//! string registry (`StageVariant::NAMES`) is only consulted when a
//! configuration is built from names, and is resolved exactly once: after
//! [`PipelineConfig::validate`] succeeds the configuration is immutable data.
//!
//! ```rust
//! use fiedler::config::{PipelineConfig, Refinement};
//!
//! let config = PipelineConfig::default().with_refinement(Refinement::Knn { k: 8 });
//! assert!(config.validate(2).is_ok());
//!
//! let err = PipelineConfig::from_pairs(&[("refinement", "knnn")]).unwrap_err();
//! assert!(err.to_string().contains("mutual_knn"));
//! ```

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// Default epsilon-neighbourhood radius.
pub const DEFAULT_EPS: f64 = 0.4;
/// Default neighbour count for k-NN refinement.
pub const DEFAULT_K: usize = 10;
/// Default number of eigenpairs requested from the sparse solvers.
pub const DEFAULT_N_EIGEN: usize = 6;
/// Default relative tolerance below which λ₂ counts as zero.
pub const DEFAULT_CONNECTIVITY_TOL: f64 = 1e-10;

/// A named, selectable implementation of one pipeline stage.
pub trait StageVariant: Sized {
    /// Configuration field this variant is selected under.
    const STAGE: &'static str;
    /// Every accepted name, in registry order.
    const NAMES: &'static [&'static str];

    /// Registry name of this variant.
    fn name(&self) -> &'static str;

    /// Look up a variant by its (lowercase) registry name, with default parameters.
    fn from_name(name: &str) -> Option<Self>;

    /// Parse a user-supplied name, reporting every valid choice on failure.
    fn parse_name(name: &str) -> Result<Self> {
        Self::from_name(&name.trim().to_ascii_lowercase()).ok_or_else(|| Error::UnknownVariant {
            stage: Self::STAGE,
            given: name.to_string(),
            valid: Self::NAMES,
        })
    }
}

/// Feature rescaling applied to the raw point matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Standardisation {
    /// Identity; the point matrix passes through untouched.
    #[default]
    None,
    /// Per-column `(x - mean) / std` (population std).
    ZScore,
    /// Per-column `(x - min) / (max - min)`.
    MinMax,
}

impl StageVariant for Standardisation {
    const STAGE: &'static str = "standardisation";
    const NAMES: &'static [&'static str] = &["none", "zscore", "minmax"];

    fn name(&self) -> &'static str {
        match self {
            Standardisation::None => "none",
            Standardisation::ZScore => "zscore",
            Standardisation::MinMax => "minmax",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Standardisation::None),
            "zscore" => Some(Standardisation::ZScore),
            "minmax" => Some(Standardisation::MinMax),
            _ => None,
        }
    }
}

/// Pairwise dissimilarity used by the affinity stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// `sqrt(Σ (a - b)²)`
    #[default]
    Euclidean,
    /// `Σ |a - b|`
    Manhattan,
    /// `max |a - b|`
    Chebyshev,
    /// `1 - cos(a, b)`
    Cosine,
}

impl StageVariant for Metric {
    const STAGE: &'static str = "affinity";
    const NAMES: &'static [&'static str] = &["euclidean", "manhattan", "chebyshev", "cosine"];

    fn name(&self) -> &'static str {
        match self {
            Metric::Euclidean => "euclidean",
            Metric::Manhattan => "manhattan",
            Metric::Chebyshev => "chebyshev",
            Metric::Cosine => "cosine",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "euclidean" => Some(Metric::Euclidean),
            "manhattan" => Some(Metric::Manhattan),
            "chebyshev" => Some(Metric::Chebyshev),
            "cosine" => Some(Metric::Cosine),
            _ => None,
        }
    }
}

/// Graph construction from the distance matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Refinement {
    /// Connect pairs with `dist < eps` (strict).
    Epsilon {
        /// Neighbourhood radius.
        eps: f64,
    },
    /// Directed k-nearest-neighbour graph.
    Knn {
        /// Neighbours per point.
        k: usize,
    },
    /// Keep an edge only when both endpoints list each other.
    MutualKnn {
        /// Neighbours per point.
        k: usize,
    },
    /// Every off-diagonal pair connected.
    Complete,
}

impl Default for Refinement {
    fn default() -> Self {
        Refinement::Epsilon { eps: DEFAULT_EPS }
    }
}

impl Refinement {
    /// Neighbour count for the k-NN variants.
    pub fn k(&self) -> Option<usize> {
        match self {
            Refinement::Knn { k } | Refinement::MutualKnn { k } => Some(*k),
            _ => None,
        }
    }
}

impl StageVariant for Refinement {
    const STAGE: &'static str = "refinement";
    const NAMES: &'static [&'static str] = &["eps", "knn", "mutual_knn", "complete"];

    fn name(&self) -> &'static str {
        match self {
            Refinement::Epsilon { .. } => "eps",
            Refinement::Knn { .. } => "knn",
            Refinement::MutualKnn { .. } => "mutual_knn",
            Refinement::Complete => "complete",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "eps" => Some(Refinement::Epsilon { eps: DEFAULT_EPS }),
            "knn" => Some(Refinement::Knn { k: DEFAULT_K }),
            "mutual_knn" => Some(Refinement::MutualKnn { k: DEFAULT_K }),
            "complete" => Some(Refinement::Complete),
            _ => None,
        }
    }
}

/// Laplacian normalisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaplacianKind {
    /// `L = D - A`
    #[default]
    Unnormalised,
    /// `L_sym = D^{-1/2} (D - A) D^{-1/2}`
    Symmetric,
}

impl StageVariant for LaplacianKind {
    const STAGE: &'static str = "laplacian";
    const NAMES: &'static [&'static str] = &["unnormalised", "symmetric"];

    fn name(&self) -> &'static str {
        match self {
            LaplacianKind::Unnormalised => "unnormalised",
            LaplacianKind::Symmetric => "symmetric",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "unnormalised" => Some(LaplacianKind::Unnormalised),
            "symmetric" => Some(LaplacianKind::Symmetric),
            _ => None,
        }
    }
}

/// Eigensolver used on the Laplacian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decomposition {
    /// Full spectrum of a general square matrix; imaginary parts discarded.
    DenseGeneral,
    /// Full spectrum of a symmetric matrix, ascending.
    #[default]
    DenseSymmetric,
    /// Arnoldi iteration for the `n_eigen` smallest-magnitude eigenpairs.
    #[cfg(feature = "sparse")]
    SparseGeneral {
        /// Eigenpairs to return (at least 2).
        n_eigen: usize,
    },
    /// Lanczos iteration for the `n_eigen` smallest-magnitude eigenpairs.
    #[cfg(feature = "sparse")]
    SparseSymmetric {
        /// Eigenpairs to return (at least 2).
        n_eigen: usize,
    },
}

impl Decomposition {
    /// Requested eigenpair count for the sparse variants.
    pub fn n_eigen(&self) -> Option<usize> {
        match self {
            #[cfg(feature = "sparse")]
            Decomposition::SparseGeneral { n_eigen } | Decomposition::SparseSymmetric { n_eigen } => {
                Some(*n_eigen)
            }
            _ => None,
        }
    }
}

impl StageVariant for Decomposition {
    const STAGE: &'static str = "decomposition";
    #[cfg(feature = "sparse")]
    const NAMES: &'static [&'static str] = &[
        "dense_general",
        "dense_symmetric",
        "sparse_general",
        "sparse_symmetric",
    ];
    #[cfg(not(feature = "sparse"))]
    const NAMES: &'static [&'static str] = &["dense_general", "dense_symmetric"];

    fn name(&self) -> &'static str {
        match self {
            Decomposition::DenseGeneral => "dense_general",
            Decomposition::DenseSymmetric => "dense_symmetric",
            #[cfg(feature = "sparse")]
            Decomposition::SparseGeneral { .. } => "sparse_general",
            #[cfg(feature = "sparse")]
            Decomposition::SparseSymmetric { .. } => "sparse_symmetric",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "dense_general" => Some(Decomposition::DenseGeneral),
            "dense_symmetric" => Some(Decomposition::DenseSymmetric),
            #[cfg(feature = "sparse")]
            "sparse_general" => Some(Decomposition::SparseGeneral {
                n_eigen: DEFAULT_N_EIGEN,
            }),
            #[cfg(feature = "sparse")]
            "sparse_symmetric" => Some(Decomposition::SparseSymmetric {
                n_eigen: DEFAULT_N_EIGEN,
            }),
            _ => None,
        }
    }
}

/// Eigenvector selection for the spectral embedding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Embedding {
    /// The eigenvector of the second-smallest eigenvalue.
    Fiedler {
        /// λ₂ at or below `tol · max(1, |λ|max)` is treated as zero.
        tol: f64,
        /// Fail the fit instead of warning on a disconnected graph.
        strict: bool,
    },
}

impl Default for Embedding {
    fn default() -> Self {
        Embedding::Fiedler {
            tol: DEFAULT_CONNECTIVITY_TOL,
            strict: false,
        }
    }
}

impl StageVariant for Embedding {
    const STAGE: &'static str = "embedding";
    const NAMES: &'static [&'static str] = &["fiedler"];

    fn name(&self) -> &'static str {
        match self {
            Embedding::Fiedler { .. } => "fiedler",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "fiedler" => Some(Embedding::default()),
            _ => None,
        }
    }
}

/// Final partitioning of the embedded points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusteringMethod {
    /// Lloyd's k-means with k-means++ seeding.
    KMeans {
        /// Seed for centroid initialisation.
        seed: u64,
        /// Independent restarts; the lowest within-cluster sum of squares wins.
        n_init: usize,
        /// Iteration cap per restart.
        max_iter: usize,
    },
}

impl Default for ClusteringMethod {
    fn default() -> Self {
        ClusteringMethod::KMeans {
            seed: 42,
            n_init: 4,
            max_iter: 300,
        }
    }
}

impl StageVariant for ClusteringMethod {
    const STAGE: &'static str = "clustering";
    const NAMES: &'static [&'static str] = &["kmeans"];

    fn name(&self) -> &'static str {
        match self {
            ClusteringMethod::KMeans { .. } => "kmeans",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "kmeans" => Some(ClusteringMethod::default()),
            _ => None,
        }
    }
}

/// Post-clustering confidence estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Confidence {
    /// Labels pass through unchanged.
    #[default]
    None,
}

impl StageVariant for Confidence {
    const STAGE: &'static str = "confidence";
    const NAMES: &'static [&'static str] = &["none"];

    fn name(&self) -> &'static str {
        match self {
            Confidence::None => "none",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Confidence::None),
            _ => None,
        }
    }
}

macro_rules! variant_traits {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromStr for $ty {
                type Err = Error;

                fn from_str(s: &str) -> Result<Self> {
                    <$ty as StageVariant>::parse_name(s)
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.name())
                }
            }
        )*
    };
}

variant_traits!(
    Standardisation,
    Metric,
    Refinement,
    LaplacianKind,
    Decomposition,
    Embedding,
    ClusteringMethod,
    Confidence,
);

/// Keys accepted by [`PipelineConfig::from_pairs`]: stage names followed by parameters.
pub const CONFIG_KEYS: &[&str] = &[
    "standardisation",
    "affinity",
    "refinement",
    "laplacian",
    "decomposition",
    "embedding",
    "clustering",
    "confidence",
    "eps",
    "k",
    "n_eigen",
    "seed",
    "n_init",
    "max_iter",
    "strict",
];

/// One selected variant per stage, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PipelineConfig {
    /// Feature rescaling.
    pub standardisation: Standardisation,
    /// Distance metric.
    pub affinity: Metric,
    /// Graph refinement.
    pub refinement: Refinement,
    /// Laplacian normalisation.
    pub laplacian: LaplacianKind,
    /// Eigensolver.
    pub decomposition: Decomposition,
    /// Eigenvector selection.
    pub embedding: Embedding,
    /// Final clustering.
    pub clustering: ClusteringMethod,
    /// Confidence estimation.
    pub confidence: Confidence,
}

impl PipelineConfig {
    /// Set the standardisation variant.
    pub fn with_standardisation(mut self, standardisation: Standardisation) -> Self {
        self.standardisation = standardisation;
        self
    }

    /// Set the distance metric.
    pub fn with_affinity(mut self, metric: Metric) -> Self {
        self.affinity = metric;
        self
    }

    /// Set the refinement variant.
    pub fn with_refinement(mut self, refinement: Refinement) -> Self {
        self.refinement = refinement;
        self
    }

    /// Set the Laplacian normalisation.
    pub fn with_laplacian(mut self, laplacian: LaplacianKind) -> Self {
        self.laplacian = laplacian;
        self
    }

    /// Set the eigensolver.
    pub fn with_decomposition(mut self, decomposition: Decomposition) -> Self {
        self.decomposition = decomposition;
        self
    }

    /// Set the embedding variant.
    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = embedding;
        self
    }

    /// Set the clustering method.
    pub fn with_clustering(mut self, clustering: ClusteringMethod) -> Self {
        self.clustering = clustering;
        self
    }

    /// Set the confidence variant.
    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set the k-means seed, keeping the other clustering parameters.
    pub fn with_seed(mut self, seed: u64) -> Self {
        let ClusteringMethod::KMeans {
            n_init, max_iter, ..
        } = self.clustering;
        self.clustering = ClusteringMethod::KMeans {
            seed,
            n_init,
            max_iter,
        };
        self
    }

    /// Build a configuration from `(key, value)` pairs.
    ///
    /// Stage keys select variants by registry name; parameter keys (`eps`, `k`,
    /// `n_eigen`, `seed`, `n_init`, `max_iter`, `strict`) then fill in the
    /// selected variant. A parameter that does not belong to the selected
    /// variant is rejected rather than ignored.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self> {
        let mut config = PipelineConfig::default();
        let mut params: Vec<(&str, &str)> = Vec::new();

        for &(key, value) in pairs {
            match key {
                "standardisation" => config.standardisation = value.parse()?,
                "affinity" => config.affinity = value.parse()?,
                "refinement" => config.refinement = value.parse()?,
                "laplacian" => config.laplacian = value.parse()?,
                "decomposition" => config.decomposition = value.parse()?,
                "embedding" => config.embedding = value.parse()?,
                "clustering" => config.clustering = value.parse()?,
                "confidence" => config.confidence = value.parse()?,
                "eps" | "k" | "n_eigen" | "seed" | "n_init" | "max_iter" | "strict" => {
                    params.push((key, value))
                }
                other => {
                    return Err(Error::UnknownVariant {
                        stage: "stage",
                        given: other.to_string(),
                        valid: CONFIG_KEYS,
                    })
                }
            }
        }

        for (key, value) in params {
            config.apply_param(key, value)?;
        }
        Ok(config)
    }

    fn apply_param(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "eps" => match &mut self.refinement {
                Refinement::Epsilon { eps } => *eps = parse_value("eps", value)?,
                _ => return Err(misplaced("eps", "refinement=eps")),
            },
            "k" => match &mut self.refinement {
                Refinement::Knn { k } | Refinement::MutualKnn { k } => {
                    *k = parse_value("k", value)?
                }
                _ => return Err(misplaced("k", "refinement=knn or refinement=mutual_knn")),
            },
            "n_eigen" => match &mut self.decomposition {
                #[cfg(feature = "sparse")]
                Decomposition::SparseGeneral { n_eigen }
                | Decomposition::SparseSymmetric { n_eigen } => {
                    *n_eigen = parse_value("n_eigen", value)?
                }
                _ => return Err(misplaced("n_eigen", "a sparse decomposition")),
            },
            "strict" => {
                let Embedding::Fiedler { strict, .. } = &mut self.embedding;
                *strict = parse_value("strict", value)?;
            }
            "seed" | "n_init" | "max_iter" => {
                let ClusteringMethod::KMeans {
                    seed,
                    n_init,
                    max_iter,
                } = &mut self.clustering;
                match key {
                    "seed" => *seed = parse_value("seed", value)?,
                    "n_init" => *n_init = parse_value("n_init", value)?,
                    _ => *max_iter = parse_value("max_iter", value)?,
                }
            }
            other => {
                return Err(Error::UnknownVariant {
                    stage: "stage",
                    given: other.to_string(),
                    valid: CONFIG_KEYS,
                })
            }
        }
        Ok(())
    }

    /// Check every numeric parameter before any data is touched.
    ///
    /// Bounds that depend on the number of points (`k < n`) are checked by
    /// [`PipelineConfig::validate_for`] at the start of a fit.
    pub fn validate(&self, num_clusters: usize) -> Result<()> {
        if num_clusters < 2 {
            return Err(Error::InvalidParameter {
                name: "num_clusters",
                message: format!("must be at least 2, got {num_clusters}"),
            });
        }

        match self.refinement {
            Refinement::Epsilon { eps } if !(eps.is_finite() && eps > 0.0) => {
                return Err(Error::InvalidParameter {
                    name: "eps",
                    message: format!("must be a positive finite number, got {eps}"),
                });
            }
            Refinement::Knn { k } | Refinement::MutualKnn { k } if k == 0 => {
                return Err(Error::InvalidParameter {
                    name: "k",
                    message: "must be at least 1".to_string(),
                });
            }
            _ => {}
        }

        if let Some(n_eigen) = self.decomposition.n_eigen() {
            if n_eigen < 2 {
                return Err(Error::InvalidParameter {
                    name: "n_eigen",
                    message: format!(
                        "at least 2 eigenpairs are needed for the Fiedler vector, got {n_eigen}"
                    ),
                });
            }
        }

        let Embedding::Fiedler { tol, .. } = self.embedding;
        if !(tol.is_finite() && tol >= 0.0) {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: format!("must be a non-negative finite number, got {tol}"),
            });
        }

        let ClusteringMethod::KMeans {
            n_init, max_iter, ..
        } = self.clustering;
        if n_init == 0 {
            return Err(Error::InvalidParameter {
                name: "n_init",
                message: "must be at least 1".to_string(),
            });
        }
        if max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Check the bounds that depend on the number of points.
    pub fn validate_for(&self, num_clusters: usize, n_points: usize) -> Result<()> {
        if n_points < num_clusters {
            return Err(Error::InvalidClusterCount {
                requested: num_clusters,
                n_items: n_points,
            });
        }
        if let Some(k) = self.refinement.k() {
            if k >= n_points {
                return Err(Error::InvalidParameter {
                    name: "k",
                    message: format!("must be smaller than the number of points ({n_points}), got {k}"),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "standardisation={} affinity={} refinement={}",
            self.standardisation, self.affinity, self.refinement
        )?;
        match self.refinement {
            Refinement::Epsilon { eps } => write!(f, "(eps={eps})")?,
            Refinement::Knn { k } | Refinement::MutualKnn { k } => write!(f, "(k={k})")?,
            Refinement::Complete => {}
        }
        write!(
            f,
            " laplacian={} decomposition={}",
            self.laplacian, self.decomposition
        )?;
        if let Some(n_eigen) = self.decomposition.n_eigen() {
            write!(f, "(n_eigen={n_eigen})")?;
        }
        write!(
            f,
            " embedding={} clustering={} confidence={}",
            self.embedding, self.clustering, self.confidence
        )
    }
}

fn parse_value<T: FromStr>(name: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| Error::InvalidParameter {
        name,
        message: format!("cannot parse '{value}'"),
    })
}

fn misplaced(name: &'static str, needs: &str) -> Error {
    Error::InvalidParameter {
        name,
        message: format!("only applies with {needs}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate(2).is_ok());
        assert_eq!(config.refinement, Refinement::Epsilon { eps: DEFAULT_EPS });
        assert_eq!(config.decomposition, Decomposition::DenseSymmetric);
    }

    #[test]
    fn variant_names_round_trip_through_registry() {
        for name in Refinement::NAMES {
            let parsed: Refinement = name.parse().unwrap();
            assert_eq!(parsed.name(), *name);
        }
        for name in Decomposition::NAMES {
            let parsed: Decomposition = name.parse().unwrap();
            assert_eq!(parsed.to_string(), *name);
        }
    }

    #[test]
    fn unknown_variant_names_field_and_choices() {
        let err = "spectral".parse::<Metric>().unwrap_err();
        match err {
            Error::UnknownVariant {
                stage,
                given,
                valid,
            } => {
                assert_eq!(stage, "affinity");
                assert_eq!(given, "spectral");
                assert_eq!(valid, Metric::NAMES);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn unknown_stage_key_is_rejected() {
        let err = PipelineConfig::from_pairs(&[("kernel", "rbf")]).unwrap_err();
        assert!(matches!(err, Error::UnknownVariant { stage: "stage", .. }));
    }

    #[test]
    fn from_pairs_applies_parameters_to_selected_variant() {
        let config = PipelineConfig::from_pairs(&[
            ("k", "7"),
            ("refinement", "mutual_knn"),
            ("affinity", "Manhattan"),
            ("seed", "9"),
        ])
        .unwrap();
        assert_eq!(config.refinement, Refinement::MutualKnn { k: 7 });
        assert_eq!(config.affinity, Metric::Manhattan);
        assert!(matches!(
            config.clustering,
            ClusteringMethod::KMeans { seed: 9, .. }
        ));
    }

    #[test]
    fn parameter_for_unselected_variant_is_rejected() {
        let err = PipelineConfig::from_pairs(&[("refinement", "complete"), ("eps", "0.3")])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "eps", .. }));
    }

    #[test]
    fn unparseable_parameter_is_rejected() {
        let err = PipelineConfig::from_pairs(&[("eps", "wide")]).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "eps", .. }));
    }

    #[test]
    fn validate_rejects_bad_numbers() {
        let bad_eps = PipelineConfig::default().with_refinement(Refinement::Epsilon { eps: -0.1 });
        assert!(bad_eps.validate(2).is_err());

        let nan_eps =
            PipelineConfig::default().with_refinement(Refinement::Epsilon { eps: f64::NAN });
        assert!(nan_eps.validate(2).is_err());

        let zero_k = PipelineConfig::default().with_refinement(Refinement::Knn { k: 0 });
        assert!(zero_k.validate(2).is_err());

        assert!(PipelineConfig::default().validate(1).is_err());
    }

    #[test]
    fn validate_for_checks_point_count() {
        let config = PipelineConfig::default().with_refinement(Refinement::Knn { k: 5 });
        assert!(config.validate_for(2, 6).is_ok());
        assert!(matches!(
            config.validate_for(2, 5),
            Err(Error::InvalidParameter { name: "k", .. })
        ));
        assert!(matches!(
            config.validate_for(3, 2),
            Err(Error::InvalidClusterCount { .. })
        ));
    }

    #[cfg(feature = "sparse")]
    #[test]
    fn sparse_needs_two_eigenpairs() {
        let config = PipelineConfig::default()
            .with_decomposition(Decomposition::SparseSymmetric { n_eigen: 1 });
        assert!(matches!(
            config.validate(2),
            Err(Error::InvalidParameter { name: "n_eigen", .. })
        ));
    }

    #[test]
    fn display_mentions_every_stage() {
        let text = PipelineConfig::default().to_string();
        for key in &CONFIG_KEYS[..8] {
            assert!(text.contains(key), "{key} missing from {text}");
        }
    }
}
