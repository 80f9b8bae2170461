//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS):
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids via k-means++
//! 2. **Assign**: Each point → nearest centroid
//! 3. **Update**: Each centroid → mean of assigned points
//! 4. Repeat until the centroids stop moving
//!
//! Lloyd only finds a local minimum, so the whole procedure is restarted
//! `n_init` times from different seedings and the lowest-WCSS run is kept
//! (first run wins on a tie).
//!
//! On a 1-D Fiedler embedding this amounts to choosing `k - 1` thresholds
//! along the vector.

use log::{debug, trace};
use ndarray::{Array2, ArrayView1, ArrayView2};
use rand::prelude::*;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::traits::Clustering;
use crate::config::ClusteringMethod;
use crate::error::{Error, Result};
use crate::pipeline::{Artifact, Diagnostics, Stage};

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum iterations per run.
    max_iter: usize,
    /// Convergence tolerance on total squared centroid shift.
    tol: f64,
    /// Number of restarts.
    n_init: usize,
    /// Random seed.
    seed: Option<u64>,
}

/// Outcome of one Lloyd run.
#[derive(Debug, Clone)]
struct Run {
    labels: Vec<usize>,
    wcss: f64,
    iterations: usize,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 300,
            tol: 1e-4,
            n_init: 1,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the number of restarts.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init.max(1);
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Initialize centroids using k-means++ algorithm.
    fn init_centroids(&self, data: ArrayView2<'_, f64>, rng: &mut impl Rng) -> Array2<f64> {
        let n = data.nrows();
        let d = data.ncols();
        let mut centroids = Array2::zeros((self.k, d));

        let first = rng.random_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        for i in 1..self.k {
            let distances: Vec<f64> = data
                .rows()
                .into_iter()
                .map(|point| {
                    (0..i)
                        .map(|c| squared_distance(point, centroids.row(c)))
                        .fold(f64::MAX, f64::min)
                })
                .collect();

            // Sample proportional to squared distance
            let total: f64 = distances.iter().sum();
            if total == 0.0 {
                let idx = rng.random_range(0..n);
                centroids.row_mut(i).assign(&data.row(idx));
                continue;
            }

            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = n - 1;
            for (j, &dist) in distances.iter().enumerate() {
                cumsum += dist;
                if cumsum >= threshold && dist > 0.0 {
                    selected = j;
                    break;
                }
            }

            centroids.row_mut(i).assign(&data.row(selected));
        }

        centroids
    }

    fn assign(&self, data: ArrayView2<'_, f64>, centroids: &Array2<f64>, labels: &mut [usize]) {
        let nearest = |i: usize| {
            let point = data.row(i);
            let mut best_cluster = 0;
            let mut best_dist = f64::MAX;
            for k in 0..self.k {
                let dist = squared_distance(point, centroids.row(k));
                if dist < best_dist {
                    best_dist = dist;
                    best_cluster = k;
                }
            }
            best_cluster
        };

        #[cfg(feature = "parallel")]
        labels
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, label)| *label = nearest(i));

        #[cfg(not(feature = "parallel"))]
        for (i, label) in labels.iter_mut().enumerate() {
            *label = nearest(i);
        }
    }

    fn lloyd(&self, data: ArrayView2<'_, f64>, rng: &mut impl Rng) -> Run {
        let (n, d) = data.dim();
        let mut centroids = self.init_centroids(data, rng);
        let mut labels = vec![0usize; n];
        let mut iterations = 0;

        for _ in 0..self.max_iter {
            iterations += 1;
            self.assign(data, &centroids, &mut labels);

            let mut new_centroids = Array2::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];
            for (i, &k) in labels.iter().enumerate() {
                let mut row = new_centroids.row_mut(k);
                row += &data.row(i);
                counts[k] += 1;
            }

            for k in 0..self.k {
                if counts[k] > 0 {
                    new_centroids
                        .row_mut(k)
                        .mapv_inplace(|v| v / counts[k] as f64);
                } else {
                    // Empty cluster: reinitialize randomly
                    let idx = rng.random_range(0..n);
                    new_centroids.row_mut(k).assign(&data.row(idx));
                }
            }

            let shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();
            centroids = new_centroids;

            if shift < self.tol {
                break;
            }
        }

        // labels consistent with the final centroids
        self.assign(data, &centroids, &mut labels);
        let wcss = labels
            .iter()
            .enumerate()
            .map(|(i, &k)| squared_distance(data.row(i), centroids.row(k)))
            .sum();
        Run {
            labels,
            wcss,
            iterations,
        }
    }
}

fn squared_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: ArrayView2<'_, f64>) -> Result<Vec<usize>> {
        let n = data.nrows();
        if n == 0 || data.ncols() == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }

        let mut rng = match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let mut best: Option<Run> = None;
        for restart in 0..self.n_init.max(1) {
            let run = self.lloyd(data, &mut rng);
            trace!(
                "k-means restart {restart}: wcss {:e} after {} iterations",
                run.wcss,
                run.iterations
            );
            if best.as_ref().map_or(true, |b| run.wcss < b.wcss) {
                best = Some(run);
            }
        }

        let best = best.ok_or(Error::Other("k-means produced no run".to_string()))?;
        debug!("k-means: k={}, best wcss {:e}", self.k, best.wcss);
        Ok(best.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

/// Clustering stage: embedding → labels.
#[derive(Debug, Clone)]
pub struct KmeansStage {
    kmeans: Kmeans,
}

impl KmeansStage {
    /// Create the stage for `num_clusters` clusters.
    pub fn new(method: ClusteringMethod, num_clusters: usize) -> Self {
        let ClusteringMethod::KMeans {
            seed,
            n_init,
            max_iter,
        } = method;
        Self {
            kmeans: Kmeans::new(num_clusters)
                .with_seed(seed)
                .with_n_init(n_init)
                .with_max_iter(max_iter),
        }
    }
}

impl Stage for KmeansStage {
    fn name(&self) -> &'static str {
        "clustering"
    }

    fn transform(&self, input: Artifact, _: &mut Diagnostics) -> Result<Artifact> {
        let embedding = input.into_embedding(self.name())?;
        self.kmeans.fit_predict(embedding.view()).map(Artifact::Labels)
    }
}
