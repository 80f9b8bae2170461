//! Pairwise dissimilarity between points.
//!
//! The affinity stage turns the `n × d` point matrix into an `n × n` distance
//! matrix: symmetric, zero on the diagonal. Only the upper triangle is
//! computed; the lower triangle is mirrored so that `dist[i,j]` and
//! `dist[j,i]` are bit-identical.
//!
//! | Metric | Distance |
//! |--------|----------|
//! | Euclidean | `sqrt(Σ (a - b)²)` |
//! | Manhattan | `Σ |a - b|` |
//! | Chebyshev | `max |a - b|` |
//! | Cosine | `1 - a·b / (‖a‖ ‖b‖)` |

use log::debug;
use ndarray::{Array2, ArrayView1, ArrayView2};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::Metric;
use crate::error::{Error, Result};
use crate::pipeline::{Artifact, Diagnostics, Stage};

impl Metric {
    /// Distance between two points of equal dimension.
    pub fn distance(&self, a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
        match self {
            Metric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y).powi(2))
                .sum::<f64>()
                .sqrt(),
            Metric::Manhattan => a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs()).sum(),
            Metric::Chebyshev => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (x - y).abs())
                .fold(0.0, f64::max),
            Metric::Cosine => cosine_distance(a, b),
        }
    }
}

fn cosine_distance(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        // Zero vectors have no direction: identical to each other, unrelated to anything else.
        return if norm_a == norm_b { 0.0 } else { 1.0 };
    }
    let cos = (a.dot(&b) / (norm_a * norm_b)).clamp(-1.0, 1.0);
    1.0 - cos
}

/// Compute the full `n × n` distance matrix of the rows of `points`.
pub fn pairwise_distances(points: ArrayView2<'_, f64>, metric: Metric) -> Array2<f64> {
    let n = points.nrows();

    #[cfg(feature = "parallel")]
    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            ((i + 1)..n)
                .map(|j| metric.distance(points.row(i), points.row(j)))
                .collect()
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let upper: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            ((i + 1)..n)
                .map(|j| metric.distance(points.row(i), points.row(j)))
                .collect()
        })
        .collect();

    let mut dist = Array2::zeros((n, n));
    for (i, row) in upper.iter().enumerate() {
        for (offset, &value) in row.iter().enumerate() {
            let j = i + 1 + offset;
            dist[[i, j]] = value;
            dist[[j, i]] = value;
        }
    }
    dist
}

/// Affinity stage: point matrix → distance matrix.
#[derive(Debug, Clone, Copy)]
pub struct AffinityStage {
    metric: Metric,
}

impl AffinityStage {
    /// Create the stage.
    pub fn new(metric: Metric) -> Self {
        Self { metric }
    }
}

impl Stage for AffinityStage {
    fn name(&self) -> &'static str {
        "affinity"
    }

    fn transform(&self, input: Artifact, _: &mut Diagnostics) -> Result<Artifact> {
        let points = input.into_points(self.name())?;
        if points.nrows() == 0 || points.ncols() == 0 {
            return Err(Error::EmptyInput);
        }
        debug!(
            "computing {} distances for {} points",
            self.metric,
            points.nrows()
        );
        Ok(Artifact::Distances(pairwise_distances(
            points.view(),
            self.metric,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn euclidean_and_manhattan() {
        let points = array![[0.0, 0.0], [3.0, 4.0], [1.0, 1.0]];

        let d = pairwise_distances(points.view(), Metric::Euclidean);
        assert_abs_diff_eq!(d[[0, 1]], 5.0);
        assert_abs_diff_eq!(d[[0, 2]], 2f64.sqrt());

        let d = pairwise_distances(points.view(), Metric::Manhattan);
        assert_abs_diff_eq!(d[[0, 1]], 7.0);
        assert_abs_diff_eq!(d[[1, 2]], 5.0);

        let d = pairwise_distances(points.view(), Metric::Chebyshev);
        assert_abs_diff_eq!(d[[0, 1]], 4.0);
    }

    #[test]
    fn symmetric_with_zero_diagonal() {
        let points = array![[0.3, -1.0, 2.0], [1.5, 0.0, 0.5], [-2.0, 2.0, 1.0], [0.0, 0.0, 0.0]];
        for metric in [
            Metric::Euclidean,
            Metric::Manhattan,
            Metric::Chebyshev,
            Metric::Cosine,
        ] {
            let d = pairwise_distances(points.view(), metric);
            for i in 0..4 {
                assert_eq!(d[[i, i]], 0.0);
                for j in 0..4 {
                    assert_eq!(d[[i, j]].to_bits(), d[[j, i]].to_bits());
                }
            }
        }
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        let points = array![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0], [2.0, 0.0]];
        let d = pairwise_distances(points.view(), Metric::Cosine);
        assert_eq!(d[[0, 2]], 0.0);
        assert_eq!(d[[0, 1]], 1.0);
        assert_abs_diff_eq!(d[[1, 3]], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_points_rejected() {
        let stage = AffinityStage::new(Metric::Euclidean);
        let err = stage
            .transform(
                Artifact::Points(Array2::zeros((0, 2))),
                &mut Diagnostics::default(),
            )
            .unwrap_err();
        assert_eq!(err, Error::EmptyInput);
    }
}
