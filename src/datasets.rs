//! Synthetic point sets with ground-truth labels.
//!
//! Every generator is seeded and returns `(points, labels)`.

use std::f64::consts::PI;

use ndarray::{Array2, ArrayView2};
use rand::prelude::*;
use rand_distr::Normal;

use crate::error::{Error, Result};

fn gaussian(std: f64, name: &'static str) -> Result<Normal<f64>> {
    if !(std.is_finite() && std >= 0.0) {
        return Err(Error::InvalidParameter {
            name,
            message: format!("must be a non-negative finite number, got {std}"),
        });
    }
    Normal::new(0.0, std).map_err(|e| Error::InvalidParameter {
        name,
        message: e.to_string(),
    })
}

/// Reorder rows (and labels) by a seeded random permutation.
fn shuffle_rows(
    points: Array2<f64>,
    labels: Vec<usize>,
    rng: &mut StdRng,
) -> (Array2<f64>, Vec<usize>) {
    let mut order: Vec<usize> = (0..labels.len()).collect();
    order.shuffle(rng);
    let shuffled = Array2::from_shape_fn(points.dim(), |(r, c)| points[[order[r], c]]);
    let labels = order.iter().map(|&i| labels[i]).collect();
    (shuffled, labels)
}

/// Two interleaving half-circles in 2-D.
///
/// The outer moon (label 0) gets `n / 2` points, the inner moon (label 1) the
/// rest; points are evenly spaced along each arc, perturbed by Gaussian noise
/// of standard deviation `noise`, then shuffled.
pub fn make_moons(n: usize, noise: f64, seed: u64) -> Result<(Array2<f64>, Vec<usize>)> {
    let normal = gaussian(noise, "noise")?;
    let mut rng = StdRng::seed_from_u64(seed);
    let n_outer = n / 2;
    let n_inner = n - n_outer;

    let angle = |i: usize, count: usize| {
        if count > 1 {
            PI * i as f64 / (count - 1) as f64
        } else {
            0.0
        }
    };

    let mut points = Array2::zeros((n, 2));
    let mut labels = Vec::with_capacity(n);
    for i in 0..n_outer {
        let t = angle(i, n_outer);
        points[[i, 0]] = t.cos();
        points[[i, 1]] = t.sin();
        labels.push(0);
    }
    for i in 0..n_inner {
        let t = angle(i, n_inner);
        points[[n_outer + i, 0]] = 1.0 - t.cos();
        points[[n_outer + i, 1]] = 0.5 - t.sin();
        labels.push(1);
    }

    let (mut points, labels) = shuffle_rows(points, labels, &mut rng);
    points.mapv_inplace(|v| v + normal.sample(&mut rng));
    Ok((points, labels))
}

/// `n_moons` alternating half-circles laid out left to right.
///
/// Moon `y` is centred at `x = 1.3·y`; odd moons open downwards and are
/// lifted by `y_shift`. Each moon gets `⌈n_points / n_moons⌉` uniformly
/// random angles; the combined set is noised, shuffled and trimmed to
/// `n_points` rows, so the last moons may end up slightly smaller.
pub fn make_many_moons(
    n_moons: usize,
    sigma: f64,
    n_points: usize,
    y_shift: f64,
    seed: u64,
) -> Result<(Array2<f64>, Vec<usize>)> {
    if n_moons == 0 {
        return Err(Error::InvalidParameter {
            name: "n_moons",
            message: "must be at least 1".to_string(),
        });
    }
    let normal = gaussian(sigma, "sigma")?;
    let mut rng = StdRng::seed_from_u64(seed);
    let per_moon = n_points.div_ceil(n_moons);
    let total = per_moon * n_moons;

    let mut points = Array2::zeros((total, 2));
    let mut labels = Vec::with_capacity(total);
    for y in 0..n_moons {
        let flipped = y % 2 == 1;
        let factor = if flipped { -1.0 } else { 1.0 };
        let lift = if flipped { y_shift } else { 0.0 };
        for i in 0..per_moon {
            let q = rng.random_range(0.0..PI);
            let row = y * per_moon + i;
            points[[row, 0]] = q.cos() + 1.3 * y as f64 + normal.sample(&mut rng);
            points[[row, 1]] = q.sin() * factor + lift + normal.sample(&mut rng);
            labels.push(y);
        }
    }

    let (points, mut labels) = shuffle_rows(points, labels, &mut rng);
    labels.truncate(n_points);
    let points = points.slice(ndarray::s![..n_points, ..]).to_owned();
    Ok((points, labels))
}

/// Isotropic Gaussian blobs, `n_per` points around each row of `centers`.
///
/// Rows are grouped by blob (not shuffled); blob `i` has label `i`.
pub fn make_blobs(
    centers: ArrayView2<'_, f64>,
    n_per: usize,
    std: f64,
    seed: u64,
) -> Result<(Array2<f64>, Vec<usize>)> {
    let normal = gaussian(std, "std")?;
    let mut rng = StdRng::seed_from_u64(seed);
    let (k, d) = centers.dim();

    let mut points = Array2::zeros((k * n_per, d));
    let mut labels = Vec::with_capacity(k * n_per);
    for (c, center) in centers.rows().into_iter().enumerate() {
        for i in 0..n_per {
            let mut row = points.row_mut(c * n_per + i);
            for (dst, &mu) in row.iter_mut().zip(center.iter()) {
                *dst = mu + normal.sample(&mut rng);
            }
            labels.push(c);
        }
    }
    Ok((points, labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn moons_without_noise_lie_on_their_arcs() {
        let (points, labels) = make_moons(50, 0.0, 3).unwrap();
        assert_eq!(points.dim(), (50, 2));
        assert_eq!(labels.iter().filter(|&&l| l == 0).count(), 25);
        for (row, &label) in points.rows().into_iter().zip(&labels) {
            let (cx, cy) = if label == 0 { (0.0, 0.0) } else { (1.0, 0.5) };
            let r = ((row[0] - cx).powi(2) + (row[1] - cy).powi(2)).sqrt();
            assert!((r - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn moons_are_shuffled_and_reproducible() {
        let (a, la) = make_moons(40, 0.05, 11).unwrap();
        let (b, lb) = make_moons(40, 0.05, 11).unwrap();
        assert_eq!(a, b);
        assert_eq!(la, lb);
        // a sorted label vector would mean no shuffle happened
        assert!(la.windows(2).any(|w| w[0] > w[1]));
    }

    #[test]
    fn many_moons_trims_to_requested_size() {
        let (points, labels) = make_many_moons(3, 0.0, 10, 0.5, 1).unwrap();
        assert_eq!(points.nrows(), 10);
        assert_eq!(labels.len(), 10);
        assert!(labels.iter().all(|&l| l < 3));
        for (row, &y) in points.rows().into_iter().zip(&labels) {
            let cx = 1.3 * y as f64;
            assert!((row[0] - cx).abs() <= 1.0 + 1e-12);
            if y % 2 == 1 {
                assert!(row[1] <= 0.5 + 1e-12);
            } else {
                assert!(row[1] >= 0.0);
            }
        }
    }

    #[test]
    fn blobs_are_grouped_around_centers() {
        let centers = array![[0.0, 0.0], [10.0, 10.0]];
        let (points, labels) = make_blobs(centers.view(), 5, 0.1, 2).unwrap();
        assert_eq!(points.dim(), (10, 2));
        assert_eq!(labels, vec![0, 0, 0, 0, 0, 1, 1, 1, 1, 1]);
        assert!(points[[7, 0]] > 9.0);
    }

    #[test]
    fn negative_noise_rejected() {
        assert!(matches!(
            make_moons(10, -1.0, 0),
            Err(Error::InvalidParameter { name: "noise", .. })
        ));
        assert!(make_many_moons(0, 0.1, 10, 0.5, 0).is_err());
    }
}
