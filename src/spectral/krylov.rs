//! Krylov-subspace eigensolvers over a CSR Laplacian.
//!
//! Both solvers target the smallest eigenvalues of `L` by iterating on the
//! shifted operator `B = σI - L`, where `σ` is the Gershgorin bound
//! `max_i Σ_j |L_ij|`. Every eigenvalue of `B` then has non-negative real
//! part and the largest ones correspond to the smallest of `L`, which is the
//! end of the spectrum Krylov methods converge to first.
//!
//! Both keep the full basis and reorthogonalise twice per step, so the
//! iteration cannot lose orthogonality; in the worst case it runs to `n`
//! steps and becomes an exact (if expensive) dense solve. A breakdown
//! (invariant subspace found early) continues from a fresh random direction
//! orthogonal to the basis.
//!
//! A single Krylov sequence sees each eigenspace once, so a repeated
//! eigenvalue (e.g. the zero eigenvalue of a disconnected graph) comes back
//! with multiplicity one. After the first run converges, its Ritz vectors are
//! locked and the iteration restarts on the orthogonal complement. Any pair the
//! restart finds above the current `n_eigen`-th Ritz value of `B` (below the
//! `n_eigen`-th eigenvalue of `L`) is locked too, and the answer is recomputed
//! by Rayleigh-Ritz over the locked span. Restarts stop once one finds nothing
//! new. The locked span stays an invariant subspace of `B`, so this also holds
//! for the non-symmetric operator used by Arnoldi.

use faer::{Mat, Side};
use log::{debug, trace};
use ndarray::{Array1, Array2, ArrayView2};
use rand::prelude::*;
use sprs::{CsMat, TriMat};

use super::decompose::aligned_real;
use super::EigenPairs;
use crate::error::{Error, Result};

/// Fixed seed for the start vector; results are deterministic.
const START_SEED: u64 = 0x5eed_f1ed;
/// Minimum number of steps between Ritz convergence checks.
const CHECK_EVERY: usize = 5;
/// Residual tolerance relative to the shift.
const RESIDUAL_TOL: f64 = 1e-10;
/// Next-vector norm (relative to the shift) treated as a breakdown.
const BREAKDOWN_TOL: f64 = 1e-12;
/// A restart must beat the current `n_eigen`-th Ritz value by this much (relative to the shift).
const LOCK_TOL: f64 = 1e-8;

/// `σI - L` with `L` stored as CSR.
#[derive(Debug, Clone)]
pub(crate) struct ShiftedCsr {
    mat: CsMat<f64>,
    shift: f64,
}

impl ShiftedCsr {
    pub(crate) fn from_dense(lap: ArrayView2<'_, f64>) -> Self {
        let n = lap.nrows();
        let mut triplets = TriMat::new((n, n));
        let mut shift = 0.0f64;
        for (i, row) in lap.rows().into_iter().enumerate() {
            let mut radius = 0.0;
            for (j, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    triplets.add_triplet(i, j, v);
                    radius += v.abs();
                }
            }
            shift = shift.max(radius);
        }
        let mat: CsMat<f64> = triplets.to_csr();
        debug!(
            "csr laplacian: {n}x{n}, {} non-zeros, shift {shift}",
            mat.nnz()
        );
        Self {
            mat,
            shift: shift.max(1.0),
        }
    }

    fn dim(&self) -> usize {
        self.mat.rows()
    }

    /// `out = σx - Lx`
    fn apply(&self, x: &[f64], out: &mut [f64]) {
        for (i, row) in self.mat.outer_iterator().enumerate() {
            let lx: f64 = row.iter().map(|(j, &v)| v * x[j]).sum();
            out[i] = self.shift * x[i] - lx;
        }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

fn norm(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// Krylov recurrence: three-term (symmetric `L`) or full Hessenberg (general `L`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recurrence {
    Lanczos,
    Arnoldi,
}

impl Recurrence {
    fn method(self) -> &'static str {
        match self {
            Recurrence::Lanczos => "sparse_symmetric",
            Recurrence::Arnoldi => "sparse_general",
        }
    }
}

/// Ritz value of `B` with its unit Ritz vector.
type RitzPair = (f64, Vec<f64>);

/// Eigenpair of a small projected matrix.
struct Projected {
    theta: f64,
    coeffs: Vec<f64>,
    /// Modulus of the last coefficient, for the residual estimate.
    last: f64,
}

/// Project `w` off the locked vectors and every basis vector, twice.
/// Returns the accumulated basis coefficients.
fn reorthogonalise(locked: &[Vec<f64>], basis: &[Vec<f64>], w: &mut [f64]) -> Vec<f64> {
    let mut coeffs = vec![0.0; basis.len()];
    for _ in 0..2 {
        for b in locked {
            let proj = dot(w, b);
            axpy(-proj, b, w);
        }
        for (c, b) in coeffs.iter_mut().zip(basis) {
            let proj = dot(w, b);
            axpy(-proj, b, w);
            *c += proj;
        }
    }
    coeffs
}

fn random_unit(n: usize, rng: &mut StdRng) -> Vec<f64> {
    let mut v: Vec<f64> = (0..n).map(|_| rng.random_range(-1.0..1.0)).collect();
    let len = norm(&v);
    v.iter_mut().for_each(|x| *x /= len);
    v
}

/// A random unit vector orthogonal to `locked` and `basis`, if they do not span everything.
fn fresh_direction(
    locked: &[Vec<f64>],
    basis: &[Vec<f64>],
    n: usize,
    rng: &mut StdRng,
) -> Option<Vec<f64>> {
    if locked.len() + basis.len() >= n {
        return None;
    }
    for _ in 0..8 {
        let mut v = random_unit(n, rng);
        reorthogonalise(locked, basis, &mut v);
        let len = norm(&v);
        if len > 1e-8 {
            v.iter_mut().for_each(|x| *x /= len);
            return Some(v);
        }
    }
    None
}

/// Combine basis vectors with `coeffs` and normalise.
fn ritz_vector(basis: &[Vec<f64>], coeffs: &[f64], n: usize) -> Vec<f64> {
    let mut x = vec![0.0; n];
    for (b, &c) in basis.iter().zip(coeffs) {
        axpy(c, b, &mut x);
    }
    let len = norm(&x);
    if len > 0.0 {
        x.iter_mut().for_each(|v| *v /= len);
    }
    x
}

/// Assemble ascending eigenpairs of `L` from selected Ritz values of `B`.
fn assemble(shift: f64, mut pairs: Vec<RitzPair>, n: usize) -> Result<EigenPairs> {
    for pair in &mut pairs {
        pair.0 = shift - pair.0;
    }
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    let values: Array1<f64> = pairs.iter().map(|p| p.0).collect();
    let vectors = Array2::from_shape_fn((n, pairs.len()), |(r, c)| pairs[c].1[r]);
    EigenPairs::new(values, vectors)
}

/// The `want` eigenpairs of `h` with the largest real part, largest first.
fn projected_eigen(h: Mat<f64>, want: usize, recurrence: Recurrence) -> Result<Vec<Projected>> {
    let m = h.nrows();
    let method = recurrence.method();
    match recurrence {
        Recurrence::Lanczos => {
            let eig = h
                .self_adjoint_eigen(Side::Lower)
                .map_err(|e| Error::Decomposition {
                    method,
                    message: format!("projected solve failed: {e:?}"),
                })?;
            let values_diag = eig.S();
            let vectors_mat = eig.U();
            // faer returns ascending values
            Ok((0..m)
                .rev()
                .take(want)
                .map(|k| Projected {
                    theta: values_diag[k],
                    coeffs: (0..m).map(|r| vectors_mat[(r, k)]).collect(),
                    last: vectors_mat[(m - 1, k)].abs(),
                })
                .collect())
        }
        Recurrence::Arnoldi => {
            let eig = h.eigen().map_err(|e| Error::Decomposition {
                method,
                message: format!("projected solve failed: {e:?}"),
            })?;
            let theta = eig.S();
            let y = eig.U();
            let mut order: Vec<usize> = (0..m).collect();
            order.sort_by(|&a, &b| theta[b].re.total_cmp(&theta[a].re));
            Ok(order
                .into_iter()
                .take(want)
                .map(|k| {
                    let last = y[(m - 1, k)];
                    Projected {
                        theta: theta[k].re,
                        coeffs: aligned_real(m, |r| {
                            let z = y[(r, k)];
                            (z.re, z.im)
                        }),
                        last: last.re.hypot(last.im),
                    }
                })
                .collect())
        }
    }
}

/// One Krylov run on `B` restricted to the complement of `locked`.
///
/// Returns the `want` Ritz pairs of largest value once their residuals
/// converge, or once the basis spans the whole complement.
fn krylov_run(
    op: &ShiftedCsr,
    want: usize,
    locked: &[Vec<f64>],
    rng: &mut StdRng,
    recurrence: Recurrence,
) -> Result<Vec<RitzPair>> {
    let n = op.dim();
    let n_free = n - locked.len();
    let tol = RESIDUAL_TOL * op.shift;
    let method = recurrence.method();
    let exhausted = |m: usize| Error::Decomposition {
        method,
        message: format!("krylov basis exhausted at {m} of {n_free} vectors"),
    };

    let mut basis: Vec<Vec<f64>> = Vec::new();
    // column j of the projected matrix, entries 0..=j+1
    let mut hess: Vec<Vec<f64>> = Vec::new();
    let mut next_check = want.max(1);
    let mut v = fresh_direction(locked, &[], n, rng).ok_or_else(|| exhausted(0))?;
    let mut w = vec![0.0; n];

    loop {
        op.apply(&v, &mut w);
        basis.push(std::mem::take(&mut v));
        let mut column = reorthogonalise(locked, &basis, &mut w);
        let beta = norm(&w);
        let m = basis.len();
        let breakdown = beta <= BREAKDOWN_TOL * op.shift;
        column.push(if breakdown { 0.0 } else { beta });
        hess.push(column);

        if m == n_free || (m >= next_check && !breakdown) {
            next_check = m + (m / 10).max(CHECK_EVERY);
            let h = match recurrence {
                // only the tridiagonal band; the rest is rounding
                Recurrence::Lanczos => Mat::from_fn(m, m, |i, j| {
                    if i == j || i == j + 1 {
                        hess[j][i]
                    } else if j == i + 1 {
                        hess[i][j]
                    } else {
                        0.0
                    }
                }),
                Recurrence::Arnoldi => {
                    Mat::from_fn(m, m, |i, j| hess[j].get(i).copied().unwrap_or(0.0))
                }
            };
            let wanted = projected_eigen(h, want, recurrence)?;
            let worst = wanted.iter().map(|p| beta * p.last).fold(0.0f64, f64::max);
            trace!("{method} step {m}: worst residual {worst:e}");

            if worst <= tol || m == n_free {
                debug!(
                    "{method} run converged after {m} steps (residual {worst:e}, {} locked)",
                    locked.len()
                );
                return Ok(wanted
                    .into_iter()
                    .map(|p| (p.theta, ritz_vector(&basis, &p.coeffs, n)))
                    .collect());
            }
        }

        if breakdown {
            trace!("{method} breakdown at step {m}, restarting direction");
            v = fresh_direction(locked, &basis, n, rng).ok_or_else(|| exhausted(m))?;
        } else {
            v = w.iter().map(|x| x / beta).collect();
        }
    }
}

/// Add the vectors of `pairs` to the orthonormal set `locked`.
fn lock(locked: &mut Vec<Vec<f64>>, pairs: &[RitzPair]) {
    for (_, x) in pairs {
        let mut v = x.clone();
        reorthogonalise(&locked[..], &[], &mut v);
        let len = norm(&v);
        if len > 1e-8 {
            v.iter_mut().for_each(|e| *e /= len);
            locked.push(v);
        }
    }
}

/// Rayleigh-Ritz over the span of `locked`: the `want` pairs of largest value.
fn rayleigh_ritz(
    op: &ShiftedCsr,
    locked: &[Vec<f64>],
    want: usize,
    recurrence: Recurrence,
) -> Result<Vec<RitzPair>> {
    let n = op.dim();
    let p = locked.len();
    let images: Vec<Vec<f64>> = locked
        .iter()
        .map(|x| {
            let mut bx = vec![0.0; n];
            op.apply(x, &mut bx);
            bx
        })
        .collect();
    let h = match recurrence {
        Recurrence::Lanczos => Mat::from_fn(p, p, |i, j| {
            0.5 * (dot(&locked[i], &images[j]) + dot(&locked[j], &images[i]))
        }),
        Recurrence::Arnoldi => Mat::from_fn(p, p, |i, j| dot(&locked[i], &images[j])),
    };
    Ok(projected_eigen(h, want, recurrence)?
        .into_iter()
        .map(|pr| (pr.theta, ritz_vector(locked, &pr.coeffs, n)))
        .collect())
}

/// Smallest Ritz value of `B` among `pairs`, i.e. the current `n_eigen`-th.
fn lowest_value(pairs: &[RitzPair]) -> f64 {
    pairs.iter().map(|p| p.0).fold(f64::INFINITY, f64::min)
}

/// Run, then restart with locking until no missed eigenvalue turns up.
fn locked_search(op: &ShiftedCsr, n_eigen: usize, recurrence: Recurrence) -> Result<EigenPairs> {
    let n = op.dim();
    let method = recurrence.method();
    let mut rng = StdRng::seed_from_u64(START_SEED);

    let mut pairs = krylov_run(op, n_eigen, &[], &mut rng, recurrence)?;
    let mut locked = Vec::new();
    lock(&mut locked, &pairs);

    let mut restarts = 0;
    while locked.len() < n {
        let want = n_eigen.min(n - locked.len());
        let cutoff = lowest_value(&pairs) + LOCK_TOL * op.shift;
        let missed: Vec<RitzPair> = krylov_run(op, want, &locked, &mut rng, recurrence)?
            .into_iter()
            .filter(|p| p.0 > cutoff)
            .collect();
        if missed.is_empty() {
            break;
        }
        restarts += 1;
        debug!("{method}: restart {restarts} found {} missed pair(s)", missed.len());
        lock(&mut locked, &missed);
        pairs = rayleigh_ritz(op, &locked, n_eigen, recurrence)?;
    }
    debug!("{method}: {} pairs after {restarts} restart(s)", pairs.len());
    assemble(op.shift, pairs, n)
}

/// Lanczos iteration for the `n_eigen` smallest eigenpairs of a symmetric `L`.
pub(crate) fn lanczos(op: &ShiftedCsr, n_eigen: usize) -> Result<EigenPairs> {
    locked_search(op, n_eigen, Recurrence::Lanczos)
}

/// Arnoldi iteration for the `n_eigen` smallest-magnitude eigenpairs of a general `L`.
pub(crate) fn arnoldi(op: &ShiftedCsr, n_eigen: usize) -> Result<EigenPairs> {
    locked_search(op, n_eigen, Recurrence::Arnoldi)
}
