use faer::{Mat, Side};
use log::{debug, trace, warn};
use ndarray::{Array1, Array2, ArrayView2};

use super::EigenPairs;
use crate::config::Decomposition;
use crate::error::{Error, Result};
use crate::pipeline::{Artifact, Diagnostics, Stage};

/// Relative asymmetry above which the symmetric solvers log a warning.
const ASYMMETRY_TOL: f64 = 1e-12;

fn check_square(lap: ArrayView2<'_, f64>, method: &'static str) -> Result<usize> {
    let (rows, cols) = lap.dim();
    if rows != cols {
        return Err(Error::ShapeMismatch {
            expected: "square laplacian".to_string(),
            actual: format!("{rows}x{cols}"),
        });
    }
    if rows == 0 {
        return Err(Error::Decomposition {
            method,
            message: "empty matrix".to_string(),
        });
    }
    Ok(rows)
}

/// Symmetric part `(L + Lᵀ) / 2`, warning when `L` was not symmetric.
///
/// Only the directed k-NN graph produces an asymmetric Laplacian.
pub(crate) fn symmetric_part(lap: ArrayView2<'_, f64>, method: &'static str) -> Array2<f64> {
    let scale = lap.iter().fold(1.0f64, |m, v| m.max(v.abs()));
    let asym = lap
        .indexed_iter()
        .map(|((i, j), v)| (v - lap[[j, i]]).abs())
        .fold(0.0f64, f64::max);
    if asym > ASYMMETRY_TOL * scale {
        warn!(
            "{method}: laplacian is not symmetric (max |L - Lᵀ| = {asym:e}); using (L + Lᵀ)/2"
        );
    }
    Array2::from_shape_fn(lap.dim(), |(i, j)| 0.5 * (lap[[i, j]] + lap[[j, i]]))
}

/// Real vector from a complex eigenvector, after rotating its largest entry onto the real axis.
///
/// Eigenvectors of real eigenvalues are only defined up to a complex phase;
/// taking the raw real part can shrink them to noise.
pub(crate) fn aligned_real(len: usize, entry: impl Fn(usize) -> (f64, f64)) -> Vec<f64> {
    let (mut pr, mut pi, mut best) = (1.0, 0.0, 0.0);
    for i in 0..len {
        let (re, im) = entry(i);
        let mag = re.hypot(im);
        if mag > best {
            best = mag;
            pr = re / mag;
            pi = im / mag;
        }
    }
    (0..len)
        .map(|i| {
            let (re, im) = entry(i);
            re * pr + im * pi
        })
        .collect()
}

/// Full eigendecomposition of a symmetric matrix, eigenvalues ascending.
pub fn dense_symmetric(lap: ArrayView2<'_, f64>) -> Result<EigenPairs> {
    let n = check_square(lap, "dense_symmetric")?;
    let sym = symmetric_part(lap, "dense_symmetric");
    let mat = Mat::from_fn(n, n, |i, j| sym[[i, j]]);

    let eig = mat
        .self_adjoint_eigen(Side::Lower)
        .map_err(|e| Error::Decomposition {
            method: "dense_symmetric",
            message: format!("{e:?}"),
        })?;
    let eigenvalues_diag = eig.S();
    let eigenvectors_mat = eig.U();

    let values = Array1::from_shape_fn(n, |i| eigenvalues_diag[i]);
    let vectors = Array2::from_shape_fn((n, n), |(r, c)| eigenvectors_mat[(r, c)]);
    trace!("dense_symmetric: λ range [{:e}, {:e}]", values[0], values[n - 1]);
    EigenPairs::new(values, vectors)
}

/// Full eigendecomposition of a general square matrix.
///
/// Pairs are returned in solver order. Only real parts are kept: for a
/// Laplacian the imaginary parts are floating-point noise.
pub fn dense_general(lap: ArrayView2<'_, f64>) -> Result<EigenPairs> {
    let n = check_square(lap, "dense_general")?;
    let mat = Mat::from_fn(n, n, |i, j| lap[[i, j]]);

    let eig = mat.eigen().map_err(|e| Error::Decomposition {
        method: "dense_general",
        message: format!("{e:?}"),
    })?;
    let s = eig.S();
    let u = eig.U();

    let mut max_imag = 0.0f64;
    let mut values = Array1::zeros(n);
    let mut vectors = Array2::zeros((n, n));
    for c in 0..n {
        let lambda = s[c];
        max_imag = max_imag.max(lambda.im.abs());
        values[c] = lambda.re;
        let column = aligned_real(n, |r| {
            let z = u[(r, c)];
            (z.re, z.im)
        });
        for (r, v) in column.into_iter().enumerate() {
            vectors[[r, c]] = v;
        }
    }
    if max_imag > 0.0 {
        debug!("dense_general: discarded imaginary parts up to {max_imag:e}");
    }
    EigenPairs::new(values, vectors)
}

/// The `n_eigen` smallest eigenpairs of a symmetric matrix via Lanczos on its CSR form.
#[cfg(feature = "sparse")]
pub fn sparse_symmetric(lap: ArrayView2<'_, f64>, n_eigen: usize) -> Result<EigenPairs> {
    let n = check_square(lap, "sparse_symmetric")?;
    let sym = symmetric_part(lap, "sparse_symmetric");
    let op = super::krylov::ShiftedCsr::from_dense(sym.view());
    super::krylov::lanczos(&op, n_eigen.min(n))
}

/// The `n_eigen` smallest-magnitude eigenpairs of a general matrix via Arnoldi on its CSR form.
#[cfg(feature = "sparse")]
pub fn sparse_general(lap: ArrayView2<'_, f64>, n_eigen: usize) -> Result<EigenPairs> {
    let n = check_square(lap, "sparse_general")?;
    let op = super::krylov::ShiftedCsr::from_dense(lap);
    super::krylov::arnoldi(&op, n_eigen.min(n))
}

/// Decomposition stage: Laplacian → eigenpair set.
#[derive(Debug, Clone, Copy)]
pub struct DecomposeStage {
    method: Decomposition,
}

impl DecomposeStage {
    /// Create the stage.
    pub fn new(method: Decomposition) -> Self {
        Self { method }
    }

    /// Run the configured solver.
    pub fn decompose(&self, lap: ArrayView2<'_, f64>) -> Result<EigenPairs> {
        debug!("{} decomposition of {}x{} laplacian", self.method, lap.nrows(), lap.ncols());
        match self.method {
            Decomposition::DenseGeneral => dense_general(lap),
            Decomposition::DenseSymmetric => dense_symmetric(lap),
            #[cfg(feature = "sparse")]
            Decomposition::SparseGeneral { n_eigen } => sparse_general(lap, n_eigen),
            #[cfg(feature = "sparse")]
            Decomposition::SparseSymmetric { n_eigen } => sparse_symmetric(lap, n_eigen),
        }
    }
}

impl Stage for DecomposeStage {
    fn name(&self) -> &'static str {
        "decomposition"
    }

    fn transform(&self, input: Artifact, _: &mut Diagnostics) -> Result<Artifact> {
        let lap = input.into_laplacian(self.name())?;
        self.decompose(lap.view()).map(Artifact::Spectrum)
    }
}
