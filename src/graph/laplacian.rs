//! Graph Laplacians.
//!
//! The degree of vertex `i` is the weighted row sum `d_i = Σ_j A[i,j]`. For
//! binary adjacency this is the neighbour count; for the directed k-NN graph
//! it counts how many points list `i` among their nearest.
//!
//! ```text
//! L     = D - A
//! L_sym = D^{-1/2} L D^{-1/2}
//! ```
//!
//! Isolated vertices (`d_i = 0`) get `D^{-1/2}_{ii} = 0`, so their row and
//! column of `L_sym` are zero instead of NaN.

use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayView2, Axis};

use crate::config::LaplacianKind;
use crate::error::{Error, Result};
use crate::pipeline::{Artifact, Diagnostics, Stage};

/// Weighted degree of every vertex.
pub fn degrees(adj: ArrayView2<'_, f64>) -> Array1<f64> {
    adj.sum_axis(Axis(1))
}

/// Unnormalised Laplacian `D - A`.
pub fn laplacian(adj: ArrayView2<'_, f64>) -> Array2<f64> {
    let deg = degrees(adj);
    let mut lap = adj.mapv(|w| -w);
    for (i, d) in deg.iter().enumerate() {
        lap[[i, i]] += d;
    }
    lap
}

/// Symmetric normalised Laplacian `D^{-1/2} (D - A) D^{-1/2}`.
pub fn normalised_laplacian(adj: ArrayView2<'_, f64>) -> Array2<f64> {
    let deg = degrees(adj);
    let inv_sqrt = deg.mapv(|d| if d > 0.0 { 1.0 / d.sqrt() } else { 0.0 });
    let mut lap = laplacian(adj);
    for ((i, j), value) in lap.indexed_iter_mut() {
        *value *= inv_sqrt[i] * inv_sqrt[j];
    }
    lap
}

/// Laplacian stage: adjacency matrix → Laplacian.
#[derive(Debug, Clone, Copy)]
pub struct LaplacianStage {
    kind: LaplacianKind,
}

impl LaplacianStage {
    /// Create the stage.
    pub fn new(kind: LaplacianKind) -> Self {
        Self { kind }
    }

    /// Build the configured Laplacian of a square adjacency matrix.
    pub fn build(&self, adj: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let (rows, cols) = adj.dim();
        if rows != cols {
            return Err(Error::ShapeMismatch {
                expected: "square adjacency matrix".to_string(),
                actual: format!("{rows}x{cols}"),
            });
        }

        let isolated = degrees(adj).iter().filter(|&&d| d == 0.0).count();
        if isolated > 0 {
            warn!("{isolated} of {rows} vertices are isolated (degree 0)");
        }
        debug!("building {} laplacian for {rows} vertices", self.kind);

        Ok(match self.kind {
            LaplacianKind::Unnormalised => laplacian(adj),
            LaplacianKind::Symmetric => normalised_laplacian(adj),
        })
    }
}

impl Stage for LaplacianStage {
    fn name(&self) -> &'static str {
        "laplacian"
    }

    fn transform(&self, input: Artifact, _: &mut Diagnostics) -> Result<Artifact> {
        let adj = input.into_adjacency(self.name())?;
        self.build(adj.view()).map(Artifact::Laplacian)
    }
}
