//! Eigendecomposition of the Laplacian and spectral embedding.
//!
//! # Why the second eigenvector
//!
//! For a graph Laplacian `L` (positive semi-definite), the multiplicity of the
//! eigenvalue 0 equals the number of connected components, and the
//! eigenvector of 0 on a connected graph is constant. The eigenvector of the
//! second-smallest eigenvalue (the *Fiedler vector*) minimises the relaxed
//! ratio cut; thresholding it approximates the best bipartition.
//!
//! ```text
//! λ₁ = 0 ≤ λ₂ ≤ … ≤ λₙ          λ₂ > 0  ⇔  graph connected
//! ```
//!
//! # Solvers
//!
//! | Variant | Returns | Cost |
//! |---------|---------|------|
//! | `dense_general` | all `n` pairs, solver order | O(n³) |
//! | `dense_symmetric` | all `n` pairs, ascending | O(n³), faster constant |
//! | `sparse_general` | `n_eigen` smallest, ascending | Arnoldi on CSR |
//! | `sparse_symmetric` | `n_eigen` smallest, ascending | Lanczos on CSR |
//!
//! # References
//!
//! - Fiedler (1973). "Algebraic connectivity of graphs"
//! - Saad (2011). "Numerical Methods for Large Eigenvalue Problems", ch. 6

mod decompose;
mod embed;
#[cfg(feature = "sparse")]
mod krylov;

pub use decompose::{dense_general, dense_symmetric, DecomposeStage};
#[cfg(feature = "sparse")]
pub use decompose::{sparse_general, sparse_symmetric};
pub use embed::{connectivity, fiedler_embedding, Connectivity, EmbedStage};

use ndarray::{Array1, Array2, ArrayView1};

use crate::error::{Error, Result};

/// Eigenvalue/eigenvector pairs: column `i` of `vectors` belongs to `values[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenPairs {
    /// Eigenvalues (real parts), in solver order.
    pub values: Array1<f64>,
    /// `n × m` eigenvectors as columns.
    pub vectors: Array2<f64>,
}

impl EigenPairs {
    /// Pair up values with eigenvector columns.
    pub fn new(values: Array1<f64>, vectors: Array2<f64>) -> Result<Self> {
        if vectors.ncols() != values.len() {
            return Err(Error::DimensionMismatch {
                expected: values.len(),
                found: vectors.ncols(),
            });
        }
        Ok(Self { values, vectors })
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Eigenvector `i`.
    pub fn vector(&self, i: usize) -> ArrayView1<'_, f64> {
        self.vectors.column(i)
    }

    /// Pair indices by ascending eigenvalue.
    ///
    /// The sort is stable, so equal eigenvalues keep solver order (smaller
    /// solver index first).
    pub fn ascending_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        order.sort_by(|&a, &b| self.values[a].total_cmp(&self.values[b]));
        order
    }

    /// Reorder pairs by ascending eigenvalue.
    pub fn into_ascending(self) -> Self {
        let order = self.ascending_order();
        let values = order.iter().map(|&i| self.values[i]).collect();
        let n = self.vectors.nrows();
        let vectors = Array2::from_shape_fn((n, order.len()), |(r, c)| self.vectors[[r, order[c]]]);
        Self { values, vectors }
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite()) && self.vectors.iter().all(|v| v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn ascending_order_is_stable_on_ties() {
        let pairs = EigenPairs::new(
            array![2.0, 0.0, 1.0, 1.0],
            Array2::eye(4),
        )
        .unwrap();
        assert_eq!(pairs.ascending_order(), vec![1, 2, 3, 0]);

        let sorted = pairs.into_ascending();
        assert_eq!(sorted.values, array![0.0, 1.0, 1.0, 2.0]);
        // tie keeps solver order: column for value index 2 before index 3
        assert_eq!(sorted.vector(1)[2], 1.0);
        assert_eq!(sorted.vector(2)[3], 1.0);
    }

    #[test]
    fn mismatched_pairs_rejected() {
        assert!(EigenPairs::new(array![1.0, 2.0], Array2::zeros((3, 3))).is_err());
    }
}
