//! Fiedler-vector embedding.
//!
//! Pairs are stably sorted by eigenvalue, so on a tie the pair with the
//! smaller solver index wins. The selected vector's sign is fixed so that its
//! largest-magnitude entry is positive (first such entry on equal magnitude).

use log::{debug, warn};
use ndarray::Array2;

use super::EigenPairs;
use crate::config::Embedding;
use crate::error::{Error, Result};
use crate::pipeline::{Artifact, Diagnostics, Stage};

/// The two smallest eigenvalues and the connectivity verdict drawn from them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connectivity {
    /// Smallest eigenvalue (≈ 0 for a Laplacian).
    pub lambda1: f64,
    /// Second-smallest eigenvalue (algebraic connectivity).
    pub lambda2: f64,
    /// `λ₂` is above the tolerance.
    pub connected: bool,
}

/// Read `λ₁`, `λ₂` from `pairs` and decide whether `λ₂` is distinguishable from zero.
///
/// `λ₂ ≤ tol · max(1, max|λ|)` counts as zero: the graph is disconnected or
/// numerically degenerate.
pub fn connectivity(pairs: &EigenPairs, tol: f64) -> Result<Connectivity> {
    if pairs.len() < 2 {
        return Err(Error::ShapeMismatch {
            expected: "at least 2 eigenpairs".to_string(),
            actual: pairs.len().to_string(),
        });
    }
    let order = pairs.ascending_order();
    let lambda1 = pairs.values[order[0]];
    let lambda2 = pairs.values[order[1]];
    let scale = pairs.values.iter().fold(1.0f64, |m, v| m.max(v.abs()));
    Ok(Connectivity {
        lambda1,
        lambda2,
        connected: lambda2 > tol * scale,
    })
}

/// The Fiedler vector as an `n × 1` embedding.
pub fn fiedler_embedding(pairs: &EigenPairs) -> Result<Array2<f64>> {
    if pairs.len() < 2 {
        return Err(Error::ShapeMismatch {
            expected: "at least 2 eigenpairs".to_string(),
            actual: pairs.len().to_string(),
        });
    }
    let index = pairs.ascending_order()[1];
    let column = pairs.vector(index);

    let mut pivot = 0.0f64;
    for &v in column.iter() {
        if v.abs() > pivot.abs() {
            pivot = v;
        }
    }
    let sign = if pivot < 0.0 { -1.0 } else { 1.0 };

    let n = column.len();
    Ok(Array2::from_shape_fn((n, 1), |(r, _)| sign * column[r]))
}

/// Embedding stage: eigenpair set → `n × 1` Fiedler coordinates.
#[derive(Debug, Clone, Copy)]
pub struct EmbedStage {
    embedding: Embedding,
}

impl EmbedStage {
    /// Create the stage.
    pub fn new(embedding: Embedding) -> Self {
        Self { embedding }
    }

    /// Embed and report connectivity.
    ///
    /// A disconnected graph is logged and flagged, or rejected when the
    /// variant is `strict`.
    pub fn embed(&self, pairs: &EigenPairs) -> Result<(Array2<f64>, Connectivity)> {
        let Embedding::Fiedler { tol, strict } = self.embedding;
        let conn = connectivity(pairs, tol)?;
        debug!("λ₁ = {:e}, λ₂ = {:e}", conn.lambda1, conn.lambda2);

        if !conn.connected {
            if strict {
                return Err(Error::DisconnectedGraph {
                    lambda2: conn.lambda2,
                });
            }
            warn!(
                "second-smallest eigenvalue {:e} is not positive: graph is disconnected or \
                 degenerate, clusters follow the components",
                conn.lambda2
            );
        }
        Ok((fiedler_embedding(pairs)?, conn))
    }
}

impl Stage for EmbedStage {
    fn name(&self) -> &'static str {
        "embedding"
    }

    fn transform(&self, input: Artifact, diagnostics: &mut Diagnostics) -> Result<Artifact> {
        let pairs = input.into_spectrum(self.name())?;
        let (embedding, conn) = self.embed(&pairs)?;
        diagnostics.lambda1 = Some(conn.lambda1);
        diagnostics.lambda2 = Some(conn.lambda2);
        diagnostics.disconnected = !conn.connected;
        Ok(Artifact::Embedding(embedding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CONNECTIVITY_TOL;
    use crate::graph::laplacian;
    use crate::spectral::dense_symmetric;
    use ndarray::array;

    fn strict() -> EmbedStage {
        EmbedStage::new(Embedding::Fiedler {
            tol: DEFAULT_CONNECTIVITY_TOL,
            strict: true,
        })
    }

    #[test]
    fn picks_second_smallest_in_any_solver_order() {
        let pairs = EigenPairs::new(
            array![3.0, 0.0, 1.0],
            array![[0.0, 1.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0, 0.0]],
        )
        .unwrap();
        let emb = fiedler_embedding(&pairs).unwrap();
        // column 2, sign flipped so the pivot is positive
        assert_eq!(emb, array![[0.0], [1.0], [0.0]]);
    }

    #[test]
    fn tie_goes_to_smaller_solver_index() {
        let pairs = EigenPairs::new(
            array![0.0, 0.5, 0.5],
            array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        )
        .unwrap();
        let emb = fiedler_embedding(&pairs).unwrap();
        assert_eq!(emb.column(0).to_vec(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn connected_path_reports_positive_lambda2() {
        let adj = array![[0.0, 1.0, 0.0], [1.0, 0.0, 1.0], [0.0, 1.0, 0.0]];
        let pairs = dense_symmetric(laplacian(adj.view()).view()).unwrap();
        let (emb, conn) = strict().embed(&pairs).unwrap();
        assert!(conn.connected);
        assert!((conn.lambda2 - 1.0).abs() < 1e-9);
        // the Fiedler vector of P3 is (1, 0, -1)/√2 up to sign
        assert!(emb[[1, 0]].abs() < 1e-9);
        assert!((emb[[0, 0]] + emb[[2, 0]]).abs() < 1e-9);
    }

    #[test]
    fn disconnected_graph_is_flagged() {
        let adj = array![
            [0.0, 1.0, 0.0, 0.0],
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
            [0.0, 0.0, 1.0, 0.0]
        ];
        let pairs = dense_symmetric(laplacian(adj.view()).view()).unwrap();

        let mut diagnostics = Diagnostics::default();
        let out = EmbedStage::new(Embedding::default())
            .transform(Artifact::Spectrum(pairs.clone()), &mut diagnostics)
            .unwrap();
        assert_eq!(out.shape(), (4, 1));
        assert!(diagnostics.disconnected);

        assert!(matches!(
            strict().embed(&pairs),
            Err(Error::DisconnectedGraph { .. })
        ));
    }

    #[test]
    fn needs_two_pairs() {
        let pairs = EigenPairs::new(array![0.0], array![[1.0], [1.0]]).unwrap();
        assert!(fiedler_embedding(&pairs).is_err());
        assert!(connectivity(&pairs, 0.0).is_err());
    }
}
