//! Distance matrix → adjacency matrix.
//!
//! All variants produce a `{0, 1}` matrix with an empty diagonal. Epsilon,
//! mutual k-NN and complete graphs are symmetric; the plain k-NN graph is
//! directed: column `j` marks the `k` nearest neighbours of point `j`, so
//! `A[i,j] = 1` means "i is among j's nearest".

use log::debug;
use ndarray::{Array2, ArrayView2};

use crate::config::Refinement;
use crate::error::{Error, Result};
use crate::pipeline::{Artifact, Diagnostics, Stage};

/// Connect `i` and `j` when `dist[i,j] < eps` (strict).
pub fn epsilon_graph(dist: ArrayView2<'_, f64>, eps: f64) -> Array2<f64> {
    let mut adj = dist.mapv(|d| if d < eps { 1.0 } else { 0.0 });
    adj.diag_mut().fill(0.0);
    adj
}

/// Directed k-nearest-neighbour graph.
///
/// For each point `j`, the `k` other points with the smallest `dist[i,j]` are
/// marked in column `j`; equal distances are broken by smaller index. `k` is
/// clamped to `n - 1`, so `k ≥ n - 1` yields the complete graph.
pub fn knn_graph(dist: ArrayView2<'_, f64>, k: usize) -> Array2<f64> {
    let n = dist.nrows();
    let k = k.min(n.saturating_sub(1));
    let mut adj = Array2::zeros((n, n));

    let mut order: Vec<usize> = Vec::with_capacity(n);
    for j in 0..n {
        order.clear();
        order.extend((0..n).filter(|&i| i != j));
        let column = dist.column(j);
        order.sort_by(|&a, &b| column[a].total_cmp(&column[b]).then(a.cmp(&b)));
        for &i in order.iter().take(k) {
            adj[[i, j]] = 1.0;
        }
    }
    adj
}

/// Mutual k-NN graph: the intersection of the directed k-NN relation with its transpose.
pub fn mutual_knn_graph(dist: ArrayView2<'_, f64>, k: usize) -> Array2<f64> {
    let directed = knn_graph(dist, k);
    let n = directed.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if directed[[i, j]] > 0.0 && directed[[j, i]] > 0.0 {
            1.0
        } else {
            0.0
        }
    })
}

/// Fully connected graph on `n` vertices.
pub fn complete_graph(n: usize) -> Array2<f64> {
    let mut adj = Array2::ones((n, n));
    adj.diag_mut().fill(0.0);
    adj
}

/// Refinement stage: distance matrix → adjacency matrix.
#[derive(Debug, Clone, Copy)]
pub struct RefineStage {
    refinement: Refinement,
}

impl RefineStage {
    /// Create the stage.
    pub fn new(refinement: Refinement) -> Self {
        Self { refinement }
    }

    /// Apply the configured refinement to a square distance matrix.
    pub fn refine(&self, dist: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        let (rows, cols) = dist.dim();
        if rows != cols {
            return Err(Error::ShapeMismatch {
                expected: "square distance matrix".to_string(),
                actual: format!("{rows}x{cols}"),
            });
        }

        let adj = match self.refinement {
            Refinement::Epsilon { eps } => epsilon_graph(dist, eps),
            Refinement::Knn { k } => knn_graph(dist, k),
            Refinement::MutualKnn { k } => mutual_knn_graph(dist, k),
            Refinement::Complete => complete_graph(rows),
        };

        let edges = adj.iter().filter(|&&w| w != 0.0).count();
        debug!(
            "{} refinement: {rows} vertices, {edges} directed edges",
            self.refinement
        );
        Ok(adj)
    }
}

impl Stage for RefineStage {
    fn name(&self) -> &'static str {
        "refinement"
    }

    fn transform(&self, input: Artifact, _: &mut Diagnostics) -> Result<Artifact> {
        let dist = input.into_distances(self.name())?;
        self.refine(dist.view()).map(Artifact::Adjacency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affinity::pairwise_distances;
    use crate::config::Metric;
    use ndarray::array;

    fn line() -> Array2<f64> {
        // points at 0, 1, 2, 4 on a line
        let points = array![[0.0], [1.0], [2.0], [4.0]];
        pairwise_distances(points.view(), Metric::Euclidean)
    }

    #[test]
    fn epsilon_is_strict() {
        let adj = epsilon_graph(line().view(), 1.0);
        // dist == eps is not connected
        assert_eq!(adj[[0, 1]], 0.0);
        let adj = epsilon_graph(line().view(), 1.5);
        assert_eq!(adj[[0, 1]], 1.0);
        assert_eq!(adj[[1, 2]], 1.0);
        assert_eq!(adj[[0, 2]], 0.0);
        assert_eq!(adj[[2, 3]], 0.0);
        assert!(adj.diag().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn knn_marks_columns_and_breaks_ties_by_index() {
        let adj = knn_graph(line().view(), 1);
        // point 1 is equidistant from 0 and 2: lower index wins
        assert_eq!(adj[[0, 1]], 1.0);
        assert_eq!(adj[[2, 1]], 0.0);
        // point 3's nearest is 2
        assert_eq!(adj[[2, 3]], 1.0);
        // each column has exactly k entries
        for j in 0..4 {
            assert_eq!(adj.column(j).sum(), 1.0);
        }
    }

    #[test]
    fn knn_is_directed() {
        let adj = knn_graph(line().view(), 1);
        // 3 picks 2, but 2 picks 1
        assert_eq!(adj[[2, 3]], 1.0);
        assert_eq!(adj[[3, 2]], 0.0);
    }

    #[test]
    fn mutual_knn_is_intersection() {
        let adj = mutual_knn_graph(line().view(), 1);
        assert_eq!(adj[[0, 1]], 1.0);
        assert_eq!(adj[[1, 0]], 1.0);
        assert_eq!(adj[[2, 3]], 0.0);
        assert_eq!(adj, adj.t());
    }

    #[test]
    fn knn_with_large_k_is_complete() {
        let d = line();
        assert_eq!(knn_graph(d.view(), 3), complete_graph(4));
        assert_eq!(knn_graph(d.view(), 100), complete_graph(4));
        assert_eq!(mutual_knn_graph(d.view(), 3), complete_graph(4));
    }

    #[test]
    fn single_point_has_no_edges() {
        let d = Array2::zeros((1, 1));
        assert_eq!(knn_graph(d.view(), 3).sum(), 0.0);
        assert_eq!(complete_graph(1).sum(), 0.0);
    }

    #[test]
    fn non_square_rejected() {
        let stage = RefineStage::new(Refinement::Complete);
        assert!(stage.refine(Array2::zeros((2, 3)).view()).is_err());
    }
}
