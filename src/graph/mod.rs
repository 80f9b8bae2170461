//! Similarity graph construction.
//!
//! Two stages live here:
//!
//! - **Refinement** sparsifies the dense distance matrix into an adjacency
//!   matrix (epsilon-neighbourhood, k-NN, mutual k-NN, or complete).
//! - **Laplacian** turns the adjacency into `L = D - A` or its symmetric
//!   normalisation.
//!
//! # Choosing a graph
//!
//! | Variant | Symmetric | Notes |
//! |---------|-----------|-------|
//! | `eps` | yes | Scale-dependent; small `eps` disconnects the graph |
//! | `knn` | no | Every point has exactly `k` outgoing choices |
//! | `mutual_knn` | yes | Sparser than `knn`; can isolate outliers |
//! | `complete` | yes | Baseline; spectrum carries no cluster structure |
//!
//! # References
//!
//! - von Luxburg (2007). "A Tutorial on Spectral Clustering", §2.2

mod laplacian;
mod refine;

pub use laplacian::{degrees, laplacian, normalised_laplacian, LaplacianStage};
pub use refine::{complete_graph, epsilon_graph, knn_graph, mutual_knn_graph, RefineStage};
