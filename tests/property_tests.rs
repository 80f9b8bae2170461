use fiedler::affinity::pairwise_distances;
use fiedler::cluster::{Clustering, Kmeans};
use fiedler::config::{Metric, Standardisation};
use fiedler::graph::{complete_graph, epsilon_graph, knn_graph, laplacian, mutual_knn_graph};
use fiedler::standardise::standardise;
use fiedler::{PipelineConfig, SpectralClustering};
use ndarray::Array2;
use proptest::prelude::*;

fn points(max_rows: usize) -> impl Strategy<Value = Array2<f64>> {
    (3usize..max_rows, 1usize..4).prop_flat_map(|(n, d)| {
        prop::collection::vec(-10.0f64..10.0, n * d)
            .prop_map(move |flat| Array2::from_shape_vec((n, d), flat).unwrap())
    })
}

proptest! {
    #[test]
    fn prop_symmetric_graphs(data in points(25), eps in 0.1f64..8.0, k in 1usize..6) {
        let dist = pairwise_distances(data.view(), Metric::Euclidean);
        for adj in [epsilon_graph(dist.view(), eps), mutual_knn_graph(dist.view(), k)] {
            prop_assert_eq!(&adj, &adj.t());
            prop_assert!(adj.diag().iter().all(|&v| v == 0.0));
        }
    }

    #[test]
    fn prop_knn_has_k_per_column(data in points(25), k in 1usize..30) {
        let dist = pairwise_distances(data.view(), Metric::Manhattan);
        let n = data.nrows();
        let adj = knn_graph(dist.view(), k);
        for column in adj.columns() {
            prop_assert_eq!(column.sum() as usize, k.min(n - 1));
        }
        if k >= n - 1 {
            prop_assert_eq!(adj, complete_graph(n));
        }
    }

    #[test]
    fn prop_laplacian_rows_sum_to_zero(data in points(25), eps in 0.1f64..8.0) {
        let dist = pairwise_distances(data.view(), Metric::Euclidean);
        let lap = laplacian(epsilon_graph(dist.view(), eps).view());
        for row in lap.rows() {
            prop_assert!(row.sum().abs() < 1e-9);
        }
    }

    #[test]
    fn prop_none_standardisation_is_identity(data in points(20)) {
        let out = standardise(data.clone(), Standardisation::None);
        prop_assert!(out.iter().zip(data.iter()).all(|(a, b)| a.to_bits() == b.to_bits()));
    }

    #[test]
    fn prop_kmeans_all_assigned(data in points(20), k in 1usize..5) {
        if k <= data.nrows() {
            let labels = Kmeans::new(k).with_seed(42).fit_predict(data.view()).unwrap();
            prop_assert_eq!(labels.len(), data.nrows());
            prop_assert!(labels.iter().all(|&l| l < k));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_label_cardinality(data in points(20), num_clusters in 2usize..4) {
        if num_clusters <= data.nrows() {
            let config = PipelineConfig::from_pairs(&[("refinement", "eps"), ("eps", "3.0")]).unwrap();
            let model = SpectralClustering::new(num_clusters, config).unwrap();
            let labels = model.fit(&data).unwrap();
            prop_assert_eq!(labels.len(), data.nrows());
            prop_assert!(labels.iter().all(|&l| l < num_clusters));
        }
    }
}
