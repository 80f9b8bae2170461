use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fiedler::affinity::pairwise_distances;
use fiedler::config::Metric;
use fiedler::datasets::make_moons;
use fiedler::graph::{epsilon_graph, laplacian};
use fiedler::spectral::dense_symmetric;
use fiedler::SpectralClustering;

fn decomposition_variants() -> Vec<&'static str> {
    let mut variants = vec!["dense_general", "dense_symmetric"];
    if cfg!(feature = "sparse") {
        variants.extend(["sparse_general", "sparse_symmetric"]);
    }
    variants
}

fn bench_fit_by_decomposition(c: &mut Criterion) {
    let mut group = c.benchmark_group("fit");
    group.sample_size(10);

    for n in [200, 400] {
        let (points, _) = make_moons(n, 0.05, 42).unwrap();
        for variant in decomposition_variants() {
            let model = SpectralClustering::from_options(
                2,
                &[("refinement", "eps"), ("eps", "0.4"), ("decomposition", variant)],
            )
            .unwrap();
            group.bench_with_input(BenchmarkId::new(variant, n), &points, |b, points| {
                b.iter(|| model.fit(black_box(points)).unwrap())
            });
        }
    }

    group.finish();
}

fn bench_graph_stages(c: &mut Criterion) {
    let (points, _) = make_moons(500, 0.05, 42).unwrap();

    c.bench_function("pairwise_distances_n500", |b| {
        b.iter(|| pairwise_distances(black_box(points.view()), Metric::Euclidean))
    });

    let dist = pairwise_distances(points.view(), Metric::Euclidean);
    let lap = laplacian(epsilon_graph(dist.view(), 0.4).view());
    c.bench_function("dense_symmetric_n500", |b| {
        b.iter(|| dense_symmetric(black_box(lap.view())).unwrap())
    });
}

criterion_group!(benches, bench_fit_by_decomposition, bench_graph_stages);
criterion_main!(benches);
