//! Local model scoring benchmark: dense windows → predict_proba.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stickleback::data::{synthetic_deployments, SyntheticConfig};
use stickleback::features::windows_dense;
use stickleback::{GaussianNaiveBayes, LocalClassifier, LocalModel, LogisticRegression};

fn training_set(win_size: usize) -> (ndarray::Array3<f64>, Vec<bool>) {
    let config = SyntheticConfig {
        deployments: 1,
        samples: 2_000,
        ..SyntheticConfig::default()
    };
    let (sensors, _) = synthetic_deployments(&config).unwrap();
    let table = windows_dense("sim-00", &sensors["sim-00"], win_size, 10).unwrap();
    // Alternate labels; only throughput matters here.
    let labels = (0..table.len()).map(|k| k % 2 == 0).collect();
    (table.windows().to_owned(), labels)
}

fn bench_predict_by_win_size(c: &mut Criterion) {
    let mut g = c.benchmark_group("logistic_predict_by_win_size");
    for w in [10, 20, 40, 80] {
        let (windows, labels) = training_set(w);
        let model = LogisticRegression::default().fit(windows.view(), &labels).unwrap();
        g.bench_function(format!("win_{}", w).as_str(), |b| {
            b.iter(|| model.predict_proba(black_box(windows.view())).unwrap())
        });
    }
    g.finish();
}

fn bench_naive_bayes(c: &mut Criterion) {
    let (windows, labels) = training_set(20);
    let model = GaussianNaiveBayes::default().fit(windows.view(), &labels).unwrap();
    c.bench_function("naive_bayes_predict_win_20", |b| {
        b.iter(|| model.predict_proba(black_box(windows.view())).unwrap())
    });
}

criterion_group!(benches, bench_predict_by_win_size, bench_naive_bayes);
criterion_main!(benches);
