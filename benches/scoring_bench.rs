//! Benchmarks for request parsing, scoring and ranking.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use crop_predict::inference::classifier::{Classifier, LogisticRegression, MultiClass};
use crop_predict::inference::ranking::{predict_top_k, top_k};
use crop_predict::server::request::parse_features;

fn bench_model(n_classes: usize) -> LogisticRegression {
    LogisticRegression {
        multi_class: MultiClass::Multinomial,
        classes: (0..n_classes).map(|i| format!("crop-{i}")).collect(),
        feature_names: None,
        coef: (0..n_classes)
            .map(|c| (0..7).map(|f| ((c * 7 + f) % 11) as f64 * 0.01 - 0.05).collect())
            .collect(),
        intercept: (0..n_classes).map(|c| c as f64 * 0.1 - 1.0).collect(),
    }
}

fn bench_predict_proba(c: &mut Criterion) {
    let model = bench_model(22);
    let x = [104.0, 18.0, 30.0, 23.603016, 60.3, 6.7, 140.91];

    c.bench_function("predict_proba_22_classes", |b| {
        b.iter(|| black_box(model.predict_proba(black_box(&x)).unwrap()))
    });

    c.bench_function("predict_top3_22_classes", |b| {
        b.iter(|| black_box(predict_top_k(&model, black_box(&x), 3).unwrap()))
    });
}

fn bench_ranking(c: &mut Criterion) {
    let classes: Vec<String> = (0..1000).map(|i| format!("class-{i}")).collect();
    let proba: Vec<f64> = (0..1000).map(|i| ((i * 7919) % 1000) as f64 / 500_000.0).collect();

    c.bench_function("top3_of_1000", |b| {
        b.iter(|| black_box(top_k(&classes, black_box(&proba), 3)))
    });
}

fn bench_parse(c: &mut Criterion) {
    let body = br#"{"data": [104, 18, 30, 23.603016, 60.3, 6.7, 140.91]}"#;

    c.bench_function("parse_features", |b| {
        b.iter(|| black_box(parse_features(black_box(body), 7).unwrap()))
    });
}

criterion_group!(benches, bench_predict_proba, bench_ranking, bench_parse);
criterion_main!(benches);
