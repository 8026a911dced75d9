use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kinfit::prelude::*;
use std::collections::HashMap;

fn metabolite_model() -> DegradationModel {
    ModelSpec::new()
        .add("parent", CompartmentSpec::new(SubmodelType::Sfo).to("m1"))
        .add("m1", CompartmentSpec::new(SubmodelType::Sfo))
        .compile(UseOfFractions::Min)
        .unwrap()
}

fn trajectory_benchmarks(c: &mut Criterion) {
    let model = metabolite_model();
    let parms = [0.3, 0.2, 0.1];
    let initial = HashMap::from([("parent".to_string(), 100.0)]);
    let times: Vec<f64> = (0..120).map(|i| i as f64).collect();

    c.bench_function("numerical_trajectory", |b| {
        b.iter(|| {
            predict(
                black_box(&model),
                black_box(&parms),
                &initial,
                &times,
                Strategy::Numerical,
                Tolerances::default(),
                Output::Observed,
            )
            .unwrap()
        })
    });

    c.bench_function("eigen_trajectory", |b| {
        b.iter(|| {
            predict(
                black_box(&model),
                black_box(&parms),
                &initial,
                &times,
                Strategy::Eigen,
                Tolerances::default(),
                Output::Observed,
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, trajectory_benchmarks);
criterion_main!(benches);
