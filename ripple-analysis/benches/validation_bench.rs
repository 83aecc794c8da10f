//! Cross-validation and bootstrap throughput over a fitted chain model.

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use ripple_analysis::graph::GraphExtractor;
use ripple_analysis::mechanism::MechanismFitter;
use ripple_analysis::scm::StructuralCausalModel;
use ripple_analysis::validate::Validator;
use ripple_core::config::{FittingConfig, ValidationConfig};
use ripple_core::types::unit::{CodeUnit, Statement};
use ripple_core::types::TraceTable;

fn fitted_chain(rows: usize) -> (StructuralCausalModel, TraceTable) {
    let unit = CodeUnit::new("chain")
        .with_parameters(&["x"])
        .with_statement(Statement::assign(&["x"], &["y"], None, 1))
        .with_statement(Statement::assign(&["y"], &["z"], None, 2));
    let graph = Arc::new(GraphExtractor::default().extract(&unit, None).unwrap());

    let xs: Vec<f64> = (0..rows).map(|i| (i % 97) as f64 / 9.7).collect();
    let ys: Vec<f64> = xs.iter().map(|x| 2.0 * x + 0.01 * (x * 13.0).sin()).collect();
    let zs: Vec<f64> = ys.iter().map(|y| 3.0 * y + 0.01 * (y * 7.0).cos()).collect();
    let traces = TraceTable::from_columns([("x", xs), ("y", ys), ("z", zs)]);

    let scm = MechanismFitter::new(FittingConfig::default())
        .fit_dynamic(&graph, &traces)
        .unwrap();
    (scm, traces)
}

fn bench_cross_validate(c: &mut Criterion) {
    let (scm, traces) = fitted_chain(1000);
    let validator = Validator::default();

    c.bench_function("cross_validate_1k_rows", |b| {
        b.iter(|| {
            let result = validator.cross_validate(black_box(&scm), black_box(&traces));
            black_box(result).ok();
        })
    });
}

fn bench_bootstrap(c: &mut Criterion) {
    let (scm, traces) = fitted_chain(500);
    let validator = Validator::new(ValidationConfig {
        bootstrap_samples: Some(100),
        ..Default::default()
    });

    c.bench_function("bootstrap_100_resamples", |b| {
        b.iter(|| {
            let intervals =
                validator.bootstrap_confidence_intervals(black_box(&scm), black_box(&traces), 42);
            black_box(intervals);
        })
    });
}

criterion_group!(benches, bench_cross_validate, bench_bootstrap);
criterion_main!(benches);
