// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use catfpop_bench::regime_labels;
use catfpop_core::{CategoricalSequence, Constraints, ExecutionContext, OfflineDetector};
use catfpop_offline::{CategoricalFpop, FpopConfig, PruningRule};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn bench_rules(c: &mut Criterion, case_suffix: &str, n: usize, num_categories: usize, penalty: f64, rules: &[PruningRule]) {
    let labels = regime_labels(n, num_categories);
    let view = CategoricalSequence::from_labels(&labels, num_categories)
        .expect("benchmark labels should be valid");
    let constraints = Constraints::default();
    let ctx = ExecutionContext::new(&constraints);

    for &rule in rules {
        let detector = CategoricalFpop::new(FpopConfig::new(penalty).with_pruning(rule))
            .expect("benchmark config should be valid");
        c.bench_function(&format!("catfpop_{}_{case_suffix}", rule.name()), |b| {
            b.iter(|| {
                detector
                    .detect(black_box(&view), black_box(&ctx))
                    .expect("benchmark detect should succeed");
            })
        });
    }
}

fn benchmark_rules_n2e3(c: &mut Criterion) {
    bench_rules(
        c,
        "n2e3_k4",
        2_000,
        4,
        8.0,
        &[PruningRule::None, PruningRule::Pelt, PruningRule::Afp],
    );
}

fn benchmark_pruned_n1e5(c: &mut Criterion) {
    bench_rules(
        c,
        "n1e5_k8",
        100_000,
        8,
        20.0,
        &[PruningRule::Pelt, PruningRule::Afp],
    );
}

criterion_group!(benches, benchmark_rules_n2e3, benchmark_pruned_n1e5);
criterion_main!(benches);
