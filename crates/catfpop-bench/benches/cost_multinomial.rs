// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use catfpop_bench::regime_labels;
use catfpop_core::CategoricalSequence;
use catfpop_costs::{CategoricalPrefixCounts, CostMultinomial};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn benchmark_cached_segment_cost(c: &mut Criterion) {
    let n = 100_000;
    let num_categories = 16;
    let labels = regime_labels(n, num_categories);
    let view = CategoricalSequence::from_labels(&labels, num_categories)
        .expect("benchmark labels should be valid");
    let cache = CategoricalPrefixCounts::precompute(&view).expect("precompute should succeed");
    let model = CostMultinomial::new();
    let mut scratch = vec![0u64; num_categories];

    c.bench_function("multinomial_cached_segment_cost_k16", |b| {
        b.iter(|| {
            let mut total = 0.0;
            for start in (0..n).step_by(997) {
                total += model.cached_segment_cost(&cache, start, n, &mut scratch);
            }
            black_box(total)
        })
    });
}

fn benchmark_precompute(c: &mut Criterion) {
    let labels = regime_labels(100_000, 8);
    let view = CategoricalSequence::from_labels(&labels, 8).expect("benchmark labels should be valid");
    c.bench_function("multinomial_prefix_precompute_n1e5_k8", |b| {
        b.iter(|| CategoricalPrefixCounts::precompute(black_box(&view)).expect("precompute"))
    });
}

criterion_group!(benches, benchmark_cached_segment_cost, benchmark_precompute);
criterion_main!(benches);
