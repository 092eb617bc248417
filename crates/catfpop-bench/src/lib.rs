// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Deterministic inputs shared by the benchmarks.

/// Four regimes over `num_categories` labels, each dominated by one category
/// with a fixed pseudo-random sprinkle of the others.
pub fn regime_labels(n: usize, num_categories: usize) -> Vec<usize> {
    let regime = (n / 4).max(1);
    let mut state = 0x9E37_79B9_7F4A_7C15_u64;
    (0..n)
        .map(|t| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let dominant = (t / regime) % num_categories;
            if (state >> 33) % 5 == 0 {
                ((state >> 40) as usize) % num_categories
            } else {
                dominant
            }
        })
        .collect()
}
