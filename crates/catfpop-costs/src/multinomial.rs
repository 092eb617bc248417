// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use catfpop_core::{CategoricalSequence, CpdError};

/// Multinomial (categorical) segment cost.
///
/// For per-category counts `n_k` summing to `m`, the cost is the negative
/// log-likelihood at the maximum-likelihood category probabilities:
///
/// ```text
/// cost = -sum_k n_k * ln(n_k / m) = sum_k n_k * ln(m / n_k)
/// ```
///
/// Every term is non-negative, zero counts contribute nothing, and an empty
/// segment costs 0. Merging two segments never costs less than fitting them
/// separately, which is what makes scalar PELT pruning exact for this cost.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CostMultinomial;

impl CostMultinomial {
    pub const fn new() -> Self {
        Self
    }

    pub fn name(&self) -> &'static str {
        "multinomial"
    }

    /// Cost of a segment with per-category `counts` summing to `mass`.
    pub fn segment_cost(&self, counts: &[u64], mass: u64) -> f64 {
        debug_assert_eq!(
            counts.iter().copied().sum::<u64>(),
            mass,
            "counts must sum to the segment mass"
        );
        if mass == 0 {
            return 0.0;
        }

        let mass_f64 = mass as f64;
        let mut total = 0.0;
        for &count in counts {
            if count == 0 || count == mass {
                continue;
            }
            let count_f64 = count as f64;
            total += count_f64 * (mass_f64 / count_f64).ln();
        }
        total
    }

    /// [`Self::segment_cost`] that reports a non-finite value as an error.
    pub fn checked_segment_cost(&self, counts: &[u64], mass: u64) -> Result<f64, CpdError> {
        let cost = self.segment_cost(counts, mass);
        if !cost.is_finite() {
            return Err(CpdError::numeric_overflow(format!(
                "non-finite multinomial cost for mass={mass}: {cost}"
            )));
        }
        Ok(cost)
    }

    /// Cost of `[start, end)` answered from a prefix-count cache.
    ///
    /// # Panics
    /// Panics unless `start <= end <= cache.n()`.
    pub fn cached_segment_cost(
        &self,
        cache: &CategoricalPrefixCounts,
        start: usize,
        end: usize,
        scratch: &mut [u64],
    ) -> f64 {
        let mass = cache.segment_counts(start, end, scratch);
        self.segment_cost(scratch, mass)
    }
}

/// Prefix-count cache: `prefix[t][k]` is the count of category `k` in `[0, t)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoricalPrefixCounts {
    prefix: Vec<u64>,
    prefix_mass: Vec<u64>,
    n: usize,
    num_categories: usize,
}

fn cache_overflow_err(n: usize, num_categories: usize) -> CpdError {
    CpdError::resource_limit(format!(
        "cache size overflow while planning CategoricalPrefixCounts for n={n}, num_categories={num_categories}"
    ))
}

impl CategoricalPrefixCounts {
    pub fn precompute(x: &CategoricalSequence<'_>) -> Result<Self, CpdError> {
        let k = x.num_categories;
        let rows = x
            .n
            .checked_add(1)
            .ok_or_else(|| cache_overflow_err(x.n, k))?;
        let total_len = rows
            .checked_mul(k)
            .ok_or_else(|| cache_overflow_err(x.n, k))?;

        let mut prefix = Vec::with_capacity(total_len);
        let mut prefix_mass = Vec::with_capacity(rows);
        prefix.extend(std::iter::repeat_n(0u64, k));
        prefix_mass.push(0u64);

        let mut row = vec![0u64; k];
        for t in 0..x.n {
            x.copy_row(t, &mut row);
            let base = t * k;
            let mut mass = prefix_mass[t];
            for (category, &add) in row.iter().enumerate() {
                let next = prefix[base + category].checked_add(add).ok_or_else(|| {
                    CpdError::numeric_overflow(format!(
                        "prefix count overflow at t={t}, category={category}"
                    ))
                })?;
                prefix.push(next);
                mass = mass.checked_add(add).ok_or_else(|| {
                    CpdError::numeric_overflow(format!("prefix mass overflow at t={t}"))
                })?;
            }
            prefix_mass.push(mass);
        }

        Ok(Self {
            prefix,
            prefix_mass,
            n: x.n,
            num_categories: k,
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn num_categories(&self) -> usize {
        self.num_categories
    }

    /// Fills `out` with the counts of `[start, end)` and returns their mass.
    ///
    /// # Panics
    /// Panics unless `start <= end <= n` and `out.len() == num_categories`.
    pub fn segment_counts(&self, start: usize, end: usize, out: &mut [u64]) -> u64 {
        assert!(
            start <= end && end <= self.n,
            "segment_counts requires start <= end <= n; got start={start}, end={end}, n={}",
            self.n
        );
        assert_eq!(out.len(), self.num_categories, "scratch length mismatch");

        let k = self.num_categories;
        let lo = &self.prefix[start * k..(start + 1) * k];
        let hi = &self.prefix[end * k..(end + 1) * k];
        for ((dst, &a), &b) in out.iter_mut().zip(lo).zip(hi) {
            *dst = b - a;
        }
        self.prefix_mass[end] - self.prefix_mass[start]
    }
}
