// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Candidate pruning tests.
//!
//! Both rules only discard a candidate that is strictly worse than some other
//! candidate for every possible continuation of the sequence, so the optimal
//! objective and the smallest-start tie-breaking are unchanged.

/// Share of the admissible multiplier range used by the Lagrangian bound.
const AFP_LAMBDA_FRACTION: f64 = 0.75;

/// Which pruning tests run after every observation.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PruningRule {
    /// Keep every candidate (plain optimal partitioning).
    None,
    /// Scalar inequality pruning.
    Pelt,
    /// Scalar pruning followed by the Lagrangian functional bound.
    #[default]
    Afp,
}

impl PruningRule {
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pelt => "pelt",
            Self::Afp => "afp",
        }
    }

    pub(crate) fn uses_pelt(self) -> bool {
        !matches!(self, Self::None)
    }

    pub(crate) fn uses_afp(self) -> bool {
        matches!(self, Self::Afp)
    }
}

/// Scalar rule: `F(c) + cost(c, e) > F(e)`.
///
/// The multinomial cost never decreases when two segments are merged, so a
/// candidate that already loses without the penalty loses for every longer
/// segment too. Equality must not prune.
pub(crate) fn pelt_prunes(base_cost: f64, segment_cost: f64, best_cost: f64) -> bool {
    base_cost + segment_cost > best_cost
}

/// Lagrangian lower bound on candidate `c`'s cost function over the
/// parameter region where it beats the preceding candidate `c'`.
///
/// `x` holds the counts of `[c, e)` and `y` the counts of `[c', c)`. Returns
/// `None` when no finite bound exists for the chosen multiplier.
pub(crate) fn afp_lower_bound(
    x: &[u64],
    y: &[u64],
    base_cost: f64,
    previous_base_cost: f64,
    penalty: f64,
) -> Option<f64> {
    debug_assert_eq!(x.len(), y.len());

    let mut lambda_max = f64::INFINITY;
    for (&xk, &yk) in x.iter().zip(y) {
        if yk == 0 {
            continue;
        }
        if xk == 0 {
            return None;
        }
        lambda_max = lambda_max.min(xk as f64 / yk as f64);
    }
    if !lambda_max.is_finite() {
        return None;
    }

    let lambda = AFP_LAMBDA_FRACTION * lambda_max;
    let mass: f64 = x
        .iter()
        .zip(y)
        .map(|(&xk, &yk)| xk as f64 - lambda * yk as f64)
        .sum();
    if mass <= 0.0 || !mass.is_finite() {
        return None;
    }

    let mut x_dot_log_p = 0.0;
    let mut y_dot_log_p = 0.0;
    for (&xk, &yk) in x.iter().zip(y) {
        if xk == 0 {
            continue;
        }
        let log_p = ((xk as f64 - lambda * yk as f64) / mass).ln();
        x_dot_log_p += xk as f64 * log_p;
        if yk > 0 {
            y_dot_log_p += yk as f64 * log_p;
        }
    }

    let bound = base_cost + penalty - x_dot_log_p
        + lambda * (base_cost - previous_base_cost + y_dot_log_p);
    bound.is_finite().then_some(bound)
}

/// Functional rule: prune when the bound exceeds the new candidate's cost
/// `F(e) + penalty`.
pub(crate) fn afp_prunes(lower_bound: f64, best_cost: f64, penalty: f64) -> bool {
    lower_bound > best_cost + penalty
}
