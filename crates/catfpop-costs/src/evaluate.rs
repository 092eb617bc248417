// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::multinomial::{CategoricalPrefixCounts, CostMultinomial};
use catfpop_core::{CategoricalSequence, CpdError, Segment, validate_change_points};

/// Penalised cost of a change-point set, recomputed from scratch.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentationCost {
    pub segments: Vec<Segment>,
    /// Sum of segment costs plus `penalty * change_points.len()`.
    pub total_cost: f64,
}

/// Rejects negative, NaN, and infinite penalties.
pub fn validate_penalty(penalty: f64) -> Result<(), CpdError> {
    if !penalty.is_finite() || penalty < 0.0 {
        return Err(CpdError::invalid_input(format!(
            "penalty must be finite and >= 0.0; got {penalty}"
        )));
    }
    Ok(())
}

/// Scores an arbitrary change-point set under the multinomial cost.
///
/// This is the reference the detectors are checked against: every segment is
/// costed independently from prefix counts, with no shared DP state.
pub fn evaluate_segmentation(
    x: &CategoricalSequence<'_>,
    change_points: &[usize],
    penalty: f64,
) -> Result<SegmentationCost, CpdError> {
    validate_penalty(penalty)?;
    if x.is_empty() {
        if !change_points.is_empty() {
            return Err(CpdError::invalid_input(
                "an empty sequence cannot have change points",
            ));
        }
        return Ok(SegmentationCost {
            segments: vec![],
            total_cost: 0.0,
        });
    }
    validate_change_points(x.n, change_points)?;

    let model = CostMultinomial::new();
    let cache = CategoricalPrefixCounts::precompute(x)?;
    let mut scratch = vec![0u64; x.num_categories];

    let mut segments = Vec::with_capacity(change_points.len() + 1);
    let mut total_cost = penalty * change_points.len() as f64;
    let mut start = 0usize;
    for &end in change_points.iter().chain(std::iter::once(&x.n)) {
        let mass = cache.segment_counts(start, end, &mut scratch);
        let cost = model.checked_segment_cost(&scratch, mass)?;
        total_cost += cost;
        segments.push(Segment { start, end, cost });
        start = end;
    }

    if !total_cost.is_finite() {
        return Err(CpdError::numeric_overflow(format!(
            "non-finite penalised cost: {total_cost}"
        )));
    }

    Ok(SegmentationCost {
        segments,
        total_cost,
    })
}
