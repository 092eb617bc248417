// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Pruned optimal partitioning for categorical sequences.
//!
//! [`segment`] is the one-call entry point; [`CategoricalFpop`] exposes the
//! pruning rule, cancellation cadence and the execution context hooks.

pub mod backtrack;
pub mod candidates;
pub mod fpop;
pub mod pruning;

pub use backtrack::reconstruct_change_points;
pub use candidates::CandidateArena;
pub use catfpop_costs::{SegmentationCost, evaluate_segmentation};
pub use fpop::{CategoricalFpop, FpopConfig};
pub use pruning::PruningRule;

use catfpop_core::{
    CategoricalSequence, Constraints, CpdError, ExecutionContext, MemoryLayout, OfflineDetector,
    Segmentation,
};

fn detect_with_defaults(
    x: &CategoricalSequence<'_>,
    penalty: f64,
) -> Result<Segmentation, CpdError> {
    let detector = CategoricalFpop::new(FpopConfig::new(penalty))?;
    let constraints = Constraints::default();
    detector.detect(x, &ExecutionContext::new(&constraints))
}

/// Segments a label sequence with the default pruning rule.
///
/// Fails with [`CpdError::InvalidInput`] when `num_categories == 0`, a label
/// is outside `[0, num_categories)`, or `penalty` is negative or non-finite.
pub fn segment(
    sequence: &[usize],
    num_categories: usize,
    penalty: f64,
) -> Result<Segmentation, CpdError> {
    let view = CategoricalSequence::from_labels(sequence, num_categories)?;
    detect_with_defaults(&view, penalty)
}

/// Segments an `n x num_categories` count matrix (one-hot rows for single
/// draws).
pub fn segment_counts(
    values: &[u32],
    n: usize,
    num_categories: usize,
    layout: MemoryLayout,
    penalty: f64,
) -> Result<Segmentation, CpdError> {
    let view = CategoricalSequence::from_counts(values, n, num_categories, layout)?;
    detect_with_defaults(&view, penalty)
}
