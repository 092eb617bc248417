// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Shared types for categorical change-point detection: the validated
//! sequence view, the error taxonomy, the per-call execution context and the
//! segmentation result returned by every detector.

pub mod constraints;
pub mod control;
pub mod detectors;
pub mod diagnostics;
pub mod error;
pub mod execution_context;
pub mod observability;
pub mod results;
pub mod sequence;

pub use constraints::Constraints;
pub use control::{BudgetMode, BudgetStatus, CancelToken};
pub use detectors::OfflineDetector;
pub use diagnostics::{DIAGNOSTICS_SCHEMA_VERSION, Diagnostics, PruningStats};
pub use error::CpdError;
pub use execution_context::ExecutionContext;
pub use observability::{ProgressSink, TelemetrySink};
pub use results::{Segment, Segmentation, validate_change_points};
pub use sequence::{CategoricalSequence, MemoryLayout, SequenceData, one_hot};
