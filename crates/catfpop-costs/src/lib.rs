// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

pub mod counts;
pub mod evaluate;
pub mod multinomial;

pub use counts::CategoryCounts;
pub use evaluate::{SegmentationCost, evaluate_segmentation, validate_penalty};
pub use multinomial::{CategoricalPrefixCounts, CostMultinomial};
