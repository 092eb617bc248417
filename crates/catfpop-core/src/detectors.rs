// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::{CategoricalSequence, CpdError, ExecutionContext, Segmentation};

/// Offline detector contract: whole sequence in, segmentation out.
pub trait OfflineDetector {
    fn detect(
        &self,
        x: &CategoricalSequence<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Segmentation, CpdError>;
}
