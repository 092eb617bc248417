// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::CpdError;

/// Resource limits applied to a single detector run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Constraints {
    /// Wall-clock limit for the scan, checked at cancellation poll points.
    pub time_budget_ms: Option<u64>,
    /// Upper bound on segment-cost evaluations across the run.
    pub max_cost_evals: Option<usize>,
}

impl Constraints {
    pub fn validate(&self) -> Result<(), CpdError> {
        if self.time_budget_ms == Some(0) {
            return Err(CpdError::invalid_input(
                "constraints.time_budget_ms must be >= 1 when set; got 0",
            ));
        }
        if self.max_cost_evals == Some(0) {
            return Err(CpdError::invalid_input(
                "constraints.max_cost_evals must be >= 1 when set; got 0",
            ));
        }
        Ok(())
    }
}
