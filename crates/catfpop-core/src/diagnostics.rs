// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::borrow::Cow;

/// Diagnostics schema version for segmentation run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Counters that summarize how much work pruning saved during a run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PruningStats {
    /// Candidate scorings performed (one segment-cost evaluation each).
    pub candidates_considered: usize,
    /// Candidates removed by the `F(c) + cost > F(t)` rule.
    pub pruned_pelt: usize,
    /// Candidates removed by the Lagrangian bound.
    pub pruned_afp: usize,
    /// Largest number of simultaneously active candidates.
    pub peak_active: usize,
}

impl PruningStats {
    pub fn candidates_pruned(&self) -> usize {
        self.pruned_pelt + self.pruned_afp
    }
}

/// Structured diagnostics captured from a detector run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostics {
    pub n: usize,
    pub num_categories: usize,
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub runtime_ms: Option<u64>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub algorithm: Cow<'static, str>,
    pub cost_model: Cow<'static, str>,
    pub pruning_rule: Cow<'static, str>,
    pub penalty: f64,
    #[cfg(feature = "serde")]
    pub params_json: Option<serde_json::Value>,
    pub pruning_stats: Option<PruningStats>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            n: 0,
            num_categories: 0,
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            runtime_ms: None,
            notes: vec![],
            warnings: vec![],
            algorithm: Cow::Borrowed(""),
            cost_model: Cow::Borrowed(""),
            pruning_rule: Cow::Borrowed(""),
            penalty: 0.0,
            #[cfg(feature = "serde")]
            params_json: None,
            pruning_stats: None,
        }
    }
}
