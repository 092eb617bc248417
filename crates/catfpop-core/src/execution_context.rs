// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::CpdError;
use crate::constraints::Constraints;
use crate::control::{BudgetMode, BudgetStatus, CancelToken};
use crate::observability::{ProgressSink, TelemetrySink};
use std::time::Instant;

/// Per-call hooks and limits passed to a detector run.
///
/// A context only borrows its hooks, so one detector can be driven from many
/// threads with a context per call.
pub struct ExecutionContext<'a> {
    pub constraints: &'a Constraints,
    pub cancel: Option<&'a CancelToken>,
    pub budget_mode: BudgetMode,
    pub progress: Option<&'a dyn ProgressSink>,
    pub telemetry: Option<&'a dyn TelemetrySink>,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(constraints: &'a Constraints) -> Self {
        Self {
            constraints,
            cancel: None,
            budget_mode: BudgetMode::HardFail,
            progress: None,
            telemetry: None,
        }
    }

    pub fn with_cancel(mut self, cancel: &'a CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn with_budget_mode(mut self, budget_mode: BudgetMode) -> Self {
        self.budget_mode = budget_mode;
        self
    }

    pub fn with_progress_sink(mut self, progress: &'a dyn ProgressSink) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_telemetry_sink(mut self, telemetry: &'a dyn TelemetrySink) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(CancelToken::is_cancelled)
    }

    pub fn check_cancelled(&self) -> Result<(), CpdError> {
        if self.is_cancelled() {
            return Err(CpdError::cancelled());
        }
        Ok(())
    }

    /// Polls cancellation and the time budget when `step` lands on the
    /// `every` cadence. `every == 0` polls on every step.
    pub fn poll_step(
        &self,
        step: usize,
        every: usize,
        started_at: Instant,
    ) -> Result<BudgetStatus, CpdError> {
        if step % every.max(1) != 0 {
            return Ok(BudgetStatus::WithinBudget);
        }
        self.check_cancelled()?;
        self.check_time_budget(started_at)
    }

    pub fn check_cost_eval_budget(&self, cost_evals: usize) -> Result<BudgetStatus, CpdError> {
        match self.constraints.max_cost_evals {
            Some(limit) if cost_evals > limit => self.exceeded(format!(
                "constraints.max_cost_evals exceeded: used={cost_evals}, limit={limit}"
            )),
            _ => Ok(BudgetStatus::WithinBudget),
        }
    }

    pub fn check_time_budget(&self, started_at: Instant) -> Result<BudgetStatus, CpdError> {
        let Some(limit_ms) = self.constraints.time_budget_ms else {
            return Ok(BudgetStatus::WithinBudget);
        };

        let elapsed_ms = started_at.elapsed().as_millis();
        if elapsed_ms <= u128::from(limit_ms) {
            return Ok(BudgetStatus::WithinBudget);
        }
        self.exceeded(format!(
            "constraints.time_budget_ms exceeded: elapsed_ms={elapsed_ms}, limit_ms={limit_ms}"
        ))
    }

    fn exceeded(&self, detail: String) -> Result<BudgetStatus, CpdError> {
        match self.budget_mode {
            BudgetMode::HardFail => Err(CpdError::resource_limit(format!(
                "{detail}, budget_mode=HardFail"
            ))),
            BudgetMode::SoftDegrade => Ok(BudgetStatus::ExceededSoftDegrade),
        }
    }

    /// Forwards a progress fraction, clamped to `[0, 1]`; non-finite values are dropped.
    pub fn report_progress(&self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }
        if let Some(sink) = self.progress {
            sink.on_progress(fraction.clamp(0.0, 1.0));
        }
    }

    pub fn record_scalar(&self, key: &'static str, value: f64) {
        if let Some(sink) = self.telemetry {
            sink.record_scalar(key, value);
        }
    }
}
