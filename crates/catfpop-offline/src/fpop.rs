// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::backtrack::{NO_PREDECESSOR, reconstruct_change_points};
use crate::candidates::CandidateArena;
use crate::pruning::{PruningRule, afp_lower_bound, afp_prunes, pelt_prunes};
use catfpop_core::{
    BudgetStatus, CategoricalSequence, CpdError, Diagnostics, ExecutionContext, OfflineDetector,
    PruningStats, Segment, Segmentation,
};
use catfpop_costs::{CostMultinomial, validate_penalty};
use std::borrow::Cow;
use std::time::Instant;

const DEFAULT_CANCEL_CHECK_EVERY: usize = 1000;

/// Configuration for [`CategoricalFpop`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct FpopConfig {
    /// Cost added per change point; finite and `>= 0`.
    pub penalty: f64,
    pub pruning: PruningRule,
    /// Observations between cancellation and time-budget polls. `0` polls
    /// every observation.
    pub cancel_check_every: usize,
}

impl FpopConfig {
    pub fn new(penalty: f64) -> Self {
        Self {
            penalty,
            pruning: PruningRule::default(),
            cancel_check_every: DEFAULT_CANCEL_CHECK_EVERY,
        }
    }

    pub fn with_pruning(mut self, pruning: PruningRule) -> Self {
        self.pruning = pruning;
        self
    }

    fn validate(&self) -> Result<(), CpdError> {
        validate_penalty(self.penalty)
    }

    fn normalized_cancel_check_every(&self) -> usize {
        self.cancel_check_every.max(1)
    }
}

/// Pruned optimal partitioning detector for categorical sequences under the
/// multinomial cost.
#[derive(Debug)]
pub struct CategoricalFpop {
    cost_model: CostMultinomial,
    config: FpopConfig,
}

impl CategoricalFpop {
    pub fn new(config: FpopConfig) -> Result<Self, CpdError> {
        config.validate()?;
        Ok(Self {
            cost_model: CostMultinomial::new(),
            config,
        })
    }

    pub fn config(&self) -> &FpopConfig {
        &self.config
    }
}

#[derive(Default, Clone, Debug)]
struct RuntimeStats {
    cost_evals: usize,
    pruning: PruningStats,
    soft_budget_exceeded: bool,
}

#[derive(Clone, Debug)]
struct KernelResult {
    objective: f64,
    predecessors: Vec<usize>,
    /// Cost of `[predecessors[e], e)` for every endpoint `e`.
    last_segment_cost: Vec<f64>,
}

fn checked_counter_add(counter: &mut usize, amount: usize, name: &str) -> Result<(), CpdError> {
    *counter = counter
        .checked_add(amount)
        .ok_or_else(|| CpdError::resource_limit(format!("{name} counter overflow")))?;
    Ok(())
}

fn note_budget(status: BudgetStatus, runtime: &mut RuntimeStats) {
    if status == BudgetStatus::ExceededSoftDegrade && !runtime.soft_budget_exceeded {
        runtime.soft_budget_exceeded = true;
        #[cfg(feature = "tracing")]
        tracing::warn!("budget exceeded under SoftDegrade; continuing");
    }
}

fn row_mass(row: &[u64], t: usize) -> Result<u64, CpdError> {
    row.iter().try_fold(0u64, |acc, &count| {
        acc.checked_add(count)
            .ok_or_else(|| CpdError::numeric_overflow(format!("row mass overflow at t={t}")))
    })
}

fn run_categorical_fpop(
    model: &CostMultinomial,
    x: &CategoricalSequence<'_>,
    penalty: f64,
    rule: PruningRule,
    cancel_check_every: usize,
    ctx: &ExecutionContext<'_>,
    started_at: Instant,
    runtime: &mut RuntimeStats,
) -> Result<KernelResult, CpdError> {
    let n = x.n;
    let k = x.num_categories;

    let mut f = vec![f64::INFINITY; n + 1];
    let mut predecessors = vec![NO_PREDECESSOR; n + 1];
    let mut last_segment_cost = vec![0.0; n + 1];
    f[0] = -penalty;
    predecessors[0] = 0;

    let mut arena = CandidateArena::new(k);
    arena.insert(0, f[0]);

    let mut row = vec![0u64; k];
    let mut comparator_counts = vec![0u64; k];
    let mut segment_costs: Vec<f64> = Vec::new();
    let mut doomed: Vec<usize> = Vec::new();

    for t in 0..n {
        let status = ctx.poll_step(t, cancel_check_every, started_at)?;
        note_budget(status, runtime);

        match x.label(t) {
            Some(category) => arena.observe_label(category),
            None => {
                x.copy_row(t, &mut row);
                let mass = row_mass(&row, t)?;
                arena.observe_row(&row, mass)?;
            }
        }

        let end = t + 1;
        let active = arena.len();
        runtime.pruning.peak_active = runtime.pruning.peak_active.max(active);

        segment_costs.clear();
        let mut best_cost = f64::INFINITY;
        let mut best_slot = NO_PREDECESSOR;
        let mut best_segment_cost = 0.0;
        for &slot in arena.order() {
            let segment_cost = model.segment_cost(arena.counts(slot), arena.mass(slot));
            let candidate = arena.base_cost(slot) + penalty + segment_cost;
            if !candidate.is_finite() {
                return Err(CpdError::numeric_overflow(format!(
                    "non-finite objective at t={end}, tau={}: F(tau)={}, segment_cost={segment_cost}",
                    arena.start(slot),
                    arena.base_cost(slot)
                )));
            }
            segment_costs.push(segment_cost);

            // Order is ascending by start, so strict `<` keeps the smallest
            // start on ties.
            if candidate < best_cost {
                best_cost = candidate;
                best_slot = slot;
                best_segment_cost = segment_cost;
            }
        }

        checked_counter_add(&mut runtime.cost_evals, active, "cost_evals")?;
        checked_counter_add(
            &mut runtime.pruning.candidates_considered,
            active,
            "candidates_considered",
        )?;
        let status = ctx.check_cost_eval_budget(runtime.cost_evals)?;
        note_budget(status, runtime);

        if best_slot == NO_PREDECESSOR {
            return Err(CpdError::invalid_input(format!(
                "no active candidate at t={end}"
            )));
        }
        f[end] = best_cost;
        predecessors[end] = arena.start(best_slot);
        last_segment_cost[end] = best_segment_cost;

        if rule.uses_pelt() {
            let mut previous: Option<usize> = None;
            for (&slot, &segment_cost) in arena.order().iter().zip(&segment_costs) {
                let base_cost = arena.base_cost(slot);
                if pelt_prunes(base_cost, segment_cost, best_cost) {
                    doomed.push(slot);
                    runtime.pruning.pruned_pelt += 1;
                } else if rule.uses_afp()
                    && let Some(prev) = previous
                {
                    let x_counts = arena.counts(slot);
                    for ((dst, &outer), &inner) in comparator_counts
                        .iter_mut()
                        .zip(arena.counts(prev))
                        .zip(x_counts)
                    {
                        *dst = outer - inner;
                    }
                    if let Some(bound) = afp_lower_bound(
                        x_counts,
                        &comparator_counts,
                        base_cost,
                        arena.base_cost(prev),
                        penalty,
                    ) && afp_prunes(bound, best_cost, penalty)
                    {
                        doomed.push(slot);
                        runtime.pruning.pruned_afp += 1;
                    }
                }
                previous = Some(slot);
            }
            for slot in doomed.drain(..) {
                arena.prune(slot);
            }
            arena.compact();
        }

        if end < n {
            arena.insert(end, best_cost);
        }

        if end % cancel_check_every == 0 {
            ctx.report_progress(end as f32 / n as f32);
        }
    }

    let objective = f[n];
    if !objective.is_finite() {
        return Err(CpdError::numeric_overflow(format!(
            "non-finite final objective: {objective}"
        )));
    }

    Ok(KernelResult {
        objective,
        predecessors,
        last_segment_cost,
    })
}

fn build_segments(n: usize, change_points: &[usize], kernel: &KernelResult) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(change_points.len() + 1);
    let mut start = 0usize;
    for &end in change_points.iter().chain(std::iter::once(&n)) {
        segments.push(Segment {
            start,
            end,
            cost: kernel.last_segment_cost[end],
        });
        start = end;
    }
    segments
}

impl OfflineDetector for CategoricalFpop {
    fn detect(
        &self,
        x: &CategoricalSequence<'_>,
        ctx: &ExecutionContext<'_>,
    ) -> Result<Segmentation, CpdError> {
        self.config.validate()?;
        ctx.constraints.validate()?;

        let penalty = self.config.penalty;
        let rule = self.config.pruning;

        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!(
            "catfpop_detect",
            n = x.n,
            num_categories = x.num_categories,
            pruning = rule.name()
        )
        .entered();

        let mut diagnostics = Diagnostics {
            n: x.n,
            num_categories: x.num_categories,
            algorithm: Cow::Borrowed("catfpop"),
            cost_model: Cow::Borrowed(self.cost_model.name()),
            pruning_rule: Cow::Borrowed(rule.name()),
            penalty,
            ..Diagnostics::default()
        };
        #[cfg(feature = "serde")]
        {
            diagnostics.params_json = Some(serde_json::to_value(&self.config).map_err(|err| {
                CpdError::invalid_input(format!("failed to serialize catfpop config: {err}"))
            })?);
        }

        if x.is_empty() {
            ctx.check_cancelled()?;
            diagnostics.runtime_ms = Some(0);
            diagnostics.pruning_stats = Some(PruningStats::default());
            diagnostics.notes.push("empty sequence".to_string());
            ctx.report_progress(1.0);
            return Ok(Segmentation::empty(diagnostics));
        }

        let started_at = Instant::now();
        let mut runtime = RuntimeStats::default();
        let kernel = run_categorical_fpop(
            &self.cost_model,
            x,
            penalty,
            rule,
            self.config.normalized_cancel_check_every(),
            ctx,
            started_at,
            &mut runtime,
        )?;

        let change_points = reconstruct_change_points(x.n, &kernel.predecessors)?;
        let segments = build_segments(x.n, &change_points, &kernel);

        let runtime_ms = u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX);
        let stats = runtime.pruning.clone();

        ctx.record_scalar("offline.catfpop.cost_evals", runtime.cost_evals as f64);
        ctx.record_scalar(
            "offline.catfpop.candidates_considered",
            stats.candidates_considered as f64,
        );
        ctx.record_scalar(
            "offline.catfpop.candidates_pruned",
            stats.candidates_pruned() as f64,
        );
        ctx.record_scalar("offline.catfpop.pruned_pelt", stats.pruned_pelt as f64);
        ctx.record_scalar("offline.catfpop.pruned_afp", stats.pruned_afp as f64);
        ctx.record_scalar("offline.catfpop.peak_active", stats.peak_active as f64);
        ctx.record_scalar("offline.catfpop.runtime_ms", runtime_ms as f64);
        ctx.report_progress(1.0);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            objective = kernel.objective,
            change_count = change_points.len(),
            candidates_considered = stats.candidates_considered,
            pruned_pelt = stats.pruned_pelt,
            pruned_afp = stats.pruned_afp,
            peak_active = stats.peak_active,
            "catfpop run finished"
        );

        if runtime.soft_budget_exceeded {
            diagnostics.warnings.push(
                "budget exceeded under SoftDegrade mode; run continued to completion".to_string(),
            );
        }
        diagnostics.notes.push(format!(
            "final_objective={}, change_count={}",
            kernel.objective,
            change_points.len()
        ));
        diagnostics
            .notes
            .push(format!("run_cost_evals={}", runtime.cost_evals));
        diagnostics.runtime_ms = Some(runtime_ms);
        diagnostics.pruning_stats = Some(stats);

        Segmentation::new(
            x.n,
            change_points,
            segments,
            kernel.objective,
            kernel.predecessors,
            diagnostics,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::{CategoricalFpop, FpopConfig};
    use crate::PruningRule;
    use catfpop_core::{
        BudgetMode, CancelToken, CategoricalSequence, Constraints, CpdError, ExecutionContext,
        MemoryLayout, OfflineDetector, ProgressSink, TelemetrySink, one_hot,
    };
    use catfpop_costs::evaluate_segmentation;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProgress {
        values: Mutex<Vec<f32>>,
    }

    impl ProgressSink for RecordingProgress {
        fn on_progress(&self, fraction: f32) {
            self.values
                .lock()
                .expect("progress lock should not be poisoned")
                .push(fraction);
        }
    }

    #[derive(Default)]
    struct RecordingTelemetry {
        values: Mutex<Vec<(&'static str, f64)>>,
    }

    impl TelemetrySink for RecordingTelemetry {
        fn record_scalar(&self, key: &'static str, value: f64) {
            self.values
                .lock()
                .expect("telemetry lock should not be poisoned")
                .push((key, value));
        }
    }

    fn detect_labels(labels: &[usize], k: usize, config: FpopConfig) -> catfpop_core::Segmentation {
        let view = CategoricalSequence::from_labels(labels, k).expect("valid labels");
        let detector = CategoricalFpop::new(config).expect("valid config");
        let constraints = Constraints::default();
        detector
            .detect(&view, &ExecutionContext::new(&constraints))
            .expect("detect should succeed")
    }

    fn three_block_labels() -> Vec<usize> {
        let mut labels = vec![0usize; 40];
        labels.extend(std::iter::repeat_n(1usize, 40));
        labels.extend((0..40).map(|i| if i % 3 == 0 { 2 } else { 0 }));
        labels
    }

    #[test]
    fn config_defaults_and_validation() {
        let config = FpopConfig::new(2.5);
        assert_eq!(config.pruning, PruningRule::Afp);
        assert_eq!(config.cancel_check_every, 1000);

        let detector = CategoricalFpop::new(config.clone()).expect("valid config");
        assert_eq!(detector.config(), &config);

        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = CategoricalFpop::new(FpopConfig::new(bad)).expect_err("bad penalty");
            assert!(matches!(err, CpdError::InvalidInput(_)), "{bad}");
            assert!(err.to_string().contains("penalty"));
        }
    }

    #[test]
    fn two_pure_blocks_split_in_the_middle() {
        let result = detect_labels(&[0, 0, 0, 1, 1, 1], 2, FpopConfig::new(1.0));
        assert_eq!(result.change_points, vec![3]);
        assert_eq!(result.breakpoints, vec![3, 6]);
        assert!((result.total_cost - 1.0).abs() < 1e-12);
        assert_eq!(result.segments[0].cost, 0.0);
        assert_eq!(result.path(), vec![-1, 0, 0, 0, 3, 3, 3]);
    }

    #[test]
    fn alternating_labels_with_large_penalty_stay_whole() {
        let result = detect_labels(&[0, 1, 0, 1, 0, 1], 2, FpopConfig::new(100.0));
        assert!(result.change_points.is_empty());
        assert!((result.total_cost - 6.0 * 2.0_f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn empty_sequence_returns_zero_cost() {
        let result = detect_labels(&[], 3, FpopConfig::new(1.0));
        assert!(result.change_points.is_empty());
        assert!(result.segments.is_empty());
        assert_eq!(result.total_cost, 0.0);
        assert_eq!(result.path(), vec![-1]);
    }

    #[test]
    fn single_observation_and_homogeneous_input_have_no_change_points() {
        let single = detect_labels(&[1], 2, FpopConfig::new(0.0));
        assert!(single.change_points.is_empty());
        assert_eq!(single.total_cost, 0.0);

        for rule in [PruningRule::None, PruningRule::Pelt, PruningRule::Afp] {
            let result = detect_labels(&[2; 25], 3, FpopConfig::new(0.0).with_pruning(rule));
            assert!(result.change_points.is_empty(), "{rule:?}");
            assert_eq!(result.total_cost, 0.0);
        }
    }

    #[test]
    fn result_cost_matches_from_scratch_evaluation() {
        let labels = three_block_labels();
        let result = detect_labels(&labels, 3, FpopConfig::new(3.0));
        assert_eq!(result.change_points, vec![40, 80]);

        let view = CategoricalSequence::from_labels(&labels, 3).expect("valid");
        let evaluated =
            evaluate_segmentation(&view, &result.change_points, 3.0).expect("valid set");
        assert!((evaluated.total_cost - result.total_cost).abs() < 1e-9);
        for (fitted, scratch) in result.segments.iter().zip(&evaluated.segments) {
            assert!((fitted.cost - scratch.cost).abs() < 1e-9);
        }
    }

    #[test]
    fn pruning_rules_agree_and_reduce_work() {
        let labels = three_block_labels();
        let n = labels.len();
        let none = detect_labels(&labels, 3, FpopConfig::new(3.0).with_pruning(PruningRule::None));
        let pelt = detect_labels(&labels, 3, FpopConfig::new(3.0).with_pruning(PruningRule::Pelt));
        let afp = detect_labels(&labels, 3, FpopConfig::new(3.0).with_pruning(PruningRule::Afp));

        assert_eq!(none.change_points, pelt.change_points);
        assert_eq!(none.change_points, afp.change_points);
        assert_eq!(none.total_cost, pelt.total_cost);
        assert_eq!(none.total_cost, afp.total_cost);

        let none_stats = none.diagnostics.pruning_stats.expect("stats");
        let pelt_stats = pelt.diagnostics.pruning_stats.expect("stats");
        let afp_stats = afp.diagnostics.pruning_stats.expect("stats");
        assert_eq!(none_stats.candidates_considered, n * (n + 1) / 2);
        assert_eq!(none_stats.peak_active, n);
        assert_eq!(none_stats.candidates_pruned(), 0);
        assert!(pelt_stats.candidates_considered < none_stats.candidates_considered);
        assert!(afp_stats.candidates_considered <= pelt_stats.candidates_considered);
        assert_eq!(pelt_stats.pruned_afp, 0);
        assert_eq!(afp.diagnostics.pruning_rule, "afp");
    }

    #[test]
    fn one_hot_counts_match_label_input() {
        let labels = three_block_labels();
        let encoded = one_hot(&labels, 3).expect("valid");
        let view = CategoricalSequence::from_counts(
            &encoded,
            labels.len(),
            3,
            MemoryLayout::CContiguous,
        )
        .expect("valid matrix");
        let detector = CategoricalFpop::new(FpopConfig::new(3.0)).expect("valid");
        let constraints = Constraints::default();
        let from_counts = detector
            .detect(&view, &ExecutionContext::new(&constraints))
            .expect("detect");
        let from_labels = detect_labels(&labels, 3, FpopConfig::new(3.0));
        assert_eq!(from_counts.change_points, from_labels.change_points);
        assert_eq!(from_counts.total_cost, from_labels.total_cost);
    }

    #[test]
    fn cancelled_token_aborts_the_run() {
        let labels = [0usize, 1, 0, 1];
        let view = CategoricalSequence::from_labels(&labels, 2).expect("valid");
        let detector = CategoricalFpop::new(FpopConfig::new(1.0)).expect("valid");
        let constraints = Constraints::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        let ctx = ExecutionContext::new(&constraints).with_cancel(&cancel);
        let err = detector.detect(&view, &ctx).expect_err("cancelled");
        assert_eq!(err, CpdError::Cancelled);
    }

    #[test]
    fn cost_eval_budget_hard_fail_and_soft_degrade() {
        let labels = three_block_labels();
        let view = CategoricalSequence::from_labels(&labels, 3).expect("valid");
        let detector = CategoricalFpop::new(FpopConfig::new(3.0)).expect("valid");
        let constraints = Constraints {
            max_cost_evals: Some(10),
            ..Constraints::default()
        };

        let err = detector
            .detect(&view, &ExecutionContext::new(&constraints))
            .expect_err("hard budget");
        assert!(matches!(err, CpdError::ResourceLimit(_)));
        assert!(err.to_string().contains("max_cost_evals"));

        let ctx = ExecutionContext::new(&constraints).with_budget_mode(BudgetMode::SoftDegrade);
        let result = detector.detect(&view, &ctx).expect("soft budget continues");
        assert_eq!(result.change_points, vec![40, 80]);
        assert!(
            result
                .diagnostics
                .warnings
                .iter()
                .any(|warning| warning.contains("SoftDegrade"))
        );
    }

    #[test]
    fn progress_and_telemetry_are_reported() {
        let labels = three_block_labels();
        let view = CategoricalSequence::from_labels(&labels, 3).expect("valid");
        let detector = CategoricalFpop::new(FpopConfig {
            cancel_check_every: 0,
            ..FpopConfig::new(3.0)
        })
        .expect("zero cadence is normalized");
        let constraints = Constraints::default();
        let progress = RecordingProgress::default();
        let telemetry = RecordingTelemetry::default();
        let ctx = ExecutionContext::new(&constraints)
            .with_progress_sink(&progress)
            .with_telemetry_sink(&telemetry);
        let result = detector.detect(&view, &ctx).expect("detect");

        let progress = progress.values.lock().expect("lock");
        assert_eq!(progress.last().copied(), Some(1.0));
        assert!(progress.windows(2).all(|pair| pair[0] <= pair[1]));

        let telemetry = telemetry.values.lock().expect("lock");
        let considered = telemetry
            .iter()
            .find(|(key, _)| *key == "offline.catfpop.candidates_considered")
            .map(|(_, value)| *value)
            .expect("considered counter recorded");
        let stats = result.diagnostics.pruning_stats.expect("stats");
        assert_eq!(considered, stats.candidates_considered as f64);
        assert!(
            telemetry
                .iter()
                .any(|(key, _)| *key == "offline.catfpop.runtime_ms")
        );
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_serde_roundtrip() {
        let config = FpopConfig::new(4.0).with_pruning(PruningRule::Pelt);
        let encoded = serde_json::to_string(&config).expect("config should serialize");
        let decoded: FpopConfig = serde_json::from_str(&encoded).expect("config should deserialize");
        assert_eq!(decoded, config);
    }

    #[test]
    fn diagnostics_describe_the_run() {
        let result = detect_labels(&[0, 0, 1, 1], 2, FpopConfig::new(0.5));
        let diagnostics = &result.diagnostics;
        assert_eq!(diagnostics.n, 4);
        assert_eq!(diagnostics.num_categories, 2);
        assert_eq!(diagnostics.algorithm, "catfpop");
        assert_eq!(diagnostics.cost_model, "multinomial");
        assert_eq!(diagnostics.penalty, 0.5);
        assert!(diagnostics.runtime_ms.is_some());
        assert!(
            diagnostics
                .notes
                .iter()
                .any(|note| note.starts_with("final_objective="))
        );

        #[cfg(feature = "serde")]
        {
            let params = diagnostics
                .params_json
                .as_ref()
                .expect("params_json is filled when serde is enabled");
            assert_eq!(params["penalty"], serde_json::json!(0.5));
            assert_eq!(params["pruning"], serde_json::json!("Afp"));
            assert_eq!(params["cancel_check_every"], serde_json::json!(1000));
        }
    }
}
