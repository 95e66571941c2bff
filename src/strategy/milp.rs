//! Mixed-integer strategy on a discretized slot grid.
//!
//! Each window is cut into slots of `Params::slot_min` minutes; a binary
//! variable per (task, slot) marks the task starting there. Constraints:
//! at most one start per task, forbidden starts fixed to zero, unit
//! capacity on every covered slot, and per dependency edge a gating
//! constraint (child scheduled only if the dependency is) plus a big-M
//! ordering constraint. The objective maximizes weighted priority minus
//! weighted lateness over chosen starts.
//!
//! The `microlp` backend behind `good_lp` exposes no wall-clock limit;
//! the task/slot/variable caps bound the model size instead.

use std::collections::HashMap;
use std::sync::OnceLock;

use good_lp::{
    constraint, default_solver, variable, variables, Expression, Solution, SolverModel, Variable,
};

use crate::error::ScheduleError;
use crate::models::{
    Assignment, Params, PlanResult, TaskInput, Unscheduled, Weights, Window,
    REASON_NO_FEASIBLE_START, REASON_SOLVER_INFEASIBLE,
};
use crate::scoring;

use super::optimal::{estimate_slot_count, run_optimal, OptimalScheduler};
use super::SchedulingStrategy;

const MAX_TASKS: usize = 30;
const MAX_SLOTS: usize = 500;
const MAX_VARIABLES: usize = 15_000;
/// Objective contribution of a forbidden (task, slot) pair.
const FORBIDDEN_SCORE: f64 = -1e6;

static AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Slot-discretized MILP strategy for small batches.
#[derive(Debug, Default, Clone, Copy)]
pub struct MilpStrategy;

impl MilpStrategy {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }

    /// Probe-solves a one-variable model once per process. A broken
    /// backend yields a permanent false, never a panic.
    pub fn solver_available() -> bool {
        *AVAILABLE.get_or_init(|| {
            let mut vars = variables!();
            let v = vars.add(variable().binary());
            vars.maximise(Expression::from(v))
                .using(default_solver)
                .solve()
                .is_ok()
        })
    }
}

/// One start position on the discretized grid.
#[derive(Debug, Clone, Copy)]
struct Slot {
    date_ms: i64,
    minute: i32,
}

/// The discretized instance: grid, feasibility and score matrices,
/// dependency edges by task index.
pub struct MilpModel {
    slots: Vec<Slot>,
    /// allow[i][t]: task `i` may start at slot `t`.
    allow: Vec<Vec<bool>>,
    /// Task duration in whole slots (ceiling).
    dur_slots: Vec<usize>,
    dur_min: Vec<i32>,
    /// score[i][t], [`FORBIDDEN_SCORE`] where not allowed.
    score: Vec<Vec<f64>>,
    /// (dependency index, dependent index) pairs.
    edges: Vec<(usize, usize)>,
    /// Input windows, kept for utility recomputation at extraction.
    windows: Vec<Window>,
}

/// Result of one MILP solve: the chosen slot per task, or the backend
/// failure.
pub struct MilpOutcome {
    chosen: Vec<Option<usize>>,
    failure: Option<String>,
}

/// The `good_lp` backend carries no per-call state to configure.
pub struct MilpBackend;

impl OptimalScheduler for MilpStrategy {
    type Model = MilpModel;
    type Solver = MilpBackend;
    type Status = MilpOutcome;

    fn name(&self) -> &'static str {
        "MILP"
    }

    fn is_available(&self) -> bool {
        Self::solver_available()
    }

    fn max_tasks(&self) -> usize {
        MAX_TASKS
    }

    fn max_slots(&self) -> usize {
        MAX_SLOTS
    }

    fn validate(
        &self,
        tasks: &[TaskInput],
        windows: &[Window],
        params: &Params,
    ) -> Result<(), String> {
        self.base_validate(tasks, windows, params)?;

        let slots = estimate_slot_count(windows, params.slot_min);
        let variables = tasks.len() * slots;
        if variables > MAX_VARIABLES {
            return Err(format!(
                "MILP: too many variables ({} tasks x {} slots = {} > {} limit)",
                tasks.len(),
                slots,
                variables,
                MAX_VARIABLES
            ));
        }
        Ok(())
    }

    fn build_model(
        &self,
        tasks: &[TaskInput],
        windows: &[Window],
        weights: &Weights,
        params: &Params,
    ) -> MilpModel {
        let slot_min = params.slot_min;

        let mut slots = Vec::new();
        for w in windows {
            let mut m = w.start_min;
            while m + slot_min <= w.end_min {
                slots.push(Slot {
                    date_ms: w.date_ms,
                    minute: m,
                });
                m += slot_min;
            }
        }

        let n = tasks.len();
        let t_count = slots.len();
        let mut allow = vec![vec![false; t_count]; n];
        let mut dur_slots = vec![0usize; n];
        let mut dur_min = vec![0i32; n];

        for (i, task) in tasks.iter().enumerate() {
            dur_min[i] = task.duration_min;
            dur_slots[i] = (task.duration_min as f64 / slot_min as f64).ceil() as usize;

            for (t, slot) in slots.iter().enumerate() {
                let end_min = slot.minute + task.duration_min;
                let fits = windows
                    .iter()
                    .any(|w| w.contains(slot.date_ms, slot.minute, end_min));
                if !fits || t + dur_slots[i] > t_count {
                    continue;
                }
                let contiguous = (1..dur_slots[i]).all(|k| {
                    let next = &slots[t + k];
                    next.date_ms == slot.date_ms
                        && next.minute == slot.minute + (k as i32) * slot_min
                });
                allow[i][t] = contiguous;
            }
        }

        let w_priority = weights.priority_or_default();
        let w_deadline = weights.deadline_or_default();
        let mut score = vec![vec![FORBIDDEN_SCORE; t_count]; n];
        for (i, task) in tasks.iter().enumerate() {
            for (t, slot) in slots.iter().enumerate() {
                if !allow[i][t] {
                    continue;
                }
                let end_min = slot.minute + task.duration_min;
                let lateness = scoring::lateness_hours(task, slot.date_ms, end_min);
                score[i][t] = w_priority * task.priority_or_zero() - w_deadline * lateness;
            }
        }

        let id_to_idx: HashMap<i64, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.task_id, i))
            .collect();
        let mut edges = Vec::new();
        for (j, task) in tasks.iter().enumerate() {
            for dep_id in &task.depends_on {
                if let Some(&i) = id_to_idx.get(dep_id) {
                    edges.push((i, j));
                }
            }
        }

        tracing::debug!(
            tasks = n,
            slots = t_count,
            variables = n * t_count,
            edges = edges.len(),
            "MILP model built"
        );

        MilpModel {
            slots,
            allow,
            dur_slots,
            dur_min,
            score,
            edges,
            windows: windows.to_vec(),
        }
    }

    fn create_solver(&self, _params: &Params) -> MilpBackend {
        MilpBackend
    }

    fn configure_solver(&self, _solver: &mut MilpBackend, _params: &Params) {
        // microlp has no runtime knobs to apply.
    }

    fn solve(&self, _solver: &mut MilpBackend, model: &MilpModel) -> MilpOutcome {
        let n = model.allow.len();
        let t_count = model.slots.len();

        let mut vars = variables!();
        let s: Vec<Vec<Variable>> = (0..n)
            .map(|_| (0..t_count).map(|_| vars.add(variable().binary())).collect())
            .collect();

        let mut objective = Expression::from(0.0);
        for i in 0..n {
            for t in 0..t_count {
                objective += model.score[i][t] * s[i][t];
            }
        }

        let mut problem = vars.maximise(objective).using(default_solver);

        // At most one start per task.
        for row in &s {
            let sum = row
                .iter()
                .fold(Expression::from(0.0), |acc, &v| acc + v);
            problem = problem.with(constraint!(sum <= 1.0));
        }

        // Forbidden starts are pinned to zero.
        for i in 0..n {
            for t in 0..t_count {
                if !model.allow[i][t] {
                    problem = problem.with(constraint!(s[i][t] <= 0.0));
                }
            }
        }

        // Unit capacity on every covered slot.
        for u in 0..t_count {
            let mut covering = Expression::from(0.0);
            let mut any = false;
            for i in 0..n {
                for t in 0..t_count {
                    if model.allow[i][t] && t <= u && u < t + model.dur_slots[i] {
                        covering += s[i][t];
                        any = true;
                    }
                }
            }
            if any {
                problem = problem.with(constraint!(covering <= 1.0));
            }
        }

        // Dependency edges: gating plus big-M ordering.
        let big_m = (t_count + model.dur_slots.iter().copied().max().unwrap_or(0) + 1) as f64;
        for &(i, j) in &model.edges {
            let mut gate = Expression::from(0.0);
            for t in 0..t_count {
                gate += s[j][t];
                gate -= s[i][t];
            }
            problem = problem.with(constraint!(gate <= 0.0));

            let mut order = Expression::from(0.0);
            for t in 0..t_count {
                order += (t as f64 - big_m) * s[j][t];
                order += (-(t as f64) - big_m) * s[i][t];
            }
            let bound = model.dur_slots[i] as f64 - 2.0 * big_m;
            problem = problem.with(constraint!(order >= bound));
        }

        match problem.solve() {
            Ok(solution) => {
                let chosen = s
                    .iter()
                    .map(|row| row.iter().position(|&v| solution.value(v) > 0.5))
                    .collect();
                MilpOutcome {
                    chosen,
                    failure: None,
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "MILP solve failed");
                MilpOutcome {
                    chosen: Vec::new(),
                    failure: Some(err.to_string()),
                }
            }
        }
    }

    fn is_success(&self, status: &MilpOutcome) -> bool {
        status.failure.is_none()
    }

    fn status_reason(&self, _status: &MilpOutcome) -> String {
        REASON_SOLVER_INFEASIBLE.into()
    }

    fn extract(
        &self,
        status: &MilpOutcome,
        model: &MilpModel,
        tasks: &[TaskInput],
        weights: &Weights,
    ) -> PlanResult {
        let mut assignments = Vec::new();
        let mut unscheduled = Vec::new();

        for (i, task) in tasks.iter().enumerate() {
            let Some(t) = status.chosen.get(i).copied().flatten() else {
                unscheduled.push(Unscheduled::new(task.task_id, REASON_NO_FEASIBLE_START));
                continue;
            };
            let slot = model.slots[t];
            let end_min = slot.minute + model.dur_min[i];
            // allow[i][t] guarantees a containing window exists.
            let utility = model
                .windows
                .iter()
                .find(|w| w.contains(slot.date_ms, slot.minute, end_min))
                .map(|w| scoring::utility(task, w, end_min, weights))
                .unwrap_or(0.0);
            assignments.push(Assignment {
                task_id: task.task_id,
                date_ms: slot.date_ms,
                start_min: slot.minute,
                end_min,
                utility,
            });
        }

        let total_score = assignments.iter().map(|a| a.utility).sum();
        tracing::info!(
            placed = assignments.len(),
            unscheduled = unscheduled.len(),
            "MILP solution extracted"
        );
        PlanResult {
            assignments,
            unscheduled,
            total_score,
        }
    }
}

impl SchedulingStrategy for MilpStrategy {
    fn name(&self) -> &'static str {
        "milp"
    }

    fn is_available(&self) -> bool {
        Self::solver_available()
    }

    fn schedule(
        &self,
        tasks: &[TaskInput],
        windows: &[Window],
        weights: &Weights,
        params: &Params,
    ) -> Result<PlanResult, ScheduleError> {
        params.validate()?;
        Ok(run_optimal(self, tasks, windows, weights, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gaps;
    use crate::models::REASON_DEPENDENCY_CYCLE;

    const DAY: i64 = 1_735_516_800_000;

    fn run(tasks: &[TaskInput], windows: &[Window]) -> PlanResult {
        SchedulingStrategy::schedule(
            &MilpStrategy::new(),
            tasks,
            windows,
            &Weights::new(),
            &Params::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_solver_available() {
        assert!(MilpStrategy::solver_available());
    }

    #[test]
    fn test_basic_schedule_on_grid() {
        let windows = vec![Window::new(DAY, 540, 720)];
        let tasks = vec![
            TaskInput::new(1, 60).with_priority(5.0),
            TaskInput::new(2, 60).with_priority(3.0),
        ];
        let plan = run(&tasks, &windows);
        assert!(plan.is_fully_scheduled());
        for a in &plan.assignments {
            assert!(windows
                .iter()
                .any(|w| w.contains(a.date_ms, a.start_min, a.end_min)));
            // Starts land on the 15-minute grid.
            assert_eq!((a.start_min - 540) % 15, 0);
        }
        let (a, b) = (&plan.assignments[0], &plan.assignments[1]);
        assert!(!gaps::overlaps(a, b));
    }

    #[test]
    fn test_oversized_task_no_feasible_start() {
        let windows = vec![Window::new(DAY, 540, 600)];
        let tasks = vec![TaskInput::new(1, 120)];
        let plan = run(&tasks, &windows);
        assert!(plan.assignments.is_empty());
        assert_eq!(plan.unscheduled[0].reason, REASON_NO_FEASIBLE_START);
    }

    #[test]
    fn test_dependency_ordering() {
        let windows = vec![Window::new(DAY, 540, 780)];
        let tasks = vec![
            TaskInput::new(1, 60).with_priority(2.0),
            TaskInput::new(2, 60).with_priority(2.0).with_dependencies(vec![1]),
        ];
        let plan = run(&tasks, &windows);
        if let (Some(a1), Some(a2)) = (plan.assignment_for(1), plan.assignment_for(2)) {
            assert!(a1.end_min <= a2.start_min);
        } else {
            panic!("expected both tasks scheduled: {plan:?}");
        }
    }

    #[test]
    fn test_gating_leaves_dependent_out() {
        // Task 1 fits nowhere; the gate forces task 2 out with it.
        let windows = vec![Window::new(DAY, 540, 600)];
        let tasks = vec![
            TaskInput::new(1, 120),
            TaskInput::new(2, 30).with_priority(3.0).with_dependencies(vec![1]),
        ];
        let plan = run(&tasks, &windows);
        assert!(plan.assignment_for(2).is_none());
    }

    #[test]
    fn test_deadline_claims_early_slot() {
        let windows = vec![Window::new(DAY, 540, 660)];
        let tasks = vec![
            TaskInput::new(1, 60)
                .with_priority(1.0)
                .with_deadline(DAY + 600 * 60_000),
            TaskInput::new(2, 60).with_priority(1.0),
        ];
        let plan = run(&tasks, &windows);
        assert!(plan.is_fully_scheduled());
        let a1 = plan.assignment_for(1).unwrap();
        assert_eq!(a1.start_min, 540, "deadline task pushed late: {plan:?}");
    }

    #[test]
    fn test_cycle_fails_batch() {
        let windows = vec![Window::new(DAY, 540, 1020)];
        let tasks = vec![
            TaskInput::new(1, 30).with_dependencies(vec![2]),
            TaskInput::new(2, 30).with_dependencies(vec![1]),
        ];
        let plan = run(&tasks, &windows);
        assert!(plan.assignments.is_empty());
        assert!(plan
            .unscheduled
            .iter()
            .all(|u| u.reason == REASON_DEPENDENCY_CYCLE));
    }

    #[test]
    fn test_variable_cap_rejected() {
        // 31 tasks exceeds the MILP task cap.
        let windows = vec![Window::new(DAY, 0, 1440)];
        let tasks: Vec<TaskInput> = (0..31).map(|i| TaskInput::new(i, 15)).collect();
        let plan = run(&tasks, &windows);
        assert!(plan.assignments.is_empty());
        assert!(plan.unscheduled[0].reason.contains("too many tasks"));
    }

    #[test]
    fn test_partition_invariant() {
        let windows = vec![Window::new(DAY, 540, 660)];
        let tasks = vec![
            TaskInput::new(1, 60),
            TaskInput::new(2, 60),
            TaskInput::new(3, 60),
        ];
        let plan = run(&tasks, &windows);
        let mut ids: Vec<i64> = plan
            .assignments
            .iter()
            .map(|a| a.task_id)
            .chain(plan.unscheduled.iter().map(|u| u.task_id))
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
