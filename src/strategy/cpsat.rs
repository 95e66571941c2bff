//! Constraint-programming strategy.
//!
//! Bridges the task/window domain onto the CP core in [`crate::cp`]: one
//! fixed-duration interval per task, candidate windows as the placement
//! choice, per-date no-overlap and date-aware precedence enforced by the
//! solver. A pre-pass drops tasks that fit no window at all and
//! propagates the failure to their dependents, so the solver only sees
//! satisfiable interval domains.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use crate::cp::{
    BranchBoundSolver, CpModel, CpSolution, CpSolver, CpStatus, SolverConfig, WindowSlot,
};
use crate::error::ScheduleError;
use crate::models::{
    Assignment, Params, PlanResult, TaskInput, Unscheduled, Weights, Window,
    REASON_DEPENDENCY_UNSCHEDULED, REASON_NO_FEASIBLE_START, REASON_NO_FEASIBLE_WINDOW,
    REASON_SOLVER_INFEASIBLE,
};
use crate::scoring;

use super::optimal::{run_optimal, OptimalScheduler};
use super::SchedulingStrategy;

const MAX_TASKS: usize = 100;
const MAX_SLOTS: usize = 1000;
/// Objective scale: priorities become integer coefficients on start
/// minutes at two decimal places of precision.
const OBJECTIVE_SCALE: f64 = 100.0;

static AVAILABLE: OnceLock<bool> = OnceLock::new();

/// Exact CP strategy for mid-size batches.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpSatStrategy;

impl CpSatStrategy {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }

    /// Probes the solver once per process with a trivial model.
    pub fn solver_available() -> bool {
        *AVAILABLE.get_or_init(|| {
            let mut model = CpModel::new();
            let w = model.add_window(WindowSlot::new(0, 0, 60));
            model.add_interval(30, vec![w]);
            BranchBoundSolver::new()
                .solve(&model, &SolverConfig { max_time_ms: 100 })
                .is_solution_found()
        })
    }
}

/// The built CP model plus the bookkeeping to map a solution back onto
/// tasks.
pub struct CpTaskModel {
    model: CpModel,
    /// Interval index per included task index.
    interval_of_task: HashMap<usize, usize>,
    /// Input window per model window slot (slot indices coincide with
    /// input order).
    windows: Vec<Window>,
    /// Tasks removed by the pre-pass, with their reasons.
    excluded: Vec<Unscheduled>,
}

/// Branch-and-bound solver carrying its per-call budget.
pub struct ConfiguredSolver {
    inner: BranchBoundSolver,
    config: SolverConfig,
}

impl OptimalScheduler for CpSatStrategy {
    type Model = CpTaskModel;
    type Solver = ConfiguredSolver;
    type Status = CpSolution;

    fn name(&self) -> &'static str {
        "CP-SAT"
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

    fn build_model(
        &self,
        tasks: &[TaskInput],
        windows: &[Window],
        weights: &Weights,
        _params: &Params,
    ) -> CpTaskModel {
        let (included, excluded) = feasibility_prepass(tasks, windows);

        let mut model = CpModel::new();
        for window in windows {
            model.add_window(WindowSlot::new(
                window.date_ms,
                window.start_min,
                window.end_min,
            ));
        }

        let w_priority = weights.priority_or_default();
        let mut interval_of_task = HashMap::new();
        for &task_idx in &included {
            let task = &tasks[task_idx];
            let candidates: Vec<usize> = windows
                .iter()
                .enumerate()
                .filter(|(_, w)| w.duration_min() >= task.duration_min)
                .map(|(slot, _)| slot)
                .collect();
            let interval = model.add_interval(task.duration_min, candidates);
            let coeff = (task.priority_or_zero() * w_priority * OBJECTIVE_SCALE).round() as i64;
            model.set_objective_coeff(interval, coeff);
            interval_of_task.insert(task_idx, interval);
        }

        let id_to_idx: HashMap<i64, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.task_id, i))
            .collect();
        for &task_idx in &included {
            for dep_id in &tasks[task_idx].depends_on {
                if let Some(&dep_idx) = id_to_idx.get(dep_id) {
                    if let (Some(&dep_iv), Some(&child_iv)) = (
                        interval_of_task.get(&dep_idx),
                        interval_of_task.get(&task_idx),
                    ) {
                        model.add_precedence(dep_iv, child_iv);
                    }
                }
            }
        }

        tracing::debug!(
            intervals = model.interval_count(),
            precedences = model.precedence_count(),
            excluded = excluded.len(),
            "CP model built"
        );

        CpTaskModel {
            model,
            interval_of_task,
            windows: windows.to_vec(),
            excluded,
        }
    }

    fn create_solver(&self, _params: &Params) -> ConfiguredSolver {
        ConfiguredSolver {
            inner: BranchBoundSolver::new(),
            config: SolverConfig::default(),
        }
    }

    fn configure_solver(&self, solver: &mut ConfiguredSolver, params: &Params) {
        solver.config.max_time_ms = params.max_time_ms;
    }

    fn solve(&self, solver: &mut ConfiguredSolver, model: &CpTaskModel) -> CpSolution {
        solver.inner.solve(&model.model, &solver.config)
    }

    fn is_success(&self, status: &CpSolution) -> bool {
        status.is_solution_found()
    }

    fn status_reason(&self, status: &CpSolution) -> String {
        match status.status {
            CpStatus::Infeasible => REASON_SOLVER_INFEASIBLE.into(),
            CpStatus::Unknown => "solver timeout or resource limit".into(),
            CpStatus::ModelInvalid => "model invalid".into(),
            _ => format!("solver failed: {:?}", status.status),
        }
    }

    fn extract(
        &self,
        status: &CpSolution,
        model: &CpTaskModel,
        tasks: &[TaskInput],
        weights: &Weights,
    ) -> PlanResult {
        let mut assignments = Vec::new();
        let mut unscheduled = model.excluded.clone();

        for (task_idx, task) in tasks.iter().enumerate() {
            let Some(interval) = model.interval_of_task.get(&task_idx) else {
                continue; // pre-pass exclusion, already reported
            };
            match status.placements.get(interval) {
                Some(placement) => {
                    let window = &model.windows[placement.window];
                    let end_min = placement.start_min + task.duration_min;
                    let utility = scoring::utility(task, window, end_min, weights);
                    assignments.push(Assignment {
                        task_id: task.task_id,
                        date_ms: window.date_ms,
                        start_min: placement.start_min,
                        end_min,
                        utility,
                    });
                }
                None => {
                    unscheduled.push(Unscheduled::new(task.task_id, REASON_NO_FEASIBLE_START));
                }
            }
        }

        let total_score = assignments.iter().map(|a| a.utility).sum();
        tracing::info!(
            objective = status.objective,
            placed = assignments.len(),
            unscheduled = unscheduled.len(),
            "CP solution extracted"
        );
        PlanResult {
            assignments,
            unscheduled,
            total_score,
        }
    }
}

/// Drops tasks no window can contain, then forward-propagates the
/// failure through in-batch dependency edges. Returns included task
/// indices (input order) and the exclusion reasons.
fn feasibility_prepass(tasks: &[TaskInput], windows: &[Window]) -> (Vec<usize>, Vec<Unscheduled>) {
    let mut excluded_ids: HashSet<i64> = HashSet::new();
    let mut excluded = Vec::new();

    for task in tasks {
        if !windows.iter().any(|w| w.duration_min() >= task.duration_min) {
            excluded.push(Unscheduled::new(task.task_id, REASON_NO_FEASIBLE_WINDOW));
            excluded_ids.insert(task.task_id);
        }
    }

    // Transitive propagation to dependents.
    loop {
        let mut changed = false;
        for task in tasks {
            if excluded_ids.contains(&task.task_id) {
                continue;
            }
            if task.depends_on.iter().any(|id| excluded_ids.contains(id)) {
                excluded.push(Unscheduled::new(
                    task.task_id,
                    REASON_DEPENDENCY_UNSCHEDULED,
                ));
                excluded_ids.insert(task.task_id);
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let included = tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| !excluded_ids.contains(&t.task_id))
        .map(|(i, _)| i)
        .collect();
    (included, excluded)
}

impl SchedulingStrategy for CpSatStrategy {
    fn name(&self) -> &'static str {
        "cpsat"
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
