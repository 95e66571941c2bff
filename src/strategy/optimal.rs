//! Shared skeleton for exact optimization strategies.
//!
//! The CP and MILP strategies share one workflow: validate the instance,
//! check backend availability, build a model, configure a solver, solve,
//! extract. [`OptimalScheduler`] captures the varying parts through
//! associated types; [`run_optimal`] is the fixed skeleton. Every early
//! exit produces a plan with all tasks unscheduled under one reason,
//! never an error.

use std::time::Instant;

use crate::graph;
use crate::models::{
    Params, PlanResult, TaskInput, Unscheduled, Weights, Window, REASON_DEPENDENCY_CYCLE,
};

/// Model-specific hooks of an exact scheduling strategy.
pub trait OptimalScheduler {
    /// The built optimization model.
    type Model;
    /// The solver driving the model.
    type Solver;
    /// The solve outcome, including any extracted raw solution.
    type Status;

    /// Backend name for logs and failure reasons.
    fn name(&self) -> &'static str;

    /// Whether the backend can solve in this process.
    fn is_available(&self) -> bool;

    /// Task-count cap for this backend.
    fn max_tasks(&self) -> usize;

    /// Estimated-slot cap for this backend.
    fn max_slots(&self) -> usize;

    /// Instance-level validation before any model is built. Defaults to
    /// [`OptimalScheduler::base_validate`]; override to add backend
    /// checks on top.
    fn validate(
        &self,
        tasks: &[TaskInput],
        windows: &[Window],
        params: &Params,
    ) -> Result<(), String> {
        self.base_validate(tasks, windows, params)
    }

    /// Shared validation: non-empty inputs, task/slot caps, acyclic
    /// dependencies.
    fn base_validate(
        &self,
        tasks: &[TaskInput],
        windows: &[Window],
        params: &Params,
    ) -> Result<(), String> {
        if tasks.is_empty() {
            return Err("no tasks provided".into());
        }
        if windows.is_empty() {
            return Err("no windows provided".into());
        }
        if tasks.len() > self.max_tasks() {
            return Err(format!(
                "{}: too many tasks ({} > {} limit)",
                self.name(),
                tasks.len(),
                self.max_tasks()
            ));
        }
        let slots = estimate_slot_count(windows, params.slot_min);
        if slots > self.max_slots() {
            return Err(format!(
                "{}: too many slots ({} > {} limit)",
                self.name(),
                slots,
                self.max_slots()
            ));
        }
        if !graph::topological_order(tasks).cyclic.is_empty() {
            return Err(REASON_DEPENDENCY_CYCLE.into());
        }
        Ok(())
    }

    /// Builds the optimization model.
    fn build_model(
        &self,
        tasks: &[TaskInput],
        windows: &[Window],
        weights: &Weights,
        params: &Params,
    ) -> Self::Model;

    /// Creates a solver instance.
    fn create_solver(&self, params: &Params) -> Self::Solver;

    /// Applies parameter-derived settings to the solver.
    fn configure_solver(&self, solver: &mut Self::Solver, params: &Params);

    /// Runs the solve.
    fn solve(&self, solver: &mut Self::Solver, model: &Self::Model) -> Self::Status;

    /// Whether the status carries a usable solution.
    fn is_success(&self, status: &Self::Status) -> bool;

    /// Failure reason attached to every task when the status is unusable.
    fn status_reason(&self, status: &Self::Status) -> String;

    /// Turns a successful status into a plan.
    fn extract(
        &self,
        status: &Self::Status,
        model: &Self::Model,
        tasks: &[TaskInput],
        weights: &Weights,
    ) -> PlanResult;
}

/// A plan with every task unscheduled under one shared reason.
pub fn failure_result(tasks: &[TaskInput], reason: &str) -> PlanResult {
    PlanResult {
        assignments: Vec::new(),
        unscheduled: tasks
            .iter()
            .map(|t| Unscheduled::new(t.task_id, reason))
            .collect(),
        total_score: 0.0,
    }
}

/// Estimated slot count for validation: total window minutes over the
/// slot granularity.
pub fn estimate_slot_count(windows: &[Window], slot_min: i32) -> usize {
    let total_minutes: i32 = windows.iter().map(Window::duration_min).sum();
    (total_minutes / slot_min.max(1)) as usize
}

/// The fixed validate-build-solve-extract skeleton shared by exact
/// strategies.
pub fn run_optimal<S: OptimalScheduler>(
    scheduler: &S,
    tasks: &[TaskInput],
    windows: &[Window],
    weights: &Weights,
    params: &Params,
) -> PlanResult {
    if let Err(reason) = scheduler.validate(tasks, windows, params) {
        tracing::warn!(solver = scheduler.name(), %reason, "validation failed");
        return failure_result(tasks, &reason);
    }

    if !scheduler.is_available() {
        let reason = format!("{} solver not available", scheduler.name());
        tracing::warn!(solver = scheduler.name(), "solver not available");
        return failure_result(tasks, &reason);
    }

    let build_start = Instant::now();
    let model = scheduler.build_model(tasks, windows, weights, params);
    tracing::debug!(
        solver = scheduler.name(),
        build_ms = build_start.elapsed().as_millis() as u64,
        "model built"
    );

    let mut solver = scheduler.create_solver(params);
    scheduler.configure_solver(&mut solver, params);

    tracing::info!(
        solver = scheduler.name(),
        tasks = tasks.len(),
        windows = windows.len(),
        "starting solve"
    );
    let solve_start = Instant::now();
    let status = scheduler.solve(&mut solver, &model);
    tracing::info!(
        solver = scheduler.name(),
        solve_ms = solve_start.elapsed().as_millis() as u64,
        "solve completed"
    );

    if !scheduler.is_success(&status) {
        return failure_result(tasks, &scheduler.status_reason(&status));
    }

    scheduler.extract(&status, &model, tasks, weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_slot_count() {
        let windows = vec![Window::new(0, 540, 1020), Window::new(1, 600, 720)];
        // (480 + 120) / 15
        assert_eq!(estimate_slot_count(&windows, 15), 40);
    }

    #[test]
    fn test_failure_result_covers_all_tasks() {
        let tasks = vec![TaskInput::new(1, 30), TaskInput::new(2, 60)];
        let plan = failure_result(&tasks, "backend down");
        assert!(plan.assignments.is_empty());
        assert_eq!(plan.unscheduled.len(), 2);
        assert!(plan.unscheduled.iter().all(|u| u.reason == "backend down"));
    }
}
