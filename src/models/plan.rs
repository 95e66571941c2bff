//! Scheduling result model.
//!
//! A plan partitions the input tasks into placed assignments and
//! unscheduled leftovers, each leftover carrying a machine-readable
//! reason string.

use serde::{Deserialize, Serialize};

/// Reason: the task participates in a dependency cycle.
pub const REASON_DEPENDENCY_CYCLE: &str = "dependency cycle detected";
/// Reason: an in-batch dependency of the task could not be scheduled.
pub const REASON_DEPENDENCY_UNSCHEDULED: &str = "dependency unscheduled";
/// Reason: no free gap large enough was found by the greedy placement.
pub const REASON_NO_GAP: &str = "no suitable gap found";
/// Reason: the exact solver assigned no start to the task.
pub const REASON_NO_FEASIBLE_START: &str = "no feasible start";
/// Reason: the solver proved or presumed the model infeasible.
pub const REASON_SOLVER_INFEASIBLE: &str = "solver infeasible";
/// Reason: no availability window can contain the task at all.
pub const REASON_NO_FEASIBLE_WINDOW: &str = "no feasible window";

/// One placed task: a date, a start and an end minute, plus the utility
/// the scoring function attributes to this placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    /// Id of the placed task.
    pub task_id: i64,
    /// Date the task is placed on (epoch ms, per-day resolution).
    pub date_ms: i64,
    /// Start minute of day.
    pub start_min: i32,
    /// End minute of day (exclusive); always `start_min + duration`.
    pub end_min: i32,
    /// Utility attributed to this placement.
    pub utility: f64,
}

/// A task the strategy could not place, with the reason why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unscheduled {
    /// Id of the task left out.
    pub task_id: i64,
    /// One of the `REASON_*` constants in this module.
    pub reason: String,
}

impl Unscheduled {
    /// Creates an unscheduled entry.
    pub fn new(task_id: i64, reason: impl Into<String>) -> Self {
        Self {
            task_id,
            reason: reason.into(),
        }
    }
}

/// The outcome of one scheduling call.
///
/// Assignments and unscheduled entries partition the input: every task id
/// appears in exactly one of the two lists, exactly once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanResult {
    /// Placed tasks.
    pub assignments: Vec<Assignment>,
    /// Tasks left out, with reasons.
    pub unscheduled: Vec<Unscheduled>,
    /// Total objective value the producing strategy reports for the plan.
    pub total_score: f64,
}

impl PlanResult {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the assignment for a task id, if it was placed.
    pub fn assignment_for(&self, task_id: i64) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.task_id == task_id)
    }

    /// Whether every input task was placed.
    pub fn is_fully_scheduled(&self) -> bool {
        self.unscheduled.is_empty()
    }

    /// Ids of all placed tasks.
    pub fn scheduled_ids(&self) -> Vec<i64> {
        self.assignments.iter().map(|a| a.task_id).collect()
    }
}
