//! Scheduling strategies and strategy selection.
//!
//! Four interchangeable strategies implement [`SchedulingStrategy`]:
//!
//! - `CpSatStrategy`: constraint model with interval variables and a
//!   budget-bounded branch-and-bound search; best quality on mid-size
//!   batches.
//! - `MilpStrategy`: slot-discretized mixed-integer formulation solved
//!   through `good_lp`; exact on small batches.
//! - `HeuristicStrategy`: deterministic gap-based greedy placement; the
//!   always-available fallback.
//! - `LocalSearchStrategy`: simulated annealing on top of the heuristic
//!   seed.
//!
//! `StrategySelector` picks a strategy by instance size and availability.
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 2-4
//! - Kirkpatrick et al. (1983), "Optimization by Simulated Annealing"

mod cpsat;
mod heuristic;
mod local_search;
mod milp;
mod optimal;
mod selector;

pub use cpsat::CpSatStrategy;
pub use heuristic::HeuristicStrategy;
pub use local_search::LocalSearchStrategy;
pub use milp::MilpStrategy;
pub use optimal::{run_optimal, OptimalScheduler};
pub use selector::{StrategySelector, StrategyType};

use crate::error::ScheduleError;
use crate::models::{Params, PlanResult, TaskInput, Weights, Window};

/// A scheduling algorithm: tasks plus availability in, plan out.
///
/// Implementations are stateless across calls; every call builds its own
/// working state, so one strategy value can serve concurrent callers.
/// Per-task placement failures are reported inside the plan, never as
/// errors.
pub trait SchedulingStrategy: Send + Sync {
    /// Strategy name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Whether the strategy's backend can run in this process.
    fn is_available(&self) -> bool {
        true
    }

    /// Computes a plan for `tasks` over `windows`.
    fn schedule(
        &self,
        tasks: &[TaskInput],
        windows: &[Window],
        weights: &Weights,
        params: &Params,
    ) -> Result<PlanResult, ScheduleError>;
}
