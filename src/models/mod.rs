//! Core data model: tasks, windows, weights, parameters and plan results.

mod params;
mod plan;
mod task;
mod weights;
mod window;

pub use params::{
    Params, DEFAULT_COOLING_RATE, DEFAULT_INITIAL_TEMPERATURE, DEFAULT_MAX_ITERATIONS,
    DEFAULT_MAX_TIME_MS, DEFAULT_SLOT_MIN,
};
pub use plan::{
    Assignment, PlanResult, Unscheduled, REASON_DEPENDENCY_CYCLE, REASON_DEPENDENCY_UNSCHEDULED,
    REASON_NO_FEASIBLE_START, REASON_NO_FEASIBLE_WINDOW, REASON_NO_GAP, REASON_SOLVER_INFEASIBLE,
};
pub use task::TaskInput;
pub use weights::Weights;
pub use window::Window;
