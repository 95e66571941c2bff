//! Task-to-time-slot scheduling engine.
//!
//! Places a batch of tasks into available time windows, respecting
//! dependencies and maximizing a utility built from priority, deadline
//! pressure, and deep-work fit. Four interchangeable strategies cover
//! the quality/scale trade-off; `StrategySelector` picks one by
//! instance size.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `TaskInput`, `Window`, `Weights`,
//!   `Params`, `Assignment`, `PlanResult`
//! - **`scoring`**: Utility and fragmentation-penalty functions shared
//!   by every strategy
//! - **`graph`**: Dependency ordering (deterministic Kahn) and
//!   dependency-aware placement predicates
//! - **`gaps`**: Free-interval calculus over windows and existing
//!   assignments
//! - **`cp`**: Interval-based constraint model with a branch-and-bound
//!   solver
//! - **`strategy`**: The `SchedulingStrategy` trait, its four
//!   implementations, and size-based selection
//!
//! # Usage
//!
//! ```
//! use timeplan::models::{Params, TaskInput, Weights, Window};
//! use timeplan::strategy::{SchedulingStrategy, StrategySelector, StrategyType};
//!
//! let tasks = vec![
//!     TaskInput::new(1, 60).with_priority(3.0),
//!     TaskInput::new(2, 30).with_dependencies(vec![1]),
//! ];
//! let windows = vec![Window::new(0, 540, 1020)];
//!
//! let selector = StrategySelector::new();
//! let strategy = selector.create(StrategyType::Heuristic);
//! let plan = strategy
//!     .schedule(&tasks, &windows, &Weights::default(), &Params::default())
//!     .unwrap();
//! assert!(plan.is_fully_scheduled());
//! ```
//!
//! # References
//!
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Kirkpatrick et al. (1983), "Optimization by Simulated Annealing"
//! - Wolsey (2020), "Integer Programming"

pub mod cp;
pub mod error;
pub mod gaps;
pub mod graph;
pub mod models;
pub mod scoring;
pub mod strategy;

pub use error::ScheduleError;
pub use models::{Assignment, Params, PlanResult, TaskInput, Unscheduled, Weights, Window};
pub use strategy::{SchedulingStrategy, StrategySelector, StrategyType};
