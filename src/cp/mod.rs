//! Constraint-programming primitives for calendar placement.
//!
//! A small CP core tailored to disjunctive single-capacity scheduling:
//! fixed-duration interval variables, candidate placement windows (exactly
//! one chosen per interval), per-date no-overlap, date-aware precedence,
//! and a linear objective over start minutes. Solved by the
//! branch-and-bound search in [`solver`].
//!
//! # References
//!
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"

mod solver;

pub use solver::BranchBoundSolver;

use std::collections::HashMap;

/// A candidate placement region: one date, one contiguous span of
/// minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSlot {
    /// Date identifier (epoch ms).
    pub date_ms: i64,
    /// Region start minute.
    pub start_min: i32,
    /// Region end minute (exclusive).
    pub end_min: i32,
}

impl WindowSlot {
    /// Creates a placement region.
    pub fn new(date_ms: i64, start_min: i32, end_min: i32) -> Self {
        Self {
            date_ms,
            start_min,
            end_min,
        }
    }
}

/// A fixed-duration interval variable with its candidate regions.
#[derive(Debug, Clone)]
pub struct IntervalVar {
    /// Duration in minutes.
    pub duration: i32,
    /// Indices into the model's window list; exactly one is chosen.
    pub candidates: Vec<usize>,
}

/// Outcome of a CP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpStatus {
    /// Search exhausted with a best solution.
    Optimal,
    /// Budget hit with an incumbent solution.
    Feasible,
    /// Search exhausted without any solution.
    Infeasible,
    /// Budget hit before any solution was found.
    Unknown,
    /// The model violates its own structural invariants.
    ModelInvalid,
}

/// Chosen region and start minute for one interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpPlacement {
    /// Index of the chosen window region.
    pub window: usize,
    /// Chosen start minute.
    pub start_min: i32,
}

/// A CP solution: status, placements by interval index, objective value.
#[derive(Debug, Clone)]
pub struct CpSolution {
    /// Solve status.
    pub status: CpStatus,
    /// Placement per interval index; complete when a solution was found.
    pub placements: HashMap<usize, CpPlacement>,
    /// Objective value of the placements.
    pub objective: i64,
}

impl CpSolution {
    /// Whether the solution carries usable placements.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, CpStatus::Optimal | CpStatus::Feasible)
    }

    pub(crate) fn status_only(status: CpStatus) -> Self {
        Self {
            status,
            placements: HashMap::new(),
            objective: 0,
        }
    }
}

/// Solver tuning.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Wall-clock solve budget (ms).
    pub max_time_ms: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { max_time_ms: 30_000 }
    }
}

/// A solver for [`CpModel`] instances.
pub trait CpSolver {
    /// Solves the model within the configured budget.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}

/// A disjunctive scheduling model.
///
/// Intervals are referenced by insertion index. Precedence edges are
/// date-aware: the dependency's chosen date must not exceed the
/// dependent's, and when both land on the same date the dependency must
/// end at or before the dependent starts.
#[derive(Debug, Clone, Default)]
pub struct CpModel {
    windows: Vec<WindowSlot>,
    intervals: Vec<IntervalVar>,
    precedences: Vec<(usize, usize)>,
    objective: Vec<i64>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a placement region, returning its index.
    pub fn add_window(&mut self, window: WindowSlot) -> usize {
        self.windows.push(window);
        self.windows.len() - 1
    }

    /// Adds an interval variable, returning its index. The objective
    /// coefficient starts at zero.
    pub fn add_interval(&mut self, duration: i32, candidates: Vec<usize>) -> usize {
        self.intervals.push(IntervalVar {
            duration,
            candidates,
        });
        self.objective.push(0);
        self.intervals.len() - 1
    }

    /// Adds a precedence edge: `dep` must complete before `child` starts.
    pub fn add_precedence(&mut self, dep: usize, child: usize) {
        self.precedences.push((dep, child));
    }

    /// Sets the objective coefficient applied to `interval`'s start
    /// minute. The solver maximizes the weighted sum of starts.
    pub fn set_objective_coeff(&mut self, interval: usize, coeff: i64) {
        self.objective[interval] = coeff;
    }

    /// Number of interval variables.
    #[inline]
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Number of precedence edges.
    #[inline]
    pub fn precedence_count(&self) -> usize {
        self.precedences.len()
    }

    #[inline]
    pub(crate) fn windows(&self) -> &[WindowSlot] {
        &self.windows
    }

    #[inline]
    pub(crate) fn intervals(&self) -> &[IntervalVar] {
        &self.intervals
    }

    #[inline]
    pub(crate) fn precedences(&self) -> &[(usize, usize)] {
        &self.precedences
    }

    #[inline]
    pub(crate) fn objective(&self) -> &[i64] {
        &self.objective
    }

    /// Structural validity: every interval has a positive duration and at
    /// least one candidate that can contain it, indices are in range.
    pub fn is_valid(&self) -> bool {
        for iv in &self.intervals {
            if iv.duration <= 0 || iv.candidates.is_empty() {
                return false;
            }
            for &w in &iv.candidates {
                match self.windows.get(w) {
                    Some(slot) if slot.end_min - slot.start_min >= iv.duration => {}
                    _ => return false,
                }
            }
        }
        self.precedences
            .iter()
            .all(|&(a, b)| a < self.intervals.len() && b < self.intervals.len() && a != b)
    }
}
