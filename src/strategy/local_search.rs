//! Simulated-annealing refinement of the greedy plan.
//!
//! Starts from the gap-based heuristic's plan and explores the
//! neighborhood with swap and shift moves, accepting uphill moves always
//! and downhill moves with probability `exp(delta / T)` under a geometric
//! cooling schedule. Moves never change which tasks are scheduled, so the
//! heuristic's unscheduled reasons carry through unchanged.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt, Vecchi (1983), "Optimization by Simulated
//!   Annealing"

use std::collections::HashMap;
use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::error::ScheduleError;
use crate::gaps;
use crate::models::{Assignment, Params, PlanResult, TaskInput, Weights, Window};
use crate::scoring::{self, SLIVER_MIN};

use super::{HeuristicStrategy, SchedulingStrategy};

/// Annealing stops once the temperature drops below this floor.
const MIN_TEMPERATURE: f64 = 0.01;
/// Flat reward per scheduled task in the annealing objective.
const COVERAGE_BONUS: f64 = 5.0;
/// Weight of the fragmentation percentage in the annealing objective.
const FRAGMENTATION_WEIGHT: f64 = 2.0;

/// Simulated-annealing scheduler seeded by [`HeuristicStrategy`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalSearchStrategy;

impl LocalSearchStrategy {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

impl SchedulingStrategy for LocalSearchStrategy {
    fn name(&self) -> &'static str {
        "local_search"
    }

    fn schedule(
        &self,
        tasks: &[TaskInput],
        windows: &[Window],
        weights: &Weights,
        params: &Params,
    ) -> Result<PlanResult, ScheduleError> {
        params.validate()?;

        let initial = HeuristicStrategy::new().schedule(tasks, windows, weights, params)?;
        if initial.assignments.is_empty() {
            return Ok(initial);
        }

        Ok(anneal(initial, tasks, windows, weights, params))
    }
}

fn anneal(
    initial: PlanResult,
    tasks: &[TaskInput],
    windows: &[Window],
    weights: &Weights,
    params: &Params,
) -> PlanResult {
    let task_by_id: HashMap<i64, &TaskInput> =
        tasks.iter().map(|t| (t.task_id, t)).collect();

    let mut rng = match params.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let mut current = initial.assignments.clone();
    let mut current_score = objective(&current, &task_by_id, windows, weights);
    let mut best = current.clone();
    let mut best_score = current_score;

    let mut temperature = params.initial_temperature;
    let deadline = Instant::now() + Duration::from_millis(params.max_time_ms);
    let mut accepted = 0u32;
    let mut improvements = 0u32;

    tracing::info!(
        initial_score = current_score,
        temperature,
        max_iterations = params.max_iterations,
        "local search start"
    );

    for iter in 0..params.max_iterations {
        if Instant::now() >= deadline {
            tracing::debug!(iter, "time budget exhausted");
            break;
        }

        let Some(neighbor) = random_neighbor(&current, windows, &mut rng) else {
            continue;
        };
        if !is_feasible(&neighbor, &task_by_id, windows) {
            continue;
        }

        let neighbor_score = objective(&neighbor, &task_by_id, windows, weights);
        let delta = neighbor_score - current_score;
        let accept = delta > 0.0 || rng.random::<f64>() < (delta / temperature).exp();

        if accept {
            current = neighbor;
            current_score = neighbor_score;
            accepted += 1;
            if current_score > best_score {
                best = current.clone();
                best_score = current_score;
                improvements += 1;
                tracing::debug!(iter, best_score, delta, "new best plan");
            }
        }

        temperature *= params.cooling_rate;
        if temperature < MIN_TEMPERATURE {
            tracing::debug!(iter, "temperature floor reached");
            break;
        }
    }

    tracing::info!(best_score, accepted, improvements, "local search complete");

    // Moves leave utilities stale; recompute them at the final positions.
    for a in &mut best {
        if let Some(task) = task_by_id.get(&a.task_id) {
            if let Some(window) = windows
                .iter()
                .find(|w| w.contains(a.date_ms, a.start_min, a.end_min))
            {
                a.utility = scoring::utility(task, window, a.end_min, weights);
            }
        }
    }

    let total_score = best.iter().map(|a| a.utility).sum();
    PlanResult {
        assignments: best,
        unscheduled: initial.unscheduled,
        total_score,
    }
}

/// Generates one random neighbor: 50% swap of two assignments' dates and
/// starts (ends recomputed from each task's own span), 50% shift of one
/// assignment to a random in-window start. Returns `None` when the state
/// is too small or the drawn window cannot hold the drawn task.
fn random_neighbor(
    current: &[Assignment],
    windows: &[Window],
    rng: &mut SmallRng,
) -> Option<Vec<Assignment>> {
    if current.len() < 2 || windows.is_empty() {
        return None;
    }

    let mut neighbor = current.to_vec();
    if rng.random_bool(0.5) {
        // Swap
        let i = rng.random_range(0..neighbor.len());
        let mut j = rng.random_range(0..neighbor.len());
        while j == i {
            j = rng.random_range(0..neighbor.len());
        }
        let dur_i = neighbor[i].end_min - neighbor[i].start_min;
        let dur_j = neighbor[j].end_min - neighbor[j].start_min;
        let (date_i, start_i) = (neighbor[i].date_ms, neighbor[i].start_min);
        neighbor[i].date_ms = neighbor[j].date_ms;
        neighbor[i].start_min = neighbor[j].start_min;
        neighbor[i].end_min = neighbor[i].start_min + dur_i;
        neighbor[j].date_ms = date_i;
        neighbor[j].start_min = start_i;
        neighbor[j].end_min = start_i + dur_j;
    } else {
        // Shift
        let i = rng.random_range(0..neighbor.len());
        let window = &windows[rng.random_range(0..windows.len())];
        let duration = neighbor[i].end_min - neighbor[i].start_min;
        if window.duration_min() < duration {
            return None;
        }
        let max_start = window.end_min - duration;
        let start = rng.random_range(window.start_min..=max_start);
        neighbor[i].date_ms = window.date_ms;
        neighbor[i].start_min = start;
        neighbor[i].end_min = start + duration;
    }
    Some(neighbor)
}

/// Window containment, per-date no-overlap and dependency order for every
/// assignment in the state.
fn is_feasible(
    state: &[Assignment],
    task_by_id: &HashMap<i64, &TaskInput>,
    windows: &[Window],
) -> bool {
    let by_id: HashMap<i64, &Assignment> = state.iter().map(|a| (a.task_id, a)).collect();

    for (i, a) in state.iter().enumerate() {
        if !windows
            .iter()
            .any(|w| w.contains(a.date_ms, a.start_min, a.end_min))
        {
            return false;
        }

        for other in &state[i + 1..] {
            if gaps::overlaps(a, other) {
                return false;
            }
        }

        if let Some(task) = task_by_id.get(&a.task_id) {
            for dep_id in &task.depends_on {
                if let Some(dep) = by_id.get(dep_id) {
                    if dep.date_ms > a.date_ms
                        || (dep.date_ms == a.date_ms && dep.end_min > a.start_min)
                    {
                        return false;
                    }
                }
            }
        }
    }
    true
}

/// Annealing objective: weighted priority of scheduled tasks, minus
/// weighted lateness, minus the fragmentation percentage, plus a flat
/// coverage reward. Higher is better.
fn objective(
    state: &[Assignment],
    task_by_id: &HashMap<i64, &TaskInput>,
    windows: &[Window],
    weights: &Weights,
) -> f64 {
    let mut score = 0.0;

    for a in state {
        let Some(task) = task_by_id.get(&a.task_id) else {
            continue;
        };
        score += task.priority_or_zero() * weights.priority_or_default();
        let late = scoring::lateness_hours(task, a.date_ms, a.end_min);
        score -= late * scoring::LATE_PENALTY_PER_HOUR * weights.deadline_or_default();
    }

    score -= gaps::fragmentation(windows, state, SLIVER_MIN) * FRAGMENTATION_WEIGHT;
    score += state.len() as f64 * COVERAGE_BONUS;
    score
}
