//! Gap-based greedy strategy.
//!
//! Places tasks one at a time, in dependency order, into the free gap
//! position with the highest utility after a fragmentation charge. Fast,
//! deterministic and always available; it also seeds the local-search
//! strategy.

use std::collections::{HashMap, HashSet};

use crate::error::ScheduleError;
use crate::gaps;
use crate::graph;
use crate::models::{
    Assignment, Params, PlanResult, TaskInput, Unscheduled, Weights, Window,
    REASON_DEPENDENCY_CYCLE, REASON_DEPENDENCY_UNSCHEDULED, REASON_NO_GAP,
};
use crate::scoring::{self, SLIVER_MIN};

use super::SchedulingStrategy;

/// Minimum slack before a mid-gap candidate position is considered.
const MID_POSITION_SLACK_MIN: i32 = 30;

/// Deterministic gap-based greedy scheduler.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicStrategy;

impl HeuristicStrategy {
    /// Creates the strategy.
    pub fn new() -> Self {
        Self
    }
}

struct Candidate {
    window: Window,
    start_min: i32,
    end_min: i32,
    utility: f64,
}

impl SchedulingStrategy for HeuristicStrategy {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn schedule(
        &self,
        tasks: &[TaskInput],
        windows: &[Window],
        weights: &Weights,
        params: &Params,
    ) -> Result<PlanResult, ScheduleError> {
        params.validate()?;

        let topo = graph::topological_order(tasks);
        if !topo.cyclic.is_empty() {
            tracing::warn!(
                tasks = tasks.len(),
                cyclic = topo.cyclic.len(),
                "dependency cycle, whole batch unscheduled"
            );
            return Ok(PlanResult {
                assignments: Vec::new(),
                unscheduled: tasks
                    .iter()
                    .map(|t| Unscheduled::new(t.task_id, REASON_DEPENDENCY_CYCLE))
                    .collect(),
                total_score: 0.0,
            });
        }

        let mut assignments: Vec<Assignment> = Vec::new();
        let mut unscheduled: Vec<Unscheduled> = Vec::new();
        let mut failed_ids: HashSet<i64> = HashSet::new();
        let mut placed: HashMap<i64, Assignment> = HashMap::new();

        for &idx in &topo.order {
            let task = &tasks[idx];

            if graph::has_unscheduled_dependency(task, &failed_ids) {
                unscheduled.push(Unscheduled::new(task.task_id, REASON_DEPENDENCY_UNSCHEDULED));
                failed_ids.insert(task.task_id);
                continue;
            }

            match find_best_gap(task, windows, &assignments, &placed, weights) {
                Some(best) => {
                    let assignment = Assignment {
                        task_id: task.task_id,
                        date_ms: best.window.date_ms,
                        start_min: best.start_min,
                        end_min: best.end_min,
                        utility: best.utility,
                    };
                    tracing::debug!(
                        task_id = task.task_id,
                        start_min = best.start_min,
                        end_min = best.end_min,
                        utility = best.utility,
                        "placed task"
                    );
                    placed.insert(task.task_id, assignment.clone());
                    assignments.push(assignment);
                }
                None => {
                    unscheduled.push(Unscheduled::new(task.task_id, REASON_NO_GAP));
                    failed_ids.insert(task.task_id);
                }
            }
        }

        let fragmentation = gaps::fragmentation(windows, &assignments, SLIVER_MIN);
        let total_score = assignments.iter().map(|a| a.utility).sum();
        tracing::info!(
            placed = assignments.len(),
            unscheduled = unscheduled.len(),
            fragmentation_pct = fragmentation,
            "heuristic schedule complete"
        );

        Ok(PlanResult {
            assignments,
            unscheduled,
            total_score,
        })
    }
}

/// Scans every gap on every dependency-feasible date and keeps the best
/// scoring placement. Returns `None` when no gap fits the task.
fn find_best_gap(
    task: &TaskInput,
    windows: &[Window],
    assignments: &[Assignment],
    placed: &HashMap<i64, Assignment>,
    weights: &Weights,
) -> Option<Candidate> {
    let mut best: Option<Candidate> = None;
    let duration = task.duration_min;

    for window in windows {
        if !graph::can_schedule_on_date(task, window.date_ms, placed) {
            continue;
        }

        let min_start = graph::earliest_start_on_date(task, window.date_ms, placed);

        for gap in gaps::calculate_gaps(std::slice::from_ref(window), assignments) {
            let gap_start = gap.start_min.max(min_start);
            if gap.end_min - gap_start < duration {
                continue;
            }

            for start_min in candidate_positions(gap_start, gap.end_min, duration) {
                let end_min = start_min + duration;
                let utility = scoring::utility(task, window, end_min, weights)
                    - scoring::fragmentation_penalty(
                        gap.start_min,
                        gap.end_min,
                        start_min,
                        end_min,
                    );

                if best.as_ref().map_or(true, |b| utility > b.utility) {
                    best = Some(Candidate {
                        window: window.clone(),
                        start_min,
                        end_min,
                        utility,
                    });
                }
            }
        }
    }

    best
}

/// Candidate starts inside `[gap_start, gap_end)`: the gap start, the
/// midpoint when there is enough slack, and the latest possible start.
fn candidate_positions(gap_start: i32, gap_end: i32, duration: i32) -> Vec<i32> {
    let mut positions = vec![gap_start];
    let gap_duration = gap_end - gap_start;
    if gap_duration >= duration + MID_POSITION_SLACK_MIN {
        positions.push(gap_start + (gap_duration - duration) / 2);
    }
    let last = gap_end - duration;
    if last > gap_start {
        positions.push(last);
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 1_735_516_800_000;
    const NEXT_DAY: i64 = DAY + 86_400_000;

    fn run(tasks: &[TaskInput], windows: &[Window]) -> PlanResult {
        HeuristicStrategy::new()
            .schedule(tasks, windows, &Weights::new(), &Params::default())
            .unwrap()
    }

    fn assert_no_overlaps(plan: &PlanResult) {
        for (i, a) in plan.assignments.iter().enumerate() {
            for b in &plan.assignments[i + 1..] {
                assert!(!gaps::overlaps(a, b), "{a:?} overlaps {b:?}");
            }
        }
    }

    fn assert_contained(plan: &PlanResult, windows: &[Window]) {
        for a in &plan.assignments {
            assert!(
                windows
                    .iter()
                    .any(|w| w.contains(a.date_ms, a.start_min, a.end_min)),
                "{a:?} escapes all windows"
            );
        }
    }

    #[test]
    fn test_workday_example() {
        // 9:00-17:00, three tasks that all fit.
        let windows = vec![Window::new(DAY, 540, 1020)];
        let tasks = vec![
            TaskInput::new(1, 90).with_priority(5.0),
            TaskInput::new(2, 60).with_priority(3.0),
            TaskInput::new(3, 120).with_priority(4.0),
        ];
        let plan = run(&tasks, &windows);
        assert!(plan.is_fully_scheduled());
        assert_eq!(plan.assignments.len(), 3);
        assert_no_overlaps(&plan);
        assert_contained(&plan, &windows);
    }

    #[test]
    fn test_oversized_task_unscheduled() {
        let windows = vec![Window::new(DAY, 540, 600)];
        let tasks = vec![TaskInput::new(1, 120)];
        let plan = run(&tasks, &windows);
        assert!(plan.assignments.is_empty());
        assert_eq!(plan.unscheduled[0].reason, REASON_NO_GAP);
    }

    #[test]
    fn test_partition_invariant() {
        let windows = vec![Window::new(DAY, 540, 660)];
        let tasks = vec![
            TaskInput::new(1, 60),
            TaskInput::new(2, 60),
            TaskInput::new(3, 60), // does not fit
        ];
        let plan = run(&tasks, &windows);
        let mut seen: Vec<i64> = plan
            .assignments
            .iter()
            .map(|a| a.task_id)
            .chain(plan.unscheduled.iter().map(|u| u.task_id))
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn test_cycle_fails_whole_batch() {
        let windows = vec![Window::new(DAY, 540, 1020)];
        let tasks = vec![
            TaskInput::new(1, 30).with_dependencies(vec![2]),
            TaskInput::new(2, 30).with_dependencies(vec![1]),
        ];
        let plan = run(&tasks, &windows);
        assert!(plan.assignments.is_empty());
        assert_eq!(plan.unscheduled.len(), 2);
        assert!(plan
            .unscheduled
            .iter()
            .all(|u| u.reason == REASON_DEPENDENCY_CYCLE));
    }

    #[test]
    fn test_dependency_order_same_date() {
        let windows = vec![Window::new(DAY, 540, 1020)];
        let tasks = vec![
            TaskInput::new(1, 60),
            TaskInput::new(2, 60).with_dependencies(vec![1]),
        ];
        let plan = run(&tasks, &windows);
        assert!(plan.is_fully_scheduled());
        let a1 = plan.assignment_for(1).unwrap();
        let a2 = plan.assignment_for(2).unwrap();
        assert!(a2.date_ms > a1.date_ms || a2.start_min >= a1.end_min);
    }

    #[test]
    fn test_dependency_never_placed_on_earlier_date() {
        let windows = vec![Window::new(DAY, 540, 600), Window::new(NEXT_DAY, 540, 1020)];
        let tasks = vec![
            // Too long for the first day, lands on the second.
            TaskInput::new(1, 120),
            TaskInput::new(2, 30).with_dependencies(vec![1]),
        ];
        let plan = run(&tasks, &windows);
        assert!(plan.is_fully_scheduled());
        let a1 = plan.assignment_for(1).unwrap();
        let a2 = plan.assignment_for(2).unwrap();
        assert_eq!(a1.date_ms, NEXT_DAY);
        assert!(a2.date_ms >= a1.date_ms);
        if a2.date_ms == a1.date_ms {
            assert!(a2.start_min >= a1.end_min);
        }
    }

    #[test]
    fn test_failed_dependency_propagates() {
        let windows = vec![Window::new(DAY, 540, 600)];
        let tasks = vec![
            TaskInput::new(1, 120), // cannot fit
            TaskInput::new(2, 30).with_dependencies(vec![1]),
        ];
        let plan = run(&tasks, &windows);
        assert_eq!(
            plan.unscheduled
                .iter()
                .find(|u| u.task_id == 2)
                .unwrap()
                .reason,
            REASON_DEPENDENCY_UNSCHEDULED
        );
    }

    #[test]
    fn test_deadline_pressure_prefers_early_finish() {
        // Tight deadline at 11:00: the task must not drift late in the day.
        let windows = vec![Window::new(DAY, 540, 1020)];
        let tasks = vec![TaskInput::new(1, 60)
            .with_priority(1.0)
            .with_deadline(DAY + 660 * 60_000)];
        let plan = run(&tasks, &windows);
        let a = plan.assignment_for(1).unwrap();
        assert!(a.end_min <= 660, "task finished at {} past deadline", a.end_min);
    }

    #[test]
    fn test_deep_work_window_attracts_high_effort() {
        let windows = vec![
            Window::new(DAY, 540, 720),
            Window::new(DAY, 780, 960).with_deep_work(true),
        ];
        let tasks = vec![TaskInput::new(1, 60).with_priority(1.0).with_effort(0.9)];
        let plan = run(&tasks, &windows);
        let a = plan.assignment_for(1).unwrap();
        assert!(a.start_min >= 780, "high-effort task skipped the deep-work window");
    }

    #[test]
    fn test_deterministic() {
        let windows = vec![Window::new(DAY, 540, 1020), Window::new(NEXT_DAY, 540, 720)];
        let tasks: Vec<TaskInput> = (1..=6)
            .map(|i| TaskInput::new(i, 60).with_priority(i as f64))
            .collect();
        let first = run(&tasks, &windows);
        let second = run(&tasks, &windows);
        assert_eq!(first.assignments, second.assignments);
        assert_eq!(first.unscheduled, second.unscheduled);
    }

    #[test]
    fn test_empty_inputs() {
        let plan = run(&[], &[Window::new(DAY, 540, 1020)]);
        assert!(plan.assignments.is_empty());
        assert!(plan.unscheduled.is_empty());

        let plan = run(&[TaskInput::new(1, 30)], &[]);
        assert_eq!(plan.unscheduled.len(), 1);
        assert_eq!(plan.unscheduled[0].reason, REASON_NO_GAP);
    }
}
