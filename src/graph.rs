//! Dependency graph utilities.
//!
//! Kahn's algorithm over the in-batch dependency graph, with a
//! deterministic ready-queue order so equal instances always produce the
//! same schedule. Dependencies on ids outside the batch are treated as
//! already satisfied.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::models::{Assignment, TaskInput};

/// Result of ordering a batch of tasks by dependencies.
#[derive(Debug, Clone)]
pub struct TopoResult {
    /// Indices into the input slice, in a dependency-consistent order.
    pub order: Vec<usize>,
    /// Indices of tasks on or downstream of a dependency cycle.
    pub cyclic: Vec<usize>,
}

fn ready_key(task: &TaskInput) -> (i64, f64) {
    (
        task.deadline_ms.unwrap_or(i64::MAX),
        -task.priority_or_zero(),
    )
}

fn ready_cmp(tasks: &[TaskInput], a: usize, b: usize) -> Ordering {
    let (da, pa) = ready_key(&tasks[a]);
    let (db, pb) = ready_key(&tasks[b]);
    da.cmp(&db)
        .then(pa.partial_cmp(&pb).unwrap_or(Ordering::Equal))
        .then(a.cmp(&b))
}

/// Orders tasks so every task follows all of its in-batch dependencies.
///
/// Among tasks whose dependencies are all satisfied, the earliest deadline
/// goes first (no deadline sorts last), then the higher priority, then the
/// lower input index. Tasks that can never become ready (members of a
/// cycle, and anything depending on them) land in `cyclic`, in input
/// order.
pub fn topological_order(tasks: &[TaskInput]) -> TopoResult {
    let index_by_id: HashMap<i64, usize> = tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (t.task_id, i))
        .collect();

    let mut in_degree = vec![0usize; tasks.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (i, task) in tasks.iter().enumerate() {
        for dep_id in &task.depends_on {
            if let Some(&dep_idx) = index_by_id.get(dep_id) {
                in_degree[i] += 1;
                dependents[dep_idx].push(i);
            }
        }
    }

    let mut ready: Vec<usize> = (0..tasks.len()).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(tasks.len());

    while !ready.is_empty() {
        let pick = ready
            .iter()
            .enumerate()
            .min_by(|(_, &a), (_, &b)| ready_cmp(tasks, a, b))
            .map(|(pos, _)| pos)
            .unwrap_or(0);
        let i = ready.swap_remove(pick);
        order.push(i);
        for &j in &dependents[i] {
            in_degree[j] -= 1;
            if in_degree[j] == 0 {
                ready.push(j);
            }
        }
    }

    let cyclic: Vec<usize> = (0..tasks.len()).filter(|&i| in_degree[i] > 0).collect();
    TopoResult { order, cyclic }
}

/// Whether any in-batch dependency of `task` already failed to schedule.
pub fn has_unscheduled_dependency(task: &TaskInput, failed_ids: &HashSet<i64>) -> bool {
    task.depends_on.iter().any(|id| failed_ids.contains(id))
}

/// Whether `task` may be placed on `date_ms` given where its in-batch
/// dependencies landed.
///
/// Every already-placed dependency must sit on this date or an earlier one.
/// A dependency missing from `placed` (out of batch, or not yet placed)
/// does not block the date.
pub fn can_schedule_on_date(
    task: &TaskInput,
    date_ms: i64,
    placed: &HashMap<i64, Assignment>,
) -> bool {
    task.depends_on.iter().all(|dep_id| {
        placed
            .get(dep_id)
            .map_or(true, |dep| dep.date_ms <= date_ms)
    })
}

/// Earliest start minute for `task` on `date_ms`: the latest end of any
/// dependency placed on the same date, or 0 when none constrain it.
pub fn earliest_start_on_date(
    task: &TaskInput,
    date_ms: i64,
    placed: &HashMap<i64, Assignment>,
) -> i32 {
    task.depends_on
        .iter()
        .filter_map(|dep_id| placed.get(dep_id))
        .filter(|dep| dep.date_ms == date_ms)
        .map(|dep| dep.end_min)
        .max()
        .unwrap_or(0)
}
