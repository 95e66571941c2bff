//! Placement utility scoring.
//!
//! The utility of a placement combines three terms: the weighted priority
//! of the task, a deadline term (bonus when on time, linear-in-hours
//! penalty when late) and a flat deep-work bonus when a high-effort task
//! lands in a deep-work window. A separate fragmentation penalty charges
//! placements that leave unusable slivers at either edge of the gap they
//! consume.

use crate::models::{TaskInput, Weights, Window};

/// Per-hour lateness penalty coefficient.
pub const LATE_PENALTY_PER_HOUR: f64 = 10.0;
/// Flat bonus for finishing on or before the deadline.
pub const ON_TIME_BONUS: f64 = 5.0;
/// Flat bonus for a high-effort task in a deep-work window.
pub const DEEP_WORK_BONUS: f64 = 20.0;
/// Effort level above which a task counts as high-effort.
pub const DEEP_WORK_EFFORT_THRESHOLD: f64 = 0.7;
/// Leftover slivers strictly shorter than this are charged as unusable.
pub const SLIVER_MIN: i32 = 15;
/// Flat charge per unusable sliver.
pub const SLIVER_PENALTY: f64 = 5.0;
/// Linear charge per sliver minute (capped at [`SLIVER_MIN`] per side).
pub const SLIVER_PENALTY_PER_MIN: f64 = 0.1;

/// Hours the task finishes past its deadline, floored at zero.
///
/// Completion instant is `date_ms + end_min` converted to milliseconds.
/// Returns 0.0 for tasks without a deadline.
pub fn lateness_hours(task: &TaskInput, date_ms: i64, end_min: i32) -> f64 {
    let Some(deadline_ms) = task.deadline_ms else {
        return 0.0;
    };
    let completion_ms = date_ms + i64::from(end_min) * 60_000;
    let late_ms = completion_ms - deadline_ms;
    if late_ms > 0 {
        late_ms as f64 / 3_600_000.0
    } else {
        0.0
    }
}

/// Utility of `task` finishing at `end_min` inside `window`.
pub fn utility(
    task: &TaskInput,
    window: &Window,
    end_min: i32,
    weights: &Weights,
) -> f64 {
    let mut score = task.priority_or_zero() * weights.priority_or_default();

    if task.deadline_ms.is_some() {
        let late = lateness_hours(task, window.date_ms, end_min);
        if late > 0.0 {
            score -= late * LATE_PENALTY_PER_HOUR * weights.deadline_or_default();
        } else {
            score += ON_TIME_BONUS;
        }
    }

    if window.deep_work && task.effort.map_or(false, |e| e > DEEP_WORK_EFFORT_THRESHOLD) {
        score += DEEP_WORK_BONUS;
    }

    score
}

/// Fragmentation charge for carving `[start_min, end_min)` out of the free
/// interval `[gap_start, gap_end)`.
///
/// Each leftover side strictly inside `(0, SLIVER_MIN)` minutes incurs a
/// flat [`SLIVER_PENALTY`]; both sides additionally incur
/// [`SLIVER_PENALTY_PER_MIN`] per leftover minute, capped at
/// [`SLIVER_MIN`] minutes per side. An exact fit costs nothing.
pub fn fragmentation_penalty(gap_start: i32, gap_end: i32, start_min: i32, end_min: i32) -> f64 {
    let left = start_min - gap_start;
    let right = gap_end - end_min;
    let mut penalty = 0.0;
    for leftover in [left, right] {
        if leftover > 0 && leftover < SLIVER_MIN {
            penalty += SLIVER_PENALTY;
        }
        penalty += SLIVER_PENALTY_PER_MIN * f64::from(leftover.min(SLIVER_MIN).max(0));
    }
    penalty
}
