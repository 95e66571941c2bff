//! Task input model.
//!
//! A task is an indivisible unit of work to be placed into a single
//! contiguous time interval. Tasks carry scheduling metadata (priority,
//! deadline, dependencies) and soft attributes (effort, enjoyability)
//! used by the utility function.

use serde::{Deserialize, Serialize};

/// A task to be scheduled.
///
/// Immutable for the duration of one scheduling call. Dependency ids may
/// reference tasks outside the current batch; such dependencies are treated
/// as already satisfied.
///
/// # Time Representation
/// Durations are in minutes. Deadlines are absolute epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInput {
    /// Unique task identifier.
    pub task_id: i64,
    /// Processing duration in minutes (> 0).
    pub duration_min: i32,
    /// Priority score (unitless weight, higher = more important).
    pub priority_score: Option<f64>,
    /// Latest completion instant (epoch ms). `None` = no deadline.
    pub deadline_ms: Option<i64>,
    /// Ids of tasks that must finish before this one starts.
    pub depends_on: Vec<i64>,
    /// Effort level in 0..1; values above 0.7 match deep-work windows.
    pub effort: Option<f64>,
    /// Signed enjoyability scalar.
    pub enjoyability: Option<f64>,
}

impl TaskInput {
    /// Creates a new task with the given id and duration.
    pub fn new(task_id: i64, duration_min: i32) -> Self {
        Self {
            task_id,
            duration_min,
            priority_score: None,
            deadline_ms: None,
            depends_on: Vec::new(),
            effort: None,
            enjoyability: None,
        }
    }

    /// Sets the priority score.
    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority_score = Some(priority);
        self
    }

    /// Sets the deadline (epoch ms).
    pub fn with_deadline(mut self, deadline_ms: i64) -> Self {
        self.deadline_ms = Some(deadline_ms);
        self
    }

    /// Sets the dependency task ids.
    pub fn with_dependencies(mut self, depends_on: Vec<i64>) -> Self {
        self.depends_on = depends_on;
        self
    }

    /// Sets the effort level (clamped to 0..1).
    pub fn with_effort(mut self, effort: f64) -> Self {
        self.effort = Some(effort.clamp(0.0, 1.0));
        self
    }

    /// Sets the enjoyability scalar.
    pub fn with_enjoyability(mut self, enjoyability: f64) -> Self {
        self.enjoyability = Some(enjoyability);
        self
    }

    /// Whether this task has any dependencies.
    pub fn has_dependencies(&self) -> bool {
        !self.depends_on.is_empty()
    }

    /// Priority score, defaulting to 0.0 when unset.
    #[inline]
    pub fn priority_or_zero(&self) -> f64 {
        self.priority_score.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_builder() {
        let task = TaskInput::new(7, 90)
            .with_priority(5.0)
            .with_deadline(1_735_516_800_000)
            .with_dependencies(vec![1, 2])
            .with_effort(0.8)
            .with_enjoyability(-0.5);

        assert_eq!(task.task_id, 7);
        assert_eq!(task.duration_min, 90);
        assert_eq!(task.priority_score, Some(5.0));
        assert_eq!(task.deadline_ms, Some(1_735_516_800_000));
        assert_eq!(task.depends_on, vec![1, 2]);
        assert_eq!(task.effort, Some(0.8));
        assert_eq!(task.enjoyability, Some(-0.5));
        assert!(task.has_dependencies());
    }

    #[test]
    fn test_effort_clamped() {
        let task = TaskInput::new(1, 30).with_effort(1.5);
        assert_eq!(task.effort, Some(1.0));
    }

    #[test]
    fn test_defaults() {
        let task = TaskInput::new(1, 30);
        assert!(!task.has_dependencies());
        assert_eq!(task.priority_or_zero(), 0.0);
        assert!(task.deadline_ms.is_none());
    }
}
