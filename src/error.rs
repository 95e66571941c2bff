//! Error types.

use thiserror::Error;

/// Hard failures of a scheduling call.
///
/// Per-task placement failures never surface here; they are reported as
/// unscheduled entries in the plan. Errors are reserved for malformed
/// configuration.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Numeric parameters violate a documented bound.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
}
