//! Availability window model.
//!
//! A window is a contiguous block of available time on one date. The gap
//! calculus ([`crate::gaps`]) reuses this type to represent free
//! sub-intervals of a window.

use serde::{Deserialize, Serialize};

/// A contiguous available interval on a single date.
///
/// `start_min`/`end_min` are minutes since midnight with `start < end`.
/// Windows given to the engine are assumed pairwise non-overlapping;
/// caller-supplied overlapping windows are not merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Window {
    /// Day identifier (epoch ms at a coarse, per-day resolution).
    pub date_ms: i64,
    /// Start minute of day.
    pub start_min: i32,
    /// End minute of day (exclusive).
    pub end_min: i32,
    /// Whether this window is reserved for deep, focused work.
    pub deep_work: bool,
}

impl Window {
    /// Creates a new window.
    pub fn new(date_ms: i64, start_min: i32, end_min: i32) -> Self {
        Self {
            date_ms,
            start_min,
            end_min,
            deep_work: false,
        }
    }

    /// Marks this window as a deep-work window.
    pub fn with_deep_work(mut self, deep_work: bool) -> Self {
        self.deep_work = deep_work;
        self
    }

    /// Window span in minutes.
    #[inline]
    pub fn duration_min(&self) -> i32 {
        self.end_min - self.start_min
    }

    /// Whether `[start_min, end_min)` lies entirely inside this window
    /// on the same date.
    pub fn contains(&self, date_ms: i64, start_min: i32, end_min: i32) -> bool {
        self.date_ms == date_ms && start_min >= self.start_min && end_min <= self.end_min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_duration() {
        // 9:00-17:00
        let w = Window::new(0, 540, 1020);
        assert_eq!(w.duration_min(), 480);
        assert!(!w.deep_work);
    }

    #[test]
    fn test_window_contains() {
        let w = Window::new(100, 540, 1020);
        assert!(w.contains(100, 540, 600));
        assert!(w.contains(100, 960, 1020));
        assert!(!w.contains(100, 500, 600));
        assert!(!w.contains(100, 1000, 1030));
        assert!(!w.contains(200, 540, 600)); // wrong date
    }

    #[test]
    fn test_deep_work_flag() {
        let w = Window::new(0, 540, 720).with_deep_work(true);
        assert!(w.deep_work);
    }
}
