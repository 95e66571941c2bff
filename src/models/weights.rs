//! Objective weight coefficients.

use serde::{Deserialize, Serialize};

/// Named coefficients controlling the scheduling objective.
///
/// Every weight is optional; a missing priority or deadline weight resolves
/// to 1.0. The context-switch, fatigue and enjoyment weights are part of the
/// contract but are not consumed by the linear objectives, which keep only
/// the priority and deadline terms for tractability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Weights {
    /// Weight of the priority term.
    pub priority: Option<f64>,
    /// Weight of the deadline-lateness penalty.
    pub deadline: Option<f64>,
    /// Weight of the context-switch cost.
    pub context_switch: Option<f64>,
    /// Weight of the fatigue penalty.
    pub fatigue: Option<f64>,
    /// Weight of the enjoyment term.
    pub enjoyment: Option<f64>,
}

impl Weights {
    /// Creates weights with all coefficients unset (neutral defaults).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the priority weight.
    pub fn with_priority(mut self, w: f64) -> Self {
        self.priority = Some(w);
        self
    }

    /// Sets the deadline weight.
    pub fn with_deadline(mut self, w: f64) -> Self {
        self.deadline = Some(w);
        self
    }

    /// Sets the context-switch weight.
    pub fn with_context_switch(mut self, w: f64) -> Self {
        self.context_switch = Some(w);
        self
    }

    /// Sets the fatigue weight.
    pub fn with_fatigue(mut self, w: f64) -> Self {
        self.fatigue = Some(w);
        self
    }

    /// Sets the enjoyment weight.
    pub fn with_enjoyment(mut self, w: f64) -> Self {
        self.enjoyment = Some(w);
        self
    }

    /// Priority weight, defaulting to 1.0.
    #[inline]
    pub fn priority_or_default(&self) -> f64 {
        self.priority.unwrap_or(1.0)
    }

    /// Deadline weight, defaulting to 1.0.
    #[inline]
    pub fn deadline_or_default(&self) -> f64 {
        self.deadline.unwrap_or(1.0)
    }
}
