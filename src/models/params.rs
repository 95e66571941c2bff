//! Solver tuning parameters.

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Default discretization unit for slot-based strategies (minutes).
pub const DEFAULT_SLOT_MIN: i32 = 15;
/// Default per-solve wall-clock budget (ms).
pub const DEFAULT_MAX_TIME_MS: u64 = 30_000;
/// Default local-search iteration cap.
pub const DEFAULT_MAX_ITERATIONS: u32 = 1_000;
/// Default simulated-annealing starting temperature.
pub const DEFAULT_INITIAL_TEMPERATURE: f64 = 1_000.0;
/// Default simulated-annealing geometric cooling rate.
pub const DEFAULT_COOLING_RATE: f64 = 0.95;

/// Tuning knobs shared by all strategies.
///
/// The time budget is propagated unmodified to the underlying solver; the
/// engine performs no cancellation of its own. Annealing parameters apply
/// only to the local-search strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Slot granularity in minutes for the MILP discretization.
    pub slot_min: i32,
    /// Wall-clock solve budget in milliseconds.
    pub max_time_ms: u64,
    /// Maximum local-search iterations.
    pub max_iterations: u32,
    /// Simulated-annealing starting temperature.
    pub initial_temperature: f64,
    /// Geometric cooling rate in (0, 1).
    pub cooling_rate: f64,
    /// RNG seed for the local-search strategy. `None` = nondeterministic.
    pub seed: Option<u64>,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            slot_min: DEFAULT_SLOT_MIN,
            max_time_ms: DEFAULT_MAX_TIME_MS,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            initial_temperature: DEFAULT_INITIAL_TEMPERATURE,
            cooling_rate: DEFAULT_COOLING_RATE,
            seed: None,
        }
    }
}

impl Params {
    /// Creates parameters with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the slot granularity (minutes).
    pub fn with_slot_min(mut self, slot_min: i32) -> Self {
        self.slot_min = slot_min;
        self
    }

    /// Sets the wall-clock budget (ms).
    pub fn with_max_time_ms(mut self, max_time_ms: u64) -> Self {
        self.max_time_ms = max_time_ms;
        self
    }

    /// Sets the local-search iteration cap.
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the annealing starting temperature.
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    /// Sets the annealing cooling rate.
    pub fn with_cooling_rate(mut self, rate: f64) -> Self {
        self.cooling_rate = rate;
        self
    }

    /// Sets the local-search RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks numeric configuration invariants.
    ///
    /// These are the only conditions in the engine that surface as hard
    /// errors instead of unscheduled reasons.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.slot_min < 1 {
            return Err(ScheduleError::InvalidParams(format!(
                "slot_min must be >= 1, got {}",
                self.slot_min
            )));
        }
        if self.max_time_ms == 0 {
            return Err(ScheduleError::InvalidParams(
                "max_time_ms must be >= 1".into(),
            ));
        }
        if self.initial_temperature <= 0.0 || !self.initial_temperature.is_finite() {
            return Err(ScheduleError::InvalidParams(format!(
                "initial_temperature must be positive and finite, got {}",
                self.initial_temperature
            )));
        }
        if !(self.cooling_rate > 0.0 && self.cooling_rate < 1.0) {
            return Err(ScheduleError::InvalidParams(format!(
                "cooling_rate must lie in (0, 1), got {}",
                self.cooling_rate
            )));
        }
        Ok(())
    }
}
