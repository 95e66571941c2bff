//! Size-based strategy selection with availability fallbacks.

use serde::{Deserialize, Serialize};

use crate::models::Window;

use super::optimal::estimate_slot_count;
use super::{
    CpSatStrategy, HeuristicStrategy, LocalSearchStrategy, MilpStrategy, SchedulingStrategy,
};

/// Which scheduling algorithm to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyType {
    /// Gap-based greedy placement.
    Heuristic,
    /// Slot-discretized mixed-integer program.
    Milp,
    /// Constraint-programming search.
    CpSat,
    /// Simulated annealing over the greedy plan.
    LocalSearch,
    /// Pick by instance size via [`StrategySelector::select_for`].
    Auto,
}

/// Owns one instance of every strategy and picks between them.
///
/// Selection by task count: above 100 only the heuristic scales; 31-100
/// goes to CP when available and within caps; 20-30 to MILP likewise;
/// anything smaller is fastest through the heuristic.
#[derive(Debug, Default)]
pub struct StrategySelector {
    heuristic: HeuristicStrategy,
    milp: MilpStrategy,
    cpsat: CpSatStrategy,
    local_search: LocalSearchStrategy,
}

impl StrategySelector {
    /// Creates a selector with all strategies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a strategy type, falling back when a backend is missing:
    /// MILP falls back to the heuristic, CP to MILP and then the
    /// heuristic. `Auto` without size information resolves to the
    /// heuristic; use [`StrategySelector::select_for`] when counts are
    /// known.
    pub fn create(&self, ty: StrategyType) -> &dyn SchedulingStrategy {
        match ty {
            StrategyType::Heuristic => &self.heuristic,
            StrategyType::LocalSearch => &self.local_search,
            StrategyType::Milp => {
                if self.milp.is_available() {
                    &self.milp
                } else {
                    tracing::warn!("MILP not available, falling back to heuristic");
                    &self.heuristic
                }
            }
            StrategyType::CpSat => {
                if self.cpsat.is_available() {
                    &self.cpsat
                } else if self.milp.is_available() {
                    tracing::warn!("CP-SAT not available, falling back to MILP");
                    &self.milp
                } else {
                    tracing::warn!("CP-SAT and MILP not available, falling back to heuristic");
                    &self.heuristic
                }
            }
            StrategyType::Auto => self.select_for(0, 0),
        }
    }

    /// Picks the best strategy for an instance size.
    pub fn select_for(&self, task_count: usize, slot_count: usize) -> &dyn SchedulingStrategy {
        if task_count > 100 {
            tracing::info!(task_count, "selected heuristic (task count > 100)");
            return &self.heuristic;
        }
        if task_count > 30 && self.cpsat.is_available() && slot_count <= 1000 {
            tracing::info!(task_count, slot_count, "selected CP-SAT");
            return &self.cpsat;
        }
        if (20..=30).contains(&task_count)
            && self.milp.is_available()
            && slot_count <= 500
            && task_count * slot_count <= 15_000
        {
            tracing::info!(task_count, slot_count, "selected MILP");
            return &self.milp;
        }
        tracing::info!(task_count, "selected heuristic");
        &self.heuristic
    }

    /// Available strategies in fallback order: CP, MILP, then the
    /// always-available heuristic.
    pub fn fallback_chain(&self) -> Vec<&dyn SchedulingStrategy> {
        let mut chain: Vec<&dyn SchedulingStrategy> = Vec::new();
        if self.cpsat.is_available() {
            chain.push(&self.cpsat);
        }
        if self.milp.is_available() {
            chain.push(&self.milp);
        }
        chain.push(&self.heuristic);
        chain
    }

    /// Estimated slot count of an instance, for [`Self::select_for`].
    pub fn slot_count(windows: &[Window], slot_min: i32) -> usize {
        estimate_slot_count(windows, slot_min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_size() {
        let selector = StrategySelector::new();
        assert_eq!(selector.select_for(5, 100).name(), "heuristic");
        assert_eq!(selector.select_for(25, 100).name(), "milp");
        assert_eq!(selector.select_for(50, 100).name(), "cpsat");
        assert_eq!(selector.select_for(150, 100).name(), "heuristic");
    }

    #[test]
    fn test_caps_push_back_to_heuristic() {
        let selector = StrategySelector::new();
        // 25 tasks but a slot count past the MILP cap.
        assert_eq!(selector.select_for(25, 2000).name(), "heuristic");
        // 50 tasks but past the CP slot cap.
        assert_eq!(selector.select_for(50, 2000).name(), "heuristic");
    }

    #[test]
    fn test_create_explicit() {
        let selector = StrategySelector::new();
        assert_eq!(selector.create(StrategyType::Heuristic).name(), "heuristic");
        assert_eq!(
            selector.create(StrategyType::LocalSearch).name(),
            "local_search"
        );
        assert_eq!(selector.create(StrategyType::Milp).name(), "milp");
        assert_eq!(selector.create(StrategyType::CpSat).name(), "cpsat");
        assert_eq!(selector.create(StrategyType::Auto).name(), "heuristic");
    }

    #[test]
    fn test_fallback_chain_ends_with_heuristic() {
        let selector = StrategySelector::new();
        let chain = selector.fallback_chain();
        assert!(!chain.is_empty());
        assert_eq!(chain.last().unwrap().name(), "heuristic");
    }

    #[test]
    fn test_slot_count() {
        let windows = vec![Window::new(0, 540, 1020)];
        assert_eq!(StrategySelector::slot_count(&windows, 15), 32);
    }

    #[test]
    fn test_strategy_type_serde() {
        let json = serde_json::to_string(&StrategyType::CpSat).unwrap();
        assert_eq!(json, "\"cp_sat\"");
        let back: StrategyType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StrategyType::CpSat);
    }
}
