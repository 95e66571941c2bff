//! Branch-and-bound search for [`CpModel`].
//!
//! Depth-first search placing intervals in precedence order. At each node
//! the interval's candidate starts are the boundary positions of the free
//! regions left inside each candidate window, after same-date placements
//! and precedence lower bounds. An optimistic per-interval bound prunes
//! subtrees that cannot beat the incumbent; the wall-clock budget turns
//! an exhaustive run into an anytime one.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{CpModel, CpPlacement, CpSolution, CpSolver, CpStatus, SolverConfig};

/// Exhaustive-with-budget solver for disjunctive placement models.
#[derive(Debug, Default, Clone, Copy)]
pub struct BranchBoundSolver;

impl BranchBoundSolver {
    /// Creates the solver.
    pub fn new() -> Self {
        Self
    }
}

impl CpSolver for BranchBoundSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        if !model.is_valid() {
            return CpSolution::status_only(CpStatus::ModelInvalid);
        }
        if model.interval_count() == 0 {
            return CpSolution {
                status: CpStatus::Optimal,
                placements: HashMap::new(),
                objective: 0,
            };
        }

        let Some(order) = precedence_order(model) else {
            // A precedence cycle admits no placement order.
            return CpSolution::status_only(CpStatus::Infeasible);
        };

        let mut search = Search::new(model, &order, config.max_time_ms);
        search.run(0, 0);

        let status = match (&search.best, search.timed_out) {
            (Some(_), false) => CpStatus::Optimal,
            (Some(_), true) => CpStatus::Feasible,
            (None, false) => CpStatus::Infeasible,
            (None, true) => CpStatus::Unknown,
        };

        match search.best {
            Some((placements, objective)) => CpSolution {
                status,
                placements,
                objective,
            },
            None => CpSolution::status_only(status),
        }
    }
}

/// Kahn order over precedence edges, `None` on a cycle.
fn precedence_order(model: &CpModel) -> Option<Vec<usize>> {
    let n = model.interval_count();
    let mut in_degree = vec![0usize; n];
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
    for &(dep, child) in model.precedences() {
        in_degree[child] += 1;
        children[dep].push(child);
    }

    let mut queue: Vec<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = queue.pop() {
        order.push(i);
        for &c in &children[i] {
            in_degree[c] -= 1;
            if in_degree[c] == 0 {
                queue.push(c);
            }
        }
    }
    (order.len() == n).then_some(order)
}

struct Search<'a> {
    model: &'a CpModel,
    order: &'a [usize],
    deps_of: Vec<Vec<usize>>,
    // Optimistic objective contribution for order[k..], by suffix.
    ub_suffix: Vec<i64>,
    placements: HashMap<usize, CpPlacement>,
    best: Option<(HashMap<usize, CpPlacement>, i64)>,
    deadline: Instant,
    timed_out: bool,
}

impl<'a> Search<'a> {
    fn new(model: &'a CpModel, order: &'a [usize], max_time_ms: u64) -> Self {
        let mut deps_of = vec![Vec::new(); model.interval_count()];
        for &(dep, child) in model.precedences() {
            deps_of[child].push(dep);
        }

        // Per-interval optimistic contribution: the best coeff * start over
        // all candidate windows, ignoring every other constraint.
        let ub: Vec<i64> = model
            .intervals()
            .iter()
            .enumerate()
            .map(|(i, iv)| {
                let coeff = model.objective()[i];
                iv.candidates
                    .iter()
                    .map(|&w| {
                        let slot = &model.windows()[w];
                        let lo = coeff * i64::from(slot.start_min);
                        let hi = coeff * i64::from(slot.end_min - iv.duration);
                        lo.max(hi)
                    })
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let mut ub_suffix = vec![0i64; order.len() + 1];
        for k in (0..order.len()).rev() {
            ub_suffix[k] = ub_suffix[k + 1] + ub[order[k]];
        }

        Self {
            model,
            order,
            deps_of,
            ub_suffix,
            placements: HashMap::new(),
            best: None,
            deadline: Instant::now() + Duration::from_millis(max_time_ms),
            timed_out: false,
        }
    }

    fn run(&mut self, depth: usize, partial_objective: i64) {
        if self.timed_out {
            return;
        }
        if Instant::now() >= self.deadline {
            self.timed_out = true;
            return;
        }

        if depth == self.order.len() {
            let improved = self
                .best
                .as_ref()
                .map_or(true, |&(_, best)| partial_objective > best);
            if improved {
                self.best = Some((self.placements.clone(), partial_objective));
            }
            return;
        }

        if let Some((_, best)) = &self.best {
            if partial_objective + self.ub_suffix[depth] <= *best {
                return;
            }
        }

        let interval_idx = self.order[depth];
        let iv = &self.model.intervals()[interval_idx];
        let coeff = self.model.objective()[interval_idx];

        // Enumerate candidate (window, start) pairs, best contribution
        // first so good incumbents appear early.
        let mut moves: Vec<(usize, i32)> = Vec::new();
        for &w in &iv.candidates {
            if let Some(lb) = self.precedence_bound(interval_idx, w) {
                for region in self.free_regions(w, lb) {
                    if region.1 - region.0 >= iv.duration {
                        moves.push((w, region.0));
                        let last = region.1 - iv.duration;
                        if last != region.0 {
                            moves.push((w, last));
                        }
                    }
                }
            }
        }
        moves.sort_by_key(|&(_, start)| std::cmp::Reverse(coeff * i64::from(start)));

        for (window, start_min) in moves {
            self.placements
                .insert(interval_idx, CpPlacement { window, start_min });
            self.run(
                depth + 1,
                partial_objective + coeff * i64::from(start_min),
            );
            self.placements.remove(&interval_idx);
            if self.timed_out {
                return;
            }
        }
    }

    /// Lowest feasible start in window `w` under precedence, `None` when
    /// a dependency's date already rules the window out.
    fn precedence_bound(&self, interval_idx: usize, w: usize) -> Option<i32> {
        let slot = &self.model.windows()[w];
        let mut lb = slot.start_min;
        for &dep in &self.deps_of[interval_idx] {
            let placement = self.placements.get(&dep)?;
            let dep_slot = &self.model.windows()[placement.window];
            if dep_slot.date_ms > slot.date_ms {
                return None;
            }
            if dep_slot.date_ms == slot.date_ms {
                let dep_end = placement.start_min + self.model.intervals()[dep].duration;
                lb = lb.max(dep_end);
            }
        }
        Some(lb)
    }

    /// Maximal free stretches of window `w` above `lb`, given same-date
    /// placements.
    fn free_regions(&self, w: usize, lb: i32) -> Vec<(i32, i32)> {
        let slot = &self.model.windows()[w];
        let mut busy: Vec<(i32, i32)> = self
            .placements
            .iter()
            .filter(|(_, p)| self.model.windows()[p.window].date_ms == slot.date_ms)
            .map(|(&i, p)| {
                (
                    p.start_min,
                    p.start_min + self.model.intervals()[i].duration,
                )
            })
            .collect();
        busy.sort_unstable();

        let mut regions = Vec::new();
        let mut cursor = lb;
        for (s, e) in busy {
            if e <= cursor {
                continue;
            }
            if s >= slot.end_min {
                break;
            }
            if s > cursor {
                regions.push((cursor, s.min(slot.end_min)));
            }
            cursor = cursor.max(e);
        }
        if cursor < slot.end_min {
            regions.push((cursor, slot.end_min));
        }
        regions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::WindowSlot;

    const DAY: i64 = 1_735_516_800_000;
    const NEXT_DAY: i64 = DAY + 86_400_000;

    fn solve(model: &CpModel) -> CpSolution {
        BranchBoundSolver::new().solve(model, &SolverConfig::default())
    }

    #[test]
    fn test_single_interval_maximizes_start() {
        let mut model = CpModel::new();
        let w = model.add_window(WindowSlot::new(DAY, 540, 1020));
        let a = model.add_interval(60, vec![w]);
        model.set_objective_coeff(a, 1);

        let solution = solve(&model);
        assert_eq!(solution.status, CpStatus::Optimal);
        assert_eq!(solution.placements[&a].start_min, 960);
        assert_eq!(solution.objective, 960);
    }

    #[test]
    fn test_two_intervals_no_overlap() {
        let mut model = CpModel::new();
        let w = model.add_window(WindowSlot::new(DAY, 540, 700));
        let a = model.add_interval(90, vec![w]);
        let b = model.add_interval(60, vec![w]);
        model.set_objective_coeff(a, 1);
        model.set_objective_coeff(b, 1);

        let solution = solve(&model);
        assert!(solution.is_solution_found());
        let pa = solution.placements[&a];
        let pb = solution.placements[&b];
        let (ea, eb) = (pa.start_min + 90, pb.start_min + 60);
        assert!(ea <= pb.start_min || eb <= pa.start_min);
        assert!(pa.start_min >= 540 && ea <= 700);
        assert!(pb.start_min >= 540 && eb <= 700);
    }

    #[test]
    fn test_precedence_same_date() {
        let mut model = CpModel::new();
        let w = model.add_window(WindowSlot::new(DAY, 540, 720));
        let dep = model.add_interval(60, vec![w]);
        let child = model.add_interval(60, vec![w]);
        model.add_precedence(dep, child);

        let solution = solve(&model);
        assert!(solution.is_solution_found());
        let pd = solution.placements[&dep];
        let pc = solution.placements[&child];
        assert!(pd.start_min + 60 <= pc.start_min);
    }

    #[test]
    fn test_precedence_across_dates() {
        let mut model = CpModel::new();
        let w1 = model.add_window(WindowSlot::new(DAY, 540, 630));
        let w2 = model.add_window(WindowSlot::new(NEXT_DAY, 540, 630));
        // The dependency only fits on the later date, forcing the child
        // there too after it.
        let dep = model.add_interval(90, vec![w2]);
        let child = model.add_interval(60, vec![w1, w2]);
        model.add_precedence(dep, child);

        let solution = solve(&model);
        // Child cannot precede its dependency's date, and NEXT_DAY has no
        // room left after the 90-minute dependency.
        assert_eq!(solution.status, CpStatus::Infeasible);
    }

    #[test]
    fn test_infeasible_overfull_window() {
        let mut model = CpModel::new();
        let w = model.add_window(WindowSlot::new(DAY, 540, 660));
        model.add_interval(90, vec![w]);
        model.add_interval(60, vec![w]);

        let solution = solve(&model);
        assert_eq!(solution.status, CpStatus::Infeasible);
        assert!(!solution.is_solution_found());
    }

    #[test]
    fn test_empty_model_optimal() {
        let solution = solve(&CpModel::new());
        assert_eq!(solution.status, CpStatus::Optimal);
        assert!(solution.placements.is_empty());
    }

    #[test]
    fn test_model_invalid() {
        let mut model = CpModel::new();
        let w = model.add_window(WindowSlot::new(DAY, 540, 560));
        model.add_interval(60, vec![w]);
        assert_eq!(solve(&model).status, CpStatus::ModelInvalid);
    }

    #[test]
    fn test_precedence_cycle_infeasible() {
        let mut model = CpModel::new();
        let w = model.add_window(WindowSlot::new(DAY, 540, 1020));
        let a = model.add_interval(60, vec![w]);
        let b = model.add_interval(60, vec![w]);
        model.add_precedence(a, b);
        model.add_precedence(b, a);
        assert_eq!(solve(&model).status, CpStatus::Infeasible);
    }

    #[test]
    fn test_candidate_window_choice() {
        let mut model = CpModel::new();
        let w1 = model.add_window(WindowSlot::new(DAY, 540, 660));
        let w2 = model.add_window(WindowSlot::new(NEXT_DAY, 540, 660));
        // Two intervals, each window holds only one of them.
        let a = model.add_interval(120, vec![w1, w2]);
        let b = model.add_interval(120, vec![w1, w2]);

        let solution = solve(&model);
        assert!(solution.is_solution_found());
        assert_ne!(
            solution.placements[&a].window,
            solution.placements[&b].window
        );
    }
}
