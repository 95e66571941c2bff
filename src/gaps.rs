//! Gap calculus over windows and assignments.
//!
//! The greedy and local-search strategies work directly on free gaps:
//! the sub-intervals of each availability window not covered by booked
//! assignments. Gaps are represented as [`Window`] values so placement
//! code treats them uniformly with caller-supplied windows.

use std::collections::BTreeMap;

use crate::models::{Assignment, Window};

/// Computes free gaps left by `booked` inside each of `windows`.
///
/// For every window, assignments on the same date that overlap the window
/// are clipped to it and swept in start order; each uncovered stretch
/// becomes a gap inheriting the window's date and deep-work flag. Output
/// order follows the input window order, gaps within a window left to
/// right.
pub fn calculate_gaps(windows: &[Window], booked: &[Assignment]) -> Vec<Window> {
    let mut gaps = Vec::new();

    for win in windows {
        let mut daily: Vec<&Assignment> = booked
            .iter()
            .filter(|a| a.date_ms == win.date_ms)
            .filter(|a| a.end_min > win.start_min && a.start_min < win.end_min)
            .collect();
        daily.sort_by_key(|a| a.start_min);

        let mut cursor = win.start_min;
        for a in daily {
            let a_start = a.start_min.max(win.start_min);
            let a_end = a.end_min.min(win.end_min);
            if a_start > cursor {
                gaps.push(
                    Window::new(win.date_ms, cursor, a_start).with_deep_work(win.deep_work),
                );
            }
            cursor = cursor.max(a_end);
        }
        if cursor < win.end_min {
            gaps.push(Window::new(win.date_ms, cursor, win.end_min).with_deep_work(win.deep_work));
        }
    }

    tracing::debug!(
        gaps = gaps.len(),
        windows = windows.len(),
        booked = booked.len(),
        "calculated gaps"
    );
    gaps
}

/// Assignments in `schedule` that overlap `[start_min, end_min)` on `date_ms`.
pub fn find_conflicts<'a>(
    schedule: &'a [Assignment],
    date_ms: i64,
    start_min: i32,
    end_min: i32,
) -> Vec<&'a Assignment> {
    schedule
        .iter()
        .filter(|a| a.date_ms == date_ms)
        .filter(|a| a.end_min > start_min && a.start_min < end_min)
        .collect()
}

/// Whether two assignments overlap. Intervals are half-open; merely
/// touching assignments do not overlap.
pub fn overlaps(a: &Assignment, b: &Assignment) -> bool {
    a.date_ms == b.date_ms && a.start_min.max(b.start_min) < a.end_min.min(b.end_min)
}

/// Whether adding `candidate` would overlap anything in `schedule`.
pub fn would_overlap(candidate: &Assignment, schedule: &[Assignment]) -> bool {
    schedule.iter().any(|existing| overlaps(candidate, existing))
}

/// Total free minutes across `gaps`.
pub fn total_gap_duration(gaps: &[Window]) -> i32 {
    gaps.iter().map(Window::duration_min).sum()
}

/// The widest gap, if any; the earliest wins a tie.
pub fn largest_gap(gaps: &[Window]) -> Option<&Window> {
    gaps.iter().reduce(|best, g| {
        if g.duration_min() > best.duration_min() {
            g
        } else {
            best
        }
    })
}

/// Merges adjacent or overlapping gaps per date.
///
/// Output is sorted by date then start minute. A merged gap keeps the
/// deep-work flag of its leftmost constituent.
pub fn merge_gaps(gaps: &[Window]) -> Vec<Window> {
    let mut by_date: BTreeMap<i64, Vec<Window>> = BTreeMap::new();
    for gap in gaps {
        by_date.entry(gap.date_ms).or_default().push(gap.clone());
    }

    let mut merged = Vec::new();
    for (_, mut date_gaps) in by_date {
        date_gaps.sort_by_key(|g| g.start_min);
        let mut current = date_gaps[0].clone();
        for next in date_gaps.into_iter().skip(1) {
            if next.start_min <= current.end_min {
                current.end_min = current.end_min.max(next.end_min);
            } else {
                merged.push(current);
                current = next;
            }
        }
        merged.push(current);
    }
    merged
}

/// Fragmentation of the free time as a 0-100 percentage: the share of
/// gaps narrower than `min_useful_gap` minutes. Returns 0.0 when there
/// are no gaps at all.
pub fn fragmentation(windows: &[Window], schedule: &[Assignment], min_useful_gap: i32) -> f64 {
    let gaps = calculate_gaps(windows, schedule);
    if gaps.is_empty() {
        return 0.0;
    }
    let small = gaps
        .iter()
        .filter(|g| g.duration_min() < min_useful_gap)
        .count();
    small as f64 / gaps.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = 1_735_516_800_000;

    fn asg(task_id: i64, date_ms: i64, start_min: i32, end_min: i32) -> Assignment {
        Assignment {
            task_id,
            date_ms,
            start_min,
            end_min,
            utility: 0.0,
        }
    }

    #[test]
    fn test_empty_schedule_whole_window_is_gap() {
        let windows = vec![Window::new(DAY, 540, 1020)];
        let gaps = calculate_gaps(&windows, &[]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].start_min, 540);
        assert_eq!(gaps[0].end_min, 1020);
        assert_eq!(gaps[0].duration_min(), 480);
    }

    #[test]
    fn test_gaps_between_assignments() {
        let windows = vec![Window::new(DAY, 540, 1020)];
        let booked = vec![
            asg(1, DAY, 540, 630),
            asg(2, DAY, 660, 720),
            asg(3, DAY, 840, 930),
        ];
        let gaps = calculate_gaps(&windows, &booked);
        assert_eq!(gaps.len(), 3);
        assert_eq!((gaps[0].start_min, gaps[0].end_min), (630, 660));
        assert_eq!((gaps[1].start_min, gaps[1].end_min), (720, 840));
        assert_eq!((gaps[2].start_min, gaps[2].end_min), (930, 1020));
        assert_eq!(total_gap_duration(&gaps), 240);
    }

    #[test]
    fn test_gaps_inherit_deep_work_flag() {
        let windows = vec![Window::new(DAY, 540, 720).with_deep_work(true)];
        let gaps = calculate_gaps(&windows, &[asg(1, DAY, 600, 660)]);
        assert_eq!(gaps.len(), 2);
        assert!(gaps.iter().all(|g| g.deep_work));
    }

    #[test]
    fn test_assignment_on_other_date_ignored() {
        let windows = vec![Window::new(DAY, 540, 1020)];
        let gaps = calculate_gaps(&windows, &[asg(1, DAY + 86_400_000, 540, 630)]);
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].duration_min(), 480);
    }

    #[test]
    fn test_find_conflicts() {
        let schedule = vec![asg(1, DAY, 540, 630), asg(2, DAY, 720, 840)];
        let conflicts = find_conflicts(&schedule, DAY, 600, 660);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].task_id, 1);
    }

    #[test]
    fn test_overlaps_half_open() {
        let a1 = asg(1, DAY, 540, 630);
        let a2 = asg(2, DAY, 600, 720);
        let touching = asg(3, DAY, 630, 900);
        let apart = asg(4, DAY, 750, 900);
        let other_day = asg(5, DAY + 86_400_000, 540, 630);
        assert!(overlaps(&a1, &a2));
        assert!(!overlaps(&a1, &touching));
        assert!(!overlaps(&a1, &apart));
        assert!(!overlaps(&a1, &other_day));
    }

    #[test]
    fn test_would_overlap() {
        let schedule = vec![asg(1, DAY, 540, 630)];
        assert!(would_overlap(&asg(9, DAY, 600, 660), &schedule));
        assert!(!would_overlap(&asg(9, DAY, 630, 660), &schedule));
    }

    #[test]
    fn test_fragmentation_ratio() {
        // Two sub-15-minute gaps out of three.
        let windows = vec![Window::new(DAY, 540, 1020)];
        let schedule = vec![
            asg(1, DAY, 540, 630),
            asg(2, DAY, 640, 720),
            asg(3, DAY, 725, 840),
        ];
        let frag = fragmentation(&windows, &schedule, 15);
        assert!(frag > 60.0 && frag < 70.0);
    }

    #[test]
    fn test_fragmentation_no_gaps_is_zero() {
        let windows = vec![Window::new(DAY, 540, 600)];
        let schedule = vec![asg(1, DAY, 540, 600)];
        assert_eq!(fragmentation(&windows, &schedule, 15), 0.0);
    }

    #[test]
    fn test_merge_adjacent_gaps() {
        let gaps = vec![
            Window::new(DAY, 540, 600),
            Window::new(DAY, 600, 720),
            Window::new(DAY, 840, 900),
        ];
        let merged = merge_gaps(&gaps);
        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].start_min, merged[0].end_min), (540, 720));
        assert_eq!((merged[1].start_min, merged[1].end_min), (840, 900));
    }

    #[test]
    fn test_merge_keeps_dates_separate() {
        let gaps = vec![
            Window::new(DAY, 540, 600),
            Window::new(DAY + 86_400_000, 600, 720),
        ];
        assert_eq!(merge_gaps(&gaps).len(), 2);
    }

    #[test]
    fn test_largest_gap() {
        let gaps = vec![
            Window::new(DAY, 540, 570),
            Window::new(DAY, 600, 720),
            Window::new(DAY, 840, 900),
        ];
        let largest = largest_gap(&gaps).unwrap();
        assert_eq!((largest.start_min, largest.end_min), (600, 720));
    }

    #[test]
    fn test_largest_gap_tie_prefers_earliest() {
        let gaps = vec![Window::new(DAY, 600, 720), Window::new(DAY, 840, 960)];
        assert_eq!(largest_gap(&gaps).unwrap().start_min, 600);
    }

    #[test]
    fn test_largest_gap_empty() {
        assert!(largest_gap(&[]).is_none());
    }
}
