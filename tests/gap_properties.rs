//! Property-based invariant tests for the gap solver.
//!
//! 1. Content that fits fills the page exactly.
//! 2. Overflowing content gets the overflow floor.
//! 3. A single dish or empty content gets the default gap.
//! 4. The readable gap never drops below its floor.
//! 5. calculate_heights picks the stack that forces the smallest gap, and
//!    reports overflow from the tallest stack.
//! 6. calculate_heights does not depend on input order.

use carte::config::{DEFAULT_DISH_GAP, MIN_OVERFLOW_GAP};
use carte::layout::gap::readable_gap;
use carte::layout::{calculate_heights, GapSolver, MaxCombinationInfo, SectionMeasure};
use proptest::prelude::*;

// ── Helpers ─────────────────────────────────────────────────────────────

fn measures(max_len: usize) -> impl Strategy<Value = Vec<SectionMeasure>> {
    proptest::collection::vec((0u32..4, 0.0f64..6.0, 2usize..12), 1..=max_len).prop_map(|raw| {
        raw.into_iter()
            .enumerate()
            .map(|(i, (row, height, dish_count))| SectionMeasure {
                section_id: format!("s{}", i),
                row,
                height,
                dish_count,
            })
            .collect()
    })
}

/// Every way to pick one measure per row, as (height, dish count).
fn stacks(measures: &[SectionMeasure]) -> Vec<(f64, usize)> {
    let mut rows: Vec<u32> = measures.iter().map(|m| m.row).collect();
    rows.sort_unstable();
    rows.dedup();
    let mut out = vec![(0.0, 0)];
    for row in rows {
        let mut next = Vec::new();
        for (height, count) in &out {
            for m in measures.iter().filter(|m| m.row == row) {
                next.push((height + m.height, count + m.dish_count));
            }
        }
        out = next;
    }
    out
}

fn row_count(measures: &[SectionMeasure]) -> usize {
    let mut rows: Vec<u32> = measures.iter().map(|m| m.row).collect();
    rows.sort_unstable();
    rows.dedup();
    rows.len()
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Content that fits fills the page
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn fitting_content_fills_page(
        page in 5.0f64..20.0,
        fill in 0.05f64..0.95,
        dish_count in 2usize..40,
        transitions in 0usize..4,
        multiplier in 1.0f64..3.0,
    ) {
        let info = MaxCombinationInfo {
            height: page * fill,
            dish_count,
            will_overflow: false,
            row_transitions: transitions,
        };
        let gap = GapSolver::default().solve(page, &info, transitions, multiplier);
        let units = (dish_count - 1) as f64 + transitions as f64 * (multiplier - 1.0);
        prop_assert!(gap > 0.0);
        prop_assert!(
            (info.height + gap * units - page).abs() < 1e-9,
            "gap {} over {} units leaves {} of {}", gap, units, info.height + gap * units, page
        );
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Overflow floor
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn overflowing_content_gets_floor(
        page in 5.0f64..20.0,
        excess in 1.01f64..3.0,
        dish_count in 2usize..40,
        multiplier in 0.0f64..3.0,
    ) {
        let info = MaxCombinationInfo {
            height: page * excess,
            dish_count,
            will_overflow: true,
            row_transitions: 0,
        };
        prop_assert_eq!(GapSolver::default().solve(page, &info, 0, multiplier), MIN_OVERFLOW_GAP);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Fallback
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn single_dish_or_no_content_gets_default(
        page in 1.0f64..20.0,
        height in 0.0f64..30.0,
        dish_count in 0usize..2,
    ) {
        let info = MaxCombinationInfo {
            height,
            dish_count,
            will_overflow: height > page,
            row_transitions: 0,
        };
        prop_assert_eq!(GapSolver::default().solve(page, &info, 0, 1.0), DEFAULT_DISH_GAP);

        let empty = MaxCombinationInfo { height: 0.0, dish_count: 10, ..info };
        prop_assert_eq!(GapSolver::default().solve(page, &empty, 0, 1.0), DEFAULT_DISH_GAP);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Readable floor
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn readable_gap_respects_floor(
        gap in -2.0f64..2.0,
        height in 0.0f64..20.0,
        page in 1.0f64..15.0,
        floor in 0.0f64..0.5,
    ) {
        let info = MaxCombinationInfo { height, dish_count: 3, will_overflow: height > page, row_transitions: 0 };
        let (used, overflow) = readable_gap(gap, &info, page, floor);
        prop_assert!(used >= floor);
        prop_assert_eq!(overflow, gap < floor || height > page);
        if !overflow {
            prop_assert_eq!(used, gap);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Smallest forced gap
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn heights_force_smallest_gap(
        measures in measures(8),
        page in 1.0f64..30.0,
        multiplier in 0.5f64..3.0,
    ) {
        let info = calculate_heights(&measures, page, multiplier);
        let transitions = row_count(&measures) - 1;
        let extra = transitions as f64 * (multiplier - 1.0).max(0.0);
        let gap_of = |height: f64, count: usize| (page - height) / (count as f64 - 1.0 + extra);

        let all = stacks(&measures);
        let smallest = all.iter().map(|(h, n)| gap_of(*h, *n)).fold(f64::INFINITY, f64::min);
        let tallest = all.iter().map(|(h, _)| *h).fold(0.0, f64::max);

        prop_assert!(
            (gap_of(info.height, info.dish_count) - smallest).abs() < 1e-9,
            "picked gap {} but {} is smaller", gap_of(info.height, info.dish_count), smallest
        );
        prop_assert_eq!(info.row_transitions, transitions);
        prop_assert_eq!(info.will_overflow, tallest > page);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6. Order independence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn heights_ignore_input_order(measures in measures(12), page in 1.0f64..20.0) {
        let forward = calculate_heights(&measures, page, 1.0);
        let mut reversed = measures.clone();
        reversed.reverse();
        let backward = calculate_heights(&reversed, page, 1.0);
        prop_assert!((forward.height - backward.height).abs() < 1e-9);
        prop_assert_eq!(forward.dish_count, backward.dish_count);
        prop_assert_eq!(forward.row_transitions, backward.row_transitions);
    }
}
