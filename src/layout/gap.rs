//! # Gap Solver
//!
//! Computes the uniform vertical gap inserted between consecutive dish
//! blocks so a page's content fills its height. Row transitions with a
//! section gap multiplier above 1 count as extra gap units.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::config::{LayoutConfig, DEFAULT_DISH_GAP, MIN_OVERFLOW_GAP};

/// Best-fit measurement of a page: the stack of sections that forces the
/// smallest gap, as produced by [`calculate_heights`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MaxCombinationInfo {
    /// Total content height in inches, gaps excluded.
    pub height: f64,
    /// Number of dish blocks in the stack.
    pub dish_count: usize,
    pub will_overflow: bool,
    /// Grid row changes inside the stack.
    pub row_transitions: usize,
}

/// Trial measurement of one section column.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionMeasure {
    pub section_id: String,
    /// Grid row of the section.
    pub row: u32,
    /// Height of the column's content.
    pub height: f64,
    /// Dish blocks in the column.
    pub dish_count: usize,
}

/// Rounds of candidate refinement before the current stack is accepted.
const MAX_REFINEMENTS: usize = 32;

/// Pick one column per grid row so that the resulting stack forces the
/// smallest gap, and sum the picks.
///
/// Every column sharing a row has to fit with the same gap, so the binding
/// stack is the one minimising
/// `(page - height) / (count - 1 + transitions * max(0, multiplier - 1))`.
/// Starting from the tallest column of each row, each round picks per row
/// the column with the largest `height + gap * count` under the current
/// gap, until the stack stops changing. `will_overflow` reports whether the
/// tallest column of every row, stacked, exceeds the page.
pub fn calculate_heights(measures: &[SectionMeasure], page_height: f64, multiplier: f64) -> MaxCombinationInfo {
    let mut rows: BTreeMap<u32, Vec<&SectionMeasure>> = BTreeMap::new();
    for m in measures {
        rows.entry(m.row).or_default().push(m);
    }
    let transitions = rows.len().saturating_sub(1);
    let extra_units = transitions as f64 * (multiplier - 1.0).max(0.0);

    let pick = |weight: f64| {
        rows.values()
            .filter_map(|candidates| {
                candidates.iter().copied().reduce(|best, m| {
                    let score = m.height + weight * m.dish_count as f64;
                    let best_score = best.height + weight * best.dish_count as f64;
                    let wins = score > best_score
                        || (score == best_score && (m.height, m.dish_count) > (best.height, best.dish_count));
                    if wins {
                        m
                    } else {
                        best
                    }
                })
            })
            .collect::<Vec<_>>()
    };
    let total = |stack: &[&SectionMeasure]| -> (f64, usize) {
        (stack.iter().map(|m| m.height).sum(), stack.iter().map(|m| m.dish_count).sum())
    };

    let tallest = pick(0.0);
    let tallest_height = total(&tallest).0;
    let mut stack = tallest;
    if total(&stack).1 as f64 - 1.0 + extra_units <= 0.0 {
        // A lone block sets no gap; start from the columns with most dishes.
        stack = rows
            .values()
            .filter_map(|candidates| {
                candidates.iter().copied().max_by(|a, b| {
                    (a.dish_count, a.height)
                        .partial_cmp(&(b.dish_count, b.height))
                        .unwrap_or(Ordering::Equal)
                })
            })
            .collect();
    }
    for _ in 0..MAX_REFINEMENTS {
        let (height, count) = total(&stack);
        let units = count as f64 - 1.0 + extra_units;
        if units <= 0.0 {
            break;
        }
        let next = pick((page_height - height) / units);
        let (next_height, next_count) = total(&next);
        let next_units = next_count as f64 - 1.0 + extra_units;
        let improves = next_units > 0.0
            && (page_height - next_height) / next_units < (page_height - height) / units - 1e-12;
        if !improves {
            break;
        }
        stack = next;
    }

    let (height, dish_count) = total(&stack);
    MaxCombinationInfo {
        height,
        dish_count,
        will_overflow: tallest_height > page_height,
        row_transitions: transitions,
    }
}

/// Gap solver with configurable fallbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapSolver {
    pub default_gap: f64,
    pub min_overflow_gap: f64,
}

impl Default for GapSolver {
    fn default() -> Self {
        GapSolver {
            default_gap: DEFAULT_DISH_GAP,
            min_overflow_gap: MIN_OVERFLOW_GAP,
        }
    }
}

impl GapSolver {
    pub fn from_config(config: &LayoutConfig) -> Self {
        GapSolver {
            default_gap: config.default_gap,
            min_overflow_gap: config.min_overflow_gap,
        }
    }

    /// `(page - content) / (count - 1 + transitions * max(0, multiplier - 1))`.
    ///
    /// Falls back to the default gap for a single dish or empty content, and
    /// floors at the overflow minimum when the content does not fit.
    pub fn solve(
        &self,
        page_height: f64,
        info: &MaxCombinationInfo,
        row_transitions: usize,
        multiplier: f64,
    ) -> f64 {
        if info.dish_count <= 1 || info.height <= 0.0 {
            return self.default_gap;
        }
        let extra_units = row_transitions as f64 * (multiplier - 1.0).max(0.0);
        let units = (info.dish_count - 1) as f64 + extra_units;
        let gap = (page_height - info.height) / units;
        if gap < self.min_overflow_gap && info.will_overflow {
            return self.min_overflow_gap;
        }
        gap
    }
}

/// Solve with the default fallbacks.
pub fn solve_gap(
    page_height: f64,
    info: &MaxCombinationInfo,
    row_transitions: usize,
    multiplier: f64,
) -> f64 {
    GapSolver::default().solve(page_height, info, row_transitions, multiplier)
}

/// Gap actually used for positioning, and whether the page overflows.
///
/// A solved gap below the readability floor, or content taller than the
/// page, is clamped to the floor and reported as overflow.
pub fn readable_gap(gap: f64, info: &MaxCombinationInfo, page_height: f64, floor: f64) -> (f64, bool) {
    if gap < floor || info.will_overflow || info.height > page_height {
        (floor, true)
    } else {
        (gap, false)
    }
}
