/// Match detection: pure queries over a grid snapshot.
///
/// No side effects: these report which tokens WOULD clear without
/// touching the board.
///
/// ## Run Rules
///
/// ┌──────────────────────────────┬───────────┐
/// │ Condition                     │ Matched?  │
/// ├──────────────────────────────┼───────────┤
/// │ seed cell empty / OOB         │ NO        │
/// │ seed kind = Wall              │ NO        │
/// │ horizontal run through seed   │ YES if    │
/// │   (left + self + right) ≥ min │ len ≥ min │
/// │ vertical run through seed     │ YES if    │
/// │   (down + self + up) ≥ min    │ len ≥ min │
/// │ Otherwise                     │ NO        │
/// └──────────────────────────────┴───────────┘
///
/// Horizontal and vertical scans are independent. A token in both a
/// horizontal and a vertical run appears once in the result.

use std::collections::BTreeMap;

use super::grid::Grid;
use super::token::{Pos, Token};

/// Shortest run that clears.
pub const DEFAULT_MIN_RUN: usize = 3;

#[derive(Clone, Copy, Debug)]
pub struct MatchFinder {
    pub min_run: usize,
}

impl Default for MatchFinder {
    fn default() -> Self {
        MatchFinder { min_run: DEFAULT_MIN_RUN }
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Horizontal,
    Vertical,
}

impl MatchFinder {
    pub fn new(min_run: usize) -> Self {
        MatchFinder { min_run }
    }

    /// Tokens in any qualifying run through one of the seed cells.
    /// Sorted by position, no duplicates.
    pub fn matches_touching(&self, grid: &Grid, seeds: &[Pos]) -> Vec<Token> {
        let mut found = BTreeMap::new();
        for &seed in seeds {
            self.collect_runs(grid, seed, &mut found);
        }
        found.into_values().collect()
    }

    /// Union of `matches_touching` over every occupied cell.
    pub fn matches_over_whole_grid(&self, grid: &Grid) -> Vec<Token> {
        let mut found = BTreeMap::new();
        for pos in grid.positions() {
            self.collect_runs(grid, pos, &mut found);
        }
        found.into_values().collect()
    }

    /// Does the board hold any run at all?
    pub fn has_any_match(&self, grid: &Grid) -> bool {
        grid.positions().any(|p| {
            self.run_through(grid, p, Axis::Horizontal).len() >= self.min_run
                || self.run_through(grid, p, Axis::Vertical).len() >= self.min_run
        })
    }

    fn collect_runs(&self, grid: &Grid, seed: Pos, found: &mut BTreeMap<Pos, Token>) {
        for axis in [Axis::Horizontal, Axis::Vertical] {
            let run = self.run_through(grid, seed, axis);
            if run.len() >= self.min_run {
                for t in run {
                    found.insert(t.pos, t);
                }
            }
        }
    }

    /// Contiguous same-kind cells through `seed` along one axis (seed included).
    /// Empty for empty, out-of-bounds, or wall seeds.
    fn run_through(&self, grid: &Grid, seed: Pos, axis: Axis) -> Vec<Token> {
        let start = match grid.get(seed) {
            Some(t) if t.kind.is_matchable() => *t,
            _ => return vec![],
        };
        let step_back = |p: Pos| -> Option<Pos> {
            match axis {
                Axis::Horizontal => p.x.checked_sub(1).map(|x| Pos::new(x, p.y)),
                Axis::Vertical => p.y.checked_sub(1).map(|y| Pos::new(p.x, y)),
            }
        };
        let step_fwd = |p: Pos| -> Pos {
            match axis {
                Axis::Horizontal => Pos::new(p.x + 1, p.y),
                Axis::Vertical => Pos::new(p.x, p.y + 1),
            }
        };

        let mut run = vec![start];
        let mut cur = seed;
        while let Some(next) = step_back(cur) {
            match grid.get(next) {
                Some(t) if t.kind == start.kind => run.push(*t),
                _ => break,
            }
            cur = next;
        }
        let mut cur = seed;
        loop {
            let next = step_fwd(cur);
            match grid.get(next) {
                Some(t) if t.kind == start.kind => run.push(*t),
                _ => break,
            }
            cur = next;
        }
        run
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
