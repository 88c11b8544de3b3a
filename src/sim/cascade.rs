/// The cascade engine: resolves one triggering action to a settled board.
///
/// Round order (strictly sequential):
///   1. Remove the current match set
///   2. Score it at the current combo level
///   3. Gravity
///   4. Refill
///   5. Advance combo
///   6. Whole-grid match search → next round, or settle
///
/// ## Phases
///
///   Idle ──swap committed──▶ AwaitingMatchCheck ──no match──▶ Idle
///                                   │ match
///                                   ▼
///   bulk trigger ─────────────▶ Resolving ⟲ (new matches)
///                                   │ no new matches
///                                   ▼
///                               Settled ──▶ Idle
///
/// ## Combo
///
/// Every round advances the combo (clamped at `max_combo`). Settling
/// resets it to 0 unless a bulk effect ran during this action; that
/// "first move after manual erase" flag is consumed by the settle and
/// the combo carries into the next player action.

use tracing::{debug, error, info, trace};

use crate::domain::grid::Grid;
use crate::domain::kinds::KindSource;
use crate::domain::matcher::MatchFinder;
use crate::domain::rewards::{RewardRules, Rewards};
use crate::domain::token::{Pos, Token};
use super::event::{CascadeEvent, ComboCue, RoundReport};

pub const DEFAULT_MAX_COMBO: u8 = 3;
pub const DEFAULT_MAX_ROUNDS: usize = 64;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Idle,
    AwaitingMatchCheck,
    Resolving,
    Settled,
}

#[derive(Clone, Debug)]
pub struct CascadeEngine {
    finder: MatchFinder,
    rewards: RewardRules,
    max_combo: u8,
    max_rounds: usize,
    combo: u8,
    manual_erase_pending: bool,
    phase: Phase,
}

impl Default for CascadeEngine {
    fn default() -> Self {
        CascadeEngine::new(
            MatchFinder::default(),
            RewardRules::default(),
            DEFAULT_MAX_COMBO,
            DEFAULT_MAX_ROUNDS,
        )
    }
}

// ── Construction / queries ──

impl CascadeEngine {
    pub fn new(finder: MatchFinder, rewards: RewardRules, max_combo: u8, max_rounds: usize) -> Self {
        CascadeEngine {
            finder,
            rewards,
            max_combo,
            max_rounds: max_rounds.max(1),
            combo: 0,
            manual_erase_pending: false,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase { self.phase }
    pub fn combo(&self) -> u8 { self.combo }
    pub fn finder(&self) -> &MatchFinder { &self.finder }
    pub fn rewards(&self) -> &RewardRules { &self.rewards }

    /// True while an action is between commit and settle.
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::AwaitingMatchCheck | Phase::Resolving)
    }

    pub fn manual_erase_pending(&self) -> bool {
        self.manual_erase_pending
    }

    /// Forget combo state (new session).
    pub fn reset(&mut self) {
        self.combo = 0;
        self.manual_erase_pending = false;
        self.phase = Phase::Idle;
    }
}

// ══════════════════════════════════════════════════════════════
// Entry points
// ══════════════════════════════════════════════════════════════

impl CascadeEngine {
    /// A swap has been committed to the grid; the next call must be `check_swap`.
    pub fn begin_match_check(&mut self) {
        debug_assert!(!self.is_busy(), "match check requested while busy");
        self.phase = Phase::AwaitingMatchCheck;
    }

    /// Look for runs through the two moved cells. On a match, resolve the
    /// whole cascade and return true. Otherwise return to `Idle`; the
    /// caller is responsible for undoing the swap.
    pub fn check_swap(
        &mut self,
        grid: &mut Grid,
        a: Pos,
        b: Pos,
        kinds: &mut impl KindSource,
        events: &mut Vec<CascadeEvent>,
    ) -> bool {
        debug_assert_eq!(self.phase, Phase::AwaitingMatchCheck);
        let matched = self.finder.matches_touching(grid, &[a, b]);
        if matched.is_empty() {
            self.phase = Phase::Idle;
            return false;
        }
        let cleared = take_all(grid, &matched);
        self.resolve(grid, cleared, true, kinds, events);
        true
    }

    /// Bulk effect: remove every non-wall token, then resolve.
    pub fn trigger_clear_all(
        &mut self,
        grid: &mut Grid,
        kinds: &mut impl KindSource,
        events: &mut Vec<CascadeEvent>,
    ) {
        self.manual_erase_pending = true;
        self.phase = Phase::Resolving;
        let cleared = grid.clear_all();
        info!(cleared = cleared.len(), "clear-all effect");
        self.resolve(grid, cleared, false, kinds, events);
    }

    /// Bulk effect: freeze the central cross band into ice, then clear it and resolve.
    pub fn trigger_clear_cross(
        &mut self,
        grid: &mut Grid,
        kinds: &mut impl KindSource,
        events: &mut Vec<CascadeEvent>,
    ) {
        self.manual_erase_pending = true;
        self.phase = Phase::Resolving;
        let cells = grid.clear_cross_pattern();
        info!(converted = cells.len(), "cross effect");
        let cleared: Vec<Token> = cells.iter().filter_map(|&p| grid.take(p)).collect();
        events.push(CascadeEvent::CrossConverted { cells });
        self.resolve(grid, cleared, false, kinds, events);
    }
}

// ══════════════════════════════════════════════════════════════
// Round loop
// ══════════════════════════════════════════════════════════════

impl CascadeEngine {
    /// `cleared` has already been removed from the grid. A bulk effect's
    /// own set earns nothing (`reward_first == false`); cascades it sets
    /// off are rewarded as usual.
    fn resolve(
        &mut self,
        grid: &mut Grid,
        mut cleared: Vec<Token>,
        reward_first: bool,
        kinds: &mut impl KindSource,
        events: &mut Vec<CascadeEvent>,
    ) {
        self.phase = Phase::Resolving;
        let mut index = 0;
        loop {
            let rewarded = reward_first || index > 0;
            let report = self.run_round(grid, index, cleared, rewarded, kinds, events);
            trace!(
                round = index,
                cleared = report.cleared.len(),
                combo = report.combo_level,
                score = report.score_delta,
                "cascade round",
            );
            events.push(CascadeEvent::Round(report));
            index += 1;

            let next = self.finder.matches_over_whole_grid(grid);
            if next.is_empty() { break; }
            if index >= self.max_rounds {
                error!(rounds = index, pending = next.len(), "cascade round limit reached, settling early");
                break;
            }
            cleared = take_all(grid, &next);
        }
        self.settle(index, events);
    }

    fn run_round(
        &mut self,
        grid: &mut Grid,
        index: usize,
        cleared: Vec<Token>,
        rewarded: bool,
        kinds: &mut impl KindSource,
        events: &mut Vec<CascadeEvent>,
    ) -> RoundReport {
        let rewards = if rewarded {
            self.rewards.evaluate(&cleared, self.combo)
        } else {
            Rewards::default()
        };

        let falls = grid.apply_gravity();
        debug_assert!(grid.is_gravity_consistent(), "gravity left a gap");
        let spawned = grid.refill(kinds);
        assert!(grid.is_full(), "refill left empty cells on a {}x{} grid", grid.width(), grid.height());

        self.set_combo(self.combo.saturating_add(1).min(self.max_combo), events);

        RoundReport {
            index,
            cleared,
            falls,
            spawned,
            combo_level: self.combo,
            score_delta: rewards.score,
            time_delta: rewards.time,
            gauge_deltas: rewards.gauges,
        }
    }

    fn settle(&mut self, rounds: usize, events: &mut Vec<CascadeEvent>) {
        self.phase = Phase::Settled;
        if self.manual_erase_pending {
            self.manual_erase_pending = false;
            debug!(combo = self.combo, "combo carried past manual erase");
        } else {
            self.set_combo(0, events);
        }
        events.push(CascadeEvent::Settled { rounds, combo: self.combo });
        self.phase = Phase::Idle;
    }

    fn set_combo(&mut self, to: u8, events: &mut Vec<CascadeEvent>) {
        let from = self.combo;
        if from == to { return; }
        self.combo = to;
        events.push(CascadeEvent::ComboChanged { from, to, cue: ComboCue::for_level(to) });
    }
}

/// Remove a match set from the grid, returning what was actually there.
fn take_all(grid: &mut Grid, matched: &[Token]) -> Vec<Token> {
    matched.iter().filter_map(|t| grid.take(t.pos)).collect()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
