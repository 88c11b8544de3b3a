/// Player-facing entry point: swaps, item effects, busy gating.
///
/// ## Swap Acceptance
///
/// ┌───────────────────────────────────┬──────────┬────────────────┐
/// │ Condition                          │ Accepted │ Grid mutated?  │
/// ├───────────────────────────────────┼──────────┼────────────────┤
/// │ controller busy / input disabled   │ NO       │ no             │
/// │ cells not adjacent                 │ NO       │ no             │
/// │ either cell OOB, empty, or wall    │ NO       │ no             │
/// │ adjacent, no run formed            │ YES      │ no (undone)    │
/// │ adjacent, run formed               │ YES      │ yes (cascade)  │
/// └───────────────────────────────────┴──────────┴────────────────┘

use serde::Serialize;
use tracing::debug;

use crate::domain::grid::Grid;
use crate::domain::kinds::KindSource;
use crate::domain::token::Pos;
use super::cascade::CascadeEngine;
use super::event::CascadeEvent;

// ── Command log ──

/// A reversible edit to the grid.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum Command {
    Swap { a: Pos, b: Pos },
}

impl Command {
    fn apply(self, grid: &mut Grid) -> bool {
        match self {
            Command::Swap { a, b } => grid.swap(a, b),
        }
    }

    pub fn inverse(self) -> Command {
        match self {
            Command::Swap { a, b } => Command::Swap { a: b, b: a },
        }
    }
}

/// Executed commands, most recent last.
#[derive(Clone, Debug, Default)]
pub struct CommandStack {
    done: Vec<Command>,
}

impl CommandStack {
    pub fn execute(&mut self, cmd: Command, grid: &mut Grid) -> bool {
        let applied = cmd.apply(grid);
        if applied {
            self.done.push(cmd);
        }
        applied
    }

    /// Pop the last command and apply its inverse.
    pub fn undo(&mut self, grid: &mut Grid) -> Option<Command> {
        let cmd = self.done.pop()?;
        cmd.inverse().apply(grid);
        Some(cmd)
    }

    pub fn history(&self) -> &[Command] {
        &self.done
    }

    pub fn clear(&mut self) {
        self.done.clear();
    }
}

// ══════════════════════════════════════════════════════════════
// Controller
// ══════════════════════════════════════════════════════════════

pub struct ActionController<K> {
    grid: Grid,
    engine: CascadeEngine,
    kinds: K,
    commands: CommandStack,
    events: Vec<CascadeEvent>,
    input_enabled: bool,
}

impl<K: KindSource> ActionController<K> {
    /// Takes the board as given; call `repopulate` for a fresh random one.
    pub fn new(grid: Grid, engine: CascadeEngine, kinds: K) -> Self {
        ActionController {
            grid,
            engine,
            kinds,
            commands: CommandStack::default(),
            events: vec![],
            input_enabled: true,
        }
    }

    pub fn grid(&self) -> &Grid { &self.grid }
    pub fn engine(&self) -> &CascadeEngine { &self.engine }
    pub fn combo(&self) -> u8 { self.engine.combo() }
    pub fn history(&self) -> &[Command] { self.commands.history() }

    pub fn is_busy(&self) -> bool {
        !self.input_enabled || self.engine.is_busy()
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    /// Hand over everything emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<CascadeEvent> {
        std::mem::take(&mut self.events)
    }

    /// Refill every non-wall cell and forget combo, history and pending events.
    pub fn repopulate(&mut self) {
        self.grid.populate(&mut self.kinds);
        self.engine.reset();
        self.commands.clear();
        self.events.clear();
    }

    fn is_swappable(&self, pos: Pos) -> bool {
        self.grid.get(pos).is_some_and(|t| t.kind.is_movable())
    }

    /// Try to exchange two adjacent tokens. A swap that forms no run is
    /// undone before returning but still counts as accepted.
    pub fn request_swap(&mut self, a: Pos, b: Pos) -> bool {
        if self.is_busy() {
            debug!(?a, ?b, "swap rejected: busy");
            return false;
        }
        if !a.is_adjacent(b) {
            debug!(?a, ?b, "swap rejected: not adjacent");
            return false;
        }
        if !self.is_swappable(a) || !self.is_swappable(b) {
            debug!(?a, ?b, "swap rejected: cell empty, wall, or off the board");
            return false;
        }

        self.commands.execute(Command::Swap { a, b }, &mut self.grid);
        self.events.push(CascadeEvent::SwapCommitted { a, b });
        self.engine.begin_match_check();

        if !self.engine.check_swap(&mut self.grid, a, b, &mut self.kinds, &mut self.events) {
            self.commands.undo(&mut self.grid);
            self.events.push(CascadeEvent::SwapReverted { a, b });
            debug!(?a, ?b, "no run formed, swap reverted");
        }
        true
    }

    /// Bulk clear of every non-wall token. Refused while busy or input is disabled.
    pub fn trigger_clear_all(&mut self) -> bool {
        if self.is_busy() {
            debug!("clear-all refused: busy");
            return false;
        }
        self.engine.trigger_clear_all(&mut self.grid, &mut self.kinds, &mut self.events);
        true
    }

    /// Freeze and clear the central cross band. Refused while busy or input is disabled.
    pub fn trigger_clear_cross(&mut self) -> bool {
        if self.is_busy() {
            debug!("cross refused: busy");
            return false;
        }
        self.engine.trigger_clear_cross(&mut self.grid, &mut self.kinds, &mut self.events);
        true
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::kinds::{RandomKinds, ScriptedKinds};
    use crate::domain::token::TokenKind;
    use crate::sim::fixtures::{red_swap_board, striped_board};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    fn p(x: usize, y: usize) -> Pos { Pos::new(x, y) }

    fn scripted(grid: Grid, script: &str) -> ActionController<ScriptedKinds> {
        ActionController::new(grid, CascadeEngine::default(), ScriptedKinds::from_symbols(script))
    }

    fn random(seed: u64) -> ActionController<RandomKinds<StdRng>> {
        let kinds = RandomKinds::new(StdRng::seed_from_u64(seed), TokenKind::COLORS.to_vec());
        let mut c = ActionController::new(Grid::new(8, 8), CascadeEngine::default(), kinds);
        c.repopulate();
        c
    }

    // ── Rejected input ──

    #[rstest]
    #[case(p(2, 2), p(3, 3))] // diagonal
    #[case(p(2, 2), p(4, 2))] // two apart
    #[case(p(2, 2), p(2, 2))] // same cell
    #[case(p(7, 7), p(8, 7))] // off the board
    fn invalid_swap_leaves_grid_untouched(#[case] a: Pos, #[case] b: Pos) {
        let mut c = scripted(striped_board(8, 8), "R");
        let before = c.grid().clone();
        assert!(!c.request_swap(a, b));
        assert_eq!(c.grid(), &before);
        assert!(c.drain_events().is_empty());
        assert!(c.history().is_empty());
    }

    #[test]
    fn walls_and_holes_cannot_be_swapped() {
        let mut c = scripted(Grid::from_diagram(&[
            "R.B",
            "G#Y",
        ]), "R");
        assert!(!c.request_swap(p(0, 0), p(1, 0)));
        assert!(!c.request_swap(p(0, 1), p(1, 1)));
        assert_eq!(c.grid().to_diagram(), vec!["R.B", "G#Y"]);
    }

    #[test]
    fn busy_controller_refuses_swaps() {
        let mut c = scripted(red_swap_board(), "YPG");
        c.set_input_enabled(false);
        assert!(c.is_busy());
        assert!(!c.request_swap(p(3, 3), p(3, 4)));
        c.set_input_enabled(true);
        assert!(c.request_swap(p(3, 3), p(3, 4)));
    }

    // ── Swap outcomes ──

    #[test]
    fn unmatched_swap_is_undone_exactly() {
        let mut c = scripted(striped_board(8, 8), "R");
        let before = c.grid().clone();
        assert!(c.request_swap(p(0, 0), p(1, 0)));
        assert_eq!(c.grid(), &before);
        assert!(c.history().is_empty());
        assert_eq!(c.drain_events(), vec![
            CascadeEvent::SwapCommitted { a: p(0, 0), b: p(1, 0) },
            CascadeEvent::SwapReverted { a: p(0, 0), b: p(1, 0) },
        ]);
        assert!(!c.is_busy());
    }

    #[test]
    fn red_run_on_row_four() {
        let mut c = scripted(red_swap_board(), "YPG");
        assert!(c.request_swap(p(3, 3), p(3, 4)));
        assert_eq!(c.history(), &[Command::Swap { a: p(3, 3), b: p(3, 4) }]);

        let events = c.drain_events();
        let round = events.iter().find_map(|e| match e {
            CascadeEvent::Round(r) => Some(r),
            _ => None,
        });
        let round = round.expect("one round");
        let cleared: Vec<Pos> = round.cleared.iter().map(|t| t.pos).collect();
        assert_eq!(cleared, vec![p(2, 4), p(3, 4), p(4, 4)]);
        assert_eq!(round.score_delta, 15);
        assert!(events.contains(&CascadeEvent::ComboChanged {
            from: 0, to: 1, cue: crate::sim::event::ComboCue::Silent,
        }));
        assert_eq!(c.combo(), 0);
        assert!(c.grid().is_full());
    }

    // ── Item effects ──

    #[test]
    fn clear_all_leaves_no_original_token() {
        let mut c = random(7);
        let original: Vec<_> = c.grid().tokens().map(|t| t.id).collect();
        assert!(c.trigger_clear_all());
        assert_eq!(c.grid().occupied(), 64);
        assert!(c.grid().tokens().all(|t| !original.contains(&t.id)));
    }

    #[test]
    fn cross_band_spares_the_corners() {
        let mut c = random(8);
        assert!(c.trigger_clear_cross());
        let cells = c.drain_events().into_iter().find_map(|e| match e {
            CascadeEvent::CrossConverted { cells } => Some(cells),
            _ => None,
        });
        let cells = cells.expect("cross converted");
        for x in 0..8 {
            for y in 0..8 {
                let in_band = (3..=4).contains(&x) || (3..=4).contains(&y);
                assert_eq!(cells.contains(&p(x, y)), in_band, "({x},{y})");
            }
        }
    }

    // ── Properties over random play ──

    #[test]
    fn random_play_keeps_board_consistent() {
        let mut c = random(2024);
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..300 {
            let a = p(rng.random_range(0..8), rng.random_range(0..7));
            let b = if rng.random_bool(0.5) { p(a.x, a.y + 1) } else { p((a.x + 1).min(7), a.y) };
            c.request_swap(a, b);

            for e in c.drain_events() {
                if let CascadeEvent::Round(r) = e {
                    assert!(r.combo_level <= 3);
                }
            }
            assert!(c.grid().is_full());
            assert!(c.grid().is_gravity_consistent());
            assert!(c.grid().positions_consistent());
            assert_eq!(c.combo(), 0, "natural settles always reset");
            assert!(!c.is_busy());
        }
    }

    #[test]
    fn item_effect_carries_combo_into_next_swap() {
        // Clear-all refills the board into the red-swap layout (column by
        // column, bottom to top), then the swap's own refill draws "YPG".
        let layout = red_swap_board();
        let mut script: Vec<TokenKind> = layout.positions().filter_map(|pos| layout.kind_at(pos)).collect();
        script.extend([TokenKind::Yellow, TokenKind::Pink, TokenKind::Green]);
        let mut c = ActionController::new(
            striped_board(8, 8),
            CascadeEngine::default(),
            ScriptedKinds::new(script),
        );

        assert!(c.trigger_clear_all());
        assert_eq!(c.grid().to_diagram(), layout.to_diagram());
        assert_eq!(c.combo(), 1, "carried past the clear-all settle");
        assert!(!c.engine().manual_erase_pending());
        c.drain_events();

        assert!(c.request_swap(p(3, 3), p(3, 4)));
        let events = c.drain_events();
        let round = events.iter().find_map(|e| match e {
            CascadeEvent::Round(r) => Some(r),
            _ => None,
        });
        let round = round.expect("one round");
        assert_eq!(round.cleared.len(), 3);
        assert_eq!(round.score_delta, 3 * 5 + 3 * 1);
        assert_eq!(round.combo_level, 2);

        let changes: Vec<(u8, u8)> = events
            .iter()
            .filter_map(|e| match e {
                CascadeEvent::ComboChanged { from, to, .. } => Some((*from, *to)),
                _ => None,
            })
            .collect();
        assert_eq!(changes, vec![(1, 2), (2, 0)]);
        assert_eq!(c.combo(), 0);
    }

    #[test]
    fn disabled_input_blocks_item_effects() {
        let mut c = random(6);
        let before = c.grid().clone();
        c.set_input_enabled(false);
        assert!(!c.trigger_clear_all());
        assert!(!c.trigger_clear_cross());
        assert_eq!(c.grid(), &before);
        assert!(c.drain_events().is_empty());
        c.set_input_enabled(true);
        assert!(c.trigger_clear_cross());
    }
}
