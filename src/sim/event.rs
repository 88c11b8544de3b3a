/// Events emitted while resolving an action.
/// The presentation layer consumes these for animation/sound;
/// score, clock and gauge collaborators consume the round rewards.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::domain::grid::Fall;
use crate::domain::token::{Pos, Token, TokenKind};

/// Audio/visual cue attached to a combo change.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum ComboCue {
    Reset,  // back to 0
    Silent, // level 1
    Rising, // level 2
    Peak,   // level 3 and above
}

impl ComboCue {
    pub fn for_level(level: u8) -> Self {
        match level {
            0 => ComboCue::Reset,
            1 => ComboCue::Silent,
            2 => ComboCue::Rising,
            _ => ComboCue::Peak,
        }
    }
}

/// One clear → gravity → refill cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RoundReport {
    /// 0 for the round started by the action itself.
    pub index: usize,
    pub cleared: Vec<Token>,
    pub falls: Vec<Fall>,
    pub spawned: Vec<Token>,
    /// Combo level after this round advanced it.
    pub combo_level: u8,
    pub score_delta: u32,
    pub time_delta: f32,
    pub gauge_deltas: BTreeMap<TokenKind, f32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum CascadeEvent {
    SwapCommitted { a: Pos, b: Pos },
    /// The swap produced no match and was undone.
    SwapReverted { a: Pos, b: Pos },
    CrossConverted { cells: Vec<Pos> },
    Round(RoundReport),
    ComboChanged { from: u8, to: u8, cue: ComboCue },
    Settled { rounds: usize, combo: u8 },
}
