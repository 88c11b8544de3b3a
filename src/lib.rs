//! Match Cascade: an engine-independent match-3 simulation core.
//!
//! `domain` holds pure board types and queries, `sim` resolves player
//! actions into settled boards plus event lists, and `config` loads the
//! tunable rules. Rendering, input and audio live outside this crate and
//! consume the emitted [`CascadeEvent`]s.

pub mod config;
pub mod domain;
pub mod sim;

pub use config::{ConfigError, GameConfig};
pub use domain::grid::{Fall, Grid};
pub use domain::kinds::{KindSource, RandomKinds, ScriptedKinds};
pub use domain::matcher::MatchFinder;
pub use domain::rewards::{RewardRules, Rewards};
pub use domain::token::{Item, Pos, Token, TokenId, TokenKind};
pub use sim::action::{ActionController, Command, CommandStack};
pub use sim::cascade::{CascadeEngine, Phase};
pub use sim::event::{CascadeEvent, ComboCue, RoundReport};
pub use sim::session::{GameState, Session, SessionError};
