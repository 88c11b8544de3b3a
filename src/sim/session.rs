/// One timed play session: score, clock and item gauges around a controller.
///
/// ## State Machine
///
///   NotStarted ──start──▶ Playing ⇄ Paused
///                            │ clock hits 0
///                            ▼
///                         GameOver ──restart──▶ Playing
///
/// Round rewards flow in from the controller's events; the session applies
/// them and re-emits the events unchanged for presentation.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::{GameConfig, SessionConfig};
use crate::domain::kinds::KindSource;
use crate::domain::token::{Item, Pos};
use super::action::ActionController;
use super::event::CascadeEvent;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub enum GameState {
    NotStarted,
    Playing,
    Paused,
    GameOver,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session is not in play")]
    NotPlaying,
    #[error("{0:?} gauge is not full")]
    NotCharged(Item),
    #[error("an action is still resolving")]
    Busy,
}

pub struct Session<K> {
    controller: ActionController<K>,
    rules: SessionConfig,
    state: GameState,
    score: u64,
    time_left: f32,
    gauges: BTreeMap<Item, f32>,
    events: Vec<CascadeEvent>,
}

impl<K: KindSource> Session<K> {
    pub fn new(controller: ActionController<K>, rules: SessionConfig) -> Self {
        let time_left = rules.time_limit_secs;
        Session {
            controller,
            rules,
            state: GameState::NotStarted,
            score: 0,
            time_left,
            gauges: empty_gauges(),
            events: vec![],
        }
    }

    /// Board, rules and clock from `config`, freshly populated from `kinds`.
    pub fn from_config(config: &GameConfig, kinds: K) -> Self {
        let mut controller = ActionController::new(config.build_grid(), config.engine(), kinds);
        controller.repopulate();
        Session::new(controller, config.session.clone())
    }

    pub fn state(&self) -> GameState { self.state }
    pub fn score(&self) -> u64 { self.score }
    pub fn time_left(&self) -> f32 { self.time_left }
    pub fn controller(&self) -> &ActionController<K> { &self.controller }

    pub fn gauge(&self, item: Item) -> f32 {
        self.gauges.get(&item).copied().unwrap_or(0.0)
    }

    pub fn is_charged(&self, item: Item) -> bool {
        self.gauge(item) >= self.rules.gauge_max
    }

    pub fn drain_events(&mut self) -> Vec<CascadeEvent> {
        std::mem::take(&mut self.events)
    }

    // ── State transitions ──

    pub fn start(&mut self) -> bool {
        if self.state != GameState::NotStarted { return false; }
        self.state = GameState::Playing;
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state != GameState::Playing { return false; }
        self.state = GameState::Paused;
        true
    }

    pub fn resume(&mut self) -> bool {
        if self.state != GameState::Paused { return false; }
        self.state = GameState::Playing;
        true
    }

    /// Fresh board, score, clock and gauges; straight into play.
    pub fn restart(&mut self) {
        self.controller.repopulate();
        self.score = 0;
        self.time_left = self.rules.time_limit_secs;
        self.gauges = empty_gauges();
        self.events.clear();
        self.state = GameState::Playing;
    }

    /// Advance the clock by `dt` seconds. Only runs while playing;
    /// non-positive steps are ignored.
    pub fn tick(&mut self, dt: f32) {
        if self.state != GameState::Playing || !(dt > 0.0) { return; }
        self.time_left = (self.time_left - dt).max(0.0);
        if self.time_left <= 0.0 {
            self.state = GameState::GameOver;
            info!(score = self.score, "time up");
        }
    }

    // ── Actions ──

    /// `Ok(false)` for a rejected swap; see `ActionController::request_swap`.
    pub fn swap(&mut self, a: Pos, b: Pos) -> Result<bool, SessionError> {
        if self.state != GameState::Playing {
            return Err(SessionError::NotPlaying);
        }
        let accepted = self.controller.request_swap(a, b);
        self.absorb_events();
        Ok(accepted)
    }

    /// Spend a full gauge on its effect.
    pub fn use_item(&mut self, item: Item) -> Result<(), SessionError> {
        if self.state != GameState::Playing {
            return Err(SessionError::NotPlaying);
        }
        if self.controller.is_busy() {
            return Err(SessionError::Busy);
        }
        if !self.is_charged(item) {
            return Err(SessionError::NotCharged(item));
        }

        self.gauges.insert(item, 0.0);
        info!(?item, "item used");
        match item {
            Item::Bomb => { self.controller.trigger_clear_all(); }
            Item::Cross => { self.controller.trigger_clear_cross(); }
            Item::Clock => self.add_time(self.rules.clock_item_bonus_secs),
        }
        self.absorb_events();
        Ok(())
    }

    fn absorb_events(&mut self) {
        for event in self.controller.drain_events() {
            if let CascadeEvent::Round(r) = &event {
                self.score += u64::from(r.score_delta);
                self.add_time(r.time_delta);
                for (kind, delta) in &r.gauge_deltas {
                    if let Some(item) = kind.item() {
                        self.charge(item, *delta);
                    }
                }
            }
            self.events.push(event);
        }
    }

    fn add_time(&mut self, secs: f32) {
        self.time_left = (self.time_left + secs).min(self.rules.time_limit_secs);
    }

    fn charge(&mut self, item: Item, amount: f32) {
        let g = self.gauges.entry(item).or_insert(0.0);
        *g = (*g + amount).min(self.rules.gauge_max);
    }
}

fn empty_gauges() -> BTreeMap<Item, f32> {
    Item::ALL.iter().map(|&i| (i, 0.0)).collect()
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════
