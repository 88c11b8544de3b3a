/// External configuration loader.
///
/// Reads `match-cascade.toml` from the executable's directory (or CWD).
/// Falls back to defaults if the file is missing, unreadable, or invalid.
///
/// ```toml
/// [board]
/// width = 8
/// height = 8
/// palette = ["Red", "Blue", "Pink", "Green", "Yellow"]
/// walls = [{ x = 0, y = 7 }]
///
/// [rules]
/// max_combo = 3
///
/// [session]
/// time_limit_secs = 90.0
/// ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::grid::Grid;
use crate::domain::matcher::MatchFinder;
use crate::domain::rewards::RewardRules;
use crate::domain::token::{Pos, TokenKind};
use crate::sim::cascade::CascadeEngine;

pub const CONFIG_FILE: &str = "match-cascade.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Public Config Struct ──

#[derive(Clone, Debug, PartialEq)]
pub struct GameConfig {
    pub board: BoardConfig,
    pub rules: RuleConfig,
    pub session: SessionConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoardConfig {
    pub width: usize,
    pub height: usize,
    pub palette: Vec<TokenKind>,
    pub walls: Vec<Pos>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RuleConfig {
    pub score_per_token: u32,
    pub combo_bonus_per_token: u32,
    pub time_per_token: f32,
    pub gauge_per_token: f32,
    pub max_combo: u8,
    pub min_run: usize,
    pub max_rounds: usize,   // runaway-cascade guard
}

#[derive(Clone, Debug, PartialEq)]
pub struct SessionConfig {
    pub time_limit_secs: f32,
    pub gauge_max: f32,
    pub clock_item_bonus_secs: f32,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    #[serde(default)]
    board: TomlBoard,
    #[serde(default)]
    rules: TomlRules,
    #[serde(default)]
    session: TomlSession,
}

#[derive(Deserialize, Debug)]
struct TomlBoard {
    #[serde(default = "default_width")]
    width: usize,
    #[serde(default = "default_height")]
    height: usize,
    #[serde(default = "default_palette")]
    palette: Vec<TokenKind>,
    #[serde(default)]
    walls: Vec<Pos>,
}

#[derive(Deserialize, Debug)]
struct TomlRules {
    #[serde(default = "default_score_per_token")]
    score_per_token: u32,
    #[serde(default = "default_combo_bonus")]
    combo_bonus_per_token: u32,
    #[serde(default = "default_time_per_token")]
    time_per_token: f32,
    #[serde(default = "default_gauge_per_token")]
    gauge_per_token: f32,
    #[serde(default = "default_max_combo")]
    max_combo: u8,
    #[serde(default = "default_min_run")]
    min_run: usize,
    #[serde(default = "default_max_rounds")]
    max_rounds: usize,
}

#[derive(Deserialize, Debug)]
struct TomlSession {
    #[serde(default = "default_time_limit")]
    time_limit_secs: f32,
    #[serde(default = "default_gauge_max")]
    gauge_max: f32,
    #[serde(default = "default_clock_bonus")]
    clock_item_bonus_secs: f32,
}

// ── Defaults ──

fn default_width() -> usize { 8 }
fn default_height() -> usize { 8 }
fn default_palette() -> Vec<TokenKind> { TokenKind::COLORS.to_vec() }
fn default_score_per_token() -> u32 { 5 }
fn default_combo_bonus() -> u32 { 1 }
fn default_time_per_token() -> f32 { 0.1 }
fn default_gauge_per_token() -> f32 { 10.0 }
fn default_max_combo() -> u8 { 3 }
fn default_min_run() -> usize { 3 }
fn default_max_rounds() -> usize { 64 }
fn default_time_limit() -> f32 { 120.0 }
fn default_gauge_max() -> f32 { 100.0 }
fn default_clock_bonus() -> f32 { 10.0 }

impl Default for TomlBoard {
    fn default() -> Self {
        TomlBoard {
            width: default_width(),
            height: default_height(),
            palette: default_palette(),
            walls: vec![],
        }
    }
}

impl Default for TomlRules {
    fn default() -> Self {
        TomlRules {
            score_per_token: default_score_per_token(),
            combo_bonus_per_token: default_combo_bonus(),
            time_per_token: default_time_per_token(),
            gauge_per_token: default_gauge_per_token(),
            max_combo: default_max_combo(),
            min_run: default_min_run(),
            max_rounds: default_max_rounds(),
        }
    }
}

impl Default for TomlSession {
    fn default() -> Self {
        TomlSession {
            time_limit_secs: default_time_limit(),
            gauge_max: default_gauge_max(),
            clock_item_bonus_secs: default_clock_bonus(),
        }
    }
}

impl From<TomlConfig> for GameConfig {
    fn from(t: TomlConfig) -> Self {
        GameConfig {
            board: BoardConfig {
                width: t.board.width,
                height: t.board.height,
                palette: t.board.palette,
                walls: t.board.walls,
            },
            rules: RuleConfig {
                score_per_token: t.rules.score_per_token,
                combo_bonus_per_token: t.rules.combo_bonus_per_token,
                time_per_token: t.rules.time_per_token,
                gauge_per_token: t.rules.gauge_per_token,
                max_combo: t.rules.max_combo,
                min_run: t.rules.min_run,
                max_rounds: t.rules.max_rounds,
            },
            session: SessionConfig {
                time_limit_secs: t.session.time_limit_secs,
                gauge_max: t.session.gauge_max,
                clock_item_bonus_secs: t.session.clock_item_bonus_secs,
            },
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        TomlConfig::default().into()
    }
}

// ── Loading ──

impl GameConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let cfg: GameConfig = toml::from_str::<TomlConfig>(text)?.into();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load `match-cascade.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Any problem with the first file found falls back to defaults.
    pub fn load() -> Self {
        for dir in candidate_dirs() {
            let path = dir.join(CONFIG_FILE);
            if !path.exists() { continue; }
            return match Self::load_from(&path) {
                Ok(cfg) => {
                    debug!(path = %path.display(), "loaded config");
                    cfg
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "using default settings");
                    GameConfig::default()
                }
            };
        }
        GameConfig::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        let b = &self.board;
        if b.width == 0 || b.height == 0 {
            return invalid(format!("board must be at least 1x1, got {}x{}", b.width, b.height));
        }
        if b.palette.is_empty() {
            return invalid("palette is empty".into());
        }
        if let Some(k) = b.palette.iter().find(|k| !k.is_color()) {
            return invalid(format!("{k:?} cannot be used in the palette"));
        }
        if let Some(w) = b.walls.iter().find(|w| w.x >= b.width || w.y >= b.height) {
            return invalid(format!("wall at ({}, {}) is off the board", w.x, w.y));
        }

        let r = &self.rules;
        if r.max_combo == 0 {
            return invalid("max_combo must be at least 1".into());
        }
        if r.min_run < 2 {
            return invalid(format!("min_run must be at least 2, got {}", r.min_run));
        }
        if r.max_rounds == 0 {
            return invalid("max_rounds must be at least 1".into());
        }

        let s = &self.session;
        if !(s.time_limit_secs > 0.0) {
            return invalid(format!("time_limit_secs must be positive, got {}", s.time_limit_secs));
        }
        if !(s.gauge_max > 0.0) {
            return invalid(format!("gauge_max must be positive, got {}", s.gauge_max));
        }
        Ok(())
    }
}

// ── Builders ──

impl GameConfig {
    pub fn reward_rules(&self) -> RewardRules {
        RewardRules {
            score_per_token: self.rules.score_per_token,
            combo_bonus_per_token: self.rules.combo_bonus_per_token,
            time_per_token: self.rules.time_per_token,
            gauge_per_token: self.rules.gauge_per_token,
        }
    }

    pub fn finder(&self) -> MatchFinder {
        MatchFinder::new(self.rules.min_run)
    }

    pub fn engine(&self) -> CascadeEngine {
        CascadeEngine::new(self.finder(), self.reward_rules(), self.rules.max_combo, self.rules.max_rounds)
    }

    /// Empty board with the configured walls in place.
    pub fn build_grid(&self) -> Grid {
        Grid::with_walls(self.board.width, self.board.height, &self.board.walls)
    }
}

/// Candidate directories to search: exe dir + CWD (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }
    dirs
}
