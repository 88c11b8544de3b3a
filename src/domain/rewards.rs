/// Reward arithmetic for one cleared set.
///
/// With `n` cleared tokens and combo level `c` (before the round advances it):
///   score = n × score_per_token + n × combo_bonus_per_token × c
///   time  = n × time_per_token × (c + 1)
///   gauge = per gauge-feeding kind, count × gauge_per_token

use std::collections::BTreeMap;

use serde::Serialize;

use super::token::{Token, TokenKind};

#[derive(Clone, Debug, PartialEq)]
pub struct RewardRules {
    pub score_per_token: u32,
    pub combo_bonus_per_token: u32,
    pub time_per_token: f32,
    pub gauge_per_token: f32,
}

impl Default for RewardRules {
    fn default() -> Self {
        RewardRules {
            score_per_token: 5,
            combo_bonus_per_token: 1,
            time_per_token: 0.1,
            gauge_per_token: 10.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Rewards {
    pub score: u32,
    pub time: f32,
    pub gauges: BTreeMap<TokenKind, f32>,
}

impl RewardRules {
    pub fn evaluate(&self, cleared: &[Token], combo: u8) -> Rewards {
        let n = cleared.len() as u32;
        let c = u32::from(combo);
        let mut gauges = BTreeMap::new();
        for t in cleared.iter().filter(|t| t.kind.item().is_some()) {
            *gauges.entry(t.kind).or_insert(0.0) += self.gauge_per_token;
        }
        Rewards {
            score: n
                .saturating_mul(self.score_per_token)
                .saturating_add(n.saturating_mul(self.combo_bonus_per_token).saturating_mul(c)),
            time: n as f32 * self.time_per_token * (c + 1) as f32,
            gauges,
        }
    }
}
