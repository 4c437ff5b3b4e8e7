// Strategy modulation: reweight valued players before selection.
//
// All strategies share one valuation pass and one constraint set. They only
// differ in the value transform applied before the selector runs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LineupError;
use crate::selection::{select_squad, Constraints, SelectionMode, Squad};
use crate::valuation::{MatchContext, ValuedPlayer};

/// Recent-form ratios above this are treated as equally volatile.
const MAX_FORM_RATIO: f64 = 3.0;

/// Consistency index at which the risk-averse boost is full strength.
const MAX_CONSISTENCY: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Aggressive,
    Balanced,
    RiskAverse,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Aggressive, Strategy::Balanced, Strategy::RiskAverse];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Aggressive => "aggressive",
            Strategy::Balanced => "balanced",
            Strategy::RiskAverse => "risk_averse",
        }
    }

    pub fn from_str_strategy(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "aggressive" => Some(Strategy::Aggressive),
            "balanced" => Some(Strategy::Balanced),
            "risk_averse" | "safe" | "conservative" => Some(Strategy::RiskAverse),
            _ => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strength of each strategy's reweighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyParams {
    /// Maximum fractional boost for the top-ranked player under Aggressive.
    pub aggressive_boost: f64,
    /// Fractional boost at consistency 10 under RiskAverse.
    pub consistency_boost: f64,
    /// Fractional penalty per unit of recent-form / career-average ratio
    /// when no consistency index is known.
    pub volatility_penalty: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            aggressive_boost: 0.2,
            consistency_boost: 0.2,
            volatility_penalty: 0.1,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), LineupError> {
        for (field, v) in [
            ("aggressive_boost", self.aggressive_boost),
            ("consistency_boost", self.consistency_boost),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(LineupError::param(field, "must be a non-negative number"));
            }
        }
        // Keeps the worst-case risk-averse factor positive.
        if !self.volatility_penalty.is_finite()
            || self.volatility_penalty < 0.0
            || self.volatility_penalty * MAX_FORM_RATIO >= 1.0
        {
            return Err(LineupError::param(
                "volatility_penalty",
                format!("must be in [0, {:.3})", 1.0 / MAX_FORM_RATIO),
            ));
        }
        Ok(())
    }
}

/// Apply a strategy's transform to every player's base value.
///
/// The returned players keep `base_value` and carry the reweighted figure
/// in `value`. Input order is preserved.
pub fn reweight(
    players: &[ValuedPlayer],
    strategy: Strategy,
    params: &StrategyParams,
) -> Vec<ValuedPlayer> {
    match strategy {
        Strategy::Balanced => players
            .iter()
            .map(|p| p.with_value(p.base_value))
            .collect(),
        Strategy::Aggressive => aggressive(players, params),
        Strategy::RiskAverse => players
            .iter()
            .map(|p| p.with_value(risk_averse_value(p, params)))
            .collect(),
    }
}

/// Boost by rank: the top player gains `aggressive_boost`, the bottom
/// player close to nothing.
fn aggressive(players: &[ValuedPlayer], params: &StrategyParams) -> Vec<ValuedPlayer> {
    let n = players.len();
    let mut ranked: Vec<usize> = (0..n).collect();
    ranked.sort_by(|&a, &b| players[b].base_value.total_cmp(&players[a].base_value));

    let mut factors = vec![0.0; n];
    for (rank, &i) in ranked.iter().enumerate() {
        factors[i] = params.aggressive_boost * (1.0 - rank as f64 / n as f64);
    }

    players
        .iter()
        .zip(factors)
        .map(|(p, f)| p.with_value(p.base_value + p.base_value.abs() * f))
        .collect()
}

fn risk_averse_value(p: &ValuedPlayer, params: &StrategyParams) -> f64 {
    let base = p.base_value;
    let stats = &p.player.stats;

    if let Some(ci) = stats.consistency_index() {
        let t = ci.clamp(0.0, MAX_CONSISTENCY) / MAX_CONSISTENCY;
        return base + base.abs() * params.consistency_boost * t;
    }

    let career = stats.batting.map(|b| b.average).filter(|a| *a > 0.0);
    match (stats.recent_form, career) {
        (Some(form), Some(avg)) if form.is_finite() && form >= 0.0 => {
            let ratio = (form / avg).min(MAX_FORM_RATIO);
            base - base.abs() * params.volatility_penalty * ratio
        }
        _ => base,
    }
}

/// Reweight for one strategy and run the selector.
pub fn select_for_strategy(
    players: &[ValuedPlayer],
    ctx: &MatchContext,
    constraints: &Constraints,
    mode: SelectionMode,
    strategy: Strategy,
    params: &StrategyParams,
) -> Result<Squad, LineupError> {
    let pool = reweight(players, strategy, params);
    debug!(strategy = %strategy, players = pool.len(), "selecting for strategy");
    select_squad(&pool, ctx, constraints, mode)
}

/// One squad per strategy from a single valuation pass.
pub fn select_all_strategies(
    players: &[ValuedPlayer],
    ctx: &MatchContext,
    constraints: &Constraints,
    mode: SelectionMode,
    params: &StrategyParams,
) -> Result<BTreeMap<Strategy, Squad>, LineupError> {
    params.validate()?;
    let mut squads = BTreeMap::new();
    for strategy in Strategy::ALL {
        let squad = select_for_strategy(players, ctx, constraints, mode, strategy, params)?;
        squads.insert(strategy, squad);
    }
    Ok(squads)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
