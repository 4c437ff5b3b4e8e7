// Pluggable scoring contributors layered on top of the heuristic value.
//
// The engine runs without any of these. Each one is registered explicitly
// with `ValuationEngine::with_contributor`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::LineupError;
use crate::player::{Player, Role};
use crate::valuation::MatchContext;

/// A signal that adjusts a player's value after the heuristic model.
pub trait ScoringContributor {
    /// Short label recorded in the value breakdown.
    fn name(&self) -> &'static str;

    /// Return the adjusted value. Contributors with nothing to say about a
    /// player return `value` unchanged.
    fn contribute(&self, player: &Player, ctx: &MatchContext, value: f64) -> f64;
}

// ---------------------------------------------------------------------------
// Pitch / venue / opposition matchup
// ---------------------------------------------------------------------------

/// Pitch character for the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PitchCondition {
    Batting,
    Bowling,
    Balanced,
    Spin,
}

impl PitchCondition {
    pub fn from_str_pitch(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bat" | "batting" => Some(PitchCondition::Batting),
            "bwl" | "bowl" | "bowling" => Some(PitchCondition::Bowling),
            "bal" | "balanced" => Some(PitchCondition::Balanced),
            "spin" => Some(PitchCondition::Spin),
            _ => None,
        }
    }

    /// Multiplier applied to a role's value on this pitch.
    pub fn role_factor(&self, role: Role) -> f64 {
        match (self, role) {
            (PitchCondition::Batting, Role::Batter | Role::WicketKeeper) => 1.2,
            (PitchCondition::Batting, Role::AllRounder) => 1.1,
            (PitchCondition::Batting, Role::Bowler) => 0.8,
            (PitchCondition::Bowling, Role::Batter | Role::WicketKeeper) => 0.8,
            (PitchCondition::Bowling, Role::AllRounder) => 0.9,
            (PitchCondition::Bowling, Role::Bowler) => 1.2,
            (PitchCondition::Balanced, Role::AllRounder) => 1.1,
            (PitchCondition::Balanced, _) => 1.0,
            (PitchCondition::Spin, Role::Batter | Role::WicketKeeper) => 0.9,
            (PitchCondition::Spin, Role::AllRounder) => 1.0,
            (PitchCondition::Spin, Role::Bowler) => 1.1,
        }
    }
}

/// Applies the pitch factor and the averaged venue / opposition rating
/// bonus. Ratings are on a 0-1 scale.
#[derive(Debug, Clone)]
pub struct MatchupContributor {
    pub venue_weight: f64,
    pub opposition_weight: f64,
}

impl Default for MatchupContributor {
    fn default() -> Self {
        MatchupContributor {
            venue_weight: 20.0,
            opposition_weight: 25.0,
        }
    }
}

impl MatchupContributor {
    /// Mean of the venue and opposition bonuses that are actually present.
    fn rating_bonus(&self, player: &Player, ctx: &MatchContext) -> f64 {
        let mut total = 0.0;
        let mut factors = 0u32;

        if let Some(rating) = ctx
            .venue
            .as_ref()
            .and_then(|v| player.stats.venue_ratings.get(v))
            .filter(|r| r.is_finite())
        {
            total += rating * self.venue_weight;
            factors += 1;
        }

        if let Some(rating) = ctx
            .opponent_of(&player.side)
            .ok()
            .and_then(|opp| player.stats.opposition_ratings.get(opp))
            .filter(|r| r.is_finite())
        {
            total += rating * self.opposition_weight;
            factors += 1;
        }

        if factors == 0 {
            0.0
        } else {
            total / factors as f64
        }
    }
}

impl ScoringContributor for MatchupContributor {
    fn name(&self) -> &'static str {
        "matchup"
    }

    fn contribute(&self, player: &Player, ctx: &MatchContext, value: f64) -> f64 {
        let adjusted = value + self.rating_bonus(player, ctx);
        match ctx.pitch {
            Some(pitch) => adjusted * pitch.role_factor(player.role),
            None => adjusted,
        }
    }
}

// ---------------------------------------------------------------------------
// External performance predictions
// ---------------------------------------------------------------------------

/// Classification probabilities emitted by an external model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassProbabilities {
    #[serde(default)]
    pub high: f64,
    #[serde(default)]
    pub medium: f64,
    #[serde(default)]
    pub low: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BattingPrediction {
    #[serde(default)]
    pub predicted_runs: Option<f64>,
    #[serde(default)]
    pub class_probabilities: Option<ClassProbabilities>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BowlingPrediction {
    #[serde(default)]
    pub predicted_wickets: Option<f64>,
    #[serde(default)]
    pub class_probabilities: Option<ClassProbabilities>,
}

/// One player's externally produced performance forecast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalPrediction {
    #[serde(default)]
    pub batting: Option<BattingPrediction>,
    #[serde(default)]
    pub bowling: Option<BowlingPrediction>,
}

/// Points-scale weights for turning a forecast into expected points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionWeights {
    pub batting_high: f64,
    pub batting_medium: f64,
    pub points_per_predicted_wicket: f64,
    pub bowling_high: f64,
    pub bowling_medium: f64,
}

impl Default for PredictionWeights {
    fn default() -> Self {
        PredictionWeights {
            batting_high: 50.0,
            batting_medium: 25.0,
            points_per_predicted_wicket: 20.0,
            bowling_high: 60.0,
            bowling_medium: 30.0,
        }
    }
}

impl ExternalPrediction {
    /// Expected points implied by the forecast, gated by role: batting
    /// forecasts count for roles that bat, bowling forecasts for roles that
    /// bowl. Returns `None` when nothing applies to this role.
    pub fn points_for(&self, role: Role, weights: &PredictionWeights) -> Option<f64> {
        let mut points = None;

        if let Some(bat) = self.batting.filter(|_| role.bats()) {
            let mut p = bat.predicted_runs.unwrap_or(0.0);
            if let Some(probs) = bat.class_probabilities {
                p += probs.high * weights.batting_high + probs.medium * weights.batting_medium;
            }
            points = Some(points.unwrap_or(0.0) + p);
        }

        if let Some(bowl) = self.bowling.filter(|_| role.bowls()) {
            let mut p = bowl.predicted_wickets.unwrap_or(0.0) * weights.points_per_predicted_wicket;
            if let Some(probs) = bowl.class_probabilities {
                p += probs.high * weights.bowling_high + probs.medium * weights.bowling_medium;
            }
            points = Some(points.unwrap_or(0.0) + p);
        }

        points.filter(|p| p.is_finite())
    }
}

/// Blends external forecasts into the heuristic value:
/// `value * (1 - w) + external * w`.
#[derive(Debug, Clone)]
pub struct ExternalPredictionContributor {
    blend_weight: f64,
    weights: PredictionWeights,
    /// Keyed by (side, player name).
    predictions: HashMap<(String, String), ExternalPrediction>,
}

impl ExternalPredictionContributor {
    pub fn new(blend_weight: f64) -> Result<Self, LineupError> {
        if !(0.0..=1.0).contains(&blend_weight) {
            return Err(LineupError::param(
                "blend_weight",
                format!("must be between 0.0 and 1.0 inclusive, got {blend_weight}"),
            ));
        }
        Ok(ExternalPredictionContributor {
            blend_weight,
            weights: PredictionWeights::default(),
            predictions: HashMap::new(),
        })
    }

    pub fn with_weights(mut self, weights: PredictionWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn insert(&mut self, side: &str, name: &str, prediction: ExternalPrediction) {
        self.predictions
            .insert((side.to_string(), name.to_string()), prediction);
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

impl ScoringContributor for ExternalPredictionContributor {
    fn name(&self) -> &'static str {
        "external"
    }

    fn contribute(&self, player: &Player, _ctx: &MatchContext, value: f64) -> f64 {
        let key = (player.side.clone(), player.name.clone());
        let Some(external) = self
            .predictions
            .get(&key)
            .and_then(|p| p.points_for(player.role, &self.weights))
        else {
            return value;
        };
        value * (1.0 - self.blend_weight) + external * self.blend_weight
    }
}
