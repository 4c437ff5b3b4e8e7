// Valuation engine: raw stats -> expected fantasy points per player.

pub mod contributors;
pub mod heuristic;
pub mod jitter;
pub mod params;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LineupError;
use crate::player::Player;

pub use contributors::{
    ExternalPrediction, ExternalPredictionContributor, MatchupContributor, PitchCondition,
    ScoringContributor,
};
pub use jitter::{JitterSource, NoJitter, SeededJitter};
pub use params::ValuationParams;

// ---------------------------------------------------------------------------
// Match context
// ---------------------------------------------------------------------------

/// The fixture a valuation is computed for. `home` is the host side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    pub home: String,
    pub away: String,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub pitch: Option<PitchCondition>,
}

impl MatchContext {
    pub fn new(home: &str, away: &str) -> Result<Self, LineupError> {
        if home == away {
            return Err(LineupError::SameSide(home.to_string()));
        }
        Ok(MatchContext {
            home: home.to_string(),
            away: away.to_string(),
            venue: None,
            pitch: None,
        })
    }

    pub fn at_venue(mut self, venue: &str) -> Self {
        self.venue = Some(venue.to_string());
        self
    }

    pub fn on_pitch(mut self, pitch: PitchCondition) -> Self {
        self.pitch = Some(pitch);
        self
    }

    pub fn is_home(&self, side: &str) -> bool {
        self.home == side
    }

    /// The side a player from `side` is playing against.
    pub fn opponent_of(&self, side: &str) -> Result<&str, LineupError> {
        if side == self.home {
            Ok(&self.away)
        } else if side == self.away {
            Ok(&self.home)
        } else {
            Err(self.unknown_side(side))
        }
    }

    pub(crate) fn unknown_side(&self, side: &str) -> LineupError {
        LineupError::UnknownSide {
            side: side.to_string(),
            home: self.home.clone(),
            away: self.away.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Valued player
// ---------------------------------------------------------------------------

/// A signed value change recorded by a scoring contributor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub source: String,
    pub delta: f64,
}

/// Component breakdown kept for explainability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValueBreakdown {
    pub lineup: f64,
    pub batting: f64,
    pub bowling: f64,
    pub fielding: f64,
    pub jitter_factor: f64,
    pub home_factor: f64,
    pub adjustments: Vec<Adjustment>,
}

/// A player plus the engine's expected fantasy points for one match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuedPlayer {
    pub player: Player,
    /// Value used for selection. Equal to `base_value` unless a strategy
    /// reweighted it.
    pub value: f64,
    /// Value as produced by the engine.
    pub base_value: f64,
    pub breakdown: ValueBreakdown,
}

impl ValuedPlayer {
    pub fn name(&self) -> &str {
        &self.player.name
    }

    pub fn side(&self) -> &str {
        &self.player.side
    }

    /// Value per unit of cost. Free players rank ahead of everyone.
    pub fn value_per_cost(&self) -> f64 {
        if self.player.cost > 0.0 {
            self.value / self.player.cost
        } else {
            f64::INFINITY
        }
    }

    /// Same player with a different selection value.
    pub fn with_value(&self, value: f64) -> Self {
        ValuedPlayer {
            value,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Heuristic scoring model plus an ordered list of optional contributors.
pub struct ValuationEngine {
    params: ValuationParams,
    contributors: Vec<Box<dyn ScoringContributor>>,
}

impl ValuationEngine {
    pub fn new(params: ValuationParams) -> Result<Self, LineupError> {
        params.validate()?;
        Ok(ValuationEngine {
            params,
            contributors: Vec::new(),
        })
    }

    /// Register a contributor. Contributors run in registration order after
    /// the heuristic, jitter and home-side steps.
    pub fn with_contributor(mut self, contributor: impl ScoringContributor + 'static) -> Self {
        self.contributors.push(Box::new(contributor));
        self
    }

    pub fn params(&self) -> &ValuationParams {
        &self.params
    }

    /// Value a single player.
    ///
    /// Steps:
    /// 1. Lineup-inclusion baseline.
    /// 2. Batting contribution (runs, boundaries, milestones, strike rate).
    /// 3. Bowling contribution (wickets, dismissals, milestones, dots, economy).
    /// 4. Role-scaled fielding contribution.
    /// 5. Multiplicative jitter, tighter for consistent players.
    /// 6. Home-side multiplier.
    /// 7. Registered contributors, in order.
    pub fn value_player(
        &self,
        player: &Player,
        ctx: &MatchContext,
        jitter: &mut dyn JitterSource,
    ) -> Result<ValuedPlayer, LineupError> {
        if !player.cost.is_finite() || player.cost < 0.0 {
            return Err(LineupError::InvalidCost {
                name: player.name.clone(),
                cost: player.cost,
            });
        }
        // Validates the side against the fixture.
        ctx.opponent_of(&player.side)?;

        let p = &self.params;
        let stats = &player.stats;

        let batting = stats
            .batting
            .map_or(0.0, |b| heuristic::batting_points(&b, p));
        let bowling = stats
            .bowling
            .map_or(0.0, |b| heuristic::bowling_points(&b, p));
        let fielding = heuristic::fielding_points(player.role, stats.matches(), p);

        let mut value = p.lineup_bonus + batting + bowling + fielding;

        let jitter_factor = jitter.factor(stats.consistency_index(), p);
        value *= jitter_factor;

        let home_factor = if ctx.is_home(&player.side) {
            p.home_factor
        } else {
            1.0
        };
        value *= home_factor;

        let mut adjustments = Vec::new();
        for contributor in &self.contributors {
            let next = contributor.contribute(player, ctx, value);
            if next != value {
                adjustments.push(Adjustment {
                    source: contributor.name().to_string(),
                    delta: next - value,
                });
            }
            value = next;
        }

        debug!(
            player = %player.name,
            side = %player.side,
            role = %player.role,
            value,
            "valued player"
        );

        Ok(ValuedPlayer {
            player: player.clone(),
            value,
            base_value: value,
            breakdown: ValueBreakdown {
                lineup: p.lineup_bonus,
                batting,
                bowling,
                fielding,
                jitter_factor,
                home_factor,
                adjustments,
            },
        })
    }

    /// Value every player on both sides, preserving input order.
    ///
    /// Rejects players whose side is not part of the fixture and duplicate
    /// names within a side.
    pub fn value_players(
        &self,
        players: &[Player],
        ctx: &MatchContext,
        jitter: &mut dyn JitterSource,
    ) -> Result<Vec<ValuedPlayer>, LineupError> {
        let mut seen: HashSet<(&str, &str)> = HashSet::new();
        let mut valued = Vec::with_capacity(players.len());
        for player in players {
            if !seen.insert((player.side.as_str(), player.name.as_str())) {
                return Err(LineupError::DuplicatePlayer {
                    name: player.name.clone(),
                    side: player.side.clone(),
                });
            }
            valued.push(self.value_player(player, ctx, jitter)?);
        }
        Ok(valued)
    }
}

impl std::fmt::Debug for ValuationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.contributors.iter().map(|c| c.name()).collect();
        f.debug_struct("ValuationEngine")
            .field("params", &self.params)
            .field("contributors", &names)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
