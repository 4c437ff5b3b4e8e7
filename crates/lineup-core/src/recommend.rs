// End-to-end pipeline: value both sides once, select a squad per strategy,
// assign leadership, and check every feasible squad against the constraints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::LineupError;
use crate::leadership::assign_leadership;
use crate::player::Player;
use crate::selection::{Constraints, SelectionMode, Squad};
use crate::strategy::{select_all_strategies, Strategy, StrategyParams};
use crate::validate::validate_squad;
use crate::valuation::{JitterSource, MatchContext, ValuationEngine, ValuedPlayer};

/// Everything a recommendation run needs besides the engine and jitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub context: MatchContext,
    /// Players from both sides, in roster order.
    pub players: Vec<Player>,
    pub constraints: Constraints,
    #[serde(default)]
    pub mode: SelectionMode,
    #[serde(default)]
    pub strategy: StrategyParams,
}

impl RecommendRequest {
    pub fn new(context: MatchContext, players: Vec<Player>, constraints: Constraints) -> Self {
        RecommendRequest {
            context,
            players,
            constraints,
            mode: SelectionMode::default(),
            strategy: StrategyParams::default(),
        }
    }

    pub fn with_mode(mut self, mode: SelectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_strategy_params(mut self, params: StrategyParams) -> Self {
        self.strategy = params;
        self
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub context: MatchContext,
    /// Engine output for every player, in roster order.
    pub valued: Vec<ValuedPlayer>,
    pub squads: BTreeMap<Strategy, Squad>,
}

impl Recommendation {
    pub fn squad(&self, strategy: Strategy) -> Option<&Squad> {
        self.squads.get(&strategy)
    }

    /// Whether any strategy produced a legal squad.
    pub fn any_feasible(&self) -> bool {
        self.squads.values().any(|s| s.is_feasible())
    }
}

/// Value, select, lead and validate.
///
/// A validator violation on a feasible squad means the selector is broken;
/// it is logged and returned as `LineupError::SelectorInvariant`.
pub fn recommend(
    engine: &ValuationEngine,
    request: &RecommendRequest,
    jitter: &mut dyn JitterSource,
) -> Result<Recommendation, LineupError> {
    request.constraints.validate()?;

    let valued = engine.value_players(&request.players, &request.context, jitter)?;
    info!(
        players = valued.len(),
        home = %request.context.home,
        away = %request.context.away,
        "valued players"
    );

    let selected = select_all_strategies(
        &valued,
        &request.context,
        &request.constraints,
        request.mode,
        &request.strategy,
    )?;

    let mut squads = BTreeMap::new();
    for (strategy, squad) in selected {
        let squad = assign_leadership(squad);
        if squad.is_feasible() {
            let violations = validate_squad(&squad, &request.constraints);
            if !violations.is_empty() {
                let detail = violations
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                error!(strategy = %strategy, %detail, "selector returned an illegal squad");
                return Err(LineupError::SelectorInvariant(format!("{strategy}: {detail}")));
            }
        }
        info!(
            strategy = %strategy,
            status = squad.status.label(),
            score = squad.score,
            cost = squad.total_cost,
            "squad ready"
        );
        squads.insert(strategy, squad);
    }

    Ok(Recommendation {
        context: request.context.clone(),
        valued,
        squads,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{BattingStats, BowlingStats, RawStats, Role};
    use crate::valuation::{NoJitter, ValuationParams};

    fn make_player(name: &str, side: &str, role: Role, cost: f64, runs: u32, wickets: u32) -> Player {
        Player::new(name, side, role, cost).with_stats(RawStats {
            batting: Some(BattingStats {
                matches: 10,
                runs,
                average: runs as f64 / 10.0,
                strike_rate: 125.0,
            }),
            bowling: (wickets > 0).then_some(BowlingStats {
                matches: 10,
                wickets,
                economy: 7.5,
                average: 25.0,
            }),
            ..Default::default()
        })
    }

    fn roster() -> Vec<Player> {
        let mut players = Vec::new();
        for side in ["Lions", "Tigers"] {
            players.push(make_player(&format!("{side} keeper"), side, Role::WicketKeeper, 8.0, 250, 0));
            for i in 0..4 {
                players.push(make_player(&format!("{side} bat {i}"), side, Role::Batter, 8.5, 300 - i * 20, 0));
            }
            for i in 0..2 {
                players.push(make_player(&format!("{side} ar {i}"), side, Role::AllRounder, 9.0, 180, 10 - i));
            }
            for i in 0..4 {
                players.push(make_player(&format!("{side} bowl {i}"), side, Role::Bowler, 8.0, 40, 14 - i));
            }
        }
        players
    }

    fn request() -> RecommendRequest {
        RecommendRequest::new(
            MatchContext::new("Lions", "Tigers").unwrap(),
            roster(),
            Constraints::default(),
        )
    }

    #[test]
    fn produces_all_three_strategies() {
        let engine = ValuationEngine::new(ValuationParams::default()).unwrap();
        let rec = recommend(&engine, &request(), &mut NoJitter).unwrap();
        assert_eq!(rec.squads.len(), 3);
        assert_eq!(rec.valued.len(), 22);
        for squad in rec.squads.values() {
            assert!(squad.is_feasible());
            assert_eq!(squad.len(), 11);
            assert!(squad.captain().is_some());
            assert!(squad.vice_captain().is_some());
        }
        assert!(rec.any_feasible());
    }

    #[test]
    fn rejects_bad_constraints_before_valuing() {
        let engine = ValuationEngine::new(ValuationParams::default()).unwrap();
        let mut req = request();
        req.constraints.squad_size = 0;
        assert!(matches!(
            recommend(&engine, &req, &mut NoJitter),
            Err(LineupError::NonPositiveSquadSize)
        ));
    }

    #[test]
    fn infeasible_budget_still_returns_all_strategies() {
        let engine = ValuationEngine::new(ValuationParams::default()).unwrap();
        let mut req = request();
        req.constraints.budget = 1.0;
        let rec = recommend(&engine, &req, &mut NoJitter).unwrap();
        assert_eq!(rec.squads.len(), 3);
        assert!(!rec.any_feasible());
        for squad in rec.squads.values() {
            assert_eq!(squad.total_cost, 0.0);
            assert_eq!(squad.score, 0.0);
        }
    }

    #[test]
    fn balanced_squad_uses_base_values() {
        let engine = ValuationEngine::new(ValuationParams::default()).unwrap();
        let rec = recommend(&engine, &request(), &mut NoJitter).unwrap();
        let balanced = rec.squad(Strategy::Balanced).unwrap();
        for m in &balanced.members {
            assert_eq!(m.player.value, m.player.base_value);
        }
    }
}
