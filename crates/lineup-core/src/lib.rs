// Library root: player valuation and constrained squad selection.
//
// Data flows one way: raw player stats -> valuation -> selection ->
// strategy reweighting -> leadership -> validation.

pub mod error;
pub mod leadership;
pub mod player;
pub mod recommend;
pub mod selection;
pub mod strategy;
pub mod validate;
pub mod valuation;

pub use error::LineupError;
pub use player::{Player, RawStats, Role};
pub use recommend::{recommend, Recommendation, RecommendRequest};
pub use selection::{
    Constraints, InfeasibleReason, RoleBounds, RoleLimits, SelectionMode, SelectionStatus, Squad,
    SquadSummary,
};
pub use strategy::{Strategy, StrategyParams};
pub use validate::{validate_squad, Violation};
pub use valuation::{MatchContext, ValuationEngine, ValuedPlayer};
