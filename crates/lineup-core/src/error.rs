// Input errors raised by the core. Infeasible selections are not errors; see
// `selection::SelectionStatus::Infeasible`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LineupError {
    #[error("invalid constraint `{field}`: {message}")]
    InvalidConstraints { field: String, message: String },

    #[error("unknown side `{side}` (match is {home} vs {away})")]
    UnknownSide {
        side: String,
        home: String,
        away: String,
    },

    #[error("both sides are named `{0}`")]
    SameSide(String),

    #[error("squad size must be greater than 0")]
    NonPositiveSquadSize,

    #[error("budget must be non-negative and finite, got {0}")]
    InvalidBudget(f64),

    #[error("player `{name}` has invalid cost {cost}")]
    InvalidCost { name: String, cost: f64 },

    #[error("player `{name}` appears more than once on side `{side}`")]
    DuplicatePlayer { name: String, side: String },

    #[error("invalid valuation parameter `{field}`: {message}")]
    InvalidParams { field: String, message: String },

    #[error("selector produced an illegal squad: {0}")]
    SelectorInvariant(String),
}

impl LineupError {
    pub(crate) fn constraint(field: &str, message: impl Into<String>) -> Self {
        LineupError::InvalidConstraints {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn param(field: &str, message: impl Into<String>) -> Self {
        LineupError::InvalidParams {
            field: field.to_string(),
            message: message.into(),
        }
    }
}
