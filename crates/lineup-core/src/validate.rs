// Constraint validator for selected or hand-built squads.
//
// Counts are recomputed from the member list, so a squad whose cached
// totals are wrong is still judged on its actual members.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::player::Role;
use crate::selection::{Constraints, Squad, BUDGET_EPSILON};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    SquadSize { expected: usize, actual: usize },
    RoleCount { role: Role, count: usize, min: usize, max: usize },
    SideCap { side: String, count: usize, max: usize },
    OverBudget { total_cost: f64, budget: f64 },
    DuplicatePlayer { side: String, name: String },
    Leadership { message: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::SquadSize { expected, actual } => {
                write!(f, "squad has {actual} players, expected {expected}")
            }
            Violation::RoleCount {
                role,
                count,
                min,
                max,
            } => write!(f, "{role} count {count} outside [{min}, {max}]"),
            Violation::SideCap { side, count, max } => {
                write!(f, "{count} players from {side}, cap is {max}")
            }
            Violation::OverBudget { total_cost, budget } => {
                write!(f, "cost {total_cost} exceeds budget {budget}")
            }
            Violation::DuplicatePlayer { side, name } => {
                write!(f, "{name} ({side}) appears more than once")
            }
            Violation::Leadership { message } => write!(f, "leadership: {message}"),
        }
    }
}

/// Every rule the squad breaks. Empty means the squad is legal.
pub fn validate_squad(squad: &Squad, constraints: &Constraints) -> Vec<Violation> {
    let mut violations = Vec::new();

    if squad.members.len() != constraints.squad_size {
        violations.push(Violation::SquadSize {
            expected: constraints.squad_size,
            actual: squad.members.len(),
        });
    }

    let mut role_counts: BTreeMap<Role, usize> = BTreeMap::new();
    let mut side_counts: BTreeMap<&str, usize> = BTreeMap::new();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut total_cost = 0.0;

    for m in &squad.members {
        *role_counts.entry(m.role()).or_insert(0) += 1;
        *side_counts.entry(m.side()).or_insert(0) += 1;
        total_cost += m.cost();
        if !seen.insert((m.side(), m.name())) {
            violations.push(Violation::DuplicatePlayer {
                side: m.side().to_string(),
                name: m.name().to_string(),
            });
        }
    }

    for role in Role::ALL {
        let bounds = constraints.roles.get(role);
        let count = role_counts.get(&role).copied().unwrap_or(0);
        if !bounds.contains(count) {
            violations.push(Violation::RoleCount {
                role,
                count,
                min: bounds.min,
                max: bounds.max,
            });
        }
    }

    for (side, count) in side_counts {
        if count > constraints.max_per_side {
            violations.push(Violation::SideCap {
                side: side.to_string(),
                count,
                max: constraints.max_per_side,
            });
        }
    }

    if total_cost > constraints.budget + BUDGET_EPSILON {
        violations.push(Violation::OverBudget {
            total_cost,
            budget: constraints.budget,
        });
    }

    check_leadership(squad, &mut violations);
    violations
}

/// Leadership is optional, but once assigned there must be exactly one
/// captain and one vice-captain, distinct, holding the top two point totals.
fn check_leadership(squad: &Squad, violations: &mut Vec<Violation>) {
    let captains: Vec<_> = squad.members.iter().filter(|m| m.is_captain).collect();
    let vices: Vec<_> = squad.members.iter().filter(|m| m.is_vice_captain).collect();
    if captains.is_empty() && vices.is_empty() {
        return;
    }

    let mut fail = |message: String| violations.push(Violation::Leadership { message });

    if captains.len() != 1 {
        fail(format!("{} captains", captains.len()));
    }
    if squad.members.len() > 1 && vices.len() != 1 {
        fail(format!("{} vice-captains", vices.len()));
    }
    if squad.members.iter().any(|m| m.is_captain && m.is_vice_captain) {
        fail("captain is also vice-captain".to_string());
    }

    if let (Some(c), Some(top)) = (
        captains.first(),
        squad.members.iter().map(|m| m.points()).max_by(|a, b| a.total_cmp(b)),
    ) {
        if c.points() < top {
            fail(format!("captain {} is not the highest-value member", c.name()));
        }
    }
    if let Some(vc) = vices.first() {
        let above = squad
            .members
            .iter()
            .filter(|m| !m.is_captain && !m.is_vice_captain && m.points() > vc.points())
            .count();
        if above > 0 {
            fail(format!("vice-captain {} is not the second-highest member", vc.name()));
        }
    }
}
