// Squad selection under budget, role and side constraints.
//
// The constrained search enumerates every legal per-role count combination
// and keeps the best fill; if nothing fills it falls back to greedy and marks
// the squad as degraded. Infeasibility is a status, not an error.

pub mod combos;
pub(crate) mod fill;
pub(crate) mod greedy;
pub(crate) mod search;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LineupError;
use crate::player::Role;
use crate::selection::combos::{role_index, RoleCounts};
use crate::selection::fill::PoolIndex;
use crate::valuation::{MatchContext, ValuedPlayer};

/// Slack for floating-point budget comparisons.
pub(crate) const BUDGET_EPSILON: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Constraints
// ---------------------------------------------------------------------------

/// Inclusive [min, max] count for one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBounds {
    pub min: usize,
    pub max: usize,
}

impl RoleBounds {
    pub fn new(min: usize, max: usize) -> Self {
        RoleBounds { min, max }
    }

    pub fn contains(&self, count: usize) -> bool {
        (self.min..=self.max).contains(&count)
    }
}

/// Per-role bounds covering all four roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleLimits {
    pub batter: RoleBounds,
    pub bowler: RoleBounds,
    pub all_rounder: RoleBounds,
    pub wicket_keeper: RoleBounds,
}

impl RoleLimits {
    pub fn get(&self, role: Role) -> RoleBounds {
        match role {
            Role::Batter => self.batter,
            Role::Bowler => self.bowler,
            Role::AllRounder => self.all_rounder,
            Role::WicketKeeper => self.wicket_keeper,
        }
    }

    pub fn min_sum(&self) -> usize {
        Role::ALL.iter().map(|r| self.get(*r).min).sum()
    }

    pub fn max_sum(&self) -> usize {
        Role::ALL.iter().map(|r| self.get(*r).max).sum()
    }
}

impl Default for RoleLimits {
    fn default() -> Self {
        RoleLimits {
            batter: RoleBounds::new(3, 5),
            bowler: RoleBounds::new(3, 5),
            all_rounder: RoleBounds::new(1, 4),
            wicket_keeper: RoleBounds::new(1, 2),
        }
    }
}

/// Structural rules every squad must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constraints {
    pub budget: f64,
    pub squad_size: usize,
    pub max_per_side: usize,
    pub roles: RoleLimits,
}

impl Default for Constraints {
    fn default() -> Self {
        Constraints {
            budget: 100.0,
            squad_size: 11,
            max_per_side: 7,
            roles: RoleLimits::default(),
        }
    }
}

impl Constraints {
    /// Fail fast on constraint sets that are malformed or can never be met
    /// by any roster.
    pub fn validate(&self) -> Result<(), LineupError> {
        if self.squad_size == 0 {
            return Err(LineupError::NonPositiveSquadSize);
        }
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(LineupError::InvalidBudget(self.budget));
        }
        if self.max_per_side == 0 {
            return Err(LineupError::constraint("max_per_side", "must be greater than 0"));
        }
        if self.max_per_side * 2 < self.squad_size {
            return Err(LineupError::constraint(
                "max_per_side",
                format!(
                    "two sides capped at {} cannot fill a squad of {}",
                    self.max_per_side, self.squad_size
                ),
            ));
        }
        for role in Role::ALL {
            let bounds = self.roles.get(role);
            if bounds.min > bounds.max {
                return Err(LineupError::constraint(
                    &format!("roles.{}", role_key(role)),
                    format!("min {} exceeds max {}", bounds.min, bounds.max),
                ));
            }
        }
        if self.roles.min_sum() > self.squad_size {
            return Err(LineupError::constraint(
                "roles",
                format!(
                    "role minimums sum to {} which exceeds squad size {}",
                    self.roles.min_sum(),
                    self.squad_size
                ),
            ));
        }
        if self.roles.max_sum() < self.squad_size {
            return Err(LineupError::constraint(
                "roles",
                format!(
                    "role maximums sum to {} which is below squad size {}",
                    self.roles.max_sum(),
                    self.squad_size
                ),
            ));
        }
        Ok(())
    }
}

/// Config-style key for a role.
pub fn role_key(role: Role) -> &'static str {
    match role {
        Role::Batter => "batter",
        Role::Bowler => "bowler",
        Role::AllRounder => "all_rounder",
        Role::WicketKeeper => "wicket_keeper",
    }
}

// ---------------------------------------------------------------------------
// Selection result
// ---------------------------------------------------------------------------

/// Which strategy the selector should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Role-combination search, falling back to greedy.
    #[default]
    Constrained,
    /// Greedy only.
    Greedy,
}

/// Why no legal squad exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InfeasibleReason {
    PoolTooSmall { available: usize, required: usize },
    RoleShortage { role: Role, available: usize, required: usize },
    SideCapTooTight { reachable: usize, required: usize },
    BudgetTooSmall { budget: f64, cheapest: f64 },
    NoLegalFill,
}

impl fmt::Display for InfeasibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfeasibleReason::PoolTooSmall { available, required } => write!(
                f,
                "only {available} eligible players for a squad of {required}"
            ),
            InfeasibleReason::RoleShortage {
                role,
                available,
                required,
            } => write!(f, "{role} has {available} eligible players, minimum is {required}"),
            InfeasibleReason::SideCapTooTight {
                reachable,
                required,
            } => write!(
                f,
                "per-side cap allows at most {reachable} players, squad needs {required}"
            ),
            InfeasibleReason::BudgetTooSmall { budget, cheapest } => write!(
                f,
                "budget {budget} is below the cheapest legal squad cost {cheapest}"
            ),
            InfeasibleReason::NoLegalFill => {
                write!(f, "no squad satisfies budget, role and side limits together")
            }
        }
    }
}

/// Outcome of a selection run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SelectionStatus {
    /// Best fill from the role-combination search.
    Optimal,
    /// Greedy was requested directly.
    Greedy,
    /// The search found nothing; greedy filled the squad instead.
    Degraded,
    /// Assembled by hand and passed in for auditing.
    Manual,
    /// No legal squad exists. The squad is empty with zero totals.
    Infeasible { reasons: Vec<InfeasibleReason> },
}

impl SelectionStatus {
    pub fn is_feasible(&self) -> bool {
        !matches!(self, SelectionStatus::Infeasible { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            SelectionStatus::Optimal => "optimal",
            SelectionStatus::Greedy => "greedy",
            SelectionStatus::Degraded => "degraded",
            SelectionStatus::Manual => "manual",
            SelectionStatus::Infeasible { .. } => "infeasible",
        }
    }
}

/// A squad member with leadership annotations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadMember {
    pub player: ValuedPlayer,
    pub is_captain: bool,
    pub is_vice_captain: bool,
    /// Score multiplier from leadership (2.0 / 1.5 / 1.0).
    pub multiplier: f64,
}

impl SquadMember {
    pub fn name(&self) -> &str {
        self.player.name()
    }

    pub fn role(&self) -> Role {
        self.player.player.role
    }

    pub fn side(&self) -> &str {
        self.player.side()
    }

    pub fn cost(&self) -> f64 {
        self.player.player.cost
    }

    /// Selection value, reweighted by strategy.
    pub fn value(&self) -> f64 {
        self.player.value
    }

    /// Expected fantasy points from the valuation engine, before any
    /// strategy reweighting.
    pub fn points(&self) -> f64 {
        self.player.base_value
    }

    /// Expected points after the leadership multiplier.
    pub fn expected_points(&self) -> f64 {
        self.points() * self.multiplier
    }
}

/// A selected squad (or the empty infeasible marker) with derived totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Squad {
    pub status: SelectionStatus,
    /// Members in descending value order; ties keep selection order.
    pub members: Vec<SquadMember>,
    pub budget: f64,
    pub total_cost: f64,
    /// Sum of member selection values with no multipliers.
    pub total_value: f64,
    /// Headline score in expected points. Without leadership it is the
    /// plain sum of member points.
    pub score: f64,
    pub role_counts: BTreeMap<Role, usize>,
    pub side_counts: BTreeMap<String, usize>,
}

impl Squad {
    /// Build a squad from selected players.
    pub fn from_players(players: Vec<ValuedPlayer>, status: SelectionStatus, budget: f64) -> Self {
        let mut players = players;
        // Stable: equal values keep selection order.
        players.sort_by(|a, b| b.value.total_cmp(&a.value));

        let mut role_counts: BTreeMap<Role, usize> = Role::ALL.iter().map(|r| (*r, 0)).collect();
        let mut side_counts: BTreeMap<String, usize> = BTreeMap::new();
        for p in &players {
            *role_counts.entry(p.player.role).or_insert(0) += 1;
            *side_counts.entry(p.player.side.clone()).or_insert(0) += 1;
        }

        let total_cost = players.iter().map(|p| p.player.cost).sum();
        let total_value: f64 = players.iter().map(|p| p.value).sum();
        let score: f64 = players.iter().map(|p| p.base_value).sum();

        let members = players
            .into_iter()
            .map(|player| SquadMember {
                player,
                is_captain: false,
                is_vice_captain: false,
                multiplier: 1.0,
            })
            .collect();

        Squad {
            status,
            members,
            budget,
            total_cost,
            total_value,
            score,
            role_counts,
            side_counts,
        }
    }

    /// The explicit empty result for an unsatisfiable request.
    pub fn infeasible(reasons: Vec<InfeasibleReason>, budget: f64) -> Self {
        Squad::from_players(Vec::new(), SelectionStatus::Infeasible { reasons }, budget)
    }

    pub fn is_feasible(&self) -> bool {
        self.status.is_feasible()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn budget_remaining(&self) -> f64 {
        self.budget - self.total_cost
    }

    pub fn role_count(&self, role: Role) -> usize {
        self.role_counts.get(&role).copied().unwrap_or(0)
    }

    pub fn side_count(&self, side: &str) -> usize {
        self.side_counts.get(side).copied().unwrap_or(0)
    }

    pub fn captain(&self) -> Option<&SquadMember> {
        self.members.iter().find(|m| m.is_captain)
    }

    pub fn vice_captain(&self) -> Option<&SquadMember> {
        self.members.iter().find(|m| m.is_vice_captain)
    }

    pub fn contains(&self, side: &str, name: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.side() == side && m.name() == name)
    }

    pub fn summary(&self) -> SquadSummary {
        let reasons = match &self.status {
            SelectionStatus::Infeasible { reasons } => reasons.iter().map(|r| r.to_string()).collect(),
            _ => Vec::new(),
        };
        SquadSummary {
            method: self.status.label(),
            players: self.members.len(),
            budget_used: self.total_cost,
            budget_remaining: self.budget_remaining(),
            role_counts: self
                .role_counts
                .iter()
                .map(|(role, n)| (role.display_str().to_string(), *n))
                .collect(),
            side_counts: self.side_counts.clone(),
            captain: self.captain().map(|m| m.name().to_string()),
            vice_captain: self.vice_captain().map(|m| m.name().to_string()),
            total_value: self.total_value,
            score: self.score,
            reasons,
        }
    }
}

/// Flat, display-oriented view of a squad.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SquadSummary {
    pub method: &'static str,
    pub players: usize,
    pub budget_used: f64,
    pub budget_remaining: f64,
    pub role_counts: BTreeMap<String, usize>,
    pub side_counts: BTreeMap<String, usize>,
    pub captain: Option<String>,
    pub vice_captain: Option<String>,
    pub total_value: f64,
    pub score: f64,
    pub reasons: Vec<String>,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Pick a squad from the combined pool of both sides.
///
/// Errors only on malformed input (bad constraints, unknown side, invalid
/// cost). An unsatisfiable request returns `SelectionStatus::Infeasible`.
pub fn select_squad(
    pool: &[ValuedPlayer],
    ctx: &MatchContext,
    constraints: &Constraints,
    mode: SelectionMode,
) -> Result<Squad, LineupError> {
    select_squad_within(pool, ctx, constraints, mode, search::REPAIR_FILL_LIMIT)
}

fn select_squad_within(
    pool: &[ValuedPlayer],
    ctx: &MatchContext,
    constraints: &Constraints,
    mode: SelectionMode,
    repair_limit: usize,
) -> Result<Squad, LineupError> {
    constraints.validate()?;
    for p in pool {
        ctx.opponent_of(p.side())?;
        if !p.player.cost.is_finite() || p.player.cost < 0.0 {
            return Err(LineupError::InvalidCost {
                name: p.player.name.clone(),
                cost: p.player.cost,
            });
        }
    }

    let index = PoolIndex::new(pool);
    let reasons = precheck(&index, ctx, constraints);
    if !reasons.is_empty() {
        for reason in &reasons {
            warn!("infeasible selection: {reason}");
        }
        return Ok(Squad::infeasible(reasons, constraints.budget));
    }

    if mode == SelectionMode::Constrained {
        if let Some(picked) = search::best_fill(&index, constraints, repair_limit) {
            let squad = assemble(pool, &picked, SelectionStatus::Optimal, constraints);
            info!(
                value = squad.total_value,
                cost = squad.total_cost,
                "constrained search selected squad"
            );
            return Ok(squad);
        }
        warn!("constrained search found no legal fill; falling back to greedy");
    }

    let status = match mode {
        SelectionMode::Constrained => SelectionStatus::Degraded,
        SelectionMode::Greedy => SelectionStatus::Greedy,
    };

    match greedy::fill(&index, constraints) {
        Some(picked) => {
            let squad = assemble(pool, &picked, status, constraints);
            info!(
                value = squad.total_value,
                cost = squad.total_cost,
                "greedy selected squad"
            );
            Ok(squad)
        }
        None => {
            warn!("greedy could not complete a legal squad");
            Ok(Squad::infeasible(
                vec![InfeasibleReason::NoLegalFill],
                constraints.budget,
            ))
        }
    }
}

fn assemble(
    pool: &[ValuedPlayer],
    picked: &[usize],
    status: SelectionStatus,
    constraints: &Constraints,
) -> Squad {
    let players = picked.iter().map(|&i| pool[i].clone()).collect();
    Squad::from_players(players, status, constraints.budget)
}

/// Conditions under which no squad can exist, whatever the search does.
fn precheck(index: &PoolIndex<'_>, ctx: &MatchContext, constraints: &Constraints) -> Vec<InfeasibleReason> {
    let pool = index.pool();
    let mut reasons = Vec::new();
    let size = constraints.squad_size;

    if pool.len() < size {
        reasons.push(InfeasibleReason::PoolTooSmall {
            available: pool.len(),
            required: size,
        });
    }

    for role in Role::ALL {
        let available = pool.iter().filter(|p| p.player.role == role).count();
        let required = constraints.roles.get(role).min;
        if available < required {
            reasons.push(InfeasibleReason::RoleShortage {
                role,
                available,
                required,
            });
        }
    }

    let reachable: usize = [ctx.home.as_str(), ctx.away.as_str()]
        .iter()
        .map(|side| {
            pool.iter()
                .filter(|p| p.side() == *side)
                .count()
                .min(constraints.max_per_side)
        })
        .sum();
    if reachable < size && pool.len() >= size {
        reasons.push(InfeasibleReason::SideCapTooTight {
            reachable,
            required: size,
        });
    }

    if reasons.is_empty() {
        let mut needs: RoleCounts = [0; 4];
        for role in Role::ALL {
            needs[role_index(role)] = constraints.roles.get(role).min;
        }
        let free = size - constraints.roles.min_sum();
        let cheapest = index.cheapest_completion(|_| false, &needs, free);
        match cheapest {
            Some(cost) if cost > constraints.budget + BUDGET_EPSILON => {
                reasons.push(InfeasibleReason::BudgetTooSmall {
                    budget: constraints.budget,
                    cheapest: cost,
                });
            }
            None => reasons.push(InfeasibleReason::NoLegalFill),
            _ => {}
        }
    }

    debug!(count = reasons.len(), "selection precheck complete");
    reasons
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
