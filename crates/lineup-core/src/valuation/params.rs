// Tunable constants for the heuristic scoring model.
//
// Every field has a serde default so a partial `[valuation]` table in
// lineup.toml only overrides what it names.

use serde::{Deserialize, Serialize};

use crate::error::LineupError;
use crate::player::Role;

/// A per-match milestone: crossing `threshold` earns `points`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub threshold: f64,
    pub points: f64,
}

/// A rate band: `points` applies when the rate is beyond `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateBand {
    pub limit: f64,
    pub points: f64,
}

/// Expected fielding events per match for one role.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldingRate {
    pub catches: f64,
    pub stumpings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValuationParams {
    /// Points for simply being named in the lineup.
    pub lineup_bonus: f64,

    // ---- batting ----
    pub points_per_run: f64,
    /// Runs per match above which boundary and six bonuses are estimated.
    pub boundary_threshold: f64,
    /// Share of runs scored as boundary bonus points.
    pub boundary_share: f64,
    /// Share of runs assumed to come from sixes.
    pub six_share: f64,
    pub points_per_six: f64,
    /// Ascending run tiers. The last tier replaces all lower tiers.
    pub run_milestones: Vec<Milestone>,
    /// Bonus bands, applied when strike rate is strictly above `limit`.
    /// The first matching band (highest limit) wins.
    pub strike_rate_bonuses: Vec<RateBand>,
    /// Penalty bands, applied when strike rate is strictly below `limit`.
    /// The lowest matching limit wins.
    pub strike_rate_penalties: Vec<RateBand>,
    /// The steepest strike-rate penalty only applies to players whose
    /// batting average reaches this level.
    pub min_involvement_average: f64,

    // ---- bowling ----
    pub points_per_wicket: f64,
    /// Share of wickets assumed to be bowled / lbw.
    pub clean_dismissal_share: f64,
    pub clean_dismissal_points: f64,
    /// Ascending wicket tiers. The last tier replaces all lower tiers.
    pub wicket_milestones: Vec<Milestone>,
    pub overs_per_match: f64,
    /// Economy below which dot balls are expected.
    pub dot_ball_economy: f64,
    pub points_per_dot: f64,
    /// Economy below which a maiden over is plausible.
    pub maiden_economy: f64,
    pub maiden_points: f64,
    pub maiden_probability: f64,
    /// Bonus bands, applied when economy is strictly below `limit`.
    /// The lowest matching limit wins.
    pub economy_bonuses: Vec<RateBand>,
    /// Penalty bands, applied when economy is strictly above `limit`.
    /// The highest matching limit wins.
    pub economy_penalties: Vec<RateBand>,

    // ---- fielding ----
    pub points_per_catch: f64,
    pub points_per_stumping: f64,
    pub keeper_fielding: FieldingRate,
    pub bowler_fielding: FieldingRate,
    pub outfield_fielding: FieldingRate,
    pub three_catch_probability: f64,
    pub three_catch_points: f64,
    pub direct_run_out_rate: f64,
    pub direct_run_out_points: f64,
    pub indirect_run_out_rate: f64,
    pub indirect_run_out_points: f64,

    // ---- match context ----
    /// Multiplier for players on the host side.
    pub home_factor: f64,

    // ---- jitter ----
    /// Standard deviation of the multiplicative jitter at consistency 0.
    pub jitter_sigma_max: f64,
    /// Standard deviation of the multiplicative jitter at consistency 10.
    pub jitter_sigma_min: f64,
    /// Absolute bound on the jitter deviation from 1.0.
    pub jitter_bound: f64,
}

impl Default for ValuationParams {
    fn default() -> Self {
        ValuationParams {
            lineup_bonus: 4.0,

            points_per_run: 1.0,
            boundary_threshold: 20.0,
            boundary_share: 0.15,
            six_share: 0.05,
            points_per_six: 2.0,
            run_milestones: vec![
                Milestone { threshold: 25.0, points: 4.0 },
                Milestone { threshold: 50.0, points: 8.0 },
                Milestone { threshold: 75.0, points: 12.0 },
                Milestone { threshold: 100.0, points: 28.0 },
            ],
            strike_rate_bonuses: vec![
                RateBand { limit: 170.0, points: 6.0 },
                RateBand { limit: 150.0, points: 4.0 },
                RateBand { limit: 130.0, points: 2.0 },
            ],
            strike_rate_penalties: vec![
                RateBand { limit: 50.0, points: -6.0 },
                RateBand { limit: 60.0, points: -4.0 },
                RateBand { limit: 70.0, points: -2.0 },
            ],
            min_involvement_average: 10.0,

            points_per_wicket: 30.0,
            clean_dismissal_share: 0.6,
            clean_dismissal_points: 8.0,
            wicket_milestones: vec![
                Milestone { threshold: 3.0, points: 4.0 },
                Milestone { threshold: 4.0, points: 8.0 },
                Milestone { threshold: 5.0, points: 16.0 },
            ],
            overs_per_match: 4.0,
            dot_ball_economy: 6.0,
            points_per_dot: 1.0,
            maiden_economy: 4.0,
            maiden_points: 12.0,
            maiden_probability: 0.2,
            economy_bonuses: vec![
                RateBand { limit: 5.0, points: 6.0 },
                RateBand { limit: 6.0, points: 4.0 },
                RateBand { limit: 7.0, points: 2.0 },
            ],
            economy_penalties: vec![
                RateBand { limit: 12.0, points: -6.0 },
                RateBand { limit: 11.0, points: -4.0 },
                RateBand { limit: 10.0, points: -2.0 },
            ],

            points_per_catch: 8.0,
            points_per_stumping: 12.0,
            keeper_fielding: FieldingRate { catches: 1.2, stumpings: 0.3 },
            bowler_fielding: FieldingRate { catches: 0.5, stumpings: 0.0 },
            outfield_fielding: FieldingRate { catches: 0.8, stumpings: 0.0 },
            three_catch_probability: 0.05,
            three_catch_points: 4.0,
            direct_run_out_rate: 0.1,
            direct_run_out_points: 12.0,
            indirect_run_out_rate: 0.15,
            indirect_run_out_points: 6.0,

            home_factor: 1.02,

            jitter_sigma_max: 0.10,
            jitter_sigma_min: 0.03,
            jitter_bound: 0.10,
        }
    }
}

impl ValuationParams {
    /// Fielding rates for a role. Keepers field most, bowlers least.
    pub fn fielding_for(&self, role: Role) -> FieldingRate {
        match role {
            Role::WicketKeeper => self.keeper_fielding,
            Role::Bowler => self.bowler_fielding,
            Role::Batter | Role::AllRounder => self.outfield_fielding,
        }
    }

    /// Reject parameter sets that would break the model's guarantees.
    pub fn validate(&self) -> Result<(), LineupError> {
        let finite_fields: &[(&str, f64)] = &[
            ("lineup_bonus", self.lineup_bonus),
            ("points_per_run", self.points_per_run),
            ("boundary_threshold", self.boundary_threshold),
            ("points_per_wicket", self.points_per_wicket),
            ("overs_per_match", self.overs_per_match),
            ("home_factor", self.home_factor),
        ];
        for (name, val) in finite_fields {
            if !val.is_finite() {
                return Err(LineupError::param(name, format!("must be finite, got {val}")));
            }
        }

        // Negative rewards here would let more runs or wickets lower a value.
        let non_negative: &[(&str, f64)] = &[
            ("points_per_run", self.points_per_run),
            ("boundary_share", self.boundary_share),
            ("six_share", self.six_share),
            ("points_per_six", self.points_per_six),
            ("points_per_wicket", self.points_per_wicket),
            ("clean_dismissal_share", self.clean_dismissal_share),
            ("clean_dismissal_points", self.clean_dismissal_points),
        ];
        for (name, val) in non_negative {
            if !val.is_finite() || *val < 0.0 {
                return Err(LineupError::param(name, format!("must be >= 0, got {val}")));
            }
        }

        if self.home_factor <= 0.0 {
            return Err(LineupError::param(
                "home_factor",
                format!("must be > 0, got {}", self.home_factor),
            ));
        }

        validate_milestones("run_milestones", &self.run_milestones)?;
        validate_milestones("wicket_milestones", &self.wicket_milestones)?;

        if self.jitter_sigma_min < 0.0 || self.jitter_sigma_max < self.jitter_sigma_min {
            return Err(LineupError::param(
                "jitter_sigma_min",
                format!(
                    "need 0 <= jitter_sigma_min <= jitter_sigma_max, got {} and {}",
                    self.jitter_sigma_min, self.jitter_sigma_max
                ),
            ));
        }

        if !(0.0..1.0).contains(&self.jitter_bound) {
            return Err(LineupError::param(
                "jitter_bound",
                format!("must be in [0, 1), got {}", self.jitter_bound),
            ));
        }

        Ok(())
    }
}

/// Tiers must be strictly ascending, and the top tier must be worth at
/// least the sum of the tiers it replaces, so that crossing it never lowers
/// a player's value.
fn validate_milestones(field: &str, tiers: &[Milestone]) -> Result<(), LineupError> {
    for pair in tiers.windows(2) {
        if pair[1].threshold <= pair[0].threshold {
            return Err(LineupError::param(
                field,
                format!(
                    "thresholds must be strictly ascending ({} then {})",
                    pair[0].threshold, pair[1].threshold
                ),
            ));
        }
    }
    if tiers.iter().any(|t| t.points < 0.0) {
        return Err(LineupError::param(field, "points must be >= 0"));
    }
    if let Some((top, lower)) = tiers.split_last() {
        let lower_sum: f64 = lower.iter().map(|t| t.points).sum();
        if top.points < lower_sum {
            return Err(LineupError::param(
                field,
                format!(
                    "top tier ({}) must be worth at least the lower tiers it replaces ({lower_sum})",
                    top.points
                ),
            ));
        }
    }
    Ok(())
}
