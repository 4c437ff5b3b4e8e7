// Heuristic fantasy-point estimates from career aggregates.
//
// Each function returns the expected points from one signal category.
// Missing or empty aggregates contribute 0.0 rather than failing.

use crate::player::{BattingStats, BowlingStats, Role};
use crate::valuation::params::{Milestone, RateBand, ValuationParams};

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

/// Bonus for a per-match rate crossing ascending milestone tiers.
///
/// Lower tiers stack with each other; crossing the top tier replaces them
/// all with the top tier's points.
pub fn milestone_bonus(per_match: f64, tiers: &[Milestone]) -> f64 {
    let Some((top, lower)) = tiers.split_last() else {
        return 0.0;
    };
    if per_match >= top.threshold {
        return top.points;
    }
    lower
        .iter()
        .filter(|t| per_match >= t.threshold)
        .map(|t| t.points)
        .sum()
}

// ---------------------------------------------------------------------------
// Rate bands
// ---------------------------------------------------------------------------

/// Points from the band with the highest `limit` that `rate` exceeds.
fn best_band_above(rate: f64, bands: &[RateBand]) -> Option<RateBand> {
    bands
        .iter()
        .filter(|b| rate > b.limit)
        .copied()
        .max_by(|a, b| a.limit.total_cmp(&b.limit))
}

/// Points from the band with the lowest `limit` that `rate` is under.
fn best_band_below(rate: f64, bands: &[RateBand]) -> Option<RateBand> {
    bands
        .iter()
        .filter(|b| rate < b.limit)
        .copied()
        .min_by(|a, b| a.limit.total_cmp(&b.limit))
}

/// Strike-rate bonus or penalty.
///
/// The steepest penalty band is skipped for players whose batting average
/// is below `min_involvement_average`: a tail-ender with a poor strike rate
/// barely faced any balls.
pub fn strike_rate_adjustment(strike_rate: f64, batting_average: f64, params: &ValuationParams) -> f64 {
    if !strike_rate.is_finite() || strike_rate <= 0.0 {
        return 0.0;
    }
    if let Some(band) = best_band_above(strike_rate, &params.strike_rate_bonuses) {
        return band.points;
    }
    let Some(band) = best_band_below(strike_rate, &params.strike_rate_penalties) else {
        return 0.0;
    };
    let steepest_limit = params
        .strike_rate_penalties
        .iter()
        .map(|b| b.limit)
        .fold(f64::INFINITY, f64::min);
    if band.limit == steepest_limit && batting_average < params.min_involvement_average {
        return 0.0;
    }
    band.points
}

/// Economy-rate bonus or penalty. Symmetric to the strike-rate bands.
pub fn economy_adjustment(economy: f64, params: &ValuationParams) -> f64 {
    if !economy.is_finite() || economy <= 0.0 {
        return 0.0;
    }
    if let Some(band) = best_band_below(economy, &params.economy_bonuses) {
        return band.points;
    }
    best_band_above(economy, &params.economy_penalties).map_or(0.0, |b| b.points)
}

// ---------------------------------------------------------------------------
// Category contributions
// ---------------------------------------------------------------------------

/// Expected batting points per match.
pub fn batting_points(stats: &BattingStats, params: &ValuationParams) -> f64 {
    let Some(runs_per_match) = stats.runs_per_match() else {
        return 0.0;
    };

    let mut points = runs_per_match * params.points_per_run;

    if runs_per_match >= params.boundary_threshold {
        points += runs_per_match * params.boundary_share;
        points += runs_per_match * params.six_share * params.points_per_six;
    }

    points += milestone_bonus(runs_per_match, &params.run_milestones);
    points += strike_rate_adjustment(stats.strike_rate, stats.average, params);
    points
}

/// Expected dot-ball points for a given economy rate.
pub fn dot_ball_points(economy: f64, params: &ValuationParams) -> f64 {
    if !economy.is_finite() || economy <= 0.0 || economy >= params.dot_ball_economy {
        return 0.0;
    }
    (params.dot_ball_economy - economy) * params.overs_per_match * params.points_per_dot
}

/// Expected bowling points per match.
pub fn bowling_points(stats: &BowlingStats, params: &ValuationParams) -> f64 {
    let Some(wickets_per_match) = stats.wickets_per_match() else {
        return 0.0;
    };

    let mut points = wickets_per_match * params.points_per_wicket;
    points += wickets_per_match * params.clean_dismissal_share * params.clean_dismissal_points;
    points += milestone_bonus(wickets_per_match, &params.wicket_milestones);
    points += dot_ball_points(stats.economy, params);

    if stats.economy > 0.0 && stats.economy < params.maiden_economy {
        points += params.maiden_points * params.maiden_probability;
    }

    points += economy_adjustment(stats.economy, params);
    points
}

/// Expected fielding points per match, scaled by role.
pub fn fielding_points(role: Role, matches: u32, params: &ValuationParams) -> f64 {
    if matches == 0 {
        return 0.0;
    }
    let rate = params.fielding_for(role);
    rate.catches * params.points_per_catch
        + rate.stumpings * params.points_per_stumping
        + params.three_catch_probability * params.three_catch_points
        + params.direct_run_out_rate * params.direct_run_out_points
        + params.indirect_run_out_rate * params.indirect_run_out_points
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn batting(matches: u32, runs: u32, average: f64, strike_rate: f64) -> BattingStats {
        BattingStats {
            matches,
            runs,
            average,
            strike_rate,
        }
    }

    fn bowling(matches: u32, wickets: u32, economy: f64) -> BowlingStats {
        BowlingStats {
            matches,
            wickets,
            economy,
            average: 25.0,
        }
    }

    // ---- milestones ----

    #[test]
    fn lower_milestones_stack() {
        let params = ValuationParams::default();
        // 80 runs/match crosses 25, 50, 75 => 4 + 8 + 12
        assert!(approx_eq(milestone_bonus(80.0, &params.run_milestones), 24.0, 1e-10));
        assert!(approx_eq(milestone_bonus(30.0, &params.run_milestones), 4.0, 1e-10));
        assert!(approx_eq(milestone_bonus(10.0, &params.run_milestones), 0.0, 1e-10));
    }

    #[test]
    fn top_milestone_replaces_lower_tiers() {
        let params = ValuationParams::default();
        let top = milestone_bonus(100.0, &params.run_milestones);
        let below_top = milestone_bonus(99.0, &params.run_milestones);
        let naive = below_top + params.run_milestones.last().unwrap().points;
        assert!(approx_eq(top, 28.0, 1e-10));
        assert!(top >= below_top);
        assert!(top < naive);
    }

    #[test]
    fn wicket_milestone_follows_same_rule() {
        let params = ValuationParams::default();
        let four = milestone_bonus(4.5, &params.wicket_milestones);
        let five = milestone_bonus(5.0, &params.wicket_milestones);
        assert!(approx_eq(four, 12.0, 1e-10));
        assert!(approx_eq(five, 16.0, 1e-10));
    }

    #[test]
    fn empty_tiers_give_nothing() {
        assert_eq!(milestone_bonus(500.0, &[]), 0.0);
    }

    // ---- strike rate ----

    #[test]
    fn strike_rate_bonus_picks_highest_band() {
        let params = ValuationParams::default();
        assert!(approx_eq(strike_rate_adjustment(175.0, 30.0, &params), 6.0, 1e-10));
        assert!(approx_eq(strike_rate_adjustment(155.0, 30.0, &params), 4.0, 1e-10));
        assert!(approx_eq(strike_rate_adjustment(131.0, 30.0, &params), 2.0, 1e-10));
        assert!(approx_eq(strike_rate_adjustment(120.0, 30.0, &params), 0.0, 1e-10));
    }

    #[test]
    fn strike_rate_penalty_picks_steepest_band() {
        let params = ValuationParams::default();
        assert!(approx_eq(strike_rate_adjustment(65.0, 20.0, &params), -2.0, 1e-10));
        assert!(approx_eq(strike_rate_adjustment(55.0, 20.0, &params), -4.0, 1e-10));
        assert!(approx_eq(strike_rate_adjustment(45.0, 20.0, &params), -6.0, 1e-10));
    }

    #[test]
    fn steepest_penalty_needs_batting_involvement() {
        let params = ValuationParams::default();
        // Average of 4 is a tail-ender: no steepest penalty.
        assert!(approx_eq(strike_rate_adjustment(45.0, 4.0, &params), 0.0, 1e-10));
        // Milder bands still apply regardless of involvement.
        assert!(approx_eq(strike_rate_adjustment(55.0, 4.0, &params), -4.0, 1e-10));
    }

    #[test]
    fn missing_strike_rate_is_neutral() {
        let params = ValuationParams::default();
        assert_eq!(strike_rate_adjustment(0.0, 30.0, &params), 0.0);
        assert_eq!(strike_rate_adjustment(f64::NAN, 30.0, &params), 0.0);
    }

    // ---- economy ----

    #[test]
    fn economy_bands_are_symmetric() {
        let params = ValuationParams::default();
        assert!(approx_eq(economy_adjustment(4.5, &params), 6.0, 1e-10));
        assert!(approx_eq(economy_adjustment(5.5, &params), 4.0, 1e-10));
        assert!(approx_eq(economy_adjustment(6.5, &params), 2.0, 1e-10));
        assert!(approx_eq(economy_adjustment(8.0, &params), 0.0, 1e-10));
        assert!(approx_eq(economy_adjustment(10.5, &params), -2.0, 1e-10));
        assert!(approx_eq(economy_adjustment(11.5, &params), -4.0, 1e-10));
        assert!(approx_eq(economy_adjustment(13.0, &params), -6.0, 1e-10));
    }

    #[test]
    fn dot_balls_only_for_tight_bowling() {
        let params = ValuationParams::default();
        // (6 - 5) * 4 overs * 1 point
        assert!(approx_eq(dot_ball_points(5.0, &params), 4.0, 1e-10));
        assert_eq!(dot_ball_points(7.5, &params), 0.0);
        assert_eq!(dot_ball_points(0.0, &params), 0.0);
    }

    // ---- category totals ----

    #[test]
    fn batting_points_known_values() {
        let params = ValuationParams::default();
        // 300 runs in 10 matches => 30 runs/match
        // runs 30 + boundary 4.5 + sixes 30*0.05*2 = 3 + milestone 4 + SR 140 => +2
        let stats = batting(10, 300, 35.0, 140.0);
        assert!(approx_eq(batting_points(&stats, &params), 43.5, 1e-9));
    }

    #[test]
    fn batting_points_zero_matches() {
        let params = ValuationParams::default();
        assert_eq!(batting_points(&batting(0, 0, 0.0, 0.0), &params), 0.0);
    }

    #[test]
    fn bowling_points_known_values() {
        let params = ValuationParams::default();
        // 20 wickets in 10 matches => 2/match
        // wickets 60 + clean 2*0.6*8 = 9.6 + milestone 0 + dots 0 (eco 7.5) + economy 0
        let stats = bowling(10, 20, 7.5);
        assert!(approx_eq(bowling_points(&stats, &params), 69.6, 1e-9));
    }

    #[test]
    fn economical_bowler_earns_maiden_and_dots() {
        let params = ValuationParams::default();
        // 1 wicket/match, economy 3.5
        // 30 + 4.8 + dots (2.5*4=10) + maiden 2.4 + economy bonus 6
        let stats = bowling(4, 4, 3.5);
        assert!(approx_eq(bowling_points(&stats, &params), 53.2, 1e-9));
    }

    #[test]
    fn fielding_scales_by_role() {
        let params = ValuationParams::default();
        let wk = fielding_points(Role::WicketKeeper, 10, &params);
        let bat = fielding_points(Role::Batter, 10, &params);
        let bwl = fielding_points(Role::Bowler, 10, &params);
        assert!(wk > bat && bat > bwl);
        // Batter: 0.8*8 + 0.05*4 + 0.1*12 + 0.15*6 = 6.4 + 0.2 + 1.2 + 0.9
        assert!(approx_eq(bat, 8.7, 1e-9));
        assert_eq!(fielding_points(Role::WicketKeeper, 0, &params), 0.0);
    }
}
