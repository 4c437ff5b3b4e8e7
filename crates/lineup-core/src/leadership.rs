// Captain / vice-captain assignment and headline score.

use tracing::debug;

use crate::selection::Squad;

pub const CAPTAIN_MULTIPLIER: f64 = 2.0;
pub const VICE_CAPTAIN_MULTIPLIER: f64 = 1.5;

/// Make the two members with the most expected points captain and
/// vice-captain and recompute the headline score.
///
/// Ranks on engine points, not the strategy-reweighted value, so squads
/// with the same members score the same under every strategy. Ties keep
/// member order. An empty squad is returned unchanged; a one-player squad
/// gets a captain only.
pub fn assign_leadership(mut squad: Squad) -> Squad {
    let mut order: Vec<usize> = (0..squad.members.len()).collect();
    order.sort_by(|&a, &b| {
        squad.members[b]
            .points()
            .total_cmp(&squad.members[a].points())
    });

    for m in squad.members.iter_mut() {
        m.is_captain = false;
        m.is_vice_captain = false;
        m.multiplier = 1.0;
    }

    if let Some(&c) = order.first() {
        let m = &mut squad.members[c];
        m.is_captain = true;
        m.multiplier = CAPTAIN_MULTIPLIER;
    }
    if let Some(&vc) = order.get(1) {
        let m = &mut squad.members[vc];
        m.is_vice_captain = true;
        m.multiplier = VICE_CAPTAIN_MULTIPLIER;
    }

    squad.score = headline_score(&squad);
    if let (Some(c), Some(vc)) = (squad.captain(), squad.vice_captain()) {
        debug!(captain = %c.name(), vice_captain = %vc.name(), score = squad.score, "assigned leadership");
    }
    squad
}

/// Sum of member points times their leadership multipliers.
pub fn headline_score(squad: &Squad) -> f64 {
    squad.members.iter().map(|m| m.expected_points()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{Player, Role};
    use crate::selection::{InfeasibleReason, SelectionStatus};
    use crate::valuation::{ValueBreakdown, ValuedPlayer};

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn vp(name: &str, value: f64) -> ValuedPlayer {
        ValuedPlayer {
            player: Player::new(name, "Lions", Role::Batter, 5.0),
            value,
            base_value: value,
            breakdown: ValueBreakdown::default(),
        }
    }

    fn squad(values: &[(&str, f64)]) -> Squad {
        let players = values.iter().map(|(n, v)| vp(n, *v)).collect();
        Squad::from_players(players, SelectionStatus::Optimal, 100.0)
    }

    #[test]
    fn top_two_lead_and_score_is_weighted() {
        let s = assign_leadership(squad(&[("a", 10.0), ("b", 40.0), ("c", 30.0)]));
        assert_eq!(s.captain().unwrap().name(), "b");
        assert_eq!(s.vice_captain().unwrap().name(), "c");
        // 40*2 + 30*1.5 + 10
        assert!(approx_eq(s.score, 135.0, 1e-9));
        assert!(approx_eq(s.total_value, 80.0, 1e-9));
    }

    #[test]
    fn leadership_follows_points_not_reweighted_value() {
        let mut boosted = vp("boosted", 30.0);
        boosted.value = 50.0;
        let players = vec![boosted, vp("steady", 40.0), vp("squad", 10.0)];
        let s = assign_leadership(Squad::from_players(players, SelectionStatus::Optimal, 100.0));
        assert_eq!(s.captain().unwrap().name(), "steady");
        assert_eq!(s.vice_captain().unwrap().name(), "boosted");
        // 40*2 + 30*1.5 + 10
        assert!(approx_eq(s.score, 135.0, 1e-9));
        assert!(approx_eq(s.total_value, 100.0, 1e-9));
    }

    #[test]
    fn ties_keep_member_order() {
        let s = assign_leadership(squad(&[("first", 20.0), ("second", 20.0), ("third", 20.0)]));
        assert_eq!(s.captain().unwrap().name(), "first");
        assert_eq!(s.vice_captain().unwrap().name(), "second");
    }

    #[test]
    fn captain_and_vice_are_distinct() {
        let s = assign_leadership(squad(&[("a", 5.0), ("b", 5.0)]));
        let c = s.captain().unwrap();
        let vc = s.vice_captain().unwrap();
        assert_ne!(c.name(), vc.name());
        assert_eq!(s.members.iter().filter(|m| m.is_captain).count(), 1);
        assert_eq!(s.members.iter().filter(|m| m.is_vice_captain).count(), 1);
    }

    #[test]
    fn reassignment_is_idempotent() {
        let once = assign_leadership(squad(&[("a", 10.0), ("b", 40.0), ("c", 30.0)]));
        let twice = assign_leadership(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn single_member_gets_captain_only() {
        let s = assign_leadership(squad(&[("solo", 12.0)]));
        assert_eq!(s.captain().unwrap().name(), "solo");
        assert!(s.vice_captain().is_none());
        assert!(approx_eq(s.score, 24.0, 1e-9));
    }

    #[test]
    fn infeasible_squad_is_untouched() {
        let s = assign_leadership(Squad::infeasible(vec![InfeasibleReason::NoLegalFill], 10.0));
        assert!(s.captain().is_none());
        assert_eq!(s.score, 0.0);
    }
}
