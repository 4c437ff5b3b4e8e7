// Role-combination search.
//
// For every legal per-role count combination, fill each role from its
// ranked candidates while respecting the budget and side cap, then keep the
// fill with the highest total value. Ties go to the first combination found.
//
// Filling role by role can strand a combination: an early pick may use up
// the side cap a later role needed. When every ordering strands a
// combination, it is retried once per way of splitting each role's count
// between the sides. Within a split the budget reserve is exact, so a split
// that has any legal fill always fills.

use tracing::debug;

use crate::player::Role;
use crate::selection::combos::{role_combinations, role_index, RoleCounts};
use crate::selection::fill::{FillState, PoolIndex};
use crate::selection::{Constraints, BUDGET_EPSILON};

/// Upper bound on split fills per search. Default constraints with two
/// full sides stay well inside it.
pub(crate) const REPAIR_FILL_LIMIT: usize = 50_000;

/// Candidate orderings tried for each combination, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FillOrder {
    /// Descending value per unit cost.
    ValuePerCost,
    /// Descending raw value.
    Value,
}

const FILL_ORDERS: [FillOrder; 2] = [FillOrder::ValuePerCost, FillOrder::Value];

/// Indices of the best legal squad, or `None` if no combination fills
/// within `repair_limit` split fills.
pub fn best_fill(
    index: &PoolIndex<'_>,
    constraints: &Constraints,
    repair_limit: usize,
) -> Option<Vec<usize>> {
    let combos = role_combinations(&constraints.roles, constraints.squad_size);
    debug!(combinations = combos.len(), "searching role combinations");

    let ranked: Vec<[Vec<usize>; 4]> = FILL_ORDERS
        .iter()
        .map(|order| ranked_by_role(index, *order))
        .collect();
    let sizes = index.bucket_sizes();

    let mut best: Option<(f64, Vec<usize>)> = None;
    let mut repairs_left = repair_limit;
    for combo in &combos {
        let mut filled = false;
        for by_role in &ranked {
            if let Some(state) = fill_combination(index, constraints, combo, by_role) {
                filled = true;
                keep_best(&mut best, state);
            }
        }
        if filled {
            continue;
        }

        for split in side_splits(combo, &sizes, constraints.max_per_side) {
            let reachable = index
                .cheapest_split_completion(|_| false, &split)
                .is_some_and(|cost| cost <= constraints.budget + BUDGET_EPSILON);
            if !reachable {
                continue;
            }
            for by_role in &ranked {
                if repairs_left == 0 {
                    break;
                }
                repairs_left -= 1;
                if let Some(state) = fill_split(index, constraints, &split, by_role) {
                    keep_best(&mut best, state);
                }
            }
        }
    }

    if repairs_left == 0 {
        debug!(limit = repair_limit, "split repair limit reached");
    }
    best.map(|(_, picks)| picks)
}

fn keep_best(best: &mut Option<(f64, Vec<usize>)>, state: FillState<'_>) {
    let total = state.total_value();
    let better = match best {
        Some((best_total, _)) => total > *best_total + 1e-9,
        None => true,
    };
    if better {
        *best = Some((total, state.into_picks()));
    }
}

/// Candidate indices per role, sorted by `order`. The sort is stable so
/// equal keys keep pool order.
fn ranked_by_role(index: &PoolIndex<'_>, order: FillOrder) -> [Vec<usize>; 4] {
    let pool = index.pool();
    let mut by_role: [Vec<usize>; 4] = Default::default();
    for i in 0..pool.len() {
        by_role[index.role_of(i)].push(i);
    }
    for list in by_role.iter_mut() {
        match order {
            FillOrder::ValuePerCost => {
                list.sort_by(|&a, &b| pool[b].value_per_cost().total_cmp(&pool[a].value_per_cost()))
            }
            FillOrder::Value => list.sort_by(|&a, &b| pool[b].value.total_cmp(&pool[a].value)),
        }
    }
    by_role
}

fn fill_combination<'a>(
    index: &'a PoolIndex<'a>,
    constraints: &'a Constraints,
    combo: &RoleCounts,
    by_role: &[Vec<usize>; 4],
) -> Option<FillState<'a>> {
    let mut state = FillState::new(index, constraints);
    for role in Role::ALL {
        let r = role_index(role);
        let target = combo[r];
        for &i in &by_role[r] {
            if state.role_counts()[r] == target {
                break;
            }
            if !state.side_has_room(i) || !state.affordable(i, combo) {
                continue;
            }
            state.add(i);
        }
        if state.role_counts()[r] < target {
            return None;
        }
    }
    Some(state)
}

/// Fill a combination whose per-side counts are fixed by `split`.
fn fill_split<'a>(
    index: &'a PoolIndex<'a>,
    constraints: &'a Constraints,
    split: &[RoleCounts],
    by_role: &[Vec<usize>; 4],
) -> Option<FillState<'a>> {
    let mut state = FillState::new(index, constraints);
    for list in by_role {
        for &i in list {
            if state.affordable_in_split(i, split) {
                state.add(i);
            }
        }
    }
    state.is_full().then_some(state)
}

/// Every way to divide each role's count in `combo` between the sides,
/// bounded by the players each side has in that role and by `cap` per side.
/// The first side's share grows slowest.
fn side_splits(combo: &RoleCounts, sizes: &[RoleCounts], cap: usize) -> Vec<Vec<RoleCounts>> {
    if sizes.is_empty() {
        return Vec::new();
    }
    let mut walk = SplitWalk {
        combo,
        sizes,
        cap,
        current: vec![[0; 4]; sizes.len()],
        totals: vec![0; sizes.len()],
        out: Vec::new(),
    };
    walk.extend(0, 0, combo[0]);
    walk.out
}

struct SplitWalk<'a> {
    combo: &'a RoleCounts,
    sizes: &'a [RoleCounts],
    cap: usize,
    current: Vec<RoleCounts>,
    totals: Vec<usize>,
    out: Vec<Vec<RoleCounts>>,
}

impl SplitWalk<'_> {
    /// Place `left` players of role `role`, starting at side `side`.
    fn extend(&mut self, role: usize, side: usize, left: usize) {
        if role == 4 {
            self.out.push(self.current.clone());
            return;
        }

        let room = self.cap.saturating_sub(self.totals[side]);
        let most = left.min(self.sizes[side][role]).min(room);

        if side + 1 == self.sizes.len() {
            // The last side takes whatever is left of this role.
            if left <= most {
                self.place(role, side, left);
                let next = self.combo.get(role + 1).copied().unwrap_or(0);
                self.extend(role + 1, 0, next);
                self.place(role, side, 0);
            }
            return;
        }

        for n in 0..=most {
            self.place(role, side, n);
            self.extend(role, side + 1, left - n);
        }
        self.place(role, side, 0);
    }

    fn place(&mut self, role: usize, side: usize, n: usize) {
        self.totals[side] = self.totals[side] - self.current[side][role] + n;
        self.current[side][role] = n;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::Player;
    use crate::selection::{RoleBounds, RoleLimits};
    use crate::valuation::{ValueBreakdown, ValuedPlayer};

    fn vp(name: &str, side: &str, role: Role, cost: f64, value: f64) -> ValuedPlayer {
        ValuedPlayer {
            player: Player::new(name, side, role, cost),
            value,
            base_value: value,
            breakdown: ValueBreakdown::default(),
        }
    }

    fn small_constraints(budget: f64) -> Constraints {
        Constraints {
            budget,
            squad_size: 3,
            max_per_side: 2,
            roles: RoleLimits {
                batter: RoleBounds::new(1, 2),
                bowler: RoleBounds::new(1, 2),
                all_rounder: RoleBounds::new(0, 1),
                wicket_keeper: RoleBounds::new(0, 1),
            },
        }
    }

    fn search(pool: &[ValuedPlayer], constraints: &Constraints) -> Option<Vec<usize>> {
        best_fill(&PoolIndex::new(pool), constraints, REPAIR_FILL_LIMIT)
    }

    fn names(pool: &[ValuedPlayer], picks: &[usize]) -> Vec<String> {
        let mut v: Vec<String> = picks.iter().map(|&i| pool[i].name().to_string()).collect();
        v.sort();
        v
    }

    /// Side A's keeper is the first pick in every ordering, but taking that
    /// keeper leaves side A one slot for two players the squad cannot do
    /// without. The only legal squad uses side B's keeper.
    fn stranding_keeper_pool() -> (Vec<ValuedPlayer>, Constraints) {
        let pool = vec![
            vp("p0", "A", Role::Batter, 9.0, 33.0),
            vp("p1", "A", Role::Bowler, 2.0, 28.0),
            vp("p2", "B", Role::WicketKeeper, 9.0, 9.0),
            vp("p3", "B", Role::Batter, 1.0, 1.0),
            vp("p4", "A", Role::WicketKeeper, 6.0, 40.0),
        ];
        let constraints = Constraints {
            budget: 26.0,
            squad_size: 4,
            max_per_side: 2,
            roles: RoleLimits {
                wicket_keeper: RoleBounds::new(1, 1),
                batter: RoleBounds::new(1, 2),
                all_rounder: RoleBounds::new(0, 1),
                bowler: RoleBounds::new(1, 2),
            },
        };
        (pool, constraints)
    }

    #[test]
    fn picks_highest_total_value_under_budget() {
        let pool = vec![
            vp("bat-star", "A", Role::Batter, 9.0, 50.0),
            vp("bat-cheap", "B", Role::Batter, 2.0, 15.0),
            vp("bowl-star", "B", Role::Bowler, 8.0, 45.0),
            vp("bowl-cheap", "A", Role::Bowler, 2.0, 12.0),
        ];
        let picks = search(&pool, &small_constraints(100.0)).unwrap();
        assert_eq!(picks.len(), 3);
        assert_eq!(
            names(&pool, &picks),
            vec!["bat-cheap", "bat-star", "bowl-star"]
        );
    }

    #[test]
    fn budget_forces_cheaper_picks() {
        let pool = vec![
            vp("bat-star", "A", Role::Batter, 9.0, 50.0),
            vp("bat-cheap", "B", Role::Batter, 2.0, 15.0),
            vp("bowl-star", "B", Role::Bowler, 8.0, 45.0),
            vp("bowl-cheap", "A", Role::Bowler, 2.0, 12.0),
        ];
        let picks = search(&pool, &small_constraints(13.0)).unwrap();
        let cost: f64 = picks.iter().map(|&i| pool[i].player.cost).sum();
        assert!(cost <= 13.0);
        assert_eq!(picks.len(), 3);
    }

    #[test]
    fn side_cap_is_respected() {
        let pool = vec![
            vp("a1", "A", Role::Batter, 1.0, 40.0),
            vp("a2", "A", Role::Batter, 1.0, 39.0),
            vp("a3", "A", Role::Bowler, 1.0, 38.0),
            vp("b1", "B", Role::Bowler, 1.0, 5.0),
        ];
        let picks = search(&pool, &small_constraints(100.0)).unwrap();
        let from_a = picks.iter().filter(|&&i| pool[i].side() == "A").count();
        assert_eq!(from_a, 2);
        assert!(names(&pool, &picks).contains(&"b1".to_string()));
    }

    #[test]
    fn unfillable_pool_returns_none() {
        let pool = vec![
            vp("a1", "A", Role::Batter, 1.0, 40.0),
            vp("a2", "A", Role::Batter, 1.0, 39.0),
            vp("b1", "B", Role::Batter, 1.0, 5.0),
        ];
        assert!(search(&pool, &small_constraints(100.0)).is_none());
    }

    #[test]
    fn equal_values_resolve_to_pool_order() {
        let pool = vec![
            vp("first", "A", Role::Batter, 5.0, 20.0),
            vp("second", "B", Role::Batter, 5.0, 20.0),
            vp("third", "A", Role::Batter, 5.0, 20.0),
            vp("bowl", "B", Role::Bowler, 5.0, 20.0),
        ];
        let picks = search(&pool, &small_constraints(100.0)).unwrap();
        assert_eq!(names(&pool, &picks), vec!["bowl", "first", "second"]);
    }

    #[test]
    fn stranded_combination_is_repaired_by_side_split() {
        let (pool, constraints) = stranding_keeper_pool();
        let picks = search(&pool, &constraints).unwrap();
        assert_eq!(names(&pool, &picks), vec!["p0", "p1", "p2", "p3"]);
        let cost: f64 = picks.iter().map(|&i| pool[i].player.cost).sum();
        assert_eq!(cost, 21.0);
    }

    #[test]
    fn zero_repair_limit_leaves_stranded_combination_unfilled() {
        let (pool, constraints) = stranding_keeper_pool();
        assert!(best_fill(&PoolIndex::new(&pool), &constraints, 0).is_none());
    }

    #[test]
    fn side_splits_honor_cap_and_supply() {
        // WK 1, BAT 2, BWL 1; side A has 1 WK, 1 BAT, 1 BWL; side B has 1 WK, 1 BAT.
        let sizes = vec![[1, 1, 0, 1], [1, 1, 0, 0]];
        let splits = side_splits(&[1, 2, 0, 1], &sizes, 2);
        assert_eq!(splits, vec![vec![[0, 1, 0, 1], [1, 1, 0, 0]]]);

        let loose = side_splits(&[1, 2, 0, 1], &sizes, 3);
        assert_eq!(loose.len(), 2);
        for split in &loose {
            for (side, counts) in split.iter().enumerate() {
                assert!(counts.iter().sum::<usize>() <= 3);
                for r in 0..4 {
                    assert!(counts[r] <= sizes[side][r]);
                }
            }
        }
    }
}
