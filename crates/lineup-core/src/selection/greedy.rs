// Greedy selection: cover role minimums first (scarcest role first), then
// take the best remaining players by value. Used directly or as the fallback
// when the combination search finds nothing.

use tracing::debug;

use crate::player::Role;
use crate::selection::combos::{role_index, RoleCounts};
use crate::selection::fill::{FillState, PoolIndex};
use crate::selection::Constraints;
use crate::valuation::ValuedPlayer;

/// Indices of a complete legal squad, or `None` if greedy gets stuck.
pub fn fill(index: &PoolIndex<'_>, constraints: &Constraints) -> Option<Vec<usize>> {
    let pool = index.pool();
    let mut order: Vec<usize> = (0..pool.len()).collect();
    order.sort_by(|&a, &b| pool[b].value.total_cmp(&pool[a].value));

    let mut minimums: RoleCounts = [0; 4];
    let mut maximums: RoleCounts = [0; 4];
    for role in Role::ALL {
        let bounds = constraints.roles.get(role);
        minimums[role_index(role)] = bounds.min;
        maximums[role_index(role)] = bounds.max;
    }

    let mut state = FillState::new(index, constraints);

    for role in roles_by_scarcity(pool, &minimums) {
        let r = role_index(role);
        for &i in &order {
            if state.role_counts()[r] >= minimums[r] {
                break;
            }
            if pool[i].player.role != role || state.is_picked(i) {
                continue;
            }
            if state.side_has_room(i) && state.affordable(i, &minimums) {
                state.add(i);
            }
        }
        if state.role_counts()[r] < minimums[r] {
            debug!(role = %role, "greedy could not cover role minimum");
            return None;
        }
    }

    for &i in &order {
        if state.is_full() {
            break;
        }
        if state.is_picked(i) {
            continue;
        }
        let r = role_index(pool[i].player.role);
        if state.role_counts()[r] >= maximums[r] {
            continue;
        }
        if state.side_has_room(i) && state.affordable(i, &minimums) {
            state.add(i);
        }
    }

    if !state.is_full() {
        debug!(picked = state.len(), "greedy ran out of legal candidates");
        return None;
    }
    Some(state.into_picks())
}

/// Roles with a minimum, ordered by how few candidates they have per
/// required slot. Ties keep `Role::ALL` order.
fn roles_by_scarcity(pool: &[ValuedPlayer], minimums: &RoleCounts) -> Vec<Role> {
    let mut roles: Vec<(Role, f64)> = Role::ALL
        .iter()
        .filter(|r| minimums[role_index(**r)] > 0)
        .map(|r| {
            let available = pool.iter().filter(|p| p.player.role == *r).count();
            (*r, available as f64 / minimums[role_index(*r)] as f64)
        })
        .collect();
    roles.sort_by(|a, b| a.1.total_cmp(&b.1));
    roles.into_iter().map(|(r, _)| r).collect()
}
