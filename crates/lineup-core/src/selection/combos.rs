// Enumeration of per-role count combinations.

use crate::player::Role;
use crate::selection::{RoleBounds, RoleLimits};

/// Counts indexed in `Role::ALL` order (WK, BAT, AR, BWL).
pub type RoleCounts = [usize; 4];

pub fn role_index(role: Role) -> usize {
    role.sort_order() as usize
}

/// Every combination of role counts within the bounds that sums to
/// `squad_size`, in lexicographic order (WK count first).
pub fn role_combinations(limits: &RoleLimits, squad_size: usize) -> Vec<RoleCounts> {
    let bounds: Vec<_> = Role::ALL.iter().map(|r| limits.get(*r)).collect();
    let mut out = Vec::new();
    let mut current = [0usize; 4];
    extend(&bounds, 0, squad_size, &mut current, &mut out);
    out
}

fn extend(
    bounds: &[RoleBounds],
    depth: usize,
    remaining: usize,
    current: &mut RoleCounts,
    out: &mut Vec<RoleCounts>,
) {
    if depth == bounds.len() {
        if remaining == 0 {
            out.push(*current);
        }
        return;
    }
    // Prune: the remaining roles must be able to absorb what is left.
    let rest_min: usize = bounds[depth + 1..].iter().map(|b| b.min).sum();
    let rest_max: usize = bounds[depth + 1..].iter().map(|b| b.max).sum();
    let b = bounds[depth];
    for count in b.min..=b.max.min(remaining) {
        let left = remaining - count;
        if left < rest_min || left > rest_max {
            continue;
        }
        current[depth] = count;
        extend(bounds, depth + 1, left, current, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_produce_only_valid_combinations() {
        let limits = RoleLimits::default();
        let combos = role_combinations(&limits, 11);
        assert!(!combos.is_empty());
        for c in &combos {
            assert_eq!(c.iter().sum::<usize>(), 11);
            for role in Role::ALL {
                assert!(limits.get(role).contains(c[role_index(role)]));
            }
        }
    }

    #[test]
    fn combinations_are_ordered_and_unique() {
        let combos = role_combinations(&RoleLimits::default(), 11);
        for pair in combos.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn fixed_bounds_give_single_combination() {
        let limits = RoleLimits {
            batter: RoleBounds::new(4, 4),
            bowler: RoleBounds::new(4, 4),
            all_rounder: RoleBounds::new(2, 2),
            wicket_keeper: RoleBounds::new(1, 1),
        };
        assert_eq!(role_combinations(&limits, 11), vec![[1, 4, 2, 4]]);
    }

    #[test]
    fn impossible_size_gives_nothing() {
        assert!(role_combinations(&RoleLimits::default(), 30).is_empty());
    }

    #[test]
    fn index_matches_role_order() {
        for (i, role) in Role::ALL.iter().enumerate() {
            assert_eq!(role_index(*role), i);
        }
    }
}
