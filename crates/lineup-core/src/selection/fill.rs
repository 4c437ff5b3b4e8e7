// Incremental squad builder shared by the search and greedy selectors.
//
// Tracks spend plus role and side counts, and refuses a pick that would
// leave too little budget to complete the squad at its cheapest.

use crate::selection::combos::{role_index, RoleCounts};
use crate::selection::{Constraints, BUDGET_EPSILON};
use crate::valuation::ValuedPlayer;

/// Lookups built once per selection: side numbering in pool order, role
/// indices, and every player in ascending cost order.
pub(crate) struct PoolIndex<'a> {
    pool: &'a [ValuedPlayer],
    side_count: usize,
    side_of: Vec<usize>,
    role_of: Vec<usize>,
    by_cost: Vec<usize>,
}

impl<'a> PoolIndex<'a> {
    pub fn new(pool: &'a [ValuedPlayer]) -> Self {
        let mut sides: Vec<&str> = Vec::new();
        let mut side_of = Vec::with_capacity(pool.len());
        for p in pool {
            let idx = match sides.iter().position(|s| *s == p.side()) {
                Some(idx) => idx,
                None => {
                    sides.push(p.side());
                    sides.len() - 1
                }
            };
            side_of.push(idx);
        }

        let role_of = pool.iter().map(|p| role_index(p.player.role)).collect();

        // Stable: equal costs keep pool order.
        let mut by_cost: Vec<usize> = (0..pool.len()).collect();
        by_cost.sort_by(|&a, &b| pool[a].player.cost.total_cmp(&pool[b].player.cost));

        PoolIndex {
            pool,
            side_count: sides.len(),
            side_of,
            role_of,
            by_cost,
        }
    }

    pub fn pool(&self) -> &'a [ValuedPlayer] {
        self.pool
    }

    pub fn side_of(&self, i: usize) -> usize {
        self.side_of[i]
    }

    pub fn role_of(&self, i: usize) -> usize {
        self.role_of[i]
    }

    /// Players available per side (outer) and role (inner).
    pub fn bucket_sizes(&self) -> Vec<RoleCounts> {
        let mut sizes = vec![[0; 4]; self.side_count];
        for i in 0..self.pool.len() {
            sizes[self.side_of[i]][self.role_of[i]] += 1;
        }
        sizes
    }

    /// Cheapest cost of `needs[r]` more players of each role plus `free`
    /// players of any role, skipping every `i` for which `taken(i)` holds.
    /// `None` if the pool cannot supply them.
    ///
    /// Ignores side caps and role maximums, so it is a lower bound.
    pub fn cheapest_completion(
        &self,
        taken: impl Fn(usize) -> bool,
        needs: &RoleCounts,
        free: usize,
    ) -> Option<f64> {
        let mut needs = *needs;
        let mut free = free;
        let mut total = 0.0;

        for &i in &self.by_cost {
            if free == 0 && needs.iter().all(|&n| n == 0) {
                break;
            }
            if taken(i) {
                continue;
            }
            let r = self.role_of[i];
            if needs[r] > 0 {
                needs[r] -= 1;
            } else if free > 0 {
                free -= 1;
            } else {
                continue;
            }
            total += self.pool[i].player.cost;
        }

        (free == 0 && needs.iter().all(|&n| n == 0)).then_some(total)
    }

    /// Cheapest cost of exactly `needs[s][r]` more players from each side
    /// and role, skipping every `i` for which `taken(i)` holds.
    ///
    /// Exact: the side/role buckets never compete for a player.
    pub fn cheapest_split_completion(
        &self,
        taken: impl Fn(usize) -> bool,
        needs: &[RoleCounts],
    ) -> Option<f64> {
        let mut needs = needs.to_vec();
        let mut outstanding: usize = needs.iter().flatten().sum();
        let mut total = 0.0;

        for &i in &self.by_cost {
            if outstanding == 0 {
                break;
            }
            if taken(i) {
                continue;
            }
            let need = &mut needs[self.side_of[i]][self.role_of[i]];
            if *need > 0 {
                *need -= 1;
                outstanding -= 1;
                total += self.pool[i].player.cost;
            }
        }

        (outstanding == 0).then_some(total)
    }
}

pub(crate) struct FillState<'a> {
    index: &'a PoolIndex<'a>,
    constraints: &'a Constraints,
    picked: Vec<bool>,
    picks: Vec<usize>,
    spent: f64,
    role_counts: RoleCounts,
    /// Per side, per role.
    bucket_counts: Vec<RoleCounts>,
    side_totals: Vec<usize>,
}

impl<'a> FillState<'a> {
    pub fn new(index: &'a PoolIndex<'a>, constraints: &'a Constraints) -> Self {
        FillState {
            index,
            constraints,
            picked: vec![false; index.pool.len()],
            picks: Vec::with_capacity(constraints.squad_size),
            spent: 0.0,
            role_counts: [0; 4],
            bucket_counts: vec![[0; 4]; index.side_count],
            side_totals: vec![0; index.side_count],
        }
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_full(&self) -> bool {
        self.picks.len() >= self.constraints.squad_size
    }

    pub fn is_picked(&self, i: usize) -> bool {
        self.picked[i]
    }

    pub fn role_counts(&self) -> &RoleCounts {
        &self.role_counts
    }

    pub fn side_has_room(&self, i: usize) -> bool {
        self.side_totals[self.index.side_of(i)] < self.constraints.max_per_side
    }

    fn over_budget(&self, i: usize) -> bool {
        self.spent + self.index.pool[i].player.cost > self.constraints.budget + BUDGET_EPSILON
    }

    fn fits_with_reserve(&self, i: usize, reserve: Option<f64>) -> bool {
        match reserve {
            Some(reserve) => {
                self.spent + self.index.pool[i].player.cost + reserve
                    <= self.constraints.budget + BUDGET_EPSILON
            }
            None => false,
        }
    }

    /// Whether picking `i` still leaves enough budget to reach `targets`
    /// per role and then the full squad size.
    pub fn affordable(&self, i: usize, targets: &RoleCounts) -> bool {
        if self.over_budget(i) {
            return false;
        }

        let ri = self.index.role_of(i);
        let mut needs = [0; 4];
        for r in 0..4 {
            let have = self.role_counts[r] + usize::from(r == ri);
            needs[r] = targets[r].saturating_sub(have);
        }
        let outstanding: usize = needs.iter().sum();
        let free = self
            .constraints
            .squad_size
            .saturating_sub(self.picks.len() + 1 + outstanding);

        let reserve = self
            .index
            .cheapest_completion(|j| j == i || self.picked[j], &needs, free);
        self.fits_with_reserve(i, reserve)
    }

    /// Whether `i` has room in its side/role bucket of `split` and the
    /// remaining buckets can still be filled within budget afterwards.
    pub fn affordable_in_split(&self, i: usize, split: &[RoleCounts]) -> bool {
        let (si, ri) = (self.index.side_of(i), self.index.role_of(i));
        if self.bucket_counts[si][ri] >= split[si][ri] || self.over_budget(i) {
            return false;
        }

        let needs: Vec<RoleCounts> = split
            .iter()
            .enumerate()
            .map(|(s, target)| {
                let mut n = [0; 4];
                for r in 0..4 {
                    let have = self.bucket_counts[s][r] + usize::from(s == si && r == ri);
                    n[r] = target[r].saturating_sub(have);
                }
                n
            })
            .collect();

        let reserve = self
            .index
            .cheapest_split_completion(|j| j == i || self.picked[j], &needs);
        self.fits_with_reserve(i, reserve)
    }

    pub fn add(&mut self, i: usize) {
        let (s, r) = (self.index.side_of(i), self.index.role_of(i));
        self.picked[i] = true;
        self.picks.push(i);
        self.spent += self.index.pool[i].player.cost;
        self.role_counts[r] += 1;
        self.bucket_counts[s][r] += 1;
        self.side_totals[s] += 1;
    }

    pub fn total_value(&self) -> f64 {
        self.picks.iter().map(|&i| self.index.pool[i].value).sum()
    }

    pub fn into_picks(self) -> Vec<usize> {
        self.picks
    }
}
