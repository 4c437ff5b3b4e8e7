// Injectable randomness for performance unpredictability.
//
// The valuation engine never reaches for a global RNG; callers pass a
// `JitterSource`. `NoJitter` makes valuation fully deterministic, and
// `SeededJitter` is reproducible for a given seed.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::valuation::params::ValuationParams;

/// Consistency index at which the jitter reaches its minimum spread.
const MAX_CONSISTENCY: f64 = 10.0;

/// Source of the multiplicative jitter applied to a heuristic value.
pub trait JitterSource {
    /// Return a factor around 1.0 for a player with the given consistency
    /// index. Implementations must be zero-mean around 1.0 and stay within
    /// `1.0 ± params.jitter_bound`.
    fn factor(&mut self, consistency: Option<f64>, params: &ValuationParams) -> f64;
}

/// Always returns 1.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJitter;

impl JitterSource for NoJitter {
    fn factor(&mut self, _consistency: Option<f64>, _params: &ValuationParams) -> f64 {
        1.0
    }
}

/// Standard deviation of the jitter for a consistency index.
///
/// Interpolates linearly from `jitter_sigma_max` at consistency 0 (or
/// unknown) down to `jitter_sigma_min` at consistency 10.
pub fn jitter_sigma(consistency: Option<f64>, params: &ValuationParams) -> f64 {
    let c = consistency
        .filter(|c| c.is_finite())
        .unwrap_or(0.0)
        .clamp(0.0, MAX_CONSISTENCY);
    let t = c / MAX_CONSISTENCY;
    params.jitter_sigma_max - (params.jitter_sigma_max - params.jitter_sigma_min) * t
}

/// Normally distributed jitter from a seeded ChaCha8 stream, clamped
/// symmetrically so the mean stays at 1.0.
#[derive(Debug, Clone)]
pub struct SeededJitter {
    rng: ChaCha8Rng,
}

impl SeededJitter {
    pub fn new(seed: u64) -> Self {
        SeededJitter {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl JitterSource for SeededJitter {
    fn factor(&mut self, consistency: Option<f64>, params: &ValuationParams) -> f64 {
        let sigma = jitter_sigma(consistency, params);
        if sigma <= 0.0 || params.jitter_bound <= 0.0 {
            return 1.0;
        }
        let deviation = match Normal::new(0.0, sigma) {
            Ok(normal) => normal.sample(&mut self.rng),
            Err(_) => 0.0,
        };
        1.0 + deviation.clamp(-params.jitter_bound, params.jitter_bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn no_jitter_is_identity() {
        let params = ValuationParams::default();
        let mut jitter = NoJitter;
        assert_eq!(jitter.factor(Some(3.0), &params), 1.0);
        assert_eq!(jitter.factor(None, &params), 1.0);
    }

    #[test]
    fn sigma_shrinks_with_consistency() {
        let params = ValuationParams::default();
        let low = jitter_sigma(Some(1.0), &params);
        let high = jitter_sigma(Some(9.0), &params);
        assert!(high < low);
        assert!(approx_eq(jitter_sigma(None, &params), params.jitter_sigma_max, 1e-12));
        assert!(approx_eq(jitter_sigma(Some(10.0), &params), params.jitter_sigma_min, 1e-12));
        assert!(approx_eq(jitter_sigma(Some(50.0), &params), params.jitter_sigma_min, 1e-12));
    }

    #[test]
    fn seeded_jitter_is_reproducible() {
        let params = ValuationParams::default();
        let mut a = SeededJitter::new(42);
        let mut b = SeededJitter::new(42);
        for _ in 0..20 {
            assert_eq!(a.factor(Some(5.0), &params), b.factor(Some(5.0), &params));
        }
    }

    #[test]
    fn seeded_jitter_stays_bounded() {
        let params = ValuationParams::default();
        let mut jitter = SeededJitter::new(7);
        for _ in 0..2_000 {
            let f = jitter.factor(None, &params);
            assert!(f >= 1.0 - params.jitter_bound - 1e-12);
            assert!(f <= 1.0 + params.jitter_bound + 1e-12);
        }
    }

    #[test]
    fn seeded_jitter_is_roughly_unbiased() {
        let params = ValuationParams::default();
        let mut jitter = SeededJitter::new(2024);
        let n = 20_000;
        let mean = (0..n).map(|_| jitter.factor(None, &params)).sum::<f64>() / n as f64;
        assert!(approx_eq(mean, 1.0, 0.005), "mean was {mean}");
    }

    #[test]
    fn consistent_players_vary_less() {
        let params = ValuationParams::default();
        let spread = |consistency: Option<f64>| {
            let mut jitter = SeededJitter::new(99);
            let samples: Vec<f64> = (0..5_000).map(|_| jitter.factor(consistency, &params)).collect();
            let mean = samples.iter().sum::<f64>() / samples.len() as f64;
            samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / samples.len() as f64
        };
        assert!(spread(Some(9.0)) < spread(Some(1.0)));
    }
}
