//! Baby-step giant-step recovery of a small count `M` from `M·g`.

use std::collections::HashMap;

use ark_ec::CurveGroup;
use ark_std::Zero;

use crate::error::{Result, VotingError};

const LOG_TARGET: &str = "blindvote::tally";

/// Precomputed baby steps `j·g` for `j ∈ [0, step)`.
pub struct BabyStepTable<C: CurveGroup> {
    g: C,
    upper_bound: u64,
    step: u64,
    baby_steps: HashMap<C::Affine, u64>,
}

impl<C: CurveGroup> BabyStepTable<C> {
    pub fn new(g: C, upper_bound: u64) -> Self {
        let step = ceil_sqrt(upper_bound.saturating_add(1)).max(1);

        let mut points = Vec::with_capacity(step as usize);
        let mut current = C::zero();
        for _ in 0..step {
            points.push(current);
            current += g;
        }
        let baby_steps = C::normalize_batch(&points)
            .into_iter()
            .zip(0u64..)
            .collect::<HashMap<_, _>>();

        tracing::debug!(target: LOG_TARGET, upper_bound, step, "Built baby-step table");

        Self {
            g,
            upper_bound,
            step,
            baby_steps,
        }
    }

    /// Find `M ∈ [0, upper_bound]` with `M·g == target`.
    pub fn solve(&self, target: &C) -> Result<u64> {
        if target.is_zero() {
            return Ok(0);
        }

        let giant = -(self.g * C::ScalarField::from(self.step));
        let mut gamma = *target;
        for i in 0..=(self.upper_bound / self.step) {
            if let Some(j) = self.baby_steps.get(&gamma.into_affine()) {
                let candidate = i * self.step + j;
                if candidate <= self.upper_bound {
                    tracing::debug!(target: LOG_TARGET, giant_steps = i, "Recovered discrete log");
                    return Ok(candidate);
                }
            }
            gamma += giant;
        }

        tracing::warn!(target: LOG_TARGET, upper_bound = self.upper_bound, "Discrete log not found within bound");
        Err(VotingError::TallyUnrecoverable {
            upper_bound: self.upper_bound,
        })
    }
}

/// One-shot recovery of `M ≤ upper_bound` from `target = M·g`.
pub fn recover<C: CurveGroup>(g: C, target: &C, upper_bound: u64) -> Result<u64> {
    BabyStepTable::new(g, upper_bound).solve(target)
}

fn ceil_sqrt(n: u64) -> u64 {
    let mut root = (n as f64).sqrt() as u64;
    while root.saturating_mul(root) < n {
        root += 1;
    }
    while root > 0 && (root - 1).saturating_mul(root - 1) >= n {
        root -= 1;
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::PrimeGroup;
    use ark_secp256k1::{Fr, Projective};

    fn g() -> Projective {
        Projective::generator()
    }

    #[test]
    fn ceil_sqrt_matches_definition() {
        assert_eq!(ceil_sqrt(0), 0);
        assert_eq!(ceil_sqrt(1), 1);
        assert_eq!(ceil_sqrt(2), 2);
        assert_eq!(ceil_sqrt(4), 2);
        assert_eq!(ceil_sqrt(5), 3);
        assert_eq!(ceil_sqrt(10_001), 101);
    }

    #[test]
    fn recovers_every_count_up_to_bound() {
        let bound = 50;
        let table = BabyStepTable::new(g(), bound);
        for m in 0..=bound {
            let target = g() * Fr::from(m);
            assert_eq!(table.solve(&target).unwrap(), m);
        }
    }

    #[test]
    fn count_just_above_bound_is_unrecoverable() {
        let bound = 9;
        let target = g() * Fr::from(bound + 1);
        assert_eq!(
            recover(g(), &target, bound).unwrap_err(),
            VotingError::TallyUnrecoverable { upper_bound: bound }
        );
    }

    #[test]
    fn unrelated_point_is_unrecoverable() {
        let target = g() * Fr::from(123_456_789u64);
        assert!(recover(g(), &target, 1_000).is_err());
    }

    #[test]
    fn zero_bound_only_accepts_identity() {
        assert_eq!(recover(g(), &Projective::zero(), 0).unwrap(), 0);
        assert!(recover(g(), &g(), 0).is_err());
    }

    #[test]
    fn large_bound() {
        let bound = 1_000_000;
        let m = 765_432;
        assert_eq!(recover(g(), &(g() * Fr::from(m)), bound).unwrap(), m);
    }
}
