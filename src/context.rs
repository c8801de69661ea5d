//! Per-election policy state: replay protection and the tally privacy threshold.

use ark_ec::CurveGroup;
use dashmap::DashSet;
use uuid::Uuid;

use crate::error::{Result, VotingError};

const LOG_TARGET: &str = "blindvote::context";

/// Which kind of point a replay entry refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointKind {
    Anchor,
    Commitment,
}

/// Rejects a point that has already been accepted in this election.
#[derive(Debug, Default)]
pub struct ReplayGuard {
    seen: DashSet<(PointKind, Vec<u8>)>,
}

impl ReplayGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `point`, failing with `DuplicateCommitment` if it was seen before.
    pub fn check_and_insert<C: CurveGroup>(&self, kind: PointKind, point: &C) -> Result<()> {
        let mut encoded = Vec::new();
        point
            .serialize_compressed(&mut encoded)
            .map_err(|err| VotingError::Malformed(err.to_string()))?;
        if self.seen.insert((kind, encoded)) {
            Ok(())
        } else {
            tracing::warn!(target: LOG_TARGET, ?kind, "Replayed point rejected");
            Err(VotingError::DuplicateCommitment)
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// State scoped to one election. Owned by its coordinator; never shared across elections.
#[derive(Debug)]
pub struct ElectionContext {
    election_id: Uuid,
    min_ballots_for_tally: usize,
    replay_guard: ReplayGuard,
}

impl ElectionContext {
    pub fn new(election_id: Uuid, min_ballots_for_tally: usize) -> Self {
        Self {
            election_id,
            min_ballots_for_tally,
            replay_guard: ReplayGuard::new(),
        }
    }

    pub fn replay_guard(&self) -> &ReplayGuard {
        &self.replay_guard
    }

    /// A tally over fewer ballots than the threshold would expose individual votes.
    pub fn ensure_privacy_threshold(&self, cast: usize) -> Result<()> {
        if cast < self.min_ballots_for_tally {
            tracing::warn!(
                target: LOG_TARGET,
                election_id = %self.election_id,
                cast,
                required = self.min_ballots_for_tally,
                "Tally refused below privacy threshold"
            );
            return Err(VotingError::PrivacyThresholdNotMet {
                cast,
                required: self.min_ballots_for_tally,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_ec::PrimeGroup;
    use ark_secp256k1::Projective;

    #[test]
    fn replay_guard_rejects_second_insert() {
        let guard = ReplayGuard::new();
        let point = Projective::generator();
        assert!(guard.check_and_insert(PointKind::Commitment, &point).is_ok());
        assert_eq!(
            guard.check_and_insert(PointKind::Commitment, &point),
            Err(VotingError::DuplicateCommitment)
        );
        assert_eq!(guard.len(), 1);
    }

    #[test]
    fn replay_guard_separates_point_kinds() {
        let guard = ReplayGuard::new();
        let point = Projective::generator();
        assert!(guard.check_and_insert(PointKind::Anchor, &point).is_ok());
        assert!(guard.check_and_insert(PointKind::Commitment, &point).is_ok());
    }

    #[test]
    fn contexts_do_not_share_replay_state() {
        let a = ElectionContext::new(Uuid::from_u128(1), 1);
        let b = ElectionContext::new(Uuid::from_u128(2), 1);
        let point = Projective::generator();
        assert!(a.replay_guard().check_and_insert(PointKind::Anchor, &point).is_ok());
        assert!(b.replay_guard().check_and_insert(PointKind::Anchor, &point).is_ok());
    }

    #[test]
    fn privacy_threshold() {
        let context = ElectionContext::new(Uuid::nil(), 3);
        assert_eq!(
            context.ensure_privacy_threshold(2),
            Err(VotingError::PrivacyThresholdNotMet { cast: 2, required: 3 })
        );
        assert!(context.ensure_privacy_threshold(3).is_ok());
    }
}
