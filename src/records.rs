//! Public records exchanged between voters and the coordinator.

use ark_ec::CurveGroup;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consistency_proof::ConsistencyProof;
use crate::pedersen_commitment::PedersenParams;
use crate::schnorr::SchnorrProof;
use crate::transcript::ProofContext;
use crate::types::VoterId;

/// A voter's registration: `H = r·h` plus proof of knowledge of `r`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Anchor<C: CurveGroup> {
    pub voter_id: VoterId,
    #[serde(with = "crate::crypto_serde::curve")]
    pub anchor_point: C,
    pub proof_of_knowledge: SchnorrProof<C>,
}

impl<C: CurveGroup> Anchor<C> {
    pub fn verify(&self, params: &PedersenParams<C>, election_id: Uuid) -> bool {
        let context = ProofContext::new(election_id, self.voter_id.clone());
        self.proof_of_knowledge
            .verify(params, &self.anchor_point, &context)
    }
}

/// A cast ballot: `C = [m]g + r·h` plus proof that `m ∈ {0,1}` under the anchor's `r`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct Ballot<C: CurveGroup> {
    pub voter_id: VoterId,
    #[serde(with = "crate::crypto_serde::curve")]
    pub commitment_point: C,
    pub consistency_proof: ConsistencyProof<C>,
}

impl<C: CurveGroup> Ballot<C> {
    /// Verify against the registered anchor point of the same voter.
    pub fn verify(&self, params: &PedersenParams<C>, election_id: Uuid, anchor_point: &C) -> bool {
        let context = ProofContext::new(election_id, self.voter_id.clone());
        self.consistency_proof
            .verify(params, &self.commitment_point, anchor_point, &context)
    }
}

/// Folded ballots and anchors of one snapshot.
#[derive(
    Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
#[serde(bound = "")]
pub struct AggregatedResult<C: CurveGroup> {
    /// Σ C_i
    #[serde(with = "crate::crypto_serde::curve")]
    pub aggregate_commitment: C,
    /// Σ H_i over the voters whose ballots were aggregated
    #[serde(with = "crate::crypto_serde::curve")]
    pub aggregate_anchor: C,
    /// aggregate_commitment − aggregate_anchor = M·g
    #[serde(with = "crate::crypto_serde::curve")]
    pub result_point: C,
    pub ballot_count: u64,
}

impl<C: CurveGroup> AggregatedResult<C> {
    pub fn from_sums(params: &PedersenParams<C>, commitments: C, anchors: C, ballot_count: u64) -> Self {
        Self {
            aggregate_commitment: commitments,
            aggregate_anchor: anchors,
            result_point: params.cancel_randomness(&commitments, &anchors),
            ballot_count,
        }
    }

    /// Check a claimed yes-count against the aggregate. Recomputes the result
    /// point instead of trusting the stored one.
    pub fn verify_claim(&self, params: &PedersenParams<C>, claimed_yes: u64) -> bool {
        if claimed_yes > self.ballot_count {
            return false;
        }
        let recomputed =
            params.cancel_randomness(&self.aggregate_commitment, &self.aggregate_anchor);
        recomputed == self.result_point && recomputed == params.count_point(claimed_yes)
    }

    /// Sum several aggregates under the same generators. `None` if the input is empty.
    pub fn combine<'a, I>(params: &PedersenParams<C>, parts: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Self>,
        C: 'a,
    {
        let mut iter = parts.into_iter();
        let first = iter.next()?;
        let (commitments, anchors, count) = iter.fold(
            (
                first.aggregate_commitment,
                first.aggregate_anchor,
                first.ballot_count,
            ),
            |(c, h, n), part| {
                (
                    c + part.aggregate_commitment,
                    h + part.aggregate_anchor,
                    n + part.ballot_count,
                )
            },
        );
        Some(Self::from_sums(params, commitments, anchors, count))
    }
}

/// Outcome of a tally together with the aggregate it was recovered from.
#[derive(
    Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
#[serde(bound = "")]
pub struct ElectionResult<C: CurveGroup> {
    pub total_ballots: u64,
    pub yes_count: u64,
    pub no_count: u64,
    pub aggregate: AggregatedResult<C>,
}

impl<C: CurveGroup> ElectionResult<C> {
    pub fn new(yes_count: u64, aggregate: AggregatedResult<C>) -> Self {
        let total_ballots = aggregate.ballot_count;
        Self {
            total_ballots,
            yes_count,
            no_count: total_ballots - yes_count,
            aggregate,
        }
    }
}
