//! Disjunctive Chaum-Pedersen proof that a ballot commitment opens to a binary
//! vote under the same blinding factor as the voter's anchor.
//!
//! For `b ∈ {0, 1}` branch `b` states: there is an `r` with `C − [b]g = r·h`
//! and `H = r·h`. The prover runs the real branch honestly and simulates the
//! other one; the verifier only learns that one of the two statements holds.

use ark_ec::CurveGroup;
use ark_ff::UniformRand;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error;
use crate::pedersen_commitment::PedersenParams;
use crate::transcript::{ProofContext, TranscriptBuilder};
use crate::types::Vote;

const LOG_TARGET: &str = "blindvote::consistency_proof";

const DOMAIN_KIND: &str = "consistency/binary_v1";

/// One branch of the OR-proof.
#[derive(
    Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
#[serde(bound = "")]
pub struct ConsistencyBranch<C: CurveGroup> {
    /// Commitment against the ballot side: `k·h`
    #[serde(with = "crate::crypto_serde::curve")]
    pub t_c: C,
    /// Commitment against the anchor side: `k·h`
    #[serde(with = "crate::crypto_serde::curve")]
    pub t_h: C,
    #[serde(with = "crate::crypto_serde::scalar")]
    pub challenge: C::ScalarField,
    #[serde(with = "crate::crypto_serde::scalar")]
    pub response: C::ScalarField,
}

impl<C: CurveGroup> ConsistencyBranch<C> {
    /// Both Chaum-Pedersen equations for the statement `target = r·h ∧ anchor = r·h`.
    fn holds(&self, params: &PedersenParams<C>, target: &C, anchor: &C) -> bool {
        let lhs = params.h * self.response;
        let ballot_side = lhs == self.t_c + *target * self.challenge;
        let anchor_side = lhs == self.t_h + *anchor * self.challenge;
        ballot_side && anchor_side
    }

    /// Build a branch that verifies for an arbitrary challenge without knowing `r`.
    fn simulate<R: Rng>(params: &PedersenParams<C>, target: &C, anchor: &C, rng: &mut R) -> Self {
        let challenge = C::ScalarField::rand(rng);
        let response = C::ScalarField::rand(rng);
        let base = params.h * response;
        Self {
            t_c: base - *target * challenge,
            t_h: base - *anchor * challenge,
            challenge,
            response,
        }
    }
}

/// Proof that `(C, H)` share a blinding factor and that `C` commits to 0 or 1.
#[derive(
    Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
#[serde(bound = "")]
pub struct ConsistencyProof<C: CurveGroup> {
    /// Branch for `m = 0`
    pub zero: ConsistencyBranch<C>,
    /// Branch for `m = 1`
    pub one: ConsistencyBranch<C>,
}

impl<C: CurveGroup> ConsistencyProof<C> {
    /// Prove that `commitment = [vote]g + r·h` and `anchor = r·h`.
    ///
    /// Fails with `InvalidVoteValue` for anything outside `{0, 1}`; the real
    /// branch is never produced for such values.
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(voter_id = %context.voter_id))]
    pub fn prove<R: Rng>(
        params: &PedersenParams<C>,
        vote: i64,
        secret: &C::ScalarField,
        commitment: &C,
        anchor: &C,
        context: &ProofContext,
        rng: &mut R,
    ) -> error::Result<Self> {
        let vote = Vote::try_from(vote)?;
        Ok(Self::prove_vote(
            params, vote, secret, commitment, anchor, context, rng,
        ))
    }

    /// Typed variant of [`ConsistencyProof::prove`].
    pub fn prove_vote<R: Rng>(
        params: &PedersenParams<C>,
        vote: Vote,
        secret: &C::ScalarField,
        commitment: &C,
        anchor: &C,
        context: &ProofContext,
        rng: &mut R,
    ) -> Self {
        let simulated_vote = match vote {
            Vote::No => Vote::Yes,
            Vote::Yes => Vote::No,
        };
        let simulated_target = *commitment - params.vote_point(simulated_vote);
        let simulated = ConsistencyBranch::simulate(params, &simulated_target, anchor, rng);

        let nonce = C::ScalarField::rand(rng);
        let t = params.h * nonce;

        // Overall challenge is computed over both branches in fixed order.
        let (zero_t, one_t) = match vote {
            Vote::No => ((t, t), (simulated.t_c, simulated.t_h)),
            Vote::Yes => ((simulated.t_c, simulated.t_h), (t, t)),
        };
        let challenge = Self::compute_challenge(params, commitment, anchor, zero_t, one_t, context);
        tracing::debug!(target: LOG_TARGET, "Generated overall challenge");

        let real_challenge = challenge - simulated.challenge;
        let real = ConsistencyBranch {
            t_c: t,
            t_h: t,
            challenge: real_challenge,
            response: nonce + real_challenge * secret,
        };

        match vote {
            Vote::No => Self {
                zero: real,
                one: simulated,
            },
            Vote::Yes => Self {
                zero: simulated,
                one: real,
            },
        }
    }

    /// Verify against the supplied `(commitment, anchor)` under `context`.
    pub fn verify(
        &self,
        params: &PedersenParams<C>,
        commitment: &C,
        anchor: &C,
        context: &ProofContext,
    ) -> bool {
        tracing::debug!(target: LOG_TARGET, voter_id = %context.voter_id, "Starting consistency verification");

        let challenge = Self::compute_challenge(
            params,
            commitment,
            anchor,
            (self.zero.t_c, self.zero.t_h),
            (self.one.t_c, self.one.t_h),
            context,
        );
        if self.zero.challenge + self.one.challenge != challenge {
            tracing::debug!(target: LOG_TARGET, "Challenge shares do not sum to the transcript challenge");
            return false;
        }

        let zero_target = *commitment;
        let one_target = *commitment - params.g;

        let zero_ok = self.zero.holds(params, &zero_target, anchor);
        let one_ok = self.one.holds(params, &one_target, anchor);
        tracing::debug!(target: LOG_TARGET, zero_ok, one_ok, "Branch checks");

        zero_ok && one_ok
    }

    fn compute_challenge(
        params: &PedersenParams<C>,
        commitment: &C,
        anchor: &C,
        zero_t: (C, C),
        one_t: (C, C),
        context: &ProofContext,
    ) -> C::ScalarField {
        let mut builder = TranscriptBuilder::new(DOMAIN_KIND);
        builder.append(context);
        builder.append_label(b"g");
        builder.append_curve_point(&params.g);
        builder.append_label(b"h");
        builder.append_curve_point(&params.h);
        builder.append_label(b"C");
        builder.append_curve_point(commitment);
        builder.append_label(b"H");
        builder.append_curve_point(anchor);
        for (t_c, t_h) in [zero_t, one_t] {
            builder.append_label(b"branch");
            builder.append_curve_point(&t_c);
            builder.append_curve_point(&t_h);
        }
        builder.challenge()
    }
}
