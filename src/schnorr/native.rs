use ark_ec::CurveGroup;
use ark_ff::UniformRand;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::Rng;
use ark_std::Zero;
use serde::{Deserialize, Serialize};

use crate::pedersen_commitment::PedersenParams;
use crate::transcript::{ProofContext, TranscriptBuilder};

const LOG_TARGET: &str = "blindvote::schnorr";

const DOMAIN_KIND: &str = "schnorr/anchor_v1";

/// Proof of knowledge of `r` such that `H = r·h`.
#[derive(
    Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize, Serialize, Deserialize,
)]
#[serde(bound = "")]
pub struct SchnorrProof<C: CurveGroup> {
    /// R = k·h
    #[serde(with = "crate::crypto_serde::curve")]
    pub commitment: C,
    /// e = Hash(context, h, H, R)
    #[serde(with = "crate::crypto_serde::scalar")]
    pub challenge: C::ScalarField,
    /// s = k + e·r
    #[serde(with = "crate::crypto_serde::scalar")]
    pub response: C::ScalarField,
}

impl<C: CurveGroup> SchnorrProof<C> {
    /// Prove knowledge of the blinding factor behind `anchor`, bound to `context`.
    pub fn prove<R: Rng>(
        params: &PedersenParams<C>,
        secret: &C::ScalarField,
        anchor: &C,
        context: &ProofContext,
        rng: &mut R,
    ) -> Self {
        let nonce = C::ScalarField::rand(rng);
        let commitment = params.h * nonce;

        let challenge = Self::compute_challenge(params, anchor, &commitment, context);
        tracing::debug!(target: LOG_TARGET, voter_id = %context.voter_id, "Generated anchor proof challenge");

        let response = nonce + challenge * secret;

        Self {
            commitment,
            challenge,
            response,
        }
    }

    /// Verify the proof against `anchor` under `context`.
    ///
    /// The stored challenge must match the one recomputed from the transcript,
    /// so a proof never validates for another voter or election.
    pub fn verify(&self, params: &PedersenParams<C>, anchor: &C, context: &ProofContext) -> bool {
        if anchor.is_zero() {
            tracing::debug!(target: LOG_TARGET, voter_id = %context.voter_id, "Rejecting identity anchor");
            return false;
        }

        let expected = Self::compute_challenge(params, anchor, &self.commitment, context);
        if expected != self.challenge {
            tracing::debug!(target: LOG_TARGET, voter_id = %context.voter_id, "Challenge mismatch");
            return false;
        }

        // s·h == R + e·H
        let lhs = params.h * self.response;
        let rhs = self.commitment + *anchor * self.challenge;
        let result = lhs == rhs;
        tracing::debug!(target: LOG_TARGET, voter_id = %context.voter_id, result, "Anchor proof verification");
        result
    }

    fn compute_challenge(
        params: &PedersenParams<C>,
        anchor: &C,
        commitment: &C,
        context: &ProofContext,
    ) -> C::ScalarField {
        let mut builder = TranscriptBuilder::new(DOMAIN_KIND);
        builder.append(context);
        builder.append_label(b"h");
        builder.append_curve_point(&params.h);
        builder.append_label(b"anchor");
        builder.append_curve_point(anchor);
        builder.append_label(b"R");
        builder.append_curve_point(commitment);
        builder.challenge()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::serde::assert_round_trip_eq;
    use crate::types::VoterId;
    use ark_secp256k1::{Fr, Projective};
    use ark_std::test_rng;
    use uuid::Uuid;

    type Proof = SchnorrProof<Projective>;

    struct Fixture {
        params: PedersenParams<Projective>,
        secret: Fr,
        anchor: Projective,
        context: ProofContext,
    }

    fn fixture(voter: &str) -> Fixture {
        let params = PedersenParams::setup();
        let mut rng = test_rng();
        let secret = Fr::rand(&mut rng);
        let anchor = params.create_anchor(&secret);
        Fixture {
            params,
            secret,
            anchor,
            context: ProofContext::new(Uuid::from_u128(7), VoterId::from(voter)),
        }
    }

    #[test]
    fn honest_proof_verifies() {
        let _guard = crate::test_utils::setup_test_tracing();
        let f = fixture("alice");
        let mut rng = test_rng();
        let proof = Proof::prove(&f.params, &f.secret, &f.anchor, &f.context, &mut rng);
        assert!(proof.verify(&f.params, &f.anchor, &f.context));
    }

    #[test]
    fn proof_is_bound_to_voter_and_election() {
        let f = fixture("alice");
        let mut rng = test_rng();
        let proof = Proof::prove(&f.params, &f.secret, &f.anchor, &f.context, &mut rng);

        let other_voter = ProofContext::new(f.context.election_id, VoterId::from("bob"));
        assert!(!proof.verify(&f.params, &f.anchor, &other_voter));

        let other_election = ProofContext::new(Uuid::from_u128(8), f.context.voter_id.clone());
        assert!(!proof.verify(&f.params, &f.anchor, &other_election));
    }

    #[test]
    fn proof_does_not_transfer_to_another_anchor() {
        let f = fixture("alice");
        let mut rng = test_rng();
        let proof = Proof::prove(&f.params, &f.secret, &f.anchor, &f.context, &mut rng);
        let other_anchor = f.params.create_anchor(&Fr::rand(&mut rng));
        assert!(!proof.verify(&f.params, &other_anchor, &f.context));
    }

    #[test]
    fn wrong_secret_fails() {
        let f = fixture("alice");
        let mut rng = test_rng();
        let proof = Proof::prove(
            &f.params,
            &(f.secret + Fr::from(1u64)),
            &f.anchor,
            &f.context,
            &mut rng,
        );
        assert!(!proof.verify(&f.params, &f.anchor, &f.context));
    }

    #[test]
    fn tampered_fields_fail() {
        let f = fixture("alice");
        let mut rng = test_rng();
        let proof = Proof::prove(&f.params, &f.secret, &f.anchor, &f.context, &mut rng);

        let mut bad = proof.clone();
        bad.response += Fr::from(1u64);
        assert!(!bad.verify(&f.params, &f.anchor, &f.context));

        let mut bad = proof.clone();
        bad.challenge += Fr::from(1u64);
        assert!(!bad.verify(&f.params, &f.anchor, &f.context));

        let mut bad = proof;
        bad.commitment += f.params.h;
        assert!(!bad.verify(&f.params, &f.anchor, &f.context));
    }

    #[test]
    fn identity_anchor_is_rejected() {
        let f = fixture("alice");
        let mut rng = test_rng();
        let zero = Projective::zero();
        let proof = Proof::prove(&f.params, &Fr::from(0u64), &zero, &f.context, &mut rng);
        assert!(!proof.verify(&f.params, &zero, &f.context));
    }

    #[test]
    fn serde_round_trip_preserves_validity() {
        let f = fixture("alice");
        let mut rng = test_rng();
        let proof = Proof::prove(&f.params, &f.secret, &f.anchor, &f.context, &mut rng);
        assert_round_trip_eq(&proof);

        let json = serde_json::to_string(&proof).unwrap();
        let restored: Proof = serde_json::from_str(&json).unwrap();
        assert!(restored.verify(&f.params, &f.anchor, &f.context));
    }
}
