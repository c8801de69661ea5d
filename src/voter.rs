use std::fmt;

use ark_ec::CurveGroup;
use ark_ff::PrimeField;
use ark_std::rand::Rng;
use uuid::Uuid;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::consistency_proof::ConsistencyProof;
use crate::error::Result;
use crate::pedersen_commitment::PedersenParams;
use crate::records::{Anchor, Ballot};
use crate::schnorr::SchnorrProof;
use crate::transcript::ProofContext;
use crate::types::{Vote, VoterId};

const LOG_TARGET: &str = "blindvote::voter";

/// Blinding factor shared by a voter's anchor and ballot. Wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct VoterSecret<F: PrimeField> {
    randomness: F,
}

impl<F: PrimeField> VoterSecret<F> {
    pub fn new(randomness: F) -> Self {
        Self { randomness }
    }

    pub(crate) fn expose(&self) -> &F {
        &self.randomness
    }
}

impl<F: PrimeField> fmt::Debug for VoterSecret<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VoterSecret(<redacted>)")
    }
}

/// Voter-side key holder. Produces the anchor at registration and the ballot
/// at voting time from one blinding factor that never leaves this struct.
#[derive(Debug)]
pub struct Voter<C: CurveGroup> {
    id: VoterId,
    secret: VoterSecret<C::ScalarField>,
    anchor_point: C,
}

impl<C: CurveGroup> Voter<C> {
    pub fn new<R: Rng>(id: VoterId, params: &PedersenParams<C>, rng: &mut R) -> Self {
        let randomness = params.random_scalar(rng);
        Self::from_secret(id, params, VoterSecret::new(randomness))
    }

    pub fn from_secret(
        id: VoterId,
        params: &PedersenParams<C>,
        secret: VoterSecret<C::ScalarField>,
    ) -> Self {
        let anchor_point = params.create_anchor(secret.expose());
        Self {
            id,
            secret,
            anchor_point,
        }
    }

    pub fn id(&self) -> &VoterId {
        &self.id
    }

    pub fn anchor_point(&self) -> &C {
        &self.anchor_point
    }

    fn context(&self, election_id: Uuid) -> ProofContext {
        ProofContext::new(election_id, self.id.clone())
    }

    /// Registration record for `election_id`.
    pub fn anchor<R: Rng>(
        &self,
        params: &PedersenParams<C>,
        election_id: Uuid,
        rng: &mut R,
    ) -> Anchor<C> {
        let context = self.context(election_id);
        let proof_of_knowledge = SchnorrProof::prove(
            params,
            self.secret.expose(),
            &self.anchor_point,
            &context,
            rng,
        );
        tracing::debug!(target: LOG_TARGET, voter_id = %self.id, "Built anchor");
        Anchor {
            voter_id: self.id.clone(),
            anchor_point: self.anchor_point,
            proof_of_knowledge,
        }
    }

    /// Ballot for a raw vote value; anything but 0 or 1 is rejected.
    pub fn ballot<R: Rng>(
        &self,
        params: &PedersenParams<C>,
        election_id: Uuid,
        vote: i64,
        rng: &mut R,
    ) -> Result<Ballot<C>> {
        let vote = Vote::try_from(vote)?;
        Ok(self.ballot_for(params, election_id, vote, rng))
    }

    pub fn ballot_for<R: Rng>(
        &self,
        params: &PedersenParams<C>,
        election_id: Uuid,
        vote: Vote,
        rng: &mut R,
    ) -> Ballot<C> {
        let context = self.context(election_id);
        let commitment_point = params.commit_vote(vote, self.secret.expose());
        let consistency_proof = ConsistencyProof::prove_vote(
            params,
            vote,
            self.secret.expose(),
            &commitment_point,
            &self.anchor_point,
            &context,
            rng,
        );
        tracing::debug!(target: LOG_TARGET, voter_id = %self.id, "Built ballot");
        Ballot {
            voter_id: self.id.clone(),
            commitment_point,
            consistency_proof,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VotingError;
    use ark_secp256k1::{Fr, Projective};
    use ark_std::{test_rng, Zero};

    #[test]
    fn anchor_and_ballot_share_randomness() {
        let params = PedersenParams::<Projective>::setup();
        let mut rng = test_rng();
        let election_id = Uuid::from_u128(3);
        let voter = Voter::new(VoterId::from("alice"), &params, &mut rng);

        let anchor = voter.anchor(&params, election_id, &mut rng);
        assert!(anchor.verify(&params, election_id));

        let ballot = voter.ballot(&params, election_id, 1, &mut rng).unwrap();
        assert!(ballot.verify(&params, election_id, &anchor.anchor_point));
        assert_eq!(
            params.cancel_randomness(&ballot.commitment_point, &anchor.anchor_point),
            params.g
        );
    }

    #[test]
    fn ballot_rejects_non_binary_vote() {
        let params = PedersenParams::<Projective>::setup();
        let mut rng = test_rng();
        let voter = Voter::new(VoterId::from("alice"), &params, &mut rng);
        assert_eq!(
            voter
                .ballot(&params, Uuid::nil(), -1, &mut rng)
                .unwrap_err(),
            VotingError::InvalidVoteValue(-1)
        );
    }

    #[test]
    fn records_do_not_verify_in_another_election() {
        let params = PedersenParams::<Projective>::setup();
        let mut rng = test_rng();
        let voter = Voter::new(VoterId::from("alice"), &params, &mut rng);

        let anchor = voter.anchor(&params, Uuid::from_u128(1), &mut rng);
        let ballot = voter
            .ballot_for(&params, Uuid::from_u128(1), Vote::No, &mut rng);
        assert!(!anchor.verify(&params, Uuid::from_u128(2)));
        assert!(!ballot.verify(&params, Uuid::from_u128(2), voter.anchor_point()));
    }

    #[test]
    fn secret_is_wiped_by_zeroize() {
        fn assert_zeroize_on_drop<T: ZeroizeOnDrop>() {}
        assert_zeroize_on_drop::<VoterSecret<Fr>>();

        let mut secret = VoterSecret::new(Fr::from(424242u64));
        secret.zeroize();
        assert!(secret.expose().is_zero());
    }

    #[test]
    fn secret_is_redacted_in_debug_output() {
        let secret = VoterSecret::new(Fr::from(424242u64));
        assert_eq!(format!("{secret:?}"), "VoterSecret(<redacted>)");
        let params = PedersenParams::<Projective>::setup();
        let voter = Voter::from_secret(VoterId::from("bob"), &params, secret);
        assert!(format!("{voter:?}").contains("VoterSecret(<redacted>)"));
    }
}
