use ark_ec::{AffineRepr, CurveGroup};
use ark_ff::UniformRand;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::Rng;
use ark_std::Zero;
use sha2::{Digest, Sha256};

use crate::error;
use crate::types::Vote;

const LOG_TARGET: &str = "blindvote::pedersen_commitment";

const SECOND_GENERATOR_DOMAIN: &[u8] = b"blindvote/pedersen/second_generator/v1";

/// Generators for binary Pedersen commitments `C = [m]g + r·h`.
///
/// `g` is the canonical base point of the group. `h` is derived from `g` by
/// hashing, so no party knows `log_g(h)`. Both are fixed for the lifetime of
/// an election: commitments made under different parameters do not aggregate.
#[derive(Clone, Debug, PartialEq, Eq, CanonicalSerialize, CanonicalDeserialize)]
pub struct PedersenParams<C: CurveGroup> {
    pub g: C,
    pub h: C,
}

impl<C: CurveGroup> PedersenParams<C> {
    /// Derive the election generators. Deterministic: every party obtains the same `(g, h)`.
    pub fn setup() -> Self {
        let g = C::generator();
        let h = derive_second_generator(&g);
        tracing::debug!(target: LOG_TARGET, "Derived Pedersen generators");
        Self { g, h }
    }

    /// Commit to a raw vote value. Only 0 and 1 are accepted.
    pub fn commit(&self, message: i64, randomness: &C::ScalarField) -> error::Result<C> {
        let vote = Vote::try_from(message)?;
        Ok(self.commit_vote(vote, randomness))
    }

    /// Commit to a typed vote: `[m]g + r·h`.
    pub fn commit_vote(&self, vote: Vote, randomness: &C::ScalarField) -> C {
        self.vote_point(vote) + self.create_anchor(randomness)
    }

    /// The anchor `H = r·h` binding a voter to their blinding factor.
    pub fn create_anchor(&self, randomness: &C::ScalarField) -> C {
        self.h * *randomness
    }

    /// `[m]g`: the identity for a no-vote, `g` for a yes-vote.
    pub fn vote_point(&self, vote: Vote) -> C {
        match vote {
            Vote::No => C::zero(),
            Vote::Yes => self.g,
        }
    }

    /// `M·g` for an arbitrary count.
    pub fn count_point(&self, count: u64) -> C {
        self.g * C::ScalarField::from(count)
    }

    pub fn add_commitments(&self, lhs: &C, rhs: &C) -> C {
        *lhs + *rhs
    }

    pub fn add_anchors(&self, lhs: &C, rhs: &C) -> C {
        *lhs + *rhs
    }

    /// Fold a collection of points starting from the identity. Order-independent.
    pub fn sum_points<'a, I>(&self, points: I) -> C
    where
        I: IntoIterator<Item = &'a C>,
        C: 'a,
    {
        points.into_iter().fold(C::zero(), |acc, point| acc + point)
    }

    /// `C_agg − H_S`, which equals `M·g` when every ballot reused its anchor's randomness.
    pub fn cancel_randomness(&self, aggregate_commitment: &C, aggregate_anchor: &C) -> C {
        *aggregate_commitment + (-*aggregate_anchor)
    }

    /// Check an opening `(m, r)` against a commitment. Non-binary messages never open.
    pub fn verify_opening(&self, commitment: &C, message: i64, randomness: &C::ScalarField) -> bool {
        match Vote::try_from(message) {
            Ok(vote) => self.commit_vote(vote, randomness) == *commitment,
            Err(_) => false,
        }
    }

    /// Sample a fresh blinding factor.
    pub fn random_scalar<R: Rng>(&self, rng: &mut R) -> C::ScalarField {
        C::ScalarField::rand(rng)
    }
}

/// Hash-and-increment derivation of a second generator from the encoding of `g`.
///
/// Each candidate digest is read as an affine x-coordinate; the first one on
/// the curve is cofactor-cleared and accepted unless it is the identity or `g`.
pub fn derive_second_generator<C: CurveGroup>(g: &C) -> C {
    let mut encoded = Vec::new();
    g.serialize_compressed(&mut encoded)
        .expect("curve serialization");

    let mut counter: u32 = 0;
    loop {
        let mut hasher = Sha256::new();
        hasher.update(SECOND_GENERATOR_DOMAIN);
        hasher.update((encoded.len() as u32).to_be_bytes());
        hasher.update(&encoded);
        hasher.update(counter.to_be_bytes());
        let digest = hasher.finalize();

        if let Some(candidate) = C::Affine::from_random_bytes(&digest) {
            let point = candidate.mul_by_cofactor_to_group();
            if !point.is_zero() && point != *g {
                tracing::debug!(target: LOG_TARGET, counter, "Second generator accepted");
                return point;
            }
        }
        counter = counter.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VotingError;
    use ark_ec::PrimeGroup;
    use ark_secp256k1::{Fr, Projective};
    use ark_std::test_rng;

    type Params = PedersenParams<Projective>;

    #[test]
    fn setup_is_deterministic_and_independent_of_g() {
        let a = Params::setup();
        let b = Params::setup();
        assert_eq!(a, b);
        assert_eq!(a.g, Projective::generator());
        assert!(!a.h.is_zero());
        assert_ne!(a.h, a.g);
        assert_ne!(a.h, -a.g);
    }

    #[test]
    fn commitment_is_a_pure_function() {
        let params = Params::setup();
        let r = Fr::from(123_456_789u64);
        assert_eq!(params.commit(1, &r).unwrap(), params.commit(1, &r).unwrap());
        assert_eq!(params.commit(0, &r).unwrap(), params.commit(0, &r).unwrap());
        assert_ne!(params.commit(0, &r).unwrap(), params.commit(1, &r).unwrap());
    }

    #[test]
    fn commit_rejects_non_binary_messages() {
        let params = Params::setup();
        let r = Fr::from(7u64);
        assert_eq!(
            params.commit(2, &r).unwrap_err(),
            VotingError::InvalidVoteValue(2)
        );
        assert_eq!(
            params.commit(-1, &r).unwrap_err(),
            VotingError::InvalidVoteValue(-1)
        );
    }

    #[test]
    fn zero_vote_commitment_equals_anchor() {
        let params = Params::setup();
        let mut rng = test_rng();
        let r = params.random_scalar(&mut rng);
        assert_eq!(params.commit_vote(Vote::No, &r), params.create_anchor(&r));
        assert_eq!(
            params.commit_vote(Vote::Yes, &r),
            params.create_anchor(&r) + params.g
        );
    }

    #[test]
    fn aggregation_cancels_randomness_homomorphically() {
        let params = Params::setup();
        let mut rng = test_rng();
        let votes = [1i64, 1, 0, 1, 0, 0, 1];

        let randomness: Vec<Fr> = votes.iter().map(|_| params.random_scalar(&mut rng)).collect();
        let commitments: Vec<Projective> = votes
            .iter()
            .zip(&randomness)
            .map(|(m, r)| params.commit(*m, r).unwrap())
            .collect();
        let anchors: Vec<Projective> = randomness.iter().map(|r| params.create_anchor(r)).collect();

        let c_agg = params.sum_points(&commitments);
        let h_s = params.sum_points(&anchors);
        let x = params.cancel_randomness(&c_agg, &h_s);

        assert_eq!(x, params.count_point(4));
    }

    #[test]
    fn pairwise_addition_matches_fold_in_any_order() {
        let params = Params::setup();
        let mut rng = test_rng();
        let points: Vec<Projective> = (0..5)
            .map(|i| params.commit(i % 2, &params.random_scalar(&mut rng)).unwrap())
            .collect();

        let forward = points
            .iter()
            .fold(Projective::zero(), |acc, p| params.add_commitments(&acc, p));
        let mut reversed = points.clone();
        reversed.reverse();
        assert_eq!(forward, params.sum_points(&reversed));
    }

    #[test]
    fn mismatched_randomness_does_not_cancel() {
        let params = Params::setup();
        let mut rng = test_rng();
        let r = params.random_scalar(&mut rng);
        let other = params.random_scalar(&mut rng);

        let c = params.commit(1, &r).unwrap();
        let x = params.cancel_randomness(&c, &params.create_anchor(&other));
        assert_ne!(x, params.count_point(1));
        assert_ne!(x, params.count_point(0));
    }

    #[test]
    fn opening_verification() {
        let params = Params::setup();
        let mut rng = test_rng();
        let r = params.random_scalar(&mut rng);
        let c = params.commit(1, &r).unwrap();

        assert!(params.verify_opening(&c, 1, &r));
        assert!(!params.verify_opening(&c, 0, &r));
        assert!(!params.verify_opening(&c, 2, &r));
        assert!(!params.verify_opening(&c, 1, &(r + Fr::from(1u64))));
    }

    #[test]
    fn params_canonical_encoding_round_trips() {
        let params = Params::setup();
        let mut bytes = Vec::new();
        params.serialize_compressed(&mut bytes).unwrap();
        let restored = Params::deserialize_compressed(&bytes[..]).unwrap();
        assert_eq!(restored, params);
    }

    #[test]
    fn generic_over_other_curves() {
        use ark_bn254::{Fr as BnFr, G1Projective};

        let params = PedersenParams::<G1Projective>::setup();
        assert_ne!(params.g, params.h);
        let r = BnFr::from(99u64);
        let x = params.cancel_randomness(&params.commit(1, &r).unwrap(), &params.create_anchor(&r));
        assert_eq!(x, params.g);
    }
}
