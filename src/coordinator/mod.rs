//! Single-election coordinator driving registration, voting, aggregation and tally.

use ark_ec::CurveGroup;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ElectionConfig;
use crate::context::{ElectionContext, PointKind};
use crate::error::{Result, VotingError};
use crate::pedersen_commitment::PedersenParams;
use crate::records::{AggregatedResult, Anchor, Ballot, ElectionResult};
use crate::tally::BabyStepTable;
use crate::types::{Vote, VoterId, VoterStatus};
use crate::voter::Voter;


const LOG_TARGET: &str = "blindvote::coordinator";

/// Per-voter state. `voter` is `None` when the voter holds their own secret
/// and submitted records directly.
struct VoterRecord<C: CurveGroup> {
    voter: Option<Voter<C>>,
    anchor: Anchor<C>,
    ballot: Option<Ballot<C>>,
}

/// Runs one election. All operations take `&self`; share it behind an `Arc`.
///
/// Each voter's check-then-write is atomic under its map shard. Mutations hold
/// the gate shared and aggregation holds it exclusively, so a tally always
/// sees a consistent set of ballots.
pub struct ElectionCoordinator<C: CurveGroup = ark_secp256k1::Projective> {
    config: ElectionConfig,
    params: PedersenParams<C>,
    context: ElectionContext,
    voters: DashMap<VoterId, VoterRecord<C>>,
    gate: RwLock<()>,
    rng: Mutex<StdRng>,
}

impl<C: CurveGroup> ElectionCoordinator<C> {
    pub fn new(config: ElectionConfig) -> Result<Self> {
        Self::with_params(config, PedersenParams::setup())
    }

    /// Build a coordinator over pre-derived generators.
    pub fn with_params(config: ElectionConfig, params: PedersenParams<C>) -> Result<Self> {
        config
            .validate()
            .map_err(|err| VotingError::Malformed(format!("{err:#}")))?;

        let rng = match config.rng_seed {
            Some(seed) => StdRng::from_seed(seed),
            None => StdRng::from_entropy(),
        };
        let context = ElectionContext::new(config.election_id, config.min_ballots_for_tally);

        info!(
            target: LOG_TARGET,
            election_id = %config.election_id,
            name = %config.name,
            min_ballots = config.min_ballots_for_tally,
            "Election opened"
        );

        Ok(Self {
            config,
            params,
            context,
            voters: DashMap::new(),
            gate: RwLock::new(()),
            rng: Mutex::new(rng),
        })
    }

    pub fn config(&self) -> &ElectionConfig {
        &self.config
    }

    pub fn params(&self) -> &PedersenParams<C> {
        &self.params
    }

    pub fn election_id(&self) -> Uuid {
        self.config.election_id
    }

    /// Child RNG so the shared lock is held only while seeding.
    fn fork_rng(&self) -> StdRng {
        let mut seed = [0u8; 32];
        self.rng.lock().fill_bytes(&mut seed);
        StdRng::from_seed(seed)
    }

    // ---------------------------------------------------------------------
    // Registration
    // ---------------------------------------------------------------------

    /// Register `voter_id`, generating their secret and publishing the anchor.
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(voter_id = %voter_id))]
    pub fn register_voter(&self, voter_id: &VoterId) -> Result<Anchor<C>> {
        let _gate = self.gate.read();
        match self.voters.entry(voter_id.clone()) {
            Entry::Occupied(_) => {
                warn!(target: LOG_TARGET, "Duplicate registration rejected");
                Err(VotingError::AlreadyRegistered(voter_id.clone()))
            }
            Entry::Vacant(slot) => {
                let mut rng = self.fork_rng();
                let voter = Voter::new(voter_id.clone(), &self.params, &mut rng);
                let anchor = voter.anchor(&self.params, self.election_id(), &mut rng);
                self.context
                    .replay_guard()
                    .check_and_insert(PointKind::Anchor, &anchor.anchor_point)?;

                slot.insert(VoterRecord {
                    voter: Some(voter),
                    anchor: anchor.clone(),
                    ballot: None,
                });
                info!(target: LOG_TARGET, "Voter registered");
                Ok(anchor)
            }
        }
    }

    /// Accept an anchor built by a voter who keeps their own secret.
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(voter_id = %anchor.voter_id))]
    pub fn submit_anchor(&self, anchor: Anchor<C>) -> Result<()> {
        if !self.verify_registration(&anchor) {
            warn!(target: LOG_TARGET, "Anchor proof rejected");
            return Err(VotingError::InvalidRegistrationProof(anchor.voter_id));
        }

        let _gate = self.gate.read();
        match self.voters.entry(anchor.voter_id.clone()) {
            Entry::Occupied(_) => {
                warn!(target: LOG_TARGET, "Duplicate registration rejected");
                Err(VotingError::AlreadyRegistered(anchor.voter_id))
            }
            Entry::Vacant(slot) => {
                self.context
                    .replay_guard()
                    .check_and_insert(PointKind::Anchor, &anchor.anchor_point)?;
                slot.insert(VoterRecord {
                    voter: None,
                    anchor,
                    ballot: None,
                });
                info!(target: LOG_TARGET, "Voter registered from submitted anchor");
                Ok(())
            }
        }
    }

    pub fn verify_registration(&self, anchor: &Anchor<C>) -> bool {
        anchor.verify(&self.params, self.election_id())
    }

    // ---------------------------------------------------------------------
    // Voting
    // ---------------------------------------------------------------------

    /// Cast a ballot for a registered voter. Nothing is stored on failure.
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(voter_id = %voter_id))]
    pub fn cast_ballot(&self, voter_id: &VoterId, vote: i64) -> Result<Ballot<C>> {
        let vote = Vote::try_from(vote).inspect_err(|_| {
            warn!(target: LOG_TARGET, "Non-binary vote rejected");
        })?;

        let _gate = self.gate.read();
        let mut record = self
            .voters
            .get_mut(voter_id)
            .ok_or_else(|| VotingError::NotRegistered(voter_id.clone()))?;
        if record.ballot.is_some() {
            warn!(target: LOG_TARGET, "Second ballot rejected");
            return Err(VotingError::AlreadyVoted(voter_id.clone()));
        }

        let ballot = {
            let voter = record.voter.as_ref().ok_or_else(|| {
                VotingError::Malformed(format!(
                    "voter {voter_id} holds their own secret and must submit a ballot"
                ))
            })?;
            let mut rng = self.fork_rng();
            voter.ballot_for(&self.params, self.election_id(), vote, &mut rng)
        };
        self.context
            .replay_guard()
            .check_and_insert(PointKind::Commitment, &ballot.commitment_point)?;

        record.ballot = Some(ballot.clone());
        info!(target: LOG_TARGET, "Ballot cast");
        Ok(ballot)
    }

    /// Accept a ballot built by a voter who keeps their own secret.
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(voter_id = %ballot.voter_id))]
    pub fn submit_ballot(&self, ballot: Ballot<C>) -> Result<()> {
        let _gate = self.gate.read();
        let mut record = self
            .voters
            .get_mut(&ballot.voter_id)
            .ok_or_else(|| VotingError::NotRegistered(ballot.voter_id.clone()))?;
        if record.ballot.is_some() {
            warn!(target: LOG_TARGET, "Second ballot rejected");
            return Err(VotingError::AlreadyVoted(ballot.voter_id));
        }
        if !ballot.verify(&self.params, self.election_id(), &record.anchor.anchor_point) {
            warn!(target: LOG_TARGET, "Ballot proof rejected");
            return Err(VotingError::InvalidBallotProof(ballot.voter_id));
        }
        self.context
            .replay_guard()
            .check_and_insert(PointKind::Commitment, &ballot.commitment_point)?;

        record.ballot = Some(ballot);
        info!(target: LOG_TARGET, "Ballot accepted from submission");
        Ok(())
    }

    /// Check a ballot against the anchor registered for its voter.
    pub fn verify_ballot(&self, ballot: &Ballot<C>) -> bool {
        let anchor_point = match self.voters.get(&ballot.voter_id) {
            Some(record) => record.anchor.anchor_point,
            None => {
                tracing::debug!(target: LOG_TARGET, voter_id = %ballot.voter_id, "Ballot from unknown voter");
                return false;
            }
        };
        ballot.verify(&self.params, self.election_id(), &anchor_point)
    }

    // ---------------------------------------------------------------------
    // Aggregation and tally
    // ---------------------------------------------------------------------

    /// Fold every cast ballot and the anchors of the same voters.
    #[tracing::instrument(target = LOG_TARGET, skip_all)]
    pub fn aggregate(&self) -> Result<AggregatedResult<C>> {
        let _gate = self.gate.write();
        self.aggregate_snapshot()
    }

    /// Requires the gate to be held exclusively.
    fn aggregate_snapshot(&self) -> Result<AggregatedResult<C>> {
        let mut commitments = C::zero();
        let mut anchors = C::zero();
        let mut count = 0u64;
        for entry in self.voters.iter() {
            if let Some(ballot) = &entry.ballot {
                commitments = self.params.add_commitments(&commitments, &ballot.commitment_point);
                anchors = self.params.add_anchors(&anchors, &entry.anchor.anchor_point);
                count += 1;
            }
        }

        if count == 0 {
            warn!(target: LOG_TARGET, "Aggregation requested with no ballots");
            return Err(VotingError::NoBallots);
        }

        info!(target: LOG_TARGET, ballot_count = count, "Ballots aggregated");
        Ok(AggregatedResult::from_sums(&self.params, commitments, anchors, count))
    }

    /// Aggregate and recover the yes-count.
    #[tracing::instrument(target = LOG_TARGET, skip_all)]
    pub fn tally(&self) -> Result<ElectionResult<C>> {
        let _gate = self.gate.write();
        let aggregate = self.aggregate_snapshot()?;
        self.context
            .ensure_privacy_threshold(aggregate.ballot_count as usize)?;

        let table = BabyStepTable::new(self.params.g, aggregate.ballot_count);
        let yes_count = table.solve(&aggregate.result_point)?;

        let result = ElectionResult::new(yes_count, aggregate);
        info!(
            target: LOG_TARGET,
            total = result.total_ballots,
            yes = result.yes_count,
            no = result.no_count,
            "Tally complete"
        );
        Ok(result)
    }

    /// Anyone holding the aggregate can check a claimed yes-count.
    pub fn verify_tally(&self, aggregate: &AggregatedResult<C>, claimed_yes: u64) -> bool {
        aggregate.verify_claim(&self.params, claimed_yes)
    }

    /// Check a published result: internal counts plus the aggregate claim.
    pub fn verify_result(&self, result: &ElectionResult<C>) -> bool {
        result.total_ballots == result.aggregate.ballot_count
            && result.yes_count + result.no_count == result.total_ballots
            && self.verify_tally(&result.aggregate, result.yes_count)
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn status(&self, voter_id: &VoterId) -> VoterStatus {
        match self.voters.get(voter_id) {
            None => VoterStatus::Unregistered,
            Some(record) if record.ballot.is_some() => VoterStatus::Voted,
            Some(_) => VoterStatus::Registered,
        }
    }

    pub fn is_registered(&self, voter_id: &VoterId) -> bool {
        self.voters.contains_key(voter_id)
    }

    pub fn has_voted(&self, voter_id: &VoterId) -> bool {
        self.status(voter_id) == VoterStatus::Voted
    }

    pub fn registered_count(&self) -> usize {
        self.voters.len()
    }

    pub fn ballot_count(&self) -> usize {
        self.voters
            .iter()
            .filter(|entry| entry.ballot.is_some())
            .count()
    }

    /// All published anchors, ordered by voter id.
    pub fn anchors(&self) -> Vec<Anchor<C>> {
        let mut anchors: Vec<_> = self
            .voters
            .iter()
            .map(|entry| entry.anchor.clone())
            .collect();
        anchors.sort_by(|a, b| a.voter_id.cmp(&b.voter_id));
        anchors
    }

    /// All cast ballots, ordered by voter id.
    pub fn ballots(&self) -> Vec<Ballot<C>> {
        let mut ballots: Vec<_> = self
            .voters
            .iter()
            .filter_map(|entry| entry.ballot.clone())
            .collect();
        ballots.sort_by(|a, b| a.voter_id.cmp(&b.voter_id));
        ballots
    }
}
