//! Batching as independent elections over disjoint voter partitions.
//!
//! Voters are assigned by hashing their id, so the assignment is stable and
//! needs no coordination. Every partition is a full [`ElectionCoordinator`]
//! with its own election id, replay guard and threshold.

use ark_ec::CurveGroup;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::config::ElectionConfig;
use crate::coordinator::ElectionCoordinator;
use crate::error::{Result, VotingError};
use crate::pedersen_commitment::PedersenParams;
use crate::records::{AggregatedResult, Anchor, Ballot, ElectionResult};
use crate::tally::BabyStepTable;
use crate::types::VoterId;

const LOG_TARGET: &str = "blindvote::partition";

const PARTITION_DOMAIN: &[u8] = b"blindvote/partition/v1";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PartitionResult<C: CurveGroup> {
    pub index: usize,
    pub election_id: Uuid,
    pub result: ElectionResult<C>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct PartitionedResult<C: CurveGroup> {
    /// Partitions that received at least one ballot, by index.
    pub partitions: Vec<PartitionResult<C>>,
    pub combined: ElectionResult<C>,
}

pub struct PartitionedElection<C: CurveGroup = ark_secp256k1::Projective> {
    params: PedersenParams<C>,
    partitions: Vec<ElectionCoordinator<C>>,
}

impl<C: CurveGroup> PartitionedElection<C> {
    /// Split `config` into `partition_count` elections sharing one set of generators.
    pub fn new(config: ElectionConfig, partition_count: usize) -> Result<Self> {
        if partition_count == 0 {
            return Err(VotingError::Malformed(
                "partitioned election needs at least one partition".to_string(),
            ));
        }

        let params = PedersenParams::setup();
        let partitions = (0..partition_count)
            .map(|index| {
                let mut child = config
                    .clone()
                    .with_election_id(child_election_id(config.election_id, index));
                child.name = format!("{}#{index}", config.name);
                if let Some(seed) = config.rng_seed {
                    child.rng_seed = Some(child_seed(&seed, index));
                }
                ElectionCoordinator::with_params(child, params.clone())
            })
            .collect::<Result<Vec<_>>>()?;

        info!(target: LOG_TARGET, election_id = %config.election_id, partition_count, "Partitioned election opened");
        Ok(Self { params, partitions })
    }

    pub fn params(&self) -> &PedersenParams<C> {
        &self.params
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn partitions(&self) -> &[ElectionCoordinator<C>] {
        &self.partitions
    }

    /// Stable partition index for `voter_id`.
    pub fn partition_for(&self, voter_id: &VoterId) -> usize {
        let digest = Sha256::new()
            .chain_update(PARTITION_DOMAIN)
            .chain_update(voter_id.as_str().as_bytes())
            .finalize();
        let mut prefix = [0u8; 8];
        prefix.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(prefix) % self.partitions.len() as u64) as usize
    }

    /// The coordinator responsible for `voter_id`.
    pub fn coordinator_for(&self, voter_id: &VoterId) -> &ElectionCoordinator<C> {
        &self.partitions[self.partition_for(voter_id)]
    }

    pub fn register_voter(&self, voter_id: &VoterId) -> Result<Anchor<C>> {
        self.coordinator_for(voter_id).register_voter(voter_id)
    }

    pub fn cast_ballot(&self, voter_id: &VoterId, vote: i64) -> Result<Ballot<C>> {
        self.coordinator_for(voter_id).cast_ballot(voter_id, vote)
    }

    pub fn submit_anchor(&self, anchor: Anchor<C>) -> Result<()> {
        self.coordinator_for(&anchor.voter_id).submit_anchor(anchor)
    }

    pub fn submit_ballot(&self, ballot: Ballot<C>) -> Result<()> {
        self.coordinator_for(&ballot.voter_id).submit_ballot(ballot)
    }

    pub fn ballot_count(&self) -> usize {
        self.partitions.iter().map(|p| p.ballot_count()).sum()
    }

    /// Tally every non-empty partition and the combined total.
    ///
    /// Fails as a whole if any non-empty partition fails, including when it is
    /// below the privacy threshold.
    #[tracing::instrument(target = LOG_TARGET, skip_all, fields(partitions = self.partitions.len()))]
    pub fn tally(&self) -> Result<PartitionedResult<C>> {
        let mut partitions = Vec::new();
        for (index, coordinator) in self.partitions.iter().enumerate() {
            match coordinator.tally() {
                Ok(result) => partitions.push(PartitionResult {
                    index,
                    election_id: coordinator.election_id(),
                    result,
                }),
                Err(VotingError::NoBallots) => continue,
                Err(err) => return Err(err),
            }
        }

        let combined_aggregate =
            AggregatedResult::combine(&self.params, partitions.iter().map(|p| &p.result.aggregate))
                .ok_or(VotingError::NoBallots)?;
        let yes_count = BabyStepTable::new(self.params.g, combined_aggregate.ballot_count)
            .solve(&combined_aggregate.result_point)?;
        let combined = ElectionResult::new(yes_count, combined_aggregate);

        info!(
            target: LOG_TARGET,
            tallied_partitions = partitions.len(),
            total = combined.total_ballots,
            yes = combined.yes_count,
            "Partitioned tally complete"
        );
        Ok(PartitionedResult {
            partitions,
            combined,
        })
    }

    /// Check the combined total and that it is the sum of the partition aggregates.
    pub fn verify_result(&self, result: &PartitionedResult<C>) -> bool {
        let recombined = AggregatedResult::combine(
            &self.params,
            result.partitions.iter().map(|p| &p.result.aggregate),
        );
        let yes_sum: u64 = result.partitions.iter().map(|p| p.result.yes_count).sum();

        recombined.as_ref() == Some(&result.combined.aggregate)
            && yes_sum == result.combined.yes_count
            && result.partitions.iter().all(|p| {
                p.result
                    .aggregate
                    .verify_claim(&self.params, p.result.yes_count)
            })
            && result
                .combined
                .aggregate
                .verify_claim(&self.params, result.combined.yes_count)
    }
}

fn child_election_id(parent: Uuid, index: usize) -> Uuid {
    let digest = Sha256::new()
        .chain_update(PARTITION_DOMAIN)
        .chain_update(parent.as_bytes())
        .chain_update((index as u64).to_be_bytes())
        .finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    uuid::Builder::from_random_bytes(bytes).into_uuid()
}

fn child_seed(seed: &[u8; 32], index: usize) -> [u8; 32] {
    Sha256::new()
        .chain_update(PARTITION_DOMAIN)
        .chain_update(seed)
        .chain_update((index as u64).to_be_bytes())
        .finalize()
        .into()
}
