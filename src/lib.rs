pub mod config;
pub mod consistency_proof;
pub mod context;
pub mod coordinator;
pub mod crypto_serde;
pub mod error;
pub mod partition;
pub mod pedersen_commitment;
pub mod records;
pub mod schnorr;
pub mod serialization;
pub mod tally;
pub mod transcript;
pub mod types;
pub mod voter;

#[cfg(test)]
pub mod test_utils;

pub use config::ElectionConfig;
pub use coordinator::ElectionCoordinator;
pub use error::{Result, VotingError};
pub use partition::{PartitionedElection, PartitionedResult};
pub use pedersen_commitment::PedersenParams;
pub use records::{AggregatedResult, Anchor, Ballot, ElectionResult};
pub use types::{Vote, VoterId, VoterStatus};
pub use voter::Voter;
