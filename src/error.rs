use thiserror::Error;

use crate::types::VoterId;

pub type Result<T> = std::result::Result<T, VotingError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VotingError {
    #[error("Voter {0} is already registered")]
    AlreadyRegistered(VoterId),

    #[error("Voter {0} is not registered")]
    NotRegistered(VoterId),

    #[error("Voter {0} has already voted")]
    AlreadyVoted(VoterId),

    #[error("Invalid vote value {0}: votes must be 0 or 1")]
    InvalidVoteValue(i64),

    #[error("No ballots have been cast")]
    NoBallots,

    #[error("Tally unrecoverable: no count in [0, {upper_bound}] matches the aggregate")]
    TallyUnrecoverable { upper_bound: u64 },

    #[error("Privacy threshold not met: {cast} ballots cast, {required} required")]
    PrivacyThresholdNotMet { cast: usize, required: usize },

    #[error("Registration proof for voter {0} failed to verify")]
    InvalidRegistrationProof(VoterId),

    #[error("Ballot proof for voter {0} failed to verify")]
    InvalidBallotProof(VoterId),

    #[error("Commitment has already been submitted in this election")]
    DuplicateCommitment,

    #[error("Malformed input: {0}")]
    Malformed(String),
}
