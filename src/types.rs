use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::VotingError;

/// Opaque, immutable identity handle of a voter.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterId(String);

impl VoterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VoterId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for VoterId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A binary vote value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vote {
    No,
    Yes,
}

impl Vote {
    pub fn as_u64(self) -> u64 {
        match self {
            Vote::No => 0,
            Vote::Yes => 1,
        }
    }
}

impl TryFrom<i64> for Vote {
    type Error = VotingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Vote::No),
            1 => Ok(Vote::Yes),
            other => Err(VotingError::InvalidVoteValue(other)),
        }
    }
}

impl From<bool> for Vote {
    fn from(value: bool) -> Self {
        if value {
            Vote::Yes
        } else {
            Vote::No
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u64())
    }
}

/// Lifecycle of a voter within one election.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoterStatus {
    Unregistered,
    Registered,
    Voted,
}
