use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ENV_ELECTION_ID: &str = "BLINDVOTE_ELECTION_ID";
pub const ENV_ELECTION_NAME: &str = "BLINDVOTE_ELECTION_NAME";
pub const ENV_MIN_BALLOTS: &str = "BLINDVOTE_MIN_BALLOTS";
pub const ENV_RNG_SEED: &str = "BLINDVOTE_RNG_SEED";

const DEFAULT_ELECTION_NAME: &str = "election";

/// Per-election settings. Each coordinator owns exactly one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionConfig {
    /// Bound into every proof transcript, so proofs never replay across elections.
    pub election_id: Uuid,
    pub name: String,
    /// Minimum number of ballots before a tally may be revealed.
    pub min_ballots_for_tally: usize,
    /// Deterministic RNG seed. `None` draws from OS entropy.
    pub rng_seed: Option<[u8; 32]>,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            election_id: Uuid::new_v4(),
            name: DEFAULT_ELECTION_NAME.to_string(),
            min_ballots_for_tally: 1,
            rng_seed: None,
        }
    }
}

impl ElectionConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_election_id(mut self, election_id: Uuid) -> Self {
        self.election_id = election_id;
        self
    }

    pub fn with_min_ballots_for_tally(mut self, min_ballots: usize) -> Self {
        self.min_ballots_for_tally = min_ballots;
        self
    }

    pub fn with_rng_seed(mut self, seed: [u8; 32]) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_ballots_for_tally == 0 {
            return Err(anyhow!(
                "ElectionConfig requires min_ballots_for_tally of at least 1"
            ));
        }
        if self.name.trim().is_empty() {
            return Err(anyhow!("ElectionConfig requires a non-empty name"));
        }
        Ok(())
    }

    /// Build a config from `BLINDVOTE_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(ENV_ELECTION_ID) {
            config.election_id = Uuid::parse_str(raw.trim())
                .with_context(|| format!("{ENV_ELECTION_ID} is not a valid UUID"))?;
        }
        if let Ok(raw) = std::env::var(ENV_ELECTION_NAME) {
            config.name = raw;
        }
        if let Ok(raw) = std::env::var(ENV_MIN_BALLOTS) {
            config.min_ballots_for_tally = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_MIN_BALLOTS} must be a positive integer"))?;
        }
        if let Ok(raw) = std::env::var(ENV_RNG_SEED) {
            let seed: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_RNG_SEED} must be an unsigned integer"))?;
            config.rng_seed = Some(seed_to_array(seed));
        }

        config.validate()?;
        Ok(config)
    }
}

/// Expand a `u64` seed into the 32-byte seed `StdRng` expects.
pub fn seed_to_array(seed: u64) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&seed.to_le_bytes());
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ElectionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.min_ballots_for_tally, 1);
        assert!(config.rng_seed.is_none());
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let config = ElectionConfig::new("board").with_min_ballots_for_tally(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn distinct_configs_get_distinct_election_ids() {
        assert_ne!(
            ElectionConfig::default().election_id,
            ElectionConfig::default().election_id
        );
    }

    #[test]
    fn seed_expansion_is_little_endian_prefix() {
        let seed = seed_to_array(0x0102);
        assert_eq!(seed[0], 0x02);
        assert_eq!(seed[1], 0x01);
        assert!(seed[2..].iter().all(|b| *b == 0));
    }
}
