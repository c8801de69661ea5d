use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use ark_secp256k1::Projective as Curve;
use clap::Parser;
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{info, warn};
use tracing_subscriber::{fmt::time::Uptime, EnvFilter};

use blindvote::config::{seed_to_array, ElectionConfig, ENV_ELECTION_NAME, ENV_MIN_BALLOTS, ENV_RNG_SEED};
use blindvote::coordinator::ElectionCoordinator;
use blindvote::partition::PartitionedElection;
use blindvote::types::VoterId;

const LOG_TARGET: &str = "bin::election_demo";
const DEFAULT_FILTER: &str = "election_demo=info,bin::election_demo=info,blindvote=info";

#[derive(Debug, Parser)]
#[command(name = "election_demo")]
#[command(about = "Run a private yes/no election end to end", long_about = None)]
struct Args {
    /// Number of voters to register
    #[arg(long, default_value_t = 16)]
    voters: usize,

    /// Comma-separated 0/1 votes, one per voter. Random when omitted.
    #[arg(long)]
    votes: Option<String>,

    /// Election display name
    #[arg(long, env = ENV_ELECTION_NAME, default_value = "demo")]
    name: String,

    /// Minimum ballots before a tally is revealed
    #[arg(long, env = ENV_MIN_BALLOTS, default_value_t = 1)]
    min_ballots: usize,

    /// Seed for reproducible voter secrets and votes
    #[arg(long, env = ENV_RNG_SEED)]
    rng_seed: Option<u64>,

    /// Split voters across this many independent partitions
    #[arg(long, default_value_t = 1)]
    partitions: usize,

    /// Print the final result as JSON on stdout
    #[arg(long)]
    print_result: bool,

    /// Toggle structured (JSON) tracing output
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let manifest_env_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".env");
    dotenv::from_filename(manifest_env_path).ok();
    dotenv::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.json)?;

    let votes = build_votes(&args)?;
    let mut config = ElectionConfig::new(args.name.clone())
        .with_min_ballots_for_tally(args.min_ballots);
    if let Some(seed) = args.rng_seed {
        config = config.with_rng_seed(seed_to_array(seed));
    }
    config.validate().context("invalid election configuration")?;

    if args.partitions > 1 {
        run_partitioned(config, args.partitions, votes, args.print_result).await
    } else {
        run_single(config, votes, args.print_result).await
    }
}

fn build_votes(args: &Args) -> Result<Vec<i64>> {
    if let Some(raw) = &args.votes {
        let votes = raw
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<i64>()
                    .with_context(|| format!("invalid vote {part:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        if votes.is_empty() {
            bail!("--votes must list at least one vote");
        }
        return Ok(votes);
    }

    if args.voters == 0 {
        bail!("--voters must be at least 1");
    }
    let mut rng = match args.rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Ok((0..args.voters)
        .map(|_| rng.gen_bool(0.5) as i64)
        .collect())
}

fn voter_id(index: usize) -> VoterId {
    VoterId::new(format!("voter-{index:04}"))
}

async fn run_single(config: ElectionConfig, votes: Vec<i64>, print_result: bool) -> Result<()> {
    let coordinator = Arc::new(
        ElectionCoordinator::<Curve>::new(config)
            .map_err(|err| anyhow!("failed to open election: {err}"))?,
    );
    let started = Instant::now();

    let registrations: Vec<_> = (0..votes.len())
        .map(|index| {
            let coordinator = Arc::clone(&coordinator);
            tokio::task::spawn_blocking(move || coordinator.register_voter(&voter_id(index)))
        })
        .collect();
    for task in registrations {
        let anchor = task.await.context("registration task panicked")??;
        if !coordinator.verify_registration(&anchor) {
            bail!("anchor for {} failed verification", anchor.voter_id);
        }
    }
    info!(target: LOG_TARGET, voters = votes.len(), elapsed = ?started.elapsed(), "Registration phase complete");

    let started = Instant::now();
    let casts: Vec<_> = votes
        .iter()
        .enumerate()
        .map(|(index, vote)| {
            let coordinator = Arc::clone(&coordinator);
            let vote = *vote;
            tokio::task::spawn_blocking(move || coordinator.cast_ballot(&voter_id(index), vote))
        })
        .collect();
    for task in casts {
        match task.await.context("voting task panicked")? {
            Ok(ballot) if coordinator.verify_ballot(&ballot) => {}
            Ok(ballot) => bail!("ballot for {} failed verification", ballot.voter_id),
            Err(err) => warn!(target: LOG_TARGET, error = %err, "Ballot rejected"),
        }
    }
    info!(target: LOG_TARGET, ballots = coordinator.ballot_count(), elapsed = ?started.elapsed(), "Voting phase complete");

    let started = Instant::now();
    let tally_coordinator = Arc::clone(&coordinator);
    let result = tokio::task::spawn_blocking(move || tally_coordinator.tally())
        .await
        .context("tally task panicked")?
        .map_err(|err| anyhow!("tally failed: {err}"))?;

    if !coordinator.verify_result(&result) {
        bail!("published result failed verification");
    }
    info!(
        target: LOG_TARGET,
        total = result.total_ballots,
        yes = result.yes_count,
        no = result.no_count,
        elapsed = ?started.elapsed(),
        "Tally verified"
    );

    if print_result {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

async fn run_partitioned(
    config: ElectionConfig,
    partitions: usize,
    votes: Vec<i64>,
    print_result: bool,
) -> Result<()> {
    let election = Arc::new(
        PartitionedElection::<Curve>::new(config, partitions)
            .map_err(|err| anyhow!("failed to open partitioned election: {err}"))?,
    );

    let tasks: Vec<_> = votes
        .iter()
        .enumerate()
        .map(|(index, vote)| {
            let election = Arc::clone(&election);
            let vote = *vote;
            tokio::task::spawn_blocking(move || {
                let id = voter_id(index);
                election.register_voter(&id)?;
                election.cast_ballot(&id, vote)
            })
        })
        .collect();
    for task in tasks {
        if let Err(err) = task.await.context("voter task panicked")? {
            warn!(target: LOG_TARGET, error = %err, "Voter rejected");
        }
    }

    let tally_election = Arc::clone(&election);
    let result = tokio::task::spawn_blocking(move || tally_election.tally())
        .await
        .context("tally task panicked")?
        .map_err(|err| anyhow!("partitioned tally failed: {err}"))?;
    if !election.verify_result(&result) {
        bail!("partitioned result failed verification");
    }

    for partition in &result.partitions {
        info!(
            target: LOG_TARGET,
            partition = partition.index,
            election_id = %partition.election_id,
            total = partition.result.total_ballots,
            yes = partition.result.yes_count,
            "Partition tallied"
        );
    }
    info!(
        target: LOG_TARGET,
        total = result.combined.total_ballots,
        yes = result.combined.yes_count,
        no = result.combined.no_count,
        "Combined tally verified"
    );

    if print_result {
        println!("{}", serde_json::to_string_pretty(&result)?);
    }
    Ok(())
}

fn init_tracing(json: bool) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(true)
        .with_timer(Uptime::default());
    if json {
        builder
            .with_ansi(false)
            .json()
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing subscriber: {err}"))?;
    } else {
        builder
            .try_init()
            .map_err(|err| anyhow!("failed to initialize tracing subscriber: {err}"))?;
    }
    Ok(())
}
