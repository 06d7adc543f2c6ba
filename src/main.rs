//! Command line entry point for scrimmage
//!
//! Partitions rosters, resolves reported outcomes, and runs a full
//! form-teams / record-result cycle against an in-memory store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use scrimmage::config::AppConfig;
use scrimmage::events::TracingEventPublisher;
use scrimmage::metrics::MetricsCollector;
use scrimmage::outcome::{resolve_ranks, OutcomeSelection};
use scrimmage::rating::{InMemoryPlayerStore, PlayerStore};
use scrimmage::session::SessionManager;
use scrimmage::teams::{balance_report, partition_team_sizes, AssignmentMode};
use scrimmage::types::{Player, PlayerRating, TeamOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Scrimmage - team formation and match outcome resolution
#[derive(Parser)]
#[command(
    name = "scrimmage",
    version,
    about = "Split rosters into balanced teams and turn match results into rating updates"
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        global = true,
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        global = true,
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(short, long, global = true, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Print Prometheus metrics before exiting
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the team sizes for a player count
    Partition {
        /// Number of players
        #[arg(allow_negative_numbers = true)]
        players: i64,
    },

    /// Validate an outcome selection and print the rank vector
    Resolve {
        /// Number of teams
        #[arg(short, long)]
        teams: usize,

        #[command(flatten)]
        outcome: OutcomeArgs,
    },

    /// Form teams from a roster file and optionally record the result
    Play {
        /// JSON array of players
        #[arg(short, long, value_name = "FILE")]
        roster: PathBuf,

        #[arg(short, long, value_enum, default_value_t = ModeArg::Balanced)]
        mode: ModeArg,

        /// Shuffle within skill tiers for more varied teams
        #[arg(long)]
        randomized: bool,

        /// Require one player from this region on every team
        #[arg(long, value_name = "REGION")]
        region: Option<String>,

        /// Seed for reproducible team assignment
        #[arg(long)]
        seed: Option<u64>,

        #[command(flatten)]
        outcome: OutcomeArgs,
    },

    /// Rate one player against a fresh opponent
    Rate {
        #[arg(long, allow_negative_numbers = true)]
        mu: f64,

        #[arg(long)]
        sigma: f64,

        /// win, loss or draw
        #[arg(long)]
        outcome: TeamOutcome,
    },
}

#[derive(clap::Args)]
struct OutcomeArgs {
    /// Winning team (1-based)
    #[arg(short, long)]
    winner: Option<usize>,

    /// Losing team (1-based)
    #[arg(short = 'L', long)]
    loser: Option<usize>,

    /// Drawing teams, repeated or comma separated
    #[arg(long = "draw", value_delimiter = ',')]
    draws: Vec<usize>,
}

impl OutcomeArgs {
    fn is_empty(&self) -> bool {
        self.winner.is_none() && self.loser.is_none() && self.draws.is_empty()
    }

    fn selection(&self) -> OutcomeSelection {
        OutcomeSelection::new(self.winner, self.loser, self.draws.iter().copied())
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Balanced,
    Random,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Load and merge configuration from environment and CLI arguments
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    // Apply CLI overrides
    if let Some(log_level) = &args.log_level {
        config.service.log_level = log_level.clone();
    }

    if args.debug {
        config.service.log_level = "debug".to_string();
    }

    scrimmage::config::validate_config(&config)?;
    Ok(config)
}

fn load_roster(path: &Path) -> Result<Vec<Player>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster {}", path.display()))?;
    let players: Vec<Player> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid roster file {}", path.display()))?;
    Ok(players)
}

fn run_partition(players: i64) -> Result<()> {
    let partition = partition_team_sizes(players)?;
    println!(
        "{} players -> {} teams {:?}",
        partition.total_players(),
        partition.team_count(),
        partition.sizes()
    );
    Ok(())
}

fn run_resolve(teams: usize, outcome: &OutcomeArgs) -> Result<()> {
    let ranks = resolve_ranks(teams, &outcome.selection())?;
    println!("ranks: {:?}", ranks.ranks());
    for (i, result) in ranks.team_outcomes().iter().enumerate() {
        println!("  Team {}: {}", i + 1, result);
    }
    Ok(())
}

async fn run_play(
    config: &AppConfig,
    metrics: Arc<MetricsCollector>,
    roster: &Path,
    mode: AssignmentMode,
    seed: Option<u64>,
    outcome: &OutcomeArgs,
) -> Result<()> {
    let players = load_roster(roster)?;
    info!("Loaded {} players from {}", players.len(), roster.display());

    let store = Arc::new(InMemoryPlayerStore::new());
    let publisher =
        Arc::new(TracingEventPublisher::new().with_payload(config.service.log_level == "trace"));
    let mut manager = SessionManager::from_config(config, store.clone(), publisher, metrics)?;
    if let Some(seed) = seed {
        manager = manager.with_seed(seed);
    }

    let snapshot = manager.create_session(players, Some(mode)).await?;
    for team in &snapshot.teams {
        let names: Vec<&str> = team.players.iter().map(|p| p.username.as_str()).collect();
        println!(
            "Team {} (avg {:.2}): {}",
            team.index,
            team.average_skill(),
            names.join(", ")
        );
    }
    let report = balance_report(&snapshot.teams);
    println!(
        "Balance: {:?} (difference {:.2}, variance {:.3})",
        report.quality, report.difference, report.variance
    );

    if outcome.is_empty() {
        debug!("No result given, leaving session {} open", snapshot.session_id);
        return Ok(());
    }

    let id = snapshot.session_id;
    manager.select_winner(id, outcome.winner).await?;
    manager.select_loser(id, outcome.loser).await?;
    manager.select_draws(id, outcome.draws.clone()).await?;
    let result = manager.commit(id).await?;

    println!("ranks: {:?}", result.ranks.ranks());
    for change in &result.rating_changes {
        println!(
            "  {} (team {}, {}): {} -> {} ({:+.2})",
            change.player_id,
            change.team_index,
            change.outcome,
            change.old_rating,
            change.new_rating,
            change.mu_delta()
        );
    }

    println!("Leaderboard:");
    for (i, record) in store.leaderboard(10)?.iter().enumerate() {
        println!(
            "  {:>2}. {} {} (W{} L{} D{})",
            i + 1,
            record.player.username,
            record.rating(),
            record.wins,
            record.losses,
            record.draws
        );
    }

    manager.end_session(id).await?;
    Ok(())
}

fn run_rate(config: &AppConfig, mu: f64, sigma: f64, outcome: TeamOutcome) -> Result<()> {
    let engine = config.rating.build_engine()?;
    let before = PlayerRating::new(mu, sigma);
    let after = engine.rate_against_baseline(before, outcome)?;
    println!("{} ({}): {} -> {}", engine.name(), outcome, before, after);
    Ok(())
}

async fn run(args: Args, config: AppConfig) -> Result<()> {
    let metrics = Arc::new(MetricsCollector::new()?);

    match &args.command {
        Command::Partition { players } => run_partition(*players)?,
        Command::Resolve { teams, outcome } => run_resolve(*teams, outcome)?,
        Command::Play {
            roster,
            mode,
            randomized,
            region,
            seed,
            outcome,
        } => {
            let mode = match (region, mode) {
                (Some(region), _) => AssignmentMode::RegionConstrained {
                    region: region.clone(),
                    randomized: *randomized,
                },
                (None, ModeArg::Balanced) => AssignmentMode::SkillBalanced {
                    randomized: *randomized,
                },
                (None, ModeArg::Random) => AssignmentMode::Random,
            };
            run_play(&config, metrics.clone(), roster, mode, *seed, outcome).await?
        }
        Command::Rate {
            mu,
            sigma,
            outcome,
        } => run_rate(&config, *mu, *sigma, *outcome)?,
    }

    if args.metrics {
        print!("{}", metrics.encode_text()?);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(args, config).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }

    Ok(())
}
