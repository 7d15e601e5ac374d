use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use highscore::api::{self, DistributionResponse, StatsResponse, SubmitResponse};
use highscore::logging::{LogArgs, init_logging, print_startup_banner};
use highscore::{AppConfig, default_config_path, print_json};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "highscore", version, about = "High-score leaderboard service")]
struct Cli {
    #[command(flatten)]
    log: LogArgs,

    /// JSON config file (default: ~/.highscore/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Scores file, overrides the config file
    #[arg(long, global = true)]
    scores_file: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the REST API.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create the config and scores files if missing and check they parse.
    Init,
    /// Highest scores.
    Top {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        days: Option<u32>,
    },
    /// Most recent scores.
    Recent {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Rank a score would get, without storing it.
    Rank {
        #[arg(allow_negative_numbers = true)]
        score: i64,
    },
    Stats {
        #[arg(long)]
        days: Option<u32>,
    },
    Distribution,
    /// Dump every stored score.
    Export,
    /// Store a score.
    Submit {
        #[arg(allow_negative_numbers = true)]
        score: i64,
        #[arg(long)]
        timestamp: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli.log)?;

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let mut config = AppConfig::load(&config_path)?;
    if let Some(path) = cli.scores_file {
        config.scores_file = path;
    }

    match cli.cmd {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }

            let leaderboard = Arc::new(config.leaderboard());
            leaderboard
                .initialize()
                .with_context(|| format!("initialize scores file {}", config.scores_file.display()))?;
            if !cli.log.quiet {
                print_startup_banner(&config);
            }
            api::serve((config.host.as_str(), config.port), leaderboard).await?;
        }
        Command::Init => {
            if AppConfig::write_default_if_missing(&config_path)? {
                println!("wrote default config: {}", config_path.display());
            }
            let count = config
                .leaderboard()
                .initialize()
                .with_context(|| format!("initialize scores file {}", config.scores_file.display()))?;
            println!("scores file: {} ({count} records)", config.scores_file.display());
        }
        Command::Top { limit, days } => {
            print_json(&config.leaderboard().top(limit, days.filter(|d| *d > 0)))?;
        }
        Command::Recent { limit } => {
            print_json(&config.leaderboard().recent(limit))?;
        }
        Command::Rank { score } => {
            print_json(&config.leaderboard().rank_of(score)?)?;
        }
        Command::Stats { days } => {
            let report = config.leaderboard().stats(days.filter(|d| *d > 0));
            print_json(&StatsResponse::from(report))?;
        }
        Command::Distribution => {
            print_json(&DistributionResponse::from(config.leaderboard().distribution()))?;
        }
        Command::Export => {
            print_json(&config.leaderboard().export())?;
        }
        Command::Submit { score, timestamp } => {
            let submission = config.leaderboard().submit(score, timestamp)?;
            print_json(&SubmitResponse::from(submission))?;
        }
    }

    Ok(())
}
