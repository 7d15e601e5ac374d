//! Logging setup and the startup banner.

use crate::AppConfig;
use anyhow::Result;
use clap::{ArgAction, Args};
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Args, Debug, Clone, Default)]
pub struct LogArgs {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long = "verbose", action = ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write daily-rolled log files into this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,
}

/// Filter used when `RUST_LOG` is unset.
fn default_filter(args: &LogArgs) -> &'static str {
    if args.quiet {
        return "error";
    }
    match args.verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize logging based on command line arguments.
///
/// `RUST_LOG` wins over verbosity flags, `--quiet` wins over both.
/// Keep the returned guard alive or buffered file output is lost.
pub fn init_logging(args: &LogArgs) -> Result<Option<WorkerGuard>> {
    let filter = if args.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter(args)))
    };

    let stderr = fmt::layer().with_writer(io::stderr);

    let (file, guard) = match &args.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "highscore.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init()?;

    Ok(guard)
}

/// Print the server configuration and the endpoint table.
pub fn print_startup_banner(config: &AppConfig) {
    let banner = format!(
        r#"
  highscore v{version}

  Server configuration:
    host         {host}
    port         {port}
    scores file  {scores}
    capacity     {cap} scores, valid range {min} - {max}

  Endpoints:
    GET    /api/scores               high score leaderboard
    POST   /api/scores               submit a new score
    GET    /api/stats                score statistics
    GET    /api/health               health check
    GET    /api/scores/recent        most recent scores
    GET    /api/scores/rank/{{score}}  rank for a score
    GET    /api/scores/distribution  score distribution
    GET    /api/scores/export        export all scores

  Query parameters: ?limit=N (max {limit_cap}), ?days=N
"#,
        version = env!("CARGO_PKG_VERSION"),
        host = config.host,
        port = config.port,
        scores = config.scores_file.display(),
        cap = config.leaderboard.max_scores_stored,
        min = config.leaderboard.min_score,
        max = config.leaderboard.max_score,
        limit_cap = config.leaderboard.max_query_limit,
    );

    println!("{banner}");
}
