//! highscore_core
//!
//! Rust core for the high-score service: score store, ranking, statistics and
//! the date-window filter. No HTTP here; the `highscore` binary owns that.

pub mod error;
pub mod filter;
pub mod leaderboard;
pub mod rank;
pub mod record;
pub mod stats;
pub mod store;

pub use error::{ScoreError, StoreError, ValidationError};
pub use filter::{filter_by_days, parse_timestamp};
pub use leaderboard::{ExportReport, HealthReport, Leaderboard, RankReport, StatsReport, Submission};
pub use rank::{percentile, rank};
pub use record::{LeaderboardConfig, ScoreRecord};
pub use stats::{Bucket, DateRange, Distribution, ScoreStats, distribution, stats};
pub use store::{FileScoreStore, MemoryScoreStore, ScoreStore};
