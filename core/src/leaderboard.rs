//! Leaderboard service: composes the store, ranking and statistics per operation.

use crate::error::{Result, ScoreError, ValidationError};
use crate::filter::filter_by_days;
use crate::rank::{percentile, rank};
use crate::record::{LeaderboardConfig, ScoreRecord, TIMESTAMP_FORMAT};
use crate::stats::{self, Distribution, ScoreStats};
use crate::store::ScoreStore;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// Page size for `recent` when no limit is given.
pub const DEFAULT_RECENT_LIMIT: usize = 10;

/// Outcome of a successful submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub record: ScoreRecord,
    /// Rank against the board as it was before this score was added.
    pub rank: usize,
    /// Leaderboard size after trimming.
    pub total_scores: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankReport {
    pub score: i64,
    pub rank: usize,
    pub total_scores: usize,
    pub percentile: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    pub stats: ScoreStats,
    /// Stored records before any date filter.
    pub total_records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReport {
    pub export_date: String,
    pub total_records: usize,
    pub scores: Vec<ScoreRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    pub timestamp: String,
    pub version: String,
    pub scores_file: String,
    pub total_records: usize,
}

/// Bounded high-score leaderboard over a [`ScoreStore`].
pub struct Leaderboard {
    config: LeaderboardConfig,
    store: Arc<dyn ScoreStore>,
    /// Serialises the load-modify-save cycle of submissions within this process.
    write_lock: Mutex<()>,
}

impl Leaderboard {
    pub fn new(config: LeaderboardConfig, store: Arc<dyn ScoreStore>) -> Self {
        Self {
            config,
            store,
            write_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &LeaderboardConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn ScoreStore {
        self.store.as_ref()
    }

    /// Create the store if missing, check it parses, and log the active limits.
    pub fn initialize(&self) -> Result<usize> {
        if !self.store.exists() {
            tracing::info!(store = %self.store.location(), "creating new scores file");
            self.store.save(&[])?;
        }

        let count = match self.store.try_load() {
            Ok(records) => {
                tracing::info!("scores file validated, current records: {}", records.len());
                records.len()
            }
            Err(e) => {
                tracing::error!("error validating scores file: {e}");
                0
            }
        };

        tracing::info!(
            max_scores_stored = self.config.max_scores_stored,
            top_scores_display = self.config.top_scores_display,
            "valid score range: {} - {}",
            self.config.min_score,
            self.config.max_score
        );
        Ok(count)
    }

    /// Highest scores, optionally restricted to the last `days` days.
    pub fn top(&self, limit: Option<usize>, days: Option<u32>) -> Vec<ScoreRecord> {
        self.top_at(limit, days, Local::now())
    }

    pub fn top_at(&self, limit: Option<usize>, days: Option<u32>, now: DateTime<Local>) -> Vec<ScoreRecord> {
        let limit = self.config.clamp_limit(limit, self.config.top_scores_display);
        let mut scores = filter_by_days(self.store.load(), days, now);
        sort_by_score(&mut scores);
        scores.truncate(limit);
        scores
    }

    /// Validate, rank and persist a new score.
    pub fn submit(&self, score: i64, timestamp: Option<String>) -> Result<Submission> {
        self.submit_at(score, timestamp, Local::now())
    }

    pub fn submit_at(
        &self,
        score: i64,
        timestamp: Option<String>,
        now: DateTime<Local>,
    ) -> Result<Submission> {
        if let Err(e) = self.config.validate_score(score) {
            tracing::warn!("invalid score value: {score} - {e}");
            return Err(e.into());
        }

        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut scores = self.store.load();
        let rank = rank(score, &scores);

        let record = ScoreRecord::new(score, timestamp, now);
        scores.push(record.clone());
        sort_by_score(&mut scores);
        scores.truncate(self.config.max_scores_stored);

        if let Err(e) = self.store.save(&scores) {
            tracing::error!("failed to save scores: {e}");
            return Err(ScoreError::Storage(e));
        }

        tracing::info!("score saved: {score} (rank: {rank})");
        Ok(Submission {
            record,
            rank,
            total_scores: scores.len(),
        })
    }

    /// Rank `score` would take right now, without storing it.
    pub fn rank_of(&self, score: i64) -> Result<RankReport, ValidationError> {
        self.config.validate_score(score)?;
        let scores = self.store.load();
        let rank = rank(score, &scores);
        Ok(RankReport {
            score,
            rank,
            total_scores: scores.len(),
            percentile: percentile(rank, scores.len()),
        })
    }

    /// Most recent scores first, regardless of value.
    pub fn recent(&self, limit: Option<usize>) -> Vec<ScoreRecord> {
        let limit = self.config.clamp_limit(limit, DEFAULT_RECENT_LIMIT);
        let mut scores = self.store.load();
        scores.sort_by(|a, b| b.when().cmp(a.when()));
        scores.truncate(limit);
        scores
    }

    pub fn stats(&self, days: Option<u32>) -> StatsReport {
        self.stats_at(days, Local::now())
    }

    pub fn stats_at(&self, days: Option<u32>, now: DateTime<Local>) -> StatsReport {
        let all = self.store.load();
        let total_records = all.len();
        let stats = stats::stats(&filter_by_days(all, days, now));
        tracing::debug!("stats over {:?} days: {stats}", days);
        StatsReport { stats, total_records }
    }

    pub fn distribution(&self) -> Distribution {
        stats::distribution(&self.store.load())
    }

    /// Every stored score, for backup.
    pub fn export(&self) -> ExportReport {
        let scores = self.store.load();
        ExportReport {
            export_date: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            total_records: scores.len(),
            scores,
        }
    }

    pub fn health(&self) -> HealthReport {
        let (scores_file, total_records) = match self.store.try_load() {
            Ok(records) => ("accessible", records.len()),
            Err(e) => {
                tracing::warn!("health check could not read scores: {e}");
                ("error", 0)
            }
        };
        HealthReport {
            status: "healthy".to_string(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            scores_file: scores_file.to_string(),
            total_records,
        }
    }
}

/// Stable descending sort: equal scores keep their insertion order.
fn sort_by_score(scores: &mut [ScoreRecord]) {
    scores.sort_by(|a, b| b.score.cmp(&a.score));
}
