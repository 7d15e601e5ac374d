//! Score records and the leaderboard configuration.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Format of the human-readable `date` field.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of the default `timestamp` field (naive ISO-8601, microseconds).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A single persisted score.
///
/// Field order is the on-disk key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub score: i64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub date: String,
}

impl ScoreRecord {
    /// Build a record achieved at `now`. A caller-supplied timestamp is kept verbatim.
    pub fn new(score: i64, timestamp: Option<String>, now: DateTime<Local>) -> Self {
        Self {
            score,
            timestamp: timestamp.unwrap_or_else(|| now.format(TIMESTAMP_FORMAT).to_string()),
            date: now.format(DATE_FORMAT).to_string(),
        }
    }

    /// The timestamp used for time-based ordering and filtering.
    ///
    /// Falls back to `date` for records written without a timestamp.
    pub fn when(&self) -> &str {
        if self.timestamp.is_empty() {
            &self.date
        } else {
            &self.timestamp
        }
    }
}

/// Limits applied by the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Capacity of the persisted leaderboard.
    pub max_scores_stored: usize,
    /// Default page size for top-score listings.
    pub top_scores_display: usize,
    /// Hard cap on any `limit` query.
    pub max_query_limit: usize,
    pub min_score: i64,
    pub max_score: i64,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            max_scores_stored: 100,
            top_scores_display: 10,
            max_query_limit: 100,
            min_score: 0,
            max_score: 999_999,
        }
    }
}

impl LeaderboardConfig {
    /// Check that `score` lies within `[min_score, max_score]`.
    pub fn validate_score(&self, score: i64) -> Result<(), ValidationError> {
        if score < self.min_score {
            return Err(ValidationError::BelowMinimum { min: self.min_score });
        }
        if score > self.max_score {
            return Err(ValidationError::AboveMaximum { max: self.max_score });
        }
        Ok(())
    }

    /// Effective page size for a requested `limit`.
    pub fn clamp_limit(&self, limit: Option<usize>, default: usize) -> usize {
        limit.unwrap_or(default).min(self.max_query_limit)
    }
}
