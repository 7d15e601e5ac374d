//! Application configuration: JSON file plus command-line overrides.

use crate::default_scores_path;
use anyhow::{Context, Result};
use highscore_core::{FileScoreStore, Leaderboard, LeaderboardConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub scores_file: PathBuf,
    pub leaderboard: LeaderboardConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            scores_file: default_scores_path(),
            leaderboard: LeaderboardConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let s = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let config = serde_json::from_str(&s)
            .with_context(|| format!("parse config file {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("write config file {}", path.display()))?;
        Ok(())
    }

    /// Write the default config to `path` unless a file is already there.
    /// Returns whether a file was written.
    pub fn write_default_if_missing(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        Self::default().save(path)?;
        Ok(true)
    }

    /// Leaderboard over the configured scores file.
    pub fn leaderboard(&self) -> Leaderboard {
        Leaderboard::new(
            self.leaderboard.clone(),
            Arc::new(FileScoreStore::new(&self.scores_file)),
        )
    }
}
