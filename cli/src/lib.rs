use std::path::PathBuf;

pub mod api;
pub mod config;
pub mod logging;

pub use config::AppConfig;

pub fn default_config_path() -> PathBuf {
    home_dir().join(".highscore").join("config.json")
}

pub fn default_scores_path() -> PathBuf {
    home_dir().join(".highscore").join("high_scores.json")
}

pub fn home_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home);
    }
    PathBuf::from(".")
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
