//! End-to-end tests for Leaderboard over the file store.

use chrono::{Local, TimeZone};
use highscore_core::{
    FileScoreStore, Leaderboard, LeaderboardConfig, MemoryScoreStore, ScoreError, ScoreRecord,
    ScoreStore,
};
use std::path::Path;
use std::sync::Arc;
use std::thread;

fn file_board(path: &Path) -> Leaderboard {
    Leaderboard::new(LeaderboardConfig::default(), Arc::new(FileScoreStore::new(path)))
}

fn scores_of(records: &[ScoreRecord]) -> Vec<i64> {
    records.iter().map(|r| r.score).collect()
}

#[test]
fn empty_store_submit_ranks_first() {
    let dir = tempfile::tempdir().unwrap();
    let lb = file_board(&dir.path().join("high_scores.json"));

    let s = lb.submit(500, None).unwrap();
    assert_eq!(s.rank, 1);
    assert_eq!(s.record.score, 500);
    assert_eq!(scores_of(&lb.top(None, None)), vec![500]);
}

#[test]
fn submissions_persist_across_instances() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("high_scores.json");

    {
        let lb = file_board(&path);
        lb.submit(100, None).unwrap();
        lb.submit(80, None).unwrap();
        lb.submit(90, None).unwrap();
    }

    let lb = file_board(&path);
    assert_eq!(scores_of(&lb.top(None, None)), vec![100, 90, 80]);
    assert_eq!(lb.submit(90, None).unwrap().rank, 2);
}

#[test]
fn capacity_bound_discards_lowest_not_newest() {
    let dir = tempfile::tempdir().unwrap();
    let config = LeaderboardConfig {
        max_scores_stored: 5,
        ..LeaderboardConfig::default()
    };
    let lb = Leaderboard::new(config, Arc::new(FileScoreStore::new(dir.path().join("s.json"))));

    for score in [10, 20, 30, 40, 50, 60, 5] {
        let s = lb.submit(score, None).unwrap();
        assert!(s.total_scores <= 5);
    }
    assert_eq!(scores_of(&lb.top(Some(100), None)), vec![60, 50, 40, 30, 20]);
}

#[test]
fn duplicate_scores_keep_insertion_order() {
    let lb = Leaderboard::new(LeaderboardConfig::default(), Arc::new(MemoryScoreStore::new()));
    lb.submit(50, Some("first".into())).unwrap();
    lb.submit(50, Some("second".into())).unwrap();

    let top = lb.top(None, None);
    assert_eq!(top[0].timestamp, "first");
    assert_eq!(top[1].timestamp, "second");
}

#[test]
fn corrupt_file_reads_as_empty_and_is_replaced_on_submit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("high_scores.json");
    std::fs::write(&path, "[{\"score\": ").unwrap();

    let lb = file_board(&path);
    assert!(lb.top(None, None).is_empty());
    assert_eq!(lb.health().scores_file, "error");

    lb.submit(7, None).unwrap();
    assert_eq!(scores_of(&lb.top(None, None)), vec![7]);
    assert_eq!(lb.health().scores_file, "accessible");
}

#[test]
fn failed_save_is_surfaced_and_keeps_prior_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("high_scores.json");
    let lb = file_board(&path);
    lb.submit(10, None).unwrap();

    std::fs::create_dir(dir.path().join("high_scores.json.tmp")).unwrap();
    assert!(matches!(lb.submit(20, None), Err(ScoreError::Storage(_))));
    assert_eq!(scores_of(&lb.top(None, None)), vec![10]);
}

#[test]
fn save_of_load_is_noop_on_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("high_scores.json");
    let lb = file_board(&path);
    for score in [3, 1, 2] {
        lb.submit(score, None).unwrap();
    }

    let before = std::fs::read_to_string(&path).unwrap();
    let store = FileScoreStore::new(&path);
    store.save(&store.load()).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn recent_orders_by_timestamp() {
    let lb = Leaderboard::new(LeaderboardConfig::default(), Arc::new(MemoryScoreStore::new()));
    lb.submit(1, Some("2024-01-02T00:00:00".into())).unwrap();
    lb.submit(900, Some("2024-01-01T00:00:00".into())).unwrap();
    lb.submit(5, Some("2024-01-03T00:00:00".into())).unwrap();

    assert_eq!(scores_of(&lb.recent(None)), vec![5, 1, 900]);
    assert_eq!(scores_of(&lb.recent(Some(1))), vec![5]);
}

#[test]
fn date_window_applies_to_top_and_stats() {
    let now = Local.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap();
    let lb = Leaderboard::new(LeaderboardConfig::default(), Arc::new(MemoryScoreStore::new()));
    lb.submit(100, Some("2025-01-01T00:00:00".into())).unwrap();
    lb.submit(40, Some("2025-06-14T00:00:00".into())).unwrap();
    lb.submit(60, Some("bogus".into())).unwrap();

    assert_eq!(scores_of(&lb.top_at(None, Some(7), now)), vec![60, 40]);

    let report = lb.stats_at(Some(7), now);
    assert_eq!(report.total_records, 3);
    assert_eq!(report.stats.count, 2);
    assert_eq!(report.stats.mean, 50.0);
    assert_eq!(report.stats.max, 60);
}

#[test]
fn distribution_example() {
    let lb = Leaderboard::new(LeaderboardConfig::default(), Arc::new(MemoryScoreStore::new()));
    for score in [47, 12, 3] {
        lb.submit(score, None).unwrap();
    }
    let d = lb.distribution();
    assert_eq!(d.bucket_size, 10);
    let labels: Vec<&str> = d.buckets.iter().map(|b| b.range.as_str()).collect();
    assert_eq!(labels, vec!["0-9", "10-19", "40-49"]);
}

#[test]
fn export_contains_everything() {
    let lb = Leaderboard::new(LeaderboardConfig::default(), Arc::new(MemoryScoreStore::new()));
    lb.submit(1, None).unwrap();
    lb.submit(2, None).unwrap();
    let e = lb.export();
    assert_eq!(e.total_records, 2);
    assert_eq!(e.scores.len(), 2);
    assert!(!e.export_date.is_empty());
}

#[test]
fn concurrent_submissions_are_not_lost() {
    let dir = tempfile::tempdir().unwrap();
    let lb = Arc::new(file_board(&dir.path().join("high_scores.json")));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let lb = lb.clone();
            thread::spawn(move || {
                for j in 0..5 {
                    lb.submit(i * 10 + j, None).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(lb.top(Some(100), None).len(), 40);
}
