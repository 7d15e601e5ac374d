//! Rank of a candidate score against the current leaderboard.

use crate::record::ScoreRecord;
use crate::stats::round_ratio;

/// 1-based rank `candidate` would take among `current`.
///
/// Counts stored scores strictly above the candidate; ties go to the new score.
/// Pass the leaderboard as it was *before* inserting the candidate.
pub fn rank(candidate: i64, current: &[ScoreRecord]) -> usize {
    let mut scores: Vec<i64> = current.iter().map(|r| r.score).collect();
    scores.sort_unstable_by(|a, b| b.cmp(a));

    scores
        .iter()
        .position(|&s| candidate >= s)
        .map_or(scores.len() + 1, |i| i + 1)
}

/// Share of the leaderboard at or below `rank`, in percent with 2 decimals.
pub fn percentile(rank: usize, total: usize) -> f64 {
    if total == 0 {
        return 100.0;
    }
    // (1 - (rank - 1) / total) * 100 == (total - rank + 1) * 100 / total
    let above = rank.saturating_sub(1).min(total);
    round_ratio(((total - above) * 100) as i128, total as i128)
}
