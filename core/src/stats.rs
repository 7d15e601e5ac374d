//! Aggregate statistics over a score set.

use crate::record::ScoreRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lexicographic bounds of the stored `date` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub oldest: String,
    pub newest: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreStats {
    pub count: usize,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub median: f64,
    pub date_range: Option<DateRange>,
}

impl fmt::Display for ScoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "count={} min={} max={} mean={:.2} median={:.2}",
            self.count, self.min, self.max, self.mean, self.median
        )
    }
}

/// Compute summary stats for a set of records.
///
/// - Empty input yields zeros and no date range.
/// - Mean and median are rounded to 2 decimals, half away from zero.
/// - The date range compares the formatted `date` strings, not parsed instants.
pub fn stats(records: &[ScoreRecord]) -> ScoreStats {
    if records.is_empty() {
        return ScoreStats {
            count: 0,
            min: 0,
            max: 0,
            mean: 0.0,
            median: 0.0,
            date_range: None,
        };
    }

    let mut v: Vec<i64> = records.iter().map(|r| r.score).collect();
    v.sort_unstable();

    let count = v.len();
    let sum: i128 = v.iter().map(|&s| s as i128).sum();
    let mean = round_ratio(sum, count as i128);

    let mid = count / 2;
    let median = if count % 2 == 0 {
        round_ratio(v[mid - 1] as i128 + v[mid] as i128, 2)
    } else {
        round_ratio(v[mid] as i128, 1)
    };

    let oldest = records.iter().map(|r| r.date.as_str()).min().unwrap_or_default();
    let newest = records.iter().map(|r| r.date.as_str()).max().unwrap_or_default();

    ScoreStats {
        count,
        min: v[0],
        max: v[count - 1],
        mean,
        median,
        date_range: Some(DateRange {
            oldest: oldest.to_string(),
            newest: newest.to_string(),
        }),
    }
}

/// One histogram bucket, labelled `"{low}-{high}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub range: String,
    pub low: i64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub buckets: Vec<Bucket>,
    pub bucket_size: i64,
    pub total: usize,
}

/// Smallest bucket width.
pub const MIN_BUCKET_SIZE: i64 = 10;

/// Histogram of scores in fixed-width buckets, ascending by lower bound.
///
/// Width is `max(10, max_score / 10)` with integer division. Bounds saturate
/// at the ends of `i64`, so out-of-range scores from a hand-edited file still
/// land in the outermost bucket.
pub fn distribution(records: &[ScoreRecord]) -> Distribution {
    let max_score = records.iter().map(|r| r.score).max().unwrap_or(0);
    let bucket_size = MIN_BUCKET_SIZE.max(max_score / 10);

    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for r in records {
        let low = r.score.div_euclid(bucket_size).saturating_mul(bucket_size);
        *counts.entry(low).or_default() += 1;
    }

    let buckets = counts
        .into_iter()
        .map(|(low, count)| Bucket {
            range: format!("{}-{}", low, low.saturating_add(bucket_size - 1)),
            low,
            count,
        })
        .collect();

    Distribution {
        buckets,
        bucket_size,
        total: records.len(),
    }
}

/// `numer / denom` rounded to 2 decimals, half away from zero.
///
/// Works on the exact ratio so binary float error never tips a tie.
pub(crate) fn round_ratio(numer: i128, denom: i128) -> f64 {
    debug_assert!(denom > 0);
    let scaled = numer * 100;
    let hundredths = (2 * scaled.abs() + denom) / (2 * denom);
    let hundredths = if scaled < 0 { -hundredths } else { hundredths };
    hundredths as f64 / 100.0
}
