use chrono::{Datelike, NaiveDate};
use tune_types::DailyStats;

/// Adds one terminal outcome to a day's record. Successes are bucketed by round.
pub fn apply_outcome(stats: &mut DailyStats, round: u32, success: bool) {
    if success {
        *stats.guess_to_success.entry(round).or_insert(0) += 1;
        stats.successes += 1;
    } else {
        stats.failures += 1;
    }
}

/// Keeps only the records of `today`'s calendar month, ordered by day.
pub fn current_month_rollup(records: Vec<DailyStats>, today: NaiveDate) -> Vec<DailyStats> {
    let mut month: Vec<DailyStats> = records
        .into_iter()
        .filter(|s| s.date.year() == today.year() && s.date.month() == today.month())
        .collect();
    month.sort_by_key(|s| s.date.day());
    month
}
