use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tune_types::{DailyAnswer, DailyStats, Video};

/// Stored daily answers, one per (category, date).
#[async_trait]
pub trait AnswerStore: Send + Sync {
    /// The answer for `today`, or one dated before `today` picked with [`fallback_index`]
    /// when nothing was published for that day. `None` if there is no such entry.
    async fn answer_for_today(&self, category: &str, today: NaiveDate)
    -> Result<Option<DailyAnswer>>;

    /// Replaces whatever was stored for the answer's (category, date).
    async fn upsert_answer(&self, answer: DailyAnswer) -> Result<()>;

    async fn last_available_date(&self, category: &str) -> Result<Option<NaiveDate>>;

    /// Date on which this performer/title pair was already used (case-insensitive).
    async fn find_date_of_duplicate(
        &self,
        category: &str,
        performer: &str,
        title: &str,
    ) -> Result<Option<NaiveDate>>;
}

#[async_trait]
pub trait StatsStore: Send + Sync {
    /// Adds one outcome to the day's record, creating the record if needed.
    async fn record_outcome(
        &self,
        category: &str,
        date: NaiveDate,
        round: u32,
        success: bool,
    ) -> Result<()>;

    async fn stats_for_month(&self, category: &str, year: i32, month: u32)
    -> Result<Vec<DailyStats>>;
}

#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// A published frame, already encoded for transport.
    async fn encoded_frame(&self, category: &str, date: NaiveDate, index: u32) -> Result<String>;

    /// Candidate frames extracted for curation, keyed by extraction index.
    async fn candidate_frames(
        &self,
        category: &str,
        date: NaiveDate,
        count: u32,
    ) -> Result<BTreeMap<u32, String>>;
}

#[derive(Debug, Clone)]
pub enum Acquisition {
    /// Video downloaded and candidate frames extracted; performer/title filled in.
    Fetched(Video),
    /// The provider wants an interactive login first. Carries an operator message.
    NeedsAuthorization(String),
}

#[async_trait]
pub trait VideoAcquirer: Send + Sync {
    async fn fetch_and_extract_frames(
        &self,
        url: &str,
        date: NaiveDate,
        category: &str,
        frame_count: u32,
    ) -> Result<Acquisition>;

    /// Moves the selected candidate frames into gallery positions `0..selected.len()`
    /// and files the downloaded video. Returns the final video path if one was kept.
    async fn promote_frames_and_video(
        &self,
        category: &str,
        date: NaiveDate,
        selected: &[u32],
    ) -> Result<Option<String>>;
}

/// Index of the historical answer to serve on a day with no published riddle.
/// A pure function of the date, so every replica picks the same entry.
pub fn fallback_index(date: NaiveDate, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    let mut rng = StdRng::seed_from_u64(date.num_days_from_ce() as u64);
    Some(rng.random_range(0..count))
}
