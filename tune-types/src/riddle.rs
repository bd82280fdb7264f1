use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// The answer of one day's riddle in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyAnswer {
    pub id: Uuid,
    pub category: String,
    pub date: NaiveDate,
    pub url: String,
    pub performer: String,
    pub title: String,
    pub video_file: Option<String>,
}

impl DailyAnswer {
    pub fn new(
        category: impl Into<String>,
        date: NaiveDate,
        url: impl Into<String>,
        performer: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.into(),
            date,
            url: url.into(),
            performer: performer.into(),
            title: title.into(),
            video_file: None,
        }
    }
}

/// One submission from a player. `round` is 1-based and supplied by the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Guess {
    pub performer: String,
    pub title: String,
    pub round: u32,
}

/// Pure result of scoring a guess against the day's answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RoundOutcome {
    pub performer_match: bool,
    pub title_match: bool,
    pub performer_distance: u32,
    pub title_distance: u32,
    pub revealed: Option<DailyAnswer>,
    pub performer_hint: Option<String>,
}

impl RoundOutcome {
    pub fn is_win(&self) -> bool {
        self.performer_match && self.title_match
    }
}

/// The answer as shown to players once their game is over. Storage details
/// stay on the server; `has_video` tells the page whether a stream exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RevealedAnswer {
    pub date: NaiveDate,
    pub url: String,
    pub performer: String,
    pub title: String,
    pub has_video: bool,
}

impl From<&DailyAnswer> for RevealedAnswer {
    fn from(answer: &DailyAnswer) -> Self {
        Self {
            date: answer.date,
            url: answer.url.clone(),
            performer: answer.performer.clone(),
            title: answer.title.clone(),
            has_video: answer.video_file.is_some(),
        }
    }
}

/// What the player's browser receives after loading the riddle or guessing.
/// Never carries the answer unless the game is over.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GuessResponse {
    pub performer_correct: bool,
    pub title_correct: bool,
    pub performer_distance: Option<u32>,
    pub title_distance: Option<u32>,
    pub guesses: u32,
    pub next_picture: Option<u32>,
    pub next_picture_contents: String,
    pub revealed: Option<RevealedAnswer>,
    pub performer_hint: Option<String>,
    pub all_picture_contents: Option<Vec<String>>,
}
