use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiddleError {
    #[error("Data is missing for category '{category}' on {date}")]
    DataUnavailable { category: String, date: NaiveDate },
    #[error("This song was already used on {date}")]
    DuplicateContent { date: NaiveDate },
    #[error("Wrong key for category '{category}'")]
    Unauthorized { category: String },
    #[error("Unknown category '{category}'")]
    UnknownCategory { category: String },
    #[error("Invalid round counter {round}")]
    InvalidRound { round: u32 },
    #[error("A riddle needs {expected} frames, {actual} were selected")]
    FrameCount { expected: usize, actual: usize },
    #[error("The video is only available once the riddle is solved")]
    NotSolved,
    #[error("No video was archived for {date}")]
    VideoMissing { date: NaiveDate },
    #[error("Video acquisition failed: {0}")]
    Acquisition(String),
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type RiddleResult<T> = Result<T, RiddleError>;
