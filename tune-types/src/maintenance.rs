use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Working record of the maintenance workflow: a source video, the frames the
/// operator picked from it, and the answer that will be published.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Video {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image_ids: Vec<u32>,
    #[serde(default)]
    pub performer: String,
    #[serde(default)]
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub error: Option<String>,
}

impl Video {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            url: String::new(),
            image_ids: Vec::new(),
            performer: String::new(),
            title: String::new(),
            date,
            error: None,
        }
    }
}
