use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyStats {
    pub date: NaiveDate,
    /// Round number -> how many players solved the riddle in that round
    pub guess_to_success: BTreeMap<u32, u32>,
    pub failures: u32,
    pub successes: u32,
}

impl DailyStats {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            guess_to_success: BTreeMap::new(),
            failures: 0,
            successes: 0,
        }
    }

    pub fn games_played(&self) -> u32 {
        self.successes + self.failures
    }
}
