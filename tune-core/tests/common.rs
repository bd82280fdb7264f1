#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use tune_core::{
    Acquisition, AnswerStore, CategoryKeys, FixedClock, GameRules, ImageProvider,
    MaintenanceService, RiddleService, StatsStore, VideoAcquirer, apply_outcome, fallback_index,
};
use tune_types::{DailyAnswer, DailyStats, Video};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn today() -> NaiveDate {
    day(2024, 6, 15)
}

pub fn toto_answer(date: NaiveDate) -> DailyAnswer {
    DailyAnswer::new(
        "80s",
        date,
        "https://www.youtube.com/watch?v=FTQbiNvZqaY",
        "Toto",
        "Africa",
    )
}

#[derive(Default)]
pub struct MemoryAnswers {
    pub answers: Mutex<Vec<DailyAnswer>>,
}

impl MemoryAnswers {
    pub fn with(answers: Vec<DailyAnswer>) -> Self {
        Self {
            answers: Mutex::new(answers),
        }
    }
}

#[async_trait]
impl AnswerStore for MemoryAnswers {
    async fn answer_for_today(
        &self,
        category: &str,
        today: NaiveDate,
    ) -> Result<Option<DailyAnswer>> {
        let mut pool: Vec<DailyAnswer> = self
            .answers
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.category == category && a.date <= today)
            .cloned()
            .collect();
        if let Some(exact) = pool.iter().find(|a| a.date == today) {
            return Ok(Some(exact.clone()));
        }
        pool.sort_by_key(|a| a.date);
        Ok(fallback_index(today, pool.len()).map(|i| pool[i].clone()))
    }

    async fn upsert_answer(&self, answer: DailyAnswer) -> Result<()> {
        let mut answers = self.answers.lock().unwrap();
        answers.retain(|a| !(a.category == answer.category && a.date == answer.date));
        answers.push(answer);
        Ok(())
    }

    async fn last_available_date(&self, category: &str) -> Result<Option<NaiveDate>> {
        Ok(self
            .answers
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.category == category)
            .map(|a| a.date)
            .max())
    }

    async fn find_date_of_duplicate(
        &self,
        category: &str,
        performer: &str,
        title: &str,
    ) -> Result<Option<NaiveDate>> {
        Ok(self
            .answers
            .lock()
            .unwrap()
            .iter()
            .find(|a| {
                a.category == category
                    && a.performer.to_lowercase() == performer.to_lowercase()
                    && a.title.to_lowercase() == title.to_lowercase()
            })
            .map(|a| a.date))
    }
}

/// Stats store that also remembers every call it received
#[derive(Default)]
pub struct MemoryStats {
    pub records: Mutex<Vec<(String, DailyStats)>>,
    pub calls: Mutex<Vec<(String, NaiveDate, u32, bool)>>,
}

impl MemoryStats {
    pub fn calls(&self) -> Vec<(String, NaiveDate, u32, bool)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn seed(&self, category: &str, stats: DailyStats) {
        self.records
            .lock()
            .unwrap()
            .push((category.to_string(), stats));
    }
}

#[async_trait]
impl StatsStore for MemoryStats {
    async fn record_outcome(
        &self,
        category: &str,
        date: NaiveDate,
        round: u32,
        success: bool,
    ) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((category.to_string(), date, round, success));

        let mut records = self.records.lock().unwrap();
        let position = records
            .iter()
            .position(|(c, s)| c == category && s.date == date);
        let index = match position {
            Some(index) => index,
            None => {
                records.push((category.to_string(), DailyStats::new(date)));
                records.len() - 1
            }
        };
        apply_outcome(&mut records[index].1, round, success);
        Ok(())
    }

    // Deliberately sloppy: returns the whole category so callers must filter
    async fn stats_for_month(
        &self,
        category: &str,
        _year: i32,
        _month: u32,
    ) -> Result<Vec<DailyStats>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == category)
            .map(|(_, s)| s.clone())
            .collect())
    }
}

#[derive(Default)]
pub struct FakeImages {
    pub requested: Mutex<Vec<(NaiveDate, u32)>>,
    pub fail: bool,
}

impl FakeImages {
    pub fn requested_indices(&self) -> Vec<u32> {
        self.requested.lock().unwrap().iter().map(|(_, i)| *i).collect()
    }
}

#[async_trait]
impl ImageProvider for FakeImages {
    async fn encoded_frame(&self, category: &str, date: NaiveDate, index: u32) -> Result<String> {
        if self.fail {
            return Err(anyhow!("image store offline"));
        }
        self.requested.lock().unwrap().push((date, index));
        Ok(format!("{category}-{date}-{index}"))
    }

    async fn candidate_frames(
        &self,
        category: &str,
        date: NaiveDate,
        count: u32,
    ) -> Result<BTreeMap<u32, String>> {
        Ok((0..count)
            .map(|i| (i, format!("tmp-{category}-{date}-{i}")))
            .collect())
    }
}

pub enum AcquirerMode {
    Works,
    NeedsLogin,
    Broken,
}

pub struct FakeAcquirer {
    pub mode: AcquirerMode,
    pub promoted: Mutex<Vec<(String, NaiveDate, Vec<u32>)>>,
}

impl FakeAcquirer {
    pub fn new(mode: AcquirerMode) -> Self {
        Self {
            mode,
            promoted: Mutex::new(Vec::new()),
        }
    }

    pub fn promotions(&self) -> usize {
        self.promoted.lock().unwrap().len()
    }
}

#[async_trait]
impl VideoAcquirer for FakeAcquirer {
    async fn fetch_and_extract_frames(
        &self,
        url: &str,
        date: NaiveDate,
        _category: &str,
        _frame_count: u32,
    ) -> Result<Acquisition> {
        match self.mode {
            AcquirerMode::Works => Ok(Acquisition::Fetched(Video {
                url: url.to_string(),
                performer: "a-ha".to_string(),
                title: "Take On Me".to_string(),
                ..Video::for_date(date)
            })),
            AcquirerMode::NeedsLogin => Ok(Acquisition::NeedsAuthorization(
                "Requires Tidal token".to_string(),
            )),
            AcquirerMode::Broken => Err(anyhow!("wrong url")),
        }
    }

    async fn promote_frames_and_video(
        &self,
        category: &str,
        date: NaiveDate,
        selected: &[u32],
    ) -> Result<Option<String>> {
        self.promoted
            .lock()
            .unwrap()
            .push((category.to_string(), date, selected.to_vec()));
        Ok(Some(format!("vid/{category}/{date}.mp4")))
    }
}

pub struct TestRiddle {
    pub answers: Arc<MemoryAnswers>,
    pub stats: Arc<MemoryStats>,
    pub images: Arc<FakeImages>,
    pub service: RiddleService,
}

impl TestRiddle {
    pub fn new(answers: Vec<DailyAnswer>) -> Self {
        Self::with_rules(answers, GameRules::default())
    }

    pub fn with_rules(answers: Vec<DailyAnswer>, rules: GameRules) -> Self {
        let answers = Arc::new(MemoryAnswers::with(answers));
        let stats = Arc::new(MemoryStats::default());
        let images = Arc::new(FakeImages::default());
        let service = RiddleService::new(
            answers.clone(),
            stats.clone(),
            images.clone(),
            Arc::new(FixedClock(today())),
            rules,
            vec!["80s".to_string(), "90s".to_string()],
        );
        Self {
            answers,
            stats,
            images,
            service,
        }
    }
}

pub struct TestMaintenance {
    pub answers: Arc<MemoryAnswers>,
    pub acquirer: Arc<FakeAcquirer>,
    pub service: MaintenanceService,
}

impl TestMaintenance {
    pub fn new(answers: Vec<DailyAnswer>, mode: AcquirerMode) -> Self {
        let answers = Arc::new(MemoryAnswers::with(answers));
        let acquirer = Arc::new(FakeAcquirer::new(mode));
        let keys = CategoryKeys::new(Some("master".to_string()), Default::default());
        let service = MaintenanceService::new(
            answers.clone(),
            Arc::new(FakeImages::default()),
            acquirer.clone(),
            Arc::new(FixedClock(today())),
            keys,
            vec!["80s".to_string()],
            GameRules::default(),
        );
        Self {
            answers,
            acquirer,
            service,
        }
    }
}

pub fn month_of(stats: &[DailyStats]) -> Vec<(i32, u32)> {
    stats.iter().map(|s| (s.date.year(), s.date.month())).collect()
}
