use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use sha2::{Digest, Sha256};
use tracing::{info, warn};
use tune_types::{DailyAnswer, Video};

use crate::{
    Acquisition, AnswerStore, Clock, GameRules, ImageProvider, RiddleError, RiddleResult,
    VideoAcquirer,
};

/// Maintenance secrets: one master key plus optional per-category keys.
#[derive(Debug, Clone, Default)]
pub struct CategoryKeys {
    master: Option<String>,
    per_category: HashMap<String, String>,
}

impl CategoryKeys {
    pub fn new(master: Option<String>, per_category: HashMap<String, String>) -> Self {
        Self {
            master: master.filter(|k| !k.is_empty()),
            per_category: per_category
                .into_iter()
                .filter(|(_, k)| !k.is_empty())
                .collect(),
        }
    }

    pub fn is_valid(&self, category: &str, key: &str) -> bool {
        if key.is_empty() {
            return false;
        }
        let master_ok = self.master.as_deref().is_some_and(|m| keys_equal(m, key));
        let category_ok = self
            .per_category
            .get(category)
            .is_some_and(|k| keys_equal(k, key));
        master_ok || category_ok
    }

    pub fn authorize(&self, category: &str, key: &str) -> RiddleResult<()> {
        if self.is_valid(category, key) {
            Ok(())
        } else {
            warn!("Rejected maintenance key for category '{}'", category);
            Err(RiddleError::Unauthorized {
                category: category.to_string(),
            })
        }
    }
}

// Digests have a fixed length, so the comparison does not leak the matching prefix
fn keys_equal(expected: &str, given: &str) -> bool {
    Sha256::digest(expected.as_bytes()) == Sha256::digest(given.as_bytes())
}

/// Operator workflow: pick the next free date, fetch a video, curate frames, publish.
pub struct MaintenanceService {
    answers: Arc<dyn AnswerStore>,
    images: Arc<dyn ImageProvider>,
    acquirer: Arc<dyn VideoAcquirer>,
    clock: Arc<dyn Clock>,
    keys: CategoryKeys,
    categories: Vec<String>,
    rules: GameRules,
}

impl MaintenanceService {
    pub fn new(
        answers: Arc<dyn AnswerStore>,
        images: Arc<dyn ImageProvider>,
        acquirer: Arc<dyn VideoAcquirer>,
        clock: Arc<dyn Clock>,
        keys: CategoryKeys,
        categories: Vec<String>,
        rules: GameRules,
    ) -> Self {
        Self {
            answers,
            images,
            acquirer,
            clock,
            keys,
            categories,
            rules,
        }
    }

    fn ensure_category(&self, category: &str) -> RiddleResult<()> {
        if self.categories.iter().any(|c| c == category) {
            Ok(())
        } else {
            Err(RiddleError::UnknownCategory {
                category: category.to_string(),
            })
        }
    }

    fn check(&self, api_key: &str, category: &str) -> RiddleResult<()> {
        self.keys.authorize(category, api_key)?;
        self.ensure_category(category)
    }

    /// Day after the last published riddle, or tomorrow if nothing is published.
    pub async fn next_date(&self, category: &str) -> RiddleResult<Video> {
        self.ensure_category(category)?;
        let last = self
            .answers
            .last_available_date(category)
            .await?
            .unwrap_or_else(|| self.clock.today());
        let next = last.checked_add_days(Days::new(1)).unwrap_or(last);
        Ok(Video::for_date(next))
    }

    /// Downloads the video and extracts candidate frames. A provider that needs an
    /// interactive login is reported through `Video::error`, not as a failure.
    pub async fn download(
        &self,
        api_key: &str,
        category: &str,
        video: &Video,
    ) -> RiddleResult<Video> {
        self.check(api_key, category)?;

        let acquisition = self
            .acquirer
            .fetch_and_extract_frames(&video.url, video.date, category, self.rules.candidate_frames)
            .await
            .map_err(|e| {
                warn!("Download of {} failed: {:#}", video.url, e);
                RiddleError::Acquisition(e.to_string())
            })?;

        match acquisition {
            Acquisition::Fetched(fetched) => {
                info!(
                    "Fetched '{}' by '{}' for {} in '{}'",
                    fetched.title, fetched.performer, fetched.date, category
                );
                Ok(fetched)
            }
            Acquisition::NeedsAuthorization(message) => {
                warn!("Provider for {} needs authorization: {}", video.url, message);
                Ok(Video {
                    error: Some(message),
                    ..video.clone()
                })
            }
        }
    }

    pub async fn candidate_frames(
        &self,
        api_key: &str,
        category: &str,
        date: NaiveDate,
    ) -> RiddleResult<BTreeMap<u32, String>> {
        self.check(api_key, category)?;
        Ok(self
            .images
            .candidate_frames(category, date, self.rules.candidate_frames)
            .await?)
    }

    /// Publishes `video` as the riddle of `video.date`. Nothing is moved or stored
    /// when the key is wrong, the selection is not one frame per round, or the
    /// song was already used in this category.
    pub async fn publish(
        &self,
        api_key: &str,
        category: &str,
        video: &Video,
    ) -> RiddleResult<DailyAnswer> {
        self.check(api_key, category)?;

        let expected = self.rules.max_rounds as usize;
        if video.image_ids.len() != expected {
            return Err(RiddleError::FrameCount {
                expected,
                actual: video.image_ids.len(),
            });
        }

        if let Some(date) = self
            .answers
            .find_date_of_duplicate(category, &video.performer, &video.title)
            .await?
        {
            warn!(
                "Refusing to publish '{}' by '{}': already used on {}",
                video.title, video.performer, date
            );
            return Err(RiddleError::DuplicateContent { date });
        }

        let video_file = self
            .acquirer
            .promote_frames_and_video(category, video.date, &video.image_ids)
            .await
            .map_err(|e| RiddleError::Acquisition(e.to_string()))?;

        let mut answer = DailyAnswer::new(
            category,
            video.date,
            video.url.clone(),
            video.performer.clone(),
            video.title.clone(),
        );
        answer.video_file = video_file;

        self.answers.upsert_answer(answer.clone()).await?;
        info!(
            "Published '{}' by '{}' for {} in '{}'",
            answer.title, answer.performer, answer.date, category
        );
        Ok(answer)
    }
}
