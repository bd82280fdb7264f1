use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, info};
use tune_types::{DailyAnswer, DailyStats, Guess, GuessResponse, RevealedAnswer};

use crate::{
    AnswerStore, Clock, Evaluation, GameRules, GuessEvaluator, ImageProvider, RiddleError,
    RiddleResult, StatsStore, current_month_rollup,
};

/// Player-facing game flow: serves frames, evaluates guesses, ends the game on a
/// win or after the last round and records exactly one statistic per terminal guess.
pub struct RiddleService {
    answers: Arc<dyn AnswerStore>,
    stats: Arc<dyn StatsStore>,
    images: Arc<dyn ImageProvider>,
    clock: Arc<dyn Clock>,
    evaluator: GuessEvaluator,
    categories: Vec<String>,
}

impl RiddleService {
    pub fn new(
        answers: Arc<dyn AnswerStore>,
        stats: Arc<dyn StatsStore>,
        images: Arc<dyn ImageProvider>,
        clock: Arc<dyn Clock>,
        rules: GameRules,
        categories: Vec<String>,
    ) -> Self {
        Self {
            answers,
            stats,
            images,
            clock,
            evaluator: GuessEvaluator::new(rules),
            categories,
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn rules(&self) -> &GameRules {
        self.evaluator.rules()
    }

    pub fn ensure_category(&self, category: &str) -> RiddleResult<()> {
        if self.categories.iter().any(|c| c == category) {
            Ok(())
        } else {
            Err(RiddleError::UnknownCategory {
                category: category.to_string(),
            })
        }
    }

    async fn resolve_answer(&self, category: &str, today: NaiveDate) -> RiddleResult<DailyAnswer> {
        self.answers
            .answer_for_today(category, today)
            .await?
            .ok_or_else(|| RiddleError::DataUnavailable {
                category: category.to_string(),
                date: today,
            })
    }

    /// Round 0: the first frame and nothing else.
    pub async fn todays_riddle(&self, category: &str) -> RiddleResult<GuessResponse> {
        self.ensure_category(category)?;
        let today = self.clock.today();
        let answer = self.resolve_answer(category, today).await?;

        let first_frame = self.images.encoded_frame(category, answer.date, 0).await?;

        Ok(GuessResponse {
            guesses: 0,
            next_picture: Some(1),
            next_picture_contents: first_frame,
            ..GuessResponse::default()
        })
    }

    async fn evaluate_against_today(
        &self,
        category: &str,
        guess: &Guess,
    ) -> RiddleResult<(DailyAnswer, Evaluation)> {
        self.ensure_category(category)?;
        if guess.round == 0 {
            return Err(RiddleError::InvalidRound { round: guess.round });
        }

        let answer = self.resolve_answer(category, self.clock.today()).await?;
        let evaluation = self.evaluator.evaluate(&answer, guess);
        Ok((answer, evaluation))
    }

    /// Archived video of today's answer. The guess is scored again and must
    /// match both performer and title; nothing is recorded.
    pub async fn solved_video(&self, category: &str, guess: &Guess) -> RiddleResult<String> {
        let (answer, evaluation) = self.evaluate_against_today(category, guess).await?;
        if !evaluation.outcome.is_win() {
            return Err(RiddleError::NotSolved);
        }
        answer
            .video_file
            .ok_or(RiddleError::VideoMissing { date: answer.date })
    }

    pub async fn take_guess(&self, category: &str, guess: &Guess) -> RiddleResult<GuessResponse> {
        let (answer, evaluation) = self.evaluate_against_today(category, guess).await?;
        let outcome = &evaluation.outcome;

        let mut response = GuessResponse {
            performer_correct: outcome.performer_match,
            title_correct: outcome.title_match,
            performer_distance: Some(outcome.performer_distance),
            title_distance: Some(outcome.title_distance),
            guesses: guess.round,
            performer_hint: outcome.performer_hint.clone(),
            ..GuessResponse::default()
        };

        match &outcome.revealed {
            Some(revealed) => {
                // Gallery is only assembled once the game is certainly over
                response.all_picture_contents = Some(self.gallery(category, answer.date).await?);
                response.revealed = Some(RevealedAnswer::from(revealed));

                if let Some(record) = evaluation.stat_record(self.rules()) {
                    self.stats
                        .record_outcome(category, self.clock.today(), record.round, record.success)
                        .await?;
                    info!(
                        "Game over in '{}' at round {}: {}",
                        category,
                        guess.round,
                        if record.success { "solved" } else { "exhausted" }
                    );
                }
            }
            None => {
                response.next_picture_contents = self
                    .images
                    .encoded_frame(category, answer.date, guess.round)
                    .await?;
                response.next_picture = Some(guess.round + 1);
                debug!("Round {} in '{}' continues", guess.round, category);
            }
        }

        Ok(response)
    }

    async fn gallery(&self, category: &str, date: NaiveDate) -> RiddleResult<Vec<String>> {
        let mut frames = Vec::with_capacity(self.rules().max_rounds as usize);
        for index in 0..self.rules().max_rounds {
            frames.push(self.images.encoded_frame(category, date, index).await?);
        }
        Ok(frames)
    }

    /// Per-day statistics of the current calendar month, ordered by day.
    pub async fn monthly_stats(&self, category: &str) -> RiddleResult<Vec<DailyStats>> {
        self.ensure_category(category)?;
        let today = self.clock.today();
        let records = self
            .stats
            .stats_for_month(category, today.year(), today.month())
            .await?;
        Ok(current_month_rollup(records, today))
    }
}
