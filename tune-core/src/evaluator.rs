use tracing::debug;
use tune_types::{DailyAnswer, Guess, RoundOutcome};

use crate::{GameRules, SimilarityScorer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not solved yet and rounds remain
    Continue,
    /// Both performer and title matched
    Solved,
    /// Last round used up without a full match
    Exhausted,
}

/// A statistics entry that must be written for a terminal round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatRecord {
    pub round: u32,
    pub success: bool,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub outcome: RoundOutcome,
    pub verdict: Verdict,
    pub round: u32,
}

impl Evaluation {
    pub fn stat_record(&self, rules: &GameRules) -> Option<StatRecord> {
        match self.verdict {
            Verdict::Continue => None,
            Verdict::Solved => Some(StatRecord {
                round: rules.stats_round(self.round),
                success: true,
            }),
            Verdict::Exhausted => Some(StatRecord {
                round: rules.stats_round(self.round),
                success: false,
            }),
        }
    }
}

/// Stateless scorer for one guess against one answer. The round counter comes
/// from the client and is trusted only as far as deciding when the game ends.
#[derive(Debug, Clone)]
pub struct GuessEvaluator {
    scorer: SimilarityScorer,
    rules: GameRules,
}

impl GuessEvaluator {
    pub fn new(rules: GameRules) -> Self {
        Self {
            scorer: SimilarityScorer::new(rules.max_distance),
            rules,
        }
    }

    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    pub fn evaluate(&self, answer: &DailyAnswer, guess: &Guess) -> Evaluation {
        let (performer_distance, performer_match) =
            self.scorer.score(&answer.performer, &guess.performer);
        let (title_distance, title_match) = self.scorer.score(&answer.title, &guess.title);

        let verdict = if performer_match && title_match {
            Verdict::Solved
        } else if self.rules.is_last_round(guess.round) {
            Verdict::Exhausted
        } else {
            Verdict::Continue
        };

        let revealed = match verdict {
            Verdict::Continue => None,
            Verdict::Solved | Verdict::Exhausted => Some(answer.clone()),
        };

        let performer_hint = (performer_match
            || guess.round >= self.rules.hint_after_round
            || self.rules.is_last_round(guess.round))
        .then(|| answer.performer.clone());

        debug!(
            "Round {} in '{}': performer {} (d={}), title {} (d={}) -> {:?}",
            guess.round,
            answer.category,
            performer_match,
            performer_distance,
            title_match,
            title_distance,
            verdict
        );

        Evaluation {
            outcome: RoundOutcome {
                performer_match,
                title_match,
                performer_distance,
                title_distance,
                revealed,
                performer_hint,
            },
            verdict,
            round: guess.round,
        }
    }
}

impl Default for GuessEvaluator {
    fn default() -> Self {
        Self::new(GameRules::default())
    }
}
