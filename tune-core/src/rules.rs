/// Tunables of the daily game, fixed at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameRules {
    /// Largest edit distance still accepted as a match
    pub max_distance: u32,
    /// Guesses allowed per day; also the number of published frames
    pub max_rounds: u32,
    /// From this round on the performer is revealed even if not guessed
    pub hint_after_round: u32,
    /// Frames extracted from a video for the operator to choose from
    pub candidate_frames: u32,
}

impl GameRules {
    pub fn is_last_round(&self, round: u32) -> bool {
        round >= self.max_rounds
    }

    /// Round under which a success is counted in the statistics
    pub fn stats_round(&self, round: u32) -> u32 {
        round.min(self.max_rounds).max(1)
    }
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            max_distance: 4,
            max_rounds: 8,
            hint_after_round: 8,
            candidate_frames: 40,
        }
    }
}
