use serde::{Deserialize, Serialize};

use crate::model::SessionResult;

/// Running mean of per-game percentages kept on the learner's device.
///
/// Serialized as `{ "average", "gamesPlayed", "totalScoreSum" }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalStats {
    pub average: u32,
    pub games_played: u32,
    pub total_score_sum: u64,
}

impl LocalStats {
    /// Folds one finished game's percentage into the aggregate.
    #[must_use]
    pub fn record(self, percentage: u32) -> Self {
        let games_played = self.games_played.saturating_add(1);
        let total_score_sum = self.total_score_sum.saturating_add(u64::from(percentage));
        Self {
            average: rounded_mean(total_score_sum, games_played),
            games_played,
            total_score_sum,
        }
    }
}

fn rounded_mean(total: u64, count: u32) -> u32 {
    if count == 0 {
        return 0;
    }
    let count = u64::from(count);
    u32::try_from((2 * total + count) / (2 * count)).unwrap_or(u32::MAX)
}

/// Per-identity aggregate held in the shared store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteStats {
    pub games_played: u64,
    pub total_correct: u64,
    pub total_attempted: u64,
    pub avg_correct_per_game: f64,
    pub avg_percent: f64,
}

impl RemoteStats {
    /// Computes the aggregate after adding one finished run.
    ///
    /// `avg_correct_per_game` is kept to four decimals; `avg_percent` is the
    /// running mean of per-game percentages.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn apply_run(&self, result: &SessionResult) -> Self {
        let games_played = self.games_played.saturating_add(1);
        let total_correct = self.total_correct.saturating_add(u64::from(result.score()));
        let total_attempted = self
            .total_attempted
            .saturating_add(u64::from(result.attempted()));

        let games = games_played as f64;
        let avg_correct_per_game = round4(total_correct as f64 / games);
        let avg_percent = (self.avg_percent * self.games_played as f64
            + f64::from(result.percentage()))
            / games;

        Self {
            games_played,
            total_correct,
            total_attempted,
            avg_correct_per_game,
            avg_percent,
        }
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
