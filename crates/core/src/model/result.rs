use serde::{Deserialize, Serialize};

use crate::model::{GradeTier, RunId};

/// Immutable score snapshot taken once when a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionResult {
    score: u32,
    attempted: u32,
    percentage: u32,
}

impl SessionResult {
    /// Builds a result; `score` is clamped to `attempted`.
    ///
    /// The percentage is `round(100 * score / attempted)` with halves rounded up,
    /// and 0 when nothing was attempted.
    #[must_use]
    pub fn from_counts(score: u32, attempted: u32) -> Self {
        let score = score.min(attempted);
        Self {
            score,
            attempted,
            percentage: percentage(score, attempted),
        }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn attempted(&self) -> u32 {
        self.attempted
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }
}

fn percentage(score: u32, attempted: u32) -> u32 {
    if attempted == 0 {
        return 0;
    }
    let score = u64::from(score);
    let attempted = u64::from(attempted);
    // (2 * 100 * s + a) / (2 * a) == floor(100 * s / a + 1/2)
    let rounded = (200 * score + attempted) / (2 * attempted);
    u32::try_from(rounded).unwrap_or(100)
}

/// What the session controller hands to the stats layer exactly once per game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishedRun {
    pub run_id: RunId,
    pub tier: GradeTier,
    pub result: SessionResult,
}

/// Ephemeral record read once by the results view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastSession {
    pub score: u32,
    pub attempted: u32,
    pub percentage: u32,
}

impl From<SessionResult> for LastSession {
    fn from(result: SessionResult) -> Self {
        Self {
            score: result.score(),
            attempted: result.attempted(),
            percentage: result.percentage(),
        }
    }
}
