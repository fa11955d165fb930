use std::sync::Mutex;
use std::time::Duration;

use quiz_core::QuestionGenerator;
use quiz_core::model::{GradeTier, Question, QuizSettings};
use rand::SeedableRng;
use rand::rngs::StdRng;
use thiserror::Error;

/// The question source could not produce a question right now.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("question source is not ready")]
pub struct SourceUnavailable;

/// Where a session gets its questions from.
pub trait QuestionSource: Send + Sync {
    /// # Errors
    ///
    /// Returns `SourceUnavailable` when no question can be produced yet; the
    /// caller retries according to its [`RetryPolicy`].
    fn next_question(&self, tier: GradeTier) -> Result<Question, SourceUnavailable>;
}

impl QuestionSource for QuestionGenerator {
    fn next_question(&self, tier: GradeTier) -> Result<Question, SourceUnavailable> {
        Ok(self.generate(tier))
    }
}

/// Generator driven by a seeded RNG, for reproducible question sequences.
pub struct SeededSource {
    generator: QuestionGenerator,
    rng: Mutex<StdRng>,
}

impl SeededSource {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            generator: QuestionGenerator::new(),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl QuestionSource for SeededSource {
    fn next_question(&self, tier: GradeTier) -> Result<Question, SourceUnavailable> {
        let mut rng = self.rng.lock().map_err(|_| SourceUnavailable)?;
        Ok(self.generator.generate_with(&mut *rng, tier))
    }
}

/// Fixed-backoff, bounded retries for fetching a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    backoff: Duration,
    limit: u32,
}

impl RetryPolicy {
    #[must_use]
    pub fn new(backoff: Duration, limit: u32) -> Self {
        Self { backoff, limit }
    }

    #[must_use]
    pub fn from_settings(settings: &QuizSettings) -> Self {
        Self::new(
            settings.question_retry_backoff(),
            settings.question_retry_limit(),
        )
    }

    #[must_use]
    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Whether the `failures`-th consecutive failure may still be retried.
    #[must_use]
    pub fn allows(&self, failures: u32) -> bool {
        failures <= self.limit
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_settings(&QuizSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_sources_agree() {
        let a = SeededSource::new(11);
        let b = SeededSource::new(11);
        for tier in GradeTier::ALL {
            assert_eq!(a.next_question(tier), b.next_question(tier));
        }
    }

    #[test]
    fn default_policy_uses_settings() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(), Duration::from_millis(50));
        assert_eq!(policy.limit(), 40);
        assert!(policy.allows(40));
        assert!(!policy.allows(41));
    }
}
