use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("session length must be at least one second")]
    InvalidSessionLength,

    #[error("question retry limit must be > 0")]
    InvalidRetryLimit,

    #[error("remote transaction attempts must be > 0")]
    InvalidTransactionAttempts,

    #[error("leaderboard size must be > 0")]
    InvalidLeaderboardSize,
}

/// Tunables for the quiz loop and stats commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    session_secs: u32,
    feedback_grace: Duration,
    question_retry_backoff: Duration,
    question_retry_limit: u32,
    remote_transaction_attempts: u32,
    leaderboard_size: u32,
}

impl Default for QuizSettings {
    /// One-minute rounds with a 220 ms answer flash.
    fn default() -> Self {
        Self {
            session_secs: 60,
            feedback_grace: Duration::from_millis(220),
            question_retry_backoff: Duration::from_millis(50),
            question_retry_limit: 40,
            remote_transaction_attempts: 5,
            leaderboard_size: 100,
        }
    }
}

impl QuizSettings {
    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if any count or the session length is zero.
    pub fn new(
        session_secs: u32,
        feedback_grace: Duration,
        question_retry_backoff: Duration,
        question_retry_limit: u32,
        remote_transaction_attempts: u32,
        leaderboard_size: u32,
    ) -> Result<Self, SettingsError> {
        if session_secs == 0 {
            return Err(SettingsError::InvalidSessionLength);
        }
        if question_retry_limit == 0 {
            return Err(SettingsError::InvalidRetryLimit);
        }
        if remote_transaction_attempts == 0 {
            return Err(SettingsError::InvalidTransactionAttempts);
        }
        if leaderboard_size == 0 {
            return Err(SettingsError::InvalidLeaderboardSize);
        }

        Ok(Self {
            session_secs,
            feedback_grace,
            question_retry_backoff,
            question_retry_limit,
            remote_transaction_attempts,
            leaderboard_size,
        })
    }

    /// Same settings with a different round length.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidSessionLength` for zero.
    pub fn with_session_secs(mut self, session_secs: u32) -> Result<Self, SettingsError> {
        if session_secs == 0 {
            return Err(SettingsError::InvalidSessionLength);
        }
        self.session_secs = session_secs;
        Ok(self)
    }

    #[must_use]
    pub fn session_secs(&self) -> u32 {
        self.session_secs
    }

    #[must_use]
    pub fn feedback_grace(&self) -> Duration {
        self.feedback_grace
    }

    #[must_use]
    pub fn question_retry_backoff(&self) -> Duration {
        self.question_retry_backoff
    }

    #[must_use]
    pub fn question_retry_limit(&self) -> u32 {
        self.question_retry_limit
    }

    #[must_use]
    pub fn remote_transaction_attempts(&self) -> u32 {
        self.remote_transaction_attempts
    }

    #[must_use]
    pub fn leaderboard_size(&self) -> u32 {
        self.leaderboard_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_one_minute_round() {
        let settings = QuizSettings::default();
        assert_eq!(settings.session_secs(), 60);
        assert_eq!(settings.feedback_grace(), Duration::from_millis(220));
        assert_eq!(settings.leaderboard_size(), 100);
    }

    #[test]
    fn zero_values_are_rejected() {
        let grace = Duration::from_millis(220);
        let backoff = Duration::from_millis(50);
        assert_eq!(
            QuizSettings::new(0, grace, backoff, 1, 1, 1),
            Err(SettingsError::InvalidSessionLength)
        );
        assert_eq!(
            QuizSettings::new(60, grace, backoff, 0, 1, 1),
            Err(SettingsError::InvalidRetryLimit)
        );
        assert_eq!(
            QuizSettings::new(60, grace, backoff, 1, 0, 1),
            Err(SettingsError::InvalidTransactionAttempts)
        );
        assert_eq!(
            QuizSettings::default().with_session_secs(0),
            Err(SettingsError::InvalidSessionLength)
        );
    }
}
