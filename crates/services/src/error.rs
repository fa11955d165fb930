//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{OPTION_COUNT, SettingsError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by the session controller and runner.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session is not running")]
    NotRunning,
    #[error("no question is loaded")]
    NoQuestion,
    #[error("answer input is locked until the next question")]
    InputLocked,
    #[error("option {index} is outside 0..{OPTION_COUNT}")]
    OptionOutOfRange { index: usize },
    #[error("question source stayed unavailable")]
    SourceUnavailable,
}

/// Errors emitted by `StatsAggregator` and `LeaderboardService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StatsError {
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `PlayerService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PlayerServiceError {
    #[error("player document missing after login")]
    MissingAfterLogin,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
