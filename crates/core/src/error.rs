use thiserror::Error;

use crate::generator::FractionError;
use crate::model::{ParseIdError, QuestionError, SettingsError};

/// Umbrella error for callers that do not care which core check failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Fraction(#[from] FractionError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
}
