use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every question offers exactly this many choices.
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("correct index {index} is outside 0..{OPTION_COUNT}")]
    CorrectIndexOutOfRange { index: usize },

    #[error("option {option:?} appears more than once")]
    DuplicateOption { option: String },

    #[error("question prompt cannot be empty")]
    EmptyPrompt,
}

/// A multiple-choice arithmetic question ready for display.
///
/// `correct_index` points at the correct option after shuffling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    prompt: String,
    options: [String; OPTION_COUNT],
    correct_index: usize,
}

impl Question {
    /// Builds a question, checking the option invariants.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt is blank, the index is out of range,
    /// or two options render identically.
    pub fn new(
        prompt: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_index: usize,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if correct_index >= OPTION_COUNT {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: correct_index,
            });
        }
        for (i, option) in options.iter().enumerate() {
            if options[..i].contains(option) {
                return Err(QuestionError::DuplicateOption {
                    option: option.clone(),
                });
            }
        }

        Ok(Self {
            prompt,
            options,
            correct_index,
        })
    }

    /// Used by the generator, which guarantees the invariants itself.
    pub(crate) fn assembled(
        prompt: String,
        options: [String; OPTION_COUNT],
        correct_index: usize,
    ) -> Self {
        debug_assert!(correct_index < OPTION_COUNT);
        Self {
            prompt,
            options,
            correct_index,
        }
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }
}
