mod controller;
mod runner;
mod source;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::{AnswerFeedback, QuestionFetch, SessionController, SessionPhase, TickOutcome};
pub use runner::{SessionCommand, SessionEvent, SessionRunner};
pub use source::{QuestionSource, RetryPolicy, SeededSource, SourceUnavailable};
