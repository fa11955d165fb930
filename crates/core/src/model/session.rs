use crate::model::{Question, SessionResult};

/// Mutable per-game state.
///
/// Reset at every session start and owned by whoever drives the session; the
/// mutators only ever move it forward (time never increases, counters never drop).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    score: u32,
    attempted: u32,
    time_remaining: u32,
    ended: bool,
    current_question: Option<Question>,
}

impl Session {
    #[must_use]
    pub fn new(duration_secs: u32) -> Self {
        Self {
            score: 0,
            attempted: 0,
            time_remaining: duration_secs,
            ended: false,
            current_question: None,
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
    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    pub fn set_question(&mut self, question: Question) {
        self.current_question = Some(question);
    }

    pub fn clear_question(&mut self) {
        self.current_question = None;
    }

    /// Counts an answer and returns whether it matched the current question.
    ///
    /// Returns `None` when no question is loaded; nothing is counted then.
    pub fn record_answer(&mut self, index: usize) -> Option<bool> {
        let correct = self.current_question.as_ref()?.is_correct(index);
        self.attempted = self.attempted.saturating_add(1);
        if correct {
            self.score = self.score.saturating_add(1);
        }
        Some(correct)
    }

    /// Removes one second and returns what is left.
    pub fn tick(&mut self) -> u32 {
        self.time_remaining = self.time_remaining.saturating_sub(1);
        self.time_remaining
    }

    /// Flags the session as ended. Returns `true` only on the first call.
    pub fn mark_ended(&mut self) -> bool {
        if self.ended {
            return false;
        }
        self.ended = true;
        true
    }

    #[must_use]
    pub fn result(&self) -> SessionResult {
        SessionResult::from_counts(self.score, self.attempted)
    }
}
