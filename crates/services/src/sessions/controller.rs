use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{
    FinishedRun, GradeTier, OPTION_COUNT, Question, QuizSettings, RunId, Session,
};
use tracing::{debug, info, warn};

use super::source::{QuestionSource, RetryPolicy};
use crate::error::SessionError;

//
// ─── PHASES AND OUTCOMES ───────────────────────────────────────────────────────
//

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Running,
    Ended,
    /// The question source never became ready; terminal until the next start.
    Unavailable,
}

/// Outcome of scoring one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub chosen: usize,
    pub correct_index: usize,
    pub correct: bool,
    pub score: u32,
    pub attempted: u32,
}

/// Result of asking the source for the next question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionFetch {
    Loaded(Question),
    /// Call [`SessionController::retry_question`] after `delay`.
    RetryAfter { attempt: u32, delay: Duration },
    Unavailable,
    /// The session stopped running while the fetch was pending.
    Abandoned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Running { time_remaining: u32 },
    /// Time ran out on this tick; carries the run unless it was already handed out.
    Ended(Option<FinishedRun>),
    /// The controller is not running, nothing changed.
    Inactive,
}

//
// ─── CONTROLLER ────────────────────────────────────────────────────────────────
//

/// Per-game state machine: `Idle → Running → Ended`, or `Unavailable` when the
/// question source gives up.
///
/// The controller owns the [`Session`] and never sleeps; callers drive it with
/// ticks, answers and the follow-up calls named in each returned value.
pub struct SessionController {
    source: Arc<dyn QuestionSource>,
    retry: RetryPolicy,
    session_secs: u32,
    phase: SessionPhase,
    session: Session,
    tier: GradeTier,
    run_id: Option<RunId>,
    input_locked: bool,
    failures: u32,
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("phase", &self.phase)
            .field("tier", &self.tier)
            .field("run_id", &self.run_id)
            .field("session", &self.session)
            .field("input_locked", &self.input_locked)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    #[must_use]
    pub fn new(source: Arc<dyn QuestionSource>, settings: &QuizSettings) -> Self {
        Self {
            source,
            retry: RetryPolicy::from_settings(settings),
            session_secs: settings.session_secs(),
            phase: SessionPhase::Idle,
            session: Session::new(settings.session_secs()),
            tier: GradeTier::default(),
            run_id: None,
            input_locked: false,
            failures: 0,
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn tier(&self) -> GradeTier {
        self.tier
    }

    #[must_use]
    pub fn run_id(&self) -> Option<RunId> {
        self.run_id
    }

    #[must_use]
    pub fn is_input_locked(&self) -> bool {
        self.input_locked
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    /// Resets the session for a new game and requests the first question.
    pub fn start(&mut self, tier: GradeTier) -> QuestionFetch {
        let run_id = RunId::new();
        self.session = Session::new(self.session_secs);
        self.phase = SessionPhase::Running;
        self.tier = tier;
        self.run_id = Some(run_id);
        self.input_locked = false;
        self.failures = 0;
        info!(%run_id, %tier, secs = self.session_secs, "session started");
        self.fetch_question()
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != SessionPhase::Running {
            return TickOutcome::Inactive;
        }
        match self.session.tick() {
            0 => TickOutcome::Ended(self.end()),
            time_remaining => TickOutcome::Running { time_remaining },
        }
    }

    /// Scores an answer for the loaded question and locks input until
    /// [`complete_feedback`](Self::complete_feedback).
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session is not running, input is locked,
    /// the index is out of range, or no question is loaded.
    pub fn submit_answer(&mut self, index: usize) -> Result<AnswerFeedback, SessionError> {
        if self.phase != SessionPhase::Running {
            return Err(SessionError::NotRunning);
        }
        if self.input_locked {
            return Err(SessionError::InputLocked);
        }
        if index >= OPTION_COUNT {
            return Err(SessionError::OptionOutOfRange { index });
        }
        let correct_index = self
            .session
            .current_question()
            .map(Question::correct_index)
            .ok_or(SessionError::NoQuestion)?;
        let correct = self
            .session
            .record_answer(index)
            .ok_or(SessionError::NoQuestion)?;
        self.input_locked = true;

        debug!(index, correct, score = self.session.score(), "answer scored");
        Ok(AnswerFeedback {
            chosen: index,
            correct_index,
            correct,
            score: self.session.score(),
            attempted: self.session.attempted(),
        })
    }

    /// Ends the grace window after an answer and moves to the next question.
    ///
    /// Returns `Abandoned` if the session ended meanwhile or no answer was pending.
    pub fn complete_feedback(&mut self) -> QuestionFetch {
        if self.phase != SessionPhase::Running || !self.input_locked {
            return QuestionFetch::Abandoned;
        }
        self.session.clear_question();
        self.input_locked = false;
        self.fetch_question()
    }

    /// Retries a fetch that returned [`QuestionFetch::RetryAfter`].
    pub fn retry_question(&mut self) -> QuestionFetch {
        if self.phase != SessionPhase::Running || self.session.current_question().is_some() {
            return QuestionFetch::Abandoned;
        }
        self.fetch_question()
    }

    /// Ends a running session. Returns the finished run the first time only;
    /// later calls, and calls in any other phase, return `None`.
    pub fn end(&mut self) -> Option<FinishedRun> {
        if self.phase != SessionPhase::Running || !self.session.mark_ended() {
            return None;
        }
        self.phase = SessionPhase::Ended;
        self.input_locked = false;
        self.session.clear_question();

        let run_id = self.run_id?;
        let result = self.session.result();
        info!(
            %run_id,
            score = result.score(),
            attempted = result.attempted(),
            percentage = result.percentage(),
            "session ended"
        );
        Some(FinishedRun {
            run_id,
            tier: self.tier,
            result,
        })
    }

    fn fetch_question(&mut self) -> QuestionFetch {
        match self.source.next_question(self.tier) {
            Ok(question) => {
                self.failures = 0;
                self.session.set_question(question.clone());
                QuestionFetch::Loaded(question)
            }
            Err(err) => {
                self.failures = self.failures.saturating_add(1);
                if self.retry.allows(self.failures) {
                    debug!(attempt = self.failures, error = %err, "question source not ready");
                    return QuestionFetch::RetryAfter {
                        attempt: self.failures,
                        delay: self.retry.backoff(),
                    };
                }
                warn!(attempts = self.failures, "question source unavailable, stopping session");
                self.phase = SessionPhase::Unavailable;
                QuestionFetch::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::source::SourceUnavailable;
    use quiz_core::QuestionGenerator;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn question() -> Question {
        Question::new(
            "23 + 48 = ?",
            ["74", "71", "68", "81"].map(str::to_string),
            1,
        )
        .unwrap()
    }

    /// Fails `failures` times, then serves the fixed question forever.
    struct Flaky {
        failures: AtomicU32,
    }

    impl QuestionSource for Flaky {
        fn next_question(&self, _tier: GradeTier) -> Result<Question, SourceUnavailable> {
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(SourceUnavailable);
            }
            Ok(question())
        }
    }

    fn controller_with(failures: u32) -> SessionController {
        SessionController::new(
            Arc::new(Flaky {
                failures: AtomicU32::new(failures),
            }),
            &QuizSettings::default(),
        )
    }

    #[test]
    fn start_loads_a_question_and_resets_state() {
        let mut ctl = SessionController::new(Arc::new(QuestionGenerator::new()), &QuizSettings::default());
        assert_eq!(ctl.phase(), SessionPhase::Idle);
        assert_eq!(ctl.tick(), TickOutcome::Inactive);

        assert!(matches!(ctl.start(GradeTier::Four), QuestionFetch::Loaded(_)));
        assert_eq!(ctl.phase(), SessionPhase::Running);
        assert_eq!(ctl.session().time_remaining(), 60);
        assert_eq!(ctl.session().score(), 0);
        assert!(ctl.current_question().is_some());
        assert!(ctl.run_id().is_some());
    }

    #[test]
    fn fifty_nine_ticks_keep_running_and_sixty_end() {
        let mut ctl = controller_with(0);
        ctl.start(GradeTier::Six);
        for expected in (1..60).rev() {
            assert_eq!(
                ctl.tick(),
                TickOutcome::Running {
                    time_remaining: expected
                }
            );
        }
        assert_eq!(ctl.phase(), SessionPhase::Running);

        let TickOutcome::Ended(Some(run)) = ctl.tick() else {
            panic!("sixtieth tick should end the session");
        };
        assert_eq!(ctl.phase(), SessionPhase::Ended);
        assert_eq!(ctl.session().time_remaining(), 0);
        assert_eq!(run.result.attempted(), 0);
        assert_eq!(run.result.percentage(), 0);
        assert_eq!(ctl.tick(), TickOutcome::Inactive);
    }

    #[test]
    fn answers_score_and_lock_until_feedback_completes() {
        let mut ctl = controller_with(0);
        ctl.start(GradeTier::Four);

        let feedback = ctl.submit_answer(1).unwrap();
        assert!(feedback.correct);
        assert_eq!((feedback.score, feedback.attempted), (1, 1));
        assert_eq!(ctl.submit_answer(0), Err(SessionError::InputLocked));

        assert!(matches!(ctl.complete_feedback(), QuestionFetch::Loaded(_)));
        let feedback = ctl.submit_answer(0).unwrap();
        assert!(!feedback.correct);
        assert_eq!(feedback.correct_index, 1);
        assert_eq!((feedback.score, feedback.attempted), (1, 2));
    }

    #[test]
    fn out_of_range_answers_are_rejected_without_counting() {
        let mut ctl = controller_with(0);
        ctl.start(GradeTier::Four);
        assert_eq!(
            ctl.submit_answer(4),
            Err(SessionError::OptionOutOfRange { index: 4 })
        );
        assert_eq!(ctl.session().attempted(), 0);
    }

    #[test]
    fn end_hands_out_the_run_once() {
        let mut ctl = controller_with(0);
        ctl.start(GradeTier::Seven);
        for _ in 0..10 {
            ctl.submit_answer(if ctl.session().attempted() < 7 { 1 } else { 0 })
                .unwrap();
            ctl.complete_feedback();
        }

        let run = ctl.end().unwrap();
        assert_eq!(run.tier, GradeTier::Seven);
        assert_eq!(run.result.score(), 7);
        assert_eq!(run.result.attempted(), 10);
        assert_eq!(run.result.percentage(), 70);
        assert_eq!(ctl.end(), None);
        assert_eq!(ctl.tick(), TickOutcome::Inactive);
        assert_eq!(ctl.submit_answer(1), Err(SessionError::NotRunning));
    }

    #[test]
    fn timeout_during_grace_abandons_the_next_question() {
        let settings = QuizSettings::default().with_session_secs(1).unwrap();
        let mut ctl = SessionController::new(
            Arc::new(Flaky {
                failures: AtomicU32::new(0),
            }),
            &settings,
        );
        ctl.start(GradeTier::Five);
        ctl.submit_answer(1).unwrap();
        assert!(matches!(ctl.tick(), TickOutcome::Ended(Some(_))));
        assert_eq!(ctl.complete_feedback(), QuestionFetch::Abandoned);
        assert_eq!(ctl.session().attempted(), 1);
    }

    #[test]
    fn restart_issues_a_new_run_id() {
        let mut ctl = controller_with(0);
        ctl.start(GradeTier::Four);
        let first = ctl.end().unwrap().run_id;
        ctl.start(GradeTier::Four);
        assert_eq!(ctl.phase(), SessionPhase::Running);
        assert_ne!(ctl.run_id(), Some(first));
    }

    #[test]
    fn source_failures_retry_then_recover() {
        let mut ctl = controller_with(2);
        assert_eq!(
            ctl.start(GradeTier::Eight),
            QuestionFetch::RetryAfter {
                attempt: 1,
                delay: Duration::from_millis(50)
            }
        );
        assert!(matches!(
            ctl.retry_question(),
            QuestionFetch::RetryAfter { attempt: 2, .. }
        ));
        assert!(matches!(ctl.retry_question(), QuestionFetch::Loaded(_)));
        assert_eq!(ctl.phase(), SessionPhase::Running);
    }

    #[test]
    fn exhausted_retries_make_the_session_unavailable() {
        let mut ctl = controller_with(u32::MAX)
            .with_retry_policy(RetryPolicy::new(Duration::from_millis(5), 3));
        let mut fetch = ctl.start(GradeTier::Four);
        let mut retries = 0;
        while let QuestionFetch::RetryAfter { .. } = fetch {
            retries += 1;
            fetch = ctl.retry_question();
        }
        assert_eq!(retries, 3);
        assert_eq!(fetch, QuestionFetch::Unavailable);
        assert_eq!(ctl.phase(), SessionPhase::Unavailable);
        assert_eq!(ctl.tick(), TickOutcome::Inactive);
        assert_eq!(ctl.end(), None);
        assert_eq!(ctl.session().time_remaining(), 60);
    }
}
