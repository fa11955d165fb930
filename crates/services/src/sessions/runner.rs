use std::sync::Arc;
use std::time::Duration;

use quiz_core::model::{FinishedRun, GradeTier, Identity, Question, QuizSettings, SessionResult};
use tokio::sync::mpsc;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::controller::{AnswerFeedback, QuestionFetch, SessionController, TickOutcome};
use crate::error::SessionError;
use crate::stats::{FinishReport, StatsAggregator};

const TICK: Duration = Duration::from_secs(1);

/// Input from the player while a session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    Answer(usize),
    End,
}

/// Everything the display side needs to render a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Question(Question),
    Tick { time_remaining: u32 },
    Feedback(AnswerFeedback),
    Rejected(SessionError),
    Ended { result: SessionResult, time_remaining: u32 },
    Recorded(FinishReport),
    Unavailable,
}

#[derive(Debug, Clone, Copy)]
enum Pending {
    Feedback,
    Retry,
}

/// Drives a [`SessionController`] on one timeline: a 1 Hz tick, the player's
/// commands and the one-shot grace/backoff delays.
///
/// When the session ends the run is recorded locally, `Ended` goes out and
/// `run` returns. The remote commit continues on its own task and is reported
/// as `Recorded` through the same event channel, so the channel closes only
/// after it settles.
pub struct SessionRunner {
    controller: SessionController,
    feedback_grace: Duration,
    stats: Option<Arc<StatsAggregator>>,
    identity: Option<Identity>,
}

impl SessionRunner {
    #[must_use]
    pub fn new(controller: SessionController, settings: &QuizSettings) -> Self {
        Self {
            controller,
            feedback_grace: settings.feedback_grace(),
            stats: None,
            identity: None,
        }
    }

    /// Records finished runs through `stats`, committing remotely for `identity`.
    #[must_use]
    pub fn with_stats(mut self, stats: Arc<StatsAggregator>, identity: Option<Identity>) -> Self {
        self.stats = Some(stats);
        self.identity = identity;
        self
    }

    /// Runs one session to completion.
    ///
    /// The session ends when time runs out, on [`SessionCommand::End`], or
    /// when the command channel closes.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SourceUnavailable` if no question could be
    /// fetched within the retry policy; the countdown stops at that point.
    pub async fn run(
        mut self,
        tier: GradeTier,
        mut commands: mpsc::Receiver<SessionCommand>,
        events: mpsc::Sender<SessionEvent>,
    ) -> Result<Option<FinishedRun>, SessionError> {
        let mut pending = None;
        let first = self.controller.start(tier);
        if !self.on_fetch(first, &mut pending, &events).await {
            return Err(SessionError::SourceUnavailable);
        }

        let mut ticker = time::interval_at(Instant::now() + TICK, TICK);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let deadline = pending.map(|(at, _)| at);
            tokio::select! {
                biased;

                _ = ticker.tick() => match self.controller.tick() {
                    TickOutcome::Running { time_remaining } => {
                        emit(&events, SessionEvent::Tick { time_remaining }).await;
                    }
                    TickOutcome::Ended(run) => return Ok(self.finish(run, &events).await),
                    TickOutcome::Inactive => return Ok(None),
                },

                command = commands.recv() => match command {
                    Some(SessionCommand::Answer(index)) => {
                        match self.controller.submit_answer(index) {
                            Ok(feedback) => {
                                emit(&events, SessionEvent::Feedback(feedback)).await;
                                pending = Some((Instant::now() + self.feedback_grace, Pending::Feedback));
                            }
                            Err(err) => {
                                debug!(index, error = %err, "answer rejected");
                                emit(&events, SessionEvent::Rejected(err)).await;
                            }
                        }
                    }
                    Some(SessionCommand::End) | None => {
                        let run = self.controller.end();
                        return Ok(self.finish(run, &events).await);
                    }
                },

                () = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    let fetch = match pending.take() {
                        Some((_, Pending::Feedback)) => self.controller.complete_feedback(),
                        Some((_, Pending::Retry)) => self.controller.retry_question(),
                        None => continue,
                    };
                    if !self.on_fetch(fetch, &mut pending, &events).await {
                        return Err(SessionError::SourceUnavailable);
                    }
                }
            }
        }
    }

    /// Publishes a fetch result; returns `false` once the source gave up.
    async fn on_fetch(
        &self,
        fetch: QuestionFetch,
        pending: &mut Option<(Instant, Pending)>,
        events: &mpsc::Sender<SessionEvent>,
    ) -> bool {
        match fetch {
            QuestionFetch::Loaded(question) => {
                emit(events, SessionEvent::Question(question)).await;
            }
            QuestionFetch::RetryAfter { delay, .. } => {
                *pending = Some((Instant::now() + delay, Pending::Retry));
            }
            QuestionFetch::Unavailable => {
                emit(events, SessionEvent::Unavailable).await;
                return false;
            }
            QuestionFetch::Abandoned => {}
        }
        true
    }

    async fn finish(
        &self,
        run: Option<FinishedRun>,
        events: &mpsc::Sender<SessionEvent>,
    ) -> Option<FinishedRun> {
        let run = run?;
        let local = match &self.stats {
            Some(stats) => match stats.record_finished(&run).await {
                Ok(local) => Some(local),
                Err(err) => {
                    warn!(run_id = %run.run_id, error = %err, "could not record run");
                    None
                }
            },
            None => None,
        };

        emit(
            events,
            SessionEvent::Ended {
                result: run.result,
                time_remaining: self.controller.session().time_remaining(),
            },
        )
        .await;

        if let (Some(stats), Some(local)) = (&self.stats, local) {
            let stats = Arc::clone(stats);
            let identity = self.identity.clone();
            let events = events.clone();
            tokio::spawn(async move {
                let remote = stats.settle_remote(&run, identity.as_ref()).await;
                let report = FinishReport {
                    result: run.result,
                    local,
                    remote,
                };
                emit(&events, SessionEvent::Recorded(report)).await;
            });
        }
        Some(run)
    }
}

async fn emit(events: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    if events.send(event).await.is_err() {
        debug!("session event receiver dropped");
    }
}
