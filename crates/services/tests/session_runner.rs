use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use quiz_core::model::{GradeTier, Identity, PlayerId, Question, QuizSettings};
use quiz_core::time::fixed_clock;
use services::sessions::SourceUnavailable;
use services::{
    AppServices, QuestionSource, RemoteOutcome, SeededSource, SessionCommand, SessionError,
    SessionEvent,
};
use storage::Storage;
use storage::repository::{
    CommitMarkerRepository, PlayerRecord, PlayerWrite, RemoteStatsRepository, StorageError,
    Versioned,
};
use tokio::sync::mpsc;
use tokio::time::Instant;

fn services() -> AppServices {
    AppServices::in_memory(fixed_clock(), QuizSettings::default())
        .with_source(Arc::new(SeededSource::new(7)))
}

#[tokio::test(start_paused = true)]
async fn untouched_session_counts_down_and_ends_at_zero() {
    let services = services();
    let (_commands, command_rx) = mpsc::channel(8);
    let (event_tx, mut events) = mpsc::channel(256);
    let handle = tokio::spawn(
        services
            .session_runner(None)
            .run(GradeTier::Four, command_rx, event_tx),
    );

    let mut ticks = Vec::new();
    let mut ended = Vec::new();
    let mut recorded = None;
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Tick { time_remaining } => ticks.push(time_remaining),
            SessionEvent::Ended {
                result,
                time_remaining,
            } => ended.push((result, time_remaining)),
            SessionEvent::Recorded(report) => recorded = Some(report),
            _ => {}
        }
    }

    let run = handle.await.unwrap().unwrap().unwrap();
    assert_eq!(ticks, (1..60).rev().collect::<Vec<u32>>());
    assert_eq!(ended.len(), 1);
    assert_eq!(ended[0].1, 0);
    assert_eq!(run.result.attempted(), 0);

    let report = recorded.expect("run recorded");
    assert_eq!(report.remote, RemoteOutcome::Anonymous);
    assert_eq!(report.local.games_played, 1);
}

#[tokio::test(start_paused = true)]
async fn answers_are_scored_and_committed_for_the_player() {
    let services = services();
    let identity = Identity::new(PlayerId::new("kid-1").unwrap()).with_display_name("Kim");
    let (commands, command_rx) = mpsc::channel(8);
    let (event_tx, mut events) = mpsc::channel(256);
    let handle = tokio::spawn(services.session_runner(Some(identity.clone())).run(
        GradeTier::Seven,
        command_rx,
        event_tx,
    ));

    let mut answered = 0;
    let mut recorded = None;
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Question(question) if answered < 10 => {
                let pick = if answered < 7 {
                    question.correct_index()
                } else {
                    (question.correct_index() + 1) % 4
                };
                answered += 1;
                commands.send(SessionCommand::Answer(pick)).await.unwrap();
            }
            SessionEvent::Question(_) => {
                commands.send(SessionCommand::End).await.unwrap();
            }
            SessionEvent::Recorded(report) => recorded = Some(report),
            _ => {}
        }
    }

    let run = handle.await.unwrap().unwrap().unwrap();
    assert_eq!(run.result.score(), 7);
    assert_eq!(run.result.attempted(), 10);
    assert_eq!(run.result.percentage(), 70);

    let report = recorded.expect("run recorded");
    assert_eq!(report.local.average, 70);
    let RemoteOutcome::Committed { stats } = report.remote else {
        panic!("expected a remote commit, got {:?}", report.remote);
    };
    assert_eq!(stats.games_played, 1);
    assert_eq!(
        services.stats().remote_stats(&identity.player_id).await.unwrap(),
        stats
    );
}

#[tokio::test(start_paused = true)]
async fn second_answer_during_grace_is_rejected() {
    let services = services();
    let (commands, command_rx) = mpsc::channel(8);
    let (event_tx, mut events) = mpsc::channel(256);
    let handle = tokio::spawn(
        services
            .session_runner(None)
            .run(GradeTier::Five, command_rx, event_tx),
    );

    let mut questions = 0;
    let mut rejected = Vec::new();
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Question(_) => {
                questions += 1;
                if questions == 1 {
                    commands.send(SessionCommand::Answer(0)).await.unwrap();
                    commands.send(SessionCommand::Answer(1)).await.unwrap();
                } else {
                    commands.send(SessionCommand::End).await.unwrap();
                }
            }
            SessionEvent::Rejected(err) => rejected.push(err),
            _ => {}
        }
    }

    let run = handle.await.unwrap().unwrap().unwrap();
    assert_eq!(rejected, vec![SessionError::InputLocked]);
    assert_eq!(run.result.attempted(), 1);
}

struct NeverReady;

impl QuestionSource for NeverReady {
    fn next_question(&self, _tier: GradeTier) -> Result<Question, SourceUnavailable> {
        Err(SourceUnavailable)
    }
}

#[tokio::test(start_paused = true)]
async fn unavailable_source_stops_the_session() {
    let settings = QuizSettings::new(
        60,
        Duration::from_millis(220),
        Duration::from_millis(50),
        3,
        5,
        100,
    )
    .unwrap();
    let services = AppServices::in_memory(fixed_clock(), settings).with_source(Arc::new(NeverReady));
    let (_commands, command_rx) = mpsc::channel(8);
    let (event_tx, mut events) = mpsc::channel(64);

    let started = tokio::time::Instant::now();
    let outcome = services
        .session_runner(None)
        .run(GradeTier::Eight, command_rx, event_tx)
        .await;

    assert_eq!(outcome, Err(SessionError::SourceUnavailable));
    // three 50 ms backoffs, well before the first tick
    let waited = started.elapsed();
    assert!(waited >= Duration::from_millis(150) && waited < Duration::from_secs(1));
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen, vec![SessionEvent::Unavailable]);
    assert_eq!(
        services.stats().local_stats().await.unwrap().games_played,
        0
    );
}

const REMOTE_LATENCY: Duration = Duration::from_secs(30);

/// A shared store on a very slow network.
struct Laggy {
    inner: Arc<dyn RemoteStatsRepository>,
}

#[async_trait]
impl RemoteStatsRepository for Laggy {
    async fn fetch_player(
        &self,
        player: &PlayerId,
    ) -> Result<Option<Versioned<PlayerRecord>>, StorageError> {
        self.inner.fetch_player(player).await
    }

    async fn write_player(
        &self,
        player: &PlayerId,
        expected_version: Option<u64>,
        write: &PlayerWrite,
    ) -> Result<u64, StorageError> {
        tokio::time::sleep(REMOTE_LATENCY).await;
        self.inner.write_player(player, expected_version, write).await
    }

    async fn list_players(&self, limit: u32) -> Result<Vec<PlayerRecord>, StorageError> {
        self.inner.list_players(limit).await
    }
}

#[tokio::test(start_paused = true)]
async fn session_returns_before_the_remote_commit_lands() {
    let local = Storage::in_memory_with_clock(fixed_clock());
    let shared = Storage::in_memory_with_clock(fixed_clock());
    let remote = Storage {
        players: Arc::new(Laggy {
            inner: Arc::clone(&shared.players),
        }),
        ..shared.clone()
    };
    let services = AppServices::new(&local, &remote, QuizSettings::default())
        .with_source(Arc::new(SeededSource::new(3)));
    let identity = Identity::new(PlayerId::new("kid-2").unwrap());

    let (commands, command_rx) = mpsc::channel(8);
    let (event_tx, mut events) = mpsc::channel(256);
    let started = Instant::now();
    let handle = tokio::spawn(services.session_runner(Some(identity.clone())).run(
        GradeTier::Six,
        command_rx,
        event_tx,
    ));

    let mut questions = 0;
    let mut ended_at = None;
    loop {
        match events.recv().await.expect("session ends before the channel closes") {
            SessionEvent::Question(question) => {
                questions += 1;
                let command = if questions == 1 {
                    SessionCommand::Answer(question.correct_index())
                } else {
                    SessionCommand::End
                };
                commands.send(command).await.unwrap();
            }
            SessionEvent::Ended { .. } => {
                ended_at = Some(started.elapsed());
                break;
            }
            _ => {}
        }
    }

    // the runner is done and the local side is already recorded
    let run = handle.await.unwrap().unwrap().unwrap();
    assert!(started.elapsed() < REMOTE_LATENCY);
    assert_eq!(services.stats().local_stats().await.unwrap().games_played, 1);
    assert_eq!(
        services.stats().remote_stats(&identity.player_id).await.unwrap().games_played,
        0
    );

    let mut remote_outcome = None;
    while let Some(event) = events.recv().await {
        if let SessionEvent::Recorded(report) = event {
            remote_outcome = Some(report.remote);
        }
    }
    assert!(matches!(remote_outcome, Some(RemoteOutcome::Committed { .. })));
    assert!(started.elapsed() >= REMOTE_LATENCY);
    assert!(ended_at.is_some_and(|at| at < REMOTE_LATENCY));
    assert!(local.commits.is_committed(run.run_id).await.unwrap());
}
