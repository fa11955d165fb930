use std::sync::Arc;

use quiz_core::model::{Identity, QuizSettings};
use quiz_core::{Clock, QuestionGenerator};
use storage::{LocalRecords, Storage};
use tracing::info;

use crate::error::AppServicesError;
use crate::leaderboard::LeaderboardService;
use crate::players::PlayerService;
use crate::sessions::{QuestionSource, SessionController, SessionRunner};
use crate::stats::StatsAggregator;

/// Assembles app-facing services over a local store and a shared remote store.
///
/// Local records and commit markers live in the local store; player documents
/// live in the remote one. Both may be the same backend.
#[derive(Clone)]
pub struct AppServices {
    settings: QuizSettings,
    source: Arc<dyn QuestionSource>,
    stats: Arc<StatsAggregator>,
    players: Arc<PlayerService>,
    leaderboard: Arc<LeaderboardService>,
}

impl AppServices {
    #[must_use]
    pub fn new(local: &Storage, remote: &Storage, settings: QuizSettings) -> Self {
        let records = LocalRecords::new(Arc::clone(&local.values));
        let attempts = settings.remote_transaction_attempts();

        let stats = Arc::new(StatsAggregator::new(
            records.clone(),
            Arc::clone(&local.commits),
            Arc::clone(&remote.players),
            attempts,
        ));
        let players = Arc::new(PlayerService::new(
            Arc::clone(&remote.players),
            records,
            attempts,
        ));
        let leaderboard = Arc::new(LeaderboardService::new(
            Arc::clone(&remote.players),
            settings.leaderboard_size(),
        ));

        Self {
            settings,
            source: Arc::new(QuestionGenerator::new()),
            stats,
            players,
            leaderboard,
        }
    }

    /// Services over throwaway in-memory stores.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: QuizSettings) -> Self {
        let storage = Storage::in_memory_with_clock(clock);
        Self::new(&storage, &storage, settings)
    }

    /// Build services backed by `SQLite` storage.
    ///
    /// The remote store defaults to the local database when no separate URL
    /// is given.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if either database cannot be opened or migrated.
    pub async fn new_sqlite(
        db_url: &str,
        remote_db_url: Option<&str>,
        clock: Clock,
        settings: QuizSettings,
    ) -> Result<Self, AppServicesError> {
        let local = Storage::sqlite_with_clock(db_url, clock).await?;
        let remote = match remote_db_url {
            Some(url) if url != db_url => Storage::sqlite_with_clock(url, clock).await?,
            _ => local.clone(),
        };
        info!(db_url, remote = remote_db_url.unwrap_or(db_url), "storage ready");
        Ok(Self::new(&local, &remote, settings))
    }

    /// Replaces the question generator, e.g. with a seeded source.
    #[must_use]
    pub fn with_source(mut self, source: Arc<dyn QuestionSource>) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    #[must_use]
    pub fn stats(&self) -> Arc<StatsAggregator> {
        Arc::clone(&self.stats)
    }

    #[must_use]
    pub fn players(&self) -> Arc<PlayerService> {
        Arc::clone(&self.players)
    }

    #[must_use]
    pub fn leaderboard(&self) -> Arc<LeaderboardService> {
        Arc::clone(&self.leaderboard)
    }

    #[must_use]
    pub fn session_controller(&self) -> SessionController {
        SessionController::new(Arc::clone(&self.source), &self.settings)
    }

    /// A runner that records its run for `identity` (local only when `None`).
    #[must_use]
    pub fn session_runner(&self, identity: Option<Identity>) -> SessionRunner {
        SessionRunner::new(self.session_controller(), &self.settings)
            .with_stats(self.stats(), identity)
    }
}
