use std::sync::Arc;

use quiz_core::model::{
    FinishedRun, Identity, LastSession, LocalStats, PlayerId, RemoteStats, SessionResult,
};
use serde::Serialize;
use storage::LocalRecords;
use storage::repository::{
    CommitMarkerRepository, PlayerWrite, RemoteStatsRepository, transact_player,
};
use tracing::{debug, info, warn};

use crate::error::StatsError;

/// What happened to a run on the remote path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RemoteOutcome {
    /// No signed-in identity; only the local path ran.
    Anonymous,
    /// Nothing was attempted, so there is nothing to add.
    EmptyRun,
    /// This run id was committed before.
    AlreadyCommitted,
    Committed { stats: RemoteStats },
    /// The commit failed; the run can be retried because it was not marked.
    Failed { reason: String },
}

/// Everything recorded for one finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishReport {
    pub result: SessionResult,
    pub local: LocalStats,
    pub remote: RemoteOutcome,
}

/// Folds finished runs into the local running average and, for signed-in
/// players, into the shared per-player aggregate.
///
/// The remote path runs at most once per run id: a commit marker is checked
/// before the transaction and set after it.
#[derive(Clone)]
pub struct StatsAggregator {
    local: LocalRecords,
    commits: Arc<dyn CommitMarkerRepository>,
    players: Arc<dyn RemoteStatsRepository>,
    transaction_attempts: u32,
}

impl StatsAggregator {
    #[must_use]
    pub fn new(
        local: LocalRecords,
        commits: Arc<dyn CommitMarkerRepository>,
        players: Arc<dyn RemoteStatsRepository>,
        transaction_attempts: u32,
    ) -> Self {
        Self {
            local,
            commits,
            players,
            transaction_attempts,
        }
    }

    /// Current local aggregate, zero-valued when none exists or it is unreadable.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` if local storage cannot be read.
    pub async fn local_stats(&self) -> Result<LocalStats, StatsError> {
        Ok(self.local.local_stats().await?.unwrap_or_default())
    }

    /// Adds one game's percentage to the local running average.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` if local storage cannot be read or written.
    pub async fn record_local(&self, result: &SessionResult) -> Result<LocalStats, StatsError> {
        let next = self.local_stats().await?.record(result.percentage());
        self.local.save_local_stats(&next).await?;
        debug!(
            games = next.games_played,
            average = next.average,
            "local stats updated"
        );
        Ok(next)
    }

    /// Commits a run to the player's shared aggregate, once per run id.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` if the marker cannot be read or written, or the
    /// transaction fails (including running out of conflict retries).
    pub async fn commit_remote(
        &self,
        run: &FinishedRun,
        identity: &Identity,
    ) -> Result<RemoteOutcome, StatsError> {
        if run.result.attempted() == 0 {
            debug!(run_id = %run.run_id, "empty run, skipping remote commit");
            return Ok(RemoteOutcome::EmptyRun);
        }
        if self.commits.is_committed(run.run_id).await? {
            info!(run_id = %run.run_id, "run already committed, skipping");
            return Ok(RemoteOutcome::AlreadyCommitted);
        }

        let result = run.result;
        let committed = transact_player(
            self.players.as_ref(),
            &identity.player_id,
            self.transaction_attempts,
            |current| PlayerWrite {
                username: identity.resolve_username(current.map(|p| p.username.as_str())),
                stats: current
                    .map(|p| p.stats)
                    .unwrap_or_default()
                    .apply_run(&result),
                touch_login: false,
                touch_played: true,
            },
        )
        .await?;
        self.commits.mark_committed(run.run_id).await?;

        info!(
            run_id = %run.run_id,
            player = %identity.player_id,
            games = committed.stats.games_played,
            "remote stats committed"
        );
        Ok(RemoteOutcome::Committed {
            stats: committed.stats,
        })
    }

    /// The local half of finishing a run: the running average and the
    /// read-once last-session record.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` if local storage cannot be read or written.
    pub async fn record_finished(&self, run: &FinishedRun) -> Result<LocalStats, StatsError> {
        let local = self.record_local(&run.result).await?;
        self.local
            .put_last_session(&LastSession::from(run.result))
            .await?;
        Ok(local)
    }

    /// The remote half of finishing a run. Failures are reported in the
    /// outcome; the run stays unmarked so it can be committed again later.
    pub async fn settle_remote(
        &self,
        run: &FinishedRun,
        identity: Option<&Identity>,
    ) -> RemoteOutcome {
        let Some(identity) = identity else {
            return RemoteOutcome::Anonymous;
        };
        match self.commit_remote(run, identity).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(run_id = %run.run_id, error = %err, "remote commit failed");
                RemoteOutcome::Failed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Records a finished run: local average, the read-once last-session
    /// record, then the remote aggregate when someone is signed in.
    ///
    /// A remote failure is reported in the outcome and leaves the local
    /// update in place.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` only for local storage failures.
    pub async fn finish_run(
        &self,
        run: &FinishedRun,
        identity: Option<&Identity>,
    ) -> Result<FinishReport, StatsError> {
        let local = self.record_finished(run).await?;
        let remote = self.settle_remote(run, identity).await;
        Ok(FinishReport {
            result: run.result,
            local,
            remote,
        })
    }

    /// The player's shared aggregate, zero-valued when they have none yet.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` if the remote store cannot be read.
    pub async fn remote_stats(&self, player: &PlayerId) -> Result<RemoteStats, StatsError> {
        Ok(self
            .players
            .fetch_player(player)
            .await?
            .map(|v| v.value.stats)
            .unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `StatsError` if local storage cannot be read or written.
    pub async fn take_last_session(&self) -> Result<Option<LastSession>, StatsError> {
        Ok(self.local.take_last_session().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use quiz_core::model::{GradeTier, RunId};
    use storage::Storage;
    use storage::repository::{PlayerRecord, StorageError, Versioned};

    fn aggregator(storage: &Storage) -> StatsAggregator {
        StatsAggregator::new(
            LocalRecords::new(Arc::clone(&storage.values)),
            Arc::clone(&storage.commits),
            Arc::clone(&storage.players),
            5,
        )
    }

    fn run(score: u32, attempted: u32) -> FinishedRun {
        FinishedRun {
            run_id: RunId::new(),
            tier: GradeTier::Six,
            result: SessionResult::from_counts(score, attempted),
        }
    }

    fn ana() -> Identity {
        Identity::new(PlayerId::new("ana").unwrap()).with_email("ana@example.com")
    }

    #[tokio::test]
    async fn first_game_sets_local_average() {
        let storage = Storage::in_memory();
        let stats = aggregator(&storage);
        assert_eq!(stats.local_stats().await.unwrap(), LocalStats::default());

        let report = stats.finish_run(&run(7, 10), None).await.unwrap();
        assert_eq!(report.result.percentage(), 70);
        assert_eq!(report.local.average, 70);
        assert_eq!(report.remote, RemoteOutcome::Anonymous);

        let last = stats.take_last_session().await.unwrap().unwrap();
        assert_eq!((last.score, last.attempted, last.percentage), (7, 10, 70));
        assert_eq!(stats.take_last_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn remote_commit_is_once_per_run() {
        let storage = Storage::in_memory();
        let stats = aggregator(&storage);
        let finished = run(7, 10);
        let identity = ana();

        let first = stats.commit_remote(&finished, &identity).await.unwrap();
        assert!(matches!(first, RemoteOutcome::Committed { .. }));
        let again = stats.commit_remote(&finished, &identity).await.unwrap();
        assert_eq!(again, RemoteOutcome::AlreadyCommitted);

        let remote = stats.remote_stats(&identity.player_id).await.unwrap();
        assert_eq!(remote.games_played, 1);
        assert_eq!(remote.total_correct, 7);
    }

    #[tokio::test]
    async fn empty_runs_stay_local() {
        let storage = Storage::in_memory();
        let stats = aggregator(&storage);
        let identity = ana();

        let report = stats.finish_run(&run(0, 0), Some(&identity)).await.unwrap();
        assert_eq!(report.remote, RemoteOutcome::EmptyRun);
        assert_eq!(report.local.games_played, 1);
        assert_eq!(report.local.average, 0);
        assert_eq!(
            stats.remote_stats(&identity.player_id).await.unwrap(),
            RemoteStats::default()
        );
    }

    #[tokio::test]
    async fn username_comes_from_the_identity_once() {
        let storage = Storage::in_memory();
        let stats = aggregator(&storage);

        stats.commit_remote(&run(3, 4), &ana()).await.unwrap();
        let renamed = ana().with_display_name("Ana Banana");
        stats.commit_remote(&run(4, 4), &renamed).await.unwrap();

        let doc = storage
            .players
            .fetch_player(&renamed.player_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.value.username, "ana");
        assert_eq!(doc.value.stats.games_played, 2);
    }

    #[test]
    fn remote_outcome_is_tagged_by_status() {
        let json = serde_json::to_value(RemoteOutcome::AlreadyCommitted).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "already_committed" }));
        let json = serde_json::to_value(RemoteOutcome::Failed {
            reason: "offline".into(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "status": "failed", "reason": "offline" })
        );
    }

    /// Rejects the first `outages` writes as if the network were down.
    struct Unreachable {
        inner: Arc<dyn RemoteStatsRepository>,
        outages: Mutex<u32>,
    }

    #[async_trait]
    impl RemoteStatsRepository for Unreachable {
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
            {
                let mut outages = self.outages.lock().unwrap();
                if *outages > 0 {
                    *outages -= 1;
                    return Err(StorageError::Connection("offline".into()));
                }
            }
            self.inner.write_player(player, expected_version, write).await
        }

        async fn list_players(&self, limit: u32) -> Result<Vec<PlayerRecord>, StorageError> {
            self.inner.list_players(limit).await
        }
    }

    #[tokio::test]
    async fn failed_remote_commit_can_be_retried_once() {
        let storage = Storage::in_memory();
        let stats = StatsAggregator::new(
            LocalRecords::new(Arc::clone(&storage.values)),
            Arc::clone(&storage.commits),
            Arc::new(Unreachable {
                inner: Arc::clone(&storage.players),
                outages: Mutex::new(1),
            }),
            5,
        );
        let finished = run(7, 10);
        let identity = ana();

        let report = stats.finish_run(&finished, Some(&identity)).await.unwrap();
        assert!(matches!(report.remote, RemoteOutcome::Failed { .. }));
        assert_eq!(report.local.games_played, 1);
        assert!(!storage.commits.is_committed(finished.run_id).await.unwrap());
        assert_eq!(
            stats.remote_stats(&identity.player_id).await.unwrap(),
            RemoteStats::default()
        );

        let retried = stats.commit_remote(&finished, &identity).await.unwrap();
        let RemoteOutcome::Committed { stats: committed } = retried else {
            panic!("expected a commit, got {retried:?}");
        };
        assert_eq!(committed.games_played, 1);
        assert!(storage.commits.is_committed(finished.run_id).await.unwrap());
        assert_eq!(
            stats.commit_remote(&finished, &identity).await.unwrap(),
            RemoteOutcome::AlreadyCommitted
        );
        assert_eq!(stats.local_stats().await.unwrap().games_played, 1);
    }
}
