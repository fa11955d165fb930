//! Typed records kept in the learner's local key/value storage.

use std::sync::Arc;

use quiz_core::model::{GradeTier, LastSession, LocalStats};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::repository::{KeyValueStore, StorageError};

pub const STATS_KEY: &str = "quizStats";
pub const LAST_SESSION_KEY: &str = "quiz_lastSession";
pub const GRADE_KEY: &str = "quiz_currentGrade";

/// JSON-encoded records over a [`KeyValueStore`].
///
/// A record that fails to parse is logged and reported as absent, so corrupted
/// local storage degrades to the zero-valued defaults.
#[derive(Clone)]
pub struct LocalRecords {
    store: Arc<dyn KeyValueStore>,
}

impl LocalRecords {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn local_stats(&self) -> Result<Option<LocalStats>, StorageError> {
        self.read_json(STATS_KEY).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be encoded or stored.
    pub async fn save_local_stats(&self, stats: &LocalStats) -> Result<(), StorageError> {
        self.write_json(STATS_KEY, stats).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be encoded or stored.
    pub async fn put_last_session(&self, last: &LastSession) -> Result<(), StorageError> {
        self.write_json(LAST_SESSION_KEY, last).await
    }

    /// Reads the last-session record and removes it, so it is seen once.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or written.
    pub async fn take_last_session(&self) -> Result<Option<LastSession>, StorageError> {
        let last = self.read_json(LAST_SESSION_KEY).await?;
        self.store.remove(LAST_SESSION_KEY).await?;
        Ok(last)
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    pub async fn selected_grade(&self) -> Result<Option<GradeTier>, StorageError> {
        Ok(self
            .store
            .get(GRADE_KEY)
            .await?
            .map(|raw| GradeTier::parse_lenient(&raw)))
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    pub async fn save_grade(&self, tier: GradeTier) -> Result<(), StorageError> {
        self.store
            .set(GRADE_KEY, &tier.number().to_string())
            .await
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!(key, error = %err, "malformed local record, treating as absent");
                Ok(None)
            }
        }
    }

    async fn write_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store.set(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;
    use quiz_core::model::SessionResult;

    fn records() -> (InMemoryRepository, LocalRecords) {
        let repo = InMemoryRepository::new();
        let records = LocalRecords::new(Arc::new(repo.clone()));
        (repo, records)
    }

    #[tokio::test]
    async fn stats_round_trip_under_the_fixed_key() {
        let (repo, records) = records();
        let stats = LocalStats::default().record(70);
        records.save_local_stats(&stats).await.unwrap();

        assert_eq!(records.local_stats().await.unwrap(), Some(stats));
        let raw = repo.get(STATS_KEY).await.unwrap().unwrap();
        assert!(raw.contains("\"gamesPlayed\":1"));
    }

    #[tokio::test]
    async fn malformed_stats_read_as_absent() {
        let (repo, records) = records();
        repo.set(STATS_KEY, "{not json").await.unwrap();
        assert_eq!(records.local_stats().await.unwrap(), None);
    }

    #[tokio::test]
    async fn last_session_is_read_once() {
        let (_, records) = records();
        let last = LastSession::from(SessionResult::from_counts(7, 10));
        records.put_last_session(&last).await.unwrap();

        assert_eq!(records.take_last_session().await.unwrap(), Some(last));
        assert_eq!(records.take_last_session().await.unwrap(), None);
    }

    #[tokio::test]
    async fn grade_choice_persists_and_tolerates_junk() {
        let (repo, records) = records();
        assert_eq!(records.selected_grade().await.unwrap(), None);
        records.save_grade(GradeTier::Six).await.unwrap();
        assert_eq!(records.selected_grade().await.unwrap(), Some(GradeTier::Six));

        repo.set(GRADE_KEY, "banana").await.unwrap();
        assert_eq!(records.selected_grade().await.unwrap(), Some(GradeTier::Eight));
    }
}
