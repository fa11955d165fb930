use async_trait::async_trait;
use quiz_core::model::RunId;

use crate::repository::{CommitMarkerRepository, StorageError};

use super::SqliteRepository;
use super::mapping::conn;

#[async_trait]
impl CommitMarkerRepository for SqliteRepository {
    async fn is_committed(&self, run: RunId) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM run_commits WHERE run_id = ?1")
            .bind(run.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        Ok(row.is_some())
    }

    async fn mark_committed(&self, run: RunId) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO run_commits (run_id, committed_at)
            VALUES (?1, ?2)
            ON CONFLICT(run_id) DO NOTHING
            ",
        )
        .bind(run.to_string())
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }
}
