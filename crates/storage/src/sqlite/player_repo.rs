use async_trait::async_trait;
use quiz_core::model::PlayerId;
use tracing::debug;

use crate::repository::{
    PlayerRecord, PlayerWrite, RemoteStatsRepository, StorageError, Versioned, stamp_record,
};

use super::SqliteRepository;
use super::mapping::{conn, map_player_row, u64_to_i64, write_err};

const SELECT_PLAYER: &str = r"
    SELECT
        player_id, username, games_played, total_correct, total_attempted,
        avg_correct_per_game, avg_percent, created_at, last_login_at,
        last_played_at, version
    FROM players
";

#[async_trait]
impl RemoteStatsRepository for SqliteRepository {
    async fn fetch_player(
        &self,
        player: &PlayerId,
    ) -> Result<Option<Versioned<PlayerRecord>>, StorageError> {
        let row = sqlx::query(&format!("{SELECT_PLAYER} WHERE player_id = ?1"))
            .bind(player.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_player_row).transpose()
    }

    async fn write_player(
        &self,
        player: &PlayerId,
        expected_version: Option<u64>,
        write: &PlayerWrite,
    ) -> Result<u64, StorageError> {
        let now = self.clock.now();
        let next_version = expected_version.map_or(1, |v| v + 1);

        // One autocommit statement per branch; the version predicate (or the
        // primary key on insert) is the compare-and-swap.
        let affected = match expected_version {
            None => {
                let record = stamp_record(player, None, write, now);
                sqlx::query(
                    r"
                    INSERT INTO players (
                        player_id, username, games_played, total_correct,
                        total_attempted, avg_correct_per_game, avg_percent,
                        created_at, last_login_at, last_played_at, version
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    ON CONFLICT(player_id) DO NOTHING
                    ",
                )
                .bind(player.as_str())
                .bind(&record.username)
                .bind(u64_to_i64("games_played", record.stats.games_played)?)
                .bind(u64_to_i64("total_correct", record.stats.total_correct)?)
                .bind(u64_to_i64("total_attempted", record.stats.total_attempted)?)
                .bind(record.stats.avg_correct_per_game)
                .bind(record.stats.avg_percent)
                .bind(record.created_at)
                .bind(record.last_login_at)
                .bind(record.last_played_at)
                .bind(u64_to_i64("version", next_version)?)
                .execute(&self.pool)
                .await
                .map_err(write_err)?
                .rows_affected()
            }
            Some(expected) => sqlx::query(
                r"
                    UPDATE players SET
                        username = ?2,
                        games_played = ?3,
                        total_correct = ?4,
                        total_attempted = ?5,
                        avg_correct_per_game = ?6,
                        avg_percent = ?7,
                        last_login_at = COALESCE(?8, last_login_at),
                        last_played_at = COALESCE(?9, last_played_at),
                        version = ?10
                    WHERE player_id = ?1 AND version = ?11
                    ",
            )
            .bind(player.as_str())
            .bind(&write.username)
            .bind(u64_to_i64("games_played", write.stats.games_played)?)
            .bind(u64_to_i64("total_correct", write.stats.total_correct)?)
            .bind(u64_to_i64("total_attempted", write.stats.total_attempted)?)
            .bind(write.stats.avg_correct_per_game)
            .bind(write.stats.avg_percent)
            .bind(write.touch_login.then_some(now))
            .bind(write.touch_played.then_some(now))
            .bind(u64_to_i64("version", next_version)?)
            .bind(u64_to_i64("version", expected)?)
            .execute(&self.pool)
            .await
            .map_err(write_err)?
            .rows_affected(),
        };

        if affected == 0 {
            debug!(player = %player, ?expected_version, "stale player version");
            return Err(StorageError::Conflict);
        }
        Ok(next_version)
    }

    async fn list_players(&self, limit: u32) -> Result<Vec<PlayerRecord>, StorageError> {
        let rows = sqlx::query(&format!(
            "{SELECT_PLAYER} WHERE games_played > 0 \
             ORDER BY avg_percent DESC, games_played DESC, username ASC LIMIT ?1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;
        rows.iter()
            .map(|row| map_player_row(row).map(|v| v.value))
            .collect()
    }
}
