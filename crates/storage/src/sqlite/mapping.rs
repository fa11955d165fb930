use quiz_core::model::{PlayerId, RemoteStats};
use sqlx::Row;

use crate::repository::{PlayerRecord, StorageError, Versioned};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

/// Lock contention is reported as a conflict so optimistic callers retry it.
pub(crate) fn write_err(e: sqlx::Error) -> StorageError {
    let contended = e
        .as_database_error()
        .and_then(|db| db.code())
        .and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED));
    if contended {
        StorageError::Conflict
    } else {
        conn(e)
    }
}

const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

pub(crate) fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn u64_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn map_player_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<Versioned<PlayerRecord>, StorageError> {
    let player_id: String = row.try_get("player_id").map_err(ser)?;
    let stats = RemoteStats {
        games_played: i64_to_u64("games_played", row.try_get("games_played").map_err(ser)?)?,
        total_correct: i64_to_u64("total_correct", row.try_get("total_correct").map_err(ser)?)?,
        total_attempted: i64_to_u64(
            "total_attempted",
            row.try_get("total_attempted").map_err(ser)?,
        )?,
        avg_correct_per_game: row.try_get("avg_correct_per_game").map_err(ser)?,
        avg_percent: row.try_get("avg_percent").map_err(ser)?,
    };

    Ok(Versioned {
        value: PlayerRecord {
            player_id: PlayerId::new(player_id).map_err(ser)?,
            username: row.try_get("username").map_err(ser)?,
            stats,
            created_at: row.try_get("created_at").map_err(ser)?,
            last_login_at: row.try_get("last_login_at").map_err(ser)?,
            last_played_at: row.try_get("last_played_at").map_err(ser)?,
        },
        version: i64_to_u64("version", row.try_get("version").map_err(ser)?)?,
    })
}
