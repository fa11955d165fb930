use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::Clock;
use quiz_core::model::{PlayerId, RemoteStats, RunId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

// ─── LOCAL KEY/VALUE ────────────────────────────────────────────────────────

/// Client-local durable string storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the value cannot be stored.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// ─── COMMIT MARKERS ─────────────────────────────────────────────────────────

/// Remembers which runs already reached the shared store.
#[async_trait]
pub trait CommitMarkerRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the marker cannot be read.
    async fn is_committed(&self, run: RunId) -> Result<bool, StorageError>;

    /// Marking twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the marker cannot be written.
    async fn mark_committed(&self, run: RunId) -> Result<(), StorageError>;
}

// ─── REMOTE PLAYER DOCUMENTS ────────────────────────────────────────────────

/// A player's document in the shared store.
///
/// The timestamps are owned by the store: callers only ask for them to be
/// refreshed through [`PlayerWrite`].
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRecord {
    pub player_id: PlayerId,
    pub username: String,
    pub stats: RemoteStats,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub last_played_at: Option<DateTime<Utc>>,
}

/// A record together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub value: T,
    pub version: u64,
}

/// The caller-controlled part of a player document write.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerWrite {
    pub username: String,
    pub stats: RemoteStats,
    pub touch_login: bool,
    pub touch_played: bool,
}

#[async_trait]
pub trait RemoteStatsRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn fetch_player(
        &self,
        player: &PlayerId,
    ) -> Result<Option<Versioned<PlayerRecord>>, StorageError>;

    /// Compare-and-swap write of a player document.
    ///
    /// `expected_version` is `None` to create the document and `Some(v)` to
    /// replace the document read at version `v`. Returns the new version.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the document changed (or appeared)
    /// since it was read, or other storage errors.
    async fn write_player(
        &self,
        player: &PlayerId,
        expected_version: Option<u64>,
        write: &PlayerWrite,
    ) -> Result<u64, StorageError>;

    /// Up to `limit` players with at least one game, highest `avg_percent`
    /// first, then most games, then username.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read.
    async fn list_players(&self, limit: u32) -> Result<Vec<PlayerRecord>, StorageError>;
}

/// Read-modify-write of one player document with optimistic retries.
///
/// `update` receives the current document (or `None` when it does not exist
/// yet) and must be pure: it may run once per attempt. Returns the write that
/// was committed.
///
/// # Errors
///
/// Returns `StorageError::Conflict` once `attempts` conflicting writes have been
/// seen, or the first non-conflict storage error.
pub async fn transact_player<F>(
    repo: &dyn RemoteStatsRepository,
    player: &PlayerId,
    attempts: u32,
    mut update: F,
) -> Result<PlayerWrite, StorageError>
where
    F: FnMut(Option<&PlayerRecord>) -> PlayerWrite + Send,
{
    for attempt in 1..=attempts.max(1) {
        let current = repo.fetch_player(player).await?;
        let write = update(current.as_ref().map(|v| &v.value));
        let expected = current.as_ref().map(|v| v.version);

        match repo.write_player(player, expected, &write).await {
            Ok(version) => {
                debug!(player = %player, version, attempt, "player document committed");
                return Ok(write);
            }
            Err(StorageError::Conflict) => {
                debug!(player = %player, attempt, "player document changed underneath, retrying");
            }
            Err(err) => return Err(err),
        }
    }
    Err(StorageError::Conflict)
}

/// Applies a write on top of the previous document, stamping store-owned times.
pub(crate) fn stamp_record(
    player: &PlayerId,
    previous: Option<&PlayerRecord>,
    write: &PlayerWrite,
    now: DateTime<Utc>,
) -> PlayerRecord {
    PlayerRecord {
        player_id: player.clone(),
        username: write.username.clone(),
        stats: write.stats,
        created_at: previous.map_or(now, |p| p.created_at),
        last_login_at: if write.touch_login {
            Some(now)
        } else {
            previous.and_then(|p| p.last_login_at)
        },
        last_played_at: if write.touch_played {
            Some(now)
        } else {
            previous.and_then(|p| p.last_played_at)
        },
    }
}

// ─── IN-MEMORY ADAPTER ──────────────────────────────────────────────────────

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    clock: Clock,
    values: Arc<Mutex<HashMap<String, String>>>,
    commits: Arc<Mutex<HashSet<RunId>>>,
    players: Arc<Mutex<HashMap<PlayerId, Versioned<PlayerRecord>>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `clock` for the store-owned player timestamps.
    #[must_use]
    pub fn with_clock(clock: Clock) -> Self {
        Self {
            clock,
            ..Self::default()
        }
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl KeyValueStore for InMemoryRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.values.lock().map_err(poisoned)?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.values.lock().map_err(poisoned)?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.values.lock().map_err(poisoned)?;
        guard.remove(key);
        Ok(())
    }
}

#[async_trait]
impl CommitMarkerRepository for InMemoryRepository {
    async fn is_committed(&self, run: RunId) -> Result<bool, StorageError> {
        let guard = self.commits.lock().map_err(poisoned)?;
        Ok(guard.contains(&run))
    }

    async fn mark_committed(&self, run: RunId) -> Result<(), StorageError> {
        let mut guard = self.commits.lock().map_err(poisoned)?;
        guard.insert(run);
        Ok(())
    }
}

#[async_trait]
impl RemoteStatsRepository for InMemoryRepository {
    async fn fetch_player(
        &self,
        player: &PlayerId,
    ) -> Result<Option<Versioned<PlayerRecord>>, StorageError> {
        let guard = self.players.lock().map_err(poisoned)?;
        Ok(guard.get(player).cloned())
    }

    async fn write_player(
        &self,
        player: &PlayerId,
        expected_version: Option<u64>,
        write: &PlayerWrite,
    ) -> Result<u64, StorageError> {
        let mut guard = self.players.lock().map_err(poisoned)?;
        let current = guard.get(player);
        if current.map(|v| v.version) != expected_version {
            return Err(StorageError::Conflict);
        }

        let record = stamp_record(player, current.map(|v| &v.value), write, self.clock.now());
        let version = expected_version.map_or(1, |v| v + 1);
        guard.insert(
            player.clone(),
            Versioned {
                value: record,
                version,
            },
        );
        Ok(version)
    }

    async fn list_players(&self, limit: u32) -> Result<Vec<PlayerRecord>, StorageError> {
        let guard = self.players.lock().map_err(poisoned)?;
        let mut players: Vec<PlayerRecord> = guard
            .values()
            .filter(|v| v.value.stats.games_played > 0)
            .map(|v| v.value.clone())
            .collect();
        players.sort_by(|a, b| {
            b.stats
                .avg_percent
                .total_cmp(&a.stats.avg_percent)
                .then(b.stats.games_played.cmp(&a.stats.games_played))
                .then_with(|| a.username.cmp(&b.username))
        });
        players.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(players)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub values: Arc<dyn KeyValueStore>,
    pub commits: Arc<dyn CommitMarkerRepository>,
    pub players: Arc<dyn RemoteStatsRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::in_memory_with_clock(Clock::default())
    }

    #[must_use]
    pub fn in_memory_with_clock(clock: Clock) -> Self {
        Self::from_repository(InMemoryRepository::with_clock(clock))
    }

    pub(crate) fn from_repository<R>(repo: R) -> Self
    where
        R: KeyValueStore + CommitMarkerRepository + RemoteStatsRepository + Clone + 'static,
    {
        let values: Arc<dyn KeyValueStore> = Arc::new(repo.clone());
        let commits: Arc<dyn CommitMarkerRepository> = Arc::new(repo.clone());
        let players: Arc<dyn RemoteStatsRepository> = Arc::new(repo);
        Self {
            values,
            commits,
            players,
        }
    }
}
