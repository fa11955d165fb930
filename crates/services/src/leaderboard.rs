use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use storage::repository::{PlayerRecord, RemoteStatsRepository};

use crate::error::StatsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
}

impl Medal {
    fn for_rank(rank: u32) -> Option<Self> {
        match rank {
            1 => Some(Self::Gold),
            2 => Some(Self::Silver),
            3 => Some(Self::Bronze),
            _ => None,
        }
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Gold => "🥇",
            Self::Silver => "🥈",
            Self::Bronze => "🥉",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub username: String,
    pub games_played: u64,
    pub avg_percent: f64,
    pub medal: Option<Medal>,
    pub last_played_at: Option<DateTime<Utc>>,
}

/// Players who have finished at least one game, best `avg_percent` first.
/// Ties go to more games played, then to the alphabetically first name.
#[must_use]
pub fn rank_players(mut players: Vec<PlayerRecord>, limit: usize) -> Vec<LeaderboardEntry> {
    players.retain(|p| p.stats.games_played > 0);
    players.sort_by(compare_players);
    players
        .into_iter()
        .take(limit)
        .zip(1_u32..)
        .map(|(p, rank)| LeaderboardEntry {
            rank,
            username: p.username,
            games_played: p.stats.games_played,
            avg_percent: p.stats.avg_percent,
            medal: Medal::for_rank(rank),
            last_played_at: p.last_played_at,
        })
        .collect()
}

fn compare_players(a: &PlayerRecord, b: &PlayerRecord) -> Ordering {
    b.stats
        .avg_percent
        .total_cmp(&a.stats.avg_percent)
        .then_with(|| b.stats.games_played.cmp(&a.stats.games_played))
        .then_with(|| a.username.cmp(&b.username))
}

/// Reads the shared store and ranks it.
#[derive(Clone)]
pub struct LeaderboardService {
    players: Arc<dyn RemoteStatsRepository>,
    size: u32,
}

impl LeaderboardService {
    #[must_use]
    pub fn new(players: Arc<dyn RemoteStatsRepository>, size: u32) -> Self {
        Self { players, size }
    }

    /// Top entries, at most `limit` (or the configured size when `None`).
    ///
    /// The store applies the same ordering before its cutoff, so players tied
    /// at the boundary are chosen by name.
    ///
    /// # Errors
    ///
    /// Returns `StatsError` if the store cannot be read.
    pub async fn top(&self, limit: Option<u32>) -> Result<Vec<LeaderboardEntry>, StatsError> {
        let limit = limit.unwrap_or(self.size).min(self.size);
        let players = self.players.list_players(limit).await?;
        Ok(rank_players(
            players,
            usize::try_from(limit).unwrap_or(usize::MAX),
        ))
    }
}
