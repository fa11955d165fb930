use std::sync::Arc;

use quiz_core::model::{GradeTier, Identity};
use storage::LocalRecords;
use storage::repository::{PlayerRecord, PlayerWrite, RemoteStatsRepository, transact_player};
use tracing::info;

use crate::error::PlayerServiceError;

/// Sign-in bookkeeping and the learner's grade choice.
#[derive(Clone)]
pub struct PlayerService {
    players: Arc<dyn RemoteStatsRepository>,
    local: LocalRecords,
    transaction_attempts: u32,
}

impl PlayerService {
    #[must_use]
    pub fn new(
        players: Arc<dyn RemoteStatsRepository>,
        local: LocalRecords,
        transaction_attempts: u32,
    ) -> Self {
        Self {
            players,
            local,
            transaction_attempts,
        }
    }

    /// Creates the player's document on first sign-in and stamps the login
    /// time. Existing stats and username are kept.
    ///
    /// # Errors
    ///
    /// Returns `PlayerServiceError` if the transaction fails.
    pub async fn record_login(
        &self,
        identity: &Identity,
    ) -> Result<PlayerRecord, PlayerServiceError> {
        transact_player(
            self.players.as_ref(),
            &identity.player_id,
            self.transaction_attempts,
            |current| PlayerWrite {
                username: identity.resolve_username(current.map(|p| p.username.as_str())),
                stats: current.map(|p| p.stats).unwrap_or_default(),
                touch_login: true,
                touch_played: false,
            },
        )
        .await?;

        let record = self
            .players
            .fetch_player(&identity.player_id)
            .await?
            .ok_or(PlayerServiceError::MissingAfterLogin)?
            .value;
        info!(player = %identity.player_id, username = %record.username, "player signed in");
        Ok(record)
    }

    /// The stored grade choice, or the lowest grade when none was made.
    ///
    /// # Errors
    ///
    /// Returns `PlayerServiceError` if local storage cannot be read.
    pub async fn selected_grade(&self) -> Result<GradeTier, PlayerServiceError> {
        Ok(self.local.selected_grade().await?.unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns `PlayerServiceError` if local storage cannot be written.
    pub async fn select_grade(&self, tier: GradeTier) -> Result<(), PlayerServiceError> {
        self.local.save_grade(tier).await?;
        Ok(())
    }
}
