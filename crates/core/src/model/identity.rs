use crate::model::PlayerId;

/// Name used when an identity offers nothing better.
pub const DEFAULT_USERNAME: &str = "AimPlayer";

/// An authenticated player as reported by the sign-in provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub player_id: PlayerId,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    #[must_use]
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            display_name: None,
            email: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Picks the leaderboard name: a name already on record wins, then the
    /// display name, then the e-mail local part, then [`DEFAULT_USERNAME`].
    #[must_use]
    pub fn resolve_username(&self, existing: Option<&str>) -> String {
        let non_blank = |s: &str| {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        };

        existing
            .and_then(non_blank)
            .or_else(|| self.display_name.as_deref().and_then(non_blank))
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|email| email.split('@').next())
                    .and_then(non_blank)
            })
            .unwrap_or_else(|| DEFAULT_USERNAME.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new(PlayerId::new("uid-1").unwrap())
    }

    #[test]
    fn existing_name_is_kept() {
        let id = identity().with_display_name("Ada");
        assert_eq!(id.resolve_username(Some("Grace")), "Grace");
    }

    #[test]
    fn falls_back_through_display_name_and_email() {
        let id = identity().with_display_name("  Ada  ");
        assert_eq!(id.resolve_username(Some("   ")), "Ada");

        let id = identity().with_email("lovelace@example.com");
        assert_eq!(id.resolve_username(None), "lovelace");

        assert_eq!(identity().resolve_username(None), "AimPlayer");
    }
}
