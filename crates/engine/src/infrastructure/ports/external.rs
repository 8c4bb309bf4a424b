//! Capabilities provided by the game server the engine is embedded in.

use guilds_domain::PlayerId;

/// Online-status queries.
#[cfg_attr(test, mockall::automock)]
pub trait PresencePort: Send + Sync {
    fn is_online(&self, player: PlayerId) -> bool;
}

/// Resolves a player name to the player's stable id.
#[cfg_attr(test, mockall::automock)]
pub trait IdentityPort: Send + Sync {
    fn player_id(&self, name: &str) -> Option<PlayerId>;
}
