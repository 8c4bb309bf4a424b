//! Unified engine error type.
//!
//! Wraps domain rule violations and storage failures so registry callers
//! handle every failure through one type.

use guilds_domain::{DomainError, GuildId, PlayerId};
use thiserror::Error;

use super::ports::StorageError;

/// Unified error for guild registry operations.
#[derive(Debug, Error)]
pub enum GuildError {
    /// A guild rule rejected the operation.
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Reading or writing guild records failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A player may belong to at most one guild.
    #[error("Player {player} is already in guild {guild}")]
    AlreadyInGuild { player: PlayerId, guild: GuildId },

    /// Another guild already uses this name (ignoring case).
    #[error("Guild name already taken: {0}")]
    NameTaken(String),

    /// A blocking save or background task did not complete.
    #[error("Background task failed: {0}")]
    Background(String),
}

impl GuildError {
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::Domain(DomainError::not_found(entity_type, id))
    }

    /// Check if this is a lookup miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Domain(e) if e.is_not_found())
    }

    /// Get the entity type if this is a not-found error.
    pub fn not_found_entity(&self) -> Option<&str> {
        match self {
            Self::Domain(DomainError::NotFound { entity_type, .. }) => Some(entity_type),
            _ => None,
        }
    }
}
