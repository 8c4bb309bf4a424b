//! Guild persistence port.

use guilds_domain::{Guild, GuildId};

use super::StorageError;

/// Backend-agnostic guild persistence.
///
/// Calls are synchronous and may block on I/O; async callers go through
/// `spawn_blocking`.
#[cfg_attr(test, mockall::automock)]
pub trait GuildStoragePort: Send + Sync {
    /// Read every stored guild.
    ///
    /// The outer error means the store itself is unreadable. Each inner
    /// result is one record, so the caller decides whether a bad record
    /// aborts startup or is skipped.
    fn load_all(&self) -> Result<Vec<Result<Guild, StorageError>>, StorageError>;

    /// Persist every guild, each record replaced atomically.
    ///
    /// Every guild is attempted; the first failure is returned.
    fn save_all(&self, guilds: &[Guild]) -> Result<(), StorageError>;

    /// Remove a guild's record. Removing a missing record succeeds.
    fn delete(&self, id: GuildId) -> Result<(), StorageError>;
}
