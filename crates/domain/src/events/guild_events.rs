//! Guild-related domain events
//!
//! Return types from `Guild` mutations, carrying enough detail for the
//! caller to build notifications without re-reading the aggregate.

use crate::entities::GuildRole;
use crate::value_objects::GuildName;
use crate::PlayerId;

/// A member moved up or down the role hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    pub player: PlayerId,
    pub from: GuildRole,
    pub to: GuildRole,
}

/// Guild ownership changed hands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterTransfer {
    pub previous_master: PlayerId,
    pub new_master: PlayerId,
    /// Role the previous master now holds
    pub previous_master_role: GuildRole,
}

/// Result of a credit or debit against the guild bank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceChange {
    pub amount: f64,
    pub previous: f64,
    pub current: f64,
}

/// Outcome of renaming a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuildRenamed {
    Renamed { from: GuildName, to: GuildName },
    Unchanged,
}
