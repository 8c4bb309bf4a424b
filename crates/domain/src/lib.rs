//! Guild domain: the `Guild` aggregate, its roles, tiers, codes, and
//! the rules that keep a guild consistent.
//!
//! Nothing in this crate performs I/O. Time is passed in as a value and
//! presence checks as a closure, so every rule is testable in isolation.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod value_objects;

pub use aggregates::{Guild, GuildStatus};
pub use entities::{
    BankLogEntry, BankLogKind, GuildCode, GuildMember, GuildRole, GuildTier, RolePermission,
    MASTER_LEVEL,
};
pub use error::DomainError;
pub use events::{BalanceChange, GuildRenamed, MasterTransfer, RoleChange};
pub use ids::{GuildId, PlayerId};
pub use value_objects::{GuildName, GuildPrefix, RoleHierarchy, TierLadder};
