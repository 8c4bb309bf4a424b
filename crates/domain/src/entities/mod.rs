//! Entities owned by the guild aggregate

mod bank_log;
mod guild_code;
mod guild_member;
mod guild_role;
mod guild_tier;

pub use bank_log::{BankLogEntry, BankLogKind};
pub use guild_code::GuildCode;
pub use guild_member::GuildMember;
pub use guild_role::{GuildRole, RolePermission, MASTER_LEVEL};
pub use guild_tier::GuildTier;
