//! In-memory state storage modules.
//!
//! - `GuildHandler` - the guild registry and its indices
//! - `SharedGuildHandler` - the registry behind a lock for background tasks
//! - `SharedStorage` - the storage port, with saves and deletes taking turns

pub mod guild_handler;
pub mod shared;

// Re-export store types
pub use guild_handler::{GuildHandler, GuildKey, LoadReport};
pub use shared::{
    disband, online_members, save_snapshot, spawn_autosave, SharedGuildHandler, SharedStorage,
};
