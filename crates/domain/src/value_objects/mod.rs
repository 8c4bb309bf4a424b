//! Value objects - Immutable objects defined by their attributes

mod names;
mod role_hierarchy;
mod tier_ladder;

pub use names::{GuildName, GuildPrefix};
pub use role_hierarchy::RoleHierarchy;
pub use tier_ladder::TierLadder;
