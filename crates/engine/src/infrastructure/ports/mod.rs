//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - Guild persistence (JSON files today, anything else tomorrow)
//! - Game-server capabilities (player lookup, online status)
//! - Clock/Random (for testing)

mod error;
mod external;
mod storage;
mod testing;

pub use error::StorageError;
pub use external::{IdentityPort, PresencePort};
pub use storage::GuildStoragePort;
pub use testing::{ClockPort, RandomPort};

#[cfg(test)]
pub use external::{MockIdentityPort, MockPresencePort};
#[cfg(test)]
pub use storage::MockGuildStoragePort;
#[cfg(test)]
pub use testing::{MockClockPort, MockRandomPort};
