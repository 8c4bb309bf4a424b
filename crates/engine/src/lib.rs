//! Guilds Engine library.
//!
//! Runs the guild registry for a game server process.
//!
//! ## Structure
//!
//! - `infrastructure/` - ports, storage adapters, settings, errors
//! - `stores/` - the in-memory guild registry and its shared handle
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod stores;

pub use app::App;
pub use infrastructure::GuildError;
pub use stores::{GuildHandler, GuildKey, SharedGuildHandler};
