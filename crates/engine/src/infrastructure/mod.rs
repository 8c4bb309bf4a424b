//! Infrastructure: ports, storage adapters, configuration, and errors.

pub mod clock;
pub mod error;
pub mod json_store;
pub mod memory_store;
pub mod ports;
pub mod settings;

pub use error::GuildError;
