//! Error types for port operations.

use std::path::PathBuf;

/// Storage operation errors with context for debugging.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Filesystem operation failed - includes operation name and path for tracing.
    #[error("I/O error in {operation} ({}): {source}", path.display())]
    Io {
        operation: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    /// A stored record could not be turned back into a valid guild.
    #[error("Corrupt record {record}: {message}")]
    CorruptRecord { record: String, message: String },

    /// A guild could not be serialized for writing.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Create an Io error with operation and path context.
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    pub fn corrupt(record: impl ToString, message: impl ToString) -> Self {
        Self::CorruptRecord {
            record: record.to_string(),
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptRecord { .. })
    }
}
