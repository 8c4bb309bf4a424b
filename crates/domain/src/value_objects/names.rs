//! Validated name newtypes for guilds
//!
//! These newtypes ensure that names are valid by construction:
//! - Non-empty
//! - Within length limits
//! - Trimmed of leading/trailing whitespace

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DomainError;

/// Maximum length for guild names
const MAX_NAME_LENGTH: usize = 64;

/// Maximum length for guild chat prefixes
const MAX_PREFIX_LENGTH: usize = 16;

// ============================================================================
// GuildName
// ============================================================================

/// A validated guild name (non-empty, <=64 chars, trimmed)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GuildName(String);

impl GuildName {
    /// Create a new validated guild name.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if:
    /// - The name is empty after trimming
    /// - The name exceeds 64 characters after trimming
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Guild name cannot be empty"));
        }
        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(DomainError::validation(format!(
                "Guild name cannot exceed {} characters",
                MAX_NAME_LENGTH
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-folded form used for uniqueness checks and name lookups.
    pub fn index_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl fmt::Display for GuildName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for GuildName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<GuildName> for String {
    fn from(name: GuildName) -> String {
        name.0
    }
}

// ============================================================================
// GuildPrefix
// ============================================================================

/// A validated chat prefix (non-empty, <=16 chars, no whitespace)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GuildPrefix(String);

impl GuildPrefix {
    /// Create a new validated prefix.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the prefix is empty, longer than
    /// 16 characters, or contains whitespace.
    pub fn new(prefix: impl Into<String>) -> Result<Self, DomainError> {
        let prefix = prefix.into();
        let trimmed = prefix.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation("Guild prefix cannot be empty"));
        }
        if trimmed.chars().count() > MAX_PREFIX_LENGTH {
            return Err(DomainError::validation(format!(
                "Guild prefix cannot exceed {} characters",
                MAX_PREFIX_LENGTH
            )));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("Guild prefix cannot contain spaces"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GuildPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for GuildPrefix {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<GuildPrefix> for String {
    fn from(prefix: GuildPrefix) -> String {
        prefix.0
    }
}
