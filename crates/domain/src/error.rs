//! Unified error types for the domain layer
//!
//! Every guild, member, role, and bank operation fails fast with a
//! `DomainError`; the engine decides whether to log, surface, or abort.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Lookup miss (guild, member, role, tier, or code)
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Operation would violate an aggregate invariant
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Negative or non-finite currency amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Debit exceeds the current balance
    #[error("Insufficient funds: requested {requested:.2}, available {available:.2}")]
    InsufficientFunds { requested: f64, available: f64 },

    /// Validation failed (e.g., invalid field values)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Guild is at its tier's member capacity
    #[error("Guild full: {current}/{max} members")]
    GuildFull { current: u32, max: u32 },

    /// Credit would push the balance over the tier's bank limit
    #[error("Bank limit exceeded: tier allows at most {limit:.2}")]
    BankLimitExceeded { limit: f64 },
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Creates an invalid state error for invariant violations.
    ///
    /// Use this when an operation is well-formed but not allowed in the
    /// aggregate's current state:
    /// - Adding a member that is already present
    /// - Removing the guild master without a transfer
    /// - Creating a second master
    ///
    /// # Example
    /// ```ignore
    /// if self.members.contains_key(&player) {
    ///     return Err(DomainError::invalid_state("player is already a member"));
    /// }
    /// ```
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Create an invalid amount error
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    /// Create an insufficient funds error
    pub fn insufficient_funds(requested: f64, available: f64) -> Self {
        Self::InsufficientFunds {
            requested,
            available,
        }
    }

    /// Creates a validation error for malformed input values.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a guild full error
    pub fn guild_full(current: u32, max: u32) -> Self {
        Self::GuildFull { current, max }
    }

    /// Create a bank limit error
    pub fn bank_limit_exceeded(limit: f64) -> Self {
        Self::BankLimitExceeded { limit }
    }

    /// Check if this is a NotFound error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = DomainError::not_found("GuildRole", 7);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Entity not found: GuildRole with id 7");
    }

    #[test]
    fn test_invalid_state_error() {
        let err = DomainError::invalid_state("guild master cannot be removed");
        assert!(matches!(err, DomainError::InvalidState(_)));
        assert_eq!(
            err.to_string(),
            "Invalid state: guild master cannot be removed"
        );
    }

    #[test]
    fn test_insufficient_funds_error() {
        let err = DomainError::insufficient_funds(11.0, 10.5);
        assert_eq!(
            err.to_string(),
            "Insufficient funds: requested 11.00, available 10.50"
        );
    }

    #[test]
    fn test_guild_full_error() {
        let err = DomainError::guild_full(10, 10);
        assert!(matches!(err, DomainError::GuildFull { .. }));
        assert_eq!(err.to_string(), "Guild full: 10/10 members");
    }
}
