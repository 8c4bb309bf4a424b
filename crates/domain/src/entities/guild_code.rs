//! Invite codes that let players join a guild without a direct invite.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::PlayerId;

/// An invite token owned by a guild.
///
/// # Invariants
///
/// - A code with no uses left, or past its expiry, is inert: `redeem` fails
///   and `is_active` returns false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildCode {
    code: String,
    creator: PlayerId,
    uses_remaining: u32,
    expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    redeemers: Vec<PlayerId>,
}

impl GuildCode {
    pub fn new(code: impl Into<String>, creator: PlayerId, uses: u32) -> Self {
        Self {
            code: code.into(),
            creator,
            uses_remaining: uses,
            expires_at: None,
            redeemers: Vec::new(),
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    #[inline]
    pub fn creator(&self) -> PlayerId {
        self.creator
    }

    #[inline]
    pub fn uses_remaining(&self) -> u32 {
        self.uses_remaining
    }

    #[inline]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn redeemers(&self) -> &[PlayerId] {
        &self.redeemers
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expiry| now >= expiry)
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.uses_remaining > 0 && !self.is_expired(now)
    }

    /// Consume one use on behalf of `player`.
    pub(crate) fn redeem(&mut self, player: PlayerId, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.uses_remaining == 0 {
            return Err(DomainError::invalid_state(format!(
                "code {} has no uses remaining",
                self.code
            )));
        }
        if self.is_expired(now) {
            return Err(DomainError::invalid_state(format!(
                "code {} has expired",
                self.code
            )));
        }
        self.uses_remaining -= 1;
        self.redeemers.push(player);
        Ok(())
    }
}
