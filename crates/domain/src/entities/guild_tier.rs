//! Guild tiers - capacity and bank limits unlocked by upgrading.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildTier {
    level: u32,
    name: String,
    max_members: u32,
    max_bank_balance: f64,
}

impl GuildTier {
    pub fn new(level: u32, name: impl Into<String>, max_members: u32, max_bank_balance: f64) -> Self {
        Self {
            level,
            name: name.into(),
            max_members,
            max_bank_balance,
        }
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn max_members(&self) -> u32 {
        self.max_members
    }

    #[inline]
    pub fn max_bank_balance(&self) -> f64 {
        self.max_bank_balance
    }
}
