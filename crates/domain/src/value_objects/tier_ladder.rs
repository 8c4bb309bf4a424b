//! Tier ladder - the configured sequence of guild tiers.

use std::collections::BTreeMap;

use crate::entities::GuildTier;
use crate::error::DomainError;

/// Ordered tiers keyed by level. New guilds start on the lowest tier.
#[derive(Debug, Clone, PartialEq)]
pub struct TierLadder {
    tiers: BTreeMap<u32, GuildTier>,
}

impl TierLadder {
    /// # Errors
    ///
    /// Returns `DomainError::Validation` for an empty list, duplicate levels,
    /// zero member capacity, or a negative / non-finite bank limit.
    pub fn new(tiers: impl IntoIterator<Item = GuildTier>) -> Result<Self, DomainError> {
        let mut by_level = BTreeMap::new();
        for tier in tiers {
            if tier.max_members() == 0 {
                return Err(DomainError::validation(format!(
                    "tier {} must allow at least one member",
                    tier.level()
                )));
            }
            if !tier.max_bank_balance().is_finite() || tier.max_bank_balance() < 0.0 {
                return Err(DomainError::validation(format!(
                    "tier {} has an invalid bank limit",
                    tier.level()
                )));
            }
            let level = tier.level();
            if by_level.insert(level, tier).is_some() {
                return Err(DomainError::validation(format!(
                    "duplicate tier level {}",
                    level
                )));
            }
        }
        if by_level.is_empty() {
            return Err(DomainError::validation("tier ladder cannot be empty"));
        }
        Ok(Self { tiers: by_level })
    }

    pub fn tier(&self, level: u32) -> Result<&GuildTier, DomainError> {
        self.tiers
            .get(&level)
            .ok_or_else(|| DomainError::not_found("GuildTier", level))
    }

    pub fn starting_tier(&self) -> Result<&GuildTier, DomainError> {
        self.tiers
            .values()
            .next()
            .ok_or_else(|| DomainError::not_found("GuildTier", "starting"))
    }

    /// The first tier strictly above `level`.
    pub fn next_after(&self, level: u32) -> Result<&GuildTier, DomainError> {
        self.tiers
            .range(level.saturating_add(1)..)
            .map(|(_, tier)| tier)
            .next()
            .filter(|tier| tier.level() > level)
            .ok_or_else(|| DomainError::not_found("GuildTier", format!("above level {}", level)))
    }

    pub fn tiers(&self) -> impl Iterator<Item = &GuildTier> {
        self.tiers.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> TierLadder {
        TierLadder::new([
            GuildTier::new(1, "Fledgling", 10, 10_000.0),
            GuildTier::new(2, "Established", 25, 50_000.0),
            GuildTier::new(4, "Legendary", 60, 500_000.0),
        ])
        .unwrap()
    }

    #[test]
    fn starting_tier_is_lowest_level() {
        assert_eq!(ladder().starting_tier().unwrap().name(), "Fledgling");
    }

    #[test]
    fn next_after_skips_gaps() {
        let ladder = ladder();
        assert_eq!(ladder.next_after(2).unwrap().level(), 4);
        assert!(ladder.next_after(4).unwrap_err().is_not_found());
    }

    #[test]
    fn rejects_invalid_tiers() {
        assert!(TierLadder::new(Vec::new()).is_err());
        assert!(TierLadder::new([GuildTier::new(1, "Empty", 0, 10.0)]).is_err());
        assert!(TierLadder::new([GuildTier::new(1, "Broke", 5, f64::NAN)]).is_err());
        assert!(TierLadder::new([
            GuildTier::new(1, "A", 5, 10.0),
            GuildTier::new(1, "B", 5, 10.0),
        ])
        .is_err());
    }
}
