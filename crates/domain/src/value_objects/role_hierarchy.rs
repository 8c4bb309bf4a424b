//! Role hierarchy - the configured ladder of guild roles
//!
//! Roles are looked up by level only. Promotion moves a member one level
//! down (towards 0), demotion one level up. Level 0 is never reachable by
//! promotion; it changes hands only through a master transfer.

use std::collections::BTreeMap;

use crate::entities::{GuildRole, MASTER_LEVEL};
use crate::error::DomainError;

/// Level a former master drops to unless configured otherwise.
const DEFAULT_FORMER_MASTER_LEVEL: u32 = 1;

/// An ordered, immutable set of roles keyed by level.
///
/// # Invariants
///
/// - At least one role, and a role at level 0
/// - No two roles share a level
/// - The former-master level names a configured, non-master role
#[derive(Debug, Clone, PartialEq)]
pub struct RoleHierarchy {
    roles: BTreeMap<u32, GuildRole>,
    former_master_level: u32,
}

impl RoleHierarchy {
    /// Build a hierarchy from configuration.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the list is empty, has no master
    /// role, has duplicate levels, or has no role to receive a former master.
    pub fn new(roles: impl IntoIterator<Item = GuildRole>) -> Result<Self, DomainError> {
        let mut by_level = BTreeMap::new();
        for role in roles {
            let level = role.level();
            if let Some(existing) = by_level.insert(level, role) {
                return Err(DomainError::validation(format!(
                    "roles '{}' and '{}' share level {}",
                    existing.name(),
                    by_level[&level].name(),
                    level
                )));
            }
        }

        if by_level.is_empty() {
            return Err(DomainError::validation("role hierarchy cannot be empty"));
        }
        if !by_level.contains_key(&MASTER_LEVEL) {
            return Err(DomainError::validation(
                "role hierarchy must define a guild master at level 0",
            ));
        }

        let former_master_level = if by_level.contains_key(&DEFAULT_FORMER_MASTER_LEVEL) {
            DEFAULT_FORMER_MASTER_LEVEL
        } else {
            by_level
                .keys()
                .copied()
                .find(|level| *level != MASTER_LEVEL)
                .ok_or_else(|| {
                    DomainError::validation("role hierarchy needs at least one non-master role")
                })?
        };

        Ok(Self {
            roles: by_level,
            former_master_level,
        })
    }

    /// Override the role a master receives when handing over the guild.
    pub fn with_former_master_level(mut self, level: u32) -> Result<Self, DomainError> {
        if level == MASTER_LEVEL {
            return Err(DomainError::validation(
                "former master level cannot be the master level",
            ));
        }
        if !self.roles.contains_key(&level) {
            return Err(DomainError::validation(format!(
                "former master level {} has no configured role",
                level
            )));
        }
        self.former_master_level = level;
        Ok(self)
    }

    /// Role at exactly `level`.
    pub fn role(&self, level: u32) -> Result<&GuildRole, DomainError> {
        self.roles
            .get(&level)
            .ok_or_else(|| DomainError::not_found("GuildRole", level))
    }

    pub fn master_role(&self) -> Result<&GuildRole, DomainError> {
        self.role(MASTER_LEVEL)
    }

    /// Least privileged role; new members join here.
    pub fn lowest_role(&self) -> Result<&GuildRole, DomainError> {
        self.roles
            .values()
            .next_back()
            .ok_or_else(|| DomainError::not_found("GuildRole", "lowest"))
    }

    pub fn former_master_role(&self) -> Result<&GuildRole, DomainError> {
        self.role(self.former_master_level)
    }

    #[inline]
    pub fn former_master_level(&self) -> u32 {
        self.former_master_level
    }

    /// Role one step above `level`, never the master role.
    pub fn promotion_target(&self, level: u32) -> Result<&GuildRole, DomainError> {
        match level.checked_sub(1) {
            Some(target) if target != MASTER_LEVEL => self.role(target),
            _ => Err(DomainError::not_found(
                "GuildRole",
                format!("promotion target for level {}", level),
            )),
        }
    }

    /// Role one step below `level`.
    pub fn demotion_target(&self, level: u32) -> Result<&GuildRole, DomainError> {
        let target = level
            .checked_add(1)
            .ok_or_else(|| DomainError::not_found("GuildRole", "demotion target"))?;
        self.role(target)
    }

    pub fn roles(&self) -> impl Iterator<Item = &GuildRole> {
        self.roles.values()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
