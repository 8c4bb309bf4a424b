//! Guild roles and the permissions they grant.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Level reserved for the guild master.
pub const MASTER_LEVEL: u32 = 0;

/// Actions a role may be allowed to perform inside its guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RolePermission {
    InviteMembers,
    KickMembers,
    PromoteMembers,
    DemoteMembers,
    DepositMoney,
    WithdrawMoney,
    CreateCode,
    DeleteCode,
    ChangeName,
    ChangePrefix,
    ChangeStatus,
    UpgradeTier,
    TransferGuild,
}

impl RolePermission {
    /// Every permission, used to build the master role.
    pub fn all() -> BTreeSet<Self> {
        [
            Self::InviteMembers,
            Self::KickMembers,
            Self::PromoteMembers,
            Self::DemoteMembers,
            Self::DepositMoney,
            Self::WithdrawMoney,
            Self::CreateCode,
            Self::DeleteCode,
            Self::ChangeName,
            Self::ChangePrefix,
            Self::ChangeStatus,
            Self::UpgradeTier,
            Self::TransferGuild,
        ]
        .into_iter()
        .collect()
    }
}

/// A named privilege level. Lower levels outrank higher ones; level 0 is
/// the guild master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildRole {
    name: String,
    level: u32,
    #[serde(default)]
    permissions: BTreeSet<RolePermission>,
}

impl GuildRole {
    pub fn new(name: impl Into<String>, level: u32) -> Self {
        Self {
            name: name.into(),
            level,
            permissions: BTreeSet::new(),
        }
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = RolePermission>) -> Self {
        self.permissions = permissions.into_iter().collect();
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[inline]
    pub fn is_master(&self) -> bool {
        self.level == MASTER_LEVEL
    }

    pub fn permissions(&self) -> &BTreeSet<RolePermission> {
        &self.permissions
    }

    /// The master implicitly holds every permission.
    pub fn has_permission(&self, permission: RolePermission) -> bool {
        self.is_master() || self.permissions.contains(&permission)
    }

    /// True if this role strictly outranks `other`.
    pub fn outranks(&self, other: &GuildRole) -> bool {
        self.level < other.level
    }
}

impl fmt::Display for GuildRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (level {})", self.name, self.level)
    }
}
