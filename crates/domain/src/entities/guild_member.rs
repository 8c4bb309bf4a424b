//! A player's membership record inside one guild.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::GuildRole;
use crate::PlayerId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildMember {
    id: PlayerId,
    role: GuildRole,
    joined_at: DateTime<Utc>,
}

impl GuildMember {
    pub fn new(id: PlayerId, role: GuildRole, joined_at: DateTime<Utc>) -> Self {
        Self {
            id,
            role,
            joined_at,
        }
    }

    #[inline]
    pub fn id(&self) -> PlayerId {
        self.id
    }

    #[inline]
    pub fn role(&self) -> &GuildRole {
        &self.role
    }

    #[inline]
    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    #[inline]
    pub fn is_master(&self) -> bool {
        self.role.is_master()
    }

    /// Role changes go through `Guild` so the single-master rule is checked.
    pub(crate) fn set_role(&mut self, role: GuildRole) -> GuildRole {
        std::mem::replace(&mut self.role, role)
    }
}
