//! Guild registry - every loaded guild plus the indices used to find one.
//!
//! The registry owns the guilds for the life of the process. All mutations
//! go through it so the player index stays the single source of truth for
//! "which guild is this player in".

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use guilds_domain::{
    BalanceChange, DomainError, Guild, GuildCode, GuildId, GuildMember, GuildName, GuildPrefix,
    GuildRenamed, GuildRole, GuildStatus, GuildTier, MasterTransfer, PlayerId, RoleChange,
    RoleHierarchy, RolePermission, TierLadder,
};

use crate::infrastructure::ports::{
    ClockPort, GuildStoragePort, IdentityPort, RandomPort, StorageError,
};
use crate::infrastructure::settings::LoadFailurePolicy;
use crate::infrastructure::GuildError;

const CODE_LENGTH: usize = 8;
const CODE_ATTEMPTS: usize = 16;

/// Ways to identify a guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuildKey {
    Id(GuildId),
    Name(String),
    /// The guild this player belongs to
    Player(PlayerId),
}

/// Outcome of a startup load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

fn guild_mut(guilds: &mut HashMap<GuildId, Guild>, id: GuildId) -> Result<&mut Guild, GuildError> {
    guilds
        .get_mut(&id)
        .ok_or_else(|| GuildError::not_found("Guild", id))
}

/// In-memory guild registry.
///
/// Methods take `&mut self` and do no locking of their own; share it
/// through [`super::SharedGuildHandler`] when a background task needs it.
pub struct GuildHandler {
    guilds: HashMap<GuildId, Guild>,
    by_player: HashMap<PlayerId, GuildId>,
    by_name: HashMap<String, GuildId>,
    hierarchy: RoleHierarchy,
    tiers: TierLadder,
    clock: Arc<dyn ClockPort>,
    random: Arc<dyn RandomPort>,
}

impl GuildHandler {
    pub fn new(
        hierarchy: RoleHierarchy,
        tiers: TierLadder,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Self {
        Self {
            guilds: HashMap::new(),
            by_player: HashMap::new(),
            by_name: HashMap::new(),
            hierarchy,
            tiers,
            clock,
            random,
        }
    }

    // =========================================================================
    // Loading & Saving
    // =========================================================================

    /// Load every stored guild into the registry.
    ///
    /// Records that fail to parse, or that clash with an already indexed
    /// guild (same id, same name, or a shared member), are handled by
    /// `policy`.
    pub fn load(
        &mut self,
        storage: &dyn GuildStoragePort,
        policy: LoadFailurePolicy,
    ) -> Result<LoadReport, GuildError> {
        let records = storage.load_all()?;
        let mut report = LoadReport::default();

        for record in records {
            match record.and_then(|guild| self.index_loaded(guild)) {
                Ok(()) => report.loaded += 1,
                Err(e) => match policy {
                    LoadFailurePolicy::Abort => return Err(e.into()),
                    LoadFailurePolicy::SkipAndLog => {
                        tracing::warn!(error = %e, "Skipping unloadable guild record");
                        report.skipped += 1;
                    }
                },
            }
        }

        tracing::info!(
            loaded = report.loaded,
            skipped = report.skipped,
            policy = %policy,
            "Guilds loaded"
        );
        Ok(report)
    }

    fn index_loaded(&mut self, guild: Guild) -> Result<(), StorageError> {
        let id = guild.id();
        if self.guilds.contains_key(&id) {
            return Err(StorageError::corrupt(id, "duplicate guild id"));
        }
        if let Some(other) = self.by_name.get(&guild.name().index_key()) {
            return Err(StorageError::corrupt(
                id,
                format!("name '{}' already used by guild {}", guild.name(), other),
            ));
        }
        if let Some((player, other)) = guild
            .member_ids()
            .find_map(|p| self.by_player.get(&p).map(|g| (p, *g)))
        {
            return Err(StorageError::corrupt(
                id,
                format!("player {} already belongs to guild {}", player, other),
            ));
        }
        self.index(guild);
        Ok(())
    }

    fn index(&mut self, guild: Guild) {
        let id = guild.id();
        for player in guild.member_ids() {
            self.by_player.insert(player, id);
        }
        self.by_name.insert(guild.name().index_key(), id);
        self.guilds.insert(id, guild);
    }

    /// Clone every guild, ordered by id.
    pub fn snapshot(&self) -> Vec<Guild> {
        let mut guilds: Vec<Guild> = self.guilds.values().cloned().collect();
        guilds.sort_by_key(Guild::id);
        guilds
    }

    /// Persist the current snapshot.
    pub fn save_all(&self, storage: &dyn GuildStoragePort) -> Result<(), GuildError> {
        storage.save_all(&self.snapshot())?;
        Ok(())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn guild(&self, id: GuildId) -> Result<&Guild, GuildError> {
        self.guilds
            .get(&id)
            .ok_or_else(|| GuildError::not_found("Guild", id))
    }

    /// Case-insensitive name lookup.
    pub fn guild_by_name(&self, name: &str) -> Result<&Guild, GuildError> {
        self.by_name
            .get(&name.trim().to_lowercase())
            .and_then(|id| self.guilds.get(id))
            .ok_or_else(|| GuildError::not_found("Guild", name))
    }

    pub fn guild_of(&self, player: PlayerId) -> Result<&Guild, GuildError> {
        self.by_player
            .get(&player)
            .and_then(|id| self.guilds.get(id))
            .ok_or_else(|| GuildError::not_found("GuildMember", player))
    }

    pub fn get_guild(&self, key: &GuildKey) -> Result<&Guild, GuildError> {
        match key {
            GuildKey::Id(id) => self.guild(*id),
            GuildKey::Name(name) => self.guild_by_name(name),
            GuildKey::Player(player) => self.guild_of(*player),
        }
    }

    /// The guild of the player called `name`, resolved through `identity`.
    pub fn guild_of_named_player(
        &self,
        name: &str,
        identity: &dyn IdentityPort,
    ) -> Result<&Guild, GuildError> {
        let player = identity
            .player_id(name)
            .ok_or_else(|| GuildError::not_found("Player", name))?;
        self.guild_of(player)
    }

    pub fn guild_id_of(&self, player: PlayerId) -> Option<GuildId> {
        self.by_player.get(&player).copied()
    }

    pub fn in_guild(&self, player: PlayerId) -> bool {
        self.by_player.contains_key(&player)
    }

    pub fn guilds(&self) -> impl Iterator<Item = &Guild> {
        self.guilds.values()
    }

    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    pub fn tiers(&self) -> &TierLadder {
        &self.tiers
    }

    pub fn member_has_permission(
        &self,
        guild_id: GuildId,
        player: PlayerId,
        permission: RolePermission,
    ) -> Result<bool, GuildError> {
        let member = self.guild(guild_id)?.require_member(player)?;
        Ok(member.role().has_permission(permission))
    }

    fn ensure_not_in_guild(&self, player: PlayerId) -> Result<(), GuildError> {
        match self.by_player.get(&player) {
            Some(guild) => Err(GuildError::AlreadyInGuild {
                player,
                guild: *guild,
            }),
            None => Ok(()),
        }
    }

    fn ensure_name_free(&self, name: &GuildName, owner: Option<GuildId>) -> Result<(), GuildError> {
        match self.by_name.get(&name.index_key()) {
            Some(existing) if Some(*existing) != owner => {
                Err(GuildError::NameTaken(name.to_string()))
            }
            _ => Ok(()),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Found a guild on the starting tier with `master` as guild master.
    pub fn create_guild(
        &mut self,
        name: &str,
        prefix: &str,
        master: PlayerId,
    ) -> Result<GuildId, GuildError> {
        let name = GuildName::new(name)?;
        let prefix = GuildPrefix::new(prefix)?;
        self.ensure_name_free(&name, None)?;
        self.ensure_not_in_guild(master)?;

        let tier = self.tiers.starting_tier()?.clone();
        let guild = Guild::new(name, prefix, master, &self.hierarchy, tier, self.clock.now())?;
        let id = guild.id();

        tracing::info!(guild_id = %id, name = %guild.name(), master = %master, "Guild created");
        self.index(guild);
        Ok(id)
    }

    /// Drop the guild from every index.
    ///
    /// The stored record is not touched; [`super::shared::disband`] deletes
    /// it first while no snapshot save can run.
    pub fn disband(&mut self, id: GuildId) -> Result<Guild, GuildError> {
        let guild = self
            .guilds
            .remove(&id)
            .ok_or_else(|| GuildError::not_found("Guild", id))?;
        for player in guild.member_ids() {
            self.by_player.remove(&player);
        }
        self.by_name.remove(&guild.name().index_key());

        tracing::info!(guild_id = %id, members = guild.size(), "Guild disbanded");
        Ok(guild)
    }

    // =========================================================================
    // Membership
    // =========================================================================

    /// Add `player` at the lowest configured role.
    pub fn add_member(&mut self, guild_id: GuildId, player: PlayerId) -> Result<(), GuildError> {
        let role = self.hierarchy.lowest_role()?.clone();
        self.insert_member(guild_id, player, role)
    }

    pub fn add_member_with_level(
        &mut self,
        guild_id: GuildId,
        player: PlayerId,
        level: u32,
    ) -> Result<(), GuildError> {
        let role = self.hierarchy.role(level)?.clone();
        self.insert_member(guild_id, player, role)
    }

    fn insert_member(
        &mut self,
        guild_id: GuildId,
        player: PlayerId,
        role: GuildRole,
    ) -> Result<(), GuildError> {
        self.ensure_not_in_guild(player)?;
        let now = self.clock.now();
        let level = role.level();
        guild_mut(&mut self.guilds, guild_id)?.add_member(player, role, now)?;
        self.by_player.insert(player, guild_id);

        tracing::debug!(guild_id = %guild_id, player = %player, level, "Member added");
        Ok(())
    }

    pub fn remove_member(
        &mut self,
        guild_id: GuildId,
        player: PlayerId,
    ) -> Result<GuildMember, GuildError> {
        let member = guild_mut(&mut self.guilds, guild_id)?.remove_member(player)?;
        self.by_player.remove(&player);

        tracing::debug!(guild_id = %guild_id, player = %player, "Member removed");
        Ok(member)
    }

    pub fn transfer_master(
        &mut self,
        guild_id: GuildId,
        from: PlayerId,
        to: PlayerId,
    ) -> Result<MasterTransfer, GuildError> {
        let transfer =
            guild_mut(&mut self.guilds, guild_id)?.transfer_master(from, to, &self.hierarchy)?;

        tracing::info!(guild_id = %guild_id, from = %from, to = %to, "Guild master transferred");
        Ok(transfer)
    }

    pub fn promote(&mut self, guild_id: GuildId, player: PlayerId) -> Result<RoleChange, GuildError> {
        let change = guild_mut(&mut self.guilds, guild_id)?.promote(player, &self.hierarchy)?;
        tracing::debug!(guild_id = %guild_id, player = %player, role = %change.to, "Member promoted");
        Ok(change)
    }

    pub fn demote(&mut self, guild_id: GuildId, player: PlayerId) -> Result<RoleChange, GuildError> {
        let change = guild_mut(&mut self.guilds, guild_id)?.demote(player, &self.hierarchy)?;
        tracing::debug!(guild_id = %guild_id, player = %player, role = %change.to, "Member demoted");
        Ok(change)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Rename a guild. The id, and so the storage record, is unchanged.
    pub fn rename(&mut self, guild_id: GuildId, name: &str) -> Result<GuildRenamed, GuildError> {
        self.guild(guild_id)?;
        let name = GuildName::new(name)?;
        self.ensure_name_free(&name, Some(guild_id))?;

        let renamed = guild_mut(&mut self.guilds, guild_id)?.rename(name);
        if let GuildRenamed::Renamed { from, to } = &renamed {
            self.by_name.remove(&from.index_key());
            self.by_name.insert(to.index_key(), guild_id);
            tracing::info!(guild_id = %guild_id, from = %from, to = %to, "Guild renamed");
        }
        Ok(renamed)
    }

    pub fn set_prefix(&mut self, guild_id: GuildId, prefix: &str) -> Result<(), GuildError> {
        let prefix = GuildPrefix::new(prefix)?;
        guild_mut(&mut self.guilds, guild_id)?.set_prefix(prefix);
        Ok(())
    }

    pub fn set_status(&mut self, guild_id: GuildId, status: GuildStatus) -> Result<(), GuildError> {
        guild_mut(&mut self.guilds, guild_id)?.set_status(status);
        Ok(())
    }

    /// Move the guild to the next configured tier and return it.
    pub fn upgrade_tier(&mut self, guild_id: GuildId) -> Result<GuildTier, GuildError> {
        let current = self.guild(guild_id)?.tier().level();
        let next = self.tiers.next_after(current)?.clone();
        guild_mut(&mut self.guilds, guild_id)?.upgrade_tier(next.clone())?;

        tracing::info!(guild_id = %guild_id, tier = next.level(), "Guild tier upgraded");
        Ok(next)
    }

    // =========================================================================
    // Bank
    // =========================================================================

    /// Deposit on behalf of `player`, a member, and log it.
    pub fn deposit(
        &mut self,
        guild_id: GuildId,
        player: PlayerId,
        amount: f64,
    ) -> Result<BalanceChange, GuildError> {
        let now = self.clock.now();
        let change = guild_mut(&mut self.guilds, guild_id)?.deposit(player, amount, now)?;
        tracing::debug!(guild_id = %guild_id, player = %player, amount = change.amount, "Bank deposit");
        Ok(change)
    }

    /// Withdraw on behalf of `player`, a member, and log it.
    pub fn withdraw(
        &mut self,
        guild_id: GuildId,
        player: PlayerId,
        amount: f64,
    ) -> Result<BalanceChange, GuildError> {
        let now = self.clock.now();
        let change = guild_mut(&mut self.guilds, guild_id)?.withdraw(player, amount, now)?;
        tracing::debug!(guild_id = %guild_id, player = %player, amount = change.amount, "Bank withdrawal");
        Ok(change)
    }

    // =========================================================================
    // Invite Codes
    // =========================================================================

    /// Create a random invite code owned by `creator`, a member of the guild.
    pub fn create_code(
        &mut self,
        guild_id: GuildId,
        creator: PlayerId,
        uses: u32,
        ttl: Option<Duration>,
    ) -> Result<String, GuildError> {
        if uses == 0 {
            return Err(DomainError::validation("an invite code needs at least one use").into());
        }
        let guild = self.guild(guild_id)?;
        guild.require_member(creator)?;

        let code = (0..CODE_ATTEMPTS)
            .map(|_| self.random.alphanumeric(CODE_LENGTH))
            .find(|candidate| guild.code(candidate).is_none())
            .ok_or_else(|| DomainError::invalid_state("could not generate a unique invite code"))?;

        let mut entry = GuildCode::new(code.clone(), creator, uses);
        if let Some(ttl) = ttl {
            entry = entry.with_expiry(self.clock.now() + ttl);
        }
        guild_mut(&mut self.guilds, guild_id)?.add_code(entry)?;

        tracing::debug!(guild_id = %guild_id, creator = %creator, uses, "Invite code created");
        Ok(code)
    }

    pub fn remove_code(&mut self, guild_id: GuildId, code: &str) -> Result<GuildCode, GuildError> {
        Ok(guild_mut(&mut self.guilds, guild_id)?.remove_code(code)?)
    }

    /// Redeem `code` and add `player` at the lowest role.
    ///
    /// The code is consumed only if the player is added, and the player is
    /// added only if the code is consumed.
    pub fn join_with_code(
        &mut self,
        guild_id: GuildId,
        code: &str,
        player: PlayerId,
    ) -> Result<(), GuildError> {
        self.ensure_not_in_guild(player)?;
        let role = self.hierarchy.lowest_role()?.clone();
        let now = self.clock.now();
        guild_mut(&mut self.guilds, guild_id)?.join_with_code(code, player, role, now)?;
        self.by_player.insert(player, guild_id);

        tracing::info!(guild_id = %guild_id, player = %player, "Player joined with invite code");
        Ok(())
    }
}
