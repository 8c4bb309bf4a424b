//! Guild aggregate - a persistent group of players with roles and a shared bank
//!
//! # Rustic DDD Design
//!
//! - **Private fields**: membership and balance change only through methods
//! - **Newtypes**: `GuildName` / `GuildPrefix` are valid by construction
//! - **Events**: mutations return what changed (`RoleChange`, `BalanceChange`, ...)
//! - **Valid on load**: deserialization re-checks every invariant, so a
//!   damaged record is rejected instead of producing a half-built guild

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::entities::{BankLogEntry, BankLogKind, GuildCode, GuildMember, GuildRole, GuildTier};
use crate::error::DomainError;
use crate::events::{BalanceChange, GuildRenamed, MasterTransfer, RoleChange};
use crate::value_objects::{GuildName, GuildPrefix, RoleHierarchy};
use crate::{GuildId, PlayerId};

/// Lowest level a member may hold and still be promoted by `promote`.
const MIN_PROMOTABLE_LEVEL: u32 = 2;

/// Whether the guild accepts players without an invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuildStatus {
    Public,
    #[default]
    Private,
}

impl fmt::Display for GuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuildStatus::Public => write!(f, "public"),
            GuildStatus::Private => write!(f, "private"),
        }
    }
}

impl FromStr for GuildStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(GuildStatus::Public),
            "private" => Ok(GuildStatus::Private),
            other => Err(DomainError::validation(format!(
                "Unknown guild status: {}",
                other
            ))),
        }
    }
}

/// A guild and everything it owns.
///
/// # Invariants
///
/// - Exactly one member holds a level-0 role, and `master_id` points at it
/// - Member keys match the member's own id
/// - `balance` is finite, non-negative, rounded to two decimal places, and
///   within the tier's bank limit
/// - Code strings are unique within the guild
/// - `id` never changes; renaming only touches `name`
#[derive(Debug, Clone, PartialEq)]
pub struct Guild {
    id: GuildId,
    name: GuildName,
    prefix: GuildPrefix,
    status: GuildStatus,
    balance: f64,
    tier: GuildTier,
    members: HashMap<PlayerId, GuildMember>,
    master_id: PlayerId,
    codes: Vec<GuildCode>,
    bank_log: Vec<BankLogEntry>,
}

impl Guild {
    // =========================================================================
    // Constructor
    // =========================================================================

    /// Found a new guild with `master` holding the level-0 role.
    ///
    /// # Errors
    ///
    /// Propagates `NotFound` if the hierarchy has no master role.
    pub fn new(
        name: GuildName,
        prefix: GuildPrefix,
        master: PlayerId,
        hierarchy: &RoleHierarchy,
        tier: GuildTier,
        now: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let master_role = hierarchy.master_role()?.clone();
        let mut members = HashMap::new();
        members.insert(master, GuildMember::new(master, master_role, now));

        Ok(Self {
            id: GuildId::new(),
            name,
            prefix,
            status: GuildStatus::default(),
            balance: 0.0,
            tier,
            members,
            master_id: master,
            codes: Vec::new(),
            bank_log: Vec::new(),
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[inline]
    pub fn id(&self) -> GuildId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &GuildName {
        &self.name
    }

    #[inline]
    pub fn prefix(&self) -> &GuildPrefix {
        &self.prefix
    }

    #[inline]
    pub fn status(&self) -> GuildStatus {
        self.status
    }

    #[inline]
    pub fn balance(&self) -> f64 {
        self.balance
    }

    #[inline]
    pub fn tier(&self) -> &GuildTier {
        &self.tier
    }

    #[inline]
    pub fn master_id(&self) -> PlayerId {
        self.master_id
    }

    pub fn master(&self) -> Option<&GuildMember> {
        self.members.get(&self.master_id)
    }

    pub fn codes(&self) -> &[GuildCode] {
        &self.codes
    }

    /// Member deposits and withdrawals, oldest first.
    pub fn bank_log(&self) -> &[BankLogEntry] {
        &self.bank_log
    }

    // =========================================================================
    // Membership
    // =========================================================================

    pub fn member(&self, player: PlayerId) -> Option<&GuildMember> {
        self.members.get(&player)
    }

    pub fn require_member(&self, player: PlayerId) -> Result<&GuildMember, DomainError> {
        self.members
            .get(&player)
            .ok_or_else(|| DomainError::not_found("GuildMember", player))
    }

    fn member_mut(&mut self, player: PlayerId) -> Result<&mut GuildMember, DomainError> {
        self.members
            .get_mut(&player)
            .ok_or_else(|| DomainError::not_found("GuildMember", player))
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.members.contains_key(&player)
    }

    pub fn members(&self) -> impl Iterator<Item = &GuildMember> {
        self.members.values()
    }

    pub fn member_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.members.keys().copied()
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    /// Members for which `is_online` returns true.
    ///
    /// The presence check is supplied by the caller; the guild holds no lock
    /// while calling it.
    pub fn online_members<F>(&self, is_online: F) -> Vec<&GuildMember>
    where
        F: Fn(PlayerId) -> bool,
    {
        self.members
            .values()
            .filter(|member| is_online(member.id()))
            .collect()
    }

    fn ensure_can_join(&self, player: PlayerId, role: &GuildRole) -> Result<(), DomainError> {
        if self.contains(player) {
            return Err(DomainError::invalid_state(format!(
                "player {} is already a member of guild {}",
                player, self.name
            )));
        }
        if role.is_master() {
            return Err(DomainError::invalid_state(
                "guild already has a master; use a master transfer instead",
            ));
        }
        let current = u32::try_from(self.size()).unwrap_or(u32::MAX);
        if current >= self.tier.max_members() {
            return Err(DomainError::guild_full(current, self.tier.max_members()));
        }
        Ok(())
    }

    /// Add a player with a non-master role.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the player is already a member or `role` is level 0
    /// - `GuildFull` if the tier's member cap is reached
    pub fn add_member(
        &mut self,
        player: PlayerId,
        role: GuildRole,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_can_join(player, &role)?;
        self.members
            .insert(player, GuildMember::new(player, role, now));
        Ok(())
    }

    /// Remove a non-master member.
    ///
    /// The master has to transfer ownership first; disbanding bypasses this.
    pub fn remove_member(&mut self, player: PlayerId) -> Result<GuildMember, DomainError> {
        self.require_member(player)?;
        if player == self.master_id {
            return Err(DomainError::invalid_state(
                "guild master cannot leave; transfer the guild first",
            ));
        }
        self.members
            .remove(&player)
            .ok_or_else(|| DomainError::not_found("GuildMember", player))
    }

    /// Hand the master role from `from` to `to`.
    ///
    /// Every check runs before either member is touched, so the guild never
    /// has zero or two masters.
    pub fn transfer_master(
        &mut self,
        from: PlayerId,
        to: PlayerId,
        hierarchy: &RoleHierarchy,
    ) -> Result<MasterTransfer, DomainError> {
        self.require_member(from)?;
        self.require_member(to)?;
        if from != self.master_id {
            return Err(DomainError::invalid_state(format!(
                "player {} is not the guild master",
                from
            )));
        }
        if from == to {
            return Err(DomainError::invalid_state(
                "player is already the guild master",
            ));
        }

        let master_role = hierarchy.master_role()?.clone();
        let former_role = hierarchy.former_master_role()?.clone();

        self.member_mut(to)?.set_role(master_role);
        self.member_mut(from)?.set_role(former_role.clone());
        self.master_id = to;

        Ok(MasterTransfer {
            previous_master: from,
            new_master: to,
            previous_master_role: former_role,
        })
    }

    // =========================================================================
    // Promotion Policy
    // =========================================================================

    /// True iff promoting would not make the member master (level >= 2).
    pub fn can_promote(&self, player: PlayerId) -> Result<bool, DomainError> {
        Ok(self.require_member(player)?.role().level() >= MIN_PROMOTABLE_LEVEL)
    }

    /// Move a member one level up the hierarchy.
    ///
    /// # Errors
    ///
    /// `NotFound` if the member is missing or no role exists one level up
    /// (including a level-1 member, whose next level is the master's).
    pub fn promote(
        &mut self,
        player: PlayerId,
        hierarchy: &RoleHierarchy,
    ) -> Result<RoleChange, DomainError> {
        let level = self.require_member(player)?.role().level();
        let target = hierarchy.promotion_target(level)?.clone();
        let from = self.member_mut(player)?.set_role(target.clone());
        Ok(RoleChange {
            player,
            from,
            to: target,
        })
    }

    /// Move a member one level down the hierarchy.
    ///
    /// # Errors
    ///
    /// - `InvalidState` for the master
    /// - `NotFound` if the member is missing or already at the lowest role
    pub fn demote(
        &mut self,
        player: PlayerId,
        hierarchy: &RoleHierarchy,
    ) -> Result<RoleChange, DomainError> {
        let member = self.require_member(player)?;
        if member.is_master() {
            return Err(DomainError::invalid_state(
                "guild master cannot be demoted; transfer the guild instead",
            ));
        }
        let target = hierarchy.demotion_target(member.role().level())?.clone();
        let from = self.member_mut(player)?.set_role(target.clone());
        Ok(RoleChange {
            player,
            from,
            to: target,
        })
    }

    pub fn current_role_name(&self, player: PlayerId) -> Result<&str, DomainError> {
        Ok(self.require_member(player)?.role().name())
    }

    /// Name of the role a just-promoted member held before (one level down).
    pub fn pre_promotion_role_name<'h>(
        &self,
        player: PlayerId,
        hierarchy: &'h RoleHierarchy,
    ) -> Result<&'h str, DomainError> {
        let level = self.require_member(player)?.role().level();
        let previous = level
            .checked_add(1)
            .ok_or_else(|| DomainError::not_found("GuildRole", "pre-promotion"))?;
        Ok(hierarchy.role(previous)?.name())
    }

    /// Name of the role a just-demoted member held before (one level up).
    pub fn pre_demotion_role_name<'h>(
        &self,
        player: PlayerId,
        hierarchy: &'h RoleHierarchy,
    ) -> Result<&'h str, DomainError> {
        let level = self.require_member(player)?.role().level();
        let previous = level
            .checked_sub(1)
            .ok_or_else(|| DomainError::not_found("GuildRole", "pre-demotion"))?;
        Ok(hierarchy.role(previous)?.name())
    }

    // =========================================================================
    // Bank
    // =========================================================================

    /// Deposit into the guild bank.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for negative, NaN, or infinite amounts
    /// - `BankLimitExceeded` if the tier's maximum balance would be passed
    pub fn credit(&mut self, amount: f64) -> Result<BalanceChange, DomainError> {
        let amount = validate_amount(amount)?;
        let total = round_currency(self.balance + amount);
        if total > self.tier.max_bank_balance() {
            return Err(DomainError::bank_limit_exceeded(
                self.tier.max_bank_balance(),
            ));
        }
        let previous = std::mem::replace(&mut self.balance, total);
        Ok(BalanceChange {
            amount,
            previous,
            current: total,
        })
    }

    /// Withdraw from the guild bank.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for negative, NaN, or infinite amounts
    /// - `InsufficientFunds` if `amount` exceeds the balance
    pub fn debit(&mut self, amount: f64) -> Result<BalanceChange, DomainError> {
        let amount = validate_amount(amount)?;
        if amount > self.balance {
            return Err(DomainError::insufficient_funds(amount, self.balance));
        }
        let current = round_currency(self.balance - amount);
        let previous = std::mem::replace(&mut self.balance, current);
        Ok(BalanceChange {
            amount,
            previous,
            current,
        })
    }

    /// Credit on behalf of `player` and record it in the bank log.
    ///
    /// # Errors
    ///
    /// `NotFound` if `player` is not a member, otherwise as [`Guild::credit`].
    pub fn deposit(
        &mut self,
        player: PlayerId,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<BalanceChange, DomainError> {
        self.require_member(player)?;
        let change = self.credit(amount)?;
        self.bank_log
            .push(BankLogEntry::new(BankLogKind::Deposit, player, change.amount, now));
        Ok(change)
    }

    /// Debit on behalf of `player` and record it in the bank log.
    ///
    /// # Errors
    ///
    /// `NotFound` if `player` is not a member, otherwise as [`Guild::debit`].
    pub fn withdraw(
        &mut self,
        player: PlayerId,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<BalanceChange, DomainError> {
        self.require_member(player)?;
        let change = self.debit(amount)?;
        self.bank_log
            .push(BankLogEntry::new(BankLogKind::Withdraw, player, change.amount, now));
        Ok(change)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    pub fn rename(&mut self, name: GuildName) -> GuildRenamed {
        if name == self.name {
            return GuildRenamed::Unchanged;
        }
        let from = std::mem::replace(&mut self.name, name.clone());
        GuildRenamed::Renamed { from, to: name }
    }

    pub fn set_prefix(&mut self, prefix: GuildPrefix) {
        self.prefix = prefix;
    }

    pub fn set_status(&mut self, status: GuildStatus) {
        self.status = status;
    }

    /// Move to a strictly higher tier. Returns the previous tier.
    pub fn upgrade_tier(&mut self, next: GuildTier) -> Result<GuildTier, DomainError> {
        if next.level() <= self.tier.level() {
            return Err(DomainError::invalid_state(format!(
                "cannot move from tier {} to tier {}",
                self.tier.level(),
                next.level()
            )));
        }
        Ok(std::mem::replace(&mut self.tier, next))
    }

    // =========================================================================
    // Invite Codes
    // =========================================================================

    pub fn code(&self, code: &str) -> Option<&GuildCode> {
        self.codes.iter().find(|c| c.code() == code)
    }

    pub fn active_codes(&self, now: DateTime<Utc>) -> impl Iterator<Item = &GuildCode> {
        self.codes.iter().filter(move |c| c.is_active(now))
    }

    pub fn add_code(&mut self, code: GuildCode) -> Result<(), DomainError> {
        if self.code(code.code()).is_some() {
            return Err(DomainError::invalid_state(format!(
                "code {} already exists",
                code.code()
            )));
        }
        self.codes.push(code);
        Ok(())
    }

    pub fn remove_code(&mut self, code: &str) -> Result<GuildCode, DomainError> {
        let index = self
            .codes
            .iter()
            .position(|c| c.code() == code)
            .ok_or_else(|| DomainError::not_found("GuildCode", code))?;
        Ok(self.codes.remove(index))
    }

    /// Consume one use of `code` on behalf of `player`.
    ///
    /// # Errors
    ///
    /// `NotFound` for an unknown code, `InvalidState` for an inert one.
    pub fn redeem_code(
        &mut self,
        code: &str,
        player: PlayerId,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.codes
            .iter_mut()
            .find(|c| c.code() == code)
            .ok_or_else(|| DomainError::not_found("GuildCode", code))?
            .redeem(player, now)
    }

    /// Redeem `code` and add `player` with `role` in one step.
    ///
    /// Either both happen or neither does.
    pub fn join_with_code(
        &mut self,
        code: &str,
        player: PlayerId,
        role: GuildRole,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        self.ensure_can_join(player, &role)?;
        self.redeem_code(code, player, now)?;
        self.members
            .insert(player, GuildMember::new(player, role, now));
        Ok(())
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check every aggregate invariant.
    pub fn validate(&self) -> Result<(), DomainError> {
        for (key, member) in &self.members {
            if *key != member.id() {
                return Err(DomainError::invalid_state(format!(
                    "member keyed {} carries id {}",
                    key,
                    member.id()
                )));
            }
        }

        let masters: Vec<PlayerId> = self
            .members
            .values()
            .filter(|m| m.is_master())
            .map(GuildMember::id)
            .collect();
        match masters.as_slice() {
            [only] if *only == self.master_id => {}
            [] => return Err(DomainError::invalid_state("guild has no master")),
            [_] => {
                return Err(DomainError::invalid_state(
                    "guild master does not match the recorded master",
                ))
            }
            many => {
                return Err(DomainError::invalid_state(format!(
                    "guild has {} masters",
                    many.len()
                )))
            }
        }

        if !self.balance.is_finite()
            || self.balance < 0.0
            || round_currency(self.balance) != self.balance
        {
            return Err(DomainError::invalid_state(format!(
                "guild balance {} is invalid",
                self.balance
            )));
        }
        if self.balance > self.tier.max_bank_balance() {
            return Err(DomainError::invalid_state(format!(
                "guild balance {} exceeds the tier limit of {}",
                self.balance,
                self.tier.max_bank_balance()
            )));
        }
        if let Some(entry) = self
            .bank_log
            .iter()
            .find(|e| !e.amount().is_finite() || e.amount() < 0.0)
        {
            return Err(DomainError::invalid_state(format!(
                "bank log amount {} is invalid",
                entry.amount()
            )));
        }

        let mut seen = HashSet::new();
        for code in &self.codes {
            if !seen.insert(code.code()) {
                return Err(DomainError::invalid_state(format!(
                    "duplicate code {}",
                    code.code()
                )));
            }
        }

        Ok(())
    }
}

fn validate_amount(amount: f64) -> Result<f64, DomainError> {
    if !amount.is_finite() {
        return Err(DomainError::invalid_amount("amount must be a finite number"));
    }
    if amount < 0.0 {
        return Err(DomainError::invalid_amount(format!(
            "amount cannot be negative: {}",
            amount
        )));
    }
    Ok(round_currency(amount))
}

fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Serde Implementation
// ============================================================================

/// Intermediate format for serialization that matches the stored format
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GuildWireFormat {
    id: GuildId,
    name: GuildName,
    prefix: GuildPrefix,
    #[serde(default)]
    status: GuildStatus,
    #[serde(default)]
    balance: f64,
    tier: GuildTier,
    members: Vec<GuildMember>,
    #[serde(default)]
    codes: Vec<GuildCode>,
    #[serde(default)]
    bank_log: Vec<BankLogEntry>,
}

impl TryFrom<GuildWireFormat> for Guild {
    type Error = DomainError;

    fn try_from(wire: GuildWireFormat) -> Result<Self, Self::Error> {
        let mut members = HashMap::with_capacity(wire.members.len());
        for member in wire.members {
            let id = member.id();
            if members.insert(id, member).is_some() {
                return Err(DomainError::invalid_state(format!(
                    "player {} listed twice",
                    id
                )));
            }
        }

        let master_id = members
            .values()
            .find(|m| m.is_master())
            .map(GuildMember::id)
            .ok_or_else(|| DomainError::invalid_state("guild has no master"))?;

        let guild = Guild {
            id: wire.id,
            name: wire.name,
            prefix: wire.prefix,
            status: wire.status,
            balance: wire.balance,
            tier: wire.tier,
            members,
            master_id,
            codes: wire.codes,
            bank_log: wire.bank_log,
        };
        guild.validate()?;
        Ok(guild)
    }
}

impl Serialize for Guild {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Stable member order keeps rewritten files diffable
        let mut members: Vec<GuildMember> = self.members.values().cloned().collect();
        members.sort_by(|a, b| {
            a.role()
                .level()
                .cmp(&b.role().level())
                .then(a.joined_at().cmp(&b.joined_at()))
                .then(a.id().cmp(&b.id()))
        });

        let wire = GuildWireFormat {
            id: self.id,
            name: self.name.clone(),
            prefix: self.prefix.clone(),
            status: self.status,
            balance: self.balance,
            tier: self.tier.clone(),
            members,
            codes: self.codes.clone(),
            bank_log: self.bank_log.clone(),
        };
        wire.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Guild {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let wire = GuildWireFormat::deserialize(deserializer)?;
        Guild::try_from(wire).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 18, 0, 0).unwrap()
    }

    fn hierarchy() -> RoleHierarchy {
        RoleHierarchy::new([
            GuildRole::new("Guild Master", 0),
            GuildRole::new("Officer", 1),
            GuildRole::new("Veteran", 2),
            GuildRole::new("Member", 3),
            GuildRole::new("Recruit", 4),
        ])
        .unwrap()
    }

    fn tier() -> GuildTier {
        GuildTier::new(1, "Fledgling", 5, 1_000.0)
    }

    fn create_test_guild() -> (Guild, PlayerId) {
        let master = PlayerId::new();
        let guild = Guild::new(
            GuildName::new("Iron Wolves").unwrap(),
            GuildPrefix::new("IWF").unwrap(),
            master,
            &hierarchy(),
            tier(),
            now(),
        )
        .unwrap();
        (guild, master)
    }

    fn role(level: u32) -> GuildRole {
        hierarchy().role(level).unwrap().clone()
    }

    fn master_count(guild: &Guild) -> usize {
        guild.members().filter(|m| m.is_master()).count()
    }

    mod constructor {
        use super::*;

        #[test]
        fn new_guild_has_single_master_and_empty_bank() {
            let (guild, master) = create_test_guild();

            assert_eq!(guild.size(), 1);
            assert_eq!(guild.master_id(), master);
            assert!(guild.master().unwrap().is_master());
            assert_eq!(guild.balance(), 0.0);
            assert_eq!(guild.status(), GuildStatus::Private);
            assert!(guild.codes().is_empty());
            assert!(guild.validate().is_ok());
        }
    }

    mod membership {
        use super::*;

        #[test]
        fn add_member_then_lookup() {
            let (mut guild, _) = create_test_guild();
            let player = PlayerId::new();

            guild.add_member(player, role(3), now()).unwrap();

            let member = guild.member(player).unwrap();
            assert_eq!(member.role().level(), 3);
            assert_eq!(member.joined_at(), now());
            assert!(guild.contains(player));
            assert_eq!(guild.size(), 2);
        }

        #[test]
        fn add_member_rejects_duplicates() {
            let (mut guild, master) = create_test_guild();
            let err = guild.add_member(master, role(3), now()).unwrap_err();
            assert!(matches!(err, DomainError::InvalidState(_)));
        }

        #[test]
        fn add_member_rejects_second_master() {
            let (mut guild, _) = create_test_guild();
            let err = guild.add_member(PlayerId::new(), role(0), now()).unwrap_err();
            assert!(matches!(err, DomainError::InvalidState(_)));
            assert_eq!(master_count(&guild), 1);
        }

        #[test]
        fn add_member_respects_tier_capacity() {
            let (mut guild, _) = create_test_guild();
            for _ in 0..4 {
                guild.add_member(PlayerId::new(), role(4), now()).unwrap();
            }
            let err = guild.add_member(PlayerId::new(), role(4), now()).unwrap_err();
            assert_eq!(err, DomainError::guild_full(5, 5));
        }

        #[test]
        fn remove_member_rejects_master() {
            let (mut guild, master) = create_test_guild();
            let err = guild.remove_member(master).unwrap_err();
            assert!(matches!(err, DomainError::InvalidState(_)));
            assert!(guild.contains(master));
        }

        #[test]
        fn remove_unknown_member_is_not_found() {
            let (mut guild, _) = create_test_guild();
            assert!(guild.remove_member(PlayerId::new()).unwrap_err().is_not_found());
        }

        #[test]
        fn online_members_uses_presence_check() {
            let (mut guild, master) = create_test_guild();
            let offline = PlayerId::new();
            guild.add_member(offline, role(3), now()).unwrap();

            let online = guild.online_members(|player| player == master);

            assert_eq!(online.len(), 1);
            assert_eq!(online[0].id(), master);
        }
    }

    mod transfer {
        use super::*;

        #[test]
        fn transfer_swaps_master_atomically() {
            let (mut guild, master) = create_test_guild();
            let heir = PlayerId::new();
            guild.add_member(heir, role(2), now()).unwrap();

            let transfer = guild.transfer_master(master, heir, &hierarchy()).unwrap();

            assert_eq!(transfer.new_master, heir);
            assert_eq!(transfer.previous_master_role.level(), 1);
            assert_eq!(guild.master_id(), heir);
            assert_eq!(guild.member(master).unwrap().role().level(), 1);
            assert_eq!(master_count(&guild), 1);
            assert!(guild.validate().is_ok());
        }

        #[test]
        fn transfer_to_non_member_changes_nothing() {
            let (mut guild, master) = create_test_guild();
            let before = guild.clone();

            let err = guild
                .transfer_master(master, PlayerId::new(), &hierarchy())
                .unwrap_err();

            assert!(err.is_not_found());
            assert_eq!(guild, before);
        }

        #[test]
        fn transfer_from_non_master_rejected() {
            let (mut guild, _) = create_test_guild();
            let a = PlayerId::new();
            let b = PlayerId::new();
            guild.add_member(a, role(1), now()).unwrap();
            guild.add_member(b, role(3), now()).unwrap();

            let err = guild.transfer_master(a, b, &hierarchy()).unwrap_err();
            assert!(matches!(err, DomainError::InvalidState(_)));
            assert_eq!(master_count(&guild), 1);
        }

        #[test]
        fn transfer_honours_configured_former_master_level() {
            let (mut guild, master) = create_test_guild();
            let heir = PlayerId::new();
            guild.add_member(heir, role(3), now()).unwrap();
            let hierarchy = hierarchy().with_former_master_level(2).unwrap();

            guild.transfer_master(master, heir, &hierarchy).unwrap();

            assert_eq!(guild.member(master).unwrap().role().name(), "Veteran");
        }
    }

    mod promotion {
        use super::*;

        #[test]
        fn level_two_promotes_to_level_one() {
            let (mut guild, _) = create_test_guild();
            let player = PlayerId::new();
            guild.add_member(player, role(2), now()).unwrap();

            assert!(guild.can_promote(player).unwrap());
            let change = guild.promote(player, &hierarchy()).unwrap();

            assert_eq!(change.from.level(), 2);
            assert_eq!(change.to.level(), 1);
            assert_eq!(guild.member(player).unwrap().role().level(), 1);
        }

        #[test]
        fn level_one_cannot_be_promoted() {
            let (mut guild, _) = create_test_guild();
            let player = PlayerId::new();
            guild.add_member(player, role(1), now()).unwrap();

            assert!(!guild.can_promote(player).unwrap());
            let err = guild.promote(player, &hierarchy()).unwrap_err();

            assert!(err.is_not_found());
            assert_eq!(guild.member(player).unwrap().role().level(), 1);
            assert_eq!(master_count(&guild), 1);
        }

        #[test]
        fn demote_stops_at_lowest_role() {
            let (mut guild, _) = create_test_guild();
            let player = PlayerId::new();
            guild.add_member(player, role(3), now()).unwrap();

            let change = guild.demote(player, &hierarchy()).unwrap();
            assert_eq!(change.to.level(), 4);

            let err = guild.demote(player, &hierarchy()).unwrap_err();
            assert!(err.is_not_found());
            assert_eq!(guild.member(player).unwrap().role().level(), 4);
        }

        #[test]
        fn master_cannot_be_demoted() {
            let (mut guild, master) = create_test_guild();
            let err = guild.demote(master, &hierarchy()).unwrap_err();
            assert!(matches!(err, DomainError::InvalidState(_)));
            assert_eq!(master_count(&guild), 1);
        }

        #[test]
        fn role_name_projections() {
            let (mut guild, master) = create_test_guild();
            let player = PlayerId::new();
            guild.add_member(player, role(2), now()).unwrap();
            let hierarchy = hierarchy();

            assert_eq!(guild.current_role_name(player).unwrap(), "Veteran");
            assert_eq!(
                guild.pre_promotion_role_name(player, &hierarchy).unwrap(),
                "Member"
            );
            assert_eq!(
                guild.pre_demotion_role_name(player, &hierarchy).unwrap(),
                "Officer"
            );
            assert!(guild
                .pre_demotion_role_name(master, &hierarchy)
                .unwrap_err()
                .is_not_found());
        }

        #[test]
        fn pre_promotion_name_surfaces_missing_role() {
            let (mut guild, _) = create_test_guild();
            let player = PlayerId::new();
            guild.add_member(player, role(4), now()).unwrap();

            assert!(guild
                .pre_promotion_role_name(player, &hierarchy())
                .unwrap_err()
                .is_not_found());
        }
    }

    mod bank {
        use super::*;

        #[test]
        fn credit_and_debit_round_to_cents() {
            let (mut guild, _) = create_test_guild();

            let change = guild.credit(10.006).unwrap();
            assert_eq!(change.previous, 0.0);
            assert_eq!(guild.balance(), 10.01);

            guild.debit(0.51).unwrap();
            assert_eq!(guild.balance(), 9.5);
        }

        #[test]
        fn debit_beyond_balance_leaves_balance_unchanged() {
            let (mut guild, _) = create_test_guild();
            guild.credit(25.0).unwrap();

            let err = guild.debit(guild.balance() + 1.0).unwrap_err();

            assert!(matches!(err, DomainError::InsufficientFunds { .. }));
            assert_eq!(guild.balance(), 25.0);
        }

        #[test]
        fn negative_or_non_finite_amounts_rejected() {
            let (mut guild, _) = create_test_guild();
            guild.credit(5.0).unwrap();

            assert!(matches!(
                guild.credit(-5.0).unwrap_err(),
                DomainError::InvalidAmount(_)
            ));
            assert!(matches!(
                guild.debit(f64::NAN).unwrap_err(),
                DomainError::InvalidAmount(_)
            ));
            assert!(matches!(
                guild.credit(f64::INFINITY).unwrap_err(),
                DomainError::InvalidAmount(_)
            ));
            assert_eq!(guild.balance(), 5.0);
        }

        #[test]
        fn credit_capped_by_tier() {
            let (mut guild, _) = create_test_guild();
            guild.credit(900.0).unwrap();

            let err = guild.credit(200.0).unwrap_err();

            assert!(matches!(err, DomainError::BankLimitExceeded { .. }));
            assert_eq!(guild.balance(), 900.0);
        }

        #[test]
        fn member_deposits_and_withdrawals_are_logged_in_order() {
            let (mut guild, master) = create_test_guild();
            let player = PlayerId::new();
            guild.add_member(player, role(3), now()).unwrap();
            let later = now() + Duration::minutes(5);

            guild.deposit(player, 40.004, now()).unwrap();
            guild.withdraw(master, 15.0, later).unwrap();

            let log = guild.bank_log();
            assert_eq!(log.len(), 2);
            assert_eq!(log[0].kind(), BankLogKind::Deposit);
            assert_eq!(log[0].player(), player);
            assert_eq!(log[0].amount(), 40.0);
            assert_eq!(log[0].at(), now());
            assert_eq!(log[1].kind(), BankLogKind::Withdraw);
            assert_eq!(log[1].player(), master);
            assert_eq!(log[1].at(), later);
            assert_eq!(guild.balance(), 25.0);
        }

        #[test]
        fn rejected_movements_are_not_logged() {
            let (mut guild, master) = create_test_guild();

            assert!(guild.withdraw(master, 1.0, now()).is_err());
            assert!(guild.deposit(master, 5_000.0, now()).is_err());
            assert!(guild
                .deposit(PlayerId::new(), 1.0, now())
                .unwrap_err()
                .is_not_found());

            assert!(guild.bank_log().is_empty());
            assert_eq!(guild.balance(), 0.0);
        }

        #[test]
        fn plain_credit_leaves_no_log_entry() {
            let (mut guild, _) = create_test_guild();
            guild.credit(10.0).unwrap();
            assert!(guild.bank_log().is_empty());
        }
    }

    mod settings {
        use super::*;

        #[test]
        fn rename_keeps_id() {
            let (mut guild, _) = create_test_guild();
            let id = guild.id();

            let outcome = guild.rename(GuildName::new("Silver Wolves").unwrap());

            assert!(matches!(outcome, GuildRenamed::Renamed { .. }));
            assert_eq!(guild.id(), id);
            assert_eq!(guild.name().as_str(), "Silver Wolves");
            assert_eq!(
                guild.rename(GuildName::new("Silver Wolves").unwrap()),
                GuildRenamed::Unchanged
            );
        }

        #[test]
        fn tier_only_moves_up() {
            let (mut guild, _) = create_test_guild();
            let previous = guild
                .upgrade_tier(GuildTier::new(2, "Established", 20, 5_000.0))
                .unwrap();
            assert_eq!(previous.level(), 1);
            assert!(guild.upgrade_tier(tier()).is_err());
            assert_eq!(guild.tier().level(), 2);
        }

        #[test]
        fn status_parses_case_insensitively() {
            assert_eq!("PUBLIC".parse::<GuildStatus>().unwrap(), GuildStatus::Public);
            assert!("hidden".parse::<GuildStatus>().is_err());
        }
    }

    mod codes {
        use super::*;

        #[test]
        fn duplicate_code_rejected() {
            let (mut guild, master) = create_test_guild();
            guild.add_code(GuildCode::new("JOINUS", master, 3)).unwrap();
            assert!(guild.add_code(GuildCode::new("JOINUS", master, 1)).is_err());
            assert_eq!(guild.codes().len(), 1);
        }

        #[test]
        fn join_with_code_adds_member_and_consumes_use() {
            let (mut guild, master) = create_test_guild();
            guild.add_code(GuildCode::new("JOINUS", master, 1)).unwrap();
            let player = PlayerId::new();

            guild.join_with_code("JOINUS", player, role(4), now()).unwrap();

            assert!(guild.contains(player));
            assert_eq!(guild.code("JOINUS").unwrap().uses_remaining(), 0);
            assert_eq!(guild.active_codes(now()).count(), 0);
        }

        #[test]
        fn inert_code_adds_nobody() {
            let (mut guild, master) = create_test_guild();
            guild
                .add_code(
                    GuildCode::new("OLD", master, 3).with_expiry(now() - Duration::hours(1)),
                )
                .unwrap();
            let player = PlayerId::new();

            let err = guild.join_with_code("OLD", player, role(4), now()).unwrap_err();

            assert!(matches!(err, DomainError::InvalidState(_)));
            assert!(!guild.contains(player));
            assert_eq!(guild.code("OLD").unwrap().uses_remaining(), 3);
        }

        #[test]
        fn member_cannot_burn_a_code() {
            let (mut guild, master) = create_test_guild();
            guild.add_code(GuildCode::new("JOINUS", master, 1)).unwrap();

            assert!(guild.join_with_code("JOINUS", master, role(4), now()).is_err());
            assert_eq!(guild.code("JOINUS").unwrap().uses_remaining(), 1);
        }

        #[test]
        fn remove_code() {
            let (mut guild, master) = create_test_guild();
            guild.add_code(GuildCode::new("JOINUS", master, 1)).unwrap();

            assert_eq!(guild.remove_code("JOINUS").unwrap().code(), "JOINUS");
            assert!(guild.remove_code("JOINUS").unwrap_err().is_not_found());
        }
    }

    mod scenario {
        use super::*;

        #[test]
        fn promote_then_transfer_then_remove_former_master() {
            let hierarchy = hierarchy();
            let (mut guild, m) = create_test_guild();
            let a = PlayerId::new();

            guild.add_member(a, role(3), now()).unwrap();
            assert!(guild.can_promote(a).unwrap());

            guild.promote(a, &hierarchy).unwrap();
            assert_eq!(guild.member(a).unwrap().role().level(), 2);

            guild.transfer_master(m, a, &hierarchy).unwrap();
            assert!(guild.member(a).unwrap().is_master());
            assert_eq!(
                guild.member(m).unwrap().role().level(),
                hierarchy.former_master_level()
            );

            guild.remove_member(m).unwrap();
            assert!(!guild.contains(m));
            assert_eq!(master_count(&guild), 1);
            assert!(guild.validate().is_ok());
        }
    }

    mod wire_format {
        use super::*;

        #[test]
        fn roundtrip_preserves_every_field() {
            let (mut guild, master) = create_test_guild();
            let player = PlayerId::new();
            guild.add_member(player, role(3), now()).unwrap();
            guild.credit(123.45).unwrap();
            guild.withdraw(player, 3.45, now()).unwrap();
            guild.set_status(GuildStatus::Public);
            guild
                .add_code(GuildCode::new("JOINUS", master, 2).with_expiry(now() + Duration::days(7)))
                .unwrap();

            let json = serde_json::to_string(&guild).unwrap();
            let back: Guild = serde_json::from_str(&json).unwrap();

            assert_eq!(back, guild);
            assert_eq!(back.bank_log().len(), 1);
            assert!(json.contains("\"bankLog\""));
        }

        #[test]
        fn record_without_bank_log_loads_empty() {
            let (guild, _) = create_test_guild();
            let mut value = serde_json::to_value(&guild).unwrap();
            value.as_object_mut().unwrap().remove("bankLog");

            let back: Guild = serde_json::from_value(value).unwrap();
            assert!(back.bank_log().is_empty());
        }

        #[test]
        fn serialize_produces_camel_case() {
            let (guild, _) = create_test_guild();
            let json = serde_json::to_string(&guild).unwrap();

            assert!(json.contains("\"maxBankBalance\""));
            assert!(json.contains("\"joinedAt\""));
            assert!(json.contains("\"PRIVATE\""));
        }

        #[test]
        fn record_with_two_masters_rejected() {
            let (guild, _) = create_test_guild();
            let mut value = serde_json::to_value(&guild).unwrap();
            let extra = serde_json::to_value(GuildMember::new(PlayerId::new(), role(0), now()))
                .unwrap();
            value["members"].as_array_mut().unwrap().push(extra);

            let err = serde_json::from_value::<Guild>(value).unwrap_err();
            assert!(err.to_string().contains("2 masters"));
        }

        #[test]
        fn record_without_master_rejected() {
            let (guild, _) = create_test_guild();
            let mut value = serde_json::to_value(&guild).unwrap();
            value["members"] = serde_json::json!([]);

            assert!(serde_json::from_value::<Guild>(value).is_err());
        }

        #[test]
        fn record_with_negative_balance_rejected() {
            let (guild, _) = create_test_guild();
            let mut value = serde_json::to_value(&guild).unwrap();
            value["balance"] = serde_json::json!(-1.0);

            assert!(serde_json::from_value::<Guild>(value).is_err());
        }

        #[test]
        fn record_with_fractional_cents_rejected() {
            let (guild, _) = create_test_guild();
            let mut value = serde_json::to_value(&guild).unwrap();
            value["balance"] = serde_json::json!(10.005);

            let err = serde_json::from_value::<Guild>(value).unwrap_err();
            assert!(err.to_string().contains("balance"));
        }

        #[test]
        fn record_over_tier_bank_limit_rejected() {
            let (guild, _) = create_test_guild();
            let mut value = serde_json::to_value(&guild).unwrap();
            value["balance"] = serde_json::json!(1_000.01);

            let err = serde_json::from_value::<Guild>(value).unwrap_err();
            assert!(err.to_string().contains("tier limit"));
        }
    }
}
