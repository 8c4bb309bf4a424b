//! Engine configuration: environment settings and guild rules.
//!
//! `EngineSettings` comes from environment variables (a `.env` file is
//! loaded by the binary first). `GuildRules` is an optional JSON file that
//! replaces the built-in role and tier ladders.

use std::path::{Path, PathBuf};
use std::time::Duration;

use guilds_domain::{
    DomainError, GuildRole, GuildTier, RoleHierarchy, RolePermission, TierLadder,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_DATA_ROOT: &str = ".";
const DEFAULT_AUTOSAVE_SECS: u64 = 300;
const LOAD_POLICY_VAR: &str = "GUILDS_LOAD_POLICY";

/// Configuration failures. Always fatal at startup.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Failed to read rules file {}: {source}", path.display())]
    RulesIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse rules file {}: {message}", path.display())]
    RulesParse { path: PathBuf, message: String },

    #[error("Invalid guild rules: {0}")]
    Rules(#[from] DomainError),
}

// ============================================================================
// Load Failure Policy
// ============================================================================

/// What to do with a stored record that cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadFailurePolicy {
    /// Any bad record stops startup.
    Abort,
    /// Log the bad record and keep loading the rest.
    #[default]
    SkipAndLog,
}

impl std::fmt::Display for LoadFailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadFailurePolicy::Abort => write!(f, "abort"),
            LoadFailurePolicy::SkipAndLog => write!(f, "skip_and_log"),
        }
    }
}

impl std::str::FromStr for LoadFailurePolicy {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" | "fail" => Ok(LoadFailurePolicy::Abort),
            "skip_and_log" | "skipandlog" | "skip" => Ok(LoadFailurePolicy::SkipAndLog),
            _ => Err(SettingsError::InvalidValue {
                key: LOAD_POLICY_VAR,
                value: s.to_string(),
            }),
        }
    }
}

// ============================================================================
// Engine Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Directory holding `data/`
    pub data_root: PathBuf,
    pub autosave_interval: Duration,
    pub load_policy: LoadFailurePolicy,
    pub rules_file: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            autosave_interval: Duration::from_secs(DEFAULT_AUTOSAVE_SECS),
            load_policy: LoadFailurePolicy::default(),
            rules_file: None,
        }
    }
}

impl EngineSettings {
    /// Read `GUILDS_*` variables from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut settings = Self::default();

        if let Some(root) = get("GUILDS_DATA_ROOT") {
            settings.data_root = PathBuf::from(root);
        }

        if let Some(raw) = get("GUILDS_AUTOSAVE_SECS") {
            let secs: u64 = raw
                .parse()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(SettingsError::InvalidValue {
                    key: "GUILDS_AUTOSAVE_SECS",
                    value: raw.clone(),
                })?;
            settings.autosave_interval = Duration::from_secs(secs);
        }

        if let Some(raw) = get(LOAD_POLICY_VAR) {
            settings.load_policy = raw.parse()?;
        }

        settings.rules_file = get("GUILDS_RULES_FILE").map(PathBuf::from);

        Ok(settings)
    }

    /// The configured rules file, or the built-in defaults.
    pub fn rules(&self) -> Result<GuildRules, SettingsError> {
        match &self.rules_file {
            Some(path) => GuildRules::from_file(path),
            None => Ok(GuildRules::default()),
        }
    }
}

// ============================================================================
// Guild Rules
// ============================================================================

/// Role and tier ladders shared by every guild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildRules {
    pub roles: Vec<GuildRole>,
    pub tiers: Vec<GuildTier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub former_master_level: Option<u32>,
}

impl Default for GuildRules {
    fn default() -> Self {
        use RolePermission::*;

        Self {
            roles: vec![
                GuildRole::new("Guild Master", 0).with_permissions(RolePermission::all()),
                GuildRole::new("Officer", 1).with_permissions([
                    InviteMembers,
                    KickMembers,
                    PromoteMembers,
                    DemoteMembers,
                    DepositMoney,
                    WithdrawMoney,
                    CreateCode,
                    DeleteCode,
                    ChangeStatus,
                ]),
                GuildRole::new("Veteran", 2).with_permissions([
                    InviteMembers,
                    DepositMoney,
                    CreateCode,
                ]),
                GuildRole::new("Member", 3).with_permissions([DepositMoney]),
                GuildRole::new("Recruit", 4),
            ],
            tiers: vec![
                GuildTier::new(1, "Fledgling", 10, 10_000.0),
                GuildTier::new(2, "Established", 20, 50_000.0),
                GuildTier::new(3, "Renowned", 40, 250_000.0),
            ],
            former_master_level: None,
        }
    }
}

impl GuildRules {
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::RulesIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|e| SettingsError::RulesParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn hierarchy(&self) -> Result<RoleHierarchy, DomainError> {
        let hierarchy = RoleHierarchy::new(self.roles.iter().cloned())?;
        match self.former_master_level {
            Some(level) => hierarchy.with_former_master_level(level),
            None => Ok(hierarchy),
        }
    }

    pub fn tier_ladder(&self) -> Result<TierLadder, DomainError> {
        TierLadder::new(self.tiers.iter().cloned())
    }
}
