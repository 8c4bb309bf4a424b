//! Application state and composition.

use std::sync::Arc;
use std::time::Duration;

use guilds_domain::{Guild, GuildId};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::{
    ports::{ClockPort, GuildStoragePort, RandomPort},
    settings::{EngineSettings, GuildRules},
    GuildError,
};
use crate::stores::{self, GuildHandler, LoadReport, SharedGuildHandler, SharedStorage};

/// Main application state.
///
/// Owns the shared registry, the storage it was loaded from, and the
/// autosave task.
pub struct App {
    pub guilds: SharedGuildHandler,
    pub storage: SharedStorage,
    autosave_interval: Duration,
    cancel: CancellationToken,
    autosave: Option<JoinHandle<()>>,
}

impl App {
    /// Build the registry from `rules` and load every stored guild.
    ///
    /// Loading finishes before the registry is shared.
    pub fn bootstrap(
        settings: &EngineSettings,
        rules: &GuildRules,
        storage: Arc<dyn GuildStoragePort>,
        clock: Arc<dyn ClockPort>,
        random: Arc<dyn RandomPort>,
    ) -> Result<(Self, LoadReport), GuildError> {
        let mut handler = GuildHandler::new(rules.hierarchy()?, rules.tier_ladder()?, clock, random);
        let report = handler.load(storage.as_ref(), settings.load_policy)?;

        let app = Self {
            guilds: Arc::new(RwLock::new(handler)),
            storage: SharedStorage::new(storage),
            autosave_interval: settings.autosave_interval,
            cancel: CancellationToken::new(),
            autosave: None,
        };
        Ok((app, report))
    }

    /// Start the periodic save. Calling it twice has no effect.
    pub fn start_autosave(&mut self) {
        if self.autosave.is_some() {
            return;
        }
        self.autosave = Some(stores::spawn_autosave(
            self.guilds.clone(),
            self.storage.clone(),
            self.autosave_interval,
            self.cancel.clone(),
        ));
    }

    pub async fn save_now(&self) -> Result<usize, GuildError> {
        stores::save_snapshot(&self.guilds, &self.storage).await
    }

    /// Disband a guild, removing its stored record first.
    pub async fn disband(&self, id: GuildId) -> Result<Guild, GuildError> {
        stores::disband(&self.guilds, &self.storage, id).await
    }

    /// Stop autosave, then write a final snapshot.
    pub async fn shutdown(mut self) -> Result<usize, GuildError> {
        self.cancel.cancel();
        if let Some(task) = self.autosave.take() {
            task.await
                .map_err(|e| GuildError::Background(e.to_string()))?;
        }

        let count = self.save_now().await?;
        tracing::info!(count, "Final save complete");
        Ok(count)
    }
}
