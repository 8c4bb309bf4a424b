//! Shared access to the guild registry from async tasks.
//!
//! The registry lock is only ever held to copy data out or apply an
//! in-memory change. Disk I/O and presence queries run after it is released.
//! Snapshot saves and record deletes take turns through [`SharedStorage`].

use std::sync::Arc;
use std::time::Duration;

use guilds_domain::{Guild, GuildId, GuildMember};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::GuildHandler;
use crate::infrastructure::ports::{GuildStoragePort, PresencePort};
use crate::infrastructure::GuildError;

pub type SharedGuildHandler = Arc<RwLock<GuildHandler>>;

/// Storage port shared between async tasks.
///
/// A save holds the turn from snapshot until its last write lands, and a
/// disband holds it from the delete until the guild is unindexed. A snapshot
/// therefore never contains a guild whose record was already deleted, and
/// saves finish in the order their snapshots were taken.
#[derive(Clone)]
pub struct SharedStorage {
    port: Arc<dyn GuildStoragePort>,
    turn: Arc<Mutex<()>>,
}

impl SharedStorage {
    pub fn new(port: Arc<dyn GuildStoragePort>) -> Self {
        Self {
            port,
            turn: Arc::new(Mutex::new(())),
        }
    }

    pub fn port(&self) -> &Arc<dyn GuildStoragePort> {
        &self.port
    }
}

/// Snapshot under a read lock, then write on the blocking pool.
///
/// Returns the number of guilds written.
pub async fn save_snapshot(
    handler: &SharedGuildHandler,
    storage: &SharedStorage,
) -> Result<usize, GuildError> {
    let turn = storage.turn.clone().lock_owned().await;
    let snapshot = handler.read().await.snapshot();
    let count = snapshot.len();
    let port = storage.port.clone();

    // The turn moves into the blocking task so it outlives a dropped caller
    tokio::task::spawn_blocking(move || {
        let _turn = turn;
        port.save_all(&snapshot)
    })
    .await
    .map_err(|e| GuildError::Background(e.to_string()))??;
    Ok(count)
}

/// Delete the guild's record on the blocking pool, then unindex it.
///
/// If the delete fails the guild stays registered.
pub async fn disband(
    handler: &SharedGuildHandler,
    storage: &SharedStorage,
    id: GuildId,
) -> Result<Guild, GuildError> {
    let _turn = storage.turn.lock().await;
    handler.read().await.guild(id)?;

    let port = storage.port.clone();
    tokio::task::spawn_blocking(move || port.delete(id))
        .await
        .map_err(|e| GuildError::Background(e.to_string()))??;

    handler.write().await.disband(id)
}

/// Save every `period` until `cancel` fires.
///
/// Failures are logged and the next tick tries again with a fresh snapshot.
pub fn spawn_autosave(
    handler: SharedGuildHandler,
    storage: SharedStorage,
    period: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately; nothing has changed since load
        ticker.tick().await;

        tracing::info!(period_secs = period.as_secs(), "Autosave started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Autosave stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match save_snapshot(&handler, &storage).await {
                        Ok(count) => tracing::info!(count, "Autosave complete"),
                        Err(e) => tracing::error!(error = %e, "Autosave failed"),
                    }
                }
            }
        }
    })
}

/// Members of `guild_id` that `presence` reports online.
pub async fn online_members(
    handler: &SharedGuildHandler,
    guild_id: GuildId,
    presence: &dyn PresencePort,
) -> Result<Vec<GuildMember>, GuildError> {
    let members: Vec<GuildMember> = {
        let guard = handler.read().await;
        guard.guild(guild_id)?.members().cloned().collect()
    };

    Ok(members
        .into_iter()
        .filter(|member| presence.is_online(member.id()))
        .collect())
}
