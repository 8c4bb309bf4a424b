//! In-memory guild storage.
//!
//! Keeps each guild as its serialized JSON, so loading exercises the same
//! validation path as the file store.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use guilds_domain::{Guild, GuildId};

use crate::infrastructure::ports::{GuildStoragePort, StorageError};

#[derive(Default)]
pub struct InMemoryStorage {
    records: Mutex<BTreeMap<GuildId, String>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> MutexGuard<'_, BTreeMap<GuildId, String>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store raw JSON under `id`, bypassing serialization.
    pub fn insert_raw(&self, id: GuildId, json: impl Into<String>) {
        self.records().insert(id, json.into());
    }

    pub fn contains(&self, id: GuildId) -> bool {
        self.records().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

impl GuildStoragePort for InMemoryStorage {
    fn load_all(&self) -> Result<Vec<Result<Guild, StorageError>>, StorageError> {
        let records = self.records();
        Ok(records
            .iter()
            .map(|(id, json)| {
                let guild: Guild =
                    serde_json::from_str(json).map_err(|e| StorageError::corrupt(id, e))?;
                if guild.id() != *id {
                    return Err(StorageError::corrupt(
                        id,
                        format!("stored under a different id than {}", guild.id()),
                    ));
                }
                Ok(guild)
            })
            .collect())
    }

    fn save_all(&self, guilds: &[Guild]) -> Result<(), StorageError> {
        let mut serialized = Vec::with_capacity(guilds.len());
        for guild in guilds {
            let json = serde_json::to_string(guild).map_err(StorageError::serialization)?;
            serialized.push((guild.id(), json));
        }
        self.records().extend(serialized);
        Ok(())
    }

    fn delete(&self, id: GuildId) -> Result<(), StorageError> {
        self.records().remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use guilds_domain::{GuildName, GuildPrefix, GuildRole, GuildTier, PlayerId, RoleHierarchy};

    fn guild() -> Guild {
        let hierarchy = RoleHierarchy::new([
            GuildRole::new("Guild Master", 0),
            GuildRole::new("Member", 1),
        ])
        .unwrap();
        Guild::new(
            GuildName::new("Night Owls").unwrap(),
            GuildPrefix::new("OWL").unwrap(),
            PlayerId::new(),
            &hierarchy,
            GuildTier::new(1, "Fledgling", 10, 1_000.0),
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn save_load_delete() {
        let storage = InMemoryStorage::new();
        let guild = guild();

        storage.save_all(std::slice::from_ref(&guild)).unwrap();
        let loaded = storage.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].as_ref().unwrap(), &guild);

        storage.delete(guild.id()).unwrap();
        assert!(storage.is_empty());
    }

    #[test]
    fn corrupt_raw_record_reported() {
        let storage = InMemoryStorage::new();
        storage.insert_raw(GuildId::new(), "{}");

        let loaded = storage.load_all().unwrap();
        assert!(matches!(&loaded[0], Err(e) if e.is_corrupt()));
    }
}
