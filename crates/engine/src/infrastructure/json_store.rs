//! JSON file storage - one file per guild under `<root>/data/`.
//!
//! Records are written to a temp file in the same directory, fsynced, and
//! renamed over the target, so a reader sees either the old or the new
//! snapshot, never a partial one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use guilds_domain::{Guild, GuildId};
use tempfile::NamedTempFile;

use crate::infrastructure::ports::{GuildStoragePort, StorageError};

const DATA_DIR: &str = "data";
const RECORD_EXTENSION: &str = "json";

/// File-backed guild storage.
pub struct JsonFileStorage {
    data_dir: PathBuf,
}

impl JsonFileStorage {
    /// Open (creating if needed) `<root>/data`.
    ///
    /// # Errors
    ///
    /// `StorageError::Io` if the directory cannot be created or listed.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let data_dir = root.as_ref().join(DATA_DIR);
        fs::create_dir_all(&data_dir)
            .map_err(|e| StorageError::io("create data directory", &data_dir, e))?;
        fs::read_dir(&data_dir)
            .map_err(|e| StorageError::io("list data directory", &data_dir, e))?;

        tracing::debug!(path = %data_dir.display(), "Guild storage ready");
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn record_path(&self, id: GuildId) -> PathBuf {
        self.data_dir.join(format!("{}.{}", id, RECORD_EXTENSION))
    }

    /// Record files in name order. Anything without a `.json` extension is
    /// ignored, including leftover temp files.
    fn record_paths(&self) -> Result<Vec<PathBuf>, StorageError> {
        let entries = fs::read_dir(&self.data_dir)
            .map_err(|e| StorageError::io("list data directory", &self.data_dir, e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| StorageError::io("list data directory", &self.data_dir, e))?;
            let path = entry.path();
            let is_record = path
                .extension()
                .is_some_and(|ext| ext == RECORD_EXTENSION);
            if is_record && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    fn read_record(path: &Path) -> Result<Guild, StorageError> {
        let contents =
            fs::read_to_string(path).map_err(|e| StorageError::io("read guild record", path, e))?;
        let guild: Guild = serde_json::from_str(&contents)
            .map_err(|e| StorageError::corrupt(path.display(), e))?;

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if stem != guild.id().to_string() {
            return Err(StorageError::corrupt(
                path.display(),
                format!("file name does not match guild id {}", guild.id()),
            ));
        }
        Ok(guild)
    }

    fn write_record(&self, guild: &Guild) -> Result<(), StorageError> {
        let target = self.record_path(guild.id());
        let json = serde_json::to_vec_pretty(guild).map_err(StorageError::serialization)?;

        let mut tmp = NamedTempFile::new_in(&self.data_dir)
            .map_err(|e| StorageError::io("create temp file", &self.data_dir, e))?;
        tmp.write_all(&json)
            .map_err(|e| StorageError::io("write temp file", tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| StorageError::io("sync temp file", tmp.path(), e))?;
        tmp.persist(&target)
            .map_err(|e| StorageError::io("replace guild record", &target, e.error))?;
        Ok(())
    }
}

impl GuildStoragePort for JsonFileStorage {
    fn load_all(&self) -> Result<Vec<Result<Guild, StorageError>>, StorageError> {
        let records: Vec<_> = self
            .record_paths()?
            .iter()
            .map(|path| Self::read_record(path))
            .collect();

        tracing::debug!(count = records.len(), "Read guild records");
        Ok(records)
    }

    fn save_all(&self, guilds: &[Guild]) -> Result<(), StorageError> {
        let mut first_error = None;
        for guild in guilds {
            if let Err(e) = self.write_record(guild) {
                tracing::error!(guild_id = %guild.id(), error = %e, "Failed to save guild");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                tracing::debug!(count = guilds.len(), "Saved guilds");
                Ok(())
            }
        }
    }

    fn delete(&self, id: GuildId) -> Result<(), StorageError> {
        let path = self.record_path(id);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io("delete guild record", path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use guilds_domain::{GuildName, GuildPrefix, GuildRole, GuildTier, PlayerId, RoleHierarchy};
    use tempfile::TempDir;

    fn hierarchy() -> RoleHierarchy {
        RoleHierarchy::new([
            GuildRole::new("Guild Master", 0),
            GuildRole::new("Officer", 1),
            GuildRole::new("Member", 2),
        ])
        .unwrap()
    }

    fn guild(name: &str) -> Guild {
        let now = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let mut guild = Guild::new(
            GuildName::new(name).unwrap(),
            GuildPrefix::new("TST").unwrap(),
            PlayerId::new(),
            &hierarchy(),
            GuildTier::new(1, "Fledgling", 10, 1_000.0),
            now,
        )
        .unwrap();
        guild
            .add_member(PlayerId::new(), hierarchy().role(2).unwrap().clone(), now)
            .unwrap();
        guild.credit(42.5).unwrap();
        guild
    }

    fn storage() -> (TempDir, JsonFileStorage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path()).unwrap();
        (dir, storage)
    }

    fn loaded(storage: &JsonFileStorage) -> Vec<Guild> {
        storage
            .load_all()
            .unwrap()
            .into_iter()
            .map(|r| r.unwrap())
            .collect()
    }

    mod layout {
        use super::*;

        #[test]
        fn new_creates_data_directory() {
            let dir = tempfile::tempdir().unwrap();
            let storage = JsonFileStorage::new(dir.path()).unwrap();
            assert!(storage.data_dir().is_dir());
            assert_eq!(storage.data_dir(), dir.path().join("data"));
        }

        #[test]
        fn new_fails_when_data_is_a_file() {
            let dir = tempfile::tempdir().unwrap();
            fs::write(dir.path().join("data"), b"not a directory").unwrap();

            let err = JsonFileStorage::new(dir.path()).err().unwrap();
            assert!(matches!(err, StorageError::Io { .. }));
        }

        #[test]
        fn one_pretty_camel_case_file_per_guild() {
            let (_dir, storage) = storage();
            let guild = guild("Iron Wolves");

            storage.save_all(std::slice::from_ref(&guild)).unwrap();

            let contents = fs::read_to_string(storage.record_path(guild.id())).unwrap();
            assert!(contents.contains('\n'));
            assert!(contents.contains("\"maxMembers\""));
        }
    }

    mod round_trip {
        use super::*;

        #[test]
        fn save_then_load_is_lossless() {
            let (_dir, storage) = storage();
            let guilds = vec![guild("Iron Wolves"), guild("Night Owls")];

            storage.save_all(&guilds).unwrap();
            let mut back = loaded(&storage);
            back.sort_by_key(|g| g.name().as_str().to_string());

            assert_eq!(back.len(), 2);
            assert_eq!(back[0], guilds[0]);
            assert_eq!(back[1], guilds[1]);
        }

        #[test]
        fn renamed_guild_keeps_its_file() {
            let (_dir, storage) = storage();
            let mut guild = guild("Iron Wolves");
            storage.save_all(std::slice::from_ref(&guild)).unwrap();

            guild.rename(GuildName::new("Steel Wolves").unwrap());
            storage.save_all(std::slice::from_ref(&guild)).unwrap();

            let files: Vec<_> = fs::read_dir(storage.data_dir()).unwrap().collect();
            assert_eq!(files.len(), 1);
            assert_eq!(loaded(&storage)[0].name().as_str(), "Steel Wolves");
        }

        #[test]
        fn delete_removes_file_and_tolerates_missing() {
            let (_dir, storage) = storage();
            let guild = guild("Iron Wolves");
            storage.save_all(std::slice::from_ref(&guild)).unwrap();

            storage.delete(guild.id()).unwrap();
            assert!(!storage.record_path(guild.id()).exists());
            storage.delete(guild.id()).unwrap();
        }
    }

    mod corrupt_records {
        use super::*;

        #[test]
        fn bad_json_is_reported_per_record() {
            let (_dir, storage) = storage();
            let good = guild("Iron Wolves");
            storage.save_all(std::slice::from_ref(&good)).unwrap();
            fs::write(storage.data_dir().join("broken.json"), b"{ not json").unwrap();

            let records = storage.load_all().unwrap();

            assert_eq!(records.len(), 2);
            assert_eq!(records.iter().filter(|r| r.is_ok()).count(), 1);
            assert!(records
                .iter()
                .any(|r| matches!(r, Err(e) if e.is_corrupt())));
        }

        #[test]
        fn file_name_must_match_id() {
            let (_dir, storage) = storage();
            let guild = guild("Iron Wolves");
            let json = serde_json::to_string(&guild).unwrap();
            fs::write(storage.record_path(GuildId::new()), json).unwrap();

            let records = storage.load_all().unwrap();
            assert!(matches!(&records[0], Err(e) if e.is_corrupt()));
        }

        #[test]
        fn non_json_files_are_ignored() {
            let (_dir, storage) = storage();
            fs::write(storage.data_dir().join(".tmpA1b2C3"), b"partial").unwrap();
            fs::write(storage.data_dir().join("notes.txt"), b"hello").unwrap();

            assert!(storage.load_all().unwrap().is_empty());
        }
    }
}
