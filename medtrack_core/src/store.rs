//! Key-value persistence with file locking.
//!
//! Every piece of app state lives under a string key. Collections are
//! stored whole: a save replaces the previous value completely, and a
//! reader never sees a partially written value.

use crate::{Error, Result};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Key under which the active medicine collection is stored
pub const MEDICINES_KEY: &str = "medicines";
/// Key under which the deletion log is stored
pub const DELETED_MEDICINES_KEY: &str = "deleted_medicines";
/// Key for the user profile record
pub const USER_INFO_KEY: &str = "userInfo";
/// Key for the dark mode flag
pub const DARK_MODE_KEY: &str = "darkMode";
/// Key for the imported medicine catalog
pub const CATALOG_KEY: &str = "catalog";

/// Raw string storage keyed by name
///
/// Writes take `&mut self`, so a single store never has two writes to the
/// same key in flight.
pub trait KvStore {
    /// Read a value. `Ok(None)` means the key was never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove a key. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    /// All keys currently stored, sorted
    fn keys(&self) -> Result<Vec<String>>;

    /// Remove every key
    fn clear(&mut self) -> Result<()> {
        for key in self.keys()? {
            self.remove(&key)?;
        }
        Ok(())
    }
}

/// Load a JSON collection stored under `key`.
///
/// Returns `None` when the key is missing or the value is not a JSON array.
/// Read and parse failures are logged and also reported as `None`.
/// Records that do not decode are skipped with a warning; the rest load.
pub fn load_collection<T, S>(store: &S, key: &str) -> Option<Vec<T>>
where
    T: DeserializeOwned,
    S: KvStore + ?Sized,
{
    let records: Vec<serde_json::Value> = load_json(store, key)?;
    let total = records.len();

    let items: Vec<T> = records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match serde_json::from_value(record) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping record {} in {:?}: {}", index, key, e);
                None
            }
        })
        .collect();

    tracing::debug!("Loaded {} of {} records from {:?}", items.len(), total, key);
    Some(items)
}

/// Serialize `items` and store them under `key`, replacing prior content
pub fn save_collection<T, S>(store: &mut S, key: &str, items: &[T]) -> Result<()>
where
    T: Serialize,
    S: KvStore + ?Sized,
{
    save_json(store, key, items)?;
    tracing::debug!("Saved {} records to {:?}", items.len(), key);
    Ok(())
}

/// Load any JSON value stored under `key`, with the same recovery rules
/// as [`load_collection`]
pub fn load_json<T, S>(store: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: KvStore + ?Sized,
{
    match read_json(store, key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("{}. Treating as empty.", e);
            None
        }
    }
}

fn read_json<T, S>(store: &S, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    S: KvStore + ?Sized,
{
    let read_error = |reason: String| Error::StorageRead {
        key: key.to_string(),
        reason,
    };

    let Some(raw) = store.get(key).map_err(|e| read_error(e.to_string()))? else {
        tracing::debug!("No stored value for {:?}", key);
        return Ok(None);
    };

    let value = serde_json::from_str(&raw).map_err(|e| read_error(e.to_string()))?;
    Ok(Some(value))
}

/// Serialize any value as JSON under `key`
pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
    S: KvStore + ?Sized,
{
    let write_error = |reason: String| Error::StorageWrite {
        key: key.to_string(),
        reason,
    };

    let contents = serde_json::to_string(value).map_err(|e| write_error(e.to_string()))?;
    store
        .set(key, &contents)
        .map_err(|e| write_error(e.to_string()))
}

// ============================================================================
// File-backed store
// ============================================================================

/// One file per key inside a directory
#[derive(Clone, Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KvStore for FileStore {
    /// Read under a shared lock
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        tracing::debug!("Read {:?} from {:?}", key, path);
        Ok(Some(contents))
    }

    /// Atomically writes the value by:
    /// 1. Writing to a temp file in the same directory
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)?;

        let temp = NamedTempFile::new_in(&self.dir)?;

        // Readers only ever see the old or the new file; the rename is the commit
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            writer.write_all(value.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Wrote {:?} to {:?}", key, path);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut keys: Vec<String> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension()? != "json" {
                    return None;
                }
                path.file_stem()?.to_str().map(str::to_string)
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}

// ============================================================================
// In-memory store
// ============================================================================

/// In-memory store for tests and previews
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
    fail_writes: bool,
    failing_keys: BTreeSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, to exercise error paths
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Make subsequent writes to `key` fail while other keys still accept writes
    pub fn fail_writes_to(&mut self, key: &str) {
        self.failing_keys.insert(key.to_string());
    }

    fn check_writable(&self, key: &str) -> Result<()> {
        if self.fail_writes || self.failing_keys.contains(key) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated write failure",
            )));
        }
        Ok(())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.check_writable(key)?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.check_writable(key)?;
        self.values.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.values.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::medicine;
    use crate::{DaySet, DayTag, Medicine, Stock};

    fn sample() -> Vec<Medicine> {
        let mut a = medicine("a", DaySet::daily(), 480);
        a.stock = Stock::Tracked(12);
        let mut b = medicine("b", DaySet::from_tags([DayTag::Monday, DayTag::Friday]), 1320);
        b.notification_enabled = false;
        vec![a, b]
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path().join("store"));

        let medicines = sample();
        save_collection(&mut store, MEDICINES_KEY, &medicines).unwrap();

        let loaded: Vec<Medicine> = load_collection(&store, MEDICINES_KEY).unwrap();
        assert_eq!(loaded, medicines);
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        let medicines = sample();
        save_collection(&mut store, MEDICINES_KEY, &medicines).unwrap();

        let loaded: Vec<Medicine> = load_collection(&store, MEDICINES_KEY).unwrap();
        assert_eq!(loaded, medicines);
    }

    #[test]
    fn test_missing_key_is_absent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        assert!(load_collection::<Medicine, _>(&store, MEDICINES_KEY).is_none());
    }

    #[test]
    fn test_corrupted_value_is_absent() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("medicines.json"), "{ invalid json }").unwrap();

        let store = FileStore::new(temp_dir.path());
        assert!(load_collection::<Medicine, _>(&store, MEDICINES_KEY).is_none());
    }

    #[test]
    fn test_undecodable_record_is_skipped() {
        let mut store = MemoryStore::new();
        store
            .set(
                MEDICINES_KEY,
                r#"[{"id":"a","name":"Aspirin","days":["Daily"],"time":480,"amount":1},
                    {"id":"b","name":"Legacy","days":["Daily"],"time":"","amount":1}]"#,
            )
            .unwrap();

        let loaded: Vec<Medicine> = load_collection(&store, MEDICINES_KEY).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Aspirin");
    }

    #[test]
    fn test_non_array_value_is_absent() {
        let mut store = MemoryStore::new();
        store.set(MEDICINES_KEY, r#"{"id":"a"}"#).unwrap();
        assert!(load_collection::<Medicine, _>(&store, MEDICINES_KEY).is_none());
    }

    #[test]
    fn test_failing_key_leaves_other_keys_writable() {
        let mut store = MemoryStore::new();
        store.fail_writes_to(MEDICINES_KEY);

        assert!(store.set(MEDICINES_KEY, "[]").is_err());
        store.set(DARK_MODE_KEY, "true").unwrap();
        assert_eq!(store.keys().unwrap(), vec![DARK_MODE_KEY]);
    }

    #[test]
    fn test_write_failure_is_reported() {
        let mut store = MemoryStore::new();
        store.set_fail_writes(true);

        let err = save_collection(&mut store, MEDICINES_KEY, &sample()).unwrap_err();
        assert!(matches!(err, Error::StorageWrite { ref key, .. } if key == MEDICINES_KEY));
        assert!(store.get(MEDICINES_KEY).unwrap().is_none());
    }

    #[test]
    fn test_atomic_write_leaves_no_temp_files() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        store.set(DARK_MODE_KEY, "true").unwrap();
        store.set(DARK_MODE_KEY, "false").unwrap();

        let entries: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("darkMode.json")]);
        assert_eq!(store.get(DARK_MODE_KEY).unwrap().as_deref(), Some("false"));
    }

    #[test]
    fn test_keys_and_clear() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        store.set(MEDICINES_KEY, "[]").unwrap();
        store.set(USER_INFO_KEY, "{}").unwrap();

        assert_eq!(store.keys().unwrap(), vec!["medicines", "userInfo"]);

        store.clear().unwrap();
        assert!(store.keys().unwrap().is_empty());
        store.remove(MEDICINES_KEY).unwrap();
    }

    #[test]
    fn test_invalid_key_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(temp_dir.path());
        assert!(matches!(
            store.set("../escape", "x"),
            Err(Error::InvalidKey(_))
        ));
    }
}
