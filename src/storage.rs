use std::{
    cell::RefCell,
    collections::BTreeMap,
    env, fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

const STORAGE_DIR_NAME: &str = ".octodash";
const PREFERENCES_FILE: &str = "preferences.json";

pub fn default_data_dir() -> Result<PathBuf, StoreError> {
    let home = env::var("HOME").map_err(|_| StoreError::HomeDirMissing)?;
    Ok(PathBuf::from(home).join(STORAGE_DIR_NAME))
}

/// String key-value persistence used for dashboard preferences.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Flat JSON object on disk, e.g. `{"showPrivateRepos": "true"}`.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn initialize(dir: &Path) -> Result<Self, StoreError> {
        if !dir.exists() {
            fs::create_dir_all(dir)?;
        }
        Ok(Self {
            path: dir.join(PREFERENCES_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_entries()?.remove(key))
    }

    /// A corrupt file is replaced rather than blocking every later write.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = match self.read_entries() {
            Err(StoreError::Serialization(err)) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %err,
                    "rewriting corrupt preferences file"
                );
                BTreeMap::new()
            }
            other => other?,
        };
        entries.insert(key.to_owned(), value.to_owned());
        self.write_entries(&entries)
    }
}

/// Process-local store. Keeps a log of every write so callers can inspect
/// what would have been persisted.
#[derive(Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
    writes: RefCell<Vec<(String, String)>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn with_entry(key: &str, value: &str) -> Self {
        let store = Self::default();
        store
            .entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        store
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.borrow().clone()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        self.writes
            .borrow_mut()
            .push((key.to_owned(), value.to_owned()));
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HOME environment variable is not set; cannot locate the preference directory")]
    HomeDirMissing,
    #[error("I/O error while handling stored preferences: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to (de)serialize stored preferences: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::initialize(dir.path()).expect("store");
        assert_eq!(store.get("showRateLimit").expect("read"), None);

        store.set("showRateLimit", "true").expect("write");
        store.set("showPrivateRepos", "false").expect("write");

        let reopened = FileStore::initialize(dir.path()).expect("store");
        assert_eq!(
            reopened.get("showRateLimit").expect("read").as_deref(),
            Some("true")
        );
        assert_eq!(
            reopened.get("showPrivateRepos").expect("read").as_deref(),
            Some("false")
        );
    }

    #[test]
    fn file_store_creates_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("a").join("b");
        let store = FileStore::initialize(&nested).expect("store");
        store.set("k", "v").expect("write");
        assert!(store.path().exists());
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::initialize(dir.path()).expect("store");
        fs::write(store.path(), "not json").expect("seed");
        assert!(matches!(
            store.get("k"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn write_repairs_corrupt_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileStore::initialize(dir.path()).expect("store");
        fs::write(store.path(), "not json").expect("seed");

        store.set("showPrivateRepos", "true").expect("first write");
        store.set("showRateLimit", "false").expect("second write");

        let reopened = FileStore::initialize(dir.path()).expect("store");
        assert_eq!(
            reopened.get("showPrivateRepos").expect("read").as_deref(),
            Some("true")
        );
        assert_eq!(
            reopened.get("showRateLimit").expect("read").as_deref(),
            Some("false")
        );
    }

    #[test]
    fn memory_store_logs_writes() {
        let store = MemoryStore::with_entry("k", "old");
        store.set("k", "new").expect("write");
        assert_eq!(store.get("k").expect("read").as_deref(), Some("new"));
        assert_eq!(store.writes(), vec![("k".to_owned(), "new".to_owned())]);
    }
}
