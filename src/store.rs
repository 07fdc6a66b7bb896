// 💾 Persistence port - a durable key-value slot holding one serialized snapshot
//
// The roster only ever talks to `SnapshotStore`, so tests swap in
// `MemoryStore` and the binary picks SQLite or a JSON file from config.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use log::debug;

use crate::error::StoreError;

/// Default key the roster snapshot lives under
pub const ROSTER_KEY: &str = "roster";

pub trait SnapshotStore {
    /// Raw value under `key`, or `None` if nothing was ever saved
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrite the value under `key`
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Short label for log lines
    fn describe(&self) -> String;
}

impl<T: SnapshotStore + ?Sized> SnapshotStore for Box<T> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).save(key, value)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// In-process slot with switchable write failures
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
    fail_writes: bool,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: impl Into<String>) -> Self {
        let mut store = Self::default();
        store.slots.insert(key.to_string(), value.into());
        store
    }

    /// Make every following `save` fail as if storage were full
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Successful saves so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(String::as_str)
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.slots.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Unavailable("quota exceeded".to_string()));
        }
        self.slots.insert(key.to_string(), value.to_string());
        self.writes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// ============================================================================
// JSON FILE STORE
// ============================================================================

/// One `<key>.json` file per slot inside `dir`
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(JsonFileStore { dir })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SnapshotStore for JsonFileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        // Write beside the target and rename so a crash never leaves half a snapshot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        format!("json:{}", self.dir.display())
    }
}
