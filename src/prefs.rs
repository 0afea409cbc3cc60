use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Key under which the glow preference is stored on the device.
pub const GLOW_KEY: &str = "glowEnabled";

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("failed to write preferences: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode preferences: {0}")]
    Json(#[from] serde_json::Error),
}

/// Device-local string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError>;
}

/// Key-value entries kept as a JSON object in a single file.
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Opens the store. A missing or unreadable file starts out empty.
    pub fn open(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("Ignoring unreadable preferences {}: {}", path.display(), e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.entries.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// UI preferences read once from device storage and written back on every
/// change. Never synced to the remote store.
pub struct UiPreferences<S> {
    storage: S,
    glow_enabled: bool,
}

impl<S: KeyValueStore> UiPreferences<S> {
    /// Glow defaults to on when the stored value is absent or not a boolean.
    pub fn load(storage: S) -> Self {
        let glow_enabled = storage
            .get(GLOW_KEY)
            .and_then(|raw| serde_json::from_str::<bool>(raw.trim()).ok())
            .unwrap_or(true);
        Self {
            storage,
            glow_enabled,
        }
    }

    pub fn glow_enabled(&self) -> bool {
        self.glow_enabled
    }

    /// Updates the flag and persists it. The in-memory value changes even if
    /// the write fails.
    pub fn set_glow_enabled(&mut self, enabled: bool) -> Result<(), PrefsError> {
        self.glow_enabled = enabled;
        self.storage.set(GLOW_KEY, if enabled { "true" } else { "false" })
    }

    pub fn toggle_glow(&mut self) -> Result<bool, PrefsError> {
        let enabled = !self.glow_enabled;
        self.set_glow_enabled(enabled)?;
        Ok(enabled)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(value: &str) -> MemoryStore {
        let mut store = MemoryStore::default();
        store.set(GLOW_KEY, value).unwrap();
        store
    }

    #[test]
    fn glow_defaults_on() {
        assert!(UiPreferences::load(MemoryStore::default()).glow_enabled());
        assert!(UiPreferences::load(stored("maybe")).glow_enabled());
        assert!(!UiPreferences::load(stored("false")).glow_enabled());
    }

    #[test]
    fn every_change_is_written() {
        let mut prefs = UiPreferences::load(MemoryStore::default());
        assert!(!prefs.toggle_glow().unwrap());
        assert_eq!(prefs.storage().get(GLOW_KEY).as_deref(), Some("false"));

        prefs.set_glow_enabled(true).unwrap();
        assert_eq!(prefs.storage().get(GLOW_KEY).as_deref(), Some("true"));
    }

    #[test]
    fn file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("preferences.json");

        let mut prefs = UiPreferences::load(JsonFileStore::open(&path));
        assert!(prefs.glow_enabled());
        prefs.set_glow_enabled(false).unwrap();

        let reopened = UiPreferences::load(JsonFileStore::open(&path));
        assert!(!reopened.glow_enabled());
    }

    #[test]
    fn corrupt_file_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{not json").unwrap();

        let prefs = UiPreferences::load(JsonFileStore::open(&path));
        assert!(prefs.glow_enabled());
    }
}
