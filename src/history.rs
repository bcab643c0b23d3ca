//! Capped history of past results and the key-value storage it lives in.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::encoded::EncodedImage;
use crate::error::Result;

/// Maximum number of entries kept.
pub const HISTORY_LIMIT: usize = 5;
/// Storage key the history is persisted under.
pub const STORAGE_KEY: &str = "vanish-history";

/// One original/result pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Unique identifier.
    pub id: String,
    /// Image as uploaded.
    pub original_image: EncodedImage,
    /// Image as returned by the model.
    pub processed_image: EncodedImage,
    /// Creation time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Durable string key-value storage.
pub trait Storage {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing what was there.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// Stores each key as `<key>.json` inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Use `dir`, which is created on first write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Backing file for `key`.
    #[must_use]
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }
}

/// In-process storage, mostly for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Most-recent-first list of results, never longer than [`HISTORY_LIMIT`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    /// Empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from `storage`.
    ///
    /// Missing, unreadable or corrupt data yields an empty history; the
    /// problem is logged and never surfaced.
    pub fn load<S: Storage + ?Sized>(storage: &S) -> Self {
        let raw = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::new(),
            Err(e) => {
                tracing::warn!("failed to read history: {e}");
                return Self::new();
            }
        };
        match serde_json::from_str::<Vec<HistoryEntry>>(&raw) {
            Ok(mut entries) => {
                entries.truncate(HISTORY_LIMIT);
                tracing::debug!(count = entries.len(), "loaded history");
                Self { entries }
            }
            Err(e) => {
                tracing::warn!("discarding corrupt history: {e}");
                Self::new()
            }
        }
    }

    /// Persist the whole list to `storage`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the storage write fails.
    pub fn save<S: Storage + ?Sized>(&self, storage: &mut S) -> Result<()> {
        let json = serde_json::to_string(&self.entries)?;
        storage.set(STORAGE_KEY, &json)
    }

    /// Insert at the front, evicting the oldest entries beyond the cap.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_LIMIT);
    }

    /// Entries, most recent first.
    #[must_use]
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Entry at `index` (0 = most recent).
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: i64) -> HistoryEntry {
        HistoryEntry {
            id: format!("id-{n}"),
            original_image: EncodedImage::from_bytes("image/png", &[1]),
            processed_image: EncodedImage::from_bytes("image/png", &[2]),
            timestamp: n,
        }
    }

    #[test]
    fn push_caps_and_orders_most_recent_first() {
        let mut history = History::new();
        for n in 1..=6 {
            history.push(entry(n));
        }
        assert_eq!(history.len(), HISTORY_LIMIT);
        let ids: Vec<&str> = history.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["id-6", "id-5", "id-4", "id-3", "id-2"]);
        assert!(history.entries().iter().all(|e| e.id != "id-1"));
        assert_eq!(history.get(0).unwrap().timestamp, 6);
    }

    #[test]
    fn save_then_load_keeps_entries() {
        let mut storage = MemoryStorage::new();
        let mut history = History::new();
        history.push(entry(1));
        history.push(entry(2));
        history.save(&mut storage).unwrap();

        let loaded = History::load(&storage);
        assert_eq!(loaded, history);
    }

    #[test]
    fn persisted_layout_uses_camel_case_strings() {
        let mut storage = MemoryStorage::new();
        let mut history = History::new();
        history.push(entry(7));
        history.save(&mut storage).unwrap();

        let raw = storage.get(STORAGE_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value[0]["id"], "id-7");
        assert_eq!(value[0]["originalImage"], "data:image/png;base64,AQ==");
        assert_eq!(value[0]["processedImage"], "data:image/png;base64,Ag==");
        assert_eq!(value[0]["timestamp"], 7);
    }

    #[test]
    fn corrupt_data_loads_as_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(STORAGE_KEY, "{not json").unwrap();
        assert!(History::load(&storage).is_empty());

        storage
            .set(STORAGE_KEY, r#"[{"id":"x","originalImage":"nope","processedImage":"nope","timestamp":1}]"#)
            .unwrap();
        assert!(History::load(&storage).is_empty());
    }

    #[test]
    fn oversized_stored_list_is_truncated() {
        let mut storage = MemoryStorage::new();
        let entries: Vec<HistoryEntry> = (1..=8).map(entry).collect();
        storage
            .set(STORAGE_KEY, &serde_json::to_string(&entries).unwrap())
            .unwrap();
        let loaded = History::load(&storage);
        assert_eq!(loaded.len(), HISTORY_LIMIT);
        assert_eq!(loaded.get(0).unwrap().id, "id-1");
    }

    #[test]
    fn file_storage_creates_directory_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("nested"));
        assert_eq!(storage.get(STORAGE_KEY).unwrap(), None);

        storage.set(STORAGE_KEY, "[]").unwrap();
        assert!(storage.path_for(STORAGE_KEY).exists());
        assert_eq!(storage.get(STORAGE_KEY).unwrap().as_deref(), Some("[]"));
    }
}
