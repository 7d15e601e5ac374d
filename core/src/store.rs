//! Score store: the persisted score ledger.

use crate::error::StoreError;
use crate::record::ScoreRecord;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Persistent score storage.
pub trait ScoreStore: Send + Sync {
    /// Strict read. Surfaces missing-permission and parse failures.
    ///
    /// An absent store is not an error and yields an empty list.
    fn try_load(&self) -> Result<Vec<ScoreRecord>, StoreError>;

    /// Replace the stored records. Either the whole list lands or nothing changes.
    fn save(&self, records: &[ScoreRecord]) -> Result<(), StoreError>;

    /// Whether the backing resource exists yet.
    fn exists(&self) -> bool;

    /// Human-readable location, for logs.
    fn location(&self) -> String;

    /// Tolerant read: any failure is logged and degrades to an empty list.
    fn load(&self) -> Vec<ScoreRecord> {
        match self.try_load() {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(store = %self.location(), "error loading scores: {e}");
                Vec::new()
            }
        }
    }
}

/// In-memory score store (useful for tests).
#[derive(Default)]
pub struct MemoryScoreStore {
    records: Mutex<Option<Vec<ScoreRecord>>>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<ScoreRecord>) -> Self {
        Self {
            records: Mutex::new(Some(records)),
        }
    }
}

impl ScoreStore for MemoryScoreStore {
    fn try_load(&self) -> Result<Vec<ScoreRecord>, StoreError> {
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records.clone().unwrap_or_default())
    }

    fn save(&self, records: &[ScoreRecord]) -> Result<(), StoreError> {
        *self.records.lock().unwrap_or_else(|e| e.into_inner()) = Some(records.to_vec());
        Ok(())
    }

    fn exists(&self) -> bool {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).is_some()
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

/// File-backed score store (JSON file).
///
/// Format: a pretty-printed array of `ScoreRecord`.
pub struct FileScoreStore {
    path: PathBuf,
}

impl FileScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "scores.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl ScoreStore for FileScoreStore {
    fn try_load(&self) -> Result<Vec<ScoreRecord>, StoreError> {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "scores file not found, returning empty list");
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.path.clone(),
            source,
        })?;
        let records: Vec<ScoreRecord> =
            serde_json::from_str(&data).map_err(|source| StoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        tracing::info!("loaded {} scores from file", records.len());
        Ok(records)
    }

    fn save(&self, records: &[ScoreRecord]) -> Result<(), StoreError> {
        let data = serde_json::to_string_pretty(records)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
        }

        // Write next to the target and rename over it so readers never see a partial file.
        let tmp = self.tmp_path();
        let written = std::fs::File::create(&tmp)
            .and_then(|mut f| {
                f.write_all(data.as_bytes())?;
                f.sync_all()
            })
            .and_then(|()| std::fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            tracing::error!(path = %self.path.display(), "error saving scores: {e}");
            return Err(self.write_err(e));
        }

        tracing::info!("saved {} scores to file", records.len());
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(score: i64) -> ScoreRecord {
        ScoreRecord {
            score,
            timestamp: "2024-01-01T00:00:00".into(),
            date: "2024-01-01 00:00:00".into(),
        }
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryScoreStore::new();
        assert!(!store.exists());
        assert!(store.load().is_empty());

        store.save(&[rec(1), rec(2)]).unwrap();
        assert!(store.exists());
        assert_eq!(store.load(), vec![rec(1), rec(2)]);
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileScoreStore::new(dir.path().join("nope.json"));
        assert!(!store.exists());
        assert!(store.try_load().unwrap().is_empty());
        assert!(store.load().is_empty());
    }

    #[test]
    fn file_store_corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileScoreStore::new(&path);
        assert!(matches!(store.try_load(), Err(StoreError::Corrupt { .. })));
        assert!(store.load().is_empty());
    }

    #[test]
    fn file_store_persist_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("scores.json");

        {
            let store = FileScoreStore::new(&path);
            store.save(&[rec(30), rec(20)]).unwrap();
        }

        let store = FileScoreStore::new(&path);
        assert_eq!(store.load(), vec![rec(30), rec(20)]);
        assert!(!dir.path().join("nested").join("scores.json.tmp").exists());
    }

    #[test]
    fn file_store_writes_pretty_json_in_key_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        FileScoreStore::new(&path).save(&[rec(5)]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let expected = "[\n  {\n    \"score\": 5,\n    \"timestamp\": \"2024-01-01T00:00:00\",\n    \"date\": \"2024-01-01 00:00:00\"\n  }\n]";
        assert_eq!(text, expected);
    }

    #[test]
    fn failed_save_leaves_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.json");
        let store = FileScoreStore::new(&path);
        store.save(&[rec(1)]).unwrap();

        // A directory squatting on the temp path makes the write fail.
        std::fs::create_dir(dir.path().join("scores.json.tmp")).unwrap();
        assert!(matches!(store.save(&[rec(2)]), Err(StoreError::Write { .. })));
        assert_eq!(store.load(), vec![rec(1)]);
    }

    #[test]
    fn memory_store_survives_poisoned_lock() {
        let store = std::sync::Arc::new(MemoryScoreStore::with_records(vec![rec(1)]));
        let holder = std::sync::Arc::clone(&store);
        let joined = std::thread::spawn(move || {
            let _guard = holder.records.lock().unwrap();
            panic!("reader died");
        })
        .join();
        assert!(joined.is_err());

        assert_eq!(store.load(), vec![rec(1)]);
        store.save(&[rec(2)]).unwrap();
        assert!(store.exists());
        assert_eq!(store.load(), vec![rec(2)]);
    }
}
