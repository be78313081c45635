use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::errors::StateError;
use crate::storage::traits::StateStore;
use crate::storage::SeenState;

/// Seen-item state kept in a pretty-printed JSON document
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state, starting fresh when the document is unreadable or corrupt
    pub fn load_or_default(&self) -> SeenState {
        match self.load() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Starting with empty state; already-notified items may be sent again");
                SeenState::default()
            }
        }
    }

    fn io_error(&self, source: std::io::Error) -> StateError {
        StateError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<SeenState, StateError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No state file found, starting empty");
                return Ok(SeenState::default());
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let state: SeenState = serde_json::from_str(&content).map_err(|e| StateError::Corrupt {
            path: self.path.clone(),
            source: e,
        })?;

        debug!(path = %self.path.display(), seen = state.len(), "State loaded");
        Ok(state)
    }

    fn save(&self, state: &SeenState) -> Result<(), StateError> {
        let data = serde_json::to_vec_pretty(state)?;

        let dir = self.parent_dir();
        fs::create_dir_all(&dir).map_err(|e| self.io_error(e))?;

        // Same directory as the target so the final rename stays atomic.
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| self.io_error(e))?;
        tmp.write_all(&data).map_err(|e| self.io_error(e))?;
        tmp.as_file().sync_all().map_err(|e| self.io_error(e))?;
        tmp.persist(&self.path).map_err(|e| self.io_error(e.error))?;

        debug!(path = %self.path.display(), seen = state.len(), "State saved");
        Ok(())
    }

    fn reset(&self) -> Result<(), StateError> {
        self.save(&SeenState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Entry;
    use chrono::Utc;
    use tempfile::TempDir;

    fn store() -> (TempDir, JsonStateStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path().join("seen_items.json"));
        (dir, store)
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (_dir, store) = store();
        let state = store.load().unwrap();
        assert!(state.is_empty());
        assert_eq!(state.total_notified(), 0);
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let (_dir, store) = store();
        let mut state = SeenState::default();
        state.mark_delivered(&Entry::new("a", "Listing A", "Dev"));
        state.mark_seen(["b"]);
        state.record_check(Utc::now());

        store.save(&state).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn test_corrupt_file_fails_with_state_error() {
        let (_dir, store) = store();
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.load(), Err(StateError::Corrupt { .. })));
        assert!(store.load_or_default().is_empty());
    }

    #[test]
    fn test_save_leaves_no_temporary_files() {
        let (dir, store) = store();
        let mut state = SeenState::default();
        state.mark_seen(["a"]);

        store.save(&state).unwrap();
        store.save(&state).unwrap();

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_save_creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = JsonStateStore::new(dir.path().join("nested").join("state.json"));

        store.save(&SeenState::default()).unwrap();

        assert!(store.path().exists());
    }

    #[test]
    fn test_reset_persists_empty_state() {
        let (_dir, store) = store();
        let mut state = SeenState::default();
        state.mark_delivered(&Entry::new("a", "A", "Dev"));
        store.save(&state).unwrap();

        store.reset().unwrap();

        assert_eq!(store.load().unwrap(), SeenState::default());
    }

    #[test]
    fn test_state_document_shape() {
        let (_dir, store) = store();
        let mut state = SeenState::default();
        state.mark_delivered(&Entry::new("a", "A", "Dev"));
        store.save(&state).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(json["total_notified"], 1);
        assert_eq!(json["seen_items"]["a"]["feed_name"], "Dev");
        assert!(json["last_check"].is_null());
    }
}
