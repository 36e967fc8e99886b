//! Durable storage for the dedup state map.

use crate::monitor::DedupState;
use crate::Result;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::warn;

/// JSON file holding the dedup state between monitoring cycles.
///
/// Loading is fail-open: a missing or corrupt file is treated as empty
/// history so a real alert is never suppressed by a storage hiccup. Saving
/// is atomic (temp file + rename) so a crash mid-write can never leave a
/// half-written file for the next load. Single-writer access is assumed;
/// two processes racing is last-writer-wins.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Create a state file at the default path.
    pub fn new() -> Self {
        Self {
            path: Self::default_path(),
        }
    }

    /// Create a state file at a specific path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the default state file path.
    ///
    /// Default: `~/.cache/folio/alert_state.json`.
    /// Can be overridden with the `FOLIO_ALERT_STATE_FILE` environment variable.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var("FOLIO_ALERT_STATE_FILE") {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.cache_dir().join("folio/alert_state.json"))
            .unwrap_or_else(|| PathBuf::from("alert_state.json"))
    }

    /// Get the current path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the dedup state from disk.
    ///
    /// Missing or unreadable files yield an empty state; a file that exists
    /// but fails to parse is logged and also treated as empty.
    pub fn load(&self) -> DedupState {
        if !self.path.exists() {
            return DedupState::new();
        }

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "failed to read alert state, starting empty");
                return DedupState::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "corrupt alert state, starting empty");
                DedupState::new()
            }
        }
    }

    /// Save the dedup state to disk atomically.
    ///
    /// Writes to a sibling temp file, fsyncs, then renames over the target.
    pub fn save(&self, state: &DedupState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let payload = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");

        {
            let mut file = File::create(&tmp)?;
            file.write_all(&payload)?;
            file.sync_all()?;
        }

        if let Err(err) = fs::rename(&tmp, &self.path) {
            // Some platforms refuse to rename over an existing file
            if self.path.exists() {
                fs::remove_file(&self.path)?;
                fs::rename(&tmp, &self.path)?;
            } else {
                return Err(err.into());
            }
        }

        Ok(())
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_is_empty() {
        let dir = tempdir().unwrap();
        let store = StateFile::with_path(dir.path().join("state.json"));
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = StateFile::with_path(dir.path().join("nested/state.json"));

        let mut state = DedupState::new();
        state.should_alert("price:TQQQ", 0.16, 0.15, 0.01);
        state.should_alert(DedupState::PNL_KEY, 1200.0, 500.0, 500.0);

        store.save(&state).unwrap();
        assert_eq!(store.load(), state);
    }

    #[test]
    fn test_load_corrupt_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let store = StateFile::with_path(&path);
        assert!(store.load().is_empty());
    }

    #[test]
    fn test_save_replaces_existing() {
        let dir = tempdir().unwrap();
        let store = StateFile::with_path(dir.path().join("state.json"));

        let mut first = DedupState::new();
        first.should_alert("price:AAPL", 0.06, 0.05, 0.01);
        store.save(&first).unwrap();

        let second = DedupState::new();
        store.save(&second).unwrap();
        assert!(store.load().is_empty());

        // No temp file left behind
        assert!(!dir.path().join("state.json.tmp").exists());
    }
}
