//! JSON key-value persistence for the player's collections.
//!
//! One file per key under a storage root directory. Both directions fail
//! soft: a missing file, malformed JSON or an unusable root never reach the
//! caller, and the in-memory state stays authoritative for the session when
//! a write is refused. Keys are independent records; there is no
//! transactional guarantee across them.

use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Keys of the persisted record space. Each key is owned by exactly one
/// higher-level manager; no two managers write the same key.
pub mod keys {
    pub const RECOMMENDATIONS: &str = "spotyda_recs";
    pub const RECENTLY_PLAYED: &str = "spotyda_recent";
    pub const LIBRARY: &str = "spotyda_library";
    pub const PLAYLISTS: &str = "spotyda_playlists";
    pub const THEME_DARK: &str = "spotyda_theme_dark";
    // Written by the embedding view's customization flows.
    pub const BACKDROP: &str = "spotyda_bg";
    pub const BACKDROP_KIND: &str = "spotyda_bg_type";
    pub const BACKDROP_ANALYSIS: &str = "spotyda_bg_analysis";
}

/// The persistence boundary. Cheap to clone; every manager holds its own
/// handle onto the shared root.
#[derive(Clone, Debug)]
pub struct PersistedStore {
    root: PathBuf,
}

impl PersistedStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Read and decode a key. A missing file, malformed JSON from an earlier
    /// session or an unreadable root all resolve to `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let content = fs::read_to_string(self.key_path(key)).ok()?;
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key, error = %e, "Discarding malformed persisted value");
                None
            }
        }
    }

    /// Encode and write a key, best effort. Quota and access errors are
    /// logged and swallowed.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let content = match serde_json::to_string(value) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(key, error = %e, "Could not encode value for persistence");
                return;
            }
        };
        let result = fs::create_dir_all(&self.root).and_then(|_| fs::write(self.key_path(key), content));
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "Could not persist value");
        }
    }

    /// Delete a key. Absent keys are fine.
    pub fn remove(&self, key: &str) {
        let _ = fs::remove_file(self.key_path(key));
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}
