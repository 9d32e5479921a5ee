//! Liked songs, recently played history and user playlists.
//!
//! Every mutation writes its collection through to the persisted store in
//! the same logical step, so in-memory and persisted state never diverge
//! after a completed operation. All operations are total: acting on an
//! unknown id is a no-op, never an error.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::storage::{PersistedStore, keys};
use super::types::{Playlist, Track};

/// Cap on the recently-played history, matching the original UI.
pub const RECENT_CAP: usize = 15;

/// In-memory collections. The mutation logic is synchronous and pure so the
/// write-through wrapper below stays a thin shell.
#[derive(Debug, Default)]
struct Collections {
    liked: Vec<Track>,
    recent: Vec<Track>,
    playlists: Vec<Playlist>,
    active_playlist: Option<String>,
}

impl Collections {
    /// Toggle membership by id. Returns whether the track is liked now.
    fn toggle_liked(&mut self, track: Track) -> bool {
        if let Some(index) = self.liked.iter().position(|t| t.id == track.id) {
            self.liked.remove(index);
            false
        } else {
            self.liked.insert(0, track);
            true
        }
    }

    /// Move `track` to the front of the history, dropping any older entry
    /// with the same id, then truncate to the cap.
    fn record_played(&mut self, track: Track) {
        self.recent.retain(|t| t.id != track.id);
        self.recent.insert(0, track);
        self.recent.truncate(RECENT_CAP);
    }

    fn create_playlist(&mut self, title: Option<String>) -> Playlist {
        let created_at = Utc::now().timestamp_millis();
        // Creation timestamps can collide within one millisecond.
        let mut stamp = created_at;
        while self.playlists.iter().any(|p| p.id == stamp.to_string()) {
            stamp += 1;
        }
        let playlist = Playlist {
            id: stamp.to_string(),
            title: title.unwrap_or_else(|| format!("My Playlist #{}", self.playlists.len() + 1)),
            tracks: Vec::new(),
            created_at,
        };
        self.playlists.insert(0, playlist.clone());
        self.active_playlist = Some(playlist.id.clone());
        playlist
    }

    fn rename_playlist(&mut self, id: &str, title: &str) {
        if let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == id) {
            playlist.title = title.to_string();
        }
    }

    fn delete_playlist(&mut self, id: &str) {
        self.playlists.retain(|p| p.id != id);
        // Never leave the active selection dangling.
        if self.active_playlist.as_deref() == Some(id) {
            self.active_playlist = None;
        }
    }

    fn add_track_to_playlist(&mut self, playlist_id: &str, track: Track) {
        if let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == playlist_id) {
            if !playlist.contains(&track.id) {
                playlist.tracks.push(track);
            }
        }
    }

    fn remove_track_from_playlist(&mut self, playlist_id: &str, track_id: &str) {
        if let Some(playlist) = self.playlists.iter_mut().find(|p| p.id == playlist_id) {
            playlist.tracks.retain(|t| t.id != track_id);
        }
    }

    /// Stable remove-and-reinsert within the liked collection.
    fn reorder_liked(&mut self, from: usize, to: usize) {
        if from >= self.liked.len() || to >= self.liked.len() {
            return;
        }
        let track = self.liked.remove(from);
        self.liked.insert(to, track);
    }
}

/// The library/playlist state manager. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct LibraryModel {
    collections: Arc<Mutex<Collections>>,
    store: PersistedStore,
}

impl LibraryModel {
    /// Load the collections from the persisted store. Malformed or absent
    /// records load as empty.
    pub fn load(store: PersistedStore) -> Self {
        let collections = Collections {
            liked: store.get(keys::LIBRARY).unwrap_or_default(),
            recent: store.get(keys::RECENTLY_PLAYED).unwrap_or_default(),
            playlists: store.get(keys::PLAYLISTS).unwrap_or_default(),
            active_playlist: None,
        };
        tracing::debug!(
            liked = collections.liked.len(),
            recent = collections.recent.len(),
            playlists = collections.playlists.len(),
            "Library loaded from store"
        );
        Self {
            collections: Arc::new(Mutex::new(collections)),
            store,
        }
    }

    pub async fn toggle_liked(&self, track: Track) -> bool {
        let mut collections = self.collections.lock().await;
        let track_id = track.id.clone();
        let liked = collections.toggle_liked(track);
        self.store.set(keys::LIBRARY, &collections.liked);
        tracing::debug!(track_id = %track_id, liked, "Toggled liked track");
        liked
    }

    pub async fn is_liked(&self, track_id: &str) -> bool {
        let collections = self.collections.lock().await;
        collections.liked.iter().any(|t| t.id == track_id)
    }

    pub async fn liked_tracks(&self) -> Vec<Track> {
        self.collections.lock().await.liked.clone()
    }

    pub async fn reorder_liked(&self, from: usize, to: usize) {
        let mut collections = self.collections.lock().await;
        collections.reorder_liked(from, to);
        self.store.set(keys::LIBRARY, &collections.liked);
    }

    pub async fn record_played(&self, track: Track) {
        let mut collections = self.collections.lock().await;
        collections.record_played(track);
        self.store.set(keys::RECENTLY_PLAYED, &collections.recent);
    }

    pub async fn recently_played(&self) -> Vec<Track> {
        self.collections.lock().await.recent.clone()
    }

    /// Create a playlist and make it the active selection.
    pub async fn create_playlist(&self, title: Option<String>) -> Playlist {
        let mut collections = self.collections.lock().await;
        let playlist = collections.create_playlist(title);
        self.store.set(keys::PLAYLISTS, &collections.playlists);
        tracing::info!(playlist_id = %playlist.id, title = %playlist.title, "Created playlist");
        playlist
    }

    pub async fn rename_playlist(&self, id: &str, title: &str) {
        let mut collections = self.collections.lock().await;
        collections.rename_playlist(id, title);
        self.store.set(keys::PLAYLISTS, &collections.playlists);
    }

    pub async fn delete_playlist(&self, id: &str) {
        let mut collections = self.collections.lock().await;
        collections.delete_playlist(id);
        self.store.set(keys::PLAYLISTS, &collections.playlists);
        tracing::info!(playlist_id = %id, "Deleted playlist");
    }

    pub async fn add_track_to_playlist(&self, playlist_id: &str, track: Track) {
        let mut collections = self.collections.lock().await;
        collections.add_track_to_playlist(playlist_id, track);
        self.store.set(keys::PLAYLISTS, &collections.playlists);
    }

    pub async fn remove_track_from_playlist(&self, playlist_id: &str, track_id: &str) {
        let mut collections = self.collections.lock().await;
        collections.remove_track_from_playlist(playlist_id, track_id);
        self.store.set(keys::PLAYLISTS, &collections.playlists);
    }

    pub async fn playlists(&self) -> Vec<Playlist> {
        self.collections.lock().await.playlists.clone()
    }

    pub async fn playlist(&self, id: &str) -> Option<Playlist> {
        let collections = self.collections.lock().await;
        collections.playlists.iter().find(|p| p.id == id).cloned()
    }

    pub async fn active_playlist(&self) -> Option<String> {
        self.collections.lock().await.active_playlist.clone()
    }

    /// Select a playlist, or clear the selection with `None`. Selecting an
    /// unknown id is a no-op.
    pub async fn set_active_playlist(&self, id: Option<String>) {
        let mut collections = self.collections.lock().await;
        match id {
            Some(id) if collections.playlists.iter().any(|p| p.id == id) => {
                collections.active_playlist = Some(id);
            }
            Some(id) => {
                tracing::debug!(playlist_id = %id, "Ignoring selection of unknown playlist");
            }
            None => collections.active_playlist = None,
        }
    }
}
