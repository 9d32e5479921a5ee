//! Core type definitions for the player

use serde::{Deserialize, Serialize};

/// A track in its canonical shape, immutable once fetched.
///
/// Identity within any collection is the provider-stable `id`; two tracks
/// with the same title from different providers stay distinct entities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub cover_url: String,
    pub audio_url: String,
    /// Display duration in `M:SS` form, independent of the live playback clock.
    pub duration: String,
}

/// A user-owned playlist.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    /// Creation-time epoch millis rendered as a string, unique across the
    /// playlist collection.
    pub id: String,
    pub title: String,
    pub tracks: Vec<Track>,
    pub created_at: i64,
}

impl Playlist {
    pub fn contains(&self, track_id: &str) -> bool {
        self.tracks.iter().any(|t| t.id == track_id)
    }
}
