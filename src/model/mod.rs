//! Model module - application state and data types
//!
//! This module contains the data structures and state management of the
//! player core. It is organized into submodules by responsibility:
//!
//! - `types`: canonical track and playlist shapes
//! - `playback`: transient playback session state and derived timing
//! - `library`: liked songs, recently played and user playlists
//! - `audius_client`: the discovery API client
//! - `app_model`: main application model with state management methods

mod app_model;
mod audius_client;
mod library;
mod playback;
mod types;

// Re-export all public types for convenient access
pub use app_model::AppModel;
pub use audius_client::AudiusClient;
pub use library::{LibraryModel, RECENT_CAP};
pub use playback::{PlaybackInfo, PlaybackSession, PlaybackTiming, PlayerState};
pub use types::{Playlist, Track};
