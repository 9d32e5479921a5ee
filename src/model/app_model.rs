//! Main application model with state management
//!
//! Owns everything outside the view layer: the provider client, the
//! persisted library collections, the transient playback session and the
//! search/recommendation content state. The playback controller is the only
//! caller of the crate-private session transitions.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Mutex;

use crate::storage::{PersistedStore, keys};
use super::audius_client::AudiusClient;
use super::library::LibraryModel;
use super::playback::{PlaybackInfo, PlaybackSession, PlaybackTiming, PlayerState};
use super::types::Track;

/// Main application model containing all state.
pub struct AppModel {
    pub provider: AudiusClient,
    pub library: LibraryModel,
    session: Arc<Mutex<PlaybackSession>>,
    timing: Arc<Mutex<PlaybackTiming>>,
    search_results: Arc<Mutex<Vec<Track>>>,
    latest_search: AtomicU64,
    recommendations: Arc<Mutex<Vec<Track>>>,
    dark_mode: Arc<Mutex<bool>>,
    store: PersistedStore,
}

impl AppModel {
    pub fn new(provider: AudiusClient, store: PersistedStore) -> Self {
        let library = LibraryModel::load(store.clone());
        let recommendations = store.get(keys::RECOMMENDATIONS).unwrap_or_default();
        let dark_mode = store.get(keys::THEME_DARK).unwrap_or(true);
        Self {
            provider,
            library,
            session: Arc::new(Mutex::new(PlaybackSession::default())),
            timing: Arc::new(Mutex::new(PlaybackTiming::default())),
            search_results: Arc::new(Mutex::new(Vec::new())),
            latest_search: AtomicU64::new(0),
            recommendations: Arc::new(Mutex::new(recommendations)),
            dark_mode: Arc::new(Mutex::new(dark_mode)),
            store,
        }
    }

    // ========================================================================
    // Playback session
    // ========================================================================

    pub async fn playback_info(&self) -> PlaybackInfo {
        let session = self.session.lock().await.clone();
        let timing = self.timing.lock().await.clone();
        PlaybackInfo {
            track: session.current,
            state: session.state,
            position: timing.position,
            duration: timing.duration,
            buffering: timing.buffering,
            volume: session.volume,
        }
    }

    pub async fn player_state(&self) -> PlayerState {
        self.session.lock().await.state
    }

    pub async fn current_track(&self) -> Option<Track> {
        self.session.lock().await.current.clone()
    }

    pub async fn queue(&self) -> Vec<Track> {
        self.session.lock().await.queue.clone()
    }

    pub(crate) async fn queue_len(&self) -> usize {
        self.session.lock().await.queue.len()
    }

    pub(crate) async fn has_track(&self) -> bool {
        self.session.lock().await.current.is_some()
    }

    pub async fn is_playing_intent(&self) -> bool {
        self.session.lock().await.intent_playing
    }

    pub(crate) async fn set_intent(&self, playing: bool) {
        self.session.lock().await.intent_playing = playing;
    }

    /// Begin a new session around `track`, launched from `queue`.
    ///
    /// The queue is kept such that the current track is always a member of a
    /// non-empty queue: a supplied queue containing the track is adopted as
    /// is, an empty queue falls back to the previous one when that still
    /// contains the track, and anything else collapses to just the track.
    pub(crate) async fn start_session(&self, track: Track, queue: Vec<Track>) {
        let mut session = self.session.lock().await;
        if queue.iter().any(|t| t.id == track.id) {
            session.queue = queue;
        } else if !(queue.is_empty() && session.queue.iter().any(|t| t.id == track.id)) {
            session.queue = vec![track.clone()];
        }
        session.current = Some(track);
        session.intent_playing = true;
        session.state = PlayerState::Loading;
        drop(session);

        // A new load fully resets the transient position.
        *self.timing.lock().await = PlaybackTiming::default();
    }

    /// Move the session onto another member of the existing queue.
    pub(crate) async fn switch_current(&self, track: Track) {
        let mut session = self.session.lock().await;
        session.current = Some(track);
        session.state = PlayerState::Loading;
        drop(session);

        *self.timing.lock().await = PlaybackTiming::default();
    }

    /// The stream became ready. Returns whether a deferred play should be
    /// issued now, or `None` when no load is pending (a stale event).
    pub(crate) async fn stream_ready(&self, duration: Option<Duration>) -> Option<bool> {
        let mut session = self.session.lock().await;
        if session.state != PlayerState::Loading {
            tracing::debug!(state = ?session.state, "Ignoring stale stream-ready event");
            return None;
        }
        session.state = PlayerState::Paused;
        let intent = session.intent_playing;
        drop(session);

        let mut timing = self.timing.lock().await;
        timing.duration = duration;
        timing.position = Duration::ZERO;
        timing.buffering = false;
        Some(intent)
    }

    pub(crate) async fn mark_playing(&self) {
        let mut session = self.session.lock().await;
        if session.current.is_some() && session.state != PlayerState::Loading {
            session.state = PlayerState::Playing;
        }
    }

    pub(crate) async fn mark_paused(&self) {
        let mut session = self.session.lock().await;
        if matches!(
            session.state,
            PlayerState::Playing | PlayerState::Buffering | PlayerState::Ended
        ) {
            session.state = PlayerState::Paused;
        }
        drop(session);
        self.timing.lock().await.buffering = false;
    }

    pub(crate) async fn enter_buffering(&self) {
        let mut session = self.session.lock().await;
        if session.state == PlayerState::Playing {
            session.state = PlayerState::Buffering;
            drop(session);
            self.timing.lock().await.buffering = true;
        }
    }

    pub(crate) async fn exit_buffering(&self) {
        let mut session = self.session.lock().await;
        if session.state == PlayerState::Buffering {
            session.state = PlayerState::Playing;
            drop(session);
            self.timing.lock().await.buffering = false;
        }
    }

    pub(crate) async fn mark_ended(&self) {
        let mut session = self.session.lock().await;
        if session.current.is_some() {
            session.state = PlayerState::Ended;
        }
        drop(session);
        self.timing.lock().await.buffering = false;
    }

    /// Tear the session down after an unrecoverable playback failure.
    pub(crate) async fn fail_session(&self) {
        let mut session = self.session.lock().await;
        session.current = None;
        session.intent_playing = false;
        session.state = PlayerState::Idle;
        drop(session);

        *self.timing.lock().await = PlaybackTiming::default();
    }

    /// The queue member `step` positions away from the current track, with
    /// wraparound. `None` when the queue is empty or nothing is current.
    pub(crate) async fn advance(&self, step: i64) -> Option<Track> {
        let session = self.session.lock().await;
        let len = session.queue.len();
        if len == 0 {
            return None;
        }
        let index = session.current_index()?;
        let target = (index as i64 + step).rem_euclid(len as i64) as usize;
        Some(session.queue[target].clone())
    }

    /// Map a [0, 1] fraction onto the known duration, clamping out-of-range
    /// input. `None` while the duration is unknown or zero.
    pub(crate) async fn seek_target(&self, fraction: f64) -> Option<Duration> {
        if !fraction.is_finite() {
            return None;
        }
        let timing = self.timing.lock().await;
        match timing.duration {
            Some(duration) if duration > Duration::ZERO => {
                Some(duration.mul_f64(fraction.clamp(0.0, 1.0)))
            }
            _ => None,
        }
    }

    pub(crate) async fn update_position(&self, position: Duration) {
        self.timing.lock().await.position = position;
    }

    pub async fn volume(&self) -> u8 {
        self.session.lock().await.volume
    }

    pub(crate) async fn set_volume(&self, volume: u8) -> u8 {
        let clamped = volume.min(100);
        self.session.lock().await.volume = clamped;
        clamped
    }

    // ========================================================================
    // Search & recommendations
    // ========================================================================

    /// Issue the token for a new search. Responses are applied only while
    /// their token is still the latest issued, so a slow response for an
    /// earlier query can never overwrite a newer result.
    pub fn begin_search(&self) -> u64 {
        self.latest_search.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply search results if `token` is still current. Returns whether
    /// the results were applied.
    pub async fn apply_search_results(&self, token: u64, results: Vec<Track>) -> bool {
        if self.latest_search.load(Ordering::SeqCst) != token {
            tracing::debug!(token, "Discarding stale search response");
            return false;
        }
        *self.search_results.lock().await = results;
        true
    }

    pub async fn search_results(&self) -> Vec<Track> {
        self.search_results.lock().await.clone()
    }

    pub async fn clear_search_results(&self) {
        self.search_results.lock().await.clear();
    }

    pub async fn recommendations(&self) -> Vec<Track> {
        self.recommendations.lock().await.clone()
    }

    /// Replace and re-persist the recommendations cache. Empty input is
    /// rejected so cached data stands when a refresh comes back hollow.
    pub async fn set_recommendations(&self, tracks: Vec<Track>) -> bool {
        if tracks.is_empty() {
            return false;
        }
        *self.recommendations.lock().await = tracks.clone();
        self.store.set(keys::RECOMMENDATIONS, &tracks);
        true
    }

    // ========================================================================
    // Theme
    // ========================================================================

    pub async fn dark_mode(&self) -> bool {
        *self.dark_mode.lock().await
    }

    pub async fn toggle_theme(&self) -> bool {
        let mut dark = self.dark_mode.lock().await;
        *dark = !*dark;
        self.store.set(keys::THEME_DARK, &*dark);
        *dark
    }
}
