//! Playback control methods

use std::sync::atomic::Ordering;

use crate::model::{PlayerState, Track};
use super::PlayerController;

impl PlayerController {
    /// Load `track` and start playing it, launched from `queue`.
    ///
    /// The track is recorded into the recently-played history in the same
    /// step. Loading supersedes any in-flight load of a previous track.
    pub async fn play_track(&self, track: Track, queue: Vec<Track>) {
        tracing::info!(track_id = %track.id, title = %track.title, "Loading track");
        self.model.library.record_played(track.clone()).await;
        self.model.start_session(track.clone(), queue).await;
        self.media.load(&track.audio_url);
    }

    /// Resume playback. No-op while no track is loaded; during a load the
    /// play is deferred until the stream is ready.
    pub async fn play(&self) {
        if !self.model.has_track().await {
            return;
        }
        self.model.set_intent(true).await;
        if self.model.player_state().await == PlayerState::Loading {
            return;
        }
        self.issue_play().await;
    }

    /// Pause playback. No-op while no track is loaded.
    pub async fn pause(&self) {
        if !self.model.has_track().await {
            return;
        }
        self.model.set_intent(false).await;
        self.media.pause();
        self.model.mark_paused().await;
    }

    pub async fn toggle_playback(&self) {
        if self.model.is_playing_intent().await {
            self.pause().await;
        } else {
            self.play().await;
        }
    }

    /// Skip to the next queue member, wrapping at the end.
    pub async fn next(&self) {
        let Some(track) = self.model.advance(1).await else {
            return;
        };
        self.start_queued(track).await;
    }

    /// Skip to the previous queue member, wrapping at the start.
    pub async fn previous(&self) {
        let Some(track) = self.model.advance(-1).await else {
            return;
        };
        self.start_queued(track).await;
    }

    /// Seek to a fraction of the track, clamped to [0, 1]. No-op while the
    /// duration is unknown.
    pub async fn seek(&self, fraction: f64) {
        let Some(position) = self.model.seek_target(fraction).await else {
            tracing::debug!(fraction, "Seek ignored, duration unknown");
            return;
        };
        self.media.seek(position);
        self.model.update_position(position).await;
    }

    pub async fn volume_up(&self) {
        let current = self.model.volume().await;
        let volume = self.model.set_volume((current + 5).min(100)).await;
        self.media.set_volume(volume);
    }

    pub async fn volume_down(&self) {
        let current = self.model.volume().await;
        let volume = self.model.set_volume(current.saturating_sub(5)).await;
        self.media.set_volume(volume);
    }

    /// Switch to another member of the existing queue, preserving the
    /// play/pause intent.
    pub(crate) async fn start_queued(&self, track: Track) {
        tracing::debug!(track_id = %track.id, title = %track.title, "Switching to queued track");
        self.model.switch_current(track.clone()).await;
        self.media.load(&track.audio_url);
    }

    /// Ask the media output to play and reconcile the session with the
    /// answer. A refusal (blocked autoplay) resets the play intent instead
    /// of leaving a playing-but-paused state.
    pub(crate) async fn issue_play(&self) {
        match self.media.play() {
            Ok(()) => self.model.mark_playing().await,
            Err(e) => {
                tracing::warn!(error = %e, "Play request refused, resetting intent");
                self.model.set_intent(false).await;
                self.model.mark_paused().await;
            }
        }
    }

    pub(crate) fn reset_failure_streak(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
    }
}
