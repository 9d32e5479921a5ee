//! Playback session types and derived timing state

use std::time::Duration;

use crate::audio::DEFAULT_VOLUME_PERCENT;
use super::types::Track;

/// Lifecycle of the single media resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PlayerState {
    /// No track loaded.
    #[default]
    Idle,
    /// A track was selected, the stream is not ready yet.
    Loading,
    /// Stream ready, not playing.
    Paused,
    Playing,
    /// Playing but stalled on data.
    Buffering,
    /// Natural end of the loaded media.
    Ended,
}

/// The transient playback session: the current track and the queue it was
/// launched from. Never persisted.
///
/// Invariant: whenever `queue` is non-empty, `current` is a member of it,
/// so wrap-around next/previous stays well-defined.
#[derive(Clone, Debug)]
pub struct PlaybackSession {
    pub current: Option<Track>,
    pub queue: Vec<Track>,
    /// The user's play/pause intent, decoupled from the media element state.
    pub intent_playing: bool,
    pub state: PlayerState,
    pub volume: u8,
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self {
            current: None,
            queue: Vec::new(),
            intent_playing: false,
            state: PlayerState::Idle,
            volume: DEFAULT_VOLUME_PERCENT,
        }
    }
}

impl PlaybackSession {
    pub fn current_index(&self) -> Option<usize> {
        let current = self.current.as_ref()?;
        self.queue.iter().position(|t| t.id == current.id)
    }
}

/// Position, duration and buffering as last reported by the media output.
/// The media element owns the clock; this is a mirror for rendering.
#[derive(Clone, Debug, Default)]
pub struct PlaybackTiming {
    pub position: Duration,
    pub duration: Option<Duration>,
    pub buffering: bool,
}

impl PlaybackTiming {
    /// Playback progress as a fraction in [0, 1]; zero while the duration
    /// is unknown.
    pub fn progress(&self) -> f64 {
        match self.duration {
            Some(duration) if duration > Duration::ZERO => {
                (self.position.as_secs_f64() / duration.as_secs_f64()).min(1.0)
            }
            _ => 0.0,
        }
    }
}

/// Complete playback information for rendering by the embedding view.
#[derive(Clone, Debug, Default)]
pub struct PlaybackInfo {
    pub track: Option<Track>,
    pub state: PlayerState,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub buffering: bool,
    pub volume: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: id.to_string(),
            artist: String::new(),
            album: String::new(),
            cover_url: String::new(),
            audio_url: String::new(),
            duration: "0:00".to_string(),
        }
    }

    #[test]
    fn current_index_finds_by_id() {
        let session = PlaybackSession {
            current: Some(track("b")),
            queue: vec![track("a"), track("b"), track("c")],
            ..Default::default()
        };
        assert_eq!(session.current_index(), Some(1));
    }

    #[test]
    fn current_index_none_without_current_or_membership() {
        let mut session = PlaybackSession::default();
        assert_eq!(session.current_index(), None);

        session.current = Some(track("x"));
        session.queue = vec![track("a")];
        assert_eq!(session.current_index(), None);
    }

    #[test]
    fn progress_is_zero_while_duration_unknown() {
        let mut timing = PlaybackTiming {
            position: Duration::from_secs(10),
            ..Default::default()
        };
        assert_eq!(timing.progress(), 0.0);

        timing.duration = Some(Duration::from_secs(40));
        assert_eq!(timing.progress(), 0.25);
    }
}
