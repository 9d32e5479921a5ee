//! The media-output seam.
//!
//! Playback is delegated to a media element supplied by the embedding
//! application. The playback controller owns it exclusively; no other
//! component may touch its play/pause/seek state. Commands go out through
//! [`MediaOutput`], events come back over a channel the composition root
//! wires into the controller's event listener.

use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;

pub const DEFAULT_VOLUME_PERCENT: u8 = 70;

/// Events reported by the media output for the currently loaded resource.
///
/// Implementations must discard the in-flight load of a previous resource
/// when [`MediaOutput::load`] is called again, so events observed after a
/// `load` always describe the most recently loaded source.
#[derive(Clone, Debug, PartialEq)]
pub enum MediaEvent {
    /// The stream is ready to play from position zero.
    Ready { duration: Option<Duration> },
    /// Periodic clock update while a resource is loaded.
    TimeUpdate { position: Duration },
    /// Playback stalled waiting for data.
    Stalled,
    /// Playback resumed after a stall.
    Resumed,
    /// Natural end of the media.
    Ended,
    /// The resource failed to load or errored mid-stream.
    Error { reason: String },
}

pub type MediaEventSender = mpsc::UnboundedSender<MediaEvent>;
pub type MediaEventReceiver = mpsc::UnboundedReceiver<MediaEvent>;

/// Commands against the single audio resource.
pub trait MediaOutput: Send + Sync {
    /// Begin loading `url`, resetting the playback position to zero and
    /// abandoning any in-flight load.
    fn load(&self, url: &str);

    /// Start or resume playback. An implementation may refuse (the blocked
    /// autoplay analog), in which case the controller resets its play
    /// intent rather than reporting a playing state it does not have.
    fn play(&self) -> Result<()>;

    fn pause(&self);

    /// Jump to an absolute position within the loaded resource.
    fn seek(&self, position: Duration);

    /// Output volume in percent, 0..=100.
    fn set_volume(&self, volume: u8);
}
