//! Controller module - playback and content operations
//!
//! The playback controller is the exclusive owner of the media output and
//! the only component driving its play/pause/seek state. It is organized
//! into submodules by responsibility:
//!
//! - `playback`: user-intent operations (play, pause, seek, next/previous)
//! - `media_events`: the media event listener and state transitions
//! - `content`: search and recommendation flows

mod content;
mod media_events;
mod playback;

use std::sync::Arc;
use std::sync::atomic::AtomicU32;
use std::time::Duration;

use crate::audio::{MediaEventReceiver, MediaOutput};
use crate::model::AppModel;

/// Consecutive playback failures tolerated before the controller gives up
/// advancing through the queue. Without the guard a queue of entirely
/// broken tracks would skip forever.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Grace delay before skipping past a failed track.
pub const FAILURE_SKIP_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone)]
pub struct PlayerController {
    pub(crate) model: Arc<AppModel>,
    pub(crate) media: Arc<dyn MediaOutput>,
    pub(crate) consecutive_failures: Arc<AtomicU32>,
    pub(crate) failure_skip_delay: Duration,
}

impl PlayerController {
    pub fn new(model: Arc<AppModel>, media: Arc<dyn MediaOutput>) -> Self {
        Self {
            model,
            media,
            consecutive_failures: Arc::new(AtomicU32::new(0)),
            failure_skip_delay: FAILURE_SKIP_DELAY,
        }
    }

    /// Same controller with a custom grace delay before failure skips.
    pub fn with_failure_skip_delay(mut self, delay: Duration) -> Self {
        self.failure_skip_delay = delay;
        self
    }

    /// Spawn the media event listener. The composition root calls this once
    /// with the receiving end of the media output's event channel.
    pub fn start_media_event_listener(&self, mut events: MediaEventReceiver) {
        let controller = self.clone();
        tracing::info!("Starting media event listener");
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                controller.handle_media_event(event).await;
            }
            tracing::debug!("Media event channel closed, listener shutting down");
        });
    }
}
