//! Media event handling and the playback state transitions they drive

use std::sync::atomic::Ordering;

use crate::audio::MediaEvent;
use super::{MAX_CONSECUTIVE_FAILURES, PlayerController};

impl PlayerController {
    /// Apply one media event to the session. Called by the spawned event
    /// listener; exposed so embedders driving their own loop can forward
    /// events directly.
    pub async fn handle_media_event(&self, event: MediaEvent) {
        match event {
            MediaEvent::Ready { duration } => {
                // Only a pending load may consume readiness; anything else
                // is a stale event from an abandoned resource.
                let Some(should_play) = self.model.stream_ready(duration).await else {
                    return;
                };
                self.reset_failure_streak();
                tracing::debug!(?duration, should_play, "Stream ready");
                if should_play {
                    self.issue_play().await;
                }
            }
            MediaEvent::TimeUpdate { position } => {
                self.model.update_position(position).await;
            }
            MediaEvent::Stalled => {
                tracing::debug!("Playback stalled on data");
                self.model.enter_buffering().await;
            }
            MediaEvent::Resumed => {
                self.model.exit_buffering().await;
            }
            MediaEvent::Ended => {
                tracing::debug!("End of media");
                self.model.mark_ended().await;
                // Never leave playback silently stopped while the queue
                // holds another track.
                if self.model.queue_len().await > 1 {
                    self.next().await;
                } else {
                    self.model.set_intent(false).await;
                }
            }
            MediaEvent::Error { reason } => {
                self.handle_media_error(&reason).await;
            }
        }
    }

    /// A broken stream skips to the next queue member after a grace delay,
    /// bounded by the consecutive-failure guard.
    async fn handle_media_error(&self, reason: &str) {
        tracing::warn!(error = %reason, "Media playback failed");
        let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;

        let has_alternatives = self.model.queue_len().await > 1;
        if !has_alternatives || failures >= MAX_CONSECUTIVE_FAILURES {
            tracing::error!(failures, "Giving up on playback after repeated failures");
            self.model.fail_session().await;
            return;
        }

        tokio::time::sleep(self.failure_skip_delay).await;
        self.next().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use anyhow::anyhow;
    use tempfile::tempdir;

    use crate::audio::{MediaEvent, MediaOutput};
    use crate::model::{AppModel, AudiusClient, PlayerState, Track};
    use crate::storage::PersistedStore;
    use super::super::PlayerController;

    #[derive(Debug, PartialEq)]
    enum Command {
        Load(String),
        Play,
        Pause,
        Seek(Duration),
        Volume(u8),
    }

    /// Scripted media output recording every command it receives.
    #[derive(Default)]
    struct FakeMedia {
        commands: StdMutex<Vec<Command>>,
        refuse_play: AtomicBool,
    }

    impl FakeMedia {
        fn commands(&self) -> Vec<Command> {
            std::mem::take(&mut self.commands.lock().unwrap())
        }

        fn last_loaded(&self) -> Option<String> {
            self.commands
                .lock()
                .unwrap()
                .iter()
                .rev()
                .find_map(|c| match c {
                    Command::Load(url) => Some(url.clone()),
                    _ => None,
                })
        }
    }

    impl MediaOutput for FakeMedia {
        fn load(&self, url: &str) {
            self.commands.lock().unwrap().push(Command::Load(url.to_string()));
        }

        fn play(&self) -> anyhow::Result<()> {
            if self.refuse_play.load(Ordering::SeqCst) {
                return Err(anyhow!("autoplay blocked"));
            }
            self.commands.lock().unwrap().push(Command::Play);
            Ok(())
        }

        fn pause(&self) {
            self.commands.lock().unwrap().push(Command::Pause);
        }

        fn seek(&self, position: Duration) {
            self.commands.lock().unwrap().push(Command::Seek(position));
        }

        fn set_volume(&self, volume: u8) {
            self.commands.lock().unwrap().push(Command::Volume(volume));
        }
    }

    fn track(id: &str) -> Track {
        Track {
            id: id.to_string(),
            title: format!("Title {id}"),
            artist: "Artist".to_string(),
            album: "Album".to_string(),
            cover_url: "https://example.com/cover.jpg".to_string(),
            audio_url: format!("https://example.com/{id}/stream"),
            duration: "3:00".to_string(),
        }
    }

    fn fixture() -> (PlayerController, Arc<FakeMedia>, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let model = Arc::new(AppModel::new(
            AudiusClient::new().unwrap(),
            PersistedStore::new(dir.path()),
        ));
        let media = Arc::new(FakeMedia::default());
        let controller = PlayerController::new(model, media.clone())
            .with_failure_skip_delay(Duration::ZERO);
        (controller, media, dir)
    }

    #[tokio::test]
    async fn play_track_loads_and_records_recently_played() {
        let (controller, media, _dir) = fixture();

        controller.play_track(track("a"), vec![track("a"), track("b")]).await;

        assert_eq!(controller.model.player_state().await, PlayerState::Loading);
        assert!(controller.model.is_playing_intent().await);
        assert_eq!(media.commands(), vec![Command::Load("https://example.com/a/stream".to_string())]);
        assert_eq!(controller.model.library.recently_played().await[0].id, "a");
    }

    #[tokio::test]
    async fn ready_issues_the_deferred_play() {
        let (controller, media, _dir) = fixture();
        controller.play_track(track("a"), Vec::new()).await;
        media.commands();

        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(180)) })
            .await;

        assert_eq!(controller.model.player_state().await, PlayerState::Playing);
        assert_eq!(media.commands(), vec![Command::Play]);
    }

    #[tokio::test]
    async fn blocked_play_resets_intent() {
        let (controller, media, _dir) = fixture();
        controller.play_track(track("a"), Vec::new()).await;
        media.refuse_play.store(true, Ordering::SeqCst);

        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(180)) })
            .await;

        assert!(!controller.model.is_playing_intent().await);
        assert_eq!(controller.model.player_state().await, PlayerState::Paused);
    }

    #[tokio::test]
    async fn play_and_pause_are_no_ops_without_a_track() {
        let (controller, media, _dir) = fixture();

        controller.play().await;
        controller.pause().await;
        controller.toggle_playback().await;

        assert!(media.commands().is_empty());
        assert_eq!(controller.model.player_state().await, PlayerState::Idle);
    }

    #[tokio::test]
    async fn stale_ready_events_are_ignored() {
        let (controller, media, _dir) = fixture();
        controller.play_track(track("a"), Vec::new()).await;
        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(10)) })
            .await;
        media.commands();

        // A second readiness report for the same resource changes nothing.
        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(99)) })
            .await;

        assert!(media.commands().is_empty());
        assert_eq!(controller.model.playback_info().await.duration, Some(Duration::from_secs(10)));
    }

    #[tokio::test]
    async fn queue_wraparound_round_trips() {
        let (controller, _media, _dir) = fixture();
        let queue = vec![track("t1"), track("t2"), track("t3")];
        controller.play_track(track("t1"), queue).await;

        controller.next().await;
        assert_eq!(controller.model.current_track().await.unwrap().id, "t2");
        controller.next().await;
        assert_eq!(controller.model.current_track().await.unwrap().id, "t3");
        controller.next().await;
        assert_eq!(controller.model.current_track().await.unwrap().id, "t1");

        controller.previous().await;
        assert_eq!(controller.model.current_track().await.unwrap().id, "t3");
    }

    #[tokio::test]
    async fn next_is_a_no_op_with_an_empty_queue() {
        let (controller, media, _dir) = fixture();
        controller.next().await;
        controller.previous().await;
        assert!(media.commands().is_empty());
    }

    #[tokio::test]
    async fn seek_clamps_and_requires_a_known_duration() {
        let (controller, media, _dir) = fixture();
        controller.play_track(track("a"), Vec::new()).await;

        // Duration still unknown: no seek reaches the media output.
        controller.seek(0.5).await;
        assert_eq!(
            media.commands(),
            vec![Command::Load("https://example.com/a/stream".to_string())]
        );

        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(100)) })
            .await;
        media.commands();

        controller.seek(-0.3).await;
        controller.seek(1.7).await;
        controller.seek(0.25).await;
        assert_eq!(
            media.commands(),
            vec![
                Command::Seek(Duration::ZERO),
                Command::Seek(Duration::from_secs(100)),
                Command::Seek(Duration::from_secs(25)),
            ]
        );
    }

    #[tokio::test]
    async fn ended_advances_through_a_queue() {
        let (controller, media, _dir) = fixture();
        controller.play_track(track("a"), vec![track("a"), track("b")]).await;
        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(5)) })
            .await;
        media.commands();

        controller.handle_media_event(MediaEvent::Ended).await;

        assert_eq!(controller.model.current_track().await.unwrap().id, "b");
        assert_eq!(media.last_loaded(), Some("https://example.com/b/stream".to_string()));
    }

    #[tokio::test]
    async fn ended_without_queue_alternatives_stops() {
        let (controller, _media, _dir) = fixture();
        controller.play_track(track("a"), Vec::new()).await;
        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(5)) })
            .await;

        controller.handle_media_event(MediaEvent::Ended).await;

        assert_eq!(controller.model.player_state().await, PlayerState::Ended);
        assert!(!controller.model.is_playing_intent().await);
        assert_eq!(controller.model.current_track().await.unwrap().id, "a");
    }

    #[tokio::test]
    async fn media_error_skips_to_the_next_track() {
        let (controller, media, _dir) = fixture();
        controller.play_track(track("a"), vec![track("a"), track("b")]).await;
        media.commands();

        controller
            .handle_media_event(MediaEvent::Error { reason: "404".to_string() })
            .await;

        assert_eq!(controller.model.current_track().await.unwrap().id, "b");
        assert_eq!(media.last_loaded(), Some("https://example.com/b/stream".to_string()));
    }

    #[tokio::test]
    async fn repeated_errors_give_up_instead_of_looping() {
        let (controller, _media, _dir) = fixture();
        controller.play_track(track("a"), vec![track("a"), track("b"), track("c")]).await;

        // Every queued track is broken; the guard must end the skip loop.
        for _ in 0..super::MAX_CONSECUTIVE_FAILURES {
            controller
                .handle_media_event(MediaEvent::Error { reason: "broken".to_string() })
                .await;
        }

        assert_eq!(controller.model.player_state().await, PlayerState::Idle);
        assert_eq!(controller.model.current_track().await, None);
        assert!(!controller.model.is_playing_intent().await);
    }

    #[tokio::test]
    async fn a_successful_load_resets_the_failure_streak() {
        let (controller, _media, _dir) = fixture();
        controller.play_track(track("a"), vec![track("a"), track("b")]).await;

        controller
            .handle_media_event(MediaEvent::Error { reason: "broken".to_string() })
            .await;
        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(5)) })
            .await;

        assert_eq!(controller.consecutive_failures.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stall_and_resume_toggle_buffering() {
        let (controller, _media, _dir) = fixture();
        controller.play_track(track("a"), Vec::new()).await;
        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(5)) })
            .await;
        assert_eq!(controller.model.player_state().await, PlayerState::Playing);

        controller.handle_media_event(MediaEvent::Stalled).await;
        assert_eq!(controller.model.player_state().await, PlayerState::Buffering);
        assert!(controller.model.playback_info().await.buffering);

        controller.handle_media_event(MediaEvent::Resumed).await;
        assert_eq!(controller.model.player_state().await, PlayerState::Playing);
        assert!(!controller.model.playback_info().await.buffering);
    }

    #[tokio::test]
    async fn stalled_while_paused_changes_nothing() {
        let (controller, _media, _dir) = fixture();
        controller.play_track(track("a"), Vec::new()).await;
        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(5)) })
            .await;
        controller.pause().await;

        controller.handle_media_event(MediaEvent::Stalled).await;
        assert_eq!(controller.model.player_state().await, PlayerState::Paused);
    }

    #[tokio::test]
    async fn time_updates_mirror_into_playback_info() {
        let (controller, _media, _dir) = fixture();
        controller.play_track(track("a"), Vec::new()).await;
        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(60)) })
            .await;

        controller
            .handle_media_event(MediaEvent::TimeUpdate { position: Duration::from_secs(15) })
            .await;

        let info = controller.model.playback_info().await;
        assert_eq!(info.position, Duration::from_secs(15));
        assert_eq!(info.duration, Some(Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn volume_steps_are_clamped_and_forwarded() {
        let (controller, media, _dir) = fixture();

        for _ in 0..10 {
            controller.volume_up().await;
        }
        assert_eq!(controller.model.volume().await, 100);

        for _ in 0..25 {
            controller.volume_down().await;
        }
        assert_eq!(controller.model.volume().await, 0);

        let commands = media.commands();
        assert_eq!(commands.first(), Some(&Command::Volume(75)));
        assert_eq!(commands.last(), Some(&Command::Volume(0)));
    }

    #[tokio::test]
    async fn pause_then_next_keeps_the_paused_intent() {
        let (controller, media, _dir) = fixture();
        controller.play_track(track("a"), vec![track("a"), track("b")]).await;
        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(5)) })
            .await;
        controller.pause().await;
        media.commands();

        controller.next().await;
        controller
            .handle_media_event(MediaEvent::Ready { duration: Some(Duration::from_secs(5)) })
            .await;

        // The new track loads but playback stays paused.
        assert_eq!(controller.model.player_state().await, PlayerState::Paused);
        assert!(!media.commands().contains(&Command::Play));
    }
}
