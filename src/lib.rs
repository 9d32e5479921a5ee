//! SpotyDa player core.
//!
//! The headless heart of a streaming music player: a persisted key-value
//! store, an Audius discovery client with node failover, write-through
//! library and playlist collections, and a playback state machine over an
//! embedding-provided media output. The view layer is an external
//! collaborator; it renders [`model::AppModel`] state and forwards user
//! intents to the [`controller::PlayerController`].
//!
//! A composition root wires the pieces together:
//!
//! ```no_run
//! use std::sync::Arc;
//! use spotyda_core::audio::MediaOutput;
//! use spotyda_core::controller::PlayerController;
//! use spotyda_core::model::{AppModel, AudiusClient};
//! use spotyda_core::storage::PersistedStore;
//!
//! # fn media_element() -> (Arc<dyn MediaOutput>, spotyda_core::audio::MediaEventReceiver) { unimplemented!() }
//! # async fn compose() -> anyhow::Result<()> {
//! spotyda_core::logging::init_logging()?;
//!
//! let store = PersistedStore::new(".spotyda");
//! let model = Arc::new(AppModel::new(AudiusClient::new()?, store));
//! let (media, events) = media_element();
//! let controller = PlayerController::new(model.clone(), media);
//! controller.start_media_event_listener(events);
//!
//! let _home = controller.refresh_recommendations().await;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod controller;
pub mod logging;
pub mod model;
pub mod storage;

pub use audio::{MediaEvent, MediaOutput};
pub use controller::PlayerController;
pub use model::{AppModel, AudiusClient, LibraryModel, Playlist, Track};
pub use storage::PersistedStore;
