//! Search and recommendation flows
//!
//! Provider failures never escape to the view layer: searches degrade to an
//! empty result and recommendation refreshes fall back to the persisted
//! cache, with the failure reason kept in the logs.

use crate::model::Track;
use super::PlayerController;

impl PlayerController {
    /// Run a search for `query` and return the tracks now showing.
    ///
    /// Responses are sequenced: when a newer search was issued while this
    /// one was in flight, the stale response is discarded and the fresher
    /// results stand.
    pub async fn run_search(&self, query: &str) -> Vec<Track> {
        if query.trim().is_empty() {
            self.model.clear_search_results().await;
            return Vec::new();
        }

        let token = self.model.begin_search();
        let tracks = match self.model.provider.search(query).await {
            Ok(tracks) => tracks,
            Err(e) => {
                tracing::warn!(error = %e, query, "Search failed, degrading to empty results");
                Vec::new()
            }
        };

        if self.model.apply_search_results(token, tracks.clone()).await {
            tracks
        } else {
            self.model.search_results().await
        }
    }

    /// Refresh recommendations from the provider. The cache stands when the
    /// fetch fails or comes back empty.
    pub async fn refresh_recommendations(&self) -> Vec<Track> {
        match self.model.provider.trending().await {
            Ok(tracks) if !tracks.is_empty() => {
                self.model.set_recommendations(tracks.clone()).await;
                tracks
            }
            Ok(_) => {
                tracing::debug!("Trending returned no tracks, keeping cached recommendations");
                self.model.recommendations().await
            }
            Err(e) => {
                tracing::warn!(error = %e, "Recommendations refresh failed, keeping cache");
                self.model.recommendations().await
            }
        }
    }
}
