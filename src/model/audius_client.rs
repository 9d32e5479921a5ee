//! Audius discovery API client with node failover and response mapping.
//!
//! The client is an explicitly constructed instance owned by the
//! composition root; it keeps no global state. Failures carry their reason
//! to the caller, which degrades to cached or empty data instead of
//! surfacing errors to the view.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use serde::Deserialize;
use tokio::sync::{Mutex, RwLock};

use super::types::Track;

/// Public discovery nodes, probed concurrently on first use.
const DISCOVERY_NODES: [&str; 5] = [
    "https://discoveryprovider.audius.co",
    "https://audius-discovery-1.cultur3.bet",
    "https://discovery-us-01.audius.openplayer.org",
    "https://audius-metadata-5.figment.io",
    "https://discovery-au-01.audius.openplayer.org",
];

const APP_NAME: &str = "SPOTYDA_APP";
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const TRENDING_LIMIT: usize = 20;
const SEARCH_CACHE_CAP: usize = 64;

/// Raw track payload as the discovery API returns it. Every field may be
/// absent or null; mapping into [`Track`] supplies a default for each one.
#[derive(Debug, Default, Deserialize)]
pub struct RawTrack {
    #[serde(default)]
    id: serde_json::Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    user: Option<RawUser>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    artwork: Option<HashMap<String, Option<String>>>,
    #[serde(default)]
    duration: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUser {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrackPage {
    #[serde(default)]
    data: Option<Vec<RawTrack>>,
}

/// Session-lived memo of search results, keyed by normalized query text.
/// Bounded: the oldest entry is evicted once the capacity is reached.
struct SearchCache {
    entries: HashMap<String, Vec<Track>>,
    order: VecDeque<String>,
    cap: usize,
}

impl SearchCache {
    fn new(cap: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            cap,
        }
    }

    fn get(&self, query: &str) -> Option<Vec<Track>> {
        self.entries.get(query).cloned()
    }

    fn insert(&mut self, query: String, tracks: Vec<Track>) {
        if self.entries.contains_key(&query) {
            self.entries.insert(query, tracks);
            return;
        }
        if self.order.len() >= self.cap {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(query.clone());
        self.entries.insert(query, tracks);
    }
}

/// Discovery API client with endpoint failover and a session result cache.
#[derive(Clone)]
pub struct AudiusClient {
    http: reqwest::Client,
    node: Arc<RwLock<Option<String>>>,
    search_cache: Arc<Mutex<SearchCache>>,
}

impl AudiusClient {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            http,
            node: Arc::new(RwLock::new(None)),
            search_cache: Arc::new(Mutex::new(SearchCache::new(SEARCH_CACHE_CAP))),
        })
    }

    /// Search tracks by free text. An empty query resolves to an empty
    /// result without touching the network.
    pub async fn search(&self, query: &str) -> Result<Vec<Track>> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(cached) = self.search_cache.lock().await.get(&normalized) {
            tracing::debug!(query = %normalized, "Search served from session cache");
            return Ok(cached);
        }

        let node = self.resolve_node().await;
        let url = format!("{node}/v1/tracks/search");
        let page: RawTrackPage = self
            .http
            .get(&url)
            .query(&[("query", query.trim()), ("app_name", APP_NAME)])
            .send()
            .await
            .context("search request failed")?
            .error_for_status()
            .context("search request rejected")?
            .json()
            .await
            .context("search response was not valid JSON")?;

        let tracks: Vec<Track> = page
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|raw| map_track(&node, raw))
            .collect();
        tracing::debug!(query = %normalized, count = tracks.len(), "Search complete");

        self.search_cache.lock().await.insert(normalized, tracks.clone());
        Ok(tracks)
    }

    /// Trending tracks as recommendations, capped to the first page worth.
    pub async fn trending(&self) -> Result<Vec<Track>> {
        let node = self.resolve_node().await;
        let url = format!("{node}/v1/tracks/trending");
        let page: RawTrackPage = self
            .http
            .get(&url)
            .query(&[("app_name", APP_NAME)])
            .send()
            .await
            .context("trending request failed")?
            .error_for_status()
            .context("trending request rejected")?
            .json()
            .await
            .context("trending response was not valid JSON")?;

        let tracks: Vec<Track> = page
            .data
            .unwrap_or_default()
            .into_iter()
            .take(TRENDING_LIMIT)
            .map(|raw| map_track(&node, raw))
            .collect();
        tracing::debug!(count = tracks.len(), "Trending fetch complete");
        Ok(tracks)
    }

    /// Resolve the discovery node for this session. All candidates are
    /// probed concurrently and the first healthy responder (in list order)
    /// is cached until the process exits; when every probe fails the first
    /// candidate is used anyway.
    async fn resolve_node(&self) -> String {
        if let Some(node) = self.node.read().await.clone() {
            return node;
        }

        let probes = DISCOVERY_NODES.iter().map(|node| self.probe_node(node));
        let healthy = join_all(probes).await.into_iter().flatten().next();

        let node = match healthy {
            Some(node) => {
                tracing::info!(node = %node, "Connected to discovery node");
                node
            }
            None => {
                tracing::warn!(fallback = DISCOVERY_NODES[0], "No healthy discovery node, using first candidate");
                DISCOVERY_NODES[0].to_string()
            }
        };
        *self.node.write().await = Some(node.clone());
        node
    }

    async fn probe_node(&self, node: &str) -> Option<String> {
        let url = format!("{node}/v1/health_check");
        match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) if response.status().is_success() => Some(node.to_string()),
            _ => None,
        }
    }
}

/// Total mapping from the raw payload into the canonical track shape. No
/// missing field survives past this boundary.
fn map_track(node: &str, raw: RawTrack) -> Track {
    let id = raw_id(&raw.id);
    let title = raw
        .title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());
    let artist = raw
        .user
        .and_then(|u| u.name)
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "Unknown Artist".to_string());
    let album = raw
        .genre
        .filter(|g| !g.is_empty())
        .unwrap_or_else(|| "Audius Track".to_string());
    let cover_url = ensure_https(&artwork_url(raw.artwork, &title));
    let audio_url = ensure_https(&format!("{node}/v1/tracks/{id}/stream?app_name={APP_NAME}"));

    Track {
        id,
        title,
        artist,
        album,
        cover_url,
        audio_url,
        duration: format_duration(raw.duration.unwrap_or(0.0)),
    }
}

fn raw_id(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn artwork_url(artwork: Option<HashMap<String, Option<String>>>, title: &str) -> String {
    artwork
        .as_ref()
        .and_then(|sizes| {
            sizes
                .get("480x480")
                .cloned()
                .flatten()
                .or_else(|| sizes.get("150x150").cloned().flatten())
        })
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| format!("https://api.dicebear.com/7.x/initials/svg?seed={title}"))
}

/// Upgrade plain-HTTP media and image links; mixed content is blocked in
/// secure embedding contexts.
fn ensure_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

/// Render whole seconds as the `M:SS` display form.
fn format_duration(total_seconds: f64) -> String {
    if !total_seconds.is_finite() || total_seconds <= 0.0 {
        return "0:00".to_string();
    }
    let total = total_seconds as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
