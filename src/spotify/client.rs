use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::SpotifyEndpoints;

use super::{
    error::SpotifyError,
    models::{
        Paging, PlaylistItem, PlaylistObject, SearchResponse, TokenResponse, Track, TrackObject,
    },
    preview::extract_preview_url,
};

/// Number of playlists returned by a search.
const SEARCH_LIMIT: &str = "10";
/// Tokens are refreshed this long before Spotify says they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
/// Upper bound for a Web API or token request.
const API_TIMEOUT: Duration = Duration::from_secs(10);
/// Upper bound for one embed page fetch; a round start may chain several of them.
const EMBED_TIMEOUT: Duration = Duration::from_secs(4);

/// Client-credentials pair of the Spotify application.
#[derive(Debug, Clone)]
pub struct SpotifyCredentials {
    /// Application client id.
    pub client_id: String,
    /// Application client secret.
    pub client_secret: String,
}

impl SpotifyCredentials {
    /// Read `SPOTIFY_CLIENT_ID` and `SPOTIFY_CLIENT_SECRET`; `None` when either is missing or empty.
    pub fn from_env() -> Option<Self> {
        let client_id = std::env::var("SPOTIFY_CLIENT_ID").ok()?;
        let client_secret = std::env::var("SPOTIFY_CLIENT_SECRET").ok()?;
        if client_id.is_empty() || client_secret.is_empty() {
            return None;
        }
        Some(Self {
            client_id,
            client_secret,
        })
    }
}

struct CachedToken {
    access_token: String,
    refresh_after: Instant,
}

/// Spotify Web API client authenticating with the client-credentials flow.
pub struct SpotifyClient {
    http: Client,
    endpoints: SpotifyEndpoints,
    credentials: Option<SpotifyCredentials>,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    /// Build a client for the given endpoints. Without credentials every API call fails with
    /// [`SpotifyError::MissingCredentials`].
    pub fn new(endpoints: SpotifyEndpoints, credentials: Option<SpotifyCredentials>) -> Self {
        Self {
            http: Client::new(),
            endpoints,
            credentials,
            token: Mutex::new(None),
        }
    }

    /// Search public playlists matching `query`.
    pub async fn search_playlists(
        &self,
        query: &str,
    ) -> Result<Paging<PlaylistObject>, SpotifyError> {
        const CONTEXT: &str = "searching playlists";
        let url = format!("{}/search", self.endpoints.api_url);
        let token = self.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[("q", query), ("type", "playlist"), ("limit", SEARCH_LIMIT)])
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(|source| SpotifyError::Request {
                context: CONTEXT,
                source,
            })?;

        let payload: SearchResponse = decode(response, CONTEXT).await?;
        let page = payload.playlists.unwrap_or(Paging {
            items: Vec::new(),
            total: 0,
        });

        Ok(Paging {
            items: page.items.into_iter().flatten().collect(),
            total: page.total,
        })
    }

    /// Fetch a playlist's metadata.
    pub async fn get_playlist(&self, playlist_id: &str) -> Result<PlaylistObject, SpotifyError> {
        const CONTEXT: &str = "fetching playlist";
        let url = format!("{}/playlists/{}", self.endpoints.api_url, playlist_id);
        let token = self.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(|source| SpotifyError::Request {
                context: CONTEXT,
                source,
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SpotifyError::NotFound(format!("playlist `{playlist_id}`")));
        }
        decode(response, CONTEXT).await
    }

    /// Tracks of the first page of a playlist, skipping removed entries and local files.
    pub async fn playlist_tracks(&self, playlist_id: &str) -> Result<Vec<Track>, SpotifyError> {
        const CONTEXT: &str = "fetching playlist tracks";
        let url = format!("{}/playlists/{}/tracks", self.endpoints.api_url, playlist_id);
        let token = self.access_token().await?;

        let response = self
            .http
            .get(url)
            .bearer_auth(token)
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(|source| SpotifyError::Request {
                context: CONTEXT,
                source,
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SpotifyError::NotFound(format!("playlist `{playlist_id}`")));
        }
        let page: Paging<Option<PlaylistItem>> = decode(response, CONTEXT).await?;

        Ok(page
            .items
            .into_iter()
            .flatten()
            .filter_map(|item| item.track)
            .filter_map(TrackObject::into_track)
            .collect())
    }

    /// Preview URL scraped from the track embed page. Failures are logged and reported as `None`.
    pub async fn preview_url(&self, track_id: &str) -> Option<String> {
        let url = format!("{}/embed/track/{}", self.endpoints.embed_url, track_id);

        let response = match self.http.get(&url).timeout(EMBED_TIMEOUT).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(track_id, error = %err, "failed to fetch embed page");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(track_id, status = %response.status(), "failed to fetch embed page");
            return None;
        }

        match response.text().await {
            Ok(html) => {
                let preview = extract_preview_url(&html);
                if preview.is_none() {
                    warn!(track_id, "embed page exposes no audio preview");
                }
                preview
            }
            Err(err) => {
                warn!(track_id, error = %err, "failed to read embed page");
                None
            }
        }
    }

    /// Return a valid access token, requesting a new one when the cached token is stale.
    async fn access_token(&self) -> Result<String, SpotifyError> {
        const CONTEXT: &str = "requesting an access token";
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(SpotifyError::MissingCredentials)?;

        let mut guard = self.token.lock().await;
        if let Some(cached) = guard.as_ref() {
            if Instant::now() < cached.refresh_after {
                return Ok(cached.access_token.clone());
            }
        }

        let url = format!("{}/api/token", self.endpoints.accounts_url);
        let response = self
            .http
            .post(url)
            .basic_auth(&credentials.client_id, Some(&credentials.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .timeout(API_TIMEOUT)
            .send()
            .await
            .map_err(|source| SpotifyError::Request {
                context: CONTEXT,
                source,
            })?;

        let token: TokenResponse = decode(response, CONTEXT).await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        debug!(expires_in = token.expires_in, "obtained Spotify access token");

        guard.replace(CachedToken {
            access_token: token.access_token.clone(),
            refresh_after: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

async fn decode<T>(response: reqwest::Response, context: &'static str) -> Result<T, SpotifyError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if !status.is_success() {
        return Err(SpotifyError::Status { context, status });
    }
    response
        .json::<T>()
        .await
        .map_err(|source| SpotifyError::Decode { context, source })
}
