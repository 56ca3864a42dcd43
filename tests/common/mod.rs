#![allow(dead_code)]

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use blindtest_back::{
    build_router,
    config::{AppConfig, SpotifyEndpoints},
    dao::room_store::memory::MemoryRoomStore,
    spotify::{SpotifyClient, SpotifyCredentials},
    state::AppState,
};

/// Playlist whose only track has a preview.
pub const GOOD_PLAYLIST: &str = "goodlist";
/// Playlist of eight tracks, none previewable.
pub const NO_PREVIEW_PLAYLIST: &str = "nopreview";
/// Playlist without playable items.
pub const EMPTY_PLAYLIST: &str = "emptylist";
/// Playlist of five tracks whose embed pages are slow and carry no preview.
pub const SLOW_PLAYLIST: &str = "slowlist";
/// Latency of the embed pages of [`SLOW_PLAYLIST`].
pub const SLOW_EMBED_DELAY: Duration = Duration::from_millis(1200);

#[derive(Default)]
pub struct StubCounters {
    pub embed_hits: AtomicUsize,
    pub token_hits: AtomicUsize,
}

/// Running backend plus the Spotify stub it talks to.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub spotify: Arc<StubCounters>,
}

pub struct Session {
    pub user_id: String,
    pub token: String,
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn track(id: &str, name: &str, artist: &str) -> Value {
    json!({
        "track": {
            "id": id,
            "name": name,
            "artists": [{ "name": artist }],
            "album": { "images": [{ "url": format!("https://i.scdn.co/image/{id}"), "height": 640, "width": 640 }] }
        }
    })
}

async fn token(State(counters): State<Arc<StubCounters>>) -> Json<Value> {
    counters.token_hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "access_token": "stub-token", "token_type": "Bearer", "expires_in": 3600 }))
}

async fn playlist_tracks(Path(playlist_id): Path<String>) -> Response {
    let items = match playlist_id.as_str() {
        GOOD_PLAYLIST => vec![
            track("ok1", "Bohemian Rhapsody - Remastered 2011", "Queen"),
            json!({ "track": null }),
        ],
        NO_PREVIEW_PLAYLIST => (0..8)
            .map(|i| track(&format!("silent{i}"), "Silence", "Nobody"))
            .collect(),
        EMPTY_PLAYLIST => vec![json!({ "track": null })],
        SLOW_PLAYLIST => (0..5)
            .map(|i| track(&format!("slow{i}"), "Adagio", "Barber"))
            .collect(),
        _ => return StatusCode::NOT_FOUND.into_response(),
    };
    let total = items.len();
    Json(json!({ "items": items, "total": total })).into_response()
}

fn playlist(id: &str) -> Value {
    json!({
        "id": id,
        "name": "Rock Classics",
        "description": "Timeless rock",
        "images": null,
        "owner": { "display_name": "Spotify" },
        "tracks": { "total": 2 }
    })
}

async fn get_playlist(Path(playlist_id): Path<String>) -> Response {
    if playlist_id == GOOD_PLAYLIST {
        Json(playlist(&playlist_id)).into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn search() -> Json<Value> {
    Json(json!({
        "playlists": { "items": [playlist(GOOD_PLAYLIST), null], "total": 2 }
    }))
}

async fn embed(
    State(counters): State<Arc<StubCounters>>,
    Path(track_id): Path<String>,
) -> Html<String> {
    counters.embed_hits.fetch_add(1, Ordering::SeqCst);
    if track_id.starts_with("slow") {
        tokio::time::sleep(SLOW_EMBED_DELAY).await;
    }
    let state = if track_id.starts_with("ok") {
        json!({ "props": { "pageProps": { "state": { "data": { "entity": {
            "audioPreview": { "url": format!("https://p.scdn.co/mp3-preview/{track_id}") }
        } } } } } })
    } else {
        json!({ "props": { "pageProps": { "state": { "data": { "entity": {
            "audioPreview": null
        } } } } } })
    };
    Html(format!(
        "<html><head><script id=\"__NEXT_DATA__\" type=\"application/json\">{state}</script></head></html>"
    ))
}

async fn spawn_spotify_stub(counters: Arc<StubCounters>) -> String {
    let router = Router::new()
        .route("/api/token", post(token))
        .route("/v1/search", get(search))
        .route("/v1/playlists/{playlist_id}", get(get_playlist))
        .route("/v1/playlists/{playlist_id}/tracks", get(playlist_tracks))
        .route("/embed/track/{track_id}", get(embed))
        .with_state(counters);
    format!("http://{}", serve(router).await)
}

impl TestApp {
    pub async fn spawn() -> Self {
        let counters = Arc::new(StubCounters::default());
        let stub_url = spawn_spotify_stub(counters.clone()).await;

        let endpoints = SpotifyEndpoints {
            accounts_url: stub_url.clone(),
            api_url: format!("{stub_url}/v1"),
            embed_url: stub_url,
        };
        let config = AppConfig::default().with_spotify_endpoints(endpoints.clone());
        let spotify = SpotifyClient::new(
            endpoints,
            Some(SpotifyCredentials {
                client_id: "client".into(),
                client_secret: "secret".into(),
            }),
        );

        let state = AppState::new(config, spotify);
        state.set_room_store(Arc::new(MemoryRoomStore::new())).await;
        let addr = serve(build_router(state)).await;

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            spotify: counters,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn session(&self) -> Session {
        let body: Value = self
            .client
            .post(self.url("/sessions"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        Session {
            user_id: body["user_id"].as_str().unwrap().to_string(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// POST `body` as `session`, returning status and JSON body (Null when empty).
    pub async fn post(&self, session: &Session, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .header("X-Session-Token", &session.token)
            .json(&body)
            .send()
            .await
            .unwrap();
        into_parts(response).await
    }

    pub async fn put(&self, session: &Session, path: &str, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .put(self.url(path))
            .header("X-Session-Token", &session.token)
            .json(&body)
            .send()
            .await
            .unwrap();
        into_parts(response).await
    }

    pub async fn delete(&self, session: &Session, path: &str) -> (StatusCode, Value) {
        let response = self
            .client
            .delete(self.url(path))
            .header("X-Session-Token", &session.token)
            .send()
            .await
            .unwrap();
        into_parts(response).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, Value) {
        let response = self.client.get(self.url(path)).send().await.unwrap();
        into_parts(response).await
    }

    /// Create a room hosted by `host`, who joins it as `username`.
    pub async fn room_with_host(&self, host: &Session, username: &str) -> String {
        let (status, body) = self.post(host, "/rooms", json!({})).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        let room_id = body["room"]["room_id"].as_str().unwrap().to_string();
        self.join(host, &room_id, username).await;
        room_id
    }

    pub async fn join(&self, session: &Session, room_id: &str, username: &str) -> Value {
        let (status, body) = self
            .post(
                session,
                &format!("/rooms/{room_id}/join"),
                json!({ "username": username }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }
}

async fn into_parts(response: reqwest::Response) -> (StatusCode, Value) {
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    let text = response.text().await.unwrap();
    let body = if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };
    (status, body)
}
