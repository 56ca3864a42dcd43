mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use tokio::time::timeout;

use common::{GOOD_PLAYLIST, TestApp};

#[tokio::test]
async fn search_skips_null_playlists() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/spotify/search"))
        .json(&json!({ "query": "rock" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();

    let items = body["playlists"]["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], GOOD_PLAYLIST);
    assert_eq!(items[0]["owner"]["display_name"], "Spotify");
    assert_eq!(items[0]["images"], json!([]));
}

#[tokio::test]
async fn playlist_lookup_maps_spotify_errors() {
    let app = TestApp::spawn().await;

    let (status, playlist) = app.get(&format!("/spotify/playlists/{GOOD_PLAYLIST}")).await;
    assert_eq!(status, StatusCode::OK, "{playlist}");
    assert_eq!(playlist["name"], "Rock Classics");
    assert_eq!(playlist["tracks"]["total"], 2);

    let (status, _) = app.get("/spotify/playlists/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.get("/spotify/playlists/bad-id!").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn room_stream_sends_handshake_then_events() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let room_id = app.room_with_host(&host, "alice").await;

    let mut stream = app
        .client
        .get(app.url(&format!("/rooms/{room_id}/events")))
        .send()
        .await
        .unwrap();
    assert_eq!(stream.status().as_u16(), 200);

    let mut received = String::new();
    while !received.contains("event: info") {
        let chunk = timeout(Duration::from_secs(5), stream.chunk())
            .await
            .expect("handshake in time")
            .unwrap()
            .expect("stream still open");
        received.push_str(&String::from_utf8_lossy(&chunk));
    }
    assert!(received.contains(&room_id));

    let guest = app.session().await;
    app.join(&guest, &room_id, "bob").await;

    while !received.contains("event: player.joined") {
        let chunk = timeout(Duration::from_secs(5), stream.chunk())
            .await
            .expect("event in time")
            .unwrap()
            .expect("stream still open");
        received.push_str(&String::from_utf8_lossy(&chunk));
    }
    assert!(received.contains("\"username\":\"bob\""));
}

#[tokio::test]
async fn unknown_room_has_no_stream() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/rooms/ZZZZZZ/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn healthcheck_reports_the_backend() {
    let app = TestApp::spawn().await;

    let (status, health) = app.get("/healthcheck").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert_eq!(health["storage"], "memory");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::spawn().await;

    let (status, doc) = app.get("/api-doc/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"].get("/rooms/{room_id}/rounds").is_some());
    assert!(doc["components"]["securitySchemes"].get("session_token").is_some());
}
