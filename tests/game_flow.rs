mod common;

use std::{
    sync::atomic::Ordering,
    time::{Duration, Instant},
};

use axum::http::StatusCode;
use serde_json::json;

use common::{EMPTY_PLAYLIST, GOOD_PLAYLIST, NO_PREVIEW_PLAYLIST, SLOW_PLAYLIST, TestApp};

#[tokio::test]
async fn full_game_round_trip() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let guest = app.session().await;

    let room_id = app.room_with_host(&host, "alice").await;
    let joined = app.join(&guest, &room_id, "bob").await;
    assert_eq!(joined["player"]["is_host"], false);

    let (status, room) = app
        .put(
            &host,
            &format!("/rooms/{room_id}/settings"),
            json!({ "playlist_id": GOOD_PLAYLIST }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{room}");
    assert_eq!(room["playlist_id"], GOOD_PLAYLIST);

    let (status, round) = app
        .post(&host, &format!("/rooms/{room_id}/rounds"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{round}");
    assert_eq!(round["round_number"], 1);
    assert_eq!(round["track_id"], "ok1");
    assert_eq!(round["artist_name"], "Queen");
    assert_eq!(round["preview_url"], "https://p.scdn.co/mp3-preview/ok1");
    let round_id = round["round_id"].as_str().unwrap().to_string();

    // names stay hidden while the round is open
    let (status, current) = app.get(&format!("/rooms/{room_id}/rounds/current")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(current["round_id"], round_id.as_str());
    assert_eq!(current["finished"], false);
    assert!(current["track"].is_null());

    let answers = format!("/rooms/{room_id}/rounds/{round_id}/answers");
    let (status, correct) = app.post(&host, &answers, json!({ "answer": "queen" })).await;
    assert_eq!(status, StatusCode::OK, "{correct}");
    assert_eq!(correct["is_correct"], true);
    assert!(correct["score"].as_u64().unwrap() > 900);

    let (status, again) = app.post(&host, &answers, json!({ "answer": "Queen" })).await;
    assert_eq!(status, StatusCode::CONFLICT, "{again}");

    let (status, wrong) = app.post(&guest, &answers, json!({ "answer": "Abba" })).await;
    assert_eq!(status, StatusCode::OK, "{wrong}");
    assert_eq!(wrong["is_correct"], false);
    assert_eq!(wrong["score"], 0);

    // everyone answered: the round is revealed
    let (_, revealed) = app.get(&format!("/rooms/{room_id}/rounds/{round_id}")).await;
    assert_eq!(revealed["finished"], true);
    assert_eq!(
        revealed["track"]["track_name"],
        "Bohemian Rhapsody - Remastered 2011"
    );
    assert_eq!(revealed["answers"].as_array().unwrap().len(), 2);

    let (status, scoreboard) = app
        .post(&host, &format!("/rooms/{room_id}/finish"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{scoreboard}");
    assert_eq!(scoreboard["room"]["status"], "finished");
    let players = scoreboard["players"].as_array().unwrap();
    assert_eq!(players[0]["username"], "alice");
    assert_eq!(players[1]["username"], "bob");
    assert!(players[0]["player_score"].as_i64().unwrap() > 0);

    let latecomer = app.session().await;
    let (status, late) = app
        .post(
            &latecomer,
            &format!("/rooms/{room_id}/join"),
            json!({ "username": "carol" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{late}");

    let (status, reset) = app
        .post(&host, &format!("/rooms/{room_id}/reset"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{reset}");
    assert_eq!(reset["status"], "waiting");
    assert_eq!(reset["rounds_played"], 0);

    let (_, players) = app.get(&format!("/rooms/{room_id}/players")).await;
    assert!(
        players["players"]
            .as_array()
            .unwrap()
            .iter()
            .all(|player| player["player_score"] == 0)
    );
}

#[tokio::test]
async fn mutations_require_a_session() {
    let app = TestApp::spawn().await;

    let response = app.client.post(app.url("/rooms")).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = app
        .client
        .post(app.url("/rooms"))
        .header("X-Session-Token", "not-a-session")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn only_the_host_starts_rounds() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let guest = app.session().await;
    let room_id = app.room_with_host(&host, "alice").await;
    app.join(&guest, &room_id, "bob").await;

    let (status, body) = app
        .post(
            &guest,
            &format!("/rooms/{room_id}/rounds"),
            json!({ "playlist_id": GOOD_PLAYLIST }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "{body}");
    assert_eq!(app.spotify.embed_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn round_without_playlist_is_rejected() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let room_id = app.room_with_host(&host, "alice").await;

    let (status, body) = app
        .post(&host, &format!("/rooms/{room_id}/rounds"), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn preview_search_gives_up_after_five_attempts() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let room_id = app.room_with_host(&host, "alice").await;

    let (status, body) = app
        .post(
            &host,
            &format!("/rooms/{room_id}/rounds"),
            json!({ "playlist_id": NO_PREVIEW_PLAYLIST }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY, "{body}");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Failed to find a track with preview URL after maximum retries")
    );
    assert_eq!(app.spotify.embed_hits.load(Ordering::SeqCst), 5);

    // the failed attempt leaves the room untouched
    let (_, room) = app.get(&format!("/rooms/{room_id}")).await;
    assert_eq!(room["status"], "waiting");
    assert!(room["current_round_id"].is_null());
}

#[tokio::test]
async fn slow_previews_exhaust_attempts_without_blocking_the_room() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let room_id = app.room_with_host(&host, "alice").await;

    let started = Instant::now();
    let rounds_path = format!("/rooms/{room_id}/rounds");
    let start = app.post(
        &host,
        &rounds_path,
        json!({ "playlist_id": SLOW_PLAYLIST }),
    );
    let join = async {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let guest = app.session().await;
        let joined_at = Instant::now();
        app.join(&guest, &room_id, "bob").await;
        joined_at.elapsed()
    };
    let ((status, body), join_took) = tokio::join!(start, join);

    assert_eq!(status, StatusCode::BAD_GATEWAY, "{body}");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("Failed to find a track with preview URL after maximum retries")
    );
    assert_eq!(app.spotify.embed_hits.load(Ordering::SeqCst), 5);
    assert!(started.elapsed() >= common::SLOW_EMBED_DELAY * 5);
    assert!(join_took < Duration::from_secs(1), "join waited {join_took:?}");
}

#[tokio::test]
async fn empty_playlist_reports_no_tracks() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let room_id = app.room_with_host(&host, "alice").await;

    let (status, body) = app
        .post(
            &host,
            &format!("/rooms/{room_id}/rounds"),
            json!({ "playlist_id": EMPTY_PLAYLIST }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(body["message"].as_str().unwrap().contains("No tracks found"));
    assert_eq!(app.spotify.embed_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn answering_a_stale_round_conflicts() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let room_id = app.room_with_host(&host, "alice").await;
    let start = format!("/rooms/{room_id}/rounds");

    let (_, first) = app
        .post(&host, &start, json!({ "playlist_id": GOOD_PLAYLIST }))
        .await;
    let (status, second) = app.post(&host, &start, json!({})).await;
    assert_eq!(status, StatusCode::OK, "{second}");
    assert_eq!(second["round_number"], 2);

    let stale = first["round_id"].as_str().unwrap();
    let (status, body) = app
        .post(
            &host,
            &format!("/rooms/{room_id}/rounds/{stale}/answers"),
            json!({ "answer": "Queen" }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
}

#[tokio::test]
async fn outsiders_cannot_answer() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let outsider = app.session().await;
    let room_id = app.room_with_host(&host, "alice").await;

    let (_, round) = app
        .post(
            &host,
            &format!("/rooms/{room_id}/rounds"),
            json!({ "playlist_id": GOOD_PLAYLIST }),
        )
        .await;
    let round_id = round["round_id"].as_str().unwrap();

    let (status, body) = app
        .post(
            &outsider,
            &format!("/rooms/{room_id}/rounds/{round_id}/answers"),
            json!({ "answer": "Queen" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND, "{body}");
}

#[tokio::test]
async fn blank_usernames_are_rejected() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let (_, created) = app.post(&host, "/rooms", json!({})).await;
    let room_id = created["room"]["room_id"].as_str().unwrap();

    let (status, body) = app
        .post(
            &host,
            &format!("/rooms/{room_id}/join"),
            json!({ "username": "   " }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn room_codes_are_case_insensitive() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let room_id = app.room_with_host(&host, "alice").await;

    let (status, room) = app
        .get(&format!("/rooms/{}", room_id.to_lowercase()))
        .await;
    assert_eq!(status, StatusCode::OK, "{room}");
    assert_eq!(room["room_id"], room_id.as_str());

    let (status, _) = app.get("/rooms/NOPE42").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn host_leaving_hands_the_room_over() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let guest = app.session().await;
    let room_id = app.room_with_host(&host, "alice").await;
    app.join(&guest, &room_id, "bob").await;

    let (status, left) = app
        .post(&host, &format!("/rooms/{room_id}/leave"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{left}");
    assert_eq!(left["room_deleted"], false);
    assert_eq!(left["host_id"], guest.user_id.as_str());

    let (_, players) = app.get(&format!("/rooms/{room_id}/players")).await;
    let players = players["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0]["is_host"], true);

    let (status, left) = app
        .post(&guest, &format!("/rooms/{room_id}/leave"), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK, "{left}");
    assert_eq!(left["room_deleted"], true);

    let (status, _) = app.get(&format!("/rooms/{room_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn host_kicks_a_player() {
    let app = TestApp::spawn().await;
    let host = app.session().await;
    let guest = app.session().await;
    let room_id = app.room_with_host(&host, "alice").await;
    let joined = app.join(&guest, &room_id, "bob").await;
    let player_id = joined["player"]["player_id"].as_str().unwrap();
    let kick = format!("/rooms/{room_id}/players/{player_id}");

    let (status, _) = app.delete(&guest, &kick).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.delete(&host, &kick).await;
    assert_eq!(status, StatusCode::NO_CONTENT, "{body}");

    let (_, players) = app.get(&format!("/rooms/{room_id}/players")).await;
    assert_eq!(players["players"].as_array().unwrap().len(), 1);
}
