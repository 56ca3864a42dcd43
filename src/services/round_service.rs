use std::time::SystemTime;

use indexmap::IndexMap;
use rand::seq::IndexedRandom;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    dao::models::{AnswerEntity, RoomStatus, RoundEntity, TrackEntity},
    dto::{
        room::PlayerSummary,
        round::{
            RoundView, StartRoundRequest, StartRoundResponse, SubmitAnswerRequest,
            SubmitAnswerResponse,
        },
    },
    error::ServiceError,
    scoring::{self, ScoringRules},
    services::{room_service, sse_events},
    spotify::{SpotifyClient, models::Track},
    state::{
        SharedState,
        room_status::{RoomEvent, transition},
    },
};

const NO_TRACKS: &str = "No tracks found";
const NO_PREVIEW: &str = "Failed to find a track with preview URL after maximum retries";

/// Pick random tracks of the playlist until one exposes an audio preview, trying at most
/// `max_attempts` distinct tracks.
pub async fn pick_track_with_preview(
    spotify: &SpotifyClient,
    playlist_id: &str,
    max_attempts: u32,
) -> Result<TrackEntity, ServiceError> {
    let tracks = spotify.playlist_tracks(playlist_id).await?;
    if tracks.is_empty() {
        return Err(ServiceError::InvalidInput(NO_TRACKS.into()));
    }

    let candidates: Vec<Track> = tracks
        .choose_multiple(&mut rand::rng(), max_attempts as usize)
        .cloned()
        .collect();

    for (attempt, track) in candidates.into_iter().enumerate() {
        match spotify.preview_url(&track.id).await {
            Some(preview_url) => {
                debug!(track_id = %track.id, attempt, "picked track with preview");
                return Ok(TrackEntity {
                    track_id: track.id,
                    track_name: track.name,
                    artist_name: track.artist_name,
                    preview_url,
                    album_image_url: track.album_image_url,
                });
            }
            None => {
                debug!(
                    track_id = %track.id,
                    retries_left = max_attempts.saturating_sub(attempt as u32 + 1),
                    "no preview URL for track"
                );
            }
        }
    }

    warn!(playlist_id, max_attempts, "no previewable track found");
    Err(ServiceError::Upstream(NO_PREVIEW.into()))
}

/// Whether answers are closed: everybody answered or the answer window elapsed.
pub fn round_is_over(
    round: &RoundEntity,
    player_count: usize,
    rules: &ScoringRules,
    now: SystemTime,
) -> bool {
    let everyone_answered = player_count > 0 && round.answers.len() >= player_count;
    everyone_answered || scoring::elapsed_secs(round.start_time, now) >= rules.max_answer_secs
}

/// Start a new round on the room's playlist (or the one given in `request`).
pub async fn start_round(
    state: &SharedState,
    user_id: Uuid,
    room_id: &str,
    request: StartRoundRequest,
) -> Result<StartRoundResponse, ServiceError> {
    let room_id = room_service::normalize_room_id(room_id)?;

    // Spotify is queried without holding the room lock; the checks are repeated under it.
    let room = room_service::load_room(state, &room_id).await?;
    room_service::ensure_host(&room, user_id, "start a round")?;
    transition(room.status, RoomEvent::RoundStarted)?;
    let playlist_id = request
        .playlist_id
        .or(room.playlist_id)
        .ok_or_else(|| ServiceError::InvalidInput("no playlist selected".into()))?;

    let track = pick_track_with_preview(
        state.spotify(),
        &playlist_id,
        state.config().max_preview_attempts,
    )
    .await?;

    state
        .with_room_lock(&room_id, || async {
            let mut room = room_service::load_room(state, &room_id).await?;
            room_service::ensure_host(&room, user_id, "start a round")?;
            let next_status = transition(room.status, RoomEvent::RoundStarted)?;

            let round = RoundEntity {
                round_id: Uuid::new_v4(),
                room_id: room.room_id.clone(),
                round_number: room.rounds_played + 1,
                track,
                start_time: SystemTime::now(),
                answers: IndexMap::new(),
            };
            let store = state.require_room_store().await?;
            store.save_round(round.clone()).await?;

            room.status = next_status;
            room.current_round_id = Some(round.round_id);
            room.rounds_played = round.round_number;
            room.playlist_id = Some(playlist_id);
            let room = room_service::save_room(state, room).await?;

            info!(
                room_id = %round.room_id,
                round_id = %round.round_id,
                round_number = round.round_number,
                "round started"
            );
            let response = StartRoundResponse::from(&round);
            sse_events::broadcast_room_updated(state, room.into());
            sse_events::broadcast_round_started(state, RoundView::from_entity(round, false));
            Ok(response)
        })
        .await
}

/// Score a player's guess for the current round.
pub async fn submit_answer(
    state: &SharedState,
    user_id: Uuid,
    room_id: &str,
    round_id: Uuid,
    request: SubmitAnswerRequest,
) -> Result<SubmitAnswerResponse, ServiceError> {
    let room_id = room_service::normalize_room_id(room_id)?;

    state
        .with_room_lock(&room_id, || async {
            let answered_at = SystemTime::now();
            let store = state.require_room_store().await?;

            let invalid_player = || ServiceError::NotFound("Invalid player or room".into());
            let room = store
                .find_room(room_id.clone())
                .await?
                .ok_or_else(invalid_player)?;
            let mut player = room_service::find_user_player(state, &room.room_id, user_id)
                .await?
                .ok_or_else(invalid_player)?;

            let mut round = store
                .find_round(room.room_id.clone(), round_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Round not found".into()))?;

            if room.status != RoomStatus::Playing || room.current_round_id != Some(round_id) {
                return Err(ServiceError::InvalidState(
                    "round is no longer accepting answers".into(),
                ));
            }
            if round.answers.contains_key(&player.player_id) {
                return Err(ServiceError::InvalidState(
                    "player already answered this round".into(),
                ));
            }

            let evaluation = scoring::evaluate(
                &request.answer,
                round.start_time,
                answered_at,
                &round.track.track_name,
                &round.track.artist_name,
                &state.config().rules,
            );

            round.answers.insert(
                player.player_id,
                AnswerEntity {
                    answer: request.answer,
                    score: evaluation.score,
                    is_correct: evaluation.is_correct(),
                    time_taken: evaluation.time_taken,
                    answered_at,
                },
            );
            store.save_round(round.clone()).await?;

            player.player_score += i64::from(evaluation.score);
            if let Err(err) = store.save_player(player.clone()).await {
                // Withdraw the answer so the player can send it again.
                round.answers.shift_remove(&player.player_id);
                if let Err(undo_err) = store.save_round(round).await {
                    error!(
                        room_id = %room.room_id,
                        %round_id,
                        player_id = %player.player_id,
                        error = %undo_err,
                        "failed to withdraw answer after score update failed"
                    );
                }
                return Err(err.into());
            }

            info!(
                room_id = %room.room_id,
                %round_id,
                player_id = %player.player_id,
                is_correct = evaluation.is_correct(),
                score = evaluation.score,
                verdict = ?evaluation.verdict,
                "answer submitted"
            );
            sse_events::broadcast_answer_submitted(
                state,
                &room.room_id,
                round_id,
                player.player_id,
                evaluation.is_correct(),
                evaluation.score,
            );
            sse_events::broadcast_player_updated(
                state,
                &room.room_id,
                PlayerSummary::from_entity(player, room.host_id),
            );

            Ok(SubmitAnswerResponse {
                score: evaluation.score,
                is_correct: evaluation.is_correct(),
                time_taken: evaluation.time_taken,
            })
        })
        .await
}

/// The round currently played in the room.
pub async fn current_round(state: &SharedState, room_id: &str) -> Result<RoundView, ServiceError> {
    let room = room_service::load_room(state, room_id).await?;
    let round_id = room.current_round_id.ok_or_else(|| {
        ServiceError::NotFound(format!("no round started in room `{}`", room.room_id))
    })?;
    round_view(state, &room.room_id, round_id).await
}

/// Any round of the room.
pub async fn get_round(
    state: &SharedState,
    room_id: &str,
    round_id: Uuid,
) -> Result<RoundView, ServiceError> {
    let room = room_service::load_room(state, room_id).await?;
    round_view(state, &room.room_id, round_id).await
}

async fn round_view(
    state: &SharedState,
    room_id: &str,
    round_id: Uuid,
) -> Result<RoundView, ServiceError> {
    let store = state.require_room_store().await?;
    let round = store
        .find_round(room_id.to_string(), round_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("Round not found".into()))?;
    let player_count = store.list_players(room_id.to_string()).await?.len();

    let over = round_is_over(
        &round,
        player_count,
        &state.config().rules,
        SystemTime::now(),
    );
    Ok(RoundView::from_entity(round, over))
}
