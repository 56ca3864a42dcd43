use std::time::SystemTime;

use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dao::models::{PlayerEntity, RoomEntity, RoomStatus},
    dto::room::{
        CreateRoomResponse, JoinRoomRequest, JoinRoomResponse, LeaveRoomResponse, PlayerSummary,
        PlayersResponse, RoomSummary, ScoreboardResponse, UpdateSettingsRequest,
    },
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        room_status::{RoomEvent, transition},
    },
};

/// Characters used in room codes; look-alikes (0/O, 1/I) are left out.
const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const ROOM_CODE_LEN: usize = 6;
const ROOM_CODE_ATTEMPTS: usize = 8;
const ROOM_ID_MAX_LEN: usize = 16;

/// Canonical form of a user supplied room code.
pub fn normalize_room_id(raw: &str) -> Result<String, ServiceError> {
    let room_id = raw.trim().to_ascii_uppercase();
    if room_id.is_empty()
        || room_id.len() > ROOM_ID_MAX_LEN
        || !room_id.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(ServiceError::InvalidInput(format!(
            "invalid room code `{}`",
            raw.trim()
        )));
    }
    Ok(room_id)
}

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Fetch a room or fail with [`ServiceError::NotFound`].
pub async fn load_room(state: &SharedState, room_id: &str) -> Result<RoomEntity, ServiceError> {
    let room_id = normalize_room_id(room_id)?;
    let store = state.require_room_store().await?;
    store
        .find_room(room_id.clone())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("room `{room_id}` not found")))
}

pub(crate) fn ensure_host(
    room: &RoomEntity,
    user_id: Uuid,
    action: &str,
) -> Result<(), ServiceError> {
    if room.host_id != user_id {
        return Err(ServiceError::Forbidden(format!("only the host can {action}")));
    }
    Ok(())
}

pub(crate) async fn save_room(
    state: &SharedState,
    mut room: RoomEntity,
) -> Result<RoomEntity, ServiceError> {
    room.updated_at = SystemTime::now();
    let store = state.require_room_store().await?;
    store.save_room(room.clone()).await?;
    Ok(room)
}

/// Create a waiting room hosted by `user_id`.
pub async fn create_room(
    state: &SharedState,
    user_id: Uuid,
) -> Result<CreateRoomResponse, ServiceError> {
    let store = state.require_room_store().await?;

    for _ in 0..ROOM_CODE_ATTEMPTS {
        let room_id = generate_room_code();
        if store.find_room(room_id.clone()).await?.is_some() {
            debug!(%room_id, "room code already taken");
            continue;
        }

        let room = RoomEntity::new(room_id, user_id);
        store.save_room(room.clone()).await?;
        info!(room_id = %room.room_id, host_id = %user_id, "room created");
        return Ok(CreateRoomResponse { room: room.into() });
    }

    Err(ServiceError::InvalidState(
        "could not allocate a free room code".into(),
    ))
}

/// Room metadata.
pub async fn get_room(state: &SharedState, room_id: &str) -> Result<RoomSummary, ServiceError> {
    Ok(load_room(state, room_id).await?.into())
}

/// Players of a room in join order.
pub async fn list_players(
    state: &SharedState,
    room_id: &str,
) -> Result<PlayersResponse, ServiceError> {
    let room = load_room(state, room_id).await?;
    let players = room_players(state, &room).await?;
    Ok(PlayersResponse { players })
}

async fn room_players(
    state: &SharedState,
    room: &RoomEntity,
) -> Result<Vec<PlayerSummary>, ServiceError> {
    let store = state.require_room_store().await?;
    Ok(store
        .list_players(room.room_id.clone())
        .await?
        .into_iter()
        .map(|player| PlayerSummary::from_entity(player, room.host_id))
        .collect())
}

/// Player record of `user_id` in the room, if any.
pub(crate) async fn find_user_player(
    state: &SharedState,
    room_id: &str,
    user_id: Uuid,
) -> Result<Option<PlayerEntity>, ServiceError> {
    let store = state.require_room_store().await?;
    Ok(store
        .list_players(room_id.to_string())
        .await?
        .into_iter()
        .find(|player| player.user_id == user_id))
}

/// Join a room under `username`. Joining twice returns the existing player.
pub async fn join_room(
    state: &SharedState,
    user_id: Uuid,
    room_id: &str,
    request: JoinRoomRequest,
) -> Result<JoinRoomResponse, ServiceError> {
    let room_id = normalize_room_id(room_id)?;

    state
        .with_room_lock(&room_id, || async {
            let room = load_room(state, &room_id).await?;

            if let Some(existing) = find_user_player(state, &room.room_id, user_id).await? {
                debug!(room_id = %room.room_id, %user_id, "user already joined");
                return Ok(JoinRoomResponse {
                    player: PlayerSummary::from_entity(existing, room.host_id),
                    room: room.into(),
                });
            }

            if room.status == RoomStatus::Finished {
                return Err(ServiceError::InvalidState(
                    "cannot join a finished game".into(),
                ));
            }

            let player = PlayerEntity::new(
                room.room_id.clone(),
                user_id,
                request.username.trim().to_string(),
            );
            let store = state.require_room_store().await?;
            store.save_player(player.clone()).await?;

            let summary = PlayerSummary::from_entity(player, room.host_id);
            info!(room_id = %room.room_id, player_id = %summary.player_id, "player joined");
            sse_events::broadcast_player_joined(state, &room.room_id, summary.clone());

            Ok(JoinRoomResponse {
                player: summary,
                room: room.into(),
            })
        })
        .await
}

/// Leave a room. A departing host hands over to the earliest remaining player; the room is
/// deleted once nobody is left.
pub async fn leave_room(
    state: &SharedState,
    user_id: Uuid,
    room_id: &str,
) -> Result<LeaveRoomResponse, ServiceError> {
    let room_id = normalize_room_id(room_id)?;

    state
        .with_room_lock(&room_id, || async {
            let mut room = load_room(state, &room_id).await?;
            let store = state.require_room_store().await?;
            let players = store.list_players(room.room_id.clone()).await?;

            let leaving = players.iter().find(|player| player.user_id == user_id);
            let was_host = room.host_id == user_id;
            if leaving.is_none() && !was_host {
                return Err(ServiceError::NotFound(format!(
                    "you are not a player of room `{}`",
                    room.room_id
                )));
            }

            if let Some(player) = leaving {
                store
                    .delete_player(room.room_id.clone(), player.player_id)
                    .await?;
                info!(room_id = %room.room_id, player_id = %player.player_id, "player left");
                sse_events::broadcast_player_left(state, &room.room_id, player.player_id, false);
            }

            let remaining: Vec<PlayerEntity> = players
                .into_iter()
                .filter(|player| player.user_id != user_id)
                .collect();

            let Some(successor) = remaining.first() else {
                store.delete_room(room.room_id.clone()).await?;
                info!(room_id = %room.room_id, "last player left; room deleted");
                sse_events::broadcast_room_deleted(state, &room.room_id);
                return Ok(LeaveRoomResponse {
                    room_deleted: true,
                    host_id: None,
                });
            };

            if was_host {
                room.host_id = successor.user_id;
                room = save_room(state, room).await?;
                info!(room_id = %room.room_id, host_id = %room.host_id, "host handed over");
                sse_events::broadcast_player_updated(
                    state,
                    &room.room_id,
                    PlayerSummary::from_entity(successor.clone(), room.host_id),
                );
                sse_events::broadcast_room_updated(state, room.clone().into());
            }

            Ok(LeaveRoomResponse {
                room_deleted: false,
                host_id: Some(room.host_id),
            })
        })
        .await
}

/// Hand the host role to another player of the room.
pub async fn promote_host(
    state: &SharedState,
    user_id: Uuid,
    room_id: &str,
    player_id: Uuid,
) -> Result<RoomSummary, ServiceError> {
    let room_id = normalize_room_id(room_id)?;

    state
        .with_room_lock(&room_id, || async {
            let mut room = load_room(state, &room_id).await?;
            ensure_host(&room, user_id, "promote another player")?;

            let target = find_player(state, &room.room_id, player_id).await?;
            let previous_host = room.host_id;
            room.host_id = target.user_id;
            let room = save_room(state, room).await?;
            info!(room_id = %room.room_id, %player_id, "host promoted");

            if let Some(previous) = find_user_player(state, &room.room_id, previous_host).await? {
                sse_events::broadcast_player_updated(
                    state,
                    &room.room_id,
                    PlayerSummary::from_entity(previous, room.host_id),
                );
            }
            sse_events::broadcast_player_updated(
                state,
                &room.room_id,
                PlayerSummary::from_entity(target, room.host_id),
            );
            let summary: RoomSummary = room.into();
            sse_events::broadcast_room_updated(state, summary.clone());
            Ok(summary)
        })
        .await
}

async fn find_player(
    state: &SharedState,
    room_id: &str,
    player_id: Uuid,
) -> Result<PlayerEntity, ServiceError> {
    let store = state.require_room_store().await?;
    store
        .list_players(room_id.to_string())
        .await?
        .into_iter()
        .find(|player| player.player_id == player_id)
        .ok_or_else(|| {
            ServiceError::NotFound(format!("player `{player_id}` not found in room `{room_id}`"))
        })
}

/// Remove another player from the room.
pub async fn kick_player(
    state: &SharedState,
    user_id: Uuid,
    room_id: &str,
    player_id: Uuid,
) -> Result<(), ServiceError> {
    let room_id = normalize_room_id(room_id)?;

    state
        .with_room_lock(&room_id, || async {
            let room = load_room(state, &room_id).await?;
            ensure_host(&room, user_id, "kick players")?;

            let target = find_player(state, &room.room_id, player_id).await?;
            if target.user_id == user_id {
                return Err(ServiceError::InvalidInput(
                    "the host cannot kick themselves; leave the room instead".into(),
                ));
            }

            let store = state.require_room_store().await?;
            store.delete_player(room.room_id.clone(), player_id).await?;
            info!(room_id = %room.room_id, %player_id, "player kicked");
            sse_events::broadcast_player_left(state, &room.room_id, player_id, true);
            Ok(())
        })
        .await
}

/// Change the playlist rounds are drawn from.
pub async fn update_settings(
    state: &SharedState,
    user_id: Uuid,
    room_id: &str,
    request: UpdateSettingsRequest,
) -> Result<RoomSummary, ServiceError> {
    let room_id = normalize_room_id(room_id)?;

    state
        .with_room_lock(&room_id, || async {
            let mut room = load_room(state, &room_id).await?;
            ensure_host(&room, user_id, "change the room settings")?;

            room.playlist_id = Some(request.playlist_id);
            let room = save_room(state, room).await?;
            debug!(room_id = %room.room_id, playlist_id = ?room.playlist_id, "room settings updated");

            let summary: RoomSummary = room.into();
            sse_events::broadcast_room_updated(state, summary.clone());
            Ok(summary)
        })
        .await
}

/// End the game and publish the final scoreboard.
pub async fn finish_game(
    state: &SharedState,
    user_id: Uuid,
    room_id: &str,
) -> Result<ScoreboardResponse, ServiceError> {
    let room_id = normalize_room_id(room_id)?;

    state
        .with_room_lock(&room_id, || async {
            let mut room = load_room(state, &room_id).await?;
            ensure_host(&room, user_id, "finish the game")?;

            room.status = transition(room.status, RoomEvent::Finish)?;
            let room = save_room(state, room).await?;

            let mut players = room_players(state, &room).await?;
            // Stable: equal scores keep join order.
            players.sort_by(|a, b| b.player_score.cmp(&a.player_score));

            let scoreboard = ScoreboardResponse {
                room: room.into(),
                players,
            };
            info!(room_id = %scoreboard.room.room_id, "game finished");
            sse_events::broadcast_room_updated(state, scoreboard.room.clone());
            sse_events::broadcast_game_finished(state, scoreboard.clone());
            Ok(scoreboard)
        })
        .await
}

/// Start over after a finished game: scores are zeroed and rounds forgotten.
pub async fn reset_room(
    state: &SharedState,
    user_id: Uuid,
    room_id: &str,
) -> Result<RoomSummary, ServiceError> {
    let room_id = normalize_room_id(room_id)?;

    state
        .with_room_lock(&room_id, || async {
            let mut room = load_room(state, &room_id).await?;
            ensure_host(&room, user_id, "restart the game")?;

            room.status = transition(room.status, RoomEvent::Reset)?;
            room.current_round_id = None;
            room.rounds_played = 0;
            let room = save_room(state, room).await?;

            let store = state.require_room_store().await?;
            for mut player in store.list_players(room.room_id.clone()).await? {
                if player.player_score == 0 {
                    continue;
                }
                player.player_score = 0;
                store.save_player(player.clone()).await?;
                sse_events::broadcast_player_updated(
                    state,
                    &room.room_id,
                    PlayerSummary::from_entity(player, room.host_id),
                );
            }

            info!(room_id = %room.room_id, "room reset");
            let summary: RoomSummary = room.into();
            sse_events::broadcast_room_updated(state, summary.clone());
            Ok(summary)
        })
        .await
}
