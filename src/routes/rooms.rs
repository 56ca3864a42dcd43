use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::room::{
        CreateRoomResponse, JoinRoomRequest, JoinRoomResponse, LeaveRoomResponse,
        PlayersResponse, RoomSummary, ScoreboardResponse, UpdateSettingsRequest,
    },
    error::AppError,
    routes::{CurrentUser, require_session},
    services::room_service,
    state::SharedState,
};

/// Room lifecycle endpoints. Reads are public, mutations need a session.
pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/rooms", post(create_room))
        .route("/rooms/{room_id}/settings", put(update_settings))
        .route("/rooms/{room_id}/join", post(join_room))
        .route("/rooms/{room_id}/leave", post(leave_room))
        .route(
            "/rooms/{room_id}/players/{player_id}/promote",
            post(promote_host),
        )
        .route("/rooms/{room_id}/players/{player_id}", delete(kick_player))
        .route("/rooms/{room_id}/finish", post(finish_game))
        .route("/rooms/{room_id}/reset", post(reset_room))
        .route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/rooms/{room_id}", get(get_room))
        .route("/rooms/{room_id}/players", get(list_players))
        .merge(protected)
}

/// Create a room hosted by the caller.
#[utoipa::path(
    post,
    path = "/rooms",
    tag = "rooms",
    security(("session_token" = [])),
    responses((status = 200, description = "Room created", body = CreateRoomResponse))
)]
pub async fn create_room(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<CreateRoomResponse>, AppError> {
    Ok(Json(room_service::create_room(&state, user_id).await?))
}

/// Retrieve a room by its code.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}",
    tag = "rooms",
    params(("room_id" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Room", body = RoomSummary),
        (status = 404, description = "Unknown room")
    )
)]
pub async fn get_room(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSummary>, AppError> {
    Ok(Json(room_service::get_room(&state, &room_id).await?))
}

/// Select the playlist rounds are drawn from.
#[utoipa::path(
    put,
    path = "/rooms/{room_id}/settings",
    tag = "rooms",
    security(("session_token" = [])),
    params(("room_id" = String, Path, description = "Room code")),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = RoomSummary),
        (status = 403, description = "Caller is not the host")
    )
)]
pub async fn update_settings(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(room_id): Path<String>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<RoomSummary>, AppError> {
    payload.validate()?;
    Ok(Json(
        room_service::update_settings(&state, user_id, &room_id, payload).await?,
    ))
}

/// List the players of a room in join order.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}/players",
    tag = "rooms",
    params(("room_id" = String, Path, description = "Room code")),
    responses((status = 200, description = "Players", body = PlayersResponse))
)]
pub async fn list_players(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
) -> Result<Json<PlayersResponse>, AppError> {
    Ok(Json(room_service::list_players(&state, &room_id).await?))
}

/// Join a room. Joining twice returns the existing player.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/join",
    tag = "rooms",
    security(("session_token" = [])),
    params(("room_id" = String, Path, description = "Room code")),
    request_body = JoinRoomRequest,
    responses(
        (status = 200, description = "Joined", body = JoinRoomResponse),
        (status = 409, description = "Game already finished")
    )
)]
pub async fn join_room(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(room_id): Path<String>,
    Json(payload): Json<JoinRoomRequest>,
) -> Result<Json<JoinRoomResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        room_service::join_room(&state, user_id, &room_id, payload).await?,
    ))
}

/// Leave a room, handing the host role over when needed.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/leave",
    tag = "rooms",
    security(("session_token" = [])),
    params(("room_id" = String, Path, description = "Room code")),
    responses((status = 200, description = "Left the room", body = LeaveRoomResponse))
)]
pub async fn leave_room(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(room_id): Path<String>,
) -> Result<Json<LeaveRoomResponse>, AppError> {
    Ok(Json(
        room_service::leave_room(&state, user_id, &room_id).await?,
    ))
}

/// Make another player the host.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/players/{player_id}/promote",
    tag = "rooms",
    security(("session_token" = [])),
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("player_id" = Uuid, Path, description = "Player to promote")
    ),
    responses((status = 200, description = "Host changed", body = RoomSummary))
)]
pub async fn promote_host(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path((room_id, player_id)): Path<(String, Uuid)>,
) -> Result<Json<RoomSummary>, AppError> {
    Ok(Json(
        room_service::promote_host(&state, user_id, &room_id, player_id).await?,
    ))
}

/// Remove a player from the room.
#[utoipa::path(
    delete,
    path = "/rooms/{room_id}/players/{player_id}",
    tag = "rooms",
    security(("session_token" = [])),
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("player_id" = Uuid, Path, description = "Player to kick")
    ),
    responses((status = 204, description = "Player removed"))
)]
pub async fn kick_player(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path((room_id, player_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    room_service::kick_player(&state, user_id, &room_id, player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// End the game and return the final scoreboard.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/finish",
    tag = "rooms",
    security(("session_token" = [])),
    params(("room_id" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Game finished", body = ScoreboardResponse),
        (status = 409, description = "No game in progress")
    )
)]
pub async fn finish_game(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(room_id): Path<String>,
) -> Result<Json<ScoreboardResponse>, AppError> {
    Ok(Json(
        room_service::finish_game(&state, user_id, &room_id).await?,
    ))
}

/// Play again: back to the waiting room with zeroed scores.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/reset",
    tag = "rooms",
    security(("session_token" = [])),
    params(("room_id" = String, Path, description = "Room code")),
    responses((status = 200, description = "Room reset", body = RoomSummary))
)]
pub async fn reset_room(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSummary>, AppError> {
    Ok(Json(
        room_service::reset_room(&state, user_id, &room_id).await?,
    ))
}
