use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    routing::{get, post},
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::round::{
        RoundView, StartRoundRequest, StartRoundResponse, SubmitAnswerRequest,
        SubmitAnswerResponse,
    },
    error::AppError,
    routes::{CurrentUser, require_session},
    services::round_service,
    state::SharedState,
};

/// Round endpoints. Starting rounds and answering need a session.
pub fn router(state: SharedState) -> Router<SharedState> {
    let protected = Router::new()
        .route("/rooms/{room_id}/rounds", post(start_round))
        .route(
            "/rooms/{room_id}/rounds/{round_id}/answers",
            post(submit_answer),
        )
        .route_layer(middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/rooms/{room_id}/rounds/current", get(current_round))
        .route("/rooms/{room_id}/rounds/{round_id}", get(get_round))
        .merge(protected)
}

/// Start a round: pick a random previewable track of the playlist.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/rounds",
    tag = "rounds",
    security(("session_token" = [])),
    params(("room_id" = String, Path, description = "Room code")),
    request_body = StartRoundRequest,
    responses(
        (status = 200, description = "Round started, solution included for the host", body = StartRoundResponse),
        (status = 400, description = "No playlist selected or no tracks found"),
        (status = 403, description = "Caller is not the host"),
        (status = 502, description = "No previewable track after the maximum attempts")
    )
)]
pub async fn start_round(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(room_id): Path<String>,
    Json(payload): Json<StartRoundRequest>,
) -> Result<Json<StartRoundResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        round_service::start_round(&state, user_id, &room_id, payload).await?,
    ))
}

/// Current round of the room; the solution is hidden until the round is over.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}/rounds/current",
    tag = "rounds",
    params(("room_id" = String, Path, description = "Room code")),
    responses(
        (status = 200, description = "Current round", body = RoundView),
        (status = 404, description = "No round started yet")
    )
)]
pub async fn current_round(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
) -> Result<Json<RoundView>, AppError> {
    Ok(Json(round_service::current_round(&state, &room_id).await?))
}

/// Any round of the room; the solution is hidden until the round is over.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}/rounds/{round_id}",
    tag = "rounds",
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("round_id" = Uuid, Path, description = "Round identifier")
    ),
    responses((status = 200, description = "Round", body = RoundView))
)]
pub async fn get_round(
    State(state): State<SharedState>,
    Path((room_id, round_id)): Path<(String, Uuid)>,
) -> Result<Json<RoundView>, AppError> {
    Ok(Json(
        round_service::get_round(&state, &room_id, round_id).await?,
    ))
}

/// Submit the caller's guess for a round.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/rounds/{round_id}/answers",
    tag = "rounds",
    security(("session_token" = [])),
    params(
        ("room_id" = String, Path, description = "Room code"),
        ("round_id" = Uuid, Path, description = "Round identifier")
    ),
    request_body = SubmitAnswerRequest,
    responses(
        (status = 200, description = "Answer scored", body = SubmitAnswerResponse),
        (status = 404, description = "Invalid player or room, or round not found"),
        (status = 409, description = "Already answered or round closed")
    )
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path((room_id, round_id)): Path<(String, Uuid)>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        round_service::submit_answer(&state, user_id, &room_id, round_id, payload).await?,
    ))
}
