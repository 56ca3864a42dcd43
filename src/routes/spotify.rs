use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::{
        spotify::{PlaylistSummary, SearchRequest, SearchResponse},
        validation::validate_spotify_id,
    },
    error::AppError,
    services::spotify_service,
    state::SharedState,
};

/// Search Spotify playlists.
#[utoipa::path(
    post,
    path = "/spotify/search",
    tag = "spotify",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Matching playlists", body = SearchResponse),
        (status = 502, description = "Spotify request failed")
    )
)]
pub async fn search(
    State(state): State<SharedState>,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        spotify_service::search_playlists(&state, payload).await?,
    ))
}

/// Fetch a playlist's details.
#[utoipa::path(
    get,
    path = "/spotify/playlists/{playlist_id}",
    tag = "spotify",
    params(("playlist_id" = String, Path, description = "Spotify playlist id")),
    responses(
        (status = 200, description = "Playlist", body = PlaylistSummary),
        (status = 404, description = "Unknown playlist")
    )
)]
pub async fn get_playlist(
    State(state): State<SharedState>,
    Path(playlist_id): Path<String>,
) -> Result<Json<PlaylistSummary>, AppError> {
    validate_spotify_id(&playlist_id)
        .map_err(|err| AppError::BadRequest(format!("invalid playlist id: {err}")))?;
    Ok(Json(
        spotify_service::get_playlist(&state, &playlist_id).await?,
    ))
}

/// Configure the Spotify proxy routes.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/spotify/search", post(search))
        .route("/spotify/playlists/{playlist_id}", get(get_playlist))
}
