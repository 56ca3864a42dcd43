use tracing::debug;

use crate::{
    dto::spotify::{PlaylistSummary, SearchRequest, SearchResponse},
    error::ServiceError,
    state::SharedState,
};

/// Search public playlists to pick one for the room.
pub async fn search_playlists(
    state: &SharedState,
    request: SearchRequest,
) -> Result<SearchResponse, ServiceError> {
    let query = request.query.trim();
    let page = state.spotify().search_playlists(query).await?;
    debug!(query, results = page.items.len(), "playlist search");
    Ok(page.into())
}

/// Details of a single playlist.
pub async fn get_playlist(
    state: &SharedState,
    playlist_id: &str,
) -> Result<PlaylistSummary, ServiceError> {
    let playlist = state.spotify().get_playlist(playlist_id).await?;
    Ok(playlist.into())
}
