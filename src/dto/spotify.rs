use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::validation::validate_not_blank,
    spotify::models::{ImageObject, Paging, PlaylistObject},
};

/// Playlist search payload.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SearchRequest {
    /// Free-text query forwarded to Spotify.
    #[validate(length(max = 100), custom(function = "validate_not_blank"))]
    pub query: String,
}

/// Playlist cover image.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlaylistImage {
    pub url: String,
    pub height: Option<u32>,
    pub width: Option<u32>,
}

impl From<ImageObject> for PlaylistImage {
    fn from(image: ImageObject) -> Self {
        Self {
            url: image.url,
            height: image.height,
            width: image.width,
        }
    }
}

/// Playlist owner.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlaylistOwner {
    pub display_name: Option<String>,
}

/// Track count of a playlist.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlaylistTracks {
    pub total: u32,
}

/// Playlist projection returned by search and details endpoints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub images: Vec<PlaylistImage>,
    pub owner: PlaylistOwner,
    pub tracks: PlaylistTracks,
}

impl From<PlaylistObject> for PlaylistSummary {
    fn from(playlist: PlaylistObject) -> Self {
        Self {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description,
            images: playlist
                .images
                .unwrap_or_default()
                .into_iter()
                .map(PlaylistImage::from)
                .collect(),
            owner: PlaylistOwner {
                display_name: playlist.owner.display_name,
            },
            tracks: PlaylistTracks {
                total: playlist.tracks.map(|tracks| tracks.total).unwrap_or(0),
            },
        }
    }
}

/// Page of playlists matching a search.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlaylistPage {
    pub items: Vec<PlaylistSummary>,
    pub total: u32,
}

/// Search results, shaped like Spotify's own search response.
#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResponse {
    pub playlists: PlaylistPage,
}

impl From<Paging<PlaylistObject>> for SearchResponse {
    fn from(page: Paging<PlaylistObject>) -> Self {
        Self {
            playlists: PlaylistPage {
                items: page.items.into_iter().map(PlaylistSummary::from).collect(),
                total: page.total,
            },
        }
    }
}
