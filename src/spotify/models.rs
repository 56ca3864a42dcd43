//! Wire formats of the Spotify Web API, limited to the fields the game reads.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Response of `GET /search?type=playlist`.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    /// Playlist page, absent when Spotify had nothing to return.
    #[serde(default)]
    pub playlists: Option<Paging<Option<PlaylistObject>>>,
}

/// Generic Spotify paging object.
#[derive(Debug, Deserialize)]
pub struct Paging<T> {
    /// Items of the current page.
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    /// Total number of items across pages.
    #[serde(default)]
    pub total: u32,
}

/// Playlist as returned by search and `GET /playlists/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistObject {
    /// Spotify playlist id.
    pub id: String,
    /// Playlist title.
    pub name: String,
    /// Free-form description, often HTML-escaped.
    #[serde(default)]
    pub description: Option<String>,
    /// Cover images; Spotify sends `null` for playlists without a cover.
    #[serde(default)]
    pub images: Option<Vec<ImageObject>>,
    /// Owner of the playlist.
    pub owner: OwnerObject,
    /// Track count reference.
    #[serde(default)]
    pub tracks: Option<TracksRef>,
}

/// Image reference.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageObject {
    /// Image URL.
    pub url: String,
    /// Height in pixels.
    #[serde(default)]
    pub height: Option<u32>,
    /// Width in pixels.
    #[serde(default)]
    pub width: Option<u32>,
}

/// Playlist owner.
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerObject {
    /// Public display name.
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Track count of a playlist.
#[derive(Debug, Clone, Deserialize)]
pub struct TracksRef {
    /// Number of tracks.
    pub total: u32,
}

/// Item of `GET /playlists/{id}/tracks`.
#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    /// Track, `null` for removed or unavailable entries.
    #[serde(default)]
    pub track: Option<TrackObject>,
}

/// Track object.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackObject {
    /// Track id; local files have none.
    #[serde(default)]
    pub id: Option<String>,
    /// Track title.
    pub name: String,
    /// Credited artists, main artist first.
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
    /// Album the track belongs to.
    #[serde(default)]
    pub album: Option<AlbumObject>,
}

/// Artist reference.
#[derive(Debug, Clone, Deserialize)]
pub struct ArtistObject {
    /// Artist name.
    pub name: String,
}

/// Album reference.
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumObject {
    /// Album covers, largest first.
    #[serde(default)]
    pub images: Vec<ImageObject>,
}

/// Track usable for a round: it has an id and a main artist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Spotify track id.
    pub id: String,
    /// Track title.
    pub name: String,
    /// Main artist name.
    pub artist_name: String,
    /// Largest album cover.
    pub album_image_url: Option<String>,
}

impl TrackObject {
    /// Keep only tracks that can be played and guessed.
    pub fn into_track(self) -> Option<Track> {
        let id = self.id?;
        let artist_name = self.artists.into_iter().next()?.name;
        let album_image_url = self
            .album
            .and_then(|album| album.images.into_iter().next())
            .map(|image| image.url);
        Some(Track {
            id,
            name: self.name,
            artist_name,
            album_image_url,
        })
    }
}
