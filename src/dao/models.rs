use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status of a room.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoomStatus {
    /// Players are gathering; no round has been played yet.
    #[default]
    Waiting,
    /// Rounds are being played.
    Playing,
    /// The host ended the game; the scoreboard is final.
    Finished,
}

/// Game room persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomEntity {
    /// Short room code shared with other players.
    pub room_id: String,
    /// User currently hosting the room.
    pub host_id: Uuid,
    /// Spotify playlist selected by the host.
    pub playlist_id: Option<String>,
    /// Lifecycle status.
    pub status: RoomStatus,
    /// Round currently being played, if any.
    pub current_round_id: Option<Uuid>,
    /// Number of rounds started since the room was created or last reset.
    pub rounds_played: u32,
    /// Creation timestamp.
    pub created_at: SystemTime,
    /// Last time the room document was updated.
    pub updated_at: SystemTime,
}

impl RoomEntity {
    /// Build a fresh waiting room hosted by `host_id`.
    pub fn new(room_id: String, host_id: Uuid) -> Self {
        let now = SystemTime::now();
        Self {
            room_id,
            host_id,
            playlist_id: None,
            status: RoomStatus::Waiting,
            current_round_id: None,
            rounds_played: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Participant of a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEntity {
    /// Stable identifier for the player record.
    pub player_id: Uuid,
    /// Room the player belongs to.
    pub room_id: String,
    /// User owning this player record.
    pub user_id: Uuid,
    /// Display name chosen when joining.
    pub username: String,
    /// Accumulated score.
    pub player_score: i64,
    /// Join timestamp, used to order players.
    pub created_at: SystemTime,
}

impl PlayerEntity {
    /// Build a zero-score player joining `room_id` now.
    pub fn new(room_id: String, user_id: Uuid, username: String) -> Self {
        Self {
            player_id: Uuid::new_v4(),
            room_id,
            user_id,
            username,
            player_score: 0,
            created_at: SystemTime::now(),
        }
    }
}

/// Track selected for a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackEntity {
    /// Spotify track identifier.
    pub track_id: String,
    /// Track title.
    pub track_name: String,
    /// Main artist name.
    pub artist_name: String,
    /// Audio preview URL scraped from the embed page.
    pub preview_url: String,
    /// Album cover, when Spotify provides one.
    pub album_image_url: Option<String>,
}

/// Answer recorded for a player during a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerEntity {
    /// Raw guess as typed by the player.
    pub answer: String,
    /// Points awarded.
    pub score: u32,
    /// Whether the guess matched the track or artist.
    pub is_correct: bool,
    /// Seconds between round start and the answer.
    pub time_taken: f64,
    /// Server time the answer was received.
    pub answered_at: SystemTime,
}

/// One song-guessing turn of a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoundEntity {
    /// Stable identifier for the round.
    pub round_id: Uuid,
    /// Room the round belongs to.
    pub room_id: String,
    /// 1-based index of the round inside the room.
    pub round_number: u32,
    /// Track to be guessed.
    pub track: TrackEntity,
    /// Server time the round started.
    pub start_time: SystemTime,
    /// Answers keyed by player id, in submission order.
    pub answers: IndexMap<Uuid, AnswerEntity>,
}
