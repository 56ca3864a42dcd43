use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dao::models::{PlayerEntity, RoomEntity, RoomStatus},
    dto::{
        format_system_time,
        validation::{validate_not_blank, validate_spotify_id},
    },
};

/// Public view of a room.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RoomSummary {
    /// Room code shared with other players.
    pub room_id: String,
    /// User currently hosting the room.
    pub host_id: Uuid,
    pub playlist_id: Option<String>,
    pub status: RoomStatus,
    pub current_round_id: Option<Uuid>,
    pub rounds_played: u32,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

impl From<RoomEntity> for RoomSummary {
    fn from(room: RoomEntity) -> Self {
        Self {
            room_id: room.room_id,
            host_id: room.host_id,
            playlist_id: room.playlist_id,
            status: room.status,
            current_round_id: room.current_round_id,
            rounds_played: room.rounds_played,
            created_at: format_system_time(room.created_at),
        }
    }
}

/// Public view of a player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    pub player_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub player_score: i64,
    /// Whether this player's user hosts the room.
    pub is_host: bool,
    /// RFC 3339 join timestamp.
    pub created_at: String,
}

impl PlayerSummary {
    /// Project a stored player, flagging it when `host_id` owns it.
    pub fn from_entity(player: PlayerEntity, host_id: Uuid) -> Self {
        Self {
            is_host: player.user_id == host_id,
            player_id: player.player_id,
            user_id: player.user_id,
            username: player.username,
            player_score: player.player_score,
            created_at: format_system_time(player.created_at),
        }
    }
}

/// Response returned after creating a room.
#[derive(Debug, Serialize, ToSchema)]
pub struct CreateRoomResponse {
    pub room: RoomSummary,
}

/// Payload sent to join a room.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct JoinRoomRequest {
    /// Display name shown to other players.
    #[validate(length(max = 32), custom(function = "validate_not_blank"))]
    pub username: String,
}

/// Response returned after joining a room.
#[derive(Debug, Serialize, ToSchema)]
pub struct JoinRoomResponse {
    pub room: RoomSummary,
    pub player: PlayerSummary,
}

/// Payload updating the host-controlled room settings.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateSettingsRequest {
    /// Spotify playlist rounds are drawn from.
    #[validate(custom(function = "validate_spotify_id"))]
    pub playlist_id: String,
}

/// Players of a room in join order.
#[derive(Debug, Serialize, ToSchema)]
pub struct PlayersResponse {
    pub players: Vec<PlayerSummary>,
}

/// Final ranking returned when a game finishes.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreboardResponse {
    pub room: RoomSummary,
    /// Players sorted by descending score.
    pub players: Vec<PlayerSummary>,
}

/// Outcome of leaving a room.
#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveRoomResponse {
    /// True when the room was deleted because nobody was left.
    pub room_deleted: bool,
    /// User hosting the room after the departure, if it still exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[test]
    fn join_request_rejects_blank_username() {
        let request = JoinRoomRequest {
            username: "  ".into(),
        };
        assert!(request.validate().is_err());

        let request = JoinRoomRequest {
            username: "alice".into(),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn player_summary_flags_host() {
        let host = Uuid::new_v4();
        let player = PlayerEntity::new("ABC234".into(), host, "alice".into());
        assert!(PlayerSummary::from_entity(player.clone(), host).is_host);
        assert!(!PlayerSummary::from_entity(player, Uuid::new_v4()).is_host);
    }
}
