use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::{
    room::{PlayerSummary, RoomSummary, ScoreboardResponse},
    round::RoundView,
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already serialised data field.
    pub fn new<E>(event: E, data: String) -> Self
    where
        E: Into<Option<String>>,
    {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Room the stream is bound to.
    pub room_id: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast whenever room metadata changes (host, playlist, status).
pub struct RoomUpdatedEvent(pub RoomSummary);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the last player left and the room was removed.
pub struct RoomDeletedEvent {
    pub room_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player joins the room.
pub struct PlayerJoinedEvent {
    pub player: PlayerSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player leaves or is kicked.
pub struct PlayerLeftEvent {
    pub player_id: Uuid,
    pub kicked: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player's score or host flag changes.
pub struct PlayerUpdatedEvent {
    pub player: PlayerSummary,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast when a round starts; never carries the solution.
pub struct RoundStartedEvent(pub RoundView);

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a player answered; the guess text is never included.
pub struct AnswerSubmittedEvent {
    pub round_id: Uuid,
    pub player_id: Uuid,
    pub is_correct: bool,
    pub score: u32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
/// Broadcast with the final scoreboard when the host ends the game.
pub struct GameFinishedEvent(pub ScoreboardResponse);
