use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dto::{
        room::{PlayerSummary, RoomSummary, ScoreboardResponse},
        round::RoundView,
        sse::{
            AnswerSubmittedEvent, GameFinishedEvent, PlayerJoinedEvent, PlayerLeftEvent,
            PlayerUpdatedEvent, RoomDeletedEvent, RoomUpdatedEvent, RoundStartedEvent,
            ServerEvent,
        },
    },
    state::SharedState,
};

const EVENT_ROOM_UPDATED: &str = "room.updated";
const EVENT_ROOM_DELETED: &str = "room.deleted";
const EVENT_PLAYER_JOINED: &str = "player.joined";
const EVENT_PLAYER_LEFT: &str = "player.left";
const EVENT_PLAYER_UPDATED: &str = "player.updated";
const EVENT_ROUND_STARTED: &str = "round.started";
const EVENT_ANSWER_SUBMITTED: &str = "answer.submitted";
const EVENT_GAME_FINISHED: &str = "game.finished";

/// Broadcast the new room metadata (host, playlist, status, current round).
pub fn broadcast_room_updated(state: &SharedState, room: RoomSummary) {
    let room_id = room.room_id.clone();
    send_room_event(state, &room_id, EVENT_ROOM_UPDATED, &RoomUpdatedEvent(room));
}

/// Broadcast that the room is gone, then drop its hub so open streams end.
pub fn broadcast_room_deleted(state: &SharedState, room_id: &str) {
    let payload = RoomDeletedEvent {
        room_id: room_id.to_string(),
    };
    send_room_event(state, room_id, EVENT_ROOM_DELETED, &payload);
    state.forget_room(room_id);
}

/// Broadcast a newly joined player.
pub fn broadcast_player_joined(state: &SharedState, room_id: &str, player: PlayerSummary) {
    send_room_event(
        state,
        room_id,
        EVENT_PLAYER_JOINED,
        &PlayerJoinedEvent { player },
    );
}

/// Broadcast a departure, voluntary or not.
pub fn broadcast_player_left(state: &SharedState, room_id: &str, player_id: Uuid, kicked: bool) {
    send_room_event(
        state,
        room_id,
        EVENT_PLAYER_LEFT,
        &PlayerLeftEvent { player_id, kicked },
    );
}

/// Broadcast a player's new score or host flag.
pub fn broadcast_player_updated(state: &SharedState, room_id: &str, player: PlayerSummary) {
    send_room_event(
        state,
        room_id,
        EVENT_PLAYER_UPDATED,
        &PlayerUpdatedEvent { player },
    );
}

/// Broadcast a started round. The view must not reveal the track.
pub fn broadcast_round_started(state: &SharedState, round: RoundView) {
    debug_assert!(round.track.is_none());
    let room_id = round.room_id.clone();
    send_room_event(state, &room_id, EVENT_ROUND_STARTED, &RoundStartedEvent(round));
}

/// Broadcast that a player answered, without the guess.
pub fn broadcast_answer_submitted(
    state: &SharedState,
    room_id: &str,
    round_id: Uuid,
    player_id: Uuid,
    is_correct: bool,
    score: u32,
) {
    let payload = AnswerSubmittedEvent {
        round_id,
        player_id,
        is_correct,
        score,
    };
    send_room_event(state, room_id, EVENT_ANSWER_SUBMITTED, &payload);
}

/// Broadcast the final scoreboard.
pub fn broadcast_game_finished(state: &SharedState, scoreboard: ScoreboardResponse) {
    let room_id = scoreboard.room.room_id.clone();
    send_room_event(
        state,
        &room_id,
        EVENT_GAME_FINISHED,
        &GameFinishedEvent(scoreboard),
    );
}

/// Events of rooms nobody listens to are dropped without allocating a hub.
fn send_room_event<T>(state: &SharedState, room_id: &str, event: &str, payload: &T)
where
    T: Serialize,
{
    let Some(hub) = state.existing_room_events(room_id) else {
        return;
    };
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(message) => {
            let delivered = hub.publish(message);
            debug!(room_id = hub.room_id(), event, delivered, "room event sent");
        }
        Err(err) => warn!(room_id, event, error = %err, "failed to serialize SSE event"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AppConfig, SpotifyEndpoints},
        spotify::SpotifyClient,
        state::AppState,
    };

    fn state() -> SharedState {
        AppState::new(
            AppConfig::default(),
            SpotifyClient::new(SpotifyEndpoints::default(), None),
        )
    }

    #[tokio::test]
    async fn events_reach_room_subscribers_only() {
        let state = state();
        let mut room_rx = state.room_events("ABC234").subscribe();
        let mut other_rx = state.room_events("XYZ789").subscribe();

        let player_id = Uuid::new_v4();
        broadcast_player_left(&state, "ABC234", player_id, true);

        let event = room_rx.recv().await.expect("event");
        assert_eq!(event.event.as_deref(), Some(EVENT_PLAYER_LEFT));
        let data: serde_json::Value = serde_json::from_str(&event.data).unwrap();
        assert_eq!(data["player_id"], player_id.to_string());
        assert_eq!(data["kicked"], true);

        assert!(other_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn room_deleted_closes_the_stream() {
        let state = state();
        let mut rx = state.room_events("ABC234").subscribe();

        broadcast_room_deleted(&state, "ABC234");

        let event = rx.recv().await.expect("deleted event");
        assert_eq!(event.event.as_deref(), Some(EVENT_ROOM_DELETED));
        assert!(state.existing_room_events("ABC234").is_none());
        assert!(rx.recv().await.is_err());
    }
}
