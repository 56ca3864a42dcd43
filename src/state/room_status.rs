use thiserror::Error;

use crate::dao::models::RoomStatus;

/// Events moving a room through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomEvent {
    /// The host started a new round.
    RoundStarted,
    /// The host ended the game.
    Finish,
    /// The host reopened a finished room for another game.
    Reset,
}

/// Error returned when attempting to apply an invalid transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while the room is {from:?}")]
pub struct InvalidTransition {
    /// The status the room was in when the invalid event was received.
    pub from: RoomStatus,
    /// The event that cannot be applied from this status.
    pub event: RoomEvent,
}

/// Compute the status reached by applying `event` to a room in status `from`.
pub fn transition(from: RoomStatus, event: RoomEvent) -> Result<RoomStatus, InvalidTransition> {
    let next = match (from, event) {
        (RoomStatus::Waiting | RoomStatus::Playing, RoomEvent::RoundStarted) => RoomStatus::Playing,
        (RoomStatus::Playing, RoomEvent::Finish) => RoomStatus::Finished,
        (RoomStatus::Finished, RoomEvent::Reset) => RoomStatus::Waiting,
        (from, event) => return Err(InvalidTransition { from, event }),
    };
    Ok(next)
}
