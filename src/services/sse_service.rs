use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::{
    dto::sse::{Handshake, ServerEvent},
    error::ServiceError,
    services::room_service,
    state::SharedState,
};

const EVENT_INFO: &str = "info";

/// Subscription to a room's event stream, with the handshake to send first.
pub struct RoomSubscription {
    pub room_id: String,
    pub receiver: broadcast::Receiver<ServerEvent>,
    pub handshake: ServerEvent,
}

/// Subscribe to the events of an existing room.
pub async fn subscribe_room(
    state: &SharedState,
    room_id: &str,
) -> Result<RoomSubscription, ServiceError> {
    let room = room_service::load_room(state, room_id).await?;
    let receiver = state.room_events(&room.room_id).subscribe();

    let handshake = Handshake {
        room_id: room.room_id.clone(),
        message: "room stream connected".into(),
        degraded: state.is_degraded().await,
    };
    let handshake = ServerEvent::json(Some(EVENT_INFO.to_string()), &handshake)
        .unwrap_or_else(|_| ServerEvent::new(Some(EVENT_INFO.to_string()), handshake.message));

    Ok(RoomSubscription {
        room_id: room.room_id,
        receiver,
        handshake,
    })
}

fn into_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a room subscription into an SSE response, forwarding events until the client
/// disconnects or the room is deleted.
pub fn to_sse_stream(
    subscription: RoomSubscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let RoomSubscription {
        room_id,
        mut receiver,
        handshake,
    } = subscription;

    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if tx.send(Ok(into_event(handshake))).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(into_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        // Hub dropped: the room was deleted.
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(%room_id, skipped, "room SSE subscriber lagging");
                            continue;
                        }
                    }
                }
            }
        }

        info!(%room_id, "room SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
