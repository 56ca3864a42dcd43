use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{error::AppError, services::session_service, state::SharedState};

pub mod docs;
pub mod health;
pub mod rooms;
pub mod rounds;
pub mod sessions;
pub mod spotify;
pub mod sse;

const SESSION_TOKEN_HEADER: &str = "x-session-token";

/// User resolved from the `X-Session-Token` header by [`require_session`].
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sessions::router())
        .merge(rooms::router(state.clone()))
        .merge(rounds::router(state.clone()))
        .merge(spotify::router())
        .merge(sse::router())
        .merge(docs::router());

    api_router.with_state(state)
}

/// Reject requests without a known session token and expose the caller as [`CurrentUser`].
async fn require_session(
    State(state): State<SharedState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = req
        .headers()
        .get(SESSION_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            AppError::Unauthorized("missing session token header `X-Session-Token`".into())
        })?;

    let user_id = session_service::authenticate(&state, token)?;
    req.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(req).await)
}
