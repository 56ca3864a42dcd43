use axum::{Json, Router, extract::State, routing::post};

use crate::{dto::session::SessionResponse, services::session_service, state::SharedState};

/// Sign in anonymously.
#[utoipa::path(
    post,
    path = "/sessions",
    tag = "sessions",
    responses((status = 200, description = "Session issued", body = SessionResponse))
)]
pub async fn create_session(State(state): State<SharedState>) -> Json<SessionResponse> {
    Json(session_service::create_session(&state))
}

/// Configure the session routes.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sessions", post(create_session))
}
