use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Anonymous session issued by `POST /sessions`.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Identifier of the anonymous user.
    pub user_id: Uuid,
    /// Opaque token to send back in the `X-Session-Token` header.
    pub token: String,
}
