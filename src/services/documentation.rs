use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the blind test backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sessions::create_session,
        crate::routes::rooms::create_room,
        crate::routes::rooms::get_room,
        crate::routes::rooms::update_settings,
        crate::routes::rooms::list_players,
        crate::routes::rooms::join_room,
        crate::routes::rooms::leave_room,
        crate::routes::rooms::promote_host,
        crate::routes::rooms::kick_player,
        crate::routes::rooms::finish_game,
        crate::routes::rooms::reset_room,
        crate::routes::rounds::start_round,
        crate::routes::rounds::current_round,
        crate::routes::rounds::get_round,
        crate::routes::rounds::submit_answer,
        crate::routes::sse::room_stream,
        crate::routes::spotify::search,
        crate::routes::spotify::get_playlist,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::health::HealthStatus,
            crate::dto::session::SessionResponse,
            crate::dto::room::RoomSummary,
            crate::dto::room::PlayerSummary,
            crate::dto::room::CreateRoomResponse,
            crate::dto::room::JoinRoomRequest,
            crate::dto::room::JoinRoomResponse,
            crate::dto::room::UpdateSettingsRequest,
            crate::dto::room::PlayersResponse,
            crate::dto::room::ScoreboardResponse,
            crate::dto::room::LeaveRoomResponse,
            crate::dto::round::StartRoundRequest,
            crate::dto::round::StartRoundResponse,
            crate::dto::round::RoundView,
            crate::dto::round::TrackReveal,
            crate::dto::round::AnswerView,
            crate::dto::round::SubmitAnswerRequest,
            crate::dto::round::SubmitAnswerResponse,
            crate::dto::spotify::SearchRequest,
            crate::dto::spotify::SearchResponse,
            crate::dto::spotify::PlaylistSummary,
            crate::dto::sse::Handshake,
            crate::dto::sse::RoomDeletedEvent,
            crate::dto::sse::PlayerJoinedEvent,
            crate::dto::sse::PlayerLeftEvent,
            crate::dto::sse::PlayerUpdatedEvent,
            crate::dto::sse::AnswerSubmittedEvent,
            crate::dao::models::RoomStatus,
        )
    ),
    modifiers(&SessionTokenAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sessions", description = "Anonymous sessions"),
        (name = "rooms", description = "Room lifecycle and players"),
        (name = "rounds", description = "Rounds and answers"),
        (name = "spotify", description = "Playlist lookup"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;

struct SessionTokenAddon;

impl Modify for SessionTokenAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-Session-Token"))),
            );
        }
    }
}
