/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Room lifecycle: creation, membership, host hand-off, finish and reset.
pub mod room_service;
/// Round lifecycle and answer scoring.
pub mod round_service;
/// Anonymous sessions.
pub mod session_service;
/// Playlist lookup on Spotify.
pub mod spotify_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events streaming service.
pub mod sse_service;
/// Storage connection supervisor with backoff and degraded mode.
pub mod storage_supervisor;
