use reqwest::StatusCode;
use thiserror::Error;

/// Failures raised while talking to Spotify.
#[derive(Debug, Error)]
pub enum SpotifyError {
    /// `SPOTIFY_CLIENT_ID` / `SPOTIFY_CLIENT_SECRET` are not configured.
    #[error("Missing Spotify credentials")]
    MissingCredentials,
    /// The request could not be sent or the connection failed.
    #[error("failed to reach Spotify while {context}")]
    Request {
        /// What the client was doing.
        context: &'static str,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// Spotify answered with an unexpected status.
    #[error("Spotify returned {status} while {context}")]
    Status {
        /// What the client was doing.
        context: &'static str,
        /// Status returned by Spotify.
        status: StatusCode,
    },
    /// The response body did not match the expected shape.
    #[error("failed to decode Spotify response while {context}")]
    Decode {
        /// What the client was doing.
        context: &'static str,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
    /// The requested resource does not exist on Spotify.
    #[error("{0} not found on Spotify")]
    NotFound(String),
}
