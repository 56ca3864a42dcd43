use tracing::info;
use uuid::Uuid;

use crate::{dto::session::SessionResponse, error::ServiceError, state::SharedState};

/// Issue a new anonymous user together with its session token.
pub fn create_session(state: &SharedState) -> SessionResponse {
    let user_id = Uuid::new_v4();
    let token = Uuid::new_v4().simple().to_string();
    state.sessions().insert(token.clone(), user_id);
    info!(%user_id, "issued anonymous session");
    SessionResponse { user_id, token }
}

/// Resolve the user owning `token`.
pub fn authenticate(state: &SharedState, token: &str) -> Result<Uuid, ServiceError> {
    state
        .sessions()
        .get(token)
        .map(|entry| *entry.value())
        .ok_or_else(|| ServiceError::Unauthorized("unknown session token".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AppConfig, SpotifyEndpoints},
        spotify::SpotifyClient,
        state::AppState,
    };

    #[test]
    fn issued_token_authenticates_its_user() {
        let state = AppState::new(
            AppConfig::default(),
            SpotifyClient::new(SpotifyEndpoints::default(), None),
        );
        let session = create_session(&state);

        assert_eq!(authenticate(&state, &session.token).unwrap(), session.user_id);
        assert!(matches!(
            authenticate(&state, "nope"),
            Err(ServiceError::Unauthorized(_))
        ));
    }
}
