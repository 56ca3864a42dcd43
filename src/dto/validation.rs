//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest Spotify identifier accepted on input.
const SPOTIFY_ID_MAX_LEN: usize = 64;

/// Rejects strings that are empty once surrounding whitespace is removed.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that a Spotify identifier is 1 to 64 ASCII alphanumeric characters.
///
/// ```ignore
/// validate_spotify_id("37i9dQZF1DXcBWIGoYBM5M") // Ok
/// validate_spotify_id("../me")                   // Err
/// ```
pub fn validate_spotify_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > SPOTIFY_ID_MAX_LEN {
        let mut err = ValidationError::new("spotify_id_length");
        err.message = Some(
            format!(
                "Spotify ID must be between 1 and {SPOTIFY_ID_MAX_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        let mut err = ValidationError::new("spotify_id_format");
        err.message = Some("Spotify ID must contain only alphanumeric characters".into());
        return Err(err);
    }

    Ok(())
}
