//! Application-level configuration loading: game rules and upstream Spotify endpoints.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

use crate::scoring::ScoringRules;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BLINDTEST_BACK_CONFIG_PATH";
/// Number of random picks tried before giving up on finding a playable preview.
const DEFAULT_MAX_PREVIEW_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    /// Scoring and matching rules applied to submitted answers.
    pub rules: ScoringRules,
    /// How many tracks `start_round` may try before failing.
    pub max_preview_attempts: u32,
    /// Base URLs of the Spotify services.
    pub spotify: SpotifyEndpoints,
}

/// Base URLs used by the Spotify client, overridable so tests can target a local stub.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpotifyEndpoints {
    /// Accounts service issuing client-credentials tokens.
    pub accounts_url: String,
    /// Web API root (`/v1` included).
    pub api_url: String,
    /// Public site serving the track embed pages.
    pub embed_url: String,
}

impl Default for SpotifyEndpoints {
    fn default() -> Self {
        Self {
            accounts_url: "https://accounts.spotify.com".into(),
            api_url: "https://api.spotify.com/v1".into(),
            embed_url: "https://open.spotify.com".into(),
        }
    }
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        max_score = app_config.rules.max_score,
                        max_answer_secs = app_config.rules.max_answer_secs,
                        "loaded game rules from config"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let raw = serde_json::from_str::<RawConfig>(contents).map_err(|err| err.to_string())?;
        raw.rules.validate()?;
        if raw.max_preview_attempts == 0 {
            return Err("max_preview_attempts must be at least 1".into());
        }
        Ok(raw.into())
    }

    /// Replace the Spotify endpoints, keeping every other setting.
    pub fn with_spotify_endpoints(mut self, endpoints: SpotifyEndpoints) -> Self {
        self.spotify = endpoints;
        self
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rules: ScoringRules::default(),
            max_preview_attempts: DEFAULT_MAX_PREVIEW_ATTEMPTS,
            spotify: SpotifyEndpoints::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    #[serde(default)]
    rules: ScoringRules,
    #[serde(default = "default_max_preview_attempts")]
    max_preview_attempts: u32,
    #[serde(default)]
    spotify: SpotifyEndpoints,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        Self {
            rules: value.rules,
            max_preview_attempts: value.max_preview_attempts,
            spotify: SpotifyEndpoints {
                accounts_url: value.spotify.accounts_url.trim_end_matches('/').into(),
                api_url: value.spotify.api_url.trim_end_matches('/').into(),
                embed_url: value.spotify.embed_url.trim_end_matches('/').into(),
            },
        }
    }
}

fn default_max_preview_attempts() -> u32 {
    DEFAULT_MAX_PREVIEW_ATTEMPTS
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.max_preview_attempts, 5);
        assert_eq!(config.rules.max_score, 1000);
    }

    #[test]
    fn partial_rules_are_merged_with_defaults() {
        let config = AppConfig::from_json(
            r#"{"rules": {"max_answer_secs": 20}, "spotify": {"api_url": "http://localhost:9000/v1/"}}"#,
        )
        .unwrap();
        assert_eq!(config.rules.max_answer_secs, 20.0);
        assert_eq!(config.rules.max_score, 1000);
        assert_eq!(config.spotify.api_url, "http://localhost:9000/v1");
        assert_eq!(config.spotify.accounts_url, "https://accounts.spotify.com");
    }

    #[test]
    fn invalid_rules_are_rejected() {
        assert!(AppConfig::from_json(r#"{"rules": {"similarity_threshold": 0}}"#).is_err());
        assert!(AppConfig::from_json(r#"{"max_preview_attempts": 0}"#).is_err());
        assert!(AppConfig::from_json("not json").is_err());
    }
}
