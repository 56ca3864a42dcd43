use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Ok,
    /// No storage backend answers; room operations fail with 503.
    Degraded,
}

/// Body of `GET /healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: HealthStatus,
    /// Storage backend in use (`memory` or `couchdb`), omitted while degraded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<&'static str>,
}

impl HealthResponse {
    pub fn ok(storage: &'static str) -> Self {
        Self {
            status: HealthStatus::Ok,
            storage: Some(storage),
        }
    }

    pub fn degraded() -> Self {
        Self {
            status: HealthStatus::Degraded,
            storage: None,
        }
    }
}
