use crate::config::CREDENTIAL_ENV;
use crate::preview;
use crate::state::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health status for a component or the overall system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Component is functioning normally
    Healthy,
    /// Component is functioning but degraded (requests will surface errors)
    Degraded,
    /// Component is not functioning
    Unhealthy,
}

impl HealthStatus {
    /// Returns the HTTP status code for this health status
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Degraded still serves traffic; the envelope carries the detail.
            HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Combines two health statuses, returning the worse of the two
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        }
    }
}

/// Health check result for a component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub component: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
}

impl ComponentHealth {
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            error: None,
            timestamp: Self::now(),
        }
    }

    pub fn degraded(component: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Degraded,
            error: Some(error.into()),
            timestamp: Self::now(),
        }
    }

    pub fn unhealthy(component: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            error: Some(error.into()),
            timestamp: Self::now(),
        }
    }

    fn now() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: HealthStatus,
    pub uptime_secs: u64,
    pub components: Vec<ComponentHealth>,
}

/// Liveness: the process is up and serving.
pub async fn liveness_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness: credential configured and preview template renderable.
/// A missing credential degrades instead of failing; generation requests
/// surface it per-request and an operator can fix it without a restart.
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> Response {
    let credential = if state.config().has_credential() {
        ComponentHealth::healthy("credential")
    } else {
        ComponentHealth::degraded(
            "credential",
            format!("{CREDENTIAL_ENV} is not configured"),
        )
    };

    let template = match preview::template_health_check() {
        Ok(()) => ComponentHealth::healthy("preview_template"),
        Err(err) => ComponentHealth::unhealthy("preview_template", err),
    };

    let status = credential.status.combine(template.status);
    let body = ReadinessResponse {
        status,
        uptime_secs: state.uptime_secs(),
        components: vec![credential, template],
    };
    (status.status_code(), Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_returns_the_worse_status() {
        assert_eq!(
            HealthStatus::Healthy.combine(HealthStatus::Healthy),
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthStatus::Healthy.combine(HealthStatus::Degraded),
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthStatus::Degraded.combine(HealthStatus::Unhealthy),
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn degraded_still_serves_traffic() {
        assert_eq!(HealthStatus::Degraded.status_code(), StatusCode::OK);
        assert_eq!(
            HealthStatus::Unhealthy.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn component_health_serializes_lowercase_status() {
        let json = serde_json::to_value(ComponentHealth::degraded("credential", "missing")).unwrap();
        assert_eq!(json["status"], "degraded");
        assert_eq!(json["error"], "missing");

        let healthy = serde_json::to_value(ComponentHealth::healthy("preview_template")).unwrap();
        assert!(healthy.get("error").is_none());
    }
}
