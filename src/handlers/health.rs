use axum::Json;
use crate::models::HealthResponse;
use tracing::debug;

const SERVICE: &str = env!("CARGO_PKG_NAME");

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    debug!("Health check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Relay is running".to_string(),
        service: SERVICE.to_string(),
    })
}

/// Readiness check endpoint. The relay keeps no external dependencies, so it
/// is ready as soon as it accepts connections.
pub async fn ready_check() -> Json<HealthResponse> {
    debug!("Readiness check requested");
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Relay is ready".to_string(),
        service: SERVICE.to_string(),
    })
}
