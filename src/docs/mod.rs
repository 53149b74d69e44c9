use utoipa::OpenApi;
use crate::models::*;

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Relay is running", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn health_check_doc() {}

/// Readiness check endpoint
#[utoipa::path(
    get,
    path = "/api/ready",
    responses(
        (status = 200, description = "Relay is ready", body = HealthResponse)
    )
)]
#[allow(dead_code)]
pub async fn ready_check_doc() {}

/// Relay diagnostics
#[utoipa::path(
    get,
    path = "/api/v1/diagnostics",
    responses(
        (status = 200, description = "Connection, channel and host statistics", body = DiagnosticsResponse)
    )
)]
#[allow(dead_code)]
pub async fn diagnostics_doc() {}

/// Sync relay WebSocket
#[utoipa::path(
    get,
    path = "/ws/{channel}",
    params(
        ("channel" = String, Path, description = "Broadcast channel name, [A-Za-z0-9_.-]{1,128}")
    ),
    responses(
        (status = 101, description = "Switching to WebSocket; frames are relayed to every other member"),
        (status = 400, description = "Invalid channel name", body = ErrorResponse)
    )
)]
#[allow(dead_code)]
pub async fn relay_doc() {}

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_doc,
        ready_check_doc,
        diagnostics_doc,
        relay_doc,
    ),
    components(
        schemas(HealthResponse, DiagnosticsResponse, ErrorResponse)
    ),
    tags(
        (name = "relay", description = "Nexus workspace sync relay")
    )
)]
pub struct ApiDoc;
