pub mod api;

use axum::{http::HeaderValue, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::Config, docs::ApiDoc, ws::{relay_handler, RelayHub}};
pub use api::create_api_routes;

/// The full HTTP surface of the relay
pub fn build_router(hub: Arc<RelayHub>, config: &Config) -> Router {
    let relay = Router::<Arc<RelayHub>>::new()
        .route("/ws/:channel", get(relay_handler))
        .with_state(hub.clone());

    Router::new()
        .nest("/api", create_api_routes(hub))
        .merge(relay)
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins()
        .into_iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    if !origins.is_empty() {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
    } else if config.is_development() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn router() -> Router {
        let hub = Arc::new(RelayHub::new(16));
        build_router(hub, &Config::default())
    }

    #[tokio::test]
    async fn health_reports_service() {
        let response = router()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "nexus-sync");
    }

    #[tokio::test]
    async fn diagnostics_start_empty() {
        let response = router()
            .oneshot(Request::builder().uri("/api/v1/diagnostics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["n_conn"], 0);
        assert_eq!(json["n_channels"], 0);
        assert_eq!(json["frames_relayed"], 0);
    }

    #[tokio::test]
    async fn openapi_lists_relay_endpoint() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/ws/{channel}"));
        assert!(doc.paths.paths.contains_key("/api/v1/diagnostics"));
    }
}
