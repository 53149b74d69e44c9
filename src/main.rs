use std::panic;
use std::sync::Arc;
use tracing::{info, error, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use nexus_sync::config::Config;
use nexus_sync::routes::build_router;
use nexus_sync::ws::RelayHub;

#[tokio::main]
async fn main() {

    // Set panic hook for better error messages
    panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
    }));

    // Tracing is set up from the loaded config, so a load failure is reported afterwards
    let loaded = Config::load();
    let config = loaded.as_ref().cloned().unwrap_or_default();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter().into()))
        .init();

    info!("Starting relay...");

    if let Err(e) = loaded {
        error!("Failed to load configuration: {}", e);
        warn!("Using default configuration");
    }

    let hub = Arc::new(RelayHub::new(config.channel_capacity));
    let app_routes = build_router(hub, &config);

    let listener = tokio::net::TcpListener::bind(config.server_address())
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {}", config.server_address()));

    info!("🚀 {} running on http://{}", config.service_name, config.server_address());
    info!("📡 Relay available at ws://{}/ws/{{channel}}", config.server_address());
    info!("📚 Swagger UI available at http://{}/swagger", config.server_address());

    axum::serve(listener, app_routes)
        .await
        .expect("Server failed to start");
}
