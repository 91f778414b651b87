// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::application::dashboard_service::DashboardService;
use crate::application::telemetry_provider::TelemetryProvider;
use crate::infrastructure::config::load_upstream_settings;
use crate::infrastructure::credentials::CredentialCache;
use crate::infrastructure::gateway::UpstreamGateway;
use crate::infrastructure::live_provider::LiveProvider;
use crate::infrastructure::mock_provider::MockProvider;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    control, get_dashboard, get_device, get_telemetry, health_check, list_alarms, list_devices,
    login,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let settings = load_upstream_settings()?;
    let use_mock = settings.mock_enabled();

    // Select the data source (infrastructure layer)
    let provider: Arc<dyn TelemetryProvider> = if use_mock {
        tracing::info!("serving synthetic data (mock mode)");
        Arc::new(MockProvider)
    } else {
        let Some(base_url) = settings.base_url.clone() else {
            anyhow::bail!("base_url is required when mock mode is disabled");
        };
        let client = reqwest::Client::new();
        let credentials = Arc::new(CredentialCache::new(
            base_url.clone(),
            settings.access_token.clone(),
            settings.username.clone(),
            settings.password.clone(),
            client.clone(),
        ));
        let gateway = UpstreamGateway::new(base_url, client.clone(), credentials);
        Arc::new(LiveProvider::new(gateway, client))
    };

    // Create services (application layer)
    let dashboard_service =
        DashboardService::new(provider.clone(), settings.device_id.clone(), use_mock);

    // Create application state
    let state = Arc::new(AppState {
        provider,
        dashboard_service,
    });

    // Build router (presentation layer)
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/api/devices", get(list_devices))
        .route("/api/devices/:id", get(get_device))
        .route("/api/alarms", get(list_alarms))
        .route("/api/telemetry", get(get_telemetry))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/login", post(login))
        .route("/api/control", post(control))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr = "0.0.0.0:8080".parse().unwrap();
    tracing::info!("starting energy-telemetry service on {addr}");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
