// Application state for HTTP handlers
use crate::application::dashboard_service::DashboardService;
use crate::application::telemetry_provider::TelemetryProvider;
use std::sync::Arc;

pub struct AppState {
    pub provider: Arc<dyn TelemetryProvider>,
    pub dashboard_service: DashboardService,
}
