// Application layer - Use cases and provider seam
pub mod dashboard_service;
pub mod telemetry_provider;
