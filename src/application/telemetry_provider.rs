// Provider trait - the mock/live strategy seam
use crate::domain::alarm::Alarm;
use crate::domain::device::Device;
use crate::domain::telemetry::TelemetryRecord;
use crate::infrastructure::error::ProviderError;
use async_trait::async_trait;

/// Data source for everything the dashboard shows. Implemented by the live
/// upstream client and by the synthetic mock source; configuration picks one
/// at startup.
#[async_trait]
pub trait TelemetryProvider: Send + Sync {
    async fn list_devices(&self) -> Result<Vec<Device>, ProviderError>;

    /// Lookup by id; an unknown device is `None`, not an error.
    async fn get_device(&self, device_id: &str) -> Result<Option<Device>, ProviderError>;

    async fn list_alarms(&self, device_id: Option<&str>) -> Result<Vec<Alarm>, ProviderError>;

    /// Most recent single sample per metric key.
    async fn latest_telemetry(
        &self,
        device_id: &str,
    ) -> Result<Option<TelemetryRecord>, ProviderError>;

    /// Raw samples per metric key over `[start_ts, end_ts]`, capped at
    /// `limit` samples per key.
    async fn telemetry_history(
        &self,
        device_id: &str,
        start_ts: i64,
        end_ts: i64,
        limit: u32,
    ) -> Result<TelemetryRecord, ProviderError>;

    /// Exchange user credentials for a session token used by control actions.
    async fn login(&self, username: &str, password: &str) -> Result<String, ProviderError>;

    /// Fire a two-way RPC at a device on behalf of a logged-in session.
    async fn invoke_rpc(
        &self,
        device_id: &str,
        method: &str,
        params: serde_json::Value,
        session_token: &str,
    ) -> Result<serde_json::Value, ProviderError>;
}
