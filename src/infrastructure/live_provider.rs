// Live data source backed by the upstream IoT platform
use crate::application::telemetry_provider::TelemetryProvider;
use crate::domain::alarm::{Alarm, AlarmSeverity, AlarmStatus};
use crate::domain::device::{derive_status, Device, DeviceStatus};
use crate::domain::telemetry::{now_ms, TelemetryRecord};
use crate::infrastructure::credentials::login_exchange;
use crate::infrastructure::error::ProviderError;
use crate::infrastructure::gateway::UpstreamGateway;
use async_trait::async_trait;
use serde::Deserialize;

/// Metric keys requested from the upstream telemetry endpoints.
const TELEMETRY_KEYS: &str = "temperature,humidity,voltage,current,power,energy,energyKwhToday,rssi";

const PAGE_SIZE: u32 = 50;

pub struct LiveProvider {
    gateway: UpstreamGateway,
    client: reqwest::Client,
}

impl LiveProvider {
    pub fn new(gateway: UpstreamGateway, client: reqwest::Client) -> Self {
        Self { gateway, client }
    }
}

/// Paged list envelope used by the upstream list endpoints.
#[derive(Debug, Deserialize)]
struct RawPage<T> {
    // a bare `default` would require `T: Default`
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RawEntityId {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDevice {
    id: RawEntityId,
    name: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(rename = "type", default)]
    device_type: Option<String>,
    #[serde(default)]
    customer_title: Option<String>,
    #[serde(default)]
    status: Option<DeviceStatus>,
    // Older upstream versions report lastActivityTime instead.
    #[serde(
        default,
        alias = "lastActivityTime",
        deserialize_with = "lenient_timestamp"
    )]
    last_activity_ts: Option<i64>,
}

/// Accept numeric or numeric-string activity timestamps; anything else reads
/// as absent, which downstream liveness derivation treats as offline. One
/// malformed device must not take down the whole listing.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::Number(n) => {
            n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))
        }
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

impl RawDevice {
    fn into_domain(self, now: i64) -> Device {
        let status = derive_status(self.status, self.last_activity_ts, now);
        Device {
            id: self.id.id,
            name: self.name,
            label: self.label,
            device_type: self.device_type,
            customer_title: self.customer_title,
            status,
            last_activity_ts: self.last_activity_ts,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAlarm {
    id: RawEntityId,
    #[serde(default)]
    originator: Option<RawEntityId>,
    severity: AlarmSeverity,
    #[serde(rename = "type")]
    alarm_type: String,
    status: AlarmStatus,
    #[serde(default, alias = "createdTimeTs")]
    created_time: i64,
    #[serde(default)]
    details: Option<serde_json::Value>,
}

impl RawAlarm {
    fn into_domain(self) -> Alarm {
        let details = self.details.and_then(|value| match value {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        });
        Alarm {
            id: self.id.id,
            device_id: self.originator.map(|o| o.id).unwrap_or_default(),
            severity: self.severity,
            alarm_type: self.alarm_type,
            status: self.status,
            created_time_ts: self.created_time,
            details,
        }
    }
}

#[async_trait]
impl TelemetryProvider for LiveProvider {
    async fn list_devices(&self) -> Result<Vec<Device>, ProviderError> {
        let path = format!("/api/tenant/devices?pageSize={PAGE_SIZE}&page=0");
        let page: Option<RawPage<RawDevice>> = self.gateway.get_json(&path).await?;

        let now = now_ms();
        Ok(page
            .map(|p| p.data)
            .unwrap_or_default()
            .into_iter()
            .map(|raw| raw.into_domain(now))
            .collect())
    }

    async fn get_device(&self, device_id: &str) -> Result<Option<Device>, ProviderError> {
        let path = format!("/api/tenant/devices/{}", urlencoding::encode(device_id));
        let raw: Option<RawDevice> = self.gateway.get_json(&path).await?;
        Ok(raw.map(|r| r.into_domain(now_ms())))
    }

    async fn list_alarms(&self, device_id: Option<&str>) -> Result<Vec<Alarm>, ProviderError> {
        let mut path = format!("/api/alarms?pageSize={PAGE_SIZE}&page=0");
        if let Some(device_id) = device_id {
            path.push_str(&format!("&entityId={}", urlencoding::encode(device_id)));
        }
        let page: Option<RawPage<RawAlarm>> = self.gateway.get_json(&path).await?;

        Ok(page
            .map(|p| p.data)
            .unwrap_or_default()
            .into_iter()
            .map(RawAlarm::into_domain)
            .collect())
    }

    async fn latest_telemetry(
        &self,
        device_id: &str,
    ) -> Result<Option<TelemetryRecord>, ProviderError> {
        let path = format!(
            "/api/plugins/telemetry/DEVICE/{}/values/timeseries?keys={}&limit=1",
            urlencoding::encode(device_id),
            urlencoding::encode(TELEMETRY_KEYS),
        );
        self.gateway.get_json(&path).await
    }

    async fn telemetry_history(
        &self,
        device_id: &str,
        start_ts: i64,
        end_ts: i64,
        limit: u32,
    ) -> Result<TelemetryRecord, ProviderError> {
        let path = format!(
            "/api/plugins/telemetry/DEVICE/{}/values/timeseries?keys={}&startTs={}&endTs={}&limit={}",
            urlencoding::encode(device_id),
            urlencoding::encode(TELEMETRY_KEYS),
            start_ts,
            end_ts,
            limit,
        );
        let record: Option<TelemetryRecord> = self.gateway.get_json(&path).await?;
        Ok(record.unwrap_or_default())
    }

    async fn login(&self, username: &str, password: &str) -> Result<String, ProviderError> {
        login_exchange(&self.client, self.gateway.base_url(), username, password).await
    }

    async fn invoke_rpc(
        &self,
        device_id: &str,
        method: &str,
        params: serde_json::Value,
        session_token: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        self.gateway
            .invoke_rpc(device_id, method, params, session_token)
            .await
    }
}
