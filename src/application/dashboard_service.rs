// Dashboard service - one-call aggregation of devices, alarms and telemetry
use crate::application::telemetry_provider::TelemetryProvider;
use crate::domain::snapshot::DashboardSnapshot;
use crate::domain::telemetry::{
    hour_minute_label, month_day_label, normalize, now_ms, TelemetryRecord,
};
use crate::infrastructure::error::ProviderError;
use crate::infrastructure::mock_provider::{MockProvider, DEFAULT_DEMO_DEVICE};
use std::sync::Arc;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const MONTH_MS: i64 = 30 * DAY_MS;

const HISTORY_LIMIT: u32 = 200;
const HISTORY_30D_LIMIT: u32 = 500;

#[derive(Clone)]
pub struct DashboardService {
    provider: Arc<dyn TelemetryProvider>,
    fallback: MockProvider,
    device_id: Option<String>,
    use_mock: bool,
}

impl DashboardService {
    pub fn new(
        provider: Arc<dyn TelemetryProvider>,
        device_id: Option<String>,
        use_mock: bool,
    ) -> Self {
        Self {
            provider,
            fallback: MockProvider,
            device_id,
            use_mock,
        }
    }

    /// Compose the full dashboard payload from five independent upstream
    /// requests, issued concurrently and awaited to completion.
    ///
    /// A failed sub-request degrades to an empty field with a logged
    /// diagnostic; only a total outage (every sub-request failed) swaps in
    /// the synthetic fallback so the caller always gets a well-formed
    /// snapshot.
    pub async fn fetch_snapshot(&self) -> DashboardSnapshot {
        if self.use_mock {
            return self.mock_snapshot().await;
        }

        let now = now_ms();
        let device_id = self.device_id.as_deref();

        // Telemetry needs a configured target device; without one the three
        // telemetry sub-requests fail with a config diagnostic while devices
        // and alarms proceed.
        let latest = async {
            match device_id {
                Some(id) => self.provider.latest_telemetry(id).await,
                None => Err(ProviderError::Config("device_id")),
            }
        };
        let history = async {
            match device_id {
                Some(id) => {
                    self.provider
                        .telemetry_history(id, now - DAY_MS, now, HISTORY_LIMIT)
                        .await
                        .map(Some)
                }
                None => Err(ProviderError::Config("device_id")),
            }
        };
        let history_30d = async {
            match device_id {
                Some(id) => {
                    self.provider
                        .telemetry_history(id, now - MONTH_MS, now, HISTORY_30D_LIMIT)
                        .await
                        .map(Some)
                }
                None => Err(ProviderError::Config("device_id")),
            }
        };

        let (devices, alarms, latest, history, history_30d) = futures::join!(
            self.provider.list_devices(),
            self.provider.list_alarms(None),
            latest,
            history,
            history_30d,
        );

        let failed = [
            devices.is_err(),
            alarms.is_err(),
            latest.is_err(),
            history.is_err(),
            history_30d.is_err(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count();

        if failed == 5 {
            tracing::warn!("all upstream requests failed; serving synthetic snapshot");
            return self.mock_snapshot().await;
        }

        DashboardSnapshot {
            devices: devices.unwrap_or_else(|e| {
                log_degraded("devices", &e);
                Vec::new()
            }),
            alarms: alarms.unwrap_or_else(|e| {
                log_degraded("alarms", &e);
                Vec::new()
            }),
            latest: latest.unwrap_or_else(|e| {
                log_degraded("latest telemetry", &e);
                None
            }),
            history: normalize_window(history, hour_minute_label, "24h history"),
            history_30d: normalize_window(history_30d, month_day_label, "30d history"),
        }
    }

    async fn mock_snapshot(&self) -> DashboardSnapshot {
        let device_id = self.device_id.as_deref().unwrap_or(DEFAULT_DEMO_DEVICE);
        let now = now_ms();

        // The mock provider is infallible; the unwrap_or_defaults only guard
        // the trait signature.
        let devices = self.fallback.list_devices().await.unwrap_or_default();
        let alarms = self.fallback.list_alarms(None).await.unwrap_or_default();

        // A configured device outside the fixture fleet still gets the fixed
        // synthetic payload; the snapshot must stay fully populated.
        let latest = match self.fallback.latest_telemetry(device_id).await {
            Ok(Some(record)) => Some(record),
            _ => self
                .fallback
                .latest_telemetry(DEFAULT_DEMO_DEVICE)
                .await
                .unwrap_or_default(),
        };
        let history = self
            .fallback
            .telemetry_history(device_id, now - DAY_MS, now, HISTORY_LIMIT)
            .await
            .unwrap_or_default();
        let history_30d = self
            .fallback
            .telemetry_history(device_id, now - MONTH_MS, now, HISTORY_30D_LIMIT)
            .await
            .unwrap_or_default();

        DashboardSnapshot {
            devices,
            alarms,
            latest,
            history: normalize(&history, hour_minute_label),
            history_30d: normalize(&history_30d, month_day_label),
        }
    }
}

fn normalize_window(
    result: Result<Option<TelemetryRecord>, ProviderError>,
    label_formatter: fn(i64) -> String,
    what: &str,
) -> Vec<crate::domain::telemetry::SeriesPoint> {
    match result {
        Ok(Some(record)) => normalize(&record, label_formatter),
        Ok(None) => Vec::new(),
        Err(e) => {
            log_degraded(what, &e);
            Vec::new()
        }
    }
}

fn log_degraded(what: &str, error: &ProviderError) {
    tracing::error!("{what} fetch failed, serving empty field: {error}");
}
