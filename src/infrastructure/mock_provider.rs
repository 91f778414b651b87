// Synthetic data source for demo/offline operation
use crate::application::telemetry_provider::TelemetryProvider;
use crate::domain::alarm::{Alarm, AlarmSeverity, AlarmStatus};
use crate::domain::device::{Device, DeviceStatus};
use crate::domain::telemetry::{now_ms, TelemetryRecord, TelemetrySample};
use crate::infrastructure::error::ProviderError;
use async_trait::async_trait;

pub const DEFAULT_DEMO_DEVICE: &str = "dev-solar-001";

const MINUTE_MS: i64 = 60 * 1000;
const HOUR_MS: i64 = 60 * MINUTE_MS;

/// Fixed synthetic fleet plus a deterministic series generator. The same time
/// window always produces the same series, so demo charts are stable across
/// reloads.
#[derive(Debug, Clone, Default)]
pub struct MockProvider;

impl MockProvider {
    fn devices(now: i64) -> Vec<Device> {
        vec![
            Device {
                id: DEFAULT_DEMO_DEVICE.to_string(),
                name: "Solar Inverter #001".to_string(),
                label: Some("Rooftop Solar - Block A".to_string()),
                device_type: Some("inverter".to_string()),
                customer_title: Some("Demo Tenant".to_string()),
                status: DeviceStatus::Online,
                last_activity_ts: Some(now - 2 * MINUTE_MS),
            },
            Device {
                id: "dev-meter-014".to_string(),
                name: "Smart Meter #014".to_string(),
                label: Some("Main Feed - Floor 2".to_string()),
                device_type: Some("meter".to_string()),
                customer_title: Some("Demo Tenant".to_string()),
                status: DeviceStatus::Online,
                last_activity_ts: Some(now - 35 * 1000),
            },
            Device {
                id: "dev-pump-002".to_string(),
                name: "Pump Controller #002".to_string(),
                label: Some("Water Pump - Basement".to_string()),
                device_type: Some("controller".to_string()),
                customer_title: Some("Demo Tenant".to_string()),
                status: DeviceStatus::Offline,
                last_activity_ts: Some(now - 6 * HOUR_MS),
            },
            Device {
                id: "dev-evse-007".to_string(),
                name: "EV Charger #007".to_string(),
                label: Some("Parking - Bay 7".to_string()),
                device_type: Some("evse".to_string()),
                customer_title: Some("Demo Tenant".to_string()),
                status: DeviceStatus::Online,
                last_activity_ts: Some(now - MINUTE_MS),
            },
        ]
    }

    fn alarms(now: i64) -> Vec<Alarm> {
        vec![
            Alarm {
                id: "alarm-002".to_string(),
                device_id: DEFAULT_DEMO_DEVICE.to_string(),
                severity: AlarmSeverity::Warning,
                alarm_type: "TEMP_HIGH".to_string(),
                status: AlarmStatus::ActiveAck,
                created_time_ts: now - 10 * MINUTE_MS,
                details: Some("Inverter temperature above threshold (42C).".to_string()),
            },
            Alarm {
                id: "alarm-001".to_string(),
                device_id: "dev-pump-002".to_string(),
                severity: AlarmSeverity::Major,
                alarm_type: "DEVICE_OFFLINE".to_string(),
                status: AlarmStatus::ActiveUnack,
                created_time_ts: now - 55 * MINUTE_MS,
                details: Some("No telemetry received for 6 hours.".to_string()),
            },
        ]
    }

    fn latest_for(device_id: &str, now: i64) -> Option<TelemetryRecord> {
        let readings: &[(&str, f64)] = match device_id {
            DEFAULT_DEMO_DEVICE => &[
                ("temperature", 44.2),
                ("humidity", 22.0),
                ("voltage", 232.1),
                ("current", 9.7),
                ("power", 2150.0),
                ("energyKwhToday", 12.4),
                ("rssi", -58.0),
            ],
            "dev-meter-014" => &[
                ("temperature", 33.9),
                ("humidity", 41.0),
                ("voltage", 229.5),
                ("current", 3.4),
                ("power", 780.0),
                ("energyKwhToday", 6.2),
                ("rssi", -62.0),
            ],
            "dev-pump-002" => &[
                ("temperature", 39.0),
                ("humidity", 55.0),
                ("voltage", 0.0),
                ("current", 0.0),
                ("power", 0.0),
                ("energyKwhToday", 0.4),
                ("rssi", -92.0),
            ],
            "dev-evse-007" => &[
                ("temperature", 31.5),
                ("humidity", 28.0),
                ("voltage", 234.0),
                ("current", 14.2),
                ("power", 3320.0),
                ("energyKwhToday", 18.8),
                ("rssi", -53.0),
            ],
            _ => return None,
        };

        let ts = now - MINUTE_MS;
        let mut record = TelemetryRecord::new();
        for (key, value) in readings {
            record.insert(
                key.to_string(),
                vec![TelemetrySample {
                    ts: Some(ts),
                    value: value.to_string(),
                }],
            );
        }
        Some(record)
    }

    /// Deterministic power/voltage/current/energy channels over the window.
    /// Power follows a daylight curve with hash-seeded jitter; energy is the
    /// running integral of power.
    pub fn demo_series(start_ts: i64, end_ts: i64, step_ms: i64) -> TelemetryRecord {
        let mut power = Vec::new();
        let mut voltage = Vec::new();
        let mut current = Vec::new();
        let mut energy = Vec::new();

        let mut energy_kwh = 0.0;
        let mut ts = start_ts;
        while ts <= end_ts {
            let hour_of_day = ((ts / HOUR_MS) % 24) as f64 + ((ts % HOUR_MS) as f64 / HOUR_MS as f64);
            let daylight = ((hour_of_day - 6.0) / 12.0 * std::f64::consts::PI)
                .sin()
                .max(0.0);
            let jitter = hash_unit(ts as u64);

            let power_w = 350.0 + 2800.0 * daylight + 300.0 * (jitter - 0.5);
            let voltage_v = 230.0 + 6.0 * (hash_unit(ts as u64 ^ 0x9e37) - 0.5);
            let current_a = power_w / voltage_v;
            energy_kwh += power_w * (step_ms as f64 / HOUR_MS as f64) / 1000.0;

            power.push(sample(ts, format!("{power_w:.1}")));
            voltage.push(sample(ts, format!("{voltage_v:.1}")));
            current.push(sample(ts, format!("{current_a:.2}")));
            energy.push(sample(ts, format!("{energy_kwh:.3}")));

            ts += step_ms;
        }

        let mut record = TelemetryRecord::new();
        record.insert("power".to_string(), power);
        record.insert("voltage".to_string(), voltage);
        record.insert("current".to_string(), current);
        record.insert("energy".to_string(), energy);
        record
    }

    fn step_for_window(start_ts: i64, end_ts: i64) -> i64 {
        // 10-minute steps for day-scale windows, 4-hour steps beyond that.
        if end_ts - start_ts <= 26 * HOUR_MS {
            10 * MINUTE_MS
        } else {
            4 * HOUR_MS
        }
    }
}

fn sample(ts: i64, value: String) -> TelemetrySample {
    TelemetrySample {
        ts: Some(ts),
        value,
    }
}

/// Hash a seed into [0, 1). splitmix64 finalizer.
fn hash_unit(seed: u64) -> f64 {
    let mut x = seed;
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    x = x.wrapping_mul(0xc4ce_b9fe_1a85_ec53);
    x ^= x >> 33;
    (x >> 11) as f64 / (1u64 << 53) as f64
}

#[async_trait]
impl TelemetryProvider for MockProvider {
    async fn list_devices(&self) -> Result<Vec<Device>, ProviderError> {
        Ok(Self::devices(now_ms()))
    }

    async fn get_device(&self, device_id: &str) -> Result<Option<Device>, ProviderError> {
        Ok(Self::devices(now_ms())
            .into_iter()
            .find(|d| d.id == device_id))
    }

    async fn list_alarms(&self, device_id: Option<&str>) -> Result<Vec<Alarm>, ProviderError> {
        let mut alarms = Self::alarms(now_ms());
        if let Some(device_id) = device_id {
            alarms.retain(|a| a.device_id == device_id);
        }
        alarms.sort_by(|a, b| b.created_time_ts.cmp(&a.created_time_ts));
        Ok(alarms)
    }

    async fn latest_telemetry(
        &self,
        device_id: &str,
    ) -> Result<Option<TelemetryRecord>, ProviderError> {
        Ok(Self::latest_for(device_id, now_ms()))
    }

    async fn telemetry_history(
        &self,
        _device_id: &str,
        start_ts: i64,
        end_ts: i64,
        limit: u32,
    ) -> Result<TelemetryRecord, ProviderError> {
        let step = Self::step_for_window(start_ts, end_ts);
        let mut record = Self::demo_series(start_ts, end_ts, step);
        for samples in record.values_mut() {
            samples.truncate(limit as usize);
        }
        Ok(record)
    }

    async fn login(&self, _username: &str, _password: &str) -> Result<String, ProviderError> {
        Ok("mock-session-token".to_string())
    }

    async fn invoke_rpc(
        &self,
        device_id: &str,
        method: &str,
        params: serde_json::Value,
        _session_token: &str,
    ) -> Result<serde_json::Value, ProviderError> {
        Ok(serde_json::json!({
            "ok": true,
            "deviceId": device_id,
            "method": method,
            "params": params,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::telemetry::coerce_numeric;

    const DAY_MS: i64 = 24 * HOUR_MS;

    #[test]
    fn test_demo_series_is_deterministic() {
        let start = 1_700_000_000_000;
        let a = MockProvider::demo_series(start, start + DAY_MS, 10 * MINUTE_MS);
        let b = MockProvider::demo_series(start, start + DAY_MS, 10 * MINUTE_MS);

        assert_eq!(a.len(), b.len());
        for (key, samples) in &a {
            let other = &b[key];
            assert_eq!(samples.len(), other.len());
            for (lhs, rhs) in samples.iter().zip(other) {
                assert_eq!(lhs.ts, rhs.ts);
                assert_eq!(lhs.value, rhs.value);
            }
        }
    }

    #[test]
    fn test_demo_series_channels_are_aligned() {
        let start = 1_700_000_000_000;
        let record = MockProvider::demo_series(start, start + DAY_MS, 10 * MINUTE_MS);

        let lengths: Vec<usize> = record.values().map(|s| s.len()).collect();
        assert!(lengths.iter().all(|len| *len == lengths[0]));
        assert_eq!(lengths[0], 145);
    }

    #[test]
    fn test_demo_energy_is_monotonic() {
        let start = 1_700_000_000_000;
        let record = MockProvider::demo_series(start, start + DAY_MS, 10 * MINUTE_MS);

        let energy: Vec<f64> = record["energy"]
            .iter()
            .map(|s| coerce_numeric(&s.value))
            .collect();
        assert!(energy.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_alarms_sorted_newest_first_and_filterable() {
        let provider = MockProvider;
        let alarms = provider.list_alarms(None).await.unwrap();
        assert_eq!(alarms.len(), 2);
        assert!(alarms[0].created_time_ts >= alarms[1].created_time_ts);

        let filtered = provider.list_alarms(Some("dev-pump-002")).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].alarm_type, "DEVICE_OFFLINE");
    }

    #[tokio::test]
    async fn test_unknown_device_lookup_is_none() {
        let provider = MockProvider;
        assert!(provider.get_device("no-such-device").await.unwrap().is_none());
        assert!(provider
            .latest_telemetry("no-such-device")
            .await
            .unwrap()
            .is_none());
    }
}
