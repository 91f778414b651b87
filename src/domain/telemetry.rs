// Telemetry domain models and series normalization
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One raw upstream sample. The timestamp may be absent and the value arrives
/// as untyped text (some upstream versions send JSON numbers instead, so
/// deserialization accepts both and keeps the string form).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySample {
    #[serde(default)]
    pub ts: Option<i64>,
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: String,
}

/// Raw upstream telemetry: metric key -> ordered samples. A BTreeMap keeps the
/// fallback key ordering deterministic, since JSON objects carry no ordering
/// guarantee.
pub type TelemetryRecord = BTreeMap<String, Vec<TelemetrySample>>;

/// Normalized, chart-ready sample aligned across the four energy channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub ts: i64,
    pub label: String,
    pub power_w: f64,
    pub voltage_v: f64,
    pub current_a: f64,
    pub energy_kwh: f64,
}

/// Preference order for choosing the base channel that drives iteration.
const BASE_CHANNEL_PREFERENCE: [&str; 4] = ["power", "energy", "voltage", "current"];

/// Convert raw per-key samples into an ordered sequence of chart-ready points.
///
/// The first non-empty channel in preference order (then the record's own key
/// order) becomes the base: its timestamps and ordering are preserved verbatim,
/// and the other channels are read at the same sample index. Values that do not
/// parse to a finite number, and channels missing a sample at the base index,
/// emit `0.0` - callers cannot distinguish a zero reading from a missing one.
pub fn normalize<F>(records: &TelemetryRecord, label_formatter: F) -> Vec<SeriesPoint>
where
    F: Fn(i64) -> String,
{
    let base_key = BASE_CHANNEL_PREFERENCE
        .iter()
        .copied()
        .find(|key| records.get(*key).is_some_and(|samples| !samples.is_empty()))
        .or_else(|| {
            records
                .iter()
                .find(|(_, samples)| !samples.is_empty())
                .map(|(key, _)| key.as_str())
        });

    let Some(base_key) = base_key else {
        return Vec::new();
    };

    let base = &records[base_key];
    base.iter()
        .enumerate()
        .map(|(idx, sample)| {
            let ts = sample.ts.unwrap_or_else(now_ms);
            let pick = |key: &str| {
                records
                    .get(key)
                    .and_then(|samples| samples.get(idx))
                    .map(|s| coerce_numeric(&s.value))
                    .unwrap_or(0.0)
            };

            SeriesPoint {
                ts,
                label: label_formatter(ts),
                power_w: pick("power"),
                voltage_v: pick("voltage"),
                current_a: pick("current"),
                energy_kwh: pick("energy"),
            }
        })
        .collect()
}

/// Parse a raw sample value, mapping anything non-finite to `0.0`.
pub fn coerce_numeric(value: &str) -> f64 {
    match value.trim().parse::<f64>() {
        Ok(num) if num.is_finite() => num,
        _ => 0.0,
    }
}

/// "14:05" style label for 24-hour views.
pub fn hour_minute_label(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// "Nov 14" style label for 30-day views.
pub fn month_day_label(ts: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ts)
        .map(|dt| dt.format("%b %d").to_string())
        .unwrap_or_default()
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn scalar_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    match raw {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected scalar telemetry value, got {other}"
        ))),
    }
}
