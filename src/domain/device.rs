// Device domain model and liveness derivation
use serde::{Deserialize, Serialize};

/// A device is considered online if it reported activity within this window.
pub const LIVENESS_WINDOW_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    Online,
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_title: Option<String>,
    pub status: DeviceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_ts: Option<i64>,
}

/// Resolve a device's status. An explicit upstream status is authoritative;
/// otherwise freshness of the last activity timestamp decides. A missing
/// timestamp reads as offline.
pub fn derive_status(
    explicit: Option<DeviceStatus>,
    last_activity_ts: Option<i64>,
    now_ms: i64,
) -> DeviceStatus {
    if let Some(status) = explicit {
        return status;
    }
    match last_activity_ts {
        Some(ts) if now_ms - ts < LIVENESS_WINDOW_MS => DeviceStatus::Online,
        _ => DeviceStatus::Offline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn test_recent_activity_is_online() {
        let four_min_ago = NOW - 4 * 60 * 1000;
        assert_eq!(
            derive_status(None, Some(four_min_ago), NOW),
            DeviceStatus::Online
        );
    }

    #[test]
    fn test_stale_activity_is_offline() {
        let six_min_ago = NOW - 6 * 60 * 1000;
        assert_eq!(
            derive_status(None, Some(six_min_ago), NOW),
            DeviceStatus::Offline
        );
    }

    #[test]
    fn test_explicit_status_wins() {
        let six_min_ago = NOW - 6 * 60 * 1000;
        assert_eq!(
            derive_status(Some(DeviceStatus::Online), Some(six_min_ago), NOW),
            DeviceStatus::Online
        );
        let just_now = NOW - 1000;
        assert_eq!(
            derive_status(Some(DeviceStatus::Offline), Some(just_now), NOW),
            DeviceStatus::Offline
        );
    }

    #[test]
    fn test_missing_timestamp_is_offline() {
        assert_eq!(derive_status(None, None, NOW), DeviceStatus::Offline);
    }

    #[test]
    fn test_window_boundary_is_offline() {
        let exactly_five_min = NOW - LIVENESS_WINDOW_MS;
        assert_eq!(
            derive_status(None, Some(exactly_five_min), NOW),
            DeviceStatus::Offline
        );
    }
}
