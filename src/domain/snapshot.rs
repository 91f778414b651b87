// Dashboard snapshot - the composed response of one aggregation pass
use super::alarm::Alarm;
use super::device::Device;
use super::telemetry::{SeriesPoint, TelemetryRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub devices: Vec<Device>,
    pub alarms: Vec<Alarm>,
    pub latest: Option<TelemetryRecord>,
    pub history: Vec<SeriesPoint>,
    #[serde(rename = "history30d")]
    pub history_30d: Vec<SeriesPoint>,
}
