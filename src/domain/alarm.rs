// Alarm domain model - read-only projection of upstream alarm records
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmSeverity {
    Critical,
    Major,
    Minor,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmStatus {
    ActiveUnack,
    ActiveAck,
    ClearedAck,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: String,
    pub device_id: String,
    pub severity: AlarmSeverity,
    #[serde(rename = "type")]
    pub alarm_type: String,
    pub status: AlarmStatus,
    pub created_time_ts: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
