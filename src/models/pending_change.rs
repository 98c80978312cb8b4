//! Data-drift observations emitted by the Data-Change Scanner (§4.7).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    NewEnumValue,
    NewFkPattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Pending,
    Accepted,
    Rejected,
}

/// A single data-drift observation awaiting review. All emitted changes
/// carry `status = Pending` (§4.7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingChange {
    pub id: i64,
    pub change_type: ChangeType,
    pub change_source: String,
    pub table_id: i64,
    pub column_id: i64,
    pub old_value: Option<Value>,
    pub new_value: Value,
    pub suggested_action: String,
    pub suggested_payload: Value,
    pub status: ChangeStatus,
    pub detected_at: DateTime<Utc>,
}
