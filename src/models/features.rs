//! Final per-column classification record, built by Phase 2 and mutated in
//! place by Phases 3-5 (§3, §4.2-§4.5).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::profile::ClassificationPath;

/// The business role a column plays, independent of its storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Pk,
    ForeignKey,
    Measure,
    Attribute,
}

/// A finer-grained tag than `ClassificationPath`, assigned or revised by the
/// classifiers and the cross-column reconciler (e.g. `soft_delete` vs.
/// `event_time` for two timestamps that share a `ClassificationPath`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SemanticType {
    AuditCreated,
    AuditUpdated,
    SoftDelete,
    EventTime,
    ScheduledTime,
    Expiration,
    Cursor,
    Boolean,
    Enum,
    Identifier,
    Numeric,
    Monetary,
    Text,
    Json,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampPurpose {
    AuditCreated,
    AuditUpdated,
    SoftDelete,
    EventTime,
    ScheduledTime,
    Expiration,
    Cursor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimestampFeatures {
    pub purpose: Option<TimestampPurpose>,
    pub is_soft_delete: bool,
    pub is_audit_field: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BooleanFeatures {
    pub true_meaning: Option<String>,
    pub false_meaning: Option<String>,
    pub boolean_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnumValueCategory {
    Initial,
    InProgress,
    Terminal,
    TerminalSuccess,
    TerminalError,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumValueLabel {
    pub value: String,
    pub label: String,
    pub category: Option<EnumValueCategory>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnumFeatures {
    pub is_state_machine: bool,
    pub state_description: Option<String>,
    #[serde(default)]
    pub values: Vec<EnumValueLabel>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifierFeatures {
    /// `uuid_primary_key | foreign_key | external_reference | opaque_token`,
    /// as labelled by the UUID classifier (§4.2).
    pub identifier_type: Option<String>,
    pub entity_referenced: Option<String>,
    pub external_service: Option<String>,
    pub fk_target_table: Option<String>,
    pub fk_target_column: Option<String>,
    pub fk_resolution_method: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyUnit {
    Cents,
    Dollars,
    BasisPoints,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonetaryFeatures {
    pub is_monetary: bool,
    pub currency_unit: Option<CurrencyUnit>,
    pub paired_currency_column: Option<String>,
    pub amount_description: Option<String>,
}

/// The final per-column classification. One exists per selected column once
/// Phase 2 runs successfully for it; Phases 3-5 mutate it in place and clear
/// their respective `needs_*` flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnFeatures {
    pub column_id: i64,
    pub table_id: i64,
    pub classification_path: ClassificationPath,
    pub purpose: Option<String>,
    pub semantic_type: SemanticType,
    pub role: ColumnRole,
    pub description: String,
    pub confidence: f64,

    #[serde(default)]
    pub timestamp_features: TimestampFeatures,
    #[serde(default)]
    pub boolean_features: BooleanFeatures,
    #[serde(default)]
    pub enum_features: EnumFeatures,
    #[serde(default)]
    pub identifier_features: IdentifierFeatures,
    #[serde(default)]
    pub monetary_features: MonetaryFeatures,

    pub needs_enum_check: bool,
    pub needs_fk_check: bool,
    pub needs_cross_column_check: bool,

    pub analyzed_at: DateTime<Utc>,
    pub model_used: Option<String>,
}

impl ColumnFeatures {
    /// §4.8: all three follow-up flags must be false before publication.
    pub fn is_publishable(&self) -> bool {
        !self.needs_enum_check && !self.needs_fk_check && !self.needs_cross_column_check
    }
}
