//! Phase-1 (Profiler) output: transient per-column profiles that route each
//! column to a classifier and are never persisted on their own.

use serde::{Deserialize, Serialize};

use super::schema::{DataTypeFamily, SchemaColumn};

/// A named regex that matched at least one sample value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPattern {
    pub pattern_name: &'static str,
    /// Fraction of sample values that matched, in `[0, 1]`.
    pub match_rate: f64,
    /// Up to 5 matching examples, a subset of the column's `sample_values`.
    pub matched_values: Vec<String>,
}

/// The deterministic category a column is routed to, purely from data type
/// and detected patterns (§4.1) — never from the column's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationPath {
    Timestamp,
    Boolean,
    Enum,
    Uuid,
    ExternalId,
    Numeric,
    Text,
    Json,
    Unknown,
}

/// Transient Phase-1 record: all `SchemaColumn` fields plus derived
/// statistics and the classification routing decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDataProfile {
    pub column: SchemaColumn,
    pub table_id: i64,
    pub table_schema: String,
    pub table_name: String,
    pub row_count: Option<i64>,
    pub data_type_family: DataTypeFamily,
    /// `null_count / row_count`; undefined (not zero) when either count is
    /// missing.
    pub null_rate: Option<f64>,
    /// `distinct_count / row_count`; undefined when either count is missing.
    pub cardinality: Option<f64>,
    pub detected_patterns: Vec<DetectedPattern>,
    pub classification_path: ClassificationPath,
}

impl ColumnDataProfile {
    pub fn pattern(&self, name: &str) -> Option<&DetectedPattern> {
        self.detected_patterns.iter().find(|p| p.pattern_name == name)
    }

    pub fn pattern_match_rate(&self, name: &str) -> f64 {
        self.pattern(name).map(|p| p.match_rate).unwrap_or(0.0)
    }

    pub fn column_id(&self) -> i64 {
        self.column.id
    }
}
