//! Shared prompt-building helpers. Every classifier supplies the model with
//! data signals only — table/column name is included as context, never as
//! the basis for the decision (§4.2).

use crate::models::ColumnDataProfile;

pub const SYSTEM_PROMPT: &str = "You are a database schema analyst. You classify a single \
column of a relational table from its data type and sampled values only. Respond with a \
single JSON object matching the requested schema, with no prose before or after it.";

/// Renders the shared data-signal block every classifier prompt opens with.
pub fn column_context(profile: &ColumnDataProfile) -> String {
    let samples: Vec<&str> = profile.column.sample_values.iter().take(20).map(String::as_str).collect();
    format!(
        "Table: {}.{}\nColumn: {} (declared type: {})\nNullable: {}\nDistinct count: {}\nNull rate: {}\nCardinality: {}\nSample values: {:?}\nDetected patterns: {:?}",
        profile.table_schema,
        profile.table_name,
        profile.column.name,
        profile.column.data_type,
        profile.column.is_nullable,
        profile.column.distinct_count.map(|v| v.to_string()).unwrap_or_else(|| "unknown".into()),
        profile.null_rate.map(|v| format!("{v:.4}")).unwrap_or_else(|| "unknown".into()),
        profile.cardinality.map(|v| format!("{v:.4}")).unwrap_or_else(|| "unknown".into()),
        samples,
        profile.detected_patterns.iter().map(|p| p.pattern_name).collect::<Vec<_>>(),
    )
}
