//! Phase 1: deterministic column profiling (§4.1). No LLM calls here.

mod routing;

pub use routing::route_classification_path;

use std::collections::HashMap;

use crate::config::PipelineConfig;
use crate::models::{ColumnDataProfile, ProgressCallback, ProgressEvent, SchemaColumn, SchemaTable};
use crate::patterns::detect_patterns;

/// Runs the Profiler over a selected subset of tables/columns and returns
/// one `ColumnDataProfile` per selected column, in table order.
pub fn profile_columns(
    tables: &[SchemaTable],
    columns: &[SchemaColumn],
    config: &PipelineConfig,
    on_progress: Option<ProgressCallback>,
) -> Vec<ColumnDataProfile> {
    let table_by_id: HashMap<i64, &SchemaTable> = tables.iter().map(|t| (t.id, t)).collect();

    let selected_columns: Vec<&SchemaColumn> = columns
        .iter()
        .filter(|c| table_by_id.get(&c.table_id).map(|t| t.is_selected).unwrap_or(false))
        .collect();

    let total = selected_columns.len();
    if total == 0 {
        if let Some(cb) = &on_progress {
            cb(ProgressEvent::new(0, 0, "no selected columns to profile"));
        }
        return Vec::new();
    }

    if let Some(cb) = &on_progress {
        cb(ProgressEvent::new(0, total, format!("profiling {total} column(s)")));
    }

    let mut profiles = Vec::with_capacity(total);
    for (idx, column) in selected_columns.into_iter().enumerate() {
        let table = table_by_id[&column.table_id];
        let profile = profile_one_column(table, column, config);
        profiles.push(profile);

        if let Some(cb) = &on_progress {
            cb(ProgressEvent::new(idx + 1, total, format!("profiled {}/{total}", idx + 1)));
        }
    }

    if let Some(cb) = &on_progress {
        cb(ProgressEvent::new(total, total, format!("profiling complete: {total} column(s)")));
    }

    profiles
}

fn profile_one_column(
    table: &SchemaTable,
    column: &SchemaColumn,
    config: &PipelineConfig,
) -> ColumnDataProfile {
    let data_type_family = crate::models::DataTypeFamily::from_raw_type(&column.data_type);
    let null_rate = column.null_rate(table.row_count);
    let cardinality = column.cardinality(table.row_count);
    let detected_patterns = detect_patterns(&column.sample_values);

    let classification_path = routing::route_classification_path(
        data_type_family,
        column,
        &detected_patterns,
        cardinality,
        config,
    );

    ColumnDataProfile {
        column: column.clone(),
        table_id: table.id,
        table_schema: table.schema.clone(),
        table_name: table.name.clone(),
        row_count: table.row_count,
        data_type_family,
        null_rate,
        cardinality,
        detected_patterns,
        classification_path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SchemaColumn;

    fn table(row_count: Option<i64>) -> SchemaTable {
        SchemaTable { id: 1, schema: "public".into(), name: "orders".into(), row_count, is_selected: true }
    }

    fn column(data_type: &str, samples: Vec<&str>) -> SchemaColumn {
        SchemaColumn {
            id: 1,
            table_id: 1,
            name: "col".into(),
            data_type: data_type.into(),
            is_pk: false,
            is_unique: false,
            is_nullable: true,
            sample_values: samples.into_iter().map(String::from).collect(),
            distinct_count: None,
            null_count: None,
            min_length: None,
            max_length: None,
            is_joinable: None,
            joinability_reason: None,
        }
    }

    #[test]
    fn zero_selected_columns_yields_empty_profile_and_reports_once() {
        let calls = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let calls_clone = calls.clone();
        let on_progress: ProgressCallback =
            std::sync::Arc::new(move |e| calls_clone.lock().unwrap().push((e.completed, e.total)));

        let profiles = profile_columns(&[], &[], &PipelineConfig::default(), Some(on_progress));
        assert!(profiles.is_empty());
        assert_eq!(*calls.lock().unwrap(), vec![(0, 0)]);
    }

    #[test]
    fn zero_row_count_leaves_derived_stats_undefined() {
        let t = table(Some(0));
        let c = column("varchar", vec![]);
        let profile = profile_one_column(&t, &c, &PipelineConfig::default());
        assert!(profile.null_rate.is_none());
        assert!(profile.cardinality.is_none());
    }
}
