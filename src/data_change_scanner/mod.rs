//! Data-Change Scanner (§4.7): re-profiles sampled values against stored
//! metadata and surfaces drift as `PendingChange` records.

mod inflection;
mod scheduled;

pub use scheduled::{run_periodic_scan, ScheduledScanHandle};

use serde_json::json;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::models::{
    ChangeStatus, ChangeType, ColumnFeatures, DataTypeFamily, PendingChange, SchemaColumn,
    SchemaTable,
};
use crate::schema_discoverer::SchemaDiscoverer;

/// §4.7 new-enum detection. String columns only.
pub async fn scan_for_enum_changes(
    table: &SchemaTable,
    column: &SchemaColumn,
    stored_features: Option<&ColumnFeatures>,
    discoverer: &dyn SchemaDiscoverer,
    config: &PipelineConfig,
) -> Result<Option<PendingChange>, OntologyError> {
    if DataTypeFamily::from_raw_type(&column.data_type) != DataTypeFamily::Text {
        return Ok(None);
    }

    let observed = discoverer
        .get_distinct_values(
            &table.schema,
            &table.name,
            &column.name,
            config.max_distinct_values_for_enum + 1,
        )
        .await?;

    if observed.len() as u32 > config.max_distinct_values_for_enum {
        return Ok(None);
    }
    if observed.iter().any(|v| v.len() as u32 > config.max_enum_value_length) {
        return Ok(None);
    }

    match stored_features.filter(|f| !f.enum_features.values.is_empty()) {
        Some(features) => {
            let stored: Vec<&str> =
                features.enum_features.values.iter().map(|v| v.value.as_str()).collect();
            let new_values: Vec<&str> =
                observed.iter().map(String::as_str).filter(|v| !stored.contains(v)).collect();
            if new_values.is_empty() {
                return Ok(None);
            }

            Ok(Some(build_pending_change(
                table,
                column,
                ChangeType::NewEnumValue,
                "data_change_scanner",
                Some(json!({ "values": stored })),
                json!({ "new_values": new_values, "all_values": observed }),
                "review new enum value(s)",
            )))
        }
        None => {
            if observed.len() >= 2 && observed.len() <= 50 {
                Ok(Some(build_pending_change(
                    table,
                    column,
                    ChangeType::NewEnumValue,
                    "data_change_scanner",
                    None,
                    json!({ "new_values": observed, "all_values": observed }),
                    "classify as enum",
                )))
            } else {
                Ok(None)
            }
        }
    }
}

/// §4.7 FK-pattern detection.
pub async fn scan_for_fk_pattern(
    table: &SchemaTable,
    column: &SchemaColumn,
    stored_features: Option<&ColumnFeatures>,
    all_tables: &[SchemaTable],
    all_columns: &[SchemaColumn],
    discoverer: &dyn SchemaDiscoverer,
    config: &PipelineConfig,
) -> Result<Option<PendingChange>, OntologyError> {
    if column.is_pk {
        return Ok(None);
    }

    let is_identifier_candidate = match stored_features {
        Some(f) => f.semantic_type == crate::models::SemanticType::Identifier,
        None => column.name.to_ascii_lowercase().ends_with("_id"),
    };
    if !is_identifier_candidate {
        return Ok(None);
    }

    let target_table_name = match stored_features.and_then(|f| f.identifier_features.fk_target_table.clone())
    {
        Some(name) => name,
        None => {
            let Some(stem) = column.name.to_ascii_lowercase().strip_suffix("_id").map(String::from)
            else {
                return Ok(None);
            };
            let singular = inflection::singularize(&stem);
            let plural = inflection::pluralize(&singular);
            match all_tables.iter().find(|t| t.name.eq_ignore_ascii_case(&plural)) {
                Some(t) => t.name.clone(),
                None => match all_tables.iter().find(|t| t.name.eq_ignore_ascii_case(&singular)) {
                    Some(t) => t.name.clone(),
                    None => return Ok(None),
                },
            }
        }
    };

    let Some(target_table) = all_tables.iter().find(|t| t.name == target_table_name) else {
        return Ok(None);
    };
    if target_table.id == table.id {
        return Ok(None);
    }

    // §4.7: target PK column by stored FK metadata, else the table's PK,
    // else a column named "id".
    let target_column_name = stored_features
        .and_then(|f| f.identifier_features.fk_target_column.clone())
        .or_else(|| {
            all_columns
                .iter()
                .find(|c| c.table_id == target_table.id && c.is_pk)
                .map(|c| c.name.clone())
        })
        .unwrap_or_else(|| "id".to_string());

    let overlap = discoverer
        .check_value_overlap(
            &table.schema,
            &table.name,
            &column.name,
            &target_table.schema,
            &target_table.name,
            &target_column_name,
            1000,
        )
        .await?;

    if overlap.match_rate < config.min_match_rate_for_fk {
        return Ok(None);
    }

    Ok(Some(build_pending_change(
        table,
        column,
        ChangeType::NewFkPattern,
        "data_change_scanner",
        None,
        json!({
            "target_table": target_table.name,
            "target_column": target_column_name,
            "match_rate": overlap.match_rate,
            "matched_count": overlap.matched_count,
            "source_distinct": overlap.source_distinct,
            "target_distinct": overlap.target_distinct,
        }),
        "review suggested foreign key",
    )))
}

/// Runs both detectors (§4.7) over every selected column of every selected
/// table, optionally narrowed to `table_names`, and persists whatever
/// `PendingChange` records surface. This is the entry point an embedding
/// scheduler (or [`run_periodic_scan`]) calls once per scan.
pub async fn scan_datasource(
    datasource_id: i64,
    table_names: Option<&[String]>,
    table_repo: &dyn crate::repository::TableRepository,
    feature_repo: &dyn crate::repository::ColumnFeatureRepository,
    pending_repo: &dyn crate::repository::PendingChangeRepository,
    discoverer: &dyn SchemaDiscoverer,
    config: &PipelineConfig,
) -> Result<Vec<PendingChange>, OntologyError> {
    let all_tables = table_repo.list_tables_by_datasource(datasource_id, true).await?;
    let tables: Vec<&SchemaTable> = all_tables
        .iter()
        .filter(|t| table_names.map(|names| names.iter().any(|n| n == &t.name)).unwrap_or(true))
        .collect();

    // Fetch columns for every selected table, not just the ones in scope for
    // this scan, so FK-pattern target-PK lookups (§4.7) can resolve across
    // the whole schema regardless of `table_names` narrowing.
    let all_table_ids: Vec<i64> = all_tables.iter().map(|t| t.id).collect();
    let all_columns = table_repo.get_columns_by_tables(&all_table_ids).await?;

    let mut changes = Vec::new();
    for table in tables.iter().copied() {
        let columns = all_columns.iter().filter(|c| c.table_id == table.id);
        for column in columns {
            let stored_features = feature_repo.get(column.id).await?;

            if let Some(change) = scan_for_enum_changes(
                table,
                column,
                stored_features.as_ref(),
                discoverer,
                config,
            )
            .await?
            {
                changes.push(change);
            }

            if let Some(change) = scan_for_fk_pattern(
                table,
                column,
                stored_features.as_ref(),
                &all_tables,
                &all_columns,
                discoverer,
                config,
            )
            .await?
            {
                changes.push(change);
            }
        }
    }

    if !changes.is_empty() {
        pending_repo.create_batch(changes.clone()).await?;
    }

    Ok(changes)
}

#[allow(clippy::too_many_arguments)]
fn build_pending_change(
    table: &SchemaTable,
    column: &SchemaColumn,
    change_type: ChangeType,
    change_source: &str,
    old_value: Option<serde_json::Value>,
    new_value: serde_json::Value,
    suggested_action: &str,
) -> PendingChange {
    PendingChange {
        id: 0,
        change_type,
        change_source: change_source.to_string(),
        table_id: table.id,
        column_id: column.id,
        old_value,
        new_value: new_value.clone(),
        suggested_action: suggested_action.to_string(),
        suggested_payload: new_value,
        status: ChangeStatus::Pending,
        detected_at: chrono::Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepositories;
    use crate::schema_discoverer::{ColumnStats, DeclaredRelationship, JoinStats, ValueOverlap};
    use async_trait::async_trait;

    #[test]
    fn strips_id_suffix_and_pluralizes_for_table_guess() {
        let stem = "category".to_string();
        assert_eq!(inflection::pluralize(&stem), "categories");
        assert_eq!(inflection::singularize("categories"), "category");
    }

    struct FakeDiscoverer {
        distinct_values: Vec<String>,
    }

    #[async_trait]
    impl SchemaDiscoverer for FakeDiscoverer {
        async fn list_tables(&self, _selected_only: bool) -> Result<Vec<SchemaTable>, OntologyError> {
            unimplemented!()
        }

        async fn list_columns(&self) -> Result<Vec<SchemaColumn>, OntologyError> {
            unimplemented!()
        }

        async fn list_relationships(&self) -> Result<Vec<DeclaredRelationship>, OntologyError> {
            unimplemented!()
        }

        async fn check_value_overlap(
            &self,
            _src_schema: &str,
            _src_table: &str,
            _src_col: &str,
            _tgt_schema: &str,
            _tgt_table: &str,
            _tgt_col: &str,
            _sample_n: u32,
        ) -> Result<ValueOverlap, OntologyError> {
            Ok(ValueOverlap::default())
        }

        async fn analyze_join(
            &self,
            _src_schema: &str,
            _src_table: &str,
            _src_col: &str,
            _tgt_schema: &str,
            _tgt_table: &str,
            _tgt_col: &str,
        ) -> Result<JoinStats, OntologyError> {
            unimplemented!()
        }

        async fn analyze_column_stats(
            &self,
            _schema: &str,
            _table: &str,
            _columns: &[String],
        ) -> Result<Vec<ColumnStats>, OntologyError> {
            unimplemented!()
        }

        async fn get_distinct_values(
            &self,
            _schema: &str,
            _table: &str,
            _column: &str,
            _limit: u32,
        ) -> Result<Vec<String>, OntologyError> {
            Ok(self.distinct_values.clone())
        }

        async fn get_primary_key_columns(
            &self,
            _schema: &str,
            _table: &str,
        ) -> Result<Vec<String>, OntologyError> {
            unimplemented!()
        }
    }

    fn orders_status_feature() -> ColumnFeatures {
        ColumnFeatures {
            column_id: 1,
            table_id: 1,
            classification_path: crate::models::ClassificationPath::Enum,
            purpose: None,
            semantic_type: crate::models::SemanticType::Enum,
            role: crate::models::ColumnRole::Attribute,
            description: String::new(),
            confidence: 0.9,
            timestamp_features: Default::default(),
            boolean_features: Default::default(),
            enum_features: crate::models::EnumFeatures {
                is_state_machine: true,
                state_description: None,
                values: vec![
                    crate::models::EnumValueLabel {
                        value: "pending".into(),
                        label: "Pending".into(),
                        category: Some(crate::models::EnumValueCategory::Initial),
                    },
                    crate::models::EnumValueLabel {
                        value: "completed".into(),
                        label: "Completed".into(),
                        category: Some(crate::models::EnumValueCategory::TerminalSuccess),
                    },
                ],
            },
            identifier_features: Default::default(),
            monetary_features: Default::default(),
            needs_enum_check: false,
            needs_fk_check: false,
            needs_cross_column_check: false,
            analyzed_at: chrono::Utc::now(),
            model_used: None,
        }
    }

    /// Scenario 6 (§8): a new "refunded" value shows up in live data that
    /// isn't in the stored enum metadata.
    #[tokio::test]
    async fn scan_detects_one_new_enum_value() {
        let repos = InMemoryRepositories::new();
        *repos.tables.lock().unwrap() = vec![SchemaTable {
            id: 1,
            schema: "public".into(),
            name: "orders".into(),
            row_count: Some(1000),
            is_selected: true,
        }];
        *repos.columns.lock().unwrap() = vec![SchemaColumn {
            id: 1,
            table_id: 1,
            name: "status".into(),
            data_type: "text".into(),
            is_pk: false,
            is_unique: false,
            is_nullable: false,
            sample_values: vec![],
            distinct_count: Some(3),
            null_count: Some(0),
            min_length: None,
            max_length: None,
            is_joinable: Some(false),
            joinability_reason: Some("type_excluded".into()),
        }];
        repos.features.lock().unwrap().insert(1, orders_status_feature());

        let discoverer = FakeDiscoverer {
            distinct_values: vec!["pending".into(), "completed".into(), "refunded".into()],
        };
        let config = PipelineConfig::default();

        let changes = scan_datasource(1, None, &repos, &repos, &repos, &discoverer, &config)
            .await
            .unwrap();

        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.change_type, ChangeType::NewEnumValue);
        assert_eq!(change.status, ChangeStatus::Pending);
        assert_eq!(change.new_value["new_values"], serde_json::json!(["refunded"]));
        let all_values = change.new_value["all_values"].as_array().unwrap();
        assert_eq!(all_values.len(), 3);

        let persisted = repos.pending_changes.lock().unwrap();
        assert_eq!(persisted.len(), 1);
    }

    /// Re-running the scan with unchanged live data must not surface the
    /// same observation again (§8 "Round-trip / idempotence").
    #[tokio::test]
    async fn rescan_with_no_drift_emits_nothing() {
        let repos = InMemoryRepositories::new();
        *repos.tables.lock().unwrap() = vec![SchemaTable {
            id: 1,
            schema: "public".into(),
            name: "orders".into(),
            row_count: Some(1000),
            is_selected: true,
        }];
        *repos.columns.lock().unwrap() = vec![SchemaColumn {
            id: 1,
            table_id: 1,
            name: "status".into(),
            data_type: "text".into(),
            is_pk: false,
            is_unique: false,
            is_nullable: false,
            sample_values: vec![],
            distinct_count: Some(2),
            null_count: Some(0),
            min_length: None,
            max_length: None,
            is_joinable: Some(false),
            joinability_reason: Some("type_excluded".into()),
        }];
        repos.features.lock().unwrap().insert(1, orders_status_feature());

        let discoverer =
            FakeDiscoverer { distinct_values: vec!["pending".into(), "completed".into()] };
        let config = PipelineConfig::default();

        let changes = scan_datasource(1, None, &repos, &repos, &repos, &discoverer, &config)
            .await
            .unwrap();

        assert!(changes.is_empty());
    }
}
