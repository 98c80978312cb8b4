//! Relationship Discoverer (§4.6): declared-FK import with bidirectional
//! materialization, then PK-match inference gated by orphan rate.

use std::collections::HashMap;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::models::{
    DataTypeFamily, DetectionMethod, EntityRelationship, OntologyEntity, ProgressCallback,
    ProgressEvent, RelationshipStatus, SchemaColumn, SchemaTable,
};
use crate::repository::TableRepository;
use crate::schema_discoverer::{DeclaredRelationshipType, SchemaDiscoverer};

use super::joinability::classify_joinability;

/// §4.6 DiscoverFK: imports every declared schema relationship into the
/// entity graph and runs the column-stats sweep that backs joinability.
pub async fn discover_fk(
    ontology_id: i64,
    entities: &[OntologyEntity],
    tables: &[SchemaTable],
    columns: &mut [SchemaColumn],
    discoverer: &dyn SchemaDiscoverer,
    table_repo: &dyn TableRepository,
) -> Result<Vec<EntityRelationship>, OntologyError> {
    let table_by_name: HashMap<(&str, &str), &SchemaTable> =
        tables.iter().map(|t| ((t.schema.as_str(), t.name.as_str()), t)).collect();
    let entity_by_table: HashMap<(&str, &str), &OntologyEntity> = entities
        .iter()
        .map(|e| ((e.primary_schema.as_str(), e.primary_table.as_str()), e))
        .collect();

    let declared = discoverer.list_relationships().await?;
    let mut relationships = Vec::new();

    for relationship in declared {
        let (Some(&source_table), Some(&target_table)) = (
            table_by_name.get(&(relationship.source_schema.as_str(), relationship.source_table.as_str())),
            table_by_name.get(&(relationship.target_schema.as_str(), relationship.target_table.as_str())),
        ) else {
            continue;
        };
        let (Some(source_column), Some(target_column)) = (
            columns
                .iter()
                .find(|c| c.table_id == source_table.id && c.name == relationship.source_column),
            columns
                .iter()
                .find(|c| c.table_id == target_table.id && c.name == relationship.target_column),
        ) else {
            continue;
        };

        let (Some(&source_entity), Some(&target_entity)) = (
            entity_by_table.get(&(source_table.schema.as_str(), source_table.name.as_str())),
            entity_by_table.get(&(target_table.schema.as_str(), target_table.name.as_str())),
        ) else {
            continue;
        };

        let method = match relationship.relationship_type {
            DeclaredRelationshipType::ForeignKey => DetectionMethod::ForeignKey,
            DeclaredRelationshipType::Manual => DetectionMethod::Manual,
        };

        let forward = EntityRelationship {
            id: 0,
            ontology_id,
            source_entity_id: source_entity.id,
            target_entity_id: target_entity.id,
            source_schema: source_table.schema.clone(),
            source_table: source_table.name.clone(),
            source_column: source_column.name.clone(),
            target_schema: target_table.schema.clone(),
            target_table: target_table.name.clone(),
            target_column: target_column.name.clone(),
            detection_method: method,
            confidence: 1.0,
            status: RelationshipStatus::Confirmed,
            description: None,
        };
        let reverse = forward.mirrored();
        relationships.push(forward);
        relationships.push(reverse);
    }

    run_column_stats_sweep(tables, columns, discoverer, table_repo).await?;

    Ok(relationships)
}

async fn run_column_stats_sweep(
    tables: &[SchemaTable],
    columns: &mut [SchemaColumn],
    discoverer: &dyn SchemaDiscoverer,
    table_repo: &dyn TableRepository,
) -> Result<(), OntologyError> {
    for table in tables.iter().filter(|t| t.is_selected) {
        let table_columns: Vec<usize> = columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.table_id == table.id)
            .map(|(idx, _)| idx)
            .collect();
        if table_columns.is_empty() {
            continue;
        }

        let column_names: Vec<String> =
            table_columns.iter().map(|&idx| columns[idx].name.clone()).collect();
        let stats =
            discoverer.analyze_column_stats(&table.schema, &table.name, &column_names).await?;
        let stats_by_name: HashMap<&str, _> =
            stats.iter().map(|s| (s.column_name.as_str(), s)).collect();

        for idx in table_columns {
            let family = DataTypeFamily::from_raw_type(&columns[idx].data_type);
            let stats = stats_by_name.get(columns[idx].name.as_str()).copied();
            let (is_joinable, reason) =
                classify_joinability(&columns[idx], family, stats, table.row_count);
            columns[idx].is_joinable = Some(is_joinable);
            columns[idx].joinability_reason = Some(reason.to_string());
            table_repo.update_column_joinability(columns[idx].id, is_joinable, reason).await?;
        }
    }

    Ok(())
}

const NAME_EXCLUDED_SUFFIXES: &[&str] =
    &["status", "type", "flag", "count", "amount", "rating", "score", "level"];
const NAME_EXCLUDED_PREFIXES: &[&str] = &["is_", "has_"];

fn is_name_excluded(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    NAME_EXCLUDED_SUFFIXES.iter().any(|s| lower.ends_with(s))
        || NAME_EXCLUDED_PREFIXES.iter().any(|p| lower.starts_with(p))
}

fn is_likely_fk_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.ends_with("_id") || lower.ends_with("_uuid") || lower.ends_with("_key")
}

struct EntityRefColumn<'a> {
    entity: &'a OntologyEntity,
    table: &'a SchemaTable,
    column: &'a SchemaColumn,
    family: DataTypeFamily,
}

struct CandidateSourceColumn<'a> {
    table: &'a SchemaTable,
    column: &'a SchemaColumn,
    family: DataTypeFamily,
}

/// §4.6 DiscoverPKMatch: infers undeclared join relationships from live data.
pub async fn discover_pk_match(
    ontology_id: i64,
    entities: &[OntologyEntity],
    tables: &[SchemaTable],
    columns: &[SchemaColumn],
    discoverer: &dyn SchemaDiscoverer,
    config: &PipelineConfig,
    on_progress: Option<ProgressCallback>,
) -> Result<Vec<EntityRelationship>, OntologyError> {
    let table_by_id: HashMap<i64, &SchemaTable> = tables.iter().map(|t| (t.id, t)).collect();
    let entity_by_table: HashMap<(&str, &str), &OntologyEntity> = entities
        .iter()
        .map(|e| ((e.primary_schema.as_str(), e.primary_table.as_str()), e))
        .collect();

    let entity_ref_columns: Vec<EntityRefColumn> = columns
        .iter()
        .filter_map(|c| {
            let table = table_by_id.get(&c.table_id)?;
            let entity = entity_by_table.get(&(table.schema.as_str(), table.name.as_str()))?;
            let family = DataTypeFamily::from_raw_type(&c.data_type);

            let qualifies = c.is_pk
                || c.is_unique
                || c.has_fk_like_name()
                || c.distinct_count.map(|d| d >= config.pk_match_min_distinct).unwrap_or(false);
            if !qualifies {
                return None;
            }
            if family.is_type_excluded_for_joining() {
                return None;
            }
            if is_name_excluded(&c.name) {
                return None;
            }

            Some(EntityRefColumn { entity, table, column: c, family })
        })
        .collect();

    let candidate_source_columns: Vec<CandidateSourceColumn> = columns
        .iter()
        .filter(|c| table_by_id.get(&c.table_id).map(|t| t.is_selected).unwrap_or(false))
        .filter_map(|c| {
            let table = table_by_id[&c.table_id];
            let family = DataTypeFamily::from_raw_type(&c.data_type);

            if family.is_type_excluded_for_joining() {
                return None;
            }
            if is_name_excluded(&c.name) {
                return None;
            }
            if c.is_joinable != Some(true) {
                return None;
            }
            let Some(distinct) = c.distinct_count.filter(|d| *d >= config.pk_match_min_distinct)
            else {
                return None;
            };

            if !is_likely_fk_name(&c.name) {
                let cardinality = c.cardinality(table.row_count).unwrap_or(0.0);
                if cardinality < config.pk_match_min_ratio {
                    return None;
                }
            }
            let _ = distinct;

            Some(CandidateSourceColumn { table, column: c, family })
        })
        .collect();

    let total = entity_ref_columns.len();
    if let Some(cb) = &on_progress {
        cb(ProgressEvent::new(0, total, format!("scanning {total} entity-reference column(s)")));
    }

    let mut relationships = Vec::new();
    for (processed, entity_ref) in entity_ref_columns.iter().enumerate() {
        for candidate in
            candidate_source_columns.iter().filter(|c| c.family == entity_ref.family)
        {
            if candidate.table.id == entity_ref.table.id {
                continue;
            }
            if candidate.column.is_pk && entity_ref.column.is_pk {
                continue;
            }

            let join_stats = discoverer
                .analyze_join(
                    &candidate.table.schema,
                    &candidate.table.name,
                    &candidate.column.name,
                    &entity_ref.table.schema,
                    &entity_ref.table.name,
                    &entity_ref.column.name,
                )
                .await?;

            if join_stats.orphan_count != 0 {
                continue;
            }
            if let Some(max_value) = join_stats.max_source_value {
                // `source_matched` (matched source rows) stands in for "the
                // target has more than 10 distinct rows" here: the §6
                // `AnalyzeJoin` contract exposes no target-distinct count,
                // and with orphan_count == 0 already enforced above every
                // matched source row implies a present target row, so a
                // source side bigger than 10 rows is evidence the target
                // has more than 10 distinct values too. Still an
                // approximation — a source with >10 rows all matching the
                // same handful of target values would under-reject here.
                if max_value <= 10 && join_stats.source_matched > 10 {
                    continue;
                }
            }
            let ref_cardinality =
                entity_ref.column.cardinality(entity_ref.table.row_count).unwrap_or(0.0);
            if ref_cardinality < 0.01 {
                continue;
            }

            let source_entity = entity_by_table
                .get(&(candidate.table.schema.as_str(), candidate.table.name.as_str()));
            let Some(&source_entity) = source_entity else { continue };

            let forward = EntityRelationship {
                id: 0,
                ontology_id,
                source_entity_id: source_entity.id,
                target_entity_id: entity_ref.entity.id,
                source_schema: candidate.table.schema.clone(),
                source_table: candidate.table.name.clone(),
                source_column: candidate.column.name.clone(),
                target_schema: entity_ref.table.schema.clone(),
                target_table: entity_ref.table.name.clone(),
                target_column: entity_ref.column.name.clone(),
                detection_method: DetectionMethod::PkMatch,
                confidence: 0.9,
                status: RelationshipStatus::Confirmed,
                description: None,
            };
            let reverse = forward.mirrored();
            relationships.push(forward);
            relationships.push(reverse);
        }

        if let Some(cb) = &on_progress {
            cb(ProgressEvent::new(
                processed + 1,
                total,
                format!("scanned {}/{total}", processed + 1),
            ));
        }
    }

    Ok(relationships)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rating_like_names_are_excluded() {
        assert!(is_name_excluded("rating"));
        assert!(is_name_excluded("product_rating"));
        assert!(is_name_excluded("is_active"));
        assert!(!is_name_excluded("visitor_id"));
    }

    #[test]
    fn fk_like_names_bypass_the_cardinality_ratio_check() {
        assert!(is_likely_fk_name("user_id"));
        assert!(is_likely_fk_name("session_uuid"));
        assert!(!is_likely_fk_name("rating"));
    }
}
