//! Phase 4: foreign-key resolution via data-overlap evidence, with an
//! LLM-assisted tiebreak and a gated name-only fallback (§4.4).

use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::{parse_json_envelope, LlmClient};
use crate::models::{ColumnFeatures, SchemaColumn, SchemaTable};
use crate::schema_discoverer::SchemaDiscoverer;

const SYSTEM_PROMPT: &str = "You are a database schema analyst. You choose the correct \
foreign-key target among ranked candidates backed by data-overlap evidence. Respond with a \
single JSON object matching the requested schema, with no prose before or after it.";

/// Confidence ceiling for the degraded, name-only fallback (§4.4, §9): always
/// strictly below the 0.9 single-candidate data-overlap acceptance floor.
pub const NAME_ONLY_CONFIDENCE_CAP: f64 = 0.5;

pub struct FkResolution {
    pub column_id: i64,
    pub target_table: String,
    pub target_column: String,
    pub method: &'static str,
    pub confidence: f64,
}

struct RankedCandidate<'a> {
    table: &'a SchemaTable,
    column: &'a SchemaColumn,
    match_rate: f64,
    matched_count: i64,
    target_distinct: i64,
}

#[derive(Deserialize)]
struct FkChoiceResponse {
    target_table: String,
    target_column: String,
    confidence: f64,
    #[allow(dead_code)]
    reasoning: String,
}

/// Resolves one flagged source column. `discoverer = None` models the
/// degraded path of §4.4 (no live datasource handle): only reachable when
/// `config.allow_name_only_fk` is set, and capped at
/// [`NAME_ONLY_CONFIDENCE_CAP`].
pub async fn resolve_fk(
    source_table: &SchemaTable,
    source_column: &SchemaColumn,
    all_tables: &[SchemaTable],
    all_columns: &[SchemaColumn],
    discoverer: Option<&dyn SchemaDiscoverer>,
    llm: &dyn LlmClient,
    config: &PipelineConfig,
) -> Result<Option<FkResolution>, OntologyError> {
    let Some(discoverer) = discoverer else {
        if !config.allow_name_only_fk {
            return Ok(None);
        }
        return resolve_fk_name_only(source_table, source_column, all_tables, llm, config).await;
    };

    let source_family = crate::models::DataTypeFamily::from_raw_type(&source_column.data_type);

    let pk_candidates: Vec<(&SchemaTable, &SchemaColumn)> = all_columns
        .iter()
        .filter(|c| c.is_pk && c.table_id != source_table.id)
        .filter_map(|c| all_tables.iter().find(|t| t.id == c.table_id).map(|t| (t, c)))
        .filter(|(_, c)| {
            crate::models::DataTypeFamily::from_raw_type(&c.data_type) == source_family
        })
        .collect();

    if pk_candidates.is_empty() {
        return Ok(None);
    }

    let mut ranked = Vec::new();
    for (table, column) in pk_candidates {
        let overlap = discoverer
            .check_value_overlap(
                &source_table.schema,
                &source_table.name,
                &source_column.name,
                &table.schema,
                &table.name,
                &column.name,
                1000,
            )
            .await?;
        if overlap.match_rate < config.fk_overlap_prune_threshold {
            continue;
        }
        ranked.push(RankedCandidate {
            table,
            column,
            match_rate: overlap.match_rate,
            matched_count: overlap.matched_count,
            target_distinct: overlap.target_distinct,
        });
    }

    if ranked.is_empty() {
        return Ok(None);
    }

    ranked.sort_by(|a, b| b.match_rate.partial_cmp(&a.match_rate).unwrap());

    if ranked.len() == 1 && ranked[0].match_rate >= config.min_match_rate_for_fk {
        let candidate = &ranked[0];
        return Ok(Some(FkResolution {
            column_id: source_column.id,
            target_table: candidate.table.name.clone(),
            target_column: candidate.column.name.clone(),
            method: "data_overlap",
            confidence: candidate.match_rate,
        }));
    }

    let candidate_list = ranked
        .iter()
        .map(|c| {
            format!(
                "{{table: {}, column: {}, match_rate: {:.4}, matched_count: {}, target_distinct: {}, data_type: {}}}",
                c.table.name, c.column.name, c.match_rate, c.matched_count, c.target_distinct, c.column.data_type
            )
        })
        .collect::<Vec<_>>()
        .join(", ");

    let prompt = format!(
        "Source column: {}.{} (type {})\nRanked candidate FK targets: [{}]\n\n\
         Choose the correct target. Respond with JSON: \
         {{\"target_table\": string, \"target_column\": string, \"confidence\": 0..1, \"reasoning\": string}}",
        source_table.name, source_column.name, source_column.data_type, candidate_list
    );

    let outcome = llm
        .generate_response(&prompt, SYSTEM_PROMPT, config.llm_temperature_fk_llm, false)
        .await?;
    let parsed: FkChoiceResponse = parse_json_envelope(&outcome.content)?;

    let chosen = ranked
        .iter()
        .find(|c| c.table.name == parsed.target_table && c.column.name == parsed.target_column);

    let (target_table, target_column, confidence) = match chosen {
        Some(c) => (c.table.name.clone(), c.column.name.clone(), parsed.confidence),
        None => {
            tracing::warn!(
                model_choice = %parsed.target_table,
                "LLM chose a target not in the candidate set, falling back to top-ranked candidate"
            );
            let top = &ranked[0];
            (top.table.name.clone(), top.column.name.clone(), top.match_rate)
        }
    };

    Ok(Some(FkResolution {
        column_id: source_column.id,
        target_table,
        target_column,
        method: "data_overlap",
        confidence,
    }))
}

async fn resolve_fk_name_only(
    source_table: &SchemaTable,
    source_column: &SchemaColumn,
    all_tables: &[SchemaTable],
    llm: &dyn LlmClient,
    config: &PipelineConfig,
) -> Result<Option<FkResolution>, OntologyError> {
    let table_names: Vec<&str> = all_tables
        .iter()
        .filter(|t| t.id != source_table.id)
        .map(|t| t.name.as_str())
        .collect();

    let prompt = format!(
        "Source column: {}.{}\nCandidate tables (no data access available): {:?}\n\n\
         Guess the foreign-key target from naming conventions alone, or report no target if \
         unsure. Respond with JSON: \
         {{\"target_table\": string, \"target_column\": string, \"confidence\": 0..1, \"reasoning\": string}}",
        source_table.name, source_column.name, table_names
    );

    let outcome = llm
        .generate_response(&prompt, SYSTEM_PROMPT, config.llm_temperature_fk_llm, false)
        .await?;
    let parsed: FkChoiceResponse = parse_json_envelope(&outcome.content)?;

    if parsed.target_table.is_empty() || parsed.target_column.is_empty() {
        return Ok(None);
    }

    Ok(Some(FkResolution {
        column_id: source_column.id,
        target_table: parsed.target_table,
        target_column: parsed.target_column,
        method: "name_only",
        confidence: parsed.confidence.min(NAME_ONLY_CONFIDENCE_CAP),
    }))
}

/// Merges a Phase-4 result into its `ColumnFeatures` (§4.4).
pub fn merge_fk_resolution(features: &mut ColumnFeatures, resolution: FkResolution) {
    features.identifier_features.fk_target_table = Some(resolution.target_table);
    features.identifier_features.fk_target_column = Some(resolution.target_column);
    features.identifier_features.fk_resolution_method = Some(resolution.method.to_string());
    features.role = crate::models::ColumnRole::ForeignKey;
    if resolution.confidence > features.confidence {
        features.confidence = resolution.confidence;
    }
    features.needs_fk_check = false;
}
