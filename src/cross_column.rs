//! Phase 5: per-table cross-column reconciliation — monetary pairing and
//! soft-delete validation (§4.5). Operates on a whole table at once, not one
//! column at a time.

use std::collections::HashMap;

use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::{parse_json_envelope, LlmClient};
use crate::models::{ColumnDataProfile, ColumnFeatures, ColumnRole, CurrencyUnit, SemanticType};
use crate::patterns;

const SYSTEM_PROMPT: &str = "You are a database schema analyst. You validate monetary \
amount/currency pairings and soft-delete timestamp semantics across the columns of a single \
table. Respond with a single JSON object matching the requested schema, with no prose before \
or after it.";

#[derive(Deserialize)]
struct CrossColumnResponse {
    #[serde(default)]
    monetary_pairings: Vec<MonetaryPairingResponse>,
    #[serde(default)]
    soft_delete_validations: Vec<SoftDeleteValidationResponse>,
}

#[derive(Deserialize)]
struct MonetaryPairingResponse {
    amount_column: String,
    currency_column: String,
    currency_unit: CurrencyUnit,
    amount_description: String,
    confidence: f64,
}

#[derive(Deserialize)]
struct SoftDeleteValidationResponse {
    column_name: String,
    is_soft_delete: bool,
    #[allow(dead_code)]
    non_null_meaning: String,
    description: String,
    confidence: f64,
}

pub struct CrossColumnResult {
    pub monetary_pairings: Vec<MonetaryPairingResponse>,
    pub soft_delete_validations: Vec<SoftDeleteValidationResponse>,
}

/// Runs the Phase-5 analysis for one table, or returns `None` if the table
/// has no monetary or soft-delete candidates (§4.5 "skip the table").
pub async fn analyze_cross_column(
    table_name: &str,
    profiles: &[ColumnDataProfile],
    features_by_column: &HashMap<i64, ColumnFeatures>,
    llm: &dyn LlmClient,
    config: &PipelineConfig,
) -> Result<Option<CrossColumnResult>, OntologyError> {
    let monetary_candidates: Vec<&ColumnDataProfile> = profiles
        .iter()
        .filter(|p| {
            features_by_column
                .get(&p.column_id())
                .map(|f| f.needs_cross_column_check && f.monetary_features.is_monetary)
                .unwrap_or(false)
        })
        .collect();

    let soft_delete_candidates: Vec<&ColumnDataProfile> = profiles
        .iter()
        .filter(|p| {
            features_by_column
                .get(&p.column_id())
                .map(|f| f.needs_cross_column_check && f.timestamp_features.is_soft_delete)
                .unwrap_or(false)
        })
        .collect();

    if monetary_candidates.is_empty() && soft_delete_candidates.is_empty() {
        return Ok(None);
    }

    let currency_witnesses: Vec<&ColumnDataProfile> = profiles
        .iter()
        .filter(|p| p.pattern_match_rate(patterns::ISO_4217) >= 0.8)
        .collect();

    let prompt = format!(
        "Table: {table_name}\n\
         Monetary amount candidates: {:?}\n\
         Currency witness columns (ISO-4217 match >= 0.8): {:?}\n\
         Soft-delete candidates: {:?}\n\n\
         Validate monetary pairings and soft-delete semantics. Respond with JSON: \
         {{\"monetary_pairings\": [{{\"amount_column\": string, \"currency_column\": string, \
         \"currency_unit\": \"cents\"|\"dollars\"|\"basis_points\", \"amount_description\": string, \
         \"confidence\": 0..1}}], \"soft_delete_validations\": [{{\"column_name\": string, \
         \"is_soft_delete\": bool, \"non_null_meaning\": string, \"description\": string, \
         \"confidence\": 0..1}}]}}",
        monetary_candidates.iter().map(|p| p.column.name.as_str()).collect::<Vec<_>>(),
        currency_witnesses.iter().map(|p| p.column.name.as_str()).collect::<Vec<_>>(),
        soft_delete_candidates.iter().map(|p| p.column.name.as_str()).collect::<Vec<_>>(),
    );

    let outcome = llm
        .generate_response(&prompt, SYSTEM_PROMPT, config.llm_temperature_classify, false)
        .await?;
    let parsed: CrossColumnResponse = parse_json_envelope(&outcome.content)?;

    Ok(Some(CrossColumnResult {
        monetary_pairings: parsed.monetary_pairings,
        soft_delete_validations: parsed.soft_delete_validations,
    }))
}

/// Merges a Phase-5 result back into the table's `ColumnFeatures` (§4.5).
/// Clears `needs_cross_column_check` on every flagged column regardless of
/// outcome — a column not mentioned in the response is treated as rejected.
pub fn merge_cross_column_analysis(
    profiles: &[ColumnDataProfile],
    features_by_column: &mut HashMap<i64, ColumnFeatures>,
    result: CrossColumnResult,
) {
    let column_id_by_name: HashMap<&str, i64> =
        profiles.iter().map(|p| (p.column.name.as_str(), p.column_id())).collect();

    let mut validated_soft_delete: HashMap<i64, bool> = HashMap::new();

    for pairing in &result.monetary_pairings {
        let Some(&amount_id) = column_id_by_name.get(pairing.amount_column.as_str()) else {
            continue;
        };
        if let Some(features) = features_by_column.get_mut(&amount_id) {
            features.monetary_features.is_monetary = true;
            features.monetary_features.currency_unit = Some(pairing.currency_unit);
            features.monetary_features.paired_currency_column = Some(pairing.currency_column.clone());
            features.monetary_features.amount_description = Some(pairing.amount_description.clone());
            features.role = ColumnRole::Measure;
            if pairing.confidence > features.confidence {
                features.confidence = pairing.confidence;
            }
        }
    }

    for validation in &result.soft_delete_validations {
        let Some(&column_id) = column_id_by_name.get(validation.column_name.as_str()) else {
            continue;
        };
        validated_soft_delete.insert(column_id, validation.is_soft_delete);
        if let Some(features) = features_by_column.get_mut(&column_id) {
            if validation.is_soft_delete {
                features.semantic_type = SemanticType::SoftDelete;
            } else {
                features.semantic_type = SemanticType::EventTime;
                features.timestamp_features.purpose =
                    Some(crate::models::TimestampPurpose::EventTime);
                features.timestamp_features.is_soft_delete = false;
            }
            if !validation.description.is_empty() {
                features.description = validation.description.clone();
            }
            if validation.confidence > features.confidence {
                features.confidence = validation.confidence;
            }
        }
    }

    for profile in profiles {
        if let Some(features) = features_by_column.get_mut(&profile.column_id()) {
            if features.needs_cross_column_check
                && features.timestamp_features.is_soft_delete
                && !validated_soft_delete.contains_key(&profile.column_id())
            {
                // Flagged for soft-delete validation but the response said
                // nothing about it: treat as rejected (§4.5).
                features.semantic_type = SemanticType::EventTime;
                features.timestamp_features.purpose =
                    Some(crate::models::TimestampPurpose::EventTime);
                features.timestamp_features.is_soft_delete = false;
            }
            features.needs_cross_column_check = false;
        }
    }
}
