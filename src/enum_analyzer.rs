//! Phase 3: per-column enum value labeling (§4.3). Runs only for columns
//! Phase 2 flagged `needs_enum_check`.

use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::{parse_json_envelope, LlmClient};
use crate::models::{ColumnDataProfile, ColumnFeatures, EnumValueCategory, EnumValueLabel};

const SYSTEM_PROMPT: &str = "You are a database schema analyst. You label the distinct values \
of an enum-like column and decide whether they form a state machine. Respond with a single \
JSON object matching the requested schema, with no prose before or after it.";

#[derive(Deserialize)]
struct EnumAnalysisResponse {
    is_state_machine: bool,
    state_description: Option<String>,
    values: Vec<EnumValueLabelResponse>,
    confidence: f64,
    description: String,
}

#[derive(Deserialize)]
struct EnumValueLabelResponse {
    value: String,
    label: String,
    category: Option<EnumValueCategory>,
}

/// Builds the request for one flagged column; the caller (worker pool item)
/// runs this and then calls [`merge_enum_analysis`] to apply the result.
pub async fn analyze_enum_column(
    profile: &ColumnDataProfile,
    llm: &dyn LlmClient,
    config: &PipelineConfig,
) -> Result<EnumAnalysisResult, OntologyError> {
    let samples: Vec<&str> =
        profile.column.sample_values.iter().map(String::as_str).collect();

    let prompt = format!(
        "Table: {}.{}\nColumn: {}\nDistinct sample values observed: {:?}\n\n\
         Label each distinct value, classify whether these values form a state machine, and \
         describe the lifecycle if so. Respond with JSON: \
         {{\"is_state_machine\": bool, \"state_description\": string|null, \
         \"values\": [{{\"value\": string, \"label\": string, \
         \"category\": \"initial\"|\"in_progress\"|\"terminal\"|\"terminal_success\"|\"terminal_error\"|null}}], \
         \"confidence\": 0..1, \"description\": string}}",
        profile.table_schema, profile.table_name, profile.column.name, samples
    );

    let outcome = llm
        .generate_response(&prompt, SYSTEM_PROMPT, config.llm_temperature_classify, false)
        .await?;
    let parsed: EnumAnalysisResponse = parse_json_envelope(&outcome.content)?;

    Ok(EnumAnalysisResult {
        column_id: profile.column_id(),
        is_state_machine: parsed.is_state_machine,
        state_description: parsed.state_description,
        values: parsed
            .values
            .into_iter()
            .map(|v| EnumValueLabel { value: v.value, label: v.label, category: v.category })
            .collect(),
        confidence: parsed.confidence,
        description: parsed.description,
    })
}

pub struct EnumAnalysisResult {
    pub column_id: i64,
    pub is_state_machine: bool,
    pub state_description: Option<String>,
    pub values: Vec<EnumValueLabel>,
    pub confidence: f64,
    pub description: String,
}

/// Merges one Phase-3 result back into its `ColumnFeatures` (§4.3): keeps
/// the higher confidence, only overwrites `description` if non-empty, and
/// clears `needs_enum_check` regardless of outcome (a merge, once applied,
/// is never retried within the same run — §4.8 monotonic flags).
pub fn merge_enum_analysis(features: &mut ColumnFeatures, result: EnumAnalysisResult) {
    features.enum_features.is_state_machine = result.is_state_machine;
    if result.state_description.is_some() {
        features.enum_features.state_description = result.state_description;
    }
    features.enum_features.values = result.values;
    if !result.description.is_empty() {
        features.description = result.description;
    }
    if result.confidence > features.confidence {
        features.confidence = result.confidence;
    }
    features.needs_enum_check = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnRole, SemanticType};

    fn base_features() -> ColumnFeatures {
        ColumnFeatures {
            column_id: 1,
            table_id: 1,
            classification_path: crate::models::ClassificationPath::Enum,
            purpose: None,
            semantic_type: SemanticType::Enum,
            role: ColumnRole::Attribute,
            description: "original".into(),
            confidence: 0.6,
            timestamp_features: Default::default(),
            boolean_features: Default::default(),
            enum_features: Default::default(),
            identifier_features: Default::default(),
            monetary_features: Default::default(),
            needs_enum_check: true,
            needs_fk_check: false,
            needs_cross_column_check: false,
            analyzed_at: chrono::Utc::now(),
            model_used: None,
        }
    }

    #[test]
    fn merge_clears_flag_and_keeps_higher_confidence() {
        let mut features = base_features();
        let result = EnumAnalysisResult {
            column_id: 1,
            is_state_machine: true,
            state_description: Some("order lifecycle".into()),
            values: vec![EnumValueLabel {
                value: "pending".into(),
                label: "Pending".into(),
                category: Some(EnumValueCategory::Initial),
            }],
            confidence: 0.4,
            description: String::new(),
        };
        merge_enum_analysis(&mut features, result);

        assert!(!features.needs_enum_check);
        assert!(features.enum_features.is_state_machine);
        assert_eq!(features.confidence, 0.6); // new confidence is lower, kept original
        assert_eq!(features.description, "original"); // empty description not overwritten
    }

    #[test]
    fn merge_overwrites_description_when_non_empty() {
        let mut features = base_features();
        let result = EnumAnalysisResult {
            column_id: 1,
            is_state_machine: false,
            state_description: None,
            values: vec![],
            confidence: 0.9,
            description: "order status enum".into(),
        };
        merge_enum_analysis(&mut features, result);

        assert_eq!(features.description, "order status enum");
        assert_eq!(features.confidence, 0.9);
    }
}
