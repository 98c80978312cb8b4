use async_trait::async_trait;
use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::{parse_json_envelope, LlmClient};
use crate::models::{ColumnDataProfile, ColumnFeatures, ColumnRole, SemanticType};

use super::prompts::{column_context, SYSTEM_PROMPT};
use super::{new_features_shell, Classifier};

#[derive(Deserialize)]
struct UuidResponse {
    identifier_type: String,
    entity_referenced: Option<String>,
    needs_fk_resolution: bool,
    confidence: f64,
    description: String,
}

pub struct UuidClassifier;

#[async_trait]
impl Classifier for UuidClassifier {
    async fn classify(
        &self,
        profile: &ColumnDataProfile,
        llm: &dyn LlmClient,
        config: &PipelineConfig,
    ) -> Result<ColumnFeatures, OntologyError> {
        let prompt = format!(
            "{}\n\nClassify this UUID-shaped column. Respond with JSON: \
             {{\"identifier_type\": one of uuid_primary_key|foreign_key|external_reference|opaque_token, \
             \"entity_referenced\": string|null, \"needs_fk_resolution\": bool, \
             \"confidence\": 0..1, \"description\": string}}",
            column_context(profile)
        );

        let outcome = llm
            .generate_response(&prompt, SYSTEM_PROMPT, config.llm_temperature_classify, false)
            .await?;
        let parsed: UuidResponse = parse_json_envelope(&outcome.content)?;

        let is_fk = parsed.identifier_type == "foreign_key";
        let role = if profile.column.is_pk {
            ColumnRole::Pk
        } else if is_fk {
            ColumnRole::ForeignKey
        } else {
            ColumnRole::Attribute
        };

        let mut features = new_features_shell(profile, role, SemanticType::Identifier);
        features.description = parsed.description;
        features.confidence = parsed.confidence;
        features.model_used = Some(llm.get_model());
        features.identifier_features.identifier_type = Some(parsed.identifier_type);
        features.identifier_features.entity_referenced = parsed.entity_referenced;

        if is_fk || parsed.needs_fk_resolution {
            features.needs_fk_check = true;
        }

        Ok(features)
    }
}
