use async_trait::async_trait;
use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::{parse_json_envelope, LlmClient};
use crate::models::{ColumnDataProfile, ColumnFeatures, ColumnRole, SemanticType};

use super::prompts::{column_context, SYSTEM_PROMPT};
use super::{new_features_shell, Classifier};

#[derive(Deserialize)]
struct ExternalIdResponse {
    external_service: String,
    entity_referenced: Option<String>,
    confidence: f64,
    description: String,
}

pub struct ExternalIdClassifier;

#[async_trait]
impl Classifier for ExternalIdClassifier {
    async fn classify(
        &self,
        profile: &ColumnDataProfile,
        llm: &dyn LlmClient,
        config: &PipelineConfig,
    ) -> Result<ColumnFeatures, OntologyError> {
        let prompt = format!(
            "{}\n\nClassify this external-service identifier column. Respond with JSON: \
             {{\"external_service\": string, \"entity_referenced\": string|null, \
             \"confidence\": 0..1, \"description\": string}}",
            column_context(profile)
        );

        let outcome = llm
            .generate_response(&prompt, SYSTEM_PROMPT, config.llm_temperature_classify, false)
            .await?;
        let parsed: ExternalIdResponse = parse_json_envelope(&outcome.content)?;

        let mut features =
            new_features_shell(profile, ColumnRole::Attribute, SemanticType::Identifier);
        features.description = parsed.description;
        features.confidence = parsed.confidence;
        features.model_used = Some(llm.get_model());
        features.identifier_features.identifier_type = Some("external_reference".to_string());
        features.identifier_features.external_service = Some(parsed.external_service);
        features.identifier_features.entity_referenced = parsed.entity_referenced;

        Ok(features)
    }
}
