use async_trait::async_trait;
use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::{parse_json_envelope, LlmClient};
use crate::models::{ColumnDataProfile, ColumnFeatures, ColumnRole, SemanticType};

use super::prompts::{column_context, SYSTEM_PROMPT};
use super::{new_features_shell, Classifier};

#[derive(Deserialize)]
struct JsonResponse {
    json_type: String,
    confidence: f64,
    description: String,
}

pub struct JsonClassifier;

#[async_trait]
impl Classifier for JsonClassifier {
    async fn classify(
        &self,
        profile: &ColumnDataProfile,
        llm: &dyn LlmClient,
        config: &PipelineConfig,
    ) -> Result<ColumnFeatures, OntologyError> {
        let prompt = format!(
            "{}\n\nClassify this JSON/JSONB column. Respond with JSON: \
             {{\"json_type\": string, \"confidence\": 0..1, \"description\": string}}",
            column_context(profile)
        );

        let outcome = llm
            .generate_response(&prompt, SYSTEM_PROMPT, config.llm_temperature_classify, false)
            .await?;
        let parsed: JsonResponse = parse_json_envelope(&outcome.content)?;

        let mut features = new_features_shell(profile, ColumnRole::Attribute, SemanticType::Json);
        features.description = format!("{} ({})", parsed.description, parsed.json_type);
        features.confidence = parsed.confidence;
        features.model_used = Some(llm.get_model());

        Ok(features)
    }
}
