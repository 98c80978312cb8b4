use async_trait::async_trait;
use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::{parse_json_envelope, LlmClient};
use crate::models::{ColumnDataProfile, ColumnFeatures, ColumnRole, SemanticType};

use super::prompts::{column_context, SYSTEM_PROMPT};
use super::{new_features_shell, Classifier};

#[derive(Deserialize)]
struct TextResponse {
    text_type: String,
    confidence: f64,
    description: String,
}

pub struct TextClassifier;

#[async_trait]
impl Classifier for TextClassifier {
    async fn classify(
        &self,
        profile: &ColumnDataProfile,
        llm: &dyn LlmClient,
        config: &PipelineConfig,
    ) -> Result<ColumnFeatures, OntologyError> {
        let prompt = format!(
            "{}\n\nClassify this free-text column. Respond with JSON: \
             {{\"text_type\": string, \"confidence\": 0..1, \"description\": string}}",
            column_context(profile)
        );

        let outcome = llm
            .generate_response(&prompt, SYSTEM_PROMPT, config.llm_temperature_classify, false)
            .await?;
        let parsed: TextResponse = parse_json_envelope(&outcome.content)?;

        let mut features = new_features_shell(profile, ColumnRole::Attribute, SemanticType::Text);
        features.description = format!("{} ({})", parsed.description, parsed.text_type);
        features.confidence = parsed.confidence;
        features.model_used = Some(llm.get_model());

        Ok(features)
    }
}
