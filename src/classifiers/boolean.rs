use async_trait::async_trait;
use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::{parse_json_envelope, LlmClient};
use crate::models::{ColumnDataProfile, ColumnFeatures, ColumnRole, SemanticType};

use super::prompts::{column_context, SYSTEM_PROMPT};
use super::{new_features_shell, Classifier};

#[derive(Deserialize)]
struct BooleanResponse {
    true_meaning: String,
    false_meaning: String,
    boolean_type: String,
    confidence: f64,
    description: String,
}

pub struct BooleanClassifier;

#[async_trait]
impl Classifier for BooleanClassifier {
    async fn classify(
        &self,
        profile: &ColumnDataProfile,
        llm: &dyn LlmClient,
        config: &PipelineConfig,
    ) -> Result<ColumnFeatures, OntologyError> {
        let prompt = format!(
            "{}\n\nClassify this boolean-valued column. Respond with JSON: \
             {{\"true_meaning\": string, \"false_meaning\": string, \"boolean_type\": string, \
             \"confidence\": 0..1, \"description\": string}}",
            column_context(profile)
        );

        let outcome = llm
            .generate_response(&prompt, SYSTEM_PROMPT, config.llm_temperature_classify, false)
            .await?;
        let parsed: BooleanResponse = parse_json_envelope(&outcome.content)?;

        let mut features =
            new_features_shell(profile, ColumnRole::Attribute, SemanticType::Boolean);
        features.description = parsed.description;
        features.confidence = parsed.confidence;
        features.model_used = Some(llm.get_model());
        features.boolean_features.true_meaning = Some(parsed.true_meaning);
        features.boolean_features.false_meaning = Some(parsed.false_meaning);
        features.boolean_features.boolean_type = Some(parsed.boolean_type);

        Ok(features)
    }
}
