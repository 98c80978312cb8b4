use async_trait::async_trait;
use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::{parse_json_envelope, LlmClient};
use crate::models::{ColumnDataProfile, ColumnFeatures, ColumnRole, SemanticType};

use super::prompts::{column_context, SYSTEM_PROMPT};
use super::{new_features_shell, Classifier};

#[derive(Deserialize)]
struct NumericResponse {
    numeric_type: String,
    may_be_monetary: bool,
    confidence: f64,
    description: String,
}

pub struct NumericClassifier;

#[async_trait]
impl Classifier for NumericClassifier {
    async fn classify(
        &self,
        profile: &ColumnDataProfile,
        llm: &dyn LlmClient,
        config: &PipelineConfig,
    ) -> Result<ColumnFeatures, OntologyError> {
        let prompt = format!(
            "{}\n\nClassify this numeric column. Respond with JSON: \
             {{\"numeric_type\": string, \"may_be_monetary\": bool, \"confidence\": 0..1, \
             \"description\": string}}",
            column_context(profile)
        );

        let outcome = llm
            .generate_response(&prompt, SYSTEM_PROMPT, config.llm_temperature_classify, false)
            .await?;
        let parsed: NumericResponse = parse_json_envelope(&outcome.content)?;

        let role = if parsed.may_be_monetary { ColumnRole::Measure } else { ColumnRole::Attribute };

        let mut features = new_features_shell(
            profile,
            role,
            if parsed.may_be_monetary { SemanticType::Monetary } else { SemanticType::Numeric },
        );
        features.description = format!("{} ({})", parsed.description, parsed.numeric_type);
        features.confidence = parsed.confidence;
        features.model_used = Some(llm.get_model());

        if parsed.may_be_monetary {
            features.needs_cross_column_check = true;
            features.monetary_features.is_monetary = true;
        }

        Ok(features)
    }
}
