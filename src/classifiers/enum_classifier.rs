use async_trait::async_trait;
use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::{parse_json_envelope, LlmClient};
use crate::models::{ColumnDataProfile, ColumnFeatures, ColumnRole, SemanticType};

use super::prompts::{column_context, SYSTEM_PROMPT};
use super::{new_features_shell, Classifier};

#[derive(Deserialize)]
struct EnumResponse {
    is_state_machine: bool,
    state_description: Option<String>,
    needs_detailed_analysis: bool,
    confidence: f64,
    description: String,
}

pub struct EnumClassifier;

#[async_trait]
impl Classifier for EnumClassifier {
    async fn classify(
        &self,
        profile: &ColumnDataProfile,
        llm: &dyn LlmClient,
        config: &PipelineConfig,
    ) -> Result<ColumnFeatures, OntologyError> {
        let prompt = format!(
            "{}\n\nClassify this low-cardinality column as an enum. Respond with JSON: \
             {{\"is_state_machine\": bool, \"state_description\": string|null, \
             \"needs_detailed_analysis\": bool, \"confidence\": 0..1, \"description\": string}}",
            column_context(profile)
        );

        let outcome = llm
            .generate_response(&prompt, SYSTEM_PROMPT, config.llm_temperature_classify, false)
            .await?;
        let parsed: EnumResponse = parse_json_envelope(&outcome.content)?;

        let mut features = new_features_shell(profile, ColumnRole::Attribute, SemanticType::Enum);
        features.description = parsed.description;
        features.confidence = parsed.confidence;
        features.model_used = Some(llm.get_model());
        features.enum_features.is_state_machine = parsed.is_state_machine;
        features.enum_features.state_description = parsed.state_description;

        if parsed.is_state_machine || parsed.needs_detailed_analysis {
            features.needs_enum_check = true;
        }

        Ok(features)
    }
}
