use async_trait::async_trait;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::LlmClient;
use crate::models::{ColumnDataProfile, ColumnFeatures, ColumnRole, SemanticType};

use super::{new_features_shell, Classifier};

/// No LLM call (§4.2): the data gave us nothing a classifier could reason
/// over, so a minimal, low-confidence record is synthesized directly.
pub struct UnknownClassifier;

#[async_trait]
impl Classifier for UnknownClassifier {
    async fn classify(
        &self,
        profile: &ColumnDataProfile,
        _llm: &dyn LlmClient,
        _config: &PipelineConfig,
    ) -> Result<ColumnFeatures, OntologyError> {
        let mut features =
            new_features_shell(profile, ColumnRole::Attribute, SemanticType::Unknown);
        features.description = format!(
            "unclassified column of type {}",
            profile.column.data_type
        );
        features.confidence = 0.5;
        Ok(features)
    }
}
