use async_trait::async_trait;
use serde::Deserialize;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::{parse_json_envelope, LlmClient};
use crate::models::{
    ColumnDataProfile, ColumnFeatures, ColumnRole, SemanticType, TimestampPurpose,
};

use super::prompts::{column_context, SYSTEM_PROMPT};
use super::{new_features_shell, Classifier};

#[derive(Deserialize)]
struct TimestampResponse {
    purpose: TimestampPurpose,
    confidence: f64,
    is_soft_delete: bool,
    is_audit_field: bool,
    description: String,
}

pub struct TimestampClassifier;

#[async_trait]
impl Classifier for TimestampClassifier {
    async fn classify(
        &self,
        profile: &ColumnDataProfile,
        llm: &dyn LlmClient,
        config: &PipelineConfig,
    ) -> Result<ColumnFeatures, OntologyError> {
        let prompt = format!(
            "{}\n\nClassify this timestamp column. Respond with JSON: \
             {{\"purpose\": one of audit_created|audit_updated|soft_delete|event_time|scheduled_time|expiration|cursor, \
             \"confidence\": 0..1, \"is_soft_delete\": bool, \"is_audit_field\": bool, \"description\": string}}",
            column_context(profile)
        );

        let outcome = llm
            .generate_response(&prompt, SYSTEM_PROMPT, config.llm_temperature_classify, false)
            .await?;
        let parsed: TimestampResponse = parse_json_envelope(&outcome.content)?;

        let mut features = new_features_shell(
            profile,
            ColumnRole::Attribute,
            semantic_type_for(&parsed.purpose),
        );
        features.purpose = Some(format!("{:?}", parsed.purpose));
        features.description = parsed.description;
        features.confidence = parsed.confidence;
        features.model_used = Some(llm.get_model());
        features.timestamp_features.purpose = Some(parsed.purpose);
        features.timestamp_features.is_soft_delete = parsed.is_soft_delete;
        features.timestamp_features.is_audit_field = parsed.is_audit_field;

        if matches!(parsed.purpose, TimestampPurpose::SoftDelete) {
            features.needs_cross_column_check = true;
        }

        Ok(features)
    }
}

fn semantic_type_for(purpose: &TimestampPurpose) -> SemanticType {
    match purpose {
        TimestampPurpose::AuditCreated => SemanticType::AuditCreated,
        TimestampPurpose::AuditUpdated => SemanticType::AuditUpdated,
        TimestampPurpose::SoftDelete => SemanticType::SoftDelete,
        TimestampPurpose::EventTime => SemanticType::EventTime,
        TimestampPurpose::ScheduledTime => SemanticType::ScheduledTime,
        TimestampPurpose::Expiration => SemanticType::Expiration,
        TimestampPurpose::Cursor => SemanticType::Cursor,
    }
}
