//! Phase 2: one classifier per `ClassificationPath`, each producing
//! `ColumnFeatures` plus follow-up flags (§4.2).

mod boolean;
mod enum_classifier;
mod external_id;
mod json_classifier;
mod numeric;
mod prompts;
mod text;
mod timestamp;
mod unknown;
mod uuid_classifier;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use once_cell::sync::Lazy;

use crate::config::PipelineConfig;
use crate::error::OntologyError;
use crate::llm::LlmClient;
use crate::models::{ClassificationPath, ColumnDataProfile, ColumnFeatures};

/// One classifier per classification path. Implementations are stateless
/// aside from a logger and must be safe to invoke concurrently (§3
/// Ownership).
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(
        &self,
        profile: &ColumnDataProfile,
        llm: &dyn LlmClient,
        config: &PipelineConfig,
    ) -> Result<ColumnFeatures, OntologyError>;
}

/// A lazily-populated, concurrency-safe map from classification path to a
/// stateless classifier instance (§9 "Global mutable classifier registry").
/// `DashMap`-backed for many concurrent lookups with one-time construction
/// per path.
pub struct ClassifierRegistry {
    classifiers: DashMap<ClassificationPath, Arc<dyn Classifier>>,
}

impl ClassifierRegistry {
    fn new() -> Self {
        let classifiers: DashMap<ClassificationPath, Arc<dyn Classifier>> = DashMap::new();
        classifiers.insert(ClassificationPath::Timestamp, Arc::new(timestamp::TimestampClassifier));
        classifiers.insert(ClassificationPath::Boolean, Arc::new(boolean::BooleanClassifier));
        classifiers.insert(ClassificationPath::Enum, Arc::new(enum_classifier::EnumClassifier));
        classifiers.insert(ClassificationPath::Uuid, Arc::new(uuid_classifier::UuidClassifier));
        classifiers
            .insert(ClassificationPath::ExternalId, Arc::new(external_id::ExternalIdClassifier));
        classifiers.insert(ClassificationPath::Numeric, Arc::new(numeric::NumericClassifier));
        classifiers.insert(ClassificationPath::Text, Arc::new(text::TextClassifier));
        classifiers.insert(ClassificationPath::Json, Arc::new(json_classifier::JsonClassifier));
        classifiers.insert(ClassificationPath::Unknown, Arc::new(unknown::UnknownClassifier));
        Self { classifiers }
    }

    pub fn get(&self, path: ClassificationPath) -> Arc<dyn Classifier> {
        self.classifiers
            .get(&path)
            .map(|entry| entry.value().clone())
            .expect("every ClassificationPath variant has a registered classifier")
    }
}

static REGISTRY: Lazy<ClassifierRegistry> = Lazy::new(ClassifierRegistry::new);

/// Returns the process-global classifier registry, constructing it on first
/// use.
pub fn registry() -> &'static ClassifierRegistry {
    &REGISTRY
}

/// Common helper: builds a `ColumnFeatures` shell with the fields every
/// classifier must fill in, timestamped at construction.
pub(crate) fn new_features_shell(
    profile: &ColumnDataProfile,
    role: crate::models::ColumnRole,
    semantic_type: crate::models::SemanticType,
) -> ColumnFeatures {
    ColumnFeatures {
        column_id: profile.column_id(),
        table_id: profile.table_id,
        classification_path: profile.classification_path,
        purpose: None,
        semantic_type,
        role,
        description: String::new(),
        confidence: 0.0,
        timestamp_features: Default::default(),
        boolean_features: Default::default(),
        enum_features: Default::default(),
        identifier_features: Default::default(),
        monetary_features: Default::default(),
        needs_enum_check: false,
        needs_fk_check: false,
        needs_cross_column_check: false,
        analyzed_at: chrono::Utc::now(),
        model_used: None,
    }
}
