//! Top-level orchestration: sequences Profiler → Classifiers → Enum →
//! FK → Cross-Column (§2, §5). Each phase's worker pool run fully
//! completes — and its merger runs single-threaded — before the next phase
//! starts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::classifiers::registry;
use crate::config::PipelineConfig;
use crate::cross_column::{analyze_cross_column, merge_cross_column_analysis};
use crate::enum_analyzer::{analyze_enum_column, merge_enum_analysis};
use crate::error::OntologyError;
use crate::fk_resolver::{merge_fk_resolution, resolve_fk};
use crate::llm::LlmClient;
use crate::models::{
    ColumnDataProfile, ColumnFeatures, ProgressCallback, SchemaColumn, SchemaTable,
};
use crate::profiler::profile_columns;
use crate::repository::ColumnFeatureRepository;
use crate::schema_discoverer::SchemaDiscoverer;
use crate::worker_pool::{CancellationToken, WorkItem, WorkerPool};

/// Everything one pipeline run needs from the outside world, threaded by
/// reference into every phase rather than reached for via a global (§3.1).
pub struct PipelineRun<'a> {
    pub tables: &'a [SchemaTable],
    pub columns: &'a [SchemaColumn],
    pub llm: Arc<dyn LlmClient>,
    pub discoverer: Option<Arc<dyn SchemaDiscoverer>>,
    pub feature_repo: &'a dyn ColumnFeatureRepository,
    pub config: Arc<PipelineConfig>,
    pub pool: WorkerPool,
}

/// Runs the full five-phase pipeline and publishes every publishable
/// `ColumnFeatures` (§4.8: all `needs_*` flags false) to the feature
/// repository. Returns the in-memory feature set keyed by column id.
pub async fn run_pipeline(
    run: &PipelineRun<'_>,
    cancel: CancellationToken,
    on_progress: Option<ProgressCallback>,
) -> Result<HashMap<i64, ColumnFeatures>, OntologyError> {
    let profiles = profile_columns(run.tables, run.columns, &run.config, on_progress.clone());

    let mut features_by_column =
        run_classification_phase(&profiles, run, cancel.clone(), on_progress.clone()).await;

    run_enum_phase(&profiles, &mut features_by_column, run, cancel.clone(), on_progress.clone())
        .await;

    run_fk_phase(&profiles, &mut features_by_column, run, cancel.clone(), on_progress.clone())
        .await?;

    run_cross_column_phase(&profiles, &mut features_by_column, run, on_progress.clone()).await?;

    let publishable: Vec<ColumnFeatures> =
        features_by_column.values().filter(|f| f.is_publishable()).cloned().collect();
    run.feature_repo.publish_batch(publishable).await?;

    Ok(features_by_column)
}

struct ClassifyItem {
    profile: ColumnDataProfile,
    llm: Arc<dyn LlmClient>,
    config: Arc<PipelineConfig>,
}

#[async_trait]
impl WorkItem for ClassifyItem {
    type Output = ColumnFeatures;

    fn id(&self) -> String {
        self.profile.column_id().to_string()
    }

    async fn execute(&self, _cancel: &CancellationToken) -> Result<ColumnFeatures, OntologyError> {
        let classifier = registry().get(self.profile.classification_path);
        classifier.classify(&self.profile, self.llm.as_ref(), &self.config).await
    }
}

async fn run_classification_phase(
    profiles: &[ColumnDataProfile],
    run: &PipelineRun<'_>,
    cancel: CancellationToken,
    on_progress: Option<ProgressCallback>,
) -> HashMap<i64, ColumnFeatures> {
    let items: Vec<ClassifyItem> = profiles
        .iter()
        .map(|p| ClassifyItem {
            profile: p.clone(),
            llm: run.llm.clone(),
            config: run.config.clone(),
        })
        .collect();

    let results = run.pool.run(items, cancel, on_progress).await;

    results.into_iter().filter_map(|r| r.value.ok()).map(|f| (f.column_id, f)).collect()
}

struct EnumItem {
    profile: ColumnDataProfile,
    llm: Arc<dyn LlmClient>,
    config: Arc<PipelineConfig>,
}

#[async_trait]
impl WorkItem for EnumItem {
    type Output = crate::enum_analyzer::EnumAnalysisResult;

    fn id(&self) -> String {
        self.profile.column_id().to_string()
    }

    async fn execute(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<crate::enum_analyzer::EnumAnalysisResult, OntologyError> {
        analyze_enum_column(&self.profile, self.llm.as_ref(), &self.config).await
    }
}

async fn run_enum_phase(
    profiles: &[ColumnDataProfile],
    features_by_column: &mut HashMap<i64, ColumnFeatures>,
    run: &PipelineRun<'_>,
    cancel: CancellationToken,
    on_progress: Option<ProgressCallback>,
) {
    let flagged: Vec<&ColumnDataProfile> = profiles
        .iter()
        .filter(|p| {
            features_by_column.get(&p.column_id()).map(|f| f.needs_enum_check).unwrap_or(false)
        })
        .collect();

    let items: Vec<EnumItem> = flagged
        .into_iter()
        .map(|p| EnumItem { profile: p.clone(), llm: run.llm.clone(), config: run.config.clone() })
        .collect();

    let results = run.pool.run(items, cancel, on_progress).await;

    for result in results.into_iter().filter_map(|r| r.value.ok()) {
        if let Some(features) = features_by_column.get_mut(&result.column_id) {
            merge_enum_analysis(features, result);
        }
    }
}

struct FkItem {
    source_table: SchemaTable,
    source_column: SchemaColumn,
    all_tables: Arc<Vec<SchemaTable>>,
    all_columns: Arc<Vec<SchemaColumn>>,
    discoverer: Option<Arc<dyn SchemaDiscoverer>>,
    llm: Arc<dyn LlmClient>,
    config: Arc<PipelineConfig>,
}

#[async_trait]
impl WorkItem for FkItem {
    type Output = Option<crate::fk_resolver::FkResolution>;

    fn id(&self) -> String {
        self.source_column.id.to_string()
    }

    async fn execute(
        &self,
        _cancel: &CancellationToken,
    ) -> Result<Option<crate::fk_resolver::FkResolution>, OntologyError> {
        resolve_fk(
            &self.source_table,
            &self.source_column,
            &self.all_tables,
            &self.all_columns,
            self.discoverer.as_deref(),
            self.llm.as_ref(),
            &self.config,
        )
        .await
    }
}

async fn run_fk_phase(
    profiles: &[ColumnDataProfile],
    features_by_column: &mut HashMap<i64, ColumnFeatures>,
    run: &PipelineRun<'_>,
    cancel: CancellationToken,
    on_progress: Option<ProgressCallback>,
) -> Result<(), OntologyError> {
    let table_by_id: HashMap<i64, &SchemaTable> = run.tables.iter().map(|t| (t.id, t)).collect();
    let all_tables = Arc::new(run.tables.to_vec());
    let all_columns = Arc::new(run.columns.to_vec());

    let flagged: Vec<&ColumnDataProfile> = profiles
        .iter()
        .filter(|p| {
            features_by_column.get(&p.column_id()).map(|f| f.needs_fk_check).unwrap_or(false)
        })
        .collect();

    let items: Vec<FkItem> = flagged
        .into_iter()
        .filter_map(|p| {
            let table = table_by_id.get(&p.table_id)?;
            Some(FkItem {
                source_table: (*table).clone(),
                source_column: p.column.clone(),
                all_tables: all_tables.clone(),
                all_columns: all_columns.clone(),
                discoverer: run.discoverer.clone(),
                llm: run.llm.clone(),
                config: run.config.clone(),
            })
        })
        .collect();

    let results = run.pool.run(items, cancel, on_progress).await;

    for result in results {
        match result.value {
            Ok(Some(resolution)) => {
                if let Some(features) = features_by_column.get_mut(&resolution.column_id) {
                    merge_fk_resolution(features, resolution);
                }
            }
            Ok(None) => {
                if let Ok(column_id) = result.id.parse::<i64>() {
                    if let Some(features) = features_by_column.get_mut(&column_id) {
                        features.needs_fk_check = false;
                    }
                }
            }
            Err(_) => {}
        }
    }

    Ok(())
}

async fn run_cross_column_phase(
    profiles: &[ColumnDataProfile],
    features_by_column: &mut HashMap<i64, ColumnFeatures>,
    run: &PipelineRun<'_>,
    on_progress: Option<ProgressCallback>,
) -> Result<(), OntologyError> {
    let mut profiles_by_table: HashMap<i64, Vec<ColumnDataProfile>> = HashMap::new();
    for profile in profiles {
        profiles_by_table.entry(profile.table_id).or_default().push(profile.clone());
    }

    let flagged_tables: Vec<i64> = profiles_by_table
        .iter()
        .filter(|(_, cols)| {
            cols.iter().any(|p| {
                features_by_column
                    .get(&p.column_id())
                    .map(|f| f.needs_cross_column_check)
                    .unwrap_or(false)
            })
        })
        .map(|(table_id, _)| *table_id)
        .collect();

    let total = flagged_tables.len();
    if let Some(cb) = &on_progress {
        cb(crate::models::ProgressEvent::new(0, total, format!("reconciling {total} table(s)")));
    }

    for (idx, table_id) in flagged_tables.iter().enumerate() {
        let Some(table) = run.tables.iter().find(|t| t.id == *table_id) else { continue };
        let table_profiles = &profiles_by_table[table_id];

        if let Some(result) = analyze_cross_column(
            &table.name,
            table_profiles,
            features_by_column,
            run.llm.as_ref(),
            &run.config,
        )
        .await?
        {
            merge_cross_column_analysis(table_profiles, features_by_column, result);
        } else {
            for profile in table_profiles {
                if let Some(features) = features_by_column.get_mut(&profile.column_id()) {
                    features.needs_cross_column_check = false;
                }
            }
        }

        if let Some(cb) = &on_progress {
            cb(crate::models::ProgressEvent::new(idx + 1, total, format!("reconciled {}/{total}", idx + 1)));
        }
    }

    Ok(())
}
