//! Pipeline configuration: every knob enumerated in SPEC_FULL §6, and no
//! others affect core behavior.

use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Enum gating in the Data-Change Scanner (§4.7).
    pub max_distinct_values_for_enum: u32,
    pub max_enum_value_length: u32,
    /// Threshold shared by the Data-Change Scanner's FK-pattern detector and
    /// the single-candidate FK acceptance rule (§4.4, §4.7).
    pub min_match_rate_for_fk: f64,

    /// Routing thresholds (§4.1).
    pub enum_cardinality_ratio: f64,
    pub enum_max_distinct: u32,

    /// Candidate pruning in Phase 4 (§4.4).
    pub fk_overlap_prune_threshold: f64,

    /// Candidate filtering in Phase 4.6 (§4.6).
    pub pk_match_min_distinct: i64,
    pub pk_match_min_ratio: f64,

    pub unix_timestamp_min_match: f64,
    pub timestamp_year_low: i32,
    pub timestamp_year_high: i32,

    /// Degree of parallelism for the worker pool (§5).
    pub worker_pool_degree: usize,

    pub llm_temperature_classify: f64,
    pub llm_temperature_fk_llm: f64,

    /// Gates the degraded, name-only FK resolution path (§4.4, §9 Open
    /// Question). Never the default.
    pub allow_name_only_fk: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_distinct_values_for_enum: 100,
            max_enum_value_length: 100,
            min_match_rate_for_fk: 0.9,
            enum_cardinality_ratio: 0.01,
            enum_max_distinct: 50,
            fk_overlap_prune_threshold: 0.5,
            pk_match_min_distinct: 20,
            pk_match_min_ratio: 0.05,
            unix_timestamp_min_match: 0.80,
            timestamp_year_low: 1970,
            timestamp_year_high: 2100,
            worker_pool_degree: 8,
            llm_temperature_classify: 0.2,
            llm_temperature_fk_llm: 0.1,
            allow_name_only_fk: false,
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file, falling back to defaults for any field the
    /// file omits (the `#[serde(default)]` idiom used throughout).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn orphan_reject_threshold(&self) -> i64 {
        // pk_match requires orphan_count == 0 at persistence time (§4.8);
        // the 5-20% "pending" tier from the original design is dropped.
        0
    }
}
