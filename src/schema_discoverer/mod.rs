//! The `SchemaDiscoverer` external-interface contract (§6): everything the
//! core needs from a connected source database, and nothing else. A
//! reference MySQL-protocol implementation lives in `mysql.rs`.

mod mysql;

pub use mysql::MySqlSchemaDiscoverer;

use async_trait::async_trait;

use crate::error::OntologyError;
use crate::models::{SchemaColumn, SchemaTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredRelationshipType {
    ForeignKey,
    Manual,
}

/// A declared foreign-key (or manually-declared) relationship, identified by
/// schema-qualified names rather than ids: adapters read these straight off
/// information-schema-style catalog views, which have no notion of this
/// core's internal `SchemaTable`/`SchemaColumn` ids. `discover_fk` resolves
/// the endpoints against its own table/column snapshot by name.
#[derive(Debug, Clone)]
pub struct DeclaredRelationship {
    pub source_schema: String,
    pub source_table: String,
    pub source_column: String,
    pub target_schema: String,
    pub target_table: String,
    pub target_column: String,
    pub relationship_type: DeclaredRelationshipType,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ValueOverlap {
    pub match_rate: f64,
    pub matched_count: i64,
    pub source_distinct: i64,
    pub target_distinct: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JoinStats {
    pub source_matched: i64,
    pub orphan_count: i64,
    pub max_source_value: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ColumnStats {
    pub column_name: String,
    pub row_count: i64,
    pub non_null_count: i64,
    pub distinct_count: i64,
}

/// A handle over one connected source database, produced from
/// `(datasource_type, config, project, datasource)` per §6. Every method is
/// read-only; no implementation may issue DDL or mutate source data.
#[async_trait]
pub trait SchemaDiscoverer: Send + Sync {
    async fn list_tables(&self, selected_only: bool) -> Result<Vec<SchemaTable>, OntologyError>;

    async fn list_columns(&self) -> Result<Vec<SchemaColumn>, OntologyError>;

    async fn list_relationships(&self) -> Result<Vec<DeclaredRelationship>, OntologyError>;

    #[allow(clippy::too_many_arguments)]
    async fn check_value_overlap(
        &self,
        src_schema: &str,
        src_table: &str,
        src_col: &str,
        tgt_schema: &str,
        tgt_table: &str,
        tgt_col: &str,
        sample_n: u32,
    ) -> Result<ValueOverlap, OntologyError>;

    #[allow(clippy::too_many_arguments)]
    async fn analyze_join(
        &self,
        src_schema: &str,
        src_table: &str,
        src_col: &str,
        tgt_schema: &str,
        tgt_table: &str,
        tgt_col: &str,
    ) -> Result<JoinStats, OntologyError>;

    async fn analyze_column_stats(
        &self,
        schema: &str,
        table: &str,
        columns: &[String],
    ) -> Result<Vec<ColumnStats>, OntologyError>;

    async fn get_distinct_values(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        limit: u32,
    ) -> Result<Vec<String>, OntologyError>;

    async fn get_primary_key_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<String>, OntologyError>;
}
