//! Reference, read-only `SchemaDiscoverer` over a MySQL-wire-protocol
//! relational source (MySQL itself, or any MySQL-protocol-compatible
//! engine).
//!
//! Built around a single `mysql_async::Pool` per connected datasource
//! (constructed via `OptsBuilder`), running queries through the pool and
//! mapping result rows into the schema/profiling types. The core's
//! `SchemaDiscoverer` trait is engine-agnostic; this is one concrete,
//! swappable implementation, not a requirement on callers.

use async_trait::async_trait;
use mysql_async::prelude::*;
use mysql_async::{Opts, Pool, Row};

use crate::error::OntologyError;
use crate::models::{SchemaColumn, SchemaTable};

use super::{
    ColumnStats, DeclaredRelationship, DeclaredRelationshipType, JoinStats, SchemaDiscoverer,
    ValueOverlap,
};

pub struct MySqlSchemaDiscoverer {
    pool: Pool,
}

impl MySqlSchemaDiscoverer {
    pub fn connect(url: &str) -> Result<Self, OntologyError> {
        let opts = Opts::from_url(url).map_err(|e| {
            OntologyError::Structural(format!("invalid MySQL connection url: {e}"))
        })?;
        Ok(Self { pool: Pool::new(opts) })
    }

    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    async fn conn(&self) -> Result<mysql_async::Conn, OntologyError> {
        self.pool.get_conn().await.map_err(OntologyError::from)
    }
}

fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

fn qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

#[async_trait]
impl SchemaDiscoverer for MySqlSchemaDiscoverer {
    async fn list_tables(&self, selected_only: bool) -> Result<Vec<SchemaTable>, OntologyError> {
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .exec(
                "SELECT t.TABLE_SCHEMA, t.TABLE_NAME, t.TABLE_ROWS \
                 FROM information_schema.TABLES t \
                 WHERE t.TABLE_TYPE = 'BASE TABLE' \
                 ORDER BY t.TABLE_SCHEMA, t.TABLE_NAME",
                (),
            )
            .await?;

        let tables = rows
            .into_iter()
            .enumerate()
            .map(|(idx, mut row)| {
                let schema: String = row.take("TABLE_SCHEMA").unwrap_or_default();
                let name: String = row.take("TABLE_NAME").unwrap_or_default();
                let row_count: Option<i64> = row.take("TABLE_ROWS").unwrap_or(None);
                SchemaTable { id: idx as i64 + 1, schema, name, row_count, is_selected: true }
            })
            .collect::<Vec<_>>();

        Ok(if selected_only {
            tables.into_iter().filter(|t| t.is_selected).collect()
        } else {
            tables
        })
    }

    async fn list_columns(&self) -> Result<Vec<SchemaColumn>, OntologyError> {
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .exec(
                "SELECT c.TABLE_SCHEMA, c.TABLE_NAME, c.COLUMN_NAME, c.DATA_TYPE, \
                        c.IS_NULLABLE, c.COLUMN_KEY, c.CHARACTER_MAXIMUM_LENGTH \
                 FROM information_schema.COLUMNS c \
                 ORDER BY c.TABLE_SCHEMA, c.TABLE_NAME, c.ORDINAL_POSITION",
                (),
            )
            .await?;

        let columns = rows
            .into_iter()
            .enumerate()
            .map(|(idx, mut row)| {
                let name: String = row.take("COLUMN_NAME").unwrap_or_default();
                let data_type: String = row.take("DATA_TYPE").unwrap_or_default();
                let is_nullable: String = row.take("IS_NULLABLE").unwrap_or_default();
                let column_key: String = row.take("COLUMN_KEY").unwrap_or_default();
                let max_length: Option<i32> =
                    row.take("CHARACTER_MAXIMUM_LENGTH").unwrap_or(None);

                SchemaColumn {
                    id: idx as i64 + 1,
                    table_id: 0,
                    name,
                    data_type,
                    is_pk: column_key == "PRI",
                    is_unique: column_key == "PRI" || column_key == "UNI",
                    is_nullable: is_nullable == "YES",
                    sample_values: Vec::new(),
                    distinct_count: None,
                    null_count: None,
                    min_length: None,
                    max_length,
                    is_joinable: None,
                    joinability_reason: None,
                }
            })
            .collect();

        Ok(columns)
    }

    async fn list_relationships(&self) -> Result<Vec<DeclaredRelationship>, OntologyError> {
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .exec(
                "SELECT k.TABLE_SCHEMA, k.TABLE_NAME, k.COLUMN_NAME, \
                        k.REFERENCED_TABLE_SCHEMA, k.REFERENCED_TABLE_NAME, k.REFERENCED_COLUMN_NAME \
                 FROM information_schema.KEY_COLUMN_USAGE k \
                 WHERE k.REFERENCED_TABLE_NAME IS NOT NULL",
                (),
            )
            .await?;

        // Endpoints are reported by schema-qualified name; the caller
        // resolves them against its own `list_tables`/`list_columns`
        // snapshot (information_schema has no notion of this core's ids).
        let relationships = rows
            .into_iter()
            .map(|mut row| DeclaredRelationship {
                source_schema: row.take("TABLE_SCHEMA").unwrap_or_default(),
                source_table: row.take("TABLE_NAME").unwrap_or_default(),
                source_column: row.take("COLUMN_NAME").unwrap_or_default(),
                target_schema: row.take("REFERENCED_TABLE_SCHEMA").unwrap_or_default(),
                target_table: row.take("REFERENCED_TABLE_NAME").unwrap_or_default(),
                target_column: row.take("REFERENCED_COLUMN_NAME").unwrap_or_default(),
                relationship_type: DeclaredRelationshipType::ForeignKey,
            })
            .collect();

        Ok(relationships)
    }

    async fn check_value_overlap(
        &self,
        src_schema: &str,
        src_table: &str,
        src_col: &str,
        tgt_schema: &str,
        tgt_table: &str,
        tgt_col: &str,
        sample_n: u32,
    ) -> Result<ValueOverlap, OntologyError> {
        let mut conn = self.conn().await?;

        let src = qualified(src_schema, src_table);
        let tgt = qualified(tgt_schema, tgt_table);
        let src_c = quote_ident(src_col);
        let tgt_c = quote_ident(tgt_col);

        let sql = format!(
            "SELECT \
                COUNT(*) AS sampled, \
                SUM(CASE WHEN EXISTS ( \
                    SELECT 1 FROM {tgt} WHERE {tgt}.{tgt_c} = s.{src_c} \
                ) THEN 1 ELSE 0 END) AS matched, \
                (SELECT COUNT(DISTINCT {src_c}) FROM {src}) AS source_distinct, \
                (SELECT COUNT(DISTINCT {tgt_c}) FROM {tgt}) AS target_distinct \
             FROM (SELECT {src_c} FROM {src} WHERE {src_c} IS NOT NULL LIMIT {sample_n}) s",
        );

        let row: Option<Row> = conn.exec_first(sql, ()).await?;
        let Some(mut row) = row else {
            return Ok(ValueOverlap::default());
        };

        let sampled: i64 = row.take("sampled").unwrap_or(0);
        let matched: i64 = row.take("matched").unwrap_or(0);
        let source_distinct: i64 = row.take("source_distinct").unwrap_or(0);
        let target_distinct: i64 = row.take("target_distinct").unwrap_or(0);

        let match_rate = if sampled > 0 { matched as f64 / sampled as f64 } else { 0.0 };

        Ok(ValueOverlap { match_rate, matched_count: matched, source_distinct, target_distinct })
    }

    async fn analyze_join(
        &self,
        src_schema: &str,
        src_table: &str,
        src_col: &str,
        tgt_schema: &str,
        tgt_table: &str,
        tgt_col: &str,
    ) -> Result<JoinStats, OntologyError> {
        let mut conn = self.conn().await?;

        let src = qualified(src_schema, src_table);
        let tgt = qualified(tgt_schema, tgt_table);
        let src_c = quote_ident(src_col);
        let tgt_c = quote_ident(tgt_col);

        let sql = format!(
            "SELECT \
                SUM(CASE WHEN t.{tgt_c} IS NOT NULL THEN 1 ELSE 0 END) AS source_matched, \
                SUM(CASE WHEN t.{tgt_c} IS NULL THEN 1 ELSE 0 END) AS orphan_count, \
                MAX(s.{src_c}) AS max_source_value \
             FROM {src} s LEFT JOIN {tgt} t ON s.{src_c} = t.{tgt_c} \
             WHERE s.{src_c} IS NOT NULL",
        );

        let row: Option<Row> = conn.exec_first(sql, ()).await?;
        let Some(mut row) = row else {
            return Ok(JoinStats::default());
        };

        let source_matched: i64 = row.take("source_matched").unwrap_or(0);
        let orphan_count: i64 = row.take("orphan_count").unwrap_or(0);
        let max_source_value: Option<i64> = row.take("max_source_value").unwrap_or(None);

        Ok(JoinStats { source_matched, orphan_count, max_source_value })
    }

    async fn analyze_column_stats(
        &self,
        schema: &str,
        table: &str,
        columns: &[String],
    ) -> Result<Vec<ColumnStats>, OntologyError> {
        let mut conn = self.conn().await?;
        let qualified_table = qualified(schema, table);

        let mut stats = Vec::with_capacity(columns.len());
        for column in columns {
            let col = quote_ident(column);
            let sql = format!(
                "SELECT COUNT(*) AS row_count, COUNT({col}) AS non_null_count, \
                        COUNT(DISTINCT {col}) AS distinct_count \
                 FROM {qualified_table}",
            );
            let row: Option<Row> = conn.exec_first(sql, ()).await?;
            let Some(mut row) = row else { continue };

            stats.push(ColumnStats {
                column_name: column.clone(),
                row_count: row.take("row_count").unwrap_or(0),
                non_null_count: row.take("non_null_count").unwrap_or(0),
                distinct_count: row.take("distinct_count").unwrap_or(0),
            });
        }

        Ok(stats)
    }

    async fn get_distinct_values(
        &self,
        schema: &str,
        table: &str,
        column: &str,
        limit: u32,
    ) -> Result<Vec<String>, OntologyError> {
        let mut conn = self.conn().await?;
        let qualified_table = qualified(schema, table);
        let col = quote_ident(column);

        let sql = format!(
            "SELECT DISTINCT {col} AS v FROM {qualified_table} WHERE {col} IS NOT NULL LIMIT {limit}",
        );

        let rows: Vec<Row> = conn.exec(sql, ()).await?;
        Ok(rows
            .into_iter()
            .filter_map(|mut row| row.take::<String, _>("v"))
            .collect())
    }

    async fn get_primary_key_columns(
        &self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<String>, OntologyError> {
        let mut conn = self.conn().await?;
        let rows: Vec<Row> = conn
            .exec(
                "SELECT COLUMN_NAME FROM information_schema.KEY_COLUMN_USAGE \
                 WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ? AND CONSTRAINT_NAME = 'PRIMARY' \
                 ORDER BY ORDINAL_POSITION",
                (schema, table),
            )
            .await?;

        Ok(rows.into_iter().filter_map(|mut row| row.take::<String, _>("COLUMN_NAME")).collect())
    }
}
