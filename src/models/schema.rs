//! Source-database schema metadata, as discovered by the `SchemaDiscoverer`
//! collaborator (§6) and narrowed to the tables/columns a project selected.

use serde::{Deserialize, Serialize};

/// A source-database table included in a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaTable {
    pub id: i64,
    pub schema: String,
    pub name: String,
    pub row_count: Option<i64>,
    pub is_selected: bool,
}

impl SchemaTable {
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// A column in a selected table, with the stats the profiler and the
/// relationship discoverer both read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaColumn {
    pub id: i64,
    pub table_id: i64,
    pub name: String,
    pub data_type: String,
    pub is_pk: bool,
    pub is_unique: bool,
    pub is_nullable: bool,
    /// Up to N sample values pulled from the live table; never the whole
    /// column, and never assumed to be exhaustive.
    pub sample_values: Vec<String>,
    pub distinct_count: Option<i64>,
    pub null_count: Option<i64>,
    pub min_length: Option<i32>,
    pub max_length: Option<i32>,
    pub is_joinable: Option<bool>,
    pub joinability_reason: Option<String>,
}

impl SchemaColumn {
    /// `distinct_count / row_count`, undefined (not zero) without both counts.
    pub fn cardinality(&self, row_count: Option<i64>) -> Option<f64> {
        match (self.distinct_count, row_count) {
            (Some(distinct), Some(rows)) if rows > 0 => Some(distinct as f64 / rows as f64),
            _ => None,
        }
    }

    /// `null_count / row_count`, undefined without both counts.
    pub fn null_rate(&self, row_count: Option<i64>) -> Option<f64> {
        match (self.null_count, row_count) {
            (Some(nulls), Some(rows)) if rows > 0 => Some(nulls as f64 / rows as f64),
            _ => None,
        }
    }

    /// A name ending in a common foreign-key suffix (`_id`, `_uuid`, `_key`).
    pub fn has_fk_like_name(&self) -> bool {
        let name = self.name.to_ascii_lowercase();
        name.ends_with("_id") || name.ends_with("_uuid") || name.ends_with("_key")
    }
}

/// A data type, abstracted to the families the routing rules (§4.1) and
/// joinability classifier (§4.6.1) switch on. Populated from the raw
/// database type string by the schema discoverer adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataTypeFamily {
    Timestamp,
    Boolean,
    Integer,
    Uuid,
    Text,
    Json,
    Binary,
    Geometry,
    Other,
}

impl DataTypeFamily {
    /// Families the joinability classifier and the PK-match inference engine
    /// exclude outright regardless of cardinality (§4.6.1, §4.6 step 1).
    pub fn is_type_excluded_for_joining(&self) -> bool {
        matches!(
            self,
            DataTypeFamily::Boolean
                | DataTypeFamily::Timestamp
                | DataTypeFamily::Binary
                | DataTypeFamily::Json
                | DataTypeFamily::Geometry
        )
    }

    /// Crude classification from a raw SQL type name; the schema discoverer
    /// adapter is expected to refine this with engine-specific knowledge.
    pub fn from_raw_type(raw: &str) -> Self {
        let t = raw.to_ascii_lowercase();
        if t.contains("timestamp") || t.contains("datetime") || t.contains("date") {
            DataTypeFamily::Timestamp
        } else if t.contains("bool") {
            DataTypeFamily::Boolean
        } else if t.contains("uuid") {
            DataTypeFamily::Uuid
        } else if t.contains("int") || t.contains("serial") || t.contains("numeric") || t.contains("decimal") {
            DataTypeFamily::Integer
        } else if t.contains("json") {
            DataTypeFamily::Json
        } else if t.contains("blob") || t.contains("binary") || t.contains("bytea") {
            DataTypeFamily::Binary
        } else if t.contains("geometry") || t.contains("geography") {
            DataTypeFamily::Geometry
        } else if t.contains("char") || t.contains("text") || t.contains("varchar") {
            DataTypeFamily::Text
        } else {
            DataTypeFamily::Other
        }
    }
}
