//! Ontology entities and the relationships between them (§3, §4.6).

use serde::{Deserialize, Serialize};

/// A meaningful business entity bound to one primary table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OntologyEntity {
    pub id: i64,
    pub ontology_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub domain: Option<String>,
    pub primary_schema: String,
    pub primary_table: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    ForeignKey,
    PkMatch,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    Confirmed,
    /// Reserved for future heuristics (§4.8, §9 Open Question); no code path
    /// in this core produces it today.
    Pending,
}

/// A directed semantic edge between two entities. Confirmed relationships
/// always exist in mirrored pairs (source/target swapped, identical
/// `detection_method`/`confidence`/`status`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRelationship {
    pub id: i64,
    pub ontology_id: i64,
    pub source_entity_id: i64,
    pub target_entity_id: i64,
    pub source_schema: String,
    pub source_table: String,
    pub source_column: String,
    pub target_schema: String,
    pub target_table: String,
    pub target_column: String,
    pub detection_method: DetectionMethod,
    pub confidence: f64,
    pub status: RelationshipStatus,
    pub description: Option<String>,
}

impl EntityRelationship {
    /// The mirror edge required by the bidirectional-relationship
    /// invariant (§3): swapped endpoints, identical method/confidence/status.
    /// `id` is left as a caller-assigned placeholder (0); callers must
    /// allocate a fresh id before persisting.
    pub fn mirrored(&self) -> EntityRelationship {
        EntityRelationship {
            id: 0,
            ontology_id: self.ontology_id,
            source_entity_id: self.target_entity_id,
            target_entity_id: self.source_entity_id,
            source_schema: self.target_schema.clone(),
            source_table: self.target_table.clone(),
            source_column: self.target_column.clone(),
            target_schema: self.source_schema.clone(),
            target_table: self.source_table.clone(),
            target_column: self.source_column.clone(),
            detection_method: self.detection_method,
            confidence: self.confidence,
            status: self.status,
            description: self.description.clone(),
        }
    }

    pub fn is_self_reference(&self) -> bool {
        self.source_schema == self.target_schema && self.source_table == self.target_table
    }
}
