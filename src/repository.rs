//! Typed per-entity CRUD contracts (§6). Persistence is out of scope for
//! this core; it is consumed as traits only. An in-memory implementation is
//! provided so unit/integration tests don't need a real database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::OntologyError;
use crate::models::{
    ColumnFeatures, EntityRelationship, OntologyEntity, PendingChange, SchemaColumn, SchemaTable,
};

#[async_trait]
pub trait TableRepository: Send + Sync {
    async fn list_tables_by_datasource(
        &self,
        datasource_id: i64,
        selected_only: bool,
    ) -> Result<Vec<SchemaTable>, OntologyError>;

    async fn get_columns_by_tables(
        &self,
        table_ids: &[i64],
    ) -> Result<Vec<SchemaColumn>, OntologyError>;

    async fn get_primary_key_columns(&self, table_id: i64) -> Result<Vec<String>, OntologyError>;

    async fn update_column_joinability(
        &self,
        column_id: i64,
        is_joinable: bool,
        reason: &str,
    ) -> Result<(), OntologyError>;
}

#[async_trait]
pub trait ColumnFeatureRepository: Send + Sync {
    async fn publish_batch(&self, features: Vec<ColumnFeatures>) -> Result<(), OntologyError>;

    async fn get(&self, column_id: i64) -> Result<Option<ColumnFeatures>, OntologyError>;

    async fn list_by_table(&self, table_id: i64) -> Result<Vec<ColumnFeatures>, OntologyError>;
}

#[async_trait]
pub trait EntityRepository: Send + Sync {
    async fn list_entities(&self, ontology_id: i64) -> Result<Vec<OntologyEntity>, OntologyError>;
}

#[async_trait]
pub trait RelationshipRepository: Send + Sync {
    async fn create_batch(
        &self,
        relationships: Vec<EntityRelationship>,
    ) -> Result<(), OntologyError>;

    async fn list_for_ontology(
        &self,
        ontology_id: i64,
    ) -> Result<Vec<EntityRelationship>, OntologyError>;
}

#[async_trait]
pub trait PendingChangeRepository: Send + Sync {
    async fn create_batch(&self, changes: Vec<PendingChange>) -> Result<(), OntologyError>;

    async fn list_by_column(&self, column_id: i64) -> Result<Vec<PendingChange>, OntologyError>;
}

/// In-memory repository set for tests. Not used by production callers: the
/// real persistence layer is an external collaborator per §6.
#[derive(Default)]
pub struct InMemoryRepositories {
    pub tables: Mutex<Vec<SchemaTable>>,
    pub columns: Mutex<Vec<SchemaColumn>>,
    pub features: Mutex<HashMap<i64, ColumnFeatures>>,
    pub entities: Mutex<Vec<OntologyEntity>>,
    pub relationships: Mutex<Vec<EntityRelationship>>,
    pub pending_changes: Mutex<Vec<PendingChange>>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TableRepository for InMemoryRepositories {
    async fn list_tables_by_datasource(
        &self,
        _datasource_id: i64,
        selected_only: bool,
    ) -> Result<Vec<SchemaTable>, OntologyError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.iter().filter(|t| !selected_only || t.is_selected).cloned().collect())
    }

    async fn get_columns_by_tables(
        &self,
        table_ids: &[i64],
    ) -> Result<Vec<SchemaColumn>, OntologyError> {
        let columns = self.columns.lock().unwrap();
        Ok(columns.iter().filter(|c| table_ids.contains(&c.table_id)).cloned().collect())
    }

    async fn get_primary_key_columns(&self, table_id: i64) -> Result<Vec<String>, OntologyError> {
        let columns = self.columns.lock().unwrap();
        Ok(columns
            .iter()
            .filter(|c| c.table_id == table_id && c.is_pk)
            .map(|c| c.name.clone())
            .collect())
    }

    async fn update_column_joinability(
        &self,
        column_id: i64,
        is_joinable: bool,
        reason: &str,
    ) -> Result<(), OntologyError> {
        let mut columns = self.columns.lock().unwrap();
        if let Some(column) = columns.iter_mut().find(|c| c.id == column_id) {
            column.is_joinable = Some(is_joinable);
            column.joinability_reason = Some(reason.to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl ColumnFeatureRepository for InMemoryRepositories {
    async fn publish_batch(&self, features: Vec<ColumnFeatures>) -> Result<(), OntologyError> {
        let mut store = self.features.lock().unwrap();
        for feature in features {
            store.insert(feature.column_id, feature);
        }
        Ok(())
    }

    async fn get(&self, column_id: i64) -> Result<Option<ColumnFeatures>, OntologyError> {
        Ok(self.features.lock().unwrap().get(&column_id).cloned())
    }

    async fn list_by_table(&self, table_id: i64) -> Result<Vec<ColumnFeatures>, OntologyError> {
        Ok(self.features.lock().unwrap().values().filter(|f| f.table_id == table_id).cloned().collect())
    }
}

#[async_trait]
impl EntityRepository for InMemoryRepositories {
    async fn list_entities(&self, ontology_id: i64) -> Result<Vec<OntologyEntity>, OntologyError> {
        Ok(self
            .entities
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.ontology_id == ontology_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl RelationshipRepository for InMemoryRepositories {
    async fn create_batch(
        &self,
        relationships: Vec<EntityRelationship>,
    ) -> Result<(), OntologyError> {
        self.relationships.lock().unwrap().extend(relationships);
        Ok(())
    }

    async fn list_for_ontology(
        &self,
        ontology_id: i64,
    ) -> Result<Vec<EntityRelationship>, OntologyError> {
        Ok(self
            .relationships
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.ontology_id == ontology_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PendingChangeRepository for InMemoryRepositories {
    async fn create_batch(&self, changes: Vec<PendingChange>) -> Result<(), OntologyError> {
        self.pending_changes.lock().unwrap().extend(changes);
        Ok(())
    }

    async fn list_by_column(&self, column_id: i64) -> Result<Vec<PendingChange>, OntologyError> {
        Ok(self
            .pending_changes
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.column_id == column_id)
            .cloned()
            .collect())
    }
}
