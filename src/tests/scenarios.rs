//! The six end-to-end scenarios of §8, run against the fakes in
//! `super::fakes` instead of a live LLM or database.

use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::models::*;
use crate::pipeline::{run_pipeline, PipelineRun};
use crate::relationship::{discover_fk, discover_pk_match};
use crate::repository::InMemoryRepositories;
use crate::schema_discoverer::{DeclaredRelationship, DeclaredRelationshipType, JoinStats, ValueOverlap};
use crate::worker_pool::{CancellationToken, WorkerPool};

use super::fakes::{FakeLlmClient, FakeSchemaDiscoverer};

fn table(id: i64, name: &str, row_count: i64) -> SchemaTable {
    SchemaTable { id, schema: "public".into(), name: name.into(), row_count: Some(row_count), is_selected: true }
}

fn column(
    id: i64,
    table_id: i64,
    name: &str,
    data_type: &str,
    is_pk: bool,
    samples: Vec<&str>,
    distinct_count: Option<i64>,
) -> SchemaColumn {
    SchemaColumn {
        id,
        table_id,
        name: name.into(),
        data_type: data_type.into(),
        is_pk,
        is_unique: is_pk,
        is_nullable: !is_pk,
        sample_values: samples.into_iter().map(String::from).collect(),
        distinct_count,
        null_count: Some(0),
        min_length: None,
        max_length: None,
        is_joinable: None,
        joinability_reason: None,
    }
}

fn entity(id: i64, ontology_id: i64, name: &str, table: &str) -> OntologyEntity {
    OntologyEntity {
        id,
        ontology_id,
        name: name.into(),
        description: None,
        domain: None,
        primary_schema: "public".into(),
        primary_table: table.into(),
    }
}

/// Scenario 1 (§8.1): BYOK FK. `orders(id uuid pk, user_id uuid, amount_cents
/// bigint, currency char(3))` with a declared FK `orders.user_id ->
/// users.id`. Classification should promote `user_id` to `foreign_key`,
/// pair `amount_cents` with `currency` as cents, and the relationship
/// discoverer should emit a confirmed forward+reverse pair.
#[tokio::test]
async fn scenario_byok_fk() {
    let orders = table(1, "orders", 1000);
    let users = table(2, "users", 500);
    let tables = vec![orders.clone(), users.clone()];

    let orders_id = column(10, 1, "id", "uuid", true, vec![], Some(1000));
    let user_id = column(
        11,
        1,
        "user_id",
        "uuid",
        false,
        vec!["550e8400-e29b-41d4-a716-446655440000"],
        Some(900),
    );
    let amount_cents = column(12, 1, "amount_cents", "bigint", false, vec!["1000", "2500"], Some(800));
    let currency = column(13, 1, "currency", "char(3)", false, vec!["USD", "EUR", "USD"], Some(2));
    let users_id = column(20, 2, "id", "uuid", true, vec![], Some(500));
    let columns = vec![orders_id, user_id, amount_cents, currency, users_id];

    let llm = FakeLlmClient::new(vec![
        (
            "Table: public.orders\nColumn: id (declared type:",
            r#"{"identifier_type":"uuid_primary_key","entity_referenced":null,"needs_fk_resolution":false,"confidence":0.95,"description":"order primary key"}"#,
        ),
        (
            "Table: public.orders\nColumn: user_id (declared type:",
            r#"{"identifier_type":"foreign_key","entity_referenced":"users","needs_fk_resolution":true,"confidence":0.9,"description":"references the placing user"}"#,
        ),
        (
            "Table: public.orders\nColumn: amount_cents (declared type:",
            r#"{"numeric_type":"integer_amount","may_be_monetary":true,"confidence":0.85,"description":"order total"}"#,
        ),
        (
            "Table: public.orders\nColumn: currency (declared type:",
            r#"{"is_state_machine":false,"state_description":null,"needs_detailed_analysis":false,"confidence":0.8,"description":"ISO currency code"}"#,
        ),
        (
            "Table: public.users\nColumn: id (declared type:",
            r#"{"identifier_type":"uuid_primary_key","entity_referenced":null,"needs_fk_resolution":false,"confidence":0.95,"description":"user primary key"}"#,
        ),
        (
            "Monetary amount candidates",
            r#"{"monetary_pairings":[{"amount_column":"amount_cents","currency_column":"currency","currency_unit":"cents","amount_description":"order total in cents","confidence":0.9}],"soft_delete_validations":[]}"#,
        ),
    ]);

    let mut discoverer = FakeSchemaDiscoverer::default();
    discoverer
        .value_overlaps
        .insert(("orders", "user_id", "users", "id"), ValueOverlap { match_rate: 0.95, matched_count: 855, source_distinct: 900, target_distinct: 500 });

    let repos = InMemoryRepositories::new();
    let config = Arc::new(PipelineConfig::default());
    let run = PipelineRun {
        tables: &tables,
        columns: &columns,
        llm: Arc::new(llm),
        discoverer: Some(Arc::new(discoverer)),
        feature_repo: &repos,
        config: config.clone(),
        pool: WorkerPool::new(4),
    };

    let features = run_pipeline(&run, CancellationToken::new(), None).await.unwrap();

    assert_eq!(features.len(), 5);
    for f in features.values() {
        assert!(f.is_publishable(), "column {} left with unresolved follow-up flags", f.column_id);
    }

    let user_id_features = &features[&11];
    assert_eq!(user_id_features.role, ColumnRole::ForeignKey);
    assert_eq!(user_id_features.identifier_features.fk_target_table.as_deref(), Some("users"));
    assert_eq!(user_id_features.identifier_features.fk_target_column.as_deref(), Some("id"));
    assert_eq!(user_id_features.identifier_features.fk_resolution_method.as_deref(), Some("data_overlap"));

    let amount_features = &features[&12];
    assert_eq!(amount_features.role, ColumnRole::Measure);
    assert!(amount_features.monetary_features.is_monetary);
    assert_eq!(amount_features.monetary_features.currency_unit, Some(CurrencyUnit::Cents));
    assert_eq!(amount_features.monetary_features.paired_currency_column.as_deref(), Some("currency"));

    // Relationship discoverer: the declared FK materializes into a
    // confirmed forward+reverse pair.
    let orders_entity = entity(100, 1, "Order", "orders");
    let users_entity = entity(200, 1, "User", "users");
    let entities = vec![orders_entity, users_entity];

    let mut columns_mut = columns.clone();
    let mut fk_discoverer = FakeSchemaDiscoverer::default();
    fk_discoverer.declared_relationships.push(DeclaredRelationship {
        source_schema: "public".into(),
        source_table: "orders".into(),
        source_column: "user_id".into(),
        target_schema: "public".into(),
        target_table: "users".into(),
        target_column: "id".into(),
        relationship_type: DeclaredRelationshipType::ForeignKey,
    });

    let relationships =
        discover_fk(1, &entities, &tables, &mut columns_mut, &fk_discoverer, &repos).await.unwrap();

    assert_eq!(relationships.len(), 2);
    let forward = relationships.iter().find(|r| r.source_table == "orders").unwrap();
    let reverse = relationships.iter().find(|r| r.source_table == "users").unwrap();
    assert_eq!(forward.target_table, "users");
    assert_eq!(reverse.target_table, "orders");
    for r in &relationships {
        assert_eq!(r.detection_method, DetectionMethod::ForeignKey);
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.status, RelationshipStatus::Confirmed);
    }
}

/// Scenario 2 (§8.2): PK-match inference. `events.visitor_id` has 500
/// distinct values out of 100000 rows (0.5% cardinality), all present in
/// `visitors.id`; max visitor_id = 12345. Expect a confirmed `pk_match` pair
/// and the max-value-<=10 guard must NOT trigger (since the max value is
/// well above 10).
///
/// `visitor_id` sits below the joinability classifier's 1% cardinality
/// floor (§4.6.1), but its FK-like name (`has_fk_like_name`) exempts it from
/// that rejection (see `classify_joinability`) the same way the PK-match
/// candidate-source filter already exempts FK-like names from its own 5%
/// ratio check (§4.6 step 2). This test drives `discover_fk`'s real
/// column-stats sweep instead of hand-seeding `is_joinable`, so it actually
/// exercises that exemption rather than assuming it.
#[tokio::test]
async fn scenario_pk_match_inference() {
    let events = table(3, "events", 100_000);
    let visitors = table(4, "visitors", 500);
    let tables = vec![events.clone(), visitors.clone()];

    let visitor_id = column(31, 3, "visitor_id", "bigint", false, vec![], Some(500));
    let visitors_id = column(40, 4, "id", "bigint", true, vec![], Some(500));
    let mut columns = vec![visitor_id, visitors_id];

    let events_entity = entity(300, 1, "Event", "events");
    let visitors_entity = entity(400, 1, "Visitor", "visitors");
    let entities = vec![events_entity, visitors_entity];

    let mut discoverer = FakeSchemaDiscoverer::default();
    discoverer.column_stats.insert(
        "events",
        vec![crate::schema_discoverer::ColumnStats {
            column_name: "visitor_id".into(),
            row_count: 100_000,
            non_null_count: 100_000,
            distinct_count: 500,
        }],
    );
    discoverer.join_stats.insert(
        ("events", "visitor_id", "visitors", "id"),
        JoinStats { source_matched: 500, orphan_count: 0, max_source_value: Some(12345) },
    );

    let repos = InMemoryRepositories::new();
    discover_fk(1, &entities, &tables, &mut columns, &discoverer, &repos).await.unwrap();

    let visitor_id_column = columns.iter().find(|c| c.name == "visitor_id").unwrap();
    assert_eq!(visitor_id_column.is_joinable, Some(true));
    assert_eq!(visitor_id_column.joinability_reason.as_deref(), Some("cardinality_ok"));

    let config = PipelineConfig::default();
    let relationships =
        discover_pk_match(1, &entities, &tables, &columns, &discoverer, &config, None).await.unwrap();

    assert_eq!(relationships.len(), 2);
    for r in &relationships {
        assert_eq!(r.detection_method, DetectionMethod::PkMatch);
        assert_eq!(r.confidence, 0.9);
        assert_eq!(r.status, RelationshipStatus::Confirmed);
    }
    let forward = relationships.iter().find(|r| r.source_table == "events").unwrap();
    assert_eq!(forward.source_column, "visitor_id");
    assert_eq!(forward.target_table, "visitors");
    assert_eq!(forward.target_column, "id");
}

/// Scenario 3 (§8.3): rating rejection. `reviews.rating` has values {1..5}
/// which happen to overlap `products.id`, but the name-exclusion guard must
/// reject it before any overlap query is even considered.
#[tokio::test]
async fn scenario_rating_name_exclusion() {
    let reviews = table(5, "reviews", 1000);
    let products = table(6, "products", 5);
    let tables = vec![reviews.clone(), products.clone()];

    let mut rating = column(51, 5, "rating", "int", false, vec!["1", "2", "3", "4", "5"], Some(5));
    rating.is_joinable = Some(true);
    let products_id = column(60, 6, "id", "int", true, vec![], Some(5));
    let columns = vec![rating, products_id];

    let reviews_entity = entity(500, 1, "Review", "reviews");
    let products_entity = entity(600, 1, "Product", "products");
    let entities = vec![reviews_entity, products_entity];

    // Even if queried, this overlap would look like a perfect match --
    // the name-exclusion rule must keep it from ever being asked.
    let mut discoverer = FakeSchemaDiscoverer::default();
    discoverer.join_stats.insert(
        ("reviews", "rating", "products", "id"),
        JoinStats { source_matched: 1000, orphan_count: 0, max_source_value: Some(5) },
    );

    let config = PipelineConfig::default();
    let relationships =
        discover_pk_match(1, &entities, &tables, &columns, &discoverer, &config, None).await.unwrap();

    assert!(relationships.is_empty());
}

/// Scenario 4 (§8.4): enum state machine. `orders.status` has distinct
/// values {pending, processing, completed, failed} at low cardinality;
/// Phase 2 routes it to Enum and flags `needs_enum_analysis`, and Phase 3
/// labels the lifecycle with terminal/initial categories.
#[tokio::test]
async fn scenario_enum_state_machine() {
    let orders = table(1, "orders", 1000);
    let tables = vec![orders];
    let status = column(
        10,
        1,
        "status",
        "text",
        false,
        vec!["pending", "processing", "completed", "failed"],
        Some(4),
    );
    let columns = vec![status];

    let llm = FakeLlmClient::new(vec![
        (
            "Table: public.orders\nColumn: status (declared type:",
            r#"{"is_state_machine":true,"state_description":null,"needs_detailed_analysis":true,"confidence":0.7,"description":"order status"}"#,
        ),
        (
            "Column: status\nDistinct sample values",
            r#"{"is_state_machine":true,"state_description":"order lifecycle","values":[
                {"value":"pending","label":"Pending","category":"initial"},
                {"value":"processing","label":"Processing","category":"in_progress"},
                {"value":"completed","label":"Completed","category":"terminal_success"},
                {"value":"failed","label":"Failed","category":"terminal_error"}
            ],"confidence":0.85,"description":"order status enum"}"#,
        ),
    ]);

    let repos = InMemoryRepositories::new();
    let config = Arc::new(PipelineConfig::default());
    let run = PipelineRun {
        tables: &tables,
        columns: &columns,
        llm: Arc::new(llm),
        discoverer: None,
        feature_repo: &repos,
        config: config.clone(),
        pool: WorkerPool::new(2),
    };

    let features = run_pipeline(&run, CancellationToken::new(), None).await.unwrap();

    let status_features = &features[&10];
    assert!(status_features.is_publishable());
    assert!(status_features.enum_features.is_state_machine);
    assert_eq!(status_features.enum_features.values.len(), 4);
    assert_eq!(status_features.enum_features.values[0].category, Some(EnumValueCategory::Initial));
    assert_eq!(
        status_features.enum_features.values[2].category,
        Some(EnumValueCategory::TerminalSuccess)
    );
}

/// Scenario 5 (§8.5): soft-delete validation. `users.deleted_at` has a 97%
/// null rate; Phase 2 routes it to Timestamp with `purpose=soft_delete` and
/// flags the cross-column check; Phase 5 confirms it, so `semantic_type`
/// stays `soft_delete`.
#[tokio::test]
async fn scenario_soft_delete_confirmed() {
    let users = table(2, "users", 1000);
    let tables = vec![users];
    let deleted_at = column(21, 2, "deleted_at", "timestamptz", false, vec![], Some(30));
    let columns = vec![deleted_at];

    let llm = FakeLlmClient::new(vec![
        (
            "Table: public.users\nColumn: deleted_at (declared type:",
            r#"{"purpose":"soft_delete","confidence":0.8,"is_soft_delete":true,"is_audit_field":false,"description":"soft delete marker"}"#,
        ),
        (
            "Monetary amount candidates",
            r#"{"monetary_pairings":[],"soft_delete_validations":[{"column_name":"deleted_at","is_soft_delete":true,"non_null_meaning":"row was soft-deleted","description":"confirmed soft delete","confidence":0.92}]}"#,
        ),
    ]);

    let repos = InMemoryRepositories::new();
    let config = Arc::new(PipelineConfig::default());
    let run = PipelineRun {
        tables: &tables,
        columns: &columns,
        llm: Arc::new(llm),
        discoverer: None,
        feature_repo: &repos,
        config: config.clone(),
        pool: WorkerPool::new(2),
    };

    let features = run_pipeline(&run, CancellationToken::new(), None).await.unwrap();

    let deleted_at_features = &features[&21];
    assert!(deleted_at_features.is_publishable());
    assert_eq!(deleted_at_features.semantic_type, SemanticType::SoftDelete);
    assert!(deleted_at_features.timestamp_features.is_soft_delete);
}

/// Scenario 5's rejection branch: Phase 5 decides the flagged column is
/// NOT a soft delete after all, so `semantic_type`/`purpose` must revert to
/// `event_time`.
#[tokio::test]
async fn scenario_soft_delete_rejected_reverts_to_event_time() {
    let users = table(2, "users", 1000);
    let tables = vec![users];
    let deleted_at = column(21, 2, "deleted_at", "timestamptz", false, vec![], Some(30));
    let columns = vec![deleted_at];

    let llm = FakeLlmClient::new(vec![
        (
            "Table: public.users\nColumn: deleted_at (declared type:",
            r#"{"purpose":"soft_delete","confidence":0.8,"is_soft_delete":true,"is_audit_field":false,"description":"looked like a soft delete"}"#,
        ),
        (
            "Monetary amount candidates",
            r#"{"monetary_pairings":[],"soft_delete_validations":[{"column_name":"deleted_at","is_soft_delete":false,"non_null_meaning":"n/a","description":"actually a processed-at marker","confidence":0.9}]}"#,
        ),
    ]);

    let repos = InMemoryRepositories::new();
    let config = Arc::new(PipelineConfig::default());
    let run = PipelineRun {
        tables: &tables,
        columns: &columns,
        llm: Arc::new(llm),
        discoverer: None,
        feature_repo: &repos,
        config: config.clone(),
        pool: WorkerPool::new(2),
    };

    let features = run_pipeline(&run, CancellationToken::new(), None).await.unwrap();

    let deleted_at_features = &features[&21];
    assert!(deleted_at_features.is_publishable());
    assert_eq!(deleted_at_features.semantic_type, SemanticType::EventTime);
    assert!(!deleted_at_features.timestamp_features.is_soft_delete);
    assert_eq!(deleted_at_features.timestamp_features.purpose, Some(TimestampPurpose::EventTime));
}
