//! Migration handler tests against in-memory SQLite.

mod common;

use std::sync::{Arc, Mutex};

use machinjiri_migrate::prelude::*;
use machinjiri_migrate::Ledger;

use common::{memory_database, table_exists, Broken, CreateTable};

const USERS: &str = "2024_01_01_000000_create_users_table";
const POSTS: &str = "2024_01_02_000000_create_posts_table";
const TAGS: &str = "2024_02_01_000000_create_tags_table";

fn fixtures() -> (Arc<Mutex<Vec<String>>>, CreateTable, CreateTable, CreateTable) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let users = CreateTable::new("users", &log);
    let posts = CreateTable::new("posts", &log);
    let tags = CreateTable::new("tags", &log);
    (log, users, posts, tags)
}

#[tokio::test]
async fn test_ledger_open_is_idempotent() {
    let db = memory_database().await;
    let ledger = Ledger::open(db.clone(), "migrations").await.unwrap();
    ledger.record(USERS, 1).await.unwrap();

    let reopened = Ledger::open(db.clone(), "migrations").await.unwrap();
    assert_eq!(reopened.applied().await.unwrap(), vec![USERS]);
    assert_eq!(reopened.last_batch().await.unwrap(), 1);
    assert_eq!(reopened.next_batch().await.unwrap(), 2);

    let entries = reopened.entries().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].batch, 1);
    assert!(entries[0].created_at.is_some());

    reopened.remove(USERS).await.unwrap();
    assert!(reopened.applied().await.unwrap().is_empty());
    assert_eq!(reopened.last_batch().await.unwrap(), 0);
}

#[tokio::test]
async fn test_migrate_is_idempotent() {
    let db = memory_database().await;
    let (_log, users, posts, _tags) = fixtures();
    let mut registry = MigrationRegistry::new();
    registry
        .register(USERS, users.clone())
        .unwrap()
        .register(POSTS, posts.clone())
        .unwrap();

    let handler = MigrationHandler::new(db.clone(), Arc::new(registry))
        .await
        .unwrap();
    assert_eq!(handler.migrate().await.unwrap(), vec![USERS, POSTS]);
    assert!(handler.migrate().await.unwrap().is_empty());

    assert_eq!(users.ups(), 1);
    assert_eq!(posts.ups(), 1);
    assert!(table_exists(&db, "users").await);
    assert!(table_exists(&db, "posts").await);
    assert_eq!(handler.ledger().last_batch().await.unwrap(), 1);
}

#[tokio::test]
async fn test_each_migrate_call_is_a_batch() {
    let db = memory_database().await;
    let (_log, users, posts, tags) = fixtures();

    let mut registry = MigrationRegistry::new();
    registry.register(USERS, users.clone()).unwrap();
    let handler = MigrationHandler::new(db.clone(), Arc::new(registry.clone()))
        .await
        .unwrap();
    handler.migrate().await.unwrap();

    registry
        .register(POSTS, posts)
        .unwrap()
        .register(TAGS, tags)
        .unwrap();
    let handler = MigrationHandler::new(db.clone(), Arc::new(registry))
        .await
        .unwrap();

    let plan = handler.plan().await.unwrap();
    assert_eq!(plan.batch, 2);
    assert_eq!(plan.pending, vec![POSTS, TAGS]);
    handler.apply(&plan).await.unwrap();

    let ledger = handler.ledger();
    assert_eq!(ledger.migrations_in_batch(1).await.unwrap(), vec![USERS]);
    assert_eq!(ledger.migrations_in_batch(2).await.unwrap(), vec![TAGS, POSTS]);
}

#[tokio::test]
async fn test_rollback_reverts_last_batch_in_reverse_order() {
    let db = memory_database().await;
    let (log, users, posts, tags) = fixtures();

    let mut registry = MigrationRegistry::new();
    registry.register(USERS, users.clone()).unwrap();
    MigrationHandler::new(db.clone(), Arc::new(registry.clone()))
        .await
        .unwrap()
        .migrate()
        .await
        .unwrap();

    registry
        .register(POSTS, posts.clone())
        .unwrap()
        .register(TAGS, tags.clone())
        .unwrap();
    let handler = MigrationHandler::new(db.clone(), Arc::new(registry))
        .await
        .unwrap();
    handler.migrate().await.unwrap();
    log.lock().unwrap().clear();

    assert_eq!(handler.rollback().await.unwrap(), vec![TAGS, POSTS]);
    assert_eq!(*log.lock().unwrap(), vec!["down:tags", "down:posts"]);
    assert_eq!(users.downs(), 0);
    assert!(table_exists(&db, "users").await);
    assert!(!table_exists(&db, "posts").await);
    assert_eq!(handler.ledger().applied().await.unwrap(), vec![USERS]);

    // Rolled-back migrations are pending again.
    assert_eq!(handler.plan().await.unwrap().pending, vec![POSTS, TAGS]);
}

#[tokio::test]
async fn test_rollback_on_empty_ledger_is_noop() {
    let db = memory_database().await;
    let handler = MigrationHandler::new(db, Arc::new(MigrationRegistry::new()))
        .await
        .unwrap();
    assert!(handler.rollback().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rollback_with_unregistered_migration_aborts() {
    let db = memory_database().await;
    let (_log, users, _posts, _tags) = fixtures();

    let mut registry = MigrationRegistry::new();
    registry.register(USERS, users.clone()).unwrap();
    let handler = MigrationHandler::new(db.clone(), Arc::new(registry))
        .await
        .unwrap();
    handler.migrate().await.unwrap();
    handler
        .ledger()
        .record("2024_01_05_000000_removed_from_code", 1)
        .await
        .unwrap();

    let err = handler.rollback().await.unwrap_err();
    assert_eq!(err.code(), 2001);
    assert!(matches!(err, MigrateError::MigrationNotFound(ref name) if name == "2024_01_05_000000_removed_from_code"));
    // Nothing was reverted.
    assert_eq!(users.downs(), 0);
    assert_eq!(handler.ledger().applied().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_failed_migration_leaves_partial_batch() {
    let db = memory_database().await;
    let (_log, users, _posts, _tags) = fixtures();

    let mut registry = MigrationRegistry::new();
    registry
        .register(USERS, users)
        .unwrap()
        .register("2024_01_03_000000_broken", Broken)
        .unwrap();
    let handler = MigrationHandler::new(db, Arc::new(registry)).await.unwrap();

    let err = handler.migrate().await.unwrap_err();
    assert_eq!(err.code(), 1003);
    assert_eq!(handler.ledger().applied().await.unwrap(), vec![USERS]);
    assert_eq!(
        handler.plan().await.unwrap().pending,
        vec!["2024_01_03_000000_broken"]
    );
}

#[tokio::test]
async fn test_reset_rolls_back_every_batch() {
    let db = memory_database().await;
    let (log, users, posts, _tags) = fixtures();

    let mut registry = MigrationRegistry::new();
    registry.register(USERS, users).unwrap();
    MigrationHandler::new(db.clone(), Arc::new(registry.clone()))
        .await
        .unwrap()
        .migrate()
        .await
        .unwrap();
    registry.register(POSTS, posts).unwrap();
    let handler = MigrationHandler::new(db.clone(), Arc::new(registry))
        .await
        .unwrap();
    handler.migrate().await.unwrap();
    log.lock().unwrap().clear();

    assert_eq!(handler.reset().await.unwrap(), vec![POSTS, USERS]);
    assert_eq!(*log.lock().unwrap(), vec!["down:posts", "down:users"]);
    assert!(handler.ledger().applied().await.unwrap().is_empty());
    assert!(!table_exists(&db, "users").await);
}

#[tokio::test]
async fn test_status_reports_applied_pending_and_missing() {
    let db = memory_database().await;
    let (_log, users, posts, _tags) = fixtures();

    let mut registry = MigrationRegistry::new();
    registry
        .register(USERS, users)
        .unwrap()
        .register(POSTS, posts)
        .unwrap();
    let handler = MigrationHandler::new(db, Arc::new(registry)).await.unwrap();
    let plan = machinjiri_migrate::MigrationPlan {
        batch: 1,
        pending: vec![USERS.to_string()],
    };
    handler.apply(&plan).await.unwrap();
    handler
        .ledger()
        .record("2023_12_31_000000_legacy", 1)
        .await
        .unwrap();

    let status = handler.status().await.unwrap();
    assert_eq!(status.len(), 3);

    assert_eq!(status[0].name, USERS);
    assert_eq!(status[0].batch, Some(1));
    assert!(status[0].applied_at.is_some());
    assert!(status[0].registered);

    assert_eq!(status[1].name, POSTS);
    assert!(!status[1].is_applied());

    assert_eq!(status[2].name, "2023_12_31_000000_legacy");
    assert!(!status[2].registered);
}

#[tokio::test]
async fn test_custom_ledger_table_and_prefix() {
    let conn = machinjiri_sql_sqlite::SqliteConnector::connect("sqlite::memory:", 1)
        .await
        .unwrap();
    let db = Database::with_prefix(Arc::new(conn), "app_").unwrap();
    let (_log, users, _posts, _tags) = fixtures();
    let mut registry = MigrationRegistry::new();
    registry.register(USERS, users).unwrap();

    let handler = MigrationHandler::with_table(db.clone(), Arc::new(registry), "schema_log")
        .await
        .unwrap();
    handler.migrate().await.unwrap();

    assert!(table_exists(&db, "app_schema_log").await);
    assert!(table_exists(&db, "app_users").await);
}

/// Two handlers sharing a ledger with no lock between them: both run the
/// same `up()`, and the second one fails only when recording it.
#[tokio::test]
async fn test_concurrent_handlers_double_apply() {
    let db = memory_database().await;
    let (_log, users, _posts, _tags) = fixtures();
    let mut registry = MigrationRegistry::new();
    registry.register(USERS, users.clone()).unwrap();
    let registry = Arc::new(registry);

    let first = MigrationHandler::new(db.clone(), Arc::clone(&registry))
        .await
        .unwrap();
    let second = MigrationHandler::new(db.clone(), Arc::clone(&registry))
        .await
        .unwrap();

    let stale_plan = first.plan().await.unwrap();
    assert_eq!(stale_plan.pending, vec![USERS]);

    second.migrate().await.unwrap();
    let err = first.apply(&stale_plan).await.unwrap_err();

    assert_eq!(users.ups(), 2);
    assert_eq!(err.code(), 1003);
    assert_eq!(first.ledger().applied().await.unwrap(), vec![USERS]);
}
