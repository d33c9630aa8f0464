//! Integration tests for database initialization
//!
//! Covers first-run creation, reopening, bootstrap seeding, migrations and
//! the startup drift policy.

use rfdash_common::config::sqlite_url;
use rfdash_common::db::accounts::{authenticate, count_accounts, list_accounts, BOOTSTRAP_USERNAME};
use rfdash_common::db::migrations::{get_schema_version, CURRENT_SCHEMA_VERSION};
use rfdash_common::db::schema_sync::SchemaIntrospector;
use rfdash_common::db::{init_database, InitOptions};
use rfdash_common::Error;
use sqlx::SqlitePool;
use tempfile::TempDir;

fn options() -> InitOptions {
    InitOptions {
        reset_on_schema_drift: false,
        bootstrap_password: "bootstrap-pass".to_string(),
        password_hash_cost: 4,
    }
}

fn db_url(dir: &TempDir) -> String {
    sqlite_url(&dir.path().join("data").join("rfdash.db"))
}

#[tokio::test]
async fn test_database_created_when_missing() {
    let dir = TempDir::new().unwrap();
    let url = db_url(&dir);

    let pool = init_database(&url, &options()).await.unwrap();

    assert!(dir.path().join("data").join("rfdash.db").exists());
    for table in ["accounts", "rf_3g", "rf_4g", "rf_5g", "schema_version"] {
        assert!(
            SchemaIntrospector::table_exists(&pool, table).await.unwrap(),
            "table {} missing",
            table
        );
    }
    assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);
}

#[tokio::test]
async fn test_bootstrap_admin_seeded_once() {
    let dir = TempDir::new().unwrap();
    let url = db_url(&dir);

    let pool = init_database(&url, &options()).await.unwrap();
    let accounts = list_accounts(&pool).await.unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].username, BOOTSTRAP_USERNAME);
    assert!(accounts[0].is_admin());
    assert!(accounts[0].protected);

    let admin = authenticate(&pool, BOOTSTRAP_USERNAME, "bootstrap-pass").await.unwrap();
    assert!(admin.is_some());
    pool.close().await;

    // Reopening with another bootstrap password changes nothing
    let reopened = InitOptions {
        bootstrap_password: "different".to_string(),
        ..options()
    };
    let pool = init_database(&url, &reopened).await.unwrap();
    assert_eq!(count_accounts(&pool).await.unwrap(), 1);
    assert!(authenticate(&pool, BOOTSTRAP_USERNAME, "different").await.unwrap().is_none());
}

async fn create_legacy_rf_3g(url: &str, frequency_type: &str) {
    let pool = SqlitePool::connect(url).await.unwrap();
    sqlx::query(&format!(
        "CREATE TABLE rf_3g (id INTEGER PRIMARY KEY AUTOINCREMENT, site_name TEXT, frequency {})",
        frequency_type
    ))
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO rf_3g (site_name, frequency) VALUES ('OLD', 900)")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;
}

#[tokio::test]
async fn test_missing_columns_added_without_data_loss() {
    let dir = TempDir::new().unwrap();
    let url = db_url(&dir);
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    create_legacy_rf_3g(&url, "INTEGER").await;

    let pool = init_database(&url, &options()).await.unwrap();

    let columns = SchemaIntrospector::introspect_table(&pool, "rf_3g").await.unwrap();
    assert!(columns.iter().any(|c| c.name == "hang_sx"));
    assert!(columns.iter().any(|c| c.name == "uarfcn"));

    let kept: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rf_3g WHERE site_name = 'OLD'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(kept, 1);
}

#[tokio::test]
async fn test_incompatible_drift_aborts_without_confirmation() {
    let dir = TempDir::new().unwrap();
    let url = db_url(&dir);
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    create_legacy_rf_3g(&url, "TEXT").await;

    match init_database(&url, &options()).await {
        Err(Error::SchemaDrift(message)) => {
            assert!(message.contains("rf_3g"), "{}", message);
            assert!(message.contains("--reset-on-schema-drift"), "{}", message);
        }
        other => panic!("expected schema drift error, got {:?}", other.map(|_| ())),
    }

    // Nothing was dropped
    let pool = SqlitePool::connect(&url).await.unwrap();
    let kept: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rf_3g")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(kept, 1);
}

#[tokio::test]
async fn test_incompatible_drift_recreated_with_confirmation() {
    let dir = TempDir::new().unwrap();
    let url = db_url(&dir);
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    create_legacy_rf_3g(&url, "TEXT").await;

    let confirmed = InitOptions {
        reset_on_schema_drift: true,
        ..options()
    };
    let pool = init_database(&url, &confirmed).await.unwrap();

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rf_3g")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);

    let columns = SchemaIntrospector::introspect_table(&pool, "rf_3g").await.unwrap();
    let frequency = columns.iter().find(|c| c.name == "frequency").unwrap();
    assert_eq!(frequency.type_name.to_uppercase(), "INTEGER");
}

#[tokio::test]
async fn test_migrations_idempotent() {
    let dir = TempDir::new().unwrap();
    let url = db_url(&dir);

    let pool = init_database(&url, &options()).await.unwrap();
    pool.close().await;
    let pool = init_database(&url, &options()).await.unwrap();

    let versions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(versions, CURRENT_SCHEMA_VERSION as i64);

    let indexes: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_rf_%_site_name'",
    )
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(indexes, 3);
}
