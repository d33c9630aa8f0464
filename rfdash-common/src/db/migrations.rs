//! Database schema migrations
//!
//! Versioned migrations for changes that column auto-sync cannot express
//! (indexes, data fix-ups). Each applied version is recorded in the
//! `schema_version` table.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - databases in the field already ran them
//! 2. **Always add new migrations** - one function per change, bump `CURRENT_SCHEMA_VERSION`
//! 3. **Idempotent** - every migration must be safe to re-run
//! 4. **Never destructive** - dropping data belongs to the operator-confirmed reset path

use crate::shapes::Shape;
use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Get current schema version from database
///
/// Returns 0 if the schema_version table doesn't exist or has no rows
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> = sqlx::query_scalar(
        "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1"
    )
    .fetch_optional(pool)
    .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

/// Migration v1: index RF tables by site name
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: site_name indexes on RF tables");

    for shape in Shape::ALL {
        let table = shape.table_name();
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{}_site_name ON {} (site_name)",
            table, table
        ))
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Migration v2: make sure a protected admin exists
///
/// **Background:** databases seeded before the `protected` column existed
/// have an admin account that auto-sync added with `protected = 0`. The
/// oldest admin is the bootstrap account; mark it protected.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v2: protect bootstrap admin");

    let protected: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE protected = 1")
        .fetch_one(pool)
        .await?;

    if protected > 0 {
        info!("  Protected account already present - skipping");
        return Ok(());
    }

    let result = sqlx::query(
        r#"
        UPDATE accounts SET protected = 1
        WHERE id = (SELECT id FROM accounts WHERE role = 'admin' ORDER BY id ASC LIMIT 1)
        "#,
    )
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        info!("  ✓ Marked oldest admin account as protected");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema_sync::SchemaSync;
    use crate::db::table_schemas::all_tables;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        for table in all_tables() {
            SchemaSync::sync_table(&pool, table.as_ref()).await.unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn test_fresh_database_reaches_current_version() {
        let pool = setup_test_db().await;
        assert_eq!(get_schema_version(&pool).await.unwrap(), 0);

        run_migrations(&pool).await.unwrap();
        assert_eq!(get_schema_version(&pool).await.unwrap(), CURRENT_SCHEMA_VERSION);

        // Second run is a no-op
        run_migrations(&pool).await.unwrap();
        let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schema_version")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(rows, CURRENT_SCHEMA_VERSION as i64);
    }

    #[tokio::test]
    async fn test_v1_creates_site_indexes() {
        let pool = setup_test_db().await;
        run_migrations(&pool).await.unwrap();

        let indexes: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_rf_%_site_name'",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(indexes, 3);
    }

    #[tokio::test]
    async fn test_v2_protects_oldest_admin() {
        let pool = setup_test_db().await;

        for (name, role) in [("first", "admin"), ("second", "admin"), ("viewer", "user")] {
            sqlx::query("INSERT INTO accounts (username, password_hash, role) VALUES (?, 'x', ?)")
                .bind(name)
                .bind(role)
                .execute(&pool)
                .await
                .unwrap();
        }

        run_migrations(&pool).await.unwrap();

        let protected: Vec<String> =
            sqlx::query_scalar("SELECT username FROM accounts WHERE protected = 1")
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(protected, vec!["first".to_string()]);
    }
}
