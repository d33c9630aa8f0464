//! Database initialization
//!
//! Startup sequence:
//! 1. Open (or create) the SQLite database
//! 2. Schema sync: create missing tables, add missing columns
//! 3. Incompatible drift: abort, or drop + recreate the drifted tables when
//!    the operator confirmed it
//! 4. Versioned migrations
//! 5. Seed the bootstrap admin when no account exists

use crate::db::accounts::ensure_bootstrap_admin;
use crate::db::migrations::run_migrations;
use crate::db::schema_sync::{SchemaDrift, SchemaSync};
use crate::db::table_schemas::all_tables;
use crate::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Options controlling database initialization
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Operator confirmed that drifted tables may be dropped and recreated
    pub reset_on_schema_drift: bool,
    /// Password for the bootstrap admin (first run only)
    pub bootstrap_password: String,
    /// bcrypt cost for the bootstrap admin hash
    pub password_hash_cost: u32,
}

/// Extract the file path from a `sqlite://` URL, if it names a file
pub fn database_file_path(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or(rest);
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Open the database and bring its schema up to date
pub async fn init_database(database_url: &str, options: &InitOptions) -> Result<SqlitePool> {
    let pool = connect(database_url).await?;

    sync_schema(&pool, options.reset_on_schema_drift).await?;
    run_migrations(&pool).await?;

    if ensure_bootstrap_admin(&pool, &options.bootstrap_password, options.password_hash_cost).await? {
        warn!("Bootstrap admin created - change its password after first login");
    }

    Ok(pool)
}

/// Connect to the database, creating the file and its directory if needed
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    let file_path = database_file_path(database_url);
    let newly_created = file_path.as_ref().is_some_and(|p| !p.exists());

    if let Some(parent) = file_path.as_ref().and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let connect_options = SqliteConnectOptions::from_str(database_url)
        .map_err(|e| Error::Config(format!("Invalid database URL '{}': {}", database_url, e)))?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(connect_options)
        .await?;

    match &file_path {
        Some(path) if newly_created => info!("Initialized new database: {}", path.display()),
        Some(path) => info!("Opened existing database: {}", path.display()),
        None => info!("Opened database: {}", database_url),
    }

    Ok(pool)
}

/// Sync every table; handle drift that ALTER TABLE cannot repair
pub async fn sync_schema(pool: &SqlitePool, reset_on_schema_drift: bool) -> Result<()> {
    info!("=== Schema Synchronization ===");

    let mut drifted: Vec<(usize, Vec<SchemaDrift>)> = Vec::new();
    let tables = all_tables();

    for (idx, table) in tables.iter().enumerate() {
        let drift = SchemaSync::sync_table(pool, table.as_ref()).await?;
        if !drift.is_empty() {
            drifted.push((idx, drift));
        }
    }

    if drifted.is_empty() {
        info!("=== Schema Synchronization Complete ===");
        return Ok(());
    }

    let summary: Vec<String> = drifted
        .iter()
        .flat_map(|(_, drift)| drift.iter().map(|d| d.to_string()))
        .collect();

    if !reset_on_schema_drift {
        return Err(Error::SchemaDrift(format!(
            "{}. Re-run with --reset-on-schema-drift to drop and recreate the affected tables (their rows will be lost).",
            summary.join("; ")
        )));
    }

    warn!("Operator confirmed destructive reset for drift: {}", summary.join("; "));
    for (idx, _) in &drifted {
        SchemaSync::recreate_table(pool, tables[*idx].as_ref()).await?;
    }

    info!("=== Schema Synchronization Complete (tables recreated) ===");
    Ok(())
}
