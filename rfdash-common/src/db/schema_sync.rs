//! Automatic Schema Synchronization
//!
//! Schema definitions in code are the single source of truth. On startup each
//! table is created if missing, missing columns are added with
//! `ALTER TABLE ADD COLUMN`, and any drift that cannot be repaired without
//! data loss (type or constraint changes) is reported back to the caller.
//!
//! Initialization phases:
//! 1. **CREATE TABLE IF NOT EXISTS** - built from [`TableSchema::create_table_sql`]
//! 2. **Auto-Sync** - add missing columns (THIS MODULE)
//! 3. **Versioned Migrations** - `migrations.rs`
//!
//! Destructive repair (drop + recreate) is never automatic: the caller
//! decides, based on explicit operator confirmation.

use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER", "REAL", "TIMESTAMP")
    pub sql_type: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// PRIMARY KEY constraint
    pub primary_key: bool,
    /// AUTOINCREMENT on an INTEGER PRIMARY KEY
    pub autoincrement: bool,
    /// UNIQUE constraint
    pub unique: bool,
    /// DEFAULT value (SQL literal)
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    /// Create new column definition
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            autoincrement: false,
            unique: false,
            default_value: None,
        }
    }

    /// Mark column as PRIMARY KEY
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark column as INTEGER PRIMARY KEY AUTOINCREMENT
    pub fn autoincrement(mut self) -> Self {
        self.primary_key = true;
        self.autoincrement = true;
        self
    }

    /// Mark column as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark column as UNIQUE
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set DEFAULT value
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Column clause for CREATE TABLE
    fn to_sql(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
            if self.autoincrement {
                sql.push_str(" AUTOINCREMENT");
            }
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = &self.default_value {
            sql.push_str(&format!(" DEFAULT {}", default));
        }
        sql
    }
}

/// Actual column from database introspection (PRAGMA table_info result)
#[derive(Debug, Clone)]
pub struct ActualColumn {
    /// Column ID (position in table)
    pub cid: i32,
    /// Column name
    pub name: String,
    /// SQL type from PRAGMA table_info
    pub type_name: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// DEFAULT value
    pub default_value: Option<String>,
    /// PRIMARY KEY flag
    pub pk: bool,
}

/// Schema drift detected between expected and actual schema
#[derive(Debug, Clone)]
pub enum SchemaDrift {
    /// Column missing from database (repairable)
    MissingColumn {
        table: String,
        column: ColumnDefinition,
    },
    /// Column type mismatch (not repairable in place)
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
    /// Constraint mismatch (not repairable in place)
    ConstraintMismatch {
        table: String,
        column: String,
        constraint: String,
    },
}

impl SchemaDrift {
    /// Whether `ALTER TABLE` can repair this drift without losing data
    pub fn is_repairable(&self) -> bool {
        matches!(self, SchemaDrift::MissingColumn { .. })
    }
}

impl std::fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaDrift::MissingColumn { table, column } => {
                write!(f, "{}.{} missing", table, column.name)
            }
            SchemaDrift::TypeMismatch { table, column, expected, actual } => {
                write!(f, "{}.{} is {} (expected {})", table, column, actual, expected)
            }
            SchemaDrift::ConstraintMismatch { table, column, constraint } => {
                write!(f, "{}.{} lacks {}", table, column, constraint)
            }
        }
    }
}

/// Defines expected schema for a database table
pub trait TableSchema: Send + Sync {
    /// Table name in database
    fn table_name(&self) -> &'static str;

    /// Expected column definitions (order matters for new table creation)
    fn expected_columns(&self) -> Vec<ColumnDefinition>;

    /// CREATE TABLE IF NOT EXISTS statement built from the expected columns
    fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .expected_columns()
            .iter()
            .map(ColumnDefinition::to_sql)
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.table_name(),
            columns.join(",\n    ")
        )
    }
}

/// Schema introspection - read actual database schema
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Read actual columns from database table using PRAGMA table_info
    ///
    /// Returns columns in database order (by cid)
    pub async fn introspect_table(
        pool: &SqlitePool,
        table_name: &str
    ) -> Result<Vec<ActualColumn>> {
        let query = format!("PRAGMA table_info({})", table_name);
        let rows = sqlx::query(&query).fetch_all(pool).await?;

        let mut columns: Vec<ActualColumn> = rows.iter().map(|row| {
            ActualColumn {
                cid: row.get("cid"),
                name: row.get("name"),
                type_name: row.get("type"),
                not_null: row.get::<i32, _>("notnull") != 0,
                default_value: row.get("dflt_value"),
                pk: row.get::<i32, _>("pk") != 0,
            }
        }).collect();

        columns.sort_by_key(|c| c.cid);

        Ok(columns)
    }

    /// Check if table exists
    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sqlite_master
                WHERE type='table' AND name = ?
            )
            "#
        )
        .bind(table_name)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}

/// Schema comparison - detect drift between expected and actual
pub struct SchemaDiff;

impl SchemaDiff {
    /// Compare expected schema to actual database schema
    pub fn compare(
        table_name: &str,
        expected: &[ColumnDefinition],
        actual: &[ActualColumn]
    ) -> Vec<SchemaDrift> {
        let mut drift = Vec::new();

        for expected_col in expected {
            let Some(actual_col) = actual.iter().find(|c| c.name == expected_col.name) else {
                drift.push(SchemaDrift::MissingColumn {
                    table: table_name.to_string(),
                    column: expected_col.clone(),
                });
                continue;
            };

            if !Self::types_compatible(&expected_col.sql_type, &actual_col.type_name) {
                drift.push(SchemaDrift::TypeMismatch {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    expected: expected_col.sql_type.clone(),
                    actual: actual_col.type_name.clone(),
                });
            }

            // SQLite reports notnull = 0 for INTEGER PRIMARY KEY columns
            if expected_col.not_null && !actual_col.not_null && !actual_col.pk {
                drift.push(SchemaDrift::ConstraintMismatch {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    constraint: "NOT NULL".to_string(),
                });
            }

            if expected_col.primary_key && !actual_col.pk {
                drift.push(SchemaDrift::ConstraintMismatch {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    constraint: "PRIMARY KEY".to_string(),
                });
            }
        }

        drift
    }

    /// Check if SQL types are compatible (SQLite type affinity rules)
    fn types_compatible(expected: &str, actual: &str) -> bool {
        let exp = expected.to_uppercase();
        let act = actual.to_uppercase();

        if exp == act {
            return true;
        }

        let is_int = |t: &str| t.contains("INT");
        let is_text = |t: &str| t.contains("TEXT") || t.contains("CHAR") || t.contains("CLOB");
        let is_real = |t: &str| t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB");

        (is_int(&exp) && is_int(&act))
            || (is_text(&exp) && is_text(&act))
            || (is_real(&exp) && is_real(&act))
    }
}

/// Schema synchronization - apply schema changes to database
pub struct SchemaSync;

impl SchemaSync {
    /// Create the table if missing, add missing columns, and return the
    /// drift that could not be repaired in place
    ///
    /// **What this CAN fix:**
    /// - Missing tables (CREATE TABLE IF NOT EXISTS)
    /// - Missing columns (ALTER TABLE ADD COLUMN)
    ///
    /// **What this reports (requires operator decision):**
    /// - Type changes
    /// - Constraint changes
    pub async fn sync_table(pool: &SqlitePool, schema: &dyn TableSchema) -> Result<Vec<SchemaDrift>> {
        let table_name = schema.table_name();

        sqlx::query(&schema.create_table_sql()).execute(pool).await?;

        let actual = SchemaIntrospector::introspect_table(pool, table_name).await?;
        let drift = SchemaDiff::compare(table_name, &schema.expected_columns(), &actual);

        if drift.is_empty() {
            info!("  ✓ Schema up to date for '{}'", table_name);
            return Ok(Vec::new());
        }

        let mut unrepaired = Vec::new();
        for change in drift {
            match change {
                SchemaDrift::MissingColumn { table, column } => {
                    Self::add_column(pool, &table, &column).await?;
                }
                other => {
                    warn!("  ⚠ Schema drift: {}", other);
                    unrepaired.push(other);
                }
            }
        }

        Ok(unrepaired)
    }

    /// Drop and recreate a table from its expected schema
    ///
    /// Destroys every row in the table. Callers must only invoke this with
    /// explicit operator confirmation.
    pub async fn recreate_table(pool: &SqlitePool, schema: &dyn TableSchema) -> Result<()> {
        let table_name = schema.table_name();
        warn!("  ⚠ Dropping and recreating table '{}' (all rows discarded)", table_name);

        let mut tx = pool.begin().await?;
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table_name))
            .execute(&mut *tx)
            .await?;
        sqlx::query(&schema.create_table_sql())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(())
    }

    /// Add missing column to table via ALTER TABLE ADD COLUMN
    async fn add_column(
        pool: &SqlitePool,
        table: &str,
        column: &ColumnDefinition
    ) -> Result<()> {
        let mut sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            table, column.name, column.sql_type
        );

        // SQLite cannot add PRIMARY KEY or UNIQUE columns in place, and
        // NOT NULL only with a DEFAULT
        if column.primary_key || column.unique {
            warn!(
                "  ⚠ Cannot add key/unique column {}.{} via ALTER TABLE; adding it without the constraint",
                table, column.name
            );
        }

        match (&column.default_value, column.not_null) {
            (Some(default), true) => sql.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (Some(default), false) => sql.push_str(&format!(" DEFAULT {}", default)),
            (None, true) => warn!(
                "  ⚠ Cannot add NOT NULL column {}.{} without DEFAULT value. Column will be nullable.",
                table, column.name
            ),
            (None, false) => {}
        }

        info!("  ✓ Adding column: {}.{} ({})", table, column.name, column.sql_type);

        match sqlx::query(&sql).execute(pool).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
                info!("  Column {}.{} already added", table, column.name);
                Ok(())
            }
            Err(e) => Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    struct WidgetTable;

    impl TableSchema for WidgetTable {
        fn table_name(&self) -> &'static str {
            "widgets"
        }

        fn expected_columns(&self) -> Vec<ColumnDefinition> {
            vec![
                ColumnDefinition::new("id", "INTEGER").autoincrement(),
                ColumnDefinition::new("name", "TEXT").not_null().unique(),
                ColumnDefinition::new("weight", "REAL"),
                ColumnDefinition::new("status", "TEXT").not_null().default("'new'"),
            ]
        }
    }

    #[test]
    fn test_column_definition_builder() {
        let col = ColumnDefinition::new("test_col", "TEXT")
            .not_null()
            .unique()
            .default("'default_value'");

        assert_eq!(col.name, "test_col");
        assert_eq!(col.sql_type, "TEXT");
        assert!(col.not_null);
        assert!(col.unique);
        assert_eq!(col.default_value, Some("'default_value'".to_string()));
        assert_eq!(col.to_sql(), "test_col TEXT NOT NULL UNIQUE DEFAULT 'default_value'");
    }

    #[test]
    fn test_create_table_sql() {
        let sql = WidgetTable.create_table_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS widgets ("));
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("name TEXT NOT NULL UNIQUE"));
        assert!(sql.contains("status TEXT NOT NULL DEFAULT 'new'"));
    }

    #[test]
    fn test_types_compatible() {
        assert!(SchemaDiff::types_compatible("TEXT", "TEXT"));
        assert!(SchemaDiff::types_compatible("text", "TEXT"));
        assert!(SchemaDiff::types_compatible("INTEGER", "INT"));
        assert!(SchemaDiff::types_compatible("TEXT", "VARCHAR"));
        assert!(SchemaDiff::types_compatible("DOUBLE", "REAL"));
        assert!(SchemaDiff::types_compatible("REAL", "FLOAT"));

        assert!(!SchemaDiff::types_compatible("TEXT", "INTEGER"));
        assert!(!SchemaDiff::types_compatible("REAL", "TEXT"));
    }

    #[tokio::test]
    async fn test_sync_creates_missing_table() {
        let pool = setup_test_db().await;

        let drift = SchemaSync::sync_table(&pool, &WidgetTable).await.unwrap();
        assert!(drift.is_empty());
        assert!(SchemaIntrospector::table_exists(&pool, "widgets").await.unwrap());

        let columns = SchemaIntrospector::introspect_table(&pool, "widgets")
            .await
            .unwrap();
        assert_eq!(columns.len(), 4);
        assert!(columns[0].pk);
    }

    #[tokio::test]
    async fn test_sync_adds_missing_column() {
        let pool = setup_test_db().await;

        sqlx::query("CREATE TABLE widgets (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE)")
            .execute(&pool)
            .await
            .unwrap();

        let drift = SchemaSync::sync_table(&pool, &WidgetTable).await.unwrap();
        assert!(drift.is_empty());

        let columns = SchemaIntrospector::introspect_table(&pool, "widgets")
            .await
            .unwrap();
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[2].name, "weight");
        assert_eq!(columns[3].name, "status");
        assert_eq!(columns[3].default_value, Some("'new'".to_string()));
    }

    #[tokio::test]
    async fn test_type_mismatch_reported_not_repaired() {
        let pool = setup_test_db().await;

        sqlx::query("CREATE TABLE widgets (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE, weight TEXT, status TEXT NOT NULL DEFAULT 'new')")
            .execute(&pool)
            .await
            .unwrap();

        let drift = SchemaSync::sync_table(&pool, &WidgetTable).await.unwrap();
        assert_eq!(drift.len(), 1);
        match &drift[0] {
            SchemaDrift::TypeMismatch { table, column, expected, actual } => {
                assert_eq!(table, "widgets");
                assert_eq!(column, "weight");
                assert_eq!(expected, "REAL");
                assert_eq!(actual, "TEXT");
            }
            other => panic!("Expected TypeMismatch, got {:?}", other),
        }
        assert!(!drift[0].is_repairable());
    }

    #[tokio::test]
    async fn test_recreate_table_applies_expected_schema() {
        let pool = setup_test_db().await;

        sqlx::query("CREATE TABLE widgets (id INTEGER PRIMARY KEY, weight TEXT)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO widgets (weight) VALUES ('heavy')")
            .execute(&pool)
            .await
            .unwrap();

        SchemaSync::recreate_table(&pool, &WidgetTable).await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM widgets")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);

        let columns = SchemaIntrospector::introspect_table(&pool, "widgets")
            .await
            .unwrap();
        let weight = columns.iter().find(|c| c.name == "weight").unwrap();
        assert_eq!(weight.type_name, "REAL");
    }
}
