//! Table Schema Definitions
//!
//! Single source of truth for database table schemas. The RF tables are
//! derived from the shape field lists in [`crate::shapes`].

use crate::db::schema_sync::{ColumnDefinition, TableSchema};
use crate::shapes::{Shape, ID_FIELD};

/// Migration bookkeeping table
pub struct SchemaVersionTable;

impl TableSchema for SchemaVersionTable {
    fn table_name(&self) -> &'static str {
        "schema_version"
    }

    fn expected_columns(&self) -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("version", "INTEGER").primary_key(),
            ColumnDefinition::new("applied_at", "TIMESTAMP")
                .not_null()
                .default("CURRENT_TIMESTAMP"),
        ]
    }
}

/// User accounts
pub struct AccountsTable;

impl TableSchema for AccountsTable {
    fn table_name(&self) -> &'static str {
        "accounts"
    }

    fn expected_columns(&self) -> Vec<ColumnDefinition> {
        vec![
            ColumnDefinition::new("id", "INTEGER").autoincrement(),
            ColumnDefinition::new("username", "TEXT").not_null().unique(),
            ColumnDefinition::new("password_hash", "TEXT").not_null(),
            ColumnDefinition::new("role", "TEXT")
                .not_null()
                .default("'user'"),
            // Set only on the bootstrap admin
            ColumnDefinition::new("protected", "INTEGER")
                .not_null()
                .default("0"),
            ColumnDefinition::new("created_at", "TIMESTAMP")
                .not_null()
                .default("CURRENT_TIMESTAMP"),
        ]
    }
}

/// One RF record table per shape
pub struct RfTable(pub Shape);

impl TableSchema for RfTable {
    fn table_name(&self) -> &'static str {
        self.0.table_name()
    }

    fn expected_columns(&self) -> Vec<ColumnDefinition> {
        let mut columns = vec![ColumnDefinition::new(ID_FIELD, "INTEGER").autoincrement()];
        columns.extend(
            self.0
                .fields()
                .iter()
                .map(|field| ColumnDefinition::new(field.name, field.kind.sql_type())),
        );
        columns
    }
}

/// Every table the dashboard owns, in creation order
pub fn all_tables() -> Vec<Box<dyn TableSchema>> {
    let mut tables: Vec<Box<dyn TableSchema>> =
        vec![Box::new(SchemaVersionTable), Box::new(AccountsTable)];
    tables.extend(Shape::ALL.iter().map(|&shape| Box::new(RfTable(shape)) as Box<dyn TableSchema>));
    tables
}
