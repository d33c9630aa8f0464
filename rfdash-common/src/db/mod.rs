//! Database schema, initialization and queries

pub mod accounts;
pub mod init;
pub mod migrations;
pub mod records;
pub mod schema_sync;
pub mod table_schemas;

pub use init::{init_database, InitOptions};
