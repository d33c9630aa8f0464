//! # RF Dashboard Common Library
//!
//! Shared code for the RF dashboard:
//! - Database initialization, schema sync and migrations
//! - Account storage and credential hashing
//! - RF record shapes (3G/4G/5G field schemas)
//! - Spreadsheet import pipeline
//! - Configuration resolution

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod shapes;

pub use error::{Error, Result};
pub use shapes::{FieldKind, FieldSpec, Shape};
