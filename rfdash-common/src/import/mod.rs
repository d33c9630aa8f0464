//! Spreadsheet import pipeline
//!
//! uploaded file → format dispatch → header normalization → row
//! materialization → column filtering → null coercion → type coercion →
//! single-transaction append.
//!
//! Every step before persistence is pure; [`prepare_batch`] can be tested
//! without a database.

pub mod coerce;
pub mod headers;
pub mod reader;

use crate::db::records::insert_batch;
use crate::shapes::{FieldSpec, Shape};
use sqlx::SqlitePool;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{info, warn};

/// One untyped cell as reported by a reader
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// One data row and where it sits in the source file
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based spreadsheet row (or CSV line) the row starts on
    pub line: usize,
    pub cells: Vec<RawCell>,
}

/// Header row plus data rows, exactly as read
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// A typed value ready for storage
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }
}

/// Records of one shape, all with the same column list
#[derive(Debug, Clone)]
pub struct RecordBatch {
    pub shape: Shape,
    /// Retained columns, in spreadsheet order
    pub columns: Vec<&'static FieldSpec>,
    /// One value per column for each record
    pub records: Vec<Vec<FieldValue>>,
}

/// Import errors
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("No file selected")]
    NoFile,

    #[error("Unsupported file format: {0} (expected .csv, .xls or .xlsx)")]
    UnsupportedFormat(String),

    #[error("Invalid data type: {0}")]
    InvalidShape(String),

    #[error("Cannot parse file: {0}")]
    Parse(String),

    #[error("No column of the file matches a {0} field")]
    NoMatchingColumns(Shape),

    #[error("Row {row}, column '{column}': cannot read '{value}' as {expected}")]
    Coercion {
        row: usize,
        column: String,
        value: String,
        expected: &'static str,
    },

    #[error("Import failed: {0}")]
    Storage(#[from] crate::Error),
}

impl ImportError {
    /// Nothing was attempted; reported as a warning rather than an error
    pub fn is_warning(&self) -> bool {
        matches!(self, ImportError::NoFile)
    }
}

/// Outcome of a successful import
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub shape: Shape,
    pub filename: String,
    pub imported: u64,
    /// Original headers that matched no field of the shape
    pub dropped_columns: Vec<String>,
    pub skipped_blank_rows: usize,
}

/// Result of the pure part of the pipeline
#[derive(Debug, Clone)]
pub struct PreparedImport {
    pub batch: RecordBatch,
    pub dropped_columns: Vec<String>,
    pub skipped_blank_rows: usize,
}

/// Normalize, filter and coerce a raw table into a batch of `shape` records
pub fn prepare_batch(shape: Shape, table: &RawTable) -> Result<PreparedImport, ImportError> {
    // (source column index, target field)
    let mut retained: Vec<(usize, &'static FieldSpec)> = Vec::new();
    let mut seen: HashSet<&'static str> = HashSet::new();
    let mut dropped_columns = Vec::new();

    for (idx, header) in table.headers.iter().enumerate() {
        let canonical = headers::normalize_header(header);
        match shape.field(&canonical) {
            Some(field) if seen.insert(field.name) => retained.push((idx, field)),
            Some(_) => dropped_columns.push(header.trim().to_string()),
            None if canonical.is_empty() => {}
            None => dropped_columns.push(header.trim().to_string()),
        }
    }

    let mut records = Vec::with_capacity(table.rows.len());
    let mut skipped_blank_rows = 0;

    for row in &table.rows {
        if row.cells.iter().all(RawCell::is_missing) {
            skipped_blank_rows += 1;
            continue;
        }

        // Rows with content but no recognized column would store all-NULL records
        if retained.is_empty() {
            return Err(ImportError::NoMatchingColumns(shape));
        }

        let mut record = Vec::with_capacity(retained.len());
        for (col_idx, field) in &retained {
            let cell = row.cells.get(*col_idx).unwrap_or(&RawCell::Empty);
            let value = coerce::coerce(cell, field.kind).map_err(|expected| ImportError::Coercion {
                row: row.line,
                column: table.headers[*col_idx].trim().to_string(),
                value: raw_display(cell),
                expected,
            })?;
            record.push(value);
        }
        records.push(record);
    }

    Ok(PreparedImport {
        batch: RecordBatch {
            shape,
            columns: retained.into_iter().map(|(_, field)| field).collect(),
            records,
        },
        dropped_columns,
        skipped_blank_rows,
    })
}

fn raw_display(cell: &RawCell) -> String {
    match cell {
        RawCell::Empty => String::new(),
        RawCell::Text(s) => s.clone(),
        RawCell::Int(i) => i.to_string(),
        RawCell::Float(f) => f.to_string(),
        RawCell::Bool(b) => b.to_string(),
    }
}

/// One uploaded file plus its target selector
#[derive(Debug, Clone, Copy)]
pub struct Upload<'a> {
    pub selector: &'a str,
    pub filename: Option<&'a str>,
    pub bytes: &'a [u8],
}

/// Run the whole pipeline for one upload
///
/// Nothing is written unless every row coerces; the insert itself is a
/// single transaction.
pub async fn import_upload(pool: &SqlitePool, upload: Upload<'_>) -> Result<ImportReport, ImportError> {
    let filename = match upload.filename.map(str::trim) {
        Some(name) if !name.is_empty() => name,
        _ => return Err(ImportError::NoFile),
    };

    let shape = Shape::from_selector(upload.selector)
        .ok_or_else(|| ImportError::InvalidShape(upload.selector.to_string()))?;

    let table = reader::read_table(filename, upload.bytes)?;
    let prepared = prepare_batch(shape, &table)?;

    if !prepared.dropped_columns.is_empty() {
        info!(
            "Import {} into {}: dropping unknown columns {:?}",
            filename, shape, prepared.dropped_columns
        );
    }

    let imported = insert_batch(pool, &prepared.batch).await.map_err(|e| {
        warn!("Import {} into {} rolled back: {}", filename, shape, e);
        ImportError::Storage(e)
    })?;

    info!(
        "Imported {} {} records from {} ({} blank rows skipped)",
        imported, shape, filename, prepared.skipped_blank_rows
    );

    Ok(ImportReport {
        shape,
        filename: filename.to_string(),
        imported,
        dropped_columns: prepared.dropped_columns,
        skipped_blank_rows: prepared.skipped_blank_rows,
    })
}
