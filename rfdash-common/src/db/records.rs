//! RF record persistence and listing
//!
//! Records are append-only: the only write path is [`insert_batch`], which
//! commits a whole upload in one transaction or nothing at all.

use crate::import::{FieldValue, RecordBatch};
use crate::shapes::{FieldKind, Shape, ID_FIELD};
use crate::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

/// Insert every record of a batch in a single transaction
///
/// Returns the number of inserted rows. On any failure the transaction is
/// dropped (rolled back) and no row of the batch is visible.
pub async fn insert_batch(pool: &SqlitePool, batch: &RecordBatch) -> Result<u64> {
    if batch.records.is_empty() {
        return Ok(0);
    }

    if batch.columns.is_empty() {
        return Err(Error::InvalidInput(format!(
            "{} batch has records but no columns",
            batch.shape
        )));
    }

    let table = batch.shape.table_name();
    let names: Vec<&str> = batch.columns.iter().map(|c| c.name).collect();
    let placeholders = vec!["?"; names.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        names.join(", "),
        placeholders
    );
    debug!("Batch insert statement: {}", sql);

    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for record in &batch.records {
        let mut query = sqlx::query(&sql);
        for value in record {
            query = match value {
                FieldValue::Null => query.bind(None::<String>),
                FieldValue::Text(s) => query.bind(s.as_str()),
                FieldValue::Integer(i) => query.bind(*i),
                FieldValue::Real(r) => query.bind(*r),
            };
        }
        inserted += query.execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Count stored records of one shape
pub async fn count_records(pool: &SqlitePool, shape: Shape) -> Result<i64> {
    let count = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", shape.table_name()))
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// One page of stored records, newest first
#[derive(Debug, Clone)]
pub struct RecordPage {
    /// Column names, identity key first
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<FieldValue>>,
}

/// Fetch a page of records of one shape
pub async fn fetch_page(pool: &SqlitePool, shape: Shape, limit: i64, offset: i64) -> Result<RecordPage> {
    let mut columns = vec![ID_FIELD];
    columns.extend(shape.fields().iter().map(|f| f.name));

    let sql = format!(
        "SELECT {} FROM {} ORDER BY {} DESC LIMIT ? OFFSET ?",
        columns.join(", "),
        shape.table_name(),
        ID_FIELD
    );

    let rows = sqlx::query(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let rows = rows
        .iter()
        .map(|row| decode_row(shape, row))
        .collect::<Result<Vec<_>>>()?;

    Ok(RecordPage { columns, rows })
}

fn decode_row(shape: Shape, row: &SqliteRow) -> Result<Vec<FieldValue>> {
    let mut values = Vec::with_capacity(shape.fields().len() + 1);
    values.push(FieldValue::Integer(row.try_get::<i64, _>(0)?));

    for (i, field) in shape.fields().iter().enumerate() {
        let idx = i + 1;
        let value = match field.kind {
            FieldKind::Text => row
                .try_get::<Option<String>, _>(idx)?
                .map_or(FieldValue::Null, FieldValue::Text),
            FieldKind::Integer => row
                .try_get::<Option<i64>, _>(idx)?
                .map_or(FieldValue::Null, FieldValue::Integer),
            FieldKind::Real => row
                .try_get::<Option<f64>, _>(idx)?
                .map_or(FieldValue::Null, FieldValue::Real),
        };
        values.push(value);
    }

    Ok(values)
}
