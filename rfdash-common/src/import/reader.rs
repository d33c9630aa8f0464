//! Upload readers
//!
//! Format is chosen from the filename extension only: `.csv` goes through
//! the `csv` crate, `.xls`/`.xlsx` through `calamine` (first worksheet).
//! Both produce a [`RawTable`] of untyped cells.

use super::{ImportError, RawCell, RawRow, RawTable};
use calamine::{DataType, Range, Reader, Xls, Xlsx};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Csv,
    Xls,
    Xlsx,
}

impl UploadFormat {
    /// Pick the format from a filename extension (case-insensitive)
    pub fn from_filename(filename: &str) -> Result<Self, ImportError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(UploadFormat::Csv),
            "xls" => Ok(UploadFormat::Xls),
            "xlsx" => Ok(UploadFormat::Xlsx),
            _ => Err(ImportError::UnsupportedFormat(filename.to_string())),
        }
    }
}

/// Read an uploaded file into a raw table
pub fn read_table(filename: &str, bytes: &[u8]) -> Result<RawTable, ImportError> {
    let format = UploadFormat::from_filename(filename)?;
    debug!("Reading {} as {:?} ({} bytes)", filename, format, bytes.len());

    let table = match format {
        UploadFormat::Csv => read_csv(bytes)?,
        UploadFormat::Xlsx => {
            let workbook = Xlsx::new(Cursor::new(bytes))
                .map_err(|e| ImportError::Parse(format!("Cannot open Excel file: {}", e)))?;
            range_to_table(first_worksheet(workbook)?)?
        }
        UploadFormat::Xls => {
            let workbook = Xls::new(Cursor::new(bytes))
                .map_err(|e| ImportError::Parse(format!("Cannot open Excel file: {}", e)))?;
            range_to_table(first_worksheet(workbook)?)?
        }
    };

    Ok(table)
}

fn read_csv(bytes: &[u8]) -> Result<RawTable, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::Parse(format!("Cannot read CSV header: {}", e)))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ImportError::Parse("File has no header row".to_string()));
    }

    let mut lines = LineCounter::new(bytes);
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ImportError::Parse(format!("Cannot read CSV row: {}", e)))?;
        let start = record.position().map_or(bytes.len(), |p| p.byte() as usize);
        let cells = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    RawCell::Empty
                } else {
                    RawCell::Text(field.to_string())
                }
            })
            .collect();
        rows.push(RawRow {
            line: lines.record_line(start),
            cells,
        });
    }

    Ok(RawTable { headers, rows })
}

/// Maps record byte offsets to 1-based line numbers
///
/// A record's position is where the reader resumed after the previous
/// record, so skipped blank lines are counted here. Offsets must be
/// non-decreasing.
struct LineCounter<'a> {
    bytes: &'a [u8],
    offset: usize,
    line: usize,
}

impl<'a> LineCounter<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0, line: 1 }
    }

    fn record_line(&mut self, start: usize) -> usize {
        let start = start.min(self.bytes.len());
        if start > self.offset {
            self.line += self.bytes[self.offset..start].iter().filter(|&&b| b == b'\n').count();
            self.offset = start;
        }
        while let Some(&b) = self.bytes.get(self.offset) {
            if b != b'\n' && b != b'\r' {
                break;
            }
            if b == b'\n' {
                self.line += 1;
            }
            self.offset += 1;
        }
        self.line
    }
}

fn first_worksheet<RS, R>(mut workbook: R) -> Result<Range<DataType>, ImportError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_names = workbook.sheet_names();
    let Some(sheet_name) = sheet_names.first() else {
        return Err(ImportError::Parse("Workbook contains no worksheets".to_string()));
    };
    debug!("Reading worksheet: {}", sheet_name);

    match workbook.worksheet_range(sheet_name) {
        Some(Ok(range)) => Ok(range),
        Some(Err(e)) => Err(ImportError::Parse(format!("Cannot read worksheet '{}': {}", sheet_name, e))),
        None => Err(ImportError::Parse(format!("Worksheet '{}' not found", sheet_name))),
    }
}

fn range_to_table(range: Range<DataType>) -> Result<RawTable, ImportError> {
    // Leading empty sheet rows are not part of the range
    let header_line = range.start().map_or(1, |(row, _)| row as usize + 1);
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_text).collect(),
        None => return Err(ImportError::Parse("File has no header row".to_string())),
    };

    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(ImportError::Parse("File has no header row".to_string()));
    }

    let rows = rows
        .enumerate()
        .map(|(idx, row)| RawRow {
            line: header_line + 1 + idx,
            cells: row.iter().map(cell_from_workbook).collect(),
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn header_text(cell: &DataType) -> String {
    match cell {
        DataType::String(s) => s.clone(),
        DataType::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_from_workbook(cell: &DataType) -> RawCell {
    match cell {
        DataType::Empty => RawCell::Empty,
        // #N/A, #DIV/0! and friends carry no value
        DataType::Error(_) => RawCell::Empty,
        DataType::String(s) => RawCell::Text(s.clone()),
        DataType::Int(i) => RawCell::Int(*i),
        DataType::Float(f) => RawCell::Float(*f),
        DataType::Bool(b) => RawCell::Bool(*b),
        other => RawCell::Text(other.to_string()),
    }
}
