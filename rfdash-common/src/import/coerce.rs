//! Cell coercion
//!
//! Two steps per retained cell:
//! 1. Null coercion: anything the reader reports as missing becomes NULL
//! 2. Type coercion to the field's declared kind; failures are returned to
//!    the caller, never silently nulled

use super::{FieldValue, RawCell};
use crate::shapes::FieldKind;

/// Text tokens read as "missing" (the pandas default NA set)
pub static NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Largest magnitude at which every integer is exactly representable as f64
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

impl RawCell {
    /// True when the cell is empty, whitespace-only, an NA token, or NaN
    pub fn is_missing(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(s) => {
                let s = s.trim();
                NA_TOKENS.iter().any(|token| *token == s)
            }
            RawCell::Float(f) => f.is_nan(),
            RawCell::Int(_) | RawCell::Bool(_) => false,
        }
    }
}

/// Coerce one raw cell to a field kind
///
/// Returns the name of the expected kind on failure.
pub fn coerce(cell: &RawCell, kind: FieldKind) -> Result<FieldValue, &'static str> {
    if cell.is_missing() {
        return Ok(FieldValue::Null);
    }

    match kind {
        FieldKind::Text => Ok(FieldValue::Text(as_text(cell))),
        FieldKind::Integer => as_integer(cell).map(FieldValue::Integer).ok_or("integer"),
        FieldKind::Real => as_real(cell).map(FieldValue::Real).ok_or("number"),
    }
}

fn as_text(cell: &RawCell) -> String {
    match cell {
        RawCell::Text(s) => s.trim().to_string(),
        RawCell::Int(i) => i.to_string(),
        // Whole spreadsheet numbers (site codes, cell ids typed as numbers)
        // render without a trailing ".0"
        RawCell::Float(f) if f.fract() == 0.0 && f.abs() < MAX_EXACT_F64_INT => {
            format!("{}", *f as i64)
        }
        RawCell::Float(f) => f.to_string(),
        RawCell::Bool(b) => b.to_string(),
        RawCell::Empty => String::new(),
    }
}

fn whole_float_to_i64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_F64_INT {
        Some(f as i64)
    } else {
        None
    }
}

fn as_integer(cell: &RawCell) -> Option<i64> {
    match cell {
        RawCell::Int(i) => Some(*i),
        RawCell::Float(f) => whole_float_to_i64(*f),
        RawCell::Text(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| parse_real(s).and_then(whole_float_to_i64))
        }
        RawCell::Bool(_) | RawCell::Empty => None,
    }
}

fn as_real(cell: &RawCell) -> Option<f64> {
    match cell {
        RawCell::Int(i) => Some(*i as f64),
        RawCell::Float(f) if f.is_finite() => Some(*f),
        RawCell::Text(s) => parse_real(s),
        _ => None,
    }
}

/// Parse a decimal number, accepting a decimal comma when no dot is present
fn parse_real(text: &str) -> Option<f64> {
    let text = text.trim();
    let parsed = if text.contains(',') && !text.contains('.') {
        text.replace(',', ".").parse::<f64>()
    } else {
        text.parse::<f64>()
    };
    parsed.ok().filter(|f| f.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    #[test]
    fn test_missing_cells_become_null() {
        for cell in [
            RawCell::Empty,
            text(""),
            text("   "),
            text("nan"),
            text("NaN"),
            text("NULL"),
            text("#N/A"),
            RawCell::Float(f64::NAN),
        ] {
            for kind in [FieldKind::Text, FieldKind::Integer, FieldKind::Real] {
                assert_eq!(coerce(&cell, kind), Ok(FieldValue::Null), "{:?} as {:?}", cell, kind);
            }
        }
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(coerce(&text("  Site A "), FieldKind::Text), Ok(FieldValue::Text("Site A".into())));
        assert_eq!(coerce(&RawCell::Float(12345.0), FieldKind::Text), Ok(FieldValue::Text("12345".into())));
        assert_eq!(coerce(&RawCell::Float(1.5), FieldKind::Text), Ok(FieldValue::Text("1.5".into())));
        assert_eq!(coerce(&RawCell::Int(7), FieldKind::Text), Ok(FieldValue::Text("7".into())));
    }

    #[test]
    fn test_integer_coercion() {
        assert_eq!(coerce(&text("2100"), FieldKind::Integer), Ok(FieldValue::Integer(2100)));
        assert_eq!(coerce(&text(" 2100.0 "), FieldKind::Integer), Ok(FieldValue::Integer(2100)));
        assert_eq!(coerce(&RawCell::Float(3.0), FieldKind::Integer), Ok(FieldValue::Integer(3)));
        assert_eq!(coerce(&RawCell::Int(-4), FieldKind::Integer), Ok(FieldValue::Integer(-4)));

        assert_eq!(coerce(&text("21a"), FieldKind::Integer), Err("integer"));
        assert_eq!(coerce(&RawCell::Float(2.5), FieldKind::Integer), Err("integer"));
        assert_eq!(coerce(&RawCell::Bool(true), FieldKind::Integer), Err("integer"));
    }

    #[test]
    fn test_real_coercion() {
        assert_eq!(coerce(&text("105.75"), FieldKind::Real), Ok(FieldValue::Real(105.75)));
        assert_eq!(coerce(&text("21,5"), FieldKind::Real), Ok(FieldValue::Real(21.5)));
        assert_eq!(coerce(&RawCell::Int(30), FieldKind::Real), Ok(FieldValue::Real(30.0)));

        assert_eq!(coerce(&text("north"), FieldKind::Real), Err("number"));
        assert_eq!(coerce(&text("1,234.5"), FieldKind::Real), Err("number"));
        assert_eq!(coerce(&text("inf"), FieldKind::Real), Err("number"));
    }
}
