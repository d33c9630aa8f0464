//! RF record shapes
//!
//! Each technology (3G/4G/5G) has its own fixed, flat field schema and its
//! own storage table. The schema is the single source of truth for table
//! creation, schema sync, import column filtering and import type coercion.

use std::fmt;

/// Declared storage type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Real,
}

impl FieldKind {
    /// SQLite column type for this kind
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldKind::Text => "TEXT",
            FieldKind::Integer => "INTEGER",
            FieldKind::Real => "REAL",
        }
    }
}

/// One named, typed field of a shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Canonical field name (also the column name)
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn text(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Text }
}

const fn integer(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Integer }
}

const fn real(name: &'static str) -> FieldSpec {
    FieldSpec { name, kind: FieldKind::Real }
}

/// Name of the system-assigned identity column shared by all shapes
pub const ID_FIELD: &str = "id";

static FIELDS_3G: &[FieldSpec] = &[
    text("site_name"),
    text("cell_name"),
    integer("cell_id"),
    text("rnc"),
    integer("lac"),
    integer("psc"),
    integer("uarfcn"),
    integer("frequency"),
    real("longitude"),
    real("latitude"),
    real("azimuth"),
    real("antenna_height"),
    real("mechanical_tilt"),
    real("electrical_tilt"),
    text("antenna_type"),
    text("hang_sx"),
    text("equipment"),
    text("province"),
    text("district"),
    text("address"),
    text("ghi_chu"),
];

static FIELDS_4G: &[FieldSpec] = &[
    text("site_name"),
    text("cell_name"),
    integer("enodeb_id"),
    integer("cell_id"),
    integer("tac"),
    integer("pci"),
    integer("earfcn"),
    integer("frequency"),
    real("bandwidth"),
    real("longitude"),
    real("latitude"),
    real("azimuth"),
    real("antenna_height"),
    real("mechanical_tilt"),
    real("electrical_tilt"),
    text("antenna_type"),
    text("hang_sx"),
    text("equipment"),
    text("province"),
    text("district"),
    text("address"),
    text("ghi_chu"),
];

static FIELDS_5G: &[FieldSpec] = &[
    text("site_name"),
    text("cell_name"),
    integer("gnodeb_id"),
    integer("cell_id"),
    integer("tac"),
    integer("pci"),
    integer("nr_arfcn"),
    integer("ssb_frequency"),
    integer("frequency"),
    real("bandwidth"),
    real("longitude"),
    real("latitude"),
    real("azimuth"),
    real("antenna_height"),
    real("mechanical_tilt"),
    real("electrical_tilt"),
    text("antenna_type"),
    text("hang_sx"),
    text("equipment"),
    text("province"),
    text("district"),
    text("address"),
    text("ghi_chu"),
];

/// One of the three RF record shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Rf3g,
    Rf4g,
    Rf5g,
}

impl Shape {
    pub const ALL: [Shape; 3] = [Shape::Rf3g, Shape::Rf4g, Shape::Rf5g];

    /// Parse a selector token (`3g`, `4g`, `5g`), ignoring case and
    /// surrounding whitespace
    pub fn from_selector(selector: &str) -> Option<Shape> {
        match selector.trim().to_ascii_lowercase().as_str() {
            "3g" => Some(Shape::Rf3g),
            "4g" => Some(Shape::Rf4g),
            "5g" => Some(Shape::Rf5g),
            _ => None,
        }
    }

    /// Selector token used in URLs and forms
    pub fn selector(self) -> &'static str {
        match self {
            Shape::Rf3g => "3g",
            Shape::Rf4g => "4g",
            Shape::Rf5g => "5g",
        }
    }

    /// Human-readable label
    pub fn label(self) -> &'static str {
        match self {
            Shape::Rf3g => "3G",
            Shape::Rf4g => "4G",
            Shape::Rf5g => "5G",
        }
    }

    pub fn table_name(self) -> &'static str {
        match self {
            Shape::Rf3g => "rf_3g",
            Shape::Rf4g => "rf_4g",
            Shape::Rf5g => "rf_5g",
        }
    }

    /// Descriptive fields in column order, excluding the identity key
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            Shape::Rf3g => FIELDS_3G,
            Shape::Rf4g => FIELDS_4G,
            Shape::Rf5g => FIELDS_5G,
        }
    }

    /// Look up a field by canonical name. The identity key is never returned.
    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
