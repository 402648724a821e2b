use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;

/// Name of the derived monetary column (`Valor Último × Qtd. Solicitada`).
pub const VALUE_COLUMN: &str = "Valor";

/// Format used whenever a date cell is rendered back to text.
pub const DATE_DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static MISSING: CellValue = CellValue::Missing;

/// A typed cell of a loaded record.
///
/// `Missing` is the marker for empty cells and for values that failed
/// coercion; it never carries the offending text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Missing,
    Text(String),
    Number(f64),
    Date(NaiveDateTime),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    // Text key used by categorical filters and group-bys; `None` for missing.
    pub fn category_key(&self) -> Option<String> {
        match self {
            CellValue::Missing => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
            CellValue::Date(d) => write!(f, "{}", d.format(DATE_DISPLAY_FORMAT)),
        }
    }
}

// Plain JSON values: null, string or number.
impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CellValue::Missing => serializer.serialize_none(),
            CellValue::Text(s) => serializer.serialize_str(s),
            CellValue::Number(n) => serializer.serialize_f64(*n),
            CellValue::Date(d) => serializer.serialize_str(&d.format(DATE_DISPLAY_FORMAT).to_string()),
        }
    }
}

/// Semantic columns that verbose source headers are normalized onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CanonicalField {
    RequestedQty,
    PendingQty,
    DeliveredQty,
    DaysInStatus,
    LastUnitPrice,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 5] = [
        CanonicalField::RequestedQty,
        CanonicalField::PendingQty,
        CanonicalField::DeliveredQty,
        CanonicalField::DaysInStatus,
        CanonicalField::LastUnitPrice,
    ];

    /// Column name the field is exposed under after normalization.
    pub fn column_name(self) -> &'static str {
        match self {
            CanonicalField::RequestedQty => "Qtd. Solicitada",
            CanonicalField::PendingQty => "Qtd. Pendente",
            CanonicalField::DeliveredQty => "Qtd. Entregue",
            CanonicalField::DaysInStatus => "Dias em Situação",
            CanonicalField::LastUnitPrice => "Valor Último",
        }
    }
}

/// Positions of the known columns inside a `RecordSet`, resolved once
/// at load time. `None` means the source did not carry that column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalColumns {
    pub requested_qty: Option<usize>,
    pub pending_qty: Option<usize>,
    pub delivered_qty: Option<usize>,
    pub days_in_status: Option<usize>,
    pub last_unit_price: Option<usize>,
    pub request_date: Option<usize>,
    pub value: Option<usize>,
}

impl CanonicalColumns {
    pub fn get(&self, field: CanonicalField) -> Option<usize> {
        match field {
            CanonicalField::RequestedQty => self.requested_qty,
            CanonicalField::PendingQty => self.pending_qty,
            CanonicalField::DeliveredQty => self.delivered_qty,
            CanonicalField::DaysInStatus => self.days_in_status,
            CanonicalField::LastUnitPrice => self.last_unit_price,
        }
    }

    pub fn set(&mut self, field: CanonicalField, index: Option<usize>) {
        let slot = match field {
            CanonicalField::RequestedQty => &mut self.requested_qty,
            CanonicalField::PendingQty => &mut self.pending_qty,
            CanonicalField::DeliveredQty => &mut self.delivered_qty,
            CanonicalField::DaysInStatus => &mut self.days_in_status,
            CanonicalField::LastUnitPrice => &mut self.last_unit_price,
        };
        *slot = index;
    }
}

/// One loaded row, positionally aligned with `RecordSet::columns`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<CellValue>,
}

impl Record {
    pub fn new(values: Vec<CellValue>) -> Self {
        Record { values }
    }

    pub fn get(&self, index: usize) -> &CellValue {
        self.values.get(index).unwrap_or(&MISSING)
    }

    pub fn values(&self) -> &[CellValue] {
        &self.values
    }
}

/// The immutable result of one load: column names, the resolved
/// canonical positions, and the typed rows.
///
/// There is no mutating API; consumers filter through index views.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    canonical: CanonicalColumns,
    rows: Vec<Record>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>, canonical: CanonicalColumns, rows: Vec<Record>) -> Self {
        RecordSet { columns, canonical, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn canonical(&self) -> &CanonicalColumns {
        &self.canonical
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell lookup by column name; absent columns read as `Missing`.
    pub fn value(&self, row: usize, column: &str) -> &CellValue {
        match (self.rows.get(row), self.column_index(column)) {
            (Some(record), Some(idx)) => record.get(idx),
            _ => &MISSING,
        }
    }

    pub fn canonical_number(&self, row: usize, field: CanonicalField) -> Option<f64> {
        let idx = self.canonical.get(field)?;
        self.rows.get(row)?.get(idx).as_number()
    }

    pub fn value_number(&self, row: usize) -> Option<f64> {
        let idx = self.canonical.value?;
        self.rows.get(row)?.get(idx).as_number()
    }

    pub fn request_date(&self, row: usize) -> Option<NaiveDateTime> {
        let idx = self.canonical.request_date?;
        self.rows.get(row)?.get(idx).as_date()
    }

    /// Row as a JSON object keyed by column name, in column order.
    pub fn row_to_json(&self, row: usize) -> Option<serde_json::Value> {
        let record = self.rows.get(row)?;
        let mut map = serde_json::Map::with_capacity(self.columns.len());
        for (name, value) in self.columns.iter().zip(record.values()) {
            map.insert(name.clone(), serde_json::to_value(value).ok()?);
        }
        Some(serde_json::Value::Object(map))
    }
}
