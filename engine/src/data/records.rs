// Turns the conforming rows into the typed, immutable record set:
// header normalization, cell typing, and the derived `Valor` column.
use super::coercion::{coerce_date, coerce_number, derive_value, is_coercion_failure, parse_cell};
use super::normalizer::{mangle_duplicate_headers, normalize_headers, NormalizedHeaders};
use super::splitter::RawRow;
use serde::Serialize;
use shared::models::{CanonicalField, CellValue, Record, RecordSet, VALUE_COLUMN};
use std::collections::BTreeMap;

// Numeric canonical columns, coerced whenever present.
const NUMERIC_FIELDS: [CanonicalField; 5] = [
    CanonicalField::RequestedQty,
    CanonicalField::PendingQty,
    CanonicalField::DeliveredQty,
    CanonicalField::DaysInStatus,
    CanonicalField::LastUnitPrice,
];

/// Per-column count of cells that were present but could not be typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoercionReport {
    pub failures: BTreeMap<String, usize>,
}

impl CoercionReport {
    pub fn total(&self) -> usize {
        self.failures.values().sum()
    }
}

#[derive(Debug, Clone)]
pub struct BuiltRecords {
    pub records: RecordSet,
    pub headers: NormalizedHeaders,
    pub coercion: CoercionReport,
}

/// The first conforming row is the header; the rest are data rows.
pub fn build_records(valid_rows: &[RawRow], date_formats: &[String]) -> BuiltRecords {
    let Some((header_row, data_rows)) = valid_rows.split_first() else {
        tracing::warn!("No conforming rows; record set is empty");
        return BuiltRecords {
            records: RecordSet::new(Vec::new(), Default::default(), Vec::new()),
            headers: NormalizedHeaders::default(),
            coercion: CoercionReport::default(),
        };
    };

    let mut headers = normalize_headers(&mangle_duplicate_headers(header_row));
    let mut columns = headers.columns.clone();
    let mut canonical = headers.canonical.clone();

    let mut rows: Vec<Vec<CellValue>> = data_rows
        .iter()
        .map(|raw| {
            headers
                .source_indices
                .iter()
                .map(|&i| raw.get(i).map(|s| parse_cell(s)).unwrap_or(CellValue::Missing))
                .collect()
        })
        .collect();

    let mut coercion = CoercionReport::default();
    let mut coerce_column = |rows: &mut Vec<Vec<CellValue>>, idx: usize, coerce: &dyn Fn(&CellValue) -> CellValue| {
        let mut failed = 0;
        for row in rows.iter_mut() {
            let typed = coerce(&row[idx]);
            if is_coercion_failure(&row[idx], &typed) {
                failed += 1;
            }
            row[idx] = typed;
        }
        if failed > 0 {
            coercion.failures.insert(columns[idx].clone(), failed);
        }
    };

    if let Some(idx) = canonical.request_date {
        coerce_column(&mut rows, idx, &|cell| coerce_date(cell, date_formats));
    }
    for field in NUMERIC_FIELDS {
        if let Some(idx) = canonical.get(field) {
            coerce_column(&mut rows, idx, &coerce_number);
        }
    }

    if let (Some(price_idx), Some(qty_idx)) = (canonical.last_unit_price, canonical.requested_qty) {
        // An existing `Valor` column is overwritten by the derived values.
        let value_idx = match columns.iter().position(|c| c == VALUE_COLUMN) {
            Some(idx) => idx,
            None => {
                columns.push(VALUE_COLUMN.to_string());
                for row in rows.iter_mut() {
                    row.push(CellValue::Missing);
                }
                columns.len() - 1
            }
        };
        for row in rows.iter_mut() {
            row[value_idx] = derive_value(&row[price_idx], &row[qty_idx]);
        }
        canonical.value = Some(value_idx);
    }

    if coercion.total() > 0 {
        tracing::warn!(failures = ?coercion.failures, "Some cells could not be coerced and are missing");
    }

    headers.canonical = canonical.clone();
    let records = RecordSet::new(columns, canonical, rows.into_iter().map(Record::new).collect());
    BuiltRecords { records, headers, coercion }
}
