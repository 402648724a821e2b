// Cell typing: raw text to typed values, with failures degrading to
// `CellValue::Missing` instead of errors.
use chrono::{NaiveDate, NaiveDateTime};
use shared::models::CellValue;
use shared::utils::brazilian_format;

// Spellings read as missing on load, besides the empty string.
pub const NA_MARKERS: [&str; 10] = ["", "NA", "N/A", "#N/A", "NaN", "nan", "NULL", "null", "n/a", "None"];

pub fn parse_cell(raw: &str) -> CellValue {
    if NA_MARKERS.contains(&raw) {
        CellValue::Missing
    } else {
        CellValue::Text(raw.to_string())
    }
}

/// Plain decimal first ("5.5", "10"), then Brazilian ("1.234,56") when
/// the text has that shape. Anything else ("1,234.56") and non-finite
/// results count as failures.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let parsed = match trimmed.parse::<f64>() {
        Ok(n) => Some(n),
        Err(_) if brazilian_format::is_brazilian_decimal(trimmed) => brazilian_format::parse_decimal(trimmed).ok(),
        Err(_) => None,
    };
    parsed.filter(|n| n.is_finite())
}

pub fn parse_datetime(text: &str, formats: &[String]) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    formats.iter().find_map(|fmt| {
        NaiveDateTime::parse_from_str(trimmed, fmt)
            .ok()
            .or_else(|| NaiveDate::parse_from_str(trimmed, fmt).ok().and_then(|d| d.and_hms_opt(0, 0, 0)))
    })
}

// Already-typed numbers pass through unchanged.
pub fn coerce_number(cell: &CellValue) -> CellValue {
    match cell {
        CellValue::Number(n) => CellValue::Number(*n),
        CellValue::Text(s) => parse_number(s).map(CellValue::Number).unwrap_or(CellValue::Missing),
        CellValue::Date(_) | CellValue::Missing => CellValue::Missing,
    }
}

// Already-typed dates pass through unchanged.
pub fn coerce_date(cell: &CellValue, formats: &[String]) -> CellValue {
    match cell {
        CellValue::Date(d) => CellValue::Date(*d),
        CellValue::Text(s) => parse_datetime(s, formats).map(CellValue::Date).unwrap_or(CellValue::Missing),
        CellValue::Number(_) | CellValue::Missing => CellValue::Missing,
    }
}

/// `Valor = Valor Último × Qtd. Solicitada`; a missing operand gives a missing result.
pub fn derive_value(last_unit_price: &CellValue, requested_qty: &CellValue) -> CellValue {
    match (last_unit_price.as_number(), requested_qty.as_number()) {
        (Some(price), Some(qty)) => CellValue::Number(price * qty),
        _ => CellValue::Missing,
    }
}

/// Whether coercing `before` into `after` lost a value that was present.
pub fn is_coercion_failure(before: &CellValue, after: &CellValue) -> bool {
    !before.is_missing() && after.is_missing()
}
