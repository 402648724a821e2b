// Brazilian number handling shared by the engine's coercion stage and
// report rendering.
pub mod brazilian_format {
    use anyhow::{anyhow, Result};
    use once_cell::sync::Lazy;
    use regex::Regex;
    use std::str::FromStr;

    // "1.234,56", "1234,5", "-12": '.' only as a thousands separator, ',' as the decimal mark.
    static BRAZILIAN_DECIMAL: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^-?(\d{1,3}(\.\d{3})*|\d+)(,\d+)?$").unwrap());

    pub fn is_brazilian_decimal(s: &str) -> bool {
        BRAZILIAN_DECIMAL.is_match(s.trim())
    }

    // Parses decimals like "1.234,56" or "123,45" into f64
    pub fn parse_decimal(s: &str) -> Result<f64> {
        if !is_brazilian_decimal(s) {
            return Err(anyhow!("Not a Brazilian decimal: '{}'", s));
        }
        let normalized = s.trim()
            .replace('.', "")  // Remove thousand separators
            .replace(',', "."); // Replace decimal separator

        f64::from_str(&normalized)
            .map_err(|e| anyhow!("Failed to parse decimal '{}': {}", s, e))
    }

    // Formats 1234.5 as "1.234,50" (two decimals) with '.' thousand groups.
    pub fn format_decimal(value: f64, decimals: usize) -> String {
        let formatted = format!("{:.decimals$}", value.abs(), decimals = decimals);
        let (int_part, frac_part) = match formatted.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (formatted.as_str(), None),
        };

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        let sign = if value < 0.0 && formatted.chars().any(|c| c != '0' && c != '.') { "-" } else { "" };
        match frac_part {
            Some(frac) => format!("{}{},{}", sign, grouped, frac),
            None => format!("{}{}", sign, grouped),
        }
    }

    pub fn format_currency(value: f64) -> String {
        format!("R$ {}", format_decimal(value, 2))
    }

}
