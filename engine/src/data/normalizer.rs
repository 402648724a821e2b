// Maps verbose, inconsistently spelled source headers onto the canonical
// field names by keyword matching on an accent-free, compacted key.
use deunicode::deunicode;
use serde::Serialize;
use shared::models::{CanonicalColumns, CanonicalField};
use std::collections::{HashMap, HashSet};

const REQUEST_DATE_KEYS: [&str; 2] = ["datadasolicitacao", "data_solicitacao"];

/// Lowercased, accent-stripped header with spaces and dots removed.
pub fn normalize_key(header: &str) -> String {
    deunicode(&header.trim().to_lowercase())
        .chars()
        .filter(|c| *c != ' ' && *c != '.')
        .collect()
}

// First matching rule wins; the order below is significant.
pub fn match_canonical(key: &str) -> Option<CanonicalField> {
    if key.contains("qtde") && !key.contains("pendente") && !key.contains("entregue") {
        Some(CanonicalField::RequestedQty)
    } else if key.contains("pendente") {
        Some(CanonicalField::PendingQty)
    } else if key.contains("entregue") {
        Some(CanonicalField::DeliveredQty)
    } else if key.contains("diaspentrega") || key.contains("diasparaocseragerada") {
        Some(CanonicalField::DaysInStatus)
    } else if key.contains("valorultimacompra") || key.contains("ultimovalor") {
        Some(CanonicalField::LastUnitPrice)
    } else {
        None
    }
}

pub fn is_request_date_key(key: &str) -> bool {
    REQUEST_DATE_KEYS.contains(&key)
}

/// Makes repeated source header names unique as `X`, `X.1`, `X.2`, ...
/// A BOM in front of the first header is dropped.
pub fn mangle_duplicate_headers(headers: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(headers.len());
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut mangled = Vec::with_capacity(headers.len());

    for (i, raw) in headers.iter().enumerate() {
        let base = if i == 0 { raw.trim_start_matches('\u{feff}') } else { raw.as_str() };
        let mut name = base.to_string();
        while seen.contains(&name) {
            let count = counts.entry(base.to_string()).or_insert(0);
            *count += 1;
            name = format!("{}.{}", base, count);
        }
        seen.insert(name.clone());
        mangled.push(name);
    }
    mangled
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub original: String,
    pub field: CanonicalField,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DroppedColumn {
    pub source_index: usize,
    pub name: String,
}

/// Outcome of header normalization: the surviving column names, where
/// each one comes from in the source row, and the resolved canonical
/// positions (indices into `columns`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizedHeaders {
    pub columns: Vec<String>,
    pub source_indices: Vec<usize>,
    pub canonical: CanonicalColumns,
    pub renames: Vec<Rename>,
    pub dropped: Vec<DroppedColumn>,
}

pub fn normalize_headers(headers: &[String]) -> NormalizedHeaders {
    let mut renames = Vec::new();
    let renamed: Vec<String> = headers
        .iter()
        .map(|raw| {
            let stripped = raw.trim();
            match match_canonical(&normalize_key(stripped)) {
                Some(field) => {
                    if stripped != field.column_name() {
                        tracing::debug!(original = %stripped, canonical = field.column_name(), "Renaming column");
                        renames.push(Rename { original: stripped.to_string(), field });
                    }
                    field.column_name().to_string()
                }
                None => stripped.to_string(),
            }
        })
        .collect();

    // Collision resolution: the leftmost column of each name survives.
    let mut first_seen: HashMap<&str, usize> = HashMap::with_capacity(renamed.len());
    let mut columns = Vec::with_capacity(renamed.len());
    let mut source_indices = Vec::with_capacity(renamed.len());
    let mut dropped = Vec::new();
    for (source_index, name) in renamed.iter().enumerate() {
        if first_seen.contains_key(name.as_str()) {
            tracing::debug!(column = %name, source_index, "Dropping duplicate column");
            dropped.push(DroppedColumn { source_index, name: name.clone() });
            continue;
        }
        first_seen.insert(name.as_str(), columns.len());
        columns.push(name.clone());
        source_indices.push(source_index);
    }

    let mut canonical = CanonicalColumns::default();
    for field in CanonicalField::ALL {
        canonical.set(field, first_seen.get(field.column_name()).copied());
    }
    canonical.request_date = columns.iter().position(|c| is_request_date_key(&normalize_key(c)));

    NormalizedHeaders { columns, source_indices, canonical, renames, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Valor Última Compra"), "valorultimacompra");
        assert_eq!(normalize_key("  Qtde. Pendente "), "qtdependente");
        assert_eq!(normalize_key("Data da Solicitação"), "datadasolicitacao");
        assert_eq!(normalize_key("DIAS P/ ENTREGA"), "diasp/entrega");
    }

    #[test]
    fn test_match_rules() {
        assert_eq!(match_canonical("qtdesolicitada"), Some(CanonicalField::RequestedQty));
        assert_eq!(match_canonical("qtdependente"), Some(CanonicalField::PendingQty));
        assert_eq!(match_canonical("qtdeentregue"), Some(CanonicalField::DeliveredQty));
        assert_eq!(match_canonical("diaspentrega"), Some(CanonicalField::DaysInStatus));
        assert_eq!(match_canonical("diasparaocseragerada"), Some(CanonicalField::DaysInStatus));
        assert_eq!(match_canonical("valorultimacompra"), Some(CanonicalField::LastUnitPrice));
        assert_eq!(match_canonical("ultimovalorpago"), Some(CanonicalField::LastUnitPrice));
        assert_eq!(match_canonical("fornecedor"), None);
    }

    #[test]
    fn test_pending_quantity_is_not_requested_quantity() {
        let key = normalize_key("Qtde. Pendente");
        assert_eq!(key, "qtdependente");
        assert_eq!(match_canonical(&key), Some(CanonicalField::PendingQty));
    }

    #[test]
    fn test_last_price_header() {
        let out = normalize_headers(&strings(&["Valor Última Compra"]));
        assert_eq!(out.columns, strings(&["Valor Último"]));
        assert_eq!(out.canonical.last_unit_price, Some(0));
        assert_eq!(out.renames, vec![Rename { original: "Valor Última Compra".into(), field: CanonicalField::LastUnitPrice }]);
    }

    #[test]
    fn test_full_header_set() {
        let headers = strings(&[
            " Cód.Equipamento",
            "Data da Solicitação",
            "Qtde. Solicitada",
            "Qtde. Pendente",
            "Dias p. Entrega",
            "Último Valor",
            "TIPO",
        ]);
        let out = normalize_headers(&headers);
        assert_eq!(out.columns, strings(&[
            "Cód.Equipamento",
            "Data da Solicitação",
            "Qtd. Solicitada",
            "Qtd. Pendente",
            "Dias em Situação",
            "Valor Último",
            "TIPO",
        ]));
        assert_eq!(out.source_indices, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(out.canonical.request_date, Some(1));
        assert_eq!(out.canonical.requested_qty, Some(2));
        assert_eq!(out.canonical.pending_qty, Some(3));
        assert_eq!(out.canonical.days_in_status, Some(4));
        assert_eq!(out.canonical.last_unit_price, Some(5));
        assert_eq!(out.canonical.delivered_qty, None);
        assert_eq!(out.canonical.value, None);
    }

    #[test]
    fn test_collisions_keep_leftmost() {
        let headers = strings(&["Qtde", "Fornecedor", "Qtde Solicitada", "Qtd. Solicitada"]);
        let out = normalize_headers(&headers);
        assert_eq!(out.columns, strings(&["Qtd. Solicitada", "Fornecedor"]));
        assert_eq!(out.source_indices, vec![0, 1]);
        assert_eq!(out.dropped.len(), 2);
        assert_eq!(out.dropped[0].source_index, 2);
        assert_eq!(out.dropped[1].source_index, 3);
        assert_eq!(out.canonical.requested_qty, Some(0));
    }

    #[test]
    fn test_canonical_names_are_stable() {
        let canonical: Vec<String> = CanonicalField::ALL.iter().map(|f| f.column_name().to_string()).collect();
        let out = normalize_headers(&canonical);
        assert_eq!(out.columns, canonical);
        assert!(out.renames.is_empty());

        let again = normalize_headers(&out.columns);
        assert_eq!(again, out);
    }

    #[test]
    fn test_mangle_duplicates() {
        let headers = strings(&["\u{feff}TIPO", "Qtde", "Qtde", "Qtde.1", "Qtde"]);
        assert_eq!(mangle_duplicate_headers(&headers), strings(&["TIPO", "Qtde", "Qtde.1", "Qtde.1.1", "Qtde.2"]));
    }
}
