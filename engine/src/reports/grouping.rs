use super::view::RecordView;
use serde::Serialize;
use shared::models::CanonicalField;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Metric {
    PendingQty,
    Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupTotals {
    pub key: String,
    pub rows: usize,
    pub pending_qty: f64,
    pub value: f64,
}

impl GroupTotals {
    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::PendingQty => self.pending_qty,
            Metric::Value => self.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub key: String,
    pub rows: usize,
}

/// Sums of pending quantity and `Valor` per value of `key_column`,
/// largest `metric` first. Rows with a missing key are left out and
/// missing amounts add nothing. `limit` truncates after sorting.
pub fn group_totals(view: &RecordView<'_>, key_column: &str, metric: Metric, limit: Option<usize>) -> Vec<GroupTotals> {
    let set = view.set();
    let Some(key_idx) = set.column_index(key_column) else {
        return Vec::new();
    };

    let mut groups: BTreeMap<String, GroupTotals> = BTreeMap::new();
    for &row in view.row_indices() {
        let Some(key) = set.rows()[row].get(key_idx).category_key() else {
            continue;
        };
        let entry = groups.entry(key.clone()).or_insert_with(|| GroupTotals {
            key,
            rows: 0,
            pending_qty: 0.0,
            value: 0.0,
        });
        entry.rows += 1;
        entry.pending_qty += set.canonical_number(row, CanonicalField::PendingQty).unwrap_or(0.0);
        entry.value += set.value_number(row).unwrap_or(0.0);
    }

    let mut totals: Vec<GroupTotals> = groups.into_values().collect();
    totals.sort_by(|a, b| b.metric(metric).total_cmp(&a.metric(metric)));
    if let Some(limit) = limit {
        totals.truncate(limit);
    }
    totals
}

/// Row count per value of `column`, keys ascending.
pub fn category_counts(view: &RecordView<'_>, column: &str) -> Vec<CategoryCount> {
    let set = view.set();
    let Some(idx) = set.column_index(column) else {
        return Vec::new();
    };
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for key in view.row_indices().iter().filter_map(|&row| set.rows()[row].get(idx).category_key()) {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts.into_iter().map(|(key, rows)| CategoryCount { key, rows }).collect()
}
