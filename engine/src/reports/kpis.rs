use super::view::RecordView;
use crate::config::PipelineSettings;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use shared::models::{CanonicalField, RecordSet};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiSnapshot {
    pub records: usize,
    /// Rows of the whole dataset in the period of equal length right
    /// before the selected range; `None` without a range.
    pub records_previous: Option<usize>,
    pub requested_distinct: usize,
    pub pending_distinct: usize,
    pub requested_distinct_total: usize,
    pub pending_distinct_total: usize,
    pub sla_threshold_days: u32,
    pub sla_ratio: Option<f64>,
    pub pending_ratio: f64,
    pub pending_alert: bool,
}

/// `[start - (end - start) - 1 day, start - 1 day]`
pub fn previous_period(from: NaiveDate, to: NaiveDate) -> (NaiveDate, NaiveDate) {
    let span = to - from;
    let prev_end = from - Duration::days(1);
    (prev_end - span, prev_end)
}

fn distinct_equipment<I>(set: &RecordSet, rows: I, equipment_column: &str, only_pending: bool) -> usize
where
    I: Iterator<Item = usize>,
{
    let Some(idx) = set.column_index(equipment_column) else {
        return 0;
    };
    rows.filter(|&row| !only_pending || set.canonical_number(row, CanonicalField::PendingQty).is_some_and(|q| q > 0.0))
        .filter_map(|row| set.rows()[row].get(idx).category_key())
        .collect::<HashSet<_>>()
        .len()
}

pub fn compute_kpis(view: &RecordView<'_>, date_range: Option<(NaiveDate, NaiveDate)>, settings: &PipelineSettings) -> KpiSnapshot {
    let set = view.set();
    let equipment = settings.equipment_column.as_str();
    let rows = || view.row_indices().iter().copied();

    let records_previous = date_range.map(|(from, to)| {
        let (prev_from, prev_to) = previous_period(from, to);
        (0..set.len())
            .filter_map(|row| set.request_date(row))
            .filter(|dt| dt.date() >= prev_from && dt.date() <= prev_to)
            .count()
    });

    let requested_distinct = distinct_equipment(set, rows(), equipment, false);
    let pending_distinct = distinct_equipment(set, rows(), equipment, true);
    let requested_distinct_total = distinct_equipment(set, 0..set.len(), equipment, false);
    let pending_distinct_total = distinct_equipment(set, 0..set.len(), equipment, true);

    // Missing days count as outside the SLA.
    let threshold = f64::from(settings.sla_threshold_days);
    let sla_ratio = match set.canonical().days_in_status {
        Some(_) if !view.is_empty() => {
            let within = rows()
                .filter(|&row| set.canonical_number(row, CanonicalField::DaysInStatus).is_some_and(|d| d <= threshold))
                .count();
            Some(within as f64 / view.len() as f64)
        }
        _ => None,
    };

    let pending_ratio = if requested_distinct > 0 {
        pending_distinct as f64 / requested_distinct as f64
    } else {
        0.0
    };

    KpiSnapshot {
        records: view.len(),
        records_previous,
        requested_distinct,
        pending_distinct,
        requested_distinct_total,
        pending_distinct_total,
        sla_threshold_days: settings.sla_threshold_days,
        sla_ratio,
        pending_ratio,
        pending_alert: pending_ratio > settings.pending_alert_ratio,
    }
}
