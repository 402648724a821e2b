// Assembles everything the dashboard shows for one filter selection
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::PipelineSettings;
use crate::data::dataset::{LoadSummary, LoadedDataset};
use crate::reports::{
    category_counts, compute_kpis, group_totals, period_counts, CategoryCount, Granularity, GroupTotals, KpiSnapshot, Metric,
    PeriodCount, RecordFilter, RecordView,
};

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub load: LoadSummary,
    pub invalid_lines: Vec<u64>,
    pub filter: RecordFilter,
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    /// Selectable values per filter column, over the whole dataset.
    /// Columns missing from the source are left out.
    pub filter_options: BTreeMap<String, Vec<String>>,
    pub kpis: KpiSnapshot,
    pub by_category: Vec<GroupTotals>,
    pub top_equipment: Vec<GroupTotals>,
    pub category_share: Vec<CategoryCount>,
    pub granularity: Granularity,
    pub periods: Vec<PeriodCount>,
}

pub fn filter_options(view: &RecordView<'_>, settings: &PipelineSettings) -> BTreeMap<String, Vec<String>> {
    [
        &settings.equipment_column,
        &settings.category_column,
        &settings.status_column,
        &settings.supplier_column,
    ]
    .into_iter()
    .filter(|column| view.set().has_column(column))
    .map(|column| (column.clone(), view.distinct_values(column)))
    .collect()
}

pub fn handle_build_report(
    dataset: &LoadedDataset,
    filter: &RecordFilter,
    granularity: Granularity,
    settings: &PipelineSettings,
) -> DashboardReport {
    let set = &dataset.records;
    let view = RecordView::filter(set, filter);
    tracing::debug!(rows = view.len(), total = set.len(), "Applied record filter");

    DashboardReport {
        load: dataset.summary(),
        invalid_lines: dataset.invalid_rows.iter().map(|r| r.line).collect(),
        filter: filter.clone(),
        date_bounds: RecordView::all(set).date_bounds(),
        filter_options: filter_options(&RecordView::all(set), settings),
        kpis: compute_kpis(&view, filter.date_range, settings),
        by_category: group_totals(&view, &settings.category_column, Metric::Value, None),
        top_equipment: group_totals(&view, &settings.equipment_column, Metric::Value, Some(settings.top_n)),
        category_share: category_counts(&view, &settings.category_column),
        granularity,
        periods: period_counts(&view, granularity),
    }
}
