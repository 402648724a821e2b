// Read-only computations over a loaded record set, consumed by the
// presentation layer: filtered views, KPIs, group totals, period
// histograms and CSV export of a view.
pub mod export;
pub mod grouping;
pub mod kpis;
pub mod periods;
pub mod view;

pub use grouping::{category_counts, group_totals, CategoryCount, GroupTotals, Metric};
pub use kpis::{compute_kpis, KpiSnapshot};
pub use periods::{period_counts, Granularity, PeriodCount};
pub use view::{RecordFilter, RecordView, Selection};
