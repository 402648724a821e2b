use chrono::NaiveDate;
use serde::Serialize;
use shared::models::RecordSet;
use std::collections::{BTreeSet, HashSet};

/// Keep rows whose text in `column` is one of `allowed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub column: String,
    pub allowed: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecordFilter {
    /// Inclusive calendar-date range on the request date.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub selections: Vec<Selection>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date_range(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.date_range = Some((from, to));
        self
    }

    pub fn select<I, S>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        match self.selections.iter_mut().find(|s| s.column == column) {
            Some(existing) => existing.allowed.extend(allowed),
            None => self.selections.push(Selection { column: column.to_string(), allowed }),
        }
        self
    }
}

/// Borrowed subset of a record set. The underlying set is never touched;
/// every session builds its own views.
#[derive(Debug, Clone)]
pub struct RecordView<'a> {
    set: &'a RecordSet,
    rows: Vec<usize>,
}

impl<'a> RecordView<'a> {
    pub fn all(set: &'a RecordSet) -> Self {
        RecordView { set, rows: (0..set.len()).collect() }
    }

    pub fn filter(set: &'a RecordSet, filter: &RecordFilter) -> Self {
        // Selections over absent columns, or with nothing selected, do not constrain.
        let selections: Vec<(usize, &BTreeSet<String>)> = filter
            .selections
            .iter()
            .filter(|s| !s.allowed.is_empty())
            .filter_map(|s| set.column_index(&s.column).map(|idx| (idx, &s.allowed)))
            .collect();

        let rows = (0..set.len())
            .filter(|&row| match filter.date_range {
                Some((from, to)) => set
                    .request_date(row)
                    .map(|dt| dt.date() >= from && dt.date() <= to)
                    .unwrap_or(false),
                None => true,
            })
            .filter(|&row| {
                selections.iter().all(|(idx, allowed)| {
                    set.rows()[row]
                        .get(*idx)
                        .category_key()
                        .map(|key| allowed.contains(&key))
                        .unwrap_or(false)
                })
            })
            .collect();

        RecordView { set, rows }
    }

    pub fn set(&self) -> &'a RecordSet {
        self.set
    }

    pub fn row_indices(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Filter options for `column`: present values in first-seen order.
    pub fn distinct_values(&self, column: &str) -> Vec<String> {
        let Some(idx) = self.set.column_index(column) else {
            return Vec::new();
        };
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|&row| self.set.rows()[row].get(idx).category_key())
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }

    /// Rows of the view as JSON objects keyed by column name, at most `limit`.
    pub fn to_json_rows(&self, limit: Option<usize>) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .filter_map(|&row| self.set.row_to_json(row))
            .collect()
    }

    /// Earliest and latest request date in the view.
    pub fn date_bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let dates = self.rows.iter().filter_map(|&row| self.set.request_date(row)).map(|dt| dt.date());
        dates.fold(None, |acc, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use shared::models::{CanonicalColumns, CellValue, Record};

    pub(crate) fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> CellValue {
        CellValue::Date(date(y, m, d).and_hms_opt(h, 0, 0).unwrap())
    }

    fn num(n: f64) -> CellValue {
        CellValue::Number(n)
    }

    // Columns: Cód.Equipamento, TIPO, Data da Solicitação, Qtd. Pendente, Dias em Situação, Valor
    pub(crate) fn sample_set() -> RecordSet {
        let columns = ["Cód.Equipamento", "TIPO", "Data da Solicitação", "Qtd. Pendente", "Dias em Situação", "Valor"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let canonical = CanonicalColumns {
            request_date: Some(2),
            pending_qty: Some(3),
            days_in_status: Some(4),
            value: Some(5),
            ..Default::default()
        };
        let rows = vec![
            Record::new(vec![text("EQ-1"), text("PNEU"), at(2024, 1, 5, 9), num(2.0), num(3.0), num(100.0)]),
            Record::new(vec![text("EQ-2"), text("FILTRO"), at(2024, 1, 10, 23), num(0.0), num(10.0), num(40.0)]),
            Record::new(vec![text("EQ-1"), text("PNEU"), at(2024, 1, 20, 0), num(1.0), CellValue::Missing, num(60.0)]),
            Record::new(vec![text("EQ-3"), CellValue::Missing, CellValue::Missing, num(5.0), num(7.0), CellValue::Missing]),
            Record::new(vec![text("EQ-4"), text("OLEO"), at(2023, 12, 28, 12), num(0.0), num(1.0), num(10.0)]),
        ];
        RecordSet::new(columns, canonical, rows)
    }

    #[test]
    fn test_all_view() {
        let set = sample_set();
        let view = RecordView::all(&set);
        assert_eq!(view.len(), 5);
        assert_eq!(view.row_indices(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_date_range_is_inclusive_and_drops_missing_dates() {
        let set = sample_set();
        let filter = RecordFilter::new().with_date_range(date(2024, 1, 5), date(2024, 1, 10));
        let view = RecordView::filter(&set, &filter);
        // Row 1 is at 23:00 on the last day and still counts.
        assert_eq!(view.row_indices(), &[0, 1]);
    }

    #[test]
    fn test_inverted_range_is_empty() {
        let set = sample_set();
        let filter = RecordFilter::new().with_date_range(date(2024, 2, 1), date(2024, 1, 1));
        assert!(RecordView::filter(&set, &filter).is_empty());
    }

    #[test]
    fn test_selections() {
        let set = sample_set();
        let filter = RecordFilter::new().select("TIPO", ["PNEU", "OLEO"]);
        assert_eq!(RecordView::filter(&set, &filter).row_indices(), &[0, 2, 4]);

        let filter = RecordFilter::new().select("TIPO", ["PNEU"]).select("Cód.Equipamento", ["EQ-1"]);
        assert_eq!(RecordView::filter(&set, &filter).row_indices(), &[0, 2]);
    }

    #[test]
    fn test_ignored_selections() {
        let set = sample_set();
        let filter = RecordFilter::new()
            .select("Fornecedor", ["ACME"])
            .select("TIPO", Vec::<String>::new());
        assert_eq!(RecordView::filter(&set, &filter).len(), 5);
    }

    #[test]
    fn test_filtering_leaves_set_untouched() {
        let set = sample_set();
        let before = set.clone();
        let _ = RecordView::filter(&set, &RecordFilter::new().select("TIPO", ["PNEU"]));
        assert_eq!(set, before);
    }

    #[test]
    fn test_distinct_values_and_bounds() {
        let set = sample_set();
        let view = RecordView::all(&set);
        assert_eq!(view.distinct_values("TIPO"), vec!["PNEU", "FILTRO", "OLEO"]);
        assert!(view.distinct_values("Fornecedor").is_empty());
        assert_eq!(view.date_bounds(), Some((date(2023, 12, 28), date(2024, 1, 20))));
    }

    #[test]
    fn test_json_rows_follow_the_view() {
        let set = sample_set();
        let view = RecordView::filter(&set, &RecordFilter::new().select("TIPO", ["PNEU"]));
        let rows = view.to_json_rows(None);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["Valor"], serde_json::json!(100.0));
        assert_eq!(rows[1]["Data da Solicitação"], serde_json::json!("2024-01-20 00:00:00"));
        assert!(rows[1]["Dias em Situação"].is_null());
        assert_eq!(view.to_json_rows(Some(1)).len(), 1);
    }
}
