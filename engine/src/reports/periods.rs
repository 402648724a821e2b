use super::view::RecordView;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
}

impl Granularity {
    /// First day of the period containing `date`. Weeks start on Monday.
    pub fn period_start(self, date: NaiveDate) -> NaiveDate {
        match self {
            Granularity::Daily => date,
            Granularity::Weekly => date - Duration::days(i64::from(date.weekday().num_days_from_monday())),
            Granularity::Monthly => date.with_day(1).unwrap_or(date),
        }
    }
}

// Accepts the short codes "D", "W", "M" as well as the names.
impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "d" | "daily" | "diaria" => Ok(Granularity::Daily),
            "w" | "weekly" | "semanal" => Ok(Granularity::Weekly),
            "m" | "monthly" | "mensal" => Ok(Granularity::Monthly),
            other => Err(format!("Unknown granularity '{}'. Use D, W or M.", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodCount {
    pub period: NaiveDate,
    pub count: usize,
}

/// Requests per period, oldest first. Rows without a date are skipped.
pub fn period_counts(view: &RecordView<'_>, granularity: Granularity) -> Vec<PeriodCount> {
    let set = view.set();
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for dt in view.row_indices().iter().filter_map(|&row| set.request_date(row)) {
        *counts.entry(granularity.period_start(dt.date())).or_insert(0) += 1;
    }
    counts.into_iter().map(|(period, count)| PeriodCount { period, count }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::view::tests::{date, sample_set};

    #[test]
    fn test_period_start() {
        // 2024-01-10 is a Wednesday
        assert_eq!(Granularity::Weekly.period_start(date(2024, 1, 10)), date(2024, 1, 8));
        assert_eq!(Granularity::Weekly.period_start(date(2024, 1, 8)), date(2024, 1, 8));
        assert_eq!(Granularity::Monthly.period_start(date(2024, 1, 31)), date(2024, 1, 1));
        assert_eq!(Granularity::Daily.period_start(date(2024, 1, 31)), date(2024, 1, 31));
    }

    #[test]
    fn test_from_str() {
        assert_eq!("W".parse::<Granularity>(), Ok(Granularity::Weekly));
        assert_eq!("mensal".parse::<Granularity>(), Ok(Granularity::Monthly));
        assert!("Y".parse::<Granularity>().is_err());
    }

    #[test]
    fn test_monthly_counts() {
        let set = sample_set();
        let view = RecordView::all(&set);
        let counts = period_counts(&view, Granularity::Monthly);
        assert_eq!(counts, vec![
            PeriodCount { period: date(2023, 12, 1), count: 1 },
            PeriodCount { period: date(2024, 1, 1), count: 3 },
        ]);
    }

    #[test]
    fn test_weekly_counts() {
        let set = sample_set();
        let view = RecordView::all(&set);
        let counts = period_counts(&view, Granularity::Weekly);
        let periods: Vec<NaiveDate> = counts.iter().map(|c| c.period).collect();
        // 2023-12-28 -> 12-25, 2024-01-05 -> 01-01, 01-10 -> 01-08, 01-20 -> 01-15
        assert_eq!(periods, vec![date(2023, 12, 25), date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]);
    }
}
