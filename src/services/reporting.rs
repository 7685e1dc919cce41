use std::collections::BTreeMap;

use serde::Serialize;
use time::PrimitiveDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct MonthCount {
    pub(crate) month: String,
    pub(crate) count: i64,
}

/// Buckets completion instants by calendar month, oldest first. Months
/// without activity are omitted.
pub(crate) fn month_histogram(completions: &[PrimitiveDateTime]) -> Vec<MonthCount> {
    let mut buckets: BTreeMap<(i32, u8), i64> = BTreeMap::new();
    for completed_at in completions {
        let key = (completed_at.year(), u8::from(completed_at.month()));
        *buckets.entry(key).or_insert(0) += 1;
    }

    buckets
        .into_iter()
        .map(|((year, month), count)| MonthCount { month: month_label(year, month), count })
        .collect()
}

fn month_label(year: i32, month: u8) -> String {
    match time::Month::try_from(month) {
        Ok(name) => format!("{name} {year}"),
        Err(_) => format!("{month} {year}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn histogram_groups_by_month() {
        let completions = vec![
            datetime!(2026-01-03 10:00:00),
            datetime!(2026-01-17 22:15:00),
            datetime!(2026-02-01 08:00:00),
        ];

        let histogram = month_histogram(&completions);

        assert_eq!(
            histogram,
            vec![
                MonthCount { month: "January 2026".to_string(), count: 2 },
                MonthCount { month: "February 2026".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn histogram_orders_across_year_boundaries() {
        let completions = vec![datetime!(2026-01-10 09:00:00), datetime!(2025-12-31 23:59:00)];

        let histogram = month_histogram(&completions);

        assert_eq!(histogram[0].month, "December 2025");
        assert_eq!(histogram[1].month, "January 2026");
    }

    #[test]
    fn histogram_of_no_completions_is_empty() {
        assert!(month_histogram(&[]).is_empty());
    }
}
