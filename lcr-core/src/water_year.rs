use crate::annual::{AnnualEntry, AnnualSeries};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Calendar-year accounting. The Bureau's annual reports tabulate by
/// calendar year, so this is the default unless a caller picks another
/// start month.
pub const WATER_YEAR_MONTH_DEFAULT: u32 = 1;

/// A dated acre-feet record prior to water-year reduction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedValue {
    pub date: NaiveDate,
    pub value: f64,
}

/// Water year label for a date given the start month (1-12).
///
/// With `start_month == 1` this is the calendar year. Otherwise months at or
/// past the start month belong to the next labeled year, so October 2021
/// under `start_month == 10` falls in water year 2022.
pub fn water_year_for(date: &NaiveDate, start_month: u32) -> i32 {
    debug_assert!((1..=12).contains(&start_month));
    let month = date.month();
    let year = date.year();
    if start_month > 1 && month >= start_month {
        year + 1
    } else {
        year
    }
}

/// Sum dated records (daily or monthly) into an annual acre-feet series.
pub fn dated_to_water_year(records: &[DatedValue], start_month: u32) -> AnnualSeries {
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for record in records {
        *totals
            .entry(water_year_for(&record.date, start_month))
            .or_insert(0.0) += record.value;
    }
    let entries = totals
        .into_iter()
        .map(|(year, value)| AnnualEntry { year, value })
        .collect();
    // BTreeMap iteration is sorted with unique keys
    AnnualSeries::from_sorted_unique(entries)
}
