use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// A single (water year, acre-feet) record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualEntry {
    pub year: i32,
    pub value: f64,
}

/// An ordered sequence of per-year acre-feet values.
///
/// Entries are sorted ascending by year with no duplicate years. A series is
/// never mutated after construction; every operation returns a new series.
///
/// Combining operations (`add`, `subtract`) require identical year sequences
/// and fail with [`ModelError::RangeMismatch`] otherwise. There is no
/// implicit reshaping: callers bring series onto a common range with
/// [`AnnualSeries::reshape`] before combining them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AnnualSeries {
    entries: Vec<AnnualEntry>,
}

impl AnnualSeries {
    /// Build a series from entries, sorting them by year.
    ///
    /// Duplicate years are rejected with [`ModelError::Configuration`].
    pub fn from_entries(mut entries: Vec<AnnualEntry>) -> Result<Self, ModelError> {
        entries.sort_by_key(|entry| entry.year);
        for window in entries.windows(2) {
            if window[0].year == window[1].year {
                return Err(ModelError::Configuration(format!(
                    "duplicate year {} in annual series",
                    window[0].year
                )));
            }
        }
        Ok(AnnualSeries { entries })
    }

    /// Convenience constructor from (year, value) pairs.
    pub fn from_pairs(pairs: &[(i32, f64)]) -> Result<Self, ModelError> {
        let entries = pairs
            .iter()
            .map(|&(year, value)| AnnualEntry { year, value })
            .collect();
        AnnualSeries::from_entries(entries)
    }

    /// Entries already sorted ascending with unique years.
    /// For internal reductions whose construction guarantees the invariant.
    pub(crate) fn from_sorted_unique(entries: Vec<AnnualEntry>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].year < w[1].year));
        AnnualSeries { entries }
    }

    pub fn entries(&self) -> &[AnnualEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnnualEntry> {
        self.entries.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|entry| entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn year_begin(&self) -> Option<i32> {
        self.entries.first().map(|entry| entry.year)
    }

    pub fn year_end(&self) -> Option<i32> {
        self.entries.last().map(|entry| entry.year)
    }

    /// Inclusive (first, last) year range, `None` for an empty series.
    pub fn range(&self) -> Option<(i32, i32)> {
        match (self.year_begin(), self.year_end()) {
            (Some(begin), Some(end)) => Some((begin, end)),
            _ => None,
        }
    }

    /// Value for a year, `None` if the year is absent.
    pub fn get(&self, year: i32) -> Option<f64> {
        self.entries
            .binary_search_by_key(&year, |entry| entry.year)
            .ok()
            .map(|index| self.entries[index].value)
    }

    /// Sum of all values in the series.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.value).sum()
    }

    /// New series with every value multiplied by `factor`.
    /// Used for unit conversion, e.g. kaf feeds scaled by 1000.
    pub fn scale(&self, factor: f64) -> AnnualSeries {
        let entries = self
            .entries
            .iter()
            .map(|entry| AnnualEntry {
                year: entry.year,
                value: entry.value * factor,
            })
            .collect();
        AnnualSeries::from_sorted_unique(entries)
    }

    /// Reshape onto the contiguous inclusive range `[year_begin, year_end]`.
    ///
    /// Always returns exactly `year_end - year_begin + 1` entries, one per
    /// year. Years absent from the source are filled with zero; years
    /// outside the range are dropped. An inverted range yields an empty
    /// series.
    pub fn reshape(&self, year_begin: i32, year_end: i32) -> AnnualSeries {
        if year_begin > year_end {
            return AnnualSeries::default();
        }
        let entries = (year_begin..=year_end)
            .map(|year| AnnualEntry {
                year,
                value: self.get(year).unwrap_or(0.0),
            })
            .collect();
        AnnualSeries::from_sorted_unique(entries)
    }

    fn same_years(&self, other: &AnnualSeries) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|(a, b)| a.year == b.year)
    }

    /// Elementwise sum of one or more series covering identical years.
    ///
    /// A single series sums to itself; lake inflows composed from one
    /// source go through the same path as multi-source compositions.
    pub fn add(series: &[&AnnualSeries]) -> Result<AnnualSeries, ModelError> {
        let first = match series.first() {
            Some(first) => first,
            None => {
                return Err(ModelError::Configuration(
                    "add requires at least one series".to_string(),
                ))
            }
        };
        for other in &series[1..] {
            if !first.same_years(other) {
                return Err(ModelError::RangeMismatch {
                    expected: first.range(),
                    found: other.range(),
                });
            }
        }
        let entries = first
            .entries
            .iter()
            .enumerate()
            .map(|(index, entry)| AnnualEntry {
                year: entry.year,
                value: series.iter().map(|s| s.entries[index].value).sum(),
            })
            .collect();
        Ok(AnnualSeries::from_sorted_unique(entries))
    }

    /// Elementwise `a - b` over identical years.
    pub fn subtract(a: &AnnualSeries, b: &AnnualSeries) -> Result<AnnualSeries, ModelError> {
        if !a.same_years(b) {
            return Err(ModelError::RangeMismatch {
                expected: a.range(),
                found: b.range(),
            });
        }
        let entries = a
            .entries
            .iter()
            .zip(b.entries.iter())
            .map(|(ea, eb)| AnnualEntry {
                year: ea.year,
                value: ea.value - eb.value,
            })
            .collect();
        Ok(AnnualSeries::from_sorted_unique(entries))
    }

    /// Trailing simple moving average over `window` years.
    ///
    /// The first `window - 1` years have no complete trailing window and are
    /// omitted from the result.
    pub fn running_average(&self, window: usize) -> AnnualSeries {
        let window = window.max(1);
        if self.entries.len() < window {
            return AnnualSeries::default();
        }
        let entries = self
            .entries
            .windows(window)
            .map(|slice| AnnualEntry {
                year: slice[window - 1].year,
                value: slice.iter().map(|entry| entry.value).sum::<f64>() / window as f64,
            })
            .collect();
        AnnualSeries::from_sorted_unique(entries)
    }

    /// Scalar mean of the most recent `window` years.
    ///
    /// Degrades to the mean of however many entries exist; 0.0 for an empty
    /// series. This is the `avg_cu` primitive behind every assessment.
    pub fn trailing_average(&self, window: usize) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let take = window.max(1).min(self.entries.len());
        let start = self.entries.len() - take;
        self.entries[start..]
            .iter()
            .map(|entry| entry.value)
            .sum::<f64>()
            / take as f64
    }
}

impl<'a> IntoIterator for &'a AnnualSeries {
    type Item = &'a AnnualEntry;
    type IntoIter = std::slice::Iter<'a, AnnualEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
