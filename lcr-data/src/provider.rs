use crate::feed::{FeedRequest, SeriesProvider};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use lcr_core::annual::{AnnualEntry, AnnualSeries};
use lcr_core::error::ModelError;
use lcr_core::water_year::{dated_to_water_year, DatedValue};
use log::debug;
use std::collections::HashMap;
use std::path::PathBuf;

/// Date format used in dated feed files: "YYYY-MM-DD".
pub const FEED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Feed file layout, detected from the CSV header.
///
/// `year,value` rows are already annual; `date,value` rows carry daily or
/// monthly records that get reduced onto water years.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FeedLayout {
    Annual,
    Dated,
}

struct AnnualRecord {
    year: i32,
    value: f64,
}

impl TryFrom<&StringRecord> for AnnualRecord {
    type Error = String;

    fn try_from(record: &StringRecord) -> Result<Self, Self::Error> {
        let year = record
            .get(0)
            .and_then(|s| s.trim().parse::<i32>().ok())
            .ok_or_else(|| format!("bad year field in row {record:?}"))?;
        let value = record
            .get(1)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .ok_or_else(|| format!("bad value field in row {record:?}"))?;
        Ok(AnnualRecord { year, value })
    }
}

struct DatedRecord(DatedValue);

impl TryFrom<&StringRecord> for DatedRecord {
    type Error = String;

    fn try_from(record: &StringRecord) -> Result<Self, Self::Error> {
        let date = record
            .get(0)
            .and_then(|s| NaiveDate::parse_from_str(s.trim(), FEED_DATE_FORMAT).ok())
            .ok_or_else(|| format!("bad date field in row {record:?}"))?;
        let value = record
            .get(1)
            .and_then(|s| s.trim().parse::<f64>().ok())
            .ok_or_else(|| format!("bad value field in row {record:?}"))?;
        Ok(DatedRecord(DatedValue { date, value }))
    }
}

fn data_unavailable(key: &str, reason: impl Into<String>) -> ModelError {
    ModelError::DataUnavailable {
        feed: key.to_string(),
        reason: reason.into(),
    }
}

/// Parse a feed CSV body into an annual series per the request.
///
/// Header must be `year,value` or `date,value`. Malformed rows are an
/// error, not a silent zero.
pub fn parse_feed_csv(body: &str, request: &FeedRequest) -> Result<AnnualSeries, ModelError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());

    let layout = {
        let headers = reader
            .headers()
            .map_err(|e| data_unavailable(&request.key, e.to_string()))?;
        match headers.get(0).map(|s| s.trim().to_lowercase()) {
            Some(ref s) if s == "year" => FeedLayout::Annual,
            Some(ref s) if s == "date" => FeedLayout::Dated,
            other => {
                return Err(data_unavailable(
                    &request.key,
                    format!("unrecognized header column {other:?}, expected 'year' or 'date'"),
                ))
            }
        }
    };

    let mut annual_entries: Vec<AnnualEntry> = Vec::new();
    let mut dated_records: Vec<DatedValue> = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| data_unavailable(&request.key, e.to_string()))?;
        match layout {
            FeedLayout::Annual => {
                let row = AnnualRecord::try_from(&record)
                    .map_err(|reason| data_unavailable(&request.key, reason))?;
                annual_entries.push(AnnualEntry {
                    year: row.year,
                    value: row.value,
                });
            }
            FeedLayout::Dated => {
                let DatedRecord(row) = DatedRecord::try_from(&record)
                    .map_err(|reason| data_unavailable(&request.key, reason))?;
                dated_records.push(row);
            }
        }
    }

    let series = match layout {
        FeedLayout::Annual => AnnualSeries::from_entries(annual_entries)
            .map_err(|e| data_unavailable(&request.key, e.to_string()))?,
        FeedLayout::Dated => dated_to_water_year(&dated_records, request.water_year_month),
    };
    Ok(finalize(series, request))
}

fn finalize(series: AnnualSeries, request: &FeedRequest) -> AnnualSeries {
    let series = if request.multiplier != 1.0 {
        series.scale(request.multiplier)
    } else {
        series
    };
    match request.range {
        Some((year_begin, year_end)) => series.reshape(year_begin, year_end),
        None => series,
    }
}

/// Provider backed by a directory of feed CSV files.
///
/// A feed key `releases/hoover_dam` maps to `<root>/releases/hoover_dam.csv`.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    root: PathBuf,
}

impl CsvProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        CsvProvider { root: root.into() }
    }
}

impl SeriesProvider for CsvProvider {
    fn annual_af(&self, request: &FeedRequest) -> Result<AnnualSeries, ModelError> {
        let path = self.root.join(format!("{}.csv", request.key));
        let body = std::fs::read_to_string(&path)
            .map_err(|e| data_unavailable(&request.key, format!("{}: {e}", path.display())))?;
        let series = parse_feed_csv(&body, request)?;
        debug!(
            "loaded feed '{}' from {} ({} years)",
            request.key,
            path.display(),
            series.len()
        );
        Ok(series)
    }
}

/// Provider over pre-materialized in-memory series.
///
/// Series are assumed already normalized to the caller's water-year start
/// month; the request's `water_year_month` is not re-applied. Used in tests
/// and wherever retrieval has been completed and cached up front.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    series: HashMap<String, AnnualSeries>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        MemoryProvider::default()
    }

    pub fn insert(&mut self, key: &str, series: AnnualSeries) {
        self.series.insert(key.to_string(), series);
    }
}

impl SeriesProvider for MemoryProvider {
    fn annual_af(&self, request: &FeedRequest) -> Result<AnnualSeries, ModelError> {
        let series = self
            .series
            .get(&request.key)
            .ok_or_else(|| data_unavailable(&request.key, "no in-memory series registered"))?;
        Ok(finalize(series.clone(), request))
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_feed_csv, MemoryProvider};
    use crate::feed::{FeedRequest, SeriesProvider};
    use lcr_core::annual::AnnualSeries;
    use lcr_core::error::ModelError;

    #[test]
    fn test_parse_annual_layout() {
        let body = "year,value\n2019,100.5\n2020,200.0\n2021,300.25\n";
        let request = FeedRequest::new("releases/test");
        let series = parse_feed_csv(body, &request).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.get(2020), Some(200.0));
    }

    #[test]
    fn test_parse_dated_layout_reduces_to_water_years() {
        let body = "date,value\n2020-11-15,100\n2021-02-15,200\n2021-11-15,400\n";
        let request = FeedRequest::new("gages/test").water_year_month(10);
        let series = parse_feed_csv(body, &request).unwrap();
        // Nov 2020 and Feb 2021 both land in water year 2021
        assert_eq!(series.get(2021), Some(300.0));
        assert_eq!(series.get(2022), Some(400.0));
    }

    #[test]
    fn test_multiplier_and_range() {
        let body = "year,value\n2020,580\n";
        let request = FeedRequest::new("evap/test")
            .multiplier(1000.0)
            .range(2019, 2021);
        let series = parse_feed_csv(body, &request).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.get(2019), Some(0.0));
        assert_eq!(series.get(2020), Some(580000.0));
    }

    #[test]
    fn test_malformed_row_is_data_unavailable() {
        let body = "year,value\n2020,not_a_number\n";
        let request = FeedRequest::new("bad/feed");
        let result = parse_feed_csv(body, &request);
        assert!(matches!(
            result,
            Err(ModelError::DataUnavailable { feed, .. }) if feed == "bad/feed"
        ));
    }

    #[test]
    fn test_malformed_date_row_is_data_unavailable() {
        let body = "date,value\n11/15/2020,100\n";
        let request = FeedRequest::new("bad/dated_feed");
        let result = parse_feed_csv(body, &request);
        assert!(matches!(
            result,
            Err(ModelError::DataUnavailable { feed, .. }) if feed == "bad/dated_feed"
        ));
    }

    #[test]
    fn test_unknown_header_is_data_unavailable() {
        let body = "month,value\n1,2\n";
        let request = FeedRequest::new("bad/header");
        assert!(parse_feed_csv(body, &request).is_err());
    }

    #[test]
    fn test_memory_provider_lookup() {
        let mut provider = MemoryProvider::new();
        provider.insert(
            "releases/hoover_dam",
            AnnualSeries::from_pairs(&[(2020, 9000000.0)]).unwrap(),
        );

        let hit = provider
            .annual_af(&FeedRequest::new("releases/hoover_dam"))
            .unwrap();
        assert_eq!(hit.get(2020), Some(9000000.0));

        let miss = provider.annual_af(&FeedRequest::new("releases/davis_dam"));
        assert!(matches!(miss, Err(ModelError::DataUnavailable { .. })));
    }
}
