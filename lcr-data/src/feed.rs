use lcr_core::annual::AnnualSeries;
use lcr_core::error::ModelError;
use lcr_core::water_year::WATER_YEAR_MONTH_DEFAULT;

/// A request for one annual acre-feet series from a provider.
///
/// The `key` identifies the dataset, e.g. `releases/hoover_dam` or
/// `az/crit_consumptive_use`. The `multiplier` converts feed units to
/// acre-feet (24-month study tables report kaf, so those feeds use 1000.0).
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRequest {
    pub key: String,
    pub multiplier: f64,
    pub water_year_month: u32,
    pub range: Option<(i32, i32)>,
}

impl FeedRequest {
    pub fn new(key: &str) -> Self {
        FeedRequest {
            key: key.to_string(),
            multiplier: 1.0,
            water_year_month: WATER_YEAR_MONTH_DEFAULT,
            range: None,
        }
    }

    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn water_year_month(mut self, month: u32) -> Self {
        self.water_year_month = month;
        self
    }

    /// Reshape the result onto `[year_begin, year_end]`, zero-filling gaps.
    pub fn range(mut self, year_begin: i32, year_end: i32) -> Self {
        self.range = Some((year_begin, year_end));
        self
    }
}

/// The model's only view of external time-series data.
///
/// Implementations must signal [`ModelError::DataUnavailable`] for feeds
/// they cannot produce; silently returning zeros is not allowed.
pub trait SeriesProvider {
    fn annual_af(&self, request: &FeedRequest) -> Result<AnnualSeries, ModelError>;
}
