use lcr_core::annual::AnnualSeries;
use lcr_core::error::ModelError;
use lcr_data::feed::{FeedRequest, SeriesProvider};

/// A feed key plus the multiplier that converts its units to acre-feet.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSpec {
    pub key: String,
    pub multiplier: f64,
}

impl FeedSpec {
    /// A feed already reported in acre-feet.
    pub fn af(key: &str) -> Self {
        FeedSpec {
            key: key.to_string(),
            multiplier: 1.0,
        }
    }

    /// A feed reported in thousands of acre-feet (24-month study tables).
    pub fn kaf(key: &str) -> Self {
        FeedSpec {
            key: key.to_string(),
            multiplier: 1000.0,
        }
    }

    fn request(&self, water_year_month: u32, year_begin: i32, year_end: i32) -> FeedRequest {
        FeedRequest::new(&self.key)
            .multiplier(self.multiplier)
            .water_year_month(water_year_month)
            .range(year_begin, year_end)
    }
}

/// One term in a lake's inflow composition.
#[derive(Debug, Clone, PartialEq)]
pub enum InflowSource {
    /// The release of the lake immediately upstream in the chain.
    UpstreamRelease,
    /// A tributary gage or return-flow feed.
    Feed(FeedSpec),
}

/// Static configuration for one reservoir node. The per-lake boilerplate of
/// the dam fleet collapses into this table row: which feeds a lake reads and
/// how its inflow is composed from upstream outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct LakeConfig {
    pub name: String,
    pub release: FeedSpec,
    pub inflow: Vec<InflowSource>,
    pub side_inflow: Option<FeedSpec>,
    pub storage: Option<FeedSpec>,
    pub evaporation: Option<FeedSpec>,
}

impl LakeConfig {
    pub fn new(name: &str, release: FeedSpec) -> Self {
        LakeConfig {
            name: name.to_string(),
            release,
            inflow: Vec::new(),
            side_inflow: None,
            storage: None,
            evaporation: None,
        }
    }

    pub fn inflow(mut self, sources: Vec<InflowSource>) -> Self {
        self.inflow = sources;
        self
    }

    pub fn side_inflow(mut self, feed: FeedSpec) -> Self {
        self.side_inflow = Some(feed);
        self
    }

    pub fn storage(mut self, feed: FeedSpec) -> Self {
        self.storage = Some(feed);
        self
    }

    pub fn evaporation(mut self, feed: FeedSpec) -> Self {
        self.evaporation = Some(feed);
        self
    }
}

/// A reservoir node in the basin chain.
///
/// Every facet is a pure transformation of provider series normalized to
/// the lake's water-year start month. Facets a lake does not record
/// (a pass-through dam has no storage or evaporation) return `Ok(None)`,
/// which is "not applicable" and distinct from a zero series.
#[derive(Debug, Clone)]
pub struct Lake {
    config: LakeConfig,
    water_year_month: u32,
}

impl Lake {
    pub fn new(config: LakeConfig, water_year_month: u32) -> Self {
        Lake {
            config,
            water_year_month,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn water_year_month(&self) -> u32 {
        self.water_year_month
    }

    /// Annual release through the lake's dam.
    pub fn release(
        &self,
        provider: &dyn SeriesProvider,
        year_begin: i32,
        year_end: i32,
    ) -> Result<AnnualSeries, ModelError> {
        provider.annual_af(&self.config.release.request(
            self.water_year_month,
            year_begin,
            year_end,
        ))
    }

    /// Annual inflow, composed from the configured sources: the upstream
    /// lake's release and/or tributary gage feeds, each reshaped onto the
    /// window and summed.
    pub fn inflow(
        &self,
        provider: &dyn SeriesProvider,
        upstream: Option<&Lake>,
        year_begin: i32,
        year_end: i32,
    ) -> Result<AnnualSeries, ModelError> {
        if self.config.inflow.is_empty() {
            return Err(ModelError::Configuration(format!(
                "lake '{}' has no inflow composition",
                self.config.name
            )));
        }
        let mut terms: Vec<AnnualSeries> = Vec::with_capacity(self.config.inflow.len());
        for source in &self.config.inflow {
            let series = match source {
                InflowSource::UpstreamRelease => match upstream {
                    Some(lake) => lake.release(provider, year_begin, year_end)?,
                    None => {
                        return Err(ModelError::Configuration(format!(
                            "lake '{}' composes inflow from an upstream release but has no upstream lake",
                            self.config.name
                        )))
                    }
                },
                InflowSource::Feed(feed) => provider.annual_af(&feed.request(
                    self.water_year_month,
                    year_begin,
                    year_end,
                ))?,
            };
            terms.push(series);
        }
        let refs: Vec<&AnnualSeries> = terms.iter().collect();
        AnnualSeries::add(&refs)
    }

    /// Ungaged side inflow, where the 24-month studies report one.
    pub fn side_inflow(
        &self,
        provider: &dyn SeriesProvider,
        year_begin: i32,
        year_end: i32,
    ) -> Result<Option<AnnualSeries>, ModelError> {
        self.optional_facet(&self.config.side_inflow, provider, Some((year_begin, year_end)))
    }

    /// Full recorded storage series; takes no window.
    pub fn storage(
        &self,
        provider: &dyn SeriesProvider,
    ) -> Result<Option<AnnualSeries>, ModelError> {
        self.optional_facet(&self.config.storage, provider, None)
    }

    /// Reservoir evaporation losses.
    pub fn evaporation(
        &self,
        provider: &dyn SeriesProvider,
        year_begin: i32,
        year_end: i32,
    ) -> Result<Option<AnnualSeries>, ModelError> {
        self.optional_facet(&self.config.evaporation, provider, Some((year_begin, year_end)))
    }

    fn optional_facet(
        &self,
        feed: &Option<FeedSpec>,
        provider: &dyn SeriesProvider,
        window: Option<(i32, i32)>,
    ) -> Result<Option<AnnualSeries>, ModelError> {
        match feed {
            Some(feed) => {
                let mut request = FeedRequest::new(&feed.key)
                    .multiplier(feed.multiplier)
                    .water_year_month(self.water_year_month);
                if let Some((year_begin, year_end)) = window {
                    request = request.range(year_begin, year_end);
                }
                provider.annual_af(&request).map(Some)
            }
            None => Ok(None),
        }
    }
}
