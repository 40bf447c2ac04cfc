use crate::assessment::{
    self, active_users_through_reaches, state_assessments, through_reach_cu_avg, BasinAssessment,
    ReachAssessment, UserAssessment,
};
use crate::lake::{FeedSpec, Lake, LakeConfig};
use crate::reach::{Reach, ReachBalance};
use crate::registry::{Registry, StateInfo, User};
use lcr_core::annual::AnnualSeries;
use lcr_core::error::ModelError;
use lcr_data::feed::{FeedRequest, SeriesProvider};
use log::{info, warn};
use std::collections::{HashMap, HashSet};

/// Static configuration for one reach of the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ReachConfig {
    pub name: String,
    pub upper: Option<String>,
    pub lower: String,
    pub loss: f64,
}

impl ReachConfig {
    pub fn new(name: &str, upper: Option<&str>, lower: &str, loss: f64) -> Self {
        ReachConfig {
            name: name.to_string(),
            upper: upper.map(|s| s.to_string()),
            lower: lower.to_string(),
            loss,
        }
    }
}

/// Static configuration for one water user: identity plus the feed its
/// consumptive-use series is loaded from.
#[derive(Debug, Clone, PartialEq)]
pub struct UserConfig {
    pub name: String,
    pub state: String,
    pub reach: String,
    pub example: bool,
    pub cu_feed: FeedSpec,
}

impl UserConfig {
    pub fn new(name: &str, state: &str, reach: &str, cu_feed: FeedSpec) -> Self {
        UserConfig {
            name: name.to_string(),
            state: state.to_string(),
            reach: reach.to_string(),
            example: false,
            cu_feed,
        }
    }

    /// Flag the user for detailed per-user assessment reporting.
    pub fn example(mut self) -> Self {
        self.example = true;
        self
    }
}

/// The full data-driven basin table: topology plus registry membership.
#[derive(Debug, Clone)]
pub struct BasinConfig {
    pub water_year_month: u32,
    pub lakes: Vec<LakeConfig>,
    pub reaches: Vec<ReachConfig>,
    pub states: Vec<StateInfo>,
    pub users: Vec<UserConfig>,
}

/// A validated basin: the ordered reach chain and its lakes, constructed
/// once per run. Time-series outputs are recomputed for each requested
/// window, never cached across runs.
#[derive(Debug, Clone)]
pub struct Basin {
    water_year_month: u32,
    lakes: Vec<Lake>,
    lake_index: HashMap<String, usize>,
    reaches: Vec<Reach>,
    states: Vec<StateInfo>,
    users: Vec<UserConfig>,
}

/// The output of one model run: the materialized registry plus the
/// immutable per-reach assessment results.
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub registry: Registry,
    pub assessment: BasinAssessment,
}

impl ModelRun {
    pub fn user_assessment(&self, user_name: &str) -> Option<UserAssessment> {
        assessment::user_assessment(
            &self.assessment.reaches,
            &self.registry,
            user_name,
            self.assessment.year_end,
        )
    }

    /// Assessments for every user flagged `example`, in registry order.
    pub fn example_user_assessments(&self) -> Vec<UserAssessment> {
        self.registry
            .example_users()
            .iter()
            .filter_map(|user| self.user_assessment(&user.name))
            .collect()
    }
}

fn configuration(message: String) -> ModelError {
    ModelError::Configuration(message)
}

impl Basin {
    /// Validate a basin table and build the reach chain.
    ///
    /// Rejects a malformed topology: an out-of-range water-year start
    /// month, a reach referencing a lake that does not exist, a negative
    /// loss, a broken chain (a reach's upper lake differing from the
    /// previous reach's lower lake), or duplicate lake/user names.
    pub fn from_config(config: BasinConfig) -> Result<Basin, ModelError> {
        if !(1..=12).contains(&config.water_year_month) {
            return Err(configuration(format!(
                "water year start month {} out of range 1-12",
                config.water_year_month
            )));
        }
        if config.reaches.is_empty() {
            return Err(configuration("basin has no reaches".to_string()));
        }

        let mut lake_index = HashMap::new();
        for (index, lake) in config.lakes.iter().enumerate() {
            if lake_index.insert(lake.name.clone(), index).is_some() {
                return Err(configuration(format!("duplicate lake '{}'", lake.name)));
            }
        }

        let state_abbreviations: HashSet<&str> = config
            .states
            .iter()
            .map(|state| state.abbreviation.as_str())
            .collect();
        let reach_names: HashSet<&str> =
            config.reaches.iter().map(|reach| reach.name.as_str()).collect();

        for (index, reach) in config.reaches.iter().enumerate() {
            if !lake_index.contains_key(&reach.lower) {
                return Err(configuration(format!(
                    "reach '{}' references unknown lower lake '{}'",
                    reach.name, reach.lower
                )));
            }
            if let Some(upper) = &reach.upper {
                if !lake_index.contains_key(upper) {
                    return Err(configuration(format!(
                        "reach '{}' references unknown upper lake '{}'",
                        reach.name, upper
                    )));
                }
            }
            if reach.loss < 0.0 || !reach.loss.is_finite() {
                return Err(configuration(format!(
                    "reach '{}' has negative or non-finite loss {}",
                    reach.name, reach.loss
                )));
            }
            if index == 0 {
                if reach.upper.is_some() {
                    return Err(configuration(format!(
                        "headwater reach '{}' must not have an upper lake",
                        reach.name
                    )));
                }
            } else {
                let previous = &config.reaches[index - 1];
                if reach.upper.as_deref() != Some(previous.lower.as_str()) {
                    return Err(configuration(format!(
                        "reach '{}' upper lake {:?} does not continue the chain from '{}'",
                        reach.name, reach.upper, previous.lower
                    )));
                }
            }
        }

        let mut user_names = HashSet::new();
        for user in &config.users {
            if !user_names.insert(user.name.as_str()) {
                return Err(configuration(format!("duplicate user '{}'", user.name)));
            }
            if !state_abbreviations.contains(user.state.as_str()) {
                return Err(configuration(format!(
                    "user '{}' references unknown state '{}'",
                    user.name, user.state
                )));
            }
            if !reach_names.contains(user.reach.as_str()) {
                return Err(configuration(format!(
                    "user '{}' references unknown reach '{}'",
                    user.name, user.reach
                )));
            }
        }

        let lakes = config
            .lakes
            .into_iter()
            .map(|lake| Lake::new(lake, config.water_year_month))
            .collect();
        let reaches = config
            .reaches
            .iter()
            .map(|reach| Reach::new(&reach.name, reach.upper.as_deref(), &reach.lower, reach.loss))
            .collect();

        Ok(Basin {
            water_year_month: config.water_year_month,
            lakes,
            lake_index,
            reaches,
            states: config.states,
            users: config.users,
        })
    }

    pub fn water_year_month(&self) -> u32 {
        self.water_year_month
    }

    pub fn reaches(&self) -> &[Reach] {
        &self.reaches
    }

    pub fn states(&self) -> &[StateInfo] {
        &self.states
    }

    pub fn lake(&self, name: &str) -> Option<&Lake> {
        self.lake_index.get(name).map(|&index| &self.lakes[index])
    }

    /// Run the full model pipeline over `[year_begin, year_end]`.
    ///
    /// Phase order is load-bearing: per-reach balances, then the cumulative
    /// active-user aggregation for every reach, then CU averages, then state
    /// assessments; each phase reads state produced for all reaches by the
    /// previous one. A missing consumptive-use feed is fatal because every
    /// downstream apportionment depends on it; a missing balance feed only
    /// voids that reach's diagnostic balance.
    pub fn model(
        &self,
        provider: &dyn SeriesProvider,
        year_begin: i32,
        year_end: i32,
    ) -> Result<ModelRun, ModelError> {
        if year_begin > year_end {
            return Err(configuration(format!(
                "year_begin {year_begin} after year_end {year_end}"
            )));
        }
        info!(
            "modeling {} reaches over {}-{}",
            self.reaches.len(),
            year_begin,
            year_end
        );

        let registry = self.materialize_registry(provider, year_begin, year_end)?;

        let mut balances: Vec<Option<ReachBalance>> = Vec::with_capacity(self.reaches.len());
        for reach in &self.reaches {
            match self.reach_balance(reach, provider, year_begin, year_end) {
                Ok(balance) => balances.push(balance),
                Err(error) => {
                    warn!("no balance for {}: {error}", reach.name);
                    balances.push(None);
                }
            }
        }

        let active = active_users_through_reaches(&self.reaches, &registry);
        let reaches = self
            .reaches
            .iter()
            .zip(active)
            .enumerate()
            .map(|(index, (reach, active_users))| {
                if index == 0 {
                    // headwater placeholder: aggregated over, never assessed
                    return ReachAssessment::empty(reach);
                }
                let through = through_reach_cu_avg(&active_users, &registry, year_end);
                let by_state =
                    state_assessments(reach.loss, &active_users, through, &registry, year_end);
                ReachAssessment {
                    reach: reach.name.clone(),
                    loss: reach.loss,
                    active_users,
                    through_reach_cu_avg: through,
                    by_state,
                }
            })
            .collect();

        Ok(ModelRun {
            registry,
            assessment: BasinAssessment {
                year_begin,
                year_end,
                reaches,
                balances,
            },
        })
    }

    /// Load every user's consumptive-use series for the window.
    fn materialize_registry(
        &self,
        provider: &dyn SeriesProvider,
        year_begin: i32,
        year_end: i32,
    ) -> Result<Registry, ModelError> {
        let mut users = Vec::with_capacity(self.users.len());
        for config in &self.users {
            let request = FeedRequest::new(&config.cu_feed.key)
                .multiplier(config.cu_feed.multiplier)
                .water_year_month(self.water_year_month)
                .range(year_begin, year_end);
            let cu = provider.annual_af(&request)?;
            users.push(User::new(
                &config.name,
                &config.state,
                &config.reach,
                config.example,
                cu,
            ));
        }
        Ok(Registry::new(self.states.clone(), users))
    }

    /// Upper lake release vs. lower lake inflow for one reach.
    fn reach_balance(
        &self,
        reach: &Reach,
        provider: &dyn SeriesProvider,
        year_begin: i32,
        year_end: i32,
    ) -> Result<Option<ReachBalance>, ModelError> {
        let upper_name = match &reach.upper {
            Some(name) => name,
            None => return Ok(None),
        };
        // lake names were validated at construction
        let upper = self
            .lake(upper_name)
            .ok_or_else(|| configuration(format!("unknown lake '{upper_name}'")))?;
        let lower = self
            .lake(&reach.lower)
            .ok_or_else(|| configuration(format!("unknown lake '{}'", reach.lower)))?;

        let upper_release = upper.release(provider, year_begin, year_end)?;
        let lower_inflow = lower.inflow(provider, Some(upper), year_begin, year_end)?;
        let difference = AnnualSeries::subtract(&lower_inflow, &upper_release)?;
        Ok(Some(ReachBalance {
            reach: reach.name.clone(),
            upper_release,
            lower_inflow,
            difference,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{Basin, BasinConfig, ReachConfig, UserConfig};
    use crate::lake::{FeedSpec, InflowSource, LakeConfig};
    use crate::registry::StateInfo;
    use lcr_core::annual::AnnualSeries;
    use lcr_core::error::ModelError;
    use lcr_data::provider::MemoryProvider;

    fn two_reach_config() -> BasinConfig {
        BasinConfig {
            water_year_month: 1,
            lakes: vec![
                LakeConfig::new("head_lake", FeedSpec::af("releases/head_dam")),
                LakeConfig::new("lower_lake", FeedSpec::af("releases/lower_dam"))
                    .inflow(vec![InflowSource::Feed(FeedSpec::af("gages/below_head"))]),
            ],
            reaches: vec![
                ReachConfig::new("Reach0", None, "head_lake", 0.0),
                ReachConfig::new("Reach1", Some("head_lake"), "lower_lake", 100000.0),
            ],
            states: vec![StateInfo::new("Arizona", "az")],
            users: vec![UserConfig::new("farm", "az", "Reach1", FeedSpec::af("az/farm_cu"))
                .example()],
        }
    }

    fn provider() -> MemoryProvider {
        let mut provider = MemoryProvider::new();
        provider.insert(
            "releases/head_dam",
            AnnualSeries::from_pairs(&[(2019, 9000000.0), (2020, 9100000.0), (2021, 9200000.0)])
                .unwrap(),
        );
        provider.insert(
            "gages/below_head",
            AnnualSeries::from_pairs(&[(2019, 8800000.0), (2020, 8900000.0), (2021, 9000000.0)])
                .unwrap(),
        );
        provider.insert(
            "az/farm_cu",
            AnnualSeries::from_pairs(&[(2019, 250000.0), (2020, 250000.0), (2021, 250000.0)])
                .unwrap(),
        );
        provider
    }

    #[test]
    fn test_rejects_unknown_lake() {
        let mut config = two_reach_config();
        config.reaches[1].lower = "missing_lake".to_string();
        let result = Basin::from_config(config);
        assert!(matches!(result, Err(ModelError::Configuration(_))));
    }

    #[test]
    fn test_rejects_negative_loss() {
        let mut config = two_reach_config();
        config.reaches[1].loss = -1.0;
        assert!(Basin::from_config(config).is_err());
    }

    #[test]
    fn test_rejects_broken_chain() {
        let mut config = two_reach_config();
        config.reaches[1].upper = Some("lower_lake".to_string());
        assert!(Basin::from_config(config).is_err());
    }

    #[test]
    fn test_rejects_bad_water_year_month() {
        let mut config = two_reach_config();
        config.water_year_month = 13;
        assert!(Basin::from_config(config).is_err());
    }

    #[test]
    fn test_rejects_user_with_unknown_state() {
        let mut config = two_reach_config();
        config.users[0].state = "xx".to_string();
        assert!(Basin::from_config(config).is_err());
    }

    #[test]
    fn test_model_produces_balances_and_assessments() {
        let basin = Basin::from_config(two_reach_config()).unwrap();
        let run = basin.model(&provider(), 2019, 2021).unwrap();

        // headwater reach has no balance; Reach1's difference is inflow - release
        assert!(run.assessment.balances[0].is_none());
        let balance = run.assessment.balances[1].as_ref().unwrap();
        assert_eq!(balance.difference.get(2021), Some(-200000.0));

        // the single user carries the whole reach loss
        let reach1 = &run.assessment.reaches[1];
        assert_eq!(reach1.through_reach_cu_avg, 250000.0);
        assert_eq!(reach1.by_state["az"].fraction, 1.0);
        assert_eq!(reach1.by_state["az"].assessment, 100000.0);

        let farm = run.user_assessment("farm").unwrap();
        assert_eq!(farm.total, 100000.0);
        assert_eq!(run.example_user_assessments().len(), 1);
    }

    #[test]
    fn test_missing_cu_feed_is_fatal() {
        let basin = Basin::from_config(two_reach_config()).unwrap();
        let mut provider = MemoryProvider::new();
        provider.insert(
            "releases/head_dam",
            AnnualSeries::from_pairs(&[(2021, 1.0)]).unwrap(),
        );
        let result = basin.model(&provider, 2019, 2021);
        assert!(matches!(result, Err(ModelError::DataUnavailable { .. })));
    }

    #[test]
    fn test_missing_balance_feed_voids_only_that_balance() {
        let basin = Basin::from_config(two_reach_config()).unwrap();
        let mut provider = MemoryProvider::new();
        provider.insert(
            "az/farm_cu",
            AnnualSeries::from_pairs(&[(2021, 250000.0)]).unwrap(),
        );
        // release feeds absent: balances are voided, assessments still run
        let run = basin.model(&provider, 2019, 2021).unwrap();
        assert!(run.assessment.balances[1].is_none());
        assert_eq!(run.assessment.reaches[1].by_state["az"].assessment, 100000.0);
    }
}
