use lcr_core::annual::AnnualSeries;
use std::collections::BTreeMap;

/// Years in the trailing consumptive-use average used for apportionment.
pub const CU_AVERAGE_WINDOW: usize = 3;

/// A political jurisdiction with users in the basin.
#[derive(Debug, Clone, PartialEq)]
pub struct StateInfo {
    pub name: String,
    pub abbreviation: String,
}

impl StateInfo {
    pub fn new(name: &str, abbreviation: &str) -> Self {
        StateInfo {
            name: name.to_string(),
            abbreviation: abbreviation.to_string(),
        }
    }
}

/// A water user: belongs to one state, draws in one reach, and carries a
/// multi-year consumptive-use series. `example` flags the user for detailed
/// per-user assessment reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub name: String,
    pub state: String,
    pub reach: String,
    pub example: bool,
    cu: AnnualSeries,
}

impl User {
    pub fn new(name: &str, state: &str, reach: &str, example: bool, cu: AnnualSeries) -> Self {
        User {
            name: name.to_string(),
            state: state.to_string(),
            reach: reach.to_string(),
            example,
            cu,
        }
    }

    pub fn cu(&self) -> &AnnualSeries {
        &self.cu
    }

    /// Trailing three-year average annual consumptive use, anchored at the
    /// model window's final year. Years the series does not cover count as
    /// zero, so the anchor makes assessments reproducible per window.
    pub fn avg_cu(&self, year_end: i32) -> f64 {
        let window = CU_AVERAGE_WINDOW as i32;
        self.cu
            .reshape(year_end - (window - 1), year_end)
            .trailing_average(CU_AVERAGE_WINDOW)
    }
}

/// The materialized state/user registry for one model run.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    pub states: Vec<StateInfo>,
    pub users: Vec<User>,
}

impl Registry {
    pub fn new(states: Vec<StateInfo>, users: Vec<User>) -> Self {
        Registry { states, users }
    }

    pub fn state(&self, abbreviation: &str) -> Option<&StateInfo> {
        self.states
            .iter()
            .find(|state| state.abbreviation == abbreviation)
    }

    pub fn user(&self, name: &str) -> Option<&User> {
        self.users.iter().find(|user| user.name == name)
    }

    /// Users drawing in a reach, grouped by state abbreviation in registry
    /// order. Deterministic: BTreeMap keys and stable user order.
    pub fn users_in_reach_by_state(&self, reach: &str) -> BTreeMap<String, Vec<&User>> {
        let mut by_state: BTreeMap<String, Vec<&User>> = BTreeMap::new();
        for user in &self.users {
            if user.reach == reach {
                by_state.entry(user.state.clone()).or_default().push(user);
            }
        }
        by_state
    }

    pub fn example_users(&self) -> Vec<&User> {
        self.users.iter().filter(|user| user.example).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Registry, StateInfo, User};
    use lcr_core::annual::AnnualSeries;

    fn cu(pairs: &[(i32, f64)]) -> AnnualSeries {
        AnnualSeries::from_pairs(pairs).unwrap()
    }

    #[test]
    fn test_avg_cu_is_anchored_at_window_end() {
        let user = User::new(
            "imperial_irrigation_district",
            "ca",
            "Reach5",
            true,
            cu(&[(2018, 30.0), (2019, 30.0), (2020, 60.0), (2021, 90.0)]),
        );
        assert_eq!(user.avg_cu(2021), 60.0);
        assert_eq!(user.avg_cu(2020), 40.0);
        // years past the series count as zero
        assert_eq!(user.avg_cu(2023), 30.0);
    }

    #[test]
    fn test_users_in_reach_by_state_groups_and_orders() {
        let registry = Registry::new(
            vec![StateInfo::new("Arizona", "az"), StateInfo::new("California", "ca")],
            vec![
                User::new("cap", "az", "Reach3", false, cu(&[(2021, 1.0)])),
                User::new("mwd", "ca", "Reach3", false, cu(&[(2021, 2.0)])),
                User::new("crit", "az", "Reach4", false, cu(&[(2021, 3.0)])),
                User::new("yuma_mesa", "az", "Reach3", false, cu(&[(2021, 4.0)])),
            ],
        );

        let reach3 = registry.users_in_reach_by_state("Reach3");
        let az: Vec<&str> = reach3["az"].iter().map(|u| u.name.as_str()).collect();
        assert_eq!(az, vec!["cap", "yuma_mesa"]);
        assert_eq!(reach3["ca"].len(), 1);
        assert!(!reach3.contains_key("nv"));
        assert!(registry.users_in_reach_by_state("Reach0").is_empty());
    }
}
