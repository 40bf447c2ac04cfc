use crate::reach::{Reach, ReachBalance};
use crate::registry::Registry;
use serde::Serialize;
use std::collections::BTreeMap;

/// Users active through a reach, grouped by state abbreviation, in draw
/// order. A user drawing downstream appears in the map of every reach
/// upstream of its draw; the duplication across reaches is intentional.
pub type ActiveUsers = BTreeMap<String, Vec<String>>;

/// One state's share of a reach's loss.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAssessment {
    /// Sum of the state's active users' trailing 3-year CU averages, af.
    pub cu_avg: f64,
    /// `cu_avg / through_reach_cu_avg`; 0 when the denominator is 0.
    pub fraction: f64,
    /// Acre-feet of the reach's loss charged to the state.
    pub assessment: f64,
    pub user_count: usize,
}

/// The apportionment results for one reach.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReachAssessment {
    pub reach: String,
    pub loss: f64,
    pub active_users: ActiveUsers,
    /// Total trailing 3-year CU average across every active user, the
    /// apportionment denominator.
    pub through_reach_cu_avg: f64,
    pub by_state: BTreeMap<String, StateAssessment>,
}

impl ReachAssessment {
    /// Empty assessment for a reach excluded from apportionment
    /// (the headwater placeholder).
    pub fn empty(reach: &Reach) -> Self {
        ReachAssessment {
            reach: reach.name.clone(),
            loss: reach.loss,
            active_users: ActiveUsers::new(),
            through_reach_cu_avg: 0.0,
            by_state: BTreeMap::new(),
        }
    }
}

/// The full-basin result of one model run: one assessment per reach, in
/// chain order from headwater to terminus, plus per-reach diagnostic
/// balances (`None` where a reach's balance data was unavailable).
#[derive(Debug, Clone, Serialize)]
pub struct BasinAssessment {
    pub year_begin: i32,
    pub year_end: i32,
    pub reaches: Vec<ReachAssessment>,
    pub balances: Vec<Option<ReachBalance>>,
}

/// One reach's contribution to a user's total assessment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserReachShare {
    pub reach: String,
    /// `user avg_cu / state cu_avg` in that reach; 0 when the state has no
    /// consumptive use there.
    pub factor: f64,
    pub amount: f64,
}

/// A user's consumptive-use-proportional share of every reach loss its draw
/// crosses, from the headwater down to the reach it draws in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserAssessment {
    pub user: String,
    pub state: String,
    pub avg_cu: f64,
    pub shares: Vec<UserReachShare>,
    pub total: f64,
}

/// Cumulative active-user aggregation (pipeline phase 2).
///
/// For every reach `i >= 1` and every reach `j >= i`, every user drawing in
/// reach `j` is added to reach `i`'s active set: a downstream draw crosses
/// every upstream reach's water. O(reaches^2) by design; the headwater
/// placeholder at index 0 keeps an empty set.
pub fn active_users_through_reaches(reaches: &[Reach], registry: &Registry) -> Vec<ActiveUsers> {
    let mut active: Vec<ActiveUsers> = vec![ActiveUsers::new(); reaches.len()];
    for i in 1..reaches.len() {
        for j in i..reaches.len() {
            let users_by_state = registry.users_in_reach_by_state(&reaches[j].name);
            for (state, users) in users_by_state {
                active[i]
                    .entry(state)
                    .or_default()
                    .extend(users.iter().map(|user| user.name.clone()));
            }
        }
    }
    active
}

/// Through-reach consumptive-use average (pipeline phase 3): the sum of
/// every active user's trailing 3-year CU average across all states.
pub fn through_reach_cu_avg(active: &ActiveUsers, registry: &Registry, year_end: i32) -> f64 {
    active
        .values()
        .flatten()
        .filter_map(|name| registry.user(name))
        .map(|user| user.avg_cu(year_end))
        .sum()
}

/// State assessment computation (pipeline phase 4).
///
/// Fractions partition the reach loss by state CU share. A zero
/// `through_cu_avg` yields defined zeros rather than a division fault.
pub fn state_assessments(
    loss: f64,
    active: &ActiveUsers,
    through_cu_avg: f64,
    registry: &Registry,
    year_end: i32,
) -> BTreeMap<String, StateAssessment> {
    let mut by_state = BTreeMap::new();
    for (state, users) in active {
        let cu_avg: f64 = users
            .iter()
            .filter_map(|name| registry.user(name))
            .map(|user| user.avg_cu(year_end))
            .sum();
        let fraction = if through_cu_avg > 0.0 {
            cu_avg / through_cu_avg
        } else {
            0.0
        };
        by_state.insert(
            state.clone(),
            StateAssessment {
                cu_avg,
                fraction,
                assessment: fraction * loss,
                user_count: users.len(),
            },
        );
    }
    by_state
}

/// User-level assessment (reporting path, phase 5).
///
/// For a user drawing in reach `i`, each reach `1..=i` charges the user
/// `state assessment x (user avg_cu / state cu_avg)`; the total is the sum
/// over those reaches.
pub fn user_assessment(
    assessments: &[ReachAssessment],
    registry: &Registry,
    user_name: &str,
    year_end: i32,
) -> Option<UserAssessment> {
    let user = registry.user(user_name)?;
    let draw_index = assessments
        .iter()
        .position(|assessment| assessment.reach == user.reach)?;
    let avg_cu = user.avg_cu(year_end);

    let mut shares = Vec::new();
    let mut total = 0.0;
    for assessment in assessments.iter().take(draw_index + 1).skip(1) {
        let state = match assessment.by_state.get(&user.state) {
            Some(state) => state,
            None => continue,
        };
        let factor = if state.cu_avg > 0.0 {
            avg_cu / state.cu_avg
        } else {
            0.0
        };
        let amount = state.assessment * factor;
        total += amount;
        shares.push(UserReachShare {
            reach: assessment.reach.clone(),
            factor,
            amount,
        });
    }

    Some(UserAssessment {
        user: user.name.clone(),
        state: user.state.clone(),
        avg_cu,
        shares,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        active_users_through_reaches, state_assessments, through_reach_cu_avg, user_assessment,
        ReachAssessment,
    };
    use crate::reach::Reach;
    use crate::registry::{Registry, StateInfo, User};
    use lcr_core::annual::AnnualSeries;
    use std::collections::BTreeSet;

    const YEAR_END: i32 = 2021;

    fn constant_cu(value: f64) -> AnnualSeries {
        AnnualSeries::from_pairs(&[(2019, value), (2020, value), (2021, value)]).unwrap()
    }

    /// Three-reach basin: the head reach carries no loss, R1 serves states
    /// A and B, R2 serves state A only.
    fn scenario() -> (Vec<Reach>, Registry) {
        let reaches = vec![
            Reach::new("R3", None, "head_lake", 0.0),
            Reach::new("R1", Some("head_lake"), "middle_lake", 100.0),
            Reach::new("R2", Some("middle_lake"), "lower_lake", 200.0),
        ];
        let registry = Registry::new(
            vec![StateInfo::new("State A", "a"), StateInfo::new("State B", "b")],
            vec![
                User::new("u1", "a", "R1", false, constant_cu(30.0)),
                User::new("u2", "b", "R1", false, constant_cu(10.0)),
                User::new("u3", "a", "R2", true, constant_cu(60.0)),
            ],
        );
        (reaches, registry)
    }

    fn assess(reaches: &[Reach], registry: &Registry) -> Vec<ReachAssessment> {
        let active = active_users_through_reaches(reaches, registry);
        reaches
            .iter()
            .zip(active)
            .enumerate()
            .map(|(index, (reach, active_users))| {
                if index == 0 {
                    return ReachAssessment::empty(reach);
                }
                let through = through_reach_cu_avg(&active_users, registry, YEAR_END);
                let by_state =
                    state_assessments(reach.loss, &active_users, through, registry, YEAR_END);
                ReachAssessment {
                    reach: reach.name.clone(),
                    loss: reach.loss,
                    active_users,
                    through_reach_cu_avg: through,
                    by_state,
                }
            })
            .collect()
    }

    #[test]
    fn test_active_users_aggregate_downstream_draws() {
        let (reaches, registry) = scenario();
        let active = active_users_through_reaches(&reaches, &registry);

        assert!(active[0].is_empty());
        assert_eq!(active[1]["a"], vec!["u1", "u3"]);
        assert_eq!(active[1]["b"], vec!["u2"]);
        assert_eq!(active[2]["a"], vec!["u3"]);
        assert!(!active[2].contains_key("b"));
    }

    #[test]
    fn test_upstream_active_set_is_superset_of_downstream() {
        let (reaches, registry) = scenario();
        let active = active_users_through_reaches(&reaches, &registry);

        let flatten = |index: usize| -> BTreeSet<&String> {
            active[index].values().flatten().collect()
        };
        let first = flatten(1);
        for index in 2..active.len() {
            assert!(first.is_superset(&flatten(index)));
        }
    }

    #[test]
    fn test_scenario_assessments_partition_reach_loss() {
        let (reaches, registry) = scenario();
        let assessments = assess(&reaches, &registry);

        let r1 = &assessments[1];
        assert_eq!(r1.through_reach_cu_avg, 100.0);
        assert_eq!(r1.by_state["a"].fraction, 0.9);
        assert_eq!(r1.by_state["a"].assessment, 90.0);
        assert_eq!(r1.by_state["a"].user_count, 2);
        assert_eq!(r1.by_state["b"].fraction, 0.1);
        assert_eq!(r1.by_state["b"].assessment, 10.0);

        let r2 = &assessments[2];
        assert_eq!(r2.through_reach_cu_avg, 60.0);
        assert_eq!(r2.by_state["a"].fraction, 1.0);
        assert_eq!(r2.by_state["a"].assessment, 200.0);

        // partition property: per-state assessments sum to the reach loss
        for assessment in &assessments[1..] {
            let total: f64 = assessment
                .by_state
                .values()
                .map(|state| state.assessment)
                .sum();
            assert!((total - assessment.loss).abs() < 1e-9);
        }
    }

    #[test]
    fn test_user_total_assessment_spans_upstream_reaches() {
        let (reaches, registry) = scenario();
        let assessments = assess(&reaches, &registry);

        let u3 = user_assessment(&assessments, &registry, "u3", YEAR_END).unwrap();
        assert_eq!(u3.shares.len(), 2);
        assert_eq!(u3.shares[0].reach, "R1");
        assert!((u3.shares[0].factor - 60.0 / 90.0).abs() < 1e-12);
        assert!((u3.shares[0].amount - 60.0).abs() < 1e-9);
        assert_eq!(u3.shares[1].reach, "R2");
        assert_eq!(u3.shares[1].factor, 1.0);
        assert_eq!(u3.shares[1].amount, 200.0);
        assert!((u3.total - 260.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_consumptive_use_yields_zero_not_a_fault() {
        let reaches = vec![
            Reach::new("R0", None, "head_lake", 0.0),
            Reach::new("R1", Some("head_lake"), "lower_lake", 100.0),
        ];
        let registry = Registry::new(
            vec![StateInfo::new("State A", "a")],
            vec![User::new("idle", "a", "R1", false, constant_cu(0.0))],
        );
        let active = active_users_through_reaches(&reaches, &registry);
        let through = through_reach_cu_avg(&active[1], &registry, YEAR_END);
        assert_eq!(through, 0.0);

        let by_state = state_assessments(100.0, &active[1], through, &registry, YEAR_END);
        assert_eq!(by_state["a"].fraction, 0.0);
        assert_eq!(by_state["a"].assessment, 0.0);

        let idle = user_assessment(
            &[
                ReachAssessment::empty(&reaches[0]),
                ReachAssessment {
                    reach: "R1".to_string(),
                    loss: 100.0,
                    active_users: active[1].clone(),
                    through_reach_cu_avg: through,
                    by_state,
                },
            ],
            &registry,
            "idle",
            YEAR_END,
        )
        .unwrap();
        assert_eq!(idle.total, 0.0);
        assert_eq!(idle.shares[0].factor, 0.0);
    }
}
