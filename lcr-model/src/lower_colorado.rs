//! The default Lower Colorado River basin table: Glen Canyon down to the
//! Mexican border, with the SNWA study loss constants per reach and the
//! registry of major contract holders.

use crate::basin::{BasinConfig, ReachConfig, UserConfig};
use crate::lake::{FeedSpec, InflowSource, LakeConfig};
use crate::registry::StateInfo;

// SNWA study losses by reach, acre-feet per year
pub const LAKE_MEAD_EVAP: f64 = 580000.0; // Reach 1, Mead at 1100 ft
pub const LAKE_MOHAVE_EVAP: f64 = 193000.0; // Reach 2
pub const LAKE_HAVASU_EVAP: f64 = 138000.0; // Reach 3
pub const REACH_3_CORRIDOR_LOSS: f64 = 191000.0; // Reach 3
pub const REACH_4_CORRIDOR_LOSS: f64 = 365000.0; // Reach 4
pub const REACH_5_CORRIDOR_LOSS: f64 = 76000.0; // Reach 5

/// Build the Lower Basin topology and registry for a water-year start
/// month (1 = calendar-year accounting, matching the annual reports).
pub fn basin_config(water_year_month: u32) -> BasinConfig {
    let lakes = vec![
        LakeConfig::new("lake_powell", FeedSpec::af("releases/glen_canyon_dam")).inflow(vec![
            InflowSource::Feed(FeedSpec::af("gages/colorado_river_at_cisco")),
            InflowSource::Feed(FeedSpec::af("gages/green_river_at_green_river")),
            InflowSource::Feed(FeedSpec::af("gages/san_juan_river_at_bluff")),
            InflowSource::Feed(FeedSpec::af("gages/dirty_devil_river")),
        ]),
        LakeConfig::new("lake_mead", FeedSpec::af("releases/hoover_dam"))
            .inflow(vec![
                InflowSource::Feed(FeedSpec::af("gages/colorado_above_diamond_creek")),
                InflowSource::Feed(FeedSpec::af("gages/virgin_river_at_littlefield")),
                InflowSource::Feed(FeedSpec::af("gages/muddy_river_near_glendale")),
            ])
            .storage(FeedSpec::af("rise/lake_mead_storage"))
            .evaporation(FeedSpec::kaf("24_month/lake_mead_evap_losses")),
        LakeConfig::new("lake_mohave", FeedSpec::af("releases/davis_dam"))
            .inflow(vec![InflowSource::UpstreamRelease])
            .side_inflow(FeedSpec::kaf("24_month/lake_mohave_side_inflow"))
            .storage(FeedSpec::af("rise/lake_mohave_storage"))
            .evaporation(FeedSpec::kaf("24_month/lake_mohave_evap_losses")),
        LakeConfig::new("lake_havasu", FeedSpec::af("releases/parker_dam"))
            .inflow(vec![InflowSource::UpstreamRelease])
            .side_inflow(FeedSpec::kaf("24_month/lake_havasu_side_inflow"))
            .storage(FeedSpec::af("rise/lake_havasu_storage"))
            .evaporation(FeedSpec::kaf("24_month/lake_havasu_evap_losses")),
        // Imperial is a pass-through diversion dam: no storage, no
        // evaporation record; return flows rejoin the river above it.
        LakeConfig::new("imperial_dam", FeedSpec::af("releases/imperial_dam")).inflow(vec![
            InflowSource::UpstreamRelease,
            InflowSource::Feed(FeedSpec::af("returns/crit_returns")),
            InflowSource::Feed(FeedSpec::af("returns/palo_verde_returns")),
        ]),
        LakeConfig::new("morelos_dam", FeedSpec::af("gages/northern_international_border"))
            .inflow(vec![InflowSource::UpstreamRelease]),
    ];

    let reaches = vec![
        ReachConfig::new("Reach0", None, "lake_powell", 0.0),
        ReachConfig::new("Reach1", Some("lake_powell"), "lake_mead", LAKE_MEAD_EVAP),
        ReachConfig::new("Reach2", Some("lake_mead"), "lake_mohave", LAKE_MOHAVE_EVAP),
        ReachConfig::new(
            "Reach3",
            Some("lake_mohave"),
            "lake_havasu",
            LAKE_HAVASU_EVAP + REACH_3_CORRIDOR_LOSS,
        ),
        ReachConfig::new(
            "Reach4",
            Some("lake_havasu"),
            "imperial_dam",
            REACH_4_CORRIDOR_LOSS,
        ),
        ReachConfig::new(
            "Reach5",
            Some("imperial_dam"),
            "morelos_dam",
            REACH_5_CORRIDOR_LOSS,
        ),
    ];

    let states = vec![
        StateInfo::new("Arizona", "az"),
        StateInfo::new("California", "ca"),
        StateInfo::new("Nevada", "nv"),
        StateInfo::new("Mexico", "mx"),
    ];

    let users = vec![
        UserConfig::new(
            "southern_nevada_water_authority",
            "nv",
            "Reach1",
            FeedSpec::af("nv/snwa_consumptive_use"),
        ),
        UserConfig::new(
            "basic_water_company",
            "nv",
            "Reach2",
            FeedSpec::af("nv/basic_consumptive_use"),
        ),
        UserConfig::new(
            "central_arizona_project",
            "az",
            "Reach3",
            FeedSpec::af("az/cap_consumptive_use"),
        ),
        UserConfig::new(
            "metropolitan_water_district",
            "ca",
            "Reach3",
            FeedSpec::af("ca/metropolitan_consumptive_use"),
        ),
        UserConfig::new(
            "colorado_river_indian_tribes",
            "az",
            "Reach4",
            FeedSpec::af("az/crit_consumptive_use"),
        ),
        UserConfig::new(
            "palo_verde_irrigation_district",
            "ca",
            "Reach4",
            FeedSpec::af("ca/palo_verde_consumptive_use"),
        ),
        UserConfig::new(
            "wellton_mohawk_idd",
            "az",
            "Reach5",
            FeedSpec::af("az/wellton_mohawk_consumptive_use"),
        )
        .example(),
        UserConfig::new(
            "yuma_mesa_idd",
            "az",
            "Reach5",
            FeedSpec::af("az/yuma_mesa_consumptive_use"),
        ),
        UserConfig::new(
            "imperial_irrigation_district",
            "ca",
            "Reach5",
            FeedSpec::af("ca/imperial_consumptive_use"),
        )
        .example(),
        UserConfig::new(
            "coachella_valley_water_district",
            "ca",
            "Reach5",
            FeedSpec::af("ca/coachella_consumptive_use"),
        ),
        UserConfig::new(
            "mexico_treaty_delivery",
            "mx",
            "Reach5",
            FeedSpec::af("mx/treaty_consumptive_use"),
        ),
    ];

    BasinConfig {
        water_year_month,
        lakes,
        reaches,
        states,
        users,
    }
}

#[cfg(test)]
mod tests {
    use super::basin_config;
    use crate::basin::Basin;

    #[test]
    fn test_default_table_validates() {
        let basin = Basin::from_config(basin_config(1)).unwrap();
        assert_eq!(basin.reaches().len(), 6);
        assert!(basin.reaches()[0].is_headwater());
        assert!(basin.lake("imperial_dam").is_some());
    }

    #[test]
    fn test_storage_recorded_for_reservoirs_not_pass_through_dams() {
        let config = basin_config(1);
        let has_storage = |name: &str| {
            config
                .lakes
                .iter()
                .find(|lake| lake.name == name)
                .map(|lake| lake.storage.is_some())
                .unwrap_or(false)
        };
        assert!(has_storage("lake_mead"));
        assert!(has_storage("lake_mohave"));
        assert!(has_storage("lake_havasu"));
        // diversion dams keep no storage record
        assert!(!has_storage("imperial_dam"));
        assert!(!has_storage("morelos_dam"));
    }

    #[test]
    fn test_reach_losses_total() {
        let config = basin_config(1);
        let total: f64 = config.reaches.iter().map(|reach| reach.loss).sum();
        assert_eq!(total, 1543000.0);
    }

    #[test]
    fn test_example_users_flagged() {
        let config = basin_config(1);
        let examples: Vec<&str> = config
            .users
            .iter()
            .filter(|user| user.example)
            .map(|user| user.name.as_str())
            .collect();
        assert_eq!(
            examples,
            vec!["wellton_mohawk_idd", "imperial_irrigation_district"]
        );
    }
}
