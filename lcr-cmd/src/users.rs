//! Registry listing: which users draw in which reach, by state.

use lcr_model::basin::Basin;
use lcr_model::lower_colorado;
use lcr_utils::format::right_justified;

pub fn run_users(water_year_month: u32) -> anyhow::Result<()> {
    let config = lower_colorado::basin_config(water_year_month);
    let basin = Basin::from_config(config.clone())?;

    for reach in basin.reaches().iter().skip(1) {
        println!("{}", reach.name);
        for state in basin.states() {
            let users: Vec<&str> = config
                .users
                .iter()
                .filter(|user| user.reach == reach.name && user.state == state.abbreviation)
                .map(|user| user.name.as_str())
                .collect();
            if users.is_empty() {
                continue;
            }
            for user in users {
                let marker = if config
                    .users
                    .iter()
                    .any(|u| u.name == user && u.example)
                {
                    " (example)"
                } else {
                    ""
                };
                println!(
                    "    {} {}{}",
                    right_justified(&state.abbreviation, 4),
                    user,
                    marker
                );
            }
        }
    }
    Ok(())
}
