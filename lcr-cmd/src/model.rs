//! Basin model run and table rendering.
//!
//! The tables mirror the annual-report style: a reach loss table, per-reach
//! state assessments, and a detailed per-reach breakdown for each example
//! user. All numbers are acre-feet per year.

use lcr_data::provider::CsvProvider;
use lcr_model::basin::{Basin, ModelRun};
use lcr_model::lower_colorado;
use lcr_utils::format::{af_as_str, number_as_str, percent_as_str, right_justified};
use log::info;

pub fn run_model(
    year_begin: i32,
    year_end: i32,
    water_year_month: u32,
    data_dir: &str,
    json: bool,
) -> anyhow::Result<()> {
    let basin = Basin::from_config(lower_colorado::basin_config(water_year_month))?;
    let provider = CsvProvider::new(data_dir);

    info!(
        "running lower basin model {year_begin}-{year_end}, feeds from {data_dir}"
    );
    let run = basin.model(&provider, year_begin, year_end)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&run.assessment)?);
        return Ok(());
    }

    print_loss_table(&basin);
    print_balances(&run);
    print_state_assessments(&run);
    print_example_users(&run);
    Ok(())
}

/// Reach-by-reach loss constants and their basin total.
fn print_loss_table(basin: &Basin) {
    println!("Reach losses (evaporation + corridor, CRSS via SNWA)");
    let mut total = 0.0;
    for reach in basin.reaches().iter().skip(1) {
        let upper = reach.upper.as_deref().unwrap_or("-");
        println!(
            "    {} {} {} {}",
            reach.name,
            right_justified(upper, 15),
            right_justified(&reach.lower, 15),
            af_as_str(reach.loss)
        );
        total += reach.loss;
    }
    println!("    {} {}", right_justified("total:", 37), af_as_str(total));
}

/// Observed reach gain/loss (lower inflow minus upper release) against the
/// assessed loss constant, averaged over the window.
fn print_balances(run: &ModelRun) {
    println!();
    println!("Reach balances (window average)");
    for (reach, balance) in run
        .assessment
        .reaches
        .iter()
        .zip(&run.assessment.balances)
        .skip(1)
    {
        match balance {
            Some(balance) => {
                let years = balance.difference.len();
                let mean = if years > 0 {
                    balance.difference.total() / years as f64
                } else {
                    0.0
                };
                println!(
                    "    {} observed {} assessed {}",
                    reach.reach,
                    af_as_str(mean),
                    af_as_str(-reach.loss)
                );
            }
            None => println!("    {} balance data unavailable", reach.reach),
        }
    }
}

fn print_state_assessments(run: &ModelRun) {
    for reach in run.assessment.reaches.iter().skip(1) {
        println!();
        println!(
            "{} loss {}  through-reach CU avg {}",
            reach.reach,
            af_as_str(reach.loss),
            af_as_str(reach.through_reach_cu_avg)
        );
        for (state, assessment) in &reach.by_state {
            println!(
                "    {} users {} cu {} {} assessment {}",
                right_justified(state, 4),
                number_as_str(assessment.user_count as f64),
                af_as_str(assessment.cu_avg),
                percent_as_str(assessment.fraction),
                af_as_str(assessment.assessment)
            );
        }
    }
}

/// Per-reach assessment breakdown for each example user: every upstream
/// reach the user's draw crosses charges a CU-proportional share.
fn print_example_users(run: &ModelRun) {
    for user in run.example_user_assessments() {
        println!();
        println!(
            "{} ({})  3-year avg CU {}",
            user.user,
            user.state,
            af_as_str(user.avg_cu)
        );
        println!(
            "    {} | Reach Loss | State CU  | State Assessment | Factor | Annual Assessment",
            right_justified("Reach", 6)
        );
        for share in &user.shares {
            let reach = run
                .assessment
                .reaches
                .iter()
                .find(|reach| reach.reach == share.reach);
            let (loss, state_cu, state_assessment) = match reach
                .and_then(|reach| reach.by_state.get(&user.state).map(|s| (reach.loss, s)))
            {
                Some((loss, state)) => (loss, state.cu_avg, state.assessment),
                None => (0.0, 0.0, 0.0),
            };
            println!(
                "    {} {} {} {}   {:6.4} {}",
                right_justified(&share.reach, 6),
                af_as_str(loss),
                af_as_str(state_cu),
                af_as_str(state_assessment),
                share.factor,
                af_as_str(share.amount)
            );
        }
        println!(
            "    {}",
            right_justified(&format!("total {}", af_as_str(user.total)), 78)
        );
    }
}
