//! Command implementations for the LCR CLI.
//!
//! Provides subcommands for running the Lower Colorado basin
//! loss-assessment model and inspecting the user registry.

use clap::Subcommand;

pub mod model;
pub mod users;

#[derive(Subcommand)]
pub enum Command {
    /// Run the basin loss-assessment model over a year range
    Model {
        /// First water year of the model window
        #[arg(long)]
        year_begin: i32,

        /// Last water year of the model window
        #[arg(long)]
        year_end: i32,

        /// Water-year start month (1 = calendar-year accounting)
        #[arg(long, default_value_t = 1)]
        water_year_month: u32,

        /// Directory of feed CSV files
        #[arg(short = 'd', long, default_value = "data")]
        data_dir: String,

        /// Emit the full assessment as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// List the state/user registry by reach
    Users {
        /// Water-year start month (1 = calendar-year accounting)
        #[arg(long, default_value_t = 1)]
        water_year_month: u32,
    },
}

pub fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Model {
            year_begin,
            year_end,
            water_year_month,
            data_dir,
            json,
        } => model::run_model(year_begin, year_end, water_year_month, &data_dir, json),
        Command::Users { water_year_month } => users::run_users(water_year_month),
    }
}
