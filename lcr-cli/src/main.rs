//! LCR CLI - Lower Colorado River loss-assessment model.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "lcr-cli",
    version,
    about = "Lower Colorado River loss-assessment toolkit"
)]
struct Cli {
    #[command(subcommand)]
    command: lcr_cmd::Command,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    lcr_cmd::run(cli.command)
}
