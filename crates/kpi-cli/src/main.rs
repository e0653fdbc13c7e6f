mod commands;
mod opts;
mod output;
mod util;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::admin::PasswordArgs;
use commands::cell::CellArgs;
use commands::contract::ContractCommand;
use commands::contractor::ContractorCommand;
use commands::rollover::RolloverArgs;
use opts::{FilterArgs, KpiOpts};

#[derive(Parser, Debug)]
#[command(name = "kpi", version, about = "Contract KPI tracker CLI")]
struct Cli {
    #[command(flatten)]
    opts: KpiOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Headline figures over the filtered contracts
    Summary(FilterArgs),

    /// Contracts by period with their submission status
    Matrix(FilterArgs),

    /// Values available for the matrix filters
    Filters,

    /// Roll the tracked months over
    Rollover(RolloverArgs),

    /// Set the record of one contract for one period
    Cell(CellArgs),

    /// Contract management
    #[command(subcommand)]
    Contract(ContractCommand),

    /// Contractor management
    #[command(subcommand)]
    Contractor(ContractorCommand),

    /// Change the role passwords
    Passwords(PasswordArgs),

    /// Erase all contracts, contractors and periods
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    util::setup_logging();

    let cli = Cli::parse();
    let opts = &cli.opts;

    match &cli.command {
        Command::Summary(args) => commands::view::cmd_summary(opts, args).await,
        Command::Matrix(args) => commands::view::cmd_matrix(opts, args).await,
        Command::Filters => commands::view::cmd_filters(opts).await,
        Command::Rollover(args) => commands::rollover::cmd_rollover(opts, args).await,
        Command::Cell(args) => commands::cell::cmd_cell(opts, args).await,
        Command::Contract(cmd) => commands::contract::cmd_contract(opts, cmd).await,
        Command::Contractor(cmd) => commands::contractor::cmd_contractor(opts, cmd).await,
        Command::Passwords(args) => commands::admin::cmd_passwords(opts, args).await,
        Command::Reset => commands::admin::cmd_reset(opts).await,
    }
}
