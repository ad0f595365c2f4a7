use clap::{Args, Parser, Subcommand};
use jobvault::error::AppError;

use crate::commands::{run_demo, run_export, run_summary, DemoArgs, ExportArgs, SummaryArgs};
use crate::server;

#[derive(Parser, Debug)]
#[command(
    name = "JobVault Leads",
    about = "Capture landing-page leads and review them from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Work with stored leads
    Leads {
        #[command(subcommand)]
        command: LeadsCommand,
    },
    /// Walk a hero-to-get-started journey through an in-memory pipeline
    Demo(DemoArgs),
}

#[derive(Subcommand, Debug)]
enum LeadsCommand {
    /// Write the filtered lead list as CSV
    Export(ExportArgs),
    /// Print dashboard counters
    Summary(SummaryArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Leads {
            command: LeadsCommand::Export(args),
        } => run_export(args).await,
        Command::Leads {
            command: LeadsCommand::Summary(args),
        } => run_summary(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
