use crate::demo::{run_demo, run_scenario, DemoArgs, ScenarioArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use trip_replan::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Trip Replan",
    about = "Re-plan a disrupted travel day from the command line or over HTTP",
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
    /// Replan a JSON scenario file and print the ranked result
    Replan(ScenarioArgs),
    /// Replan the bundled Kyoto day for a chosen disruption
    Demo(DemoArgs),
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
        Command::Replan(args) => run_scenario(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
