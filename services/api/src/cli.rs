use crate::demo::{run_demo, DemoArgs};
use crate::report::{run_classify, run_rules, ClassifyArgs, RulesArgs};
use crate::server;
use bmds_logic::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "BMDS Logic",
    about = "Classify dose-response model fits and walk analysis readiness from the command line",
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
    /// Print the rule catalog with its default settings
    Rules(RulesArgs),
    /// Classify fitted models from a diagnostics export
    Classify(ClassifyArgs),
    /// Walk an analysis through save, execute, and classification
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
        Command::Rules(args) => run_rules(args),
        Command::Classify(args) => run_classify(args),
        Command::Demo(args) => run_demo(args),
    }
}
