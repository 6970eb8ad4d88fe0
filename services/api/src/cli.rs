use crate::demo::{run_demo, run_feedback_export, DemoArgs, FeedbackExportArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use uw_workbench::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Cyber Underwriting Workbench",
    about = "Run and demonstrate the cyber underwriting workbench from the command line",
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
    /// Ingest the mock submissions and print how auto-progression moves them
    Demo(DemoArgs),
    /// Work with the override feedback log
    Feedback {
        #[command(subcommand)]
        command: FeedbackCommand,
    },
}

#[derive(Subcommand, Debug)]
enum FeedbackCommand {
    /// Replay the scripted ACME review and export the feedback log as CSV
    Export(FeedbackExportArgs),
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
        Command::Demo(args) => run_demo(args),
        Command::Feedback {
            command: FeedbackCommand::Export(args),
        } => run_feedback_export(args),
    }
}
