use crate::server;
use crate::submit::{run_demo, run_submit, DemoArgs, SubmitArgs};
use clap::{Args, Parser, Subcommand};
use signup_forms::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Signup Forms",
    about = "Serve and exercise the validated registration forms",
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
    /// Validate a JSON form payload and run the submit handler once
    Submit(SubmitArgs),
    /// Walk every form variant through a rejected and an accepted submit
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
        Command::Submit(args) => run_submit(args).await,
        Command::Demo(args) => run_demo(args).await,
    }
}
