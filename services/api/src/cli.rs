use crate::server;
use clap::{Args, Parser, Subcommand};
use school_admissions::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "School Admissions",
    about = "Collect school admission forms and browse submitted records",
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
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the SQLite database path (`:memory:` for a throwaway store)
    #[arg(long, value_name = "PATH")]
    pub(crate) database: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
    }
}
