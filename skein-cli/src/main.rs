//! skein - thin external CLI for submitting and managing Skein
//! applications (§6 CLI surface).

use clap::{Parser, Subcommand};

mod cli_config;
mod commands;
mod error;
mod rpc_client;
mod utils;

use commands::*;
use error::Result;

/// skein - submit and manage multi-service applications on YARN
#[derive(Parser)]
#[command(name = "skein")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an application spec, printing the assigned application id.
    Submit(submit::SubmitArgs),

    /// Show an application's current status.
    Status(status::StatusArgs),

    /// List known applications.
    Application(application::ApplicationArgs),

    /// Kill a running application.
    Kill(kill::KillArgs),

    /// List or kill individual containers of an application.
    Container(container::ContainerArgs),

    /// Read or mutate an application's key-value store.
    Kv(kv::KvArgs),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let result = dispatch(cli).await;
    if let Err(err) = result {
        utils::error(&err.to_string());
        std::process::exit(err.exit_code());
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Submit(args) => submit::execute(args).await,
        Commands::Status(args) => status::execute(args).await,
        Commands::Application(args) => application::execute(args).await,
        Commands::Kill(args) => kill::execute(args).await,
        Commands::Container(args) => container::execute(args).await,
        Commands::Kv(args) => kv::execute(args).await,
    }
}
