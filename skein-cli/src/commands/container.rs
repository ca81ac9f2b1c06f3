//! `skein container ls <id>` / `skein container kill <id> <service>
//! <instance>` (§6 CLI surface).

use std::sync::Arc;

use clap::{Args, Subcommand};
use skein_client::{Daemon, ReqwestYarnClient};

use crate::cli_config::CliConfig;
use crate::commands::status::parse_application_id;
use crate::error::{CliError, Result};
use crate::rpc_client::MasterRpcClient;
use crate::utils;

#[derive(Args)]
pub struct ContainerArgs {
    #[command(subcommand)]
    command: ContainerCommand,
}

#[derive(Subcommand)]
enum ContainerCommand {
    /// List containers for an application, optionally filtered by service.
    Ls {
        id: String,
        #[arg(long)]
        service: Option<String>,
    },
    /// Kill a single container instance.
    Kill {
        id: String,
        service: String,
        instance: u32,
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

pub async fn execute(args: ContainerArgs) -> Result<()> {
    let config = CliConfig::load()?;
    let yarn = Arc::new(ReqwestYarnClient::new(config.rm_webapp_address));
    let daemon = Daemon::new(yarn);

    match args.command {
        ContainerCommand::Ls { id, service } => {
            let id = parse_application_id(&id)?;
            let report = daemon.get_status(id).await.map_err(CliError::from)?;
            let client = MasterRpcClient::from_report(&report)?;
            let containers = client.get_containers(service.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&containers)?);
        }
        ContainerCommand::Kill {
            id,
            service,
            instance,
            yes,
        } => {
            if !yes && !utils::confirm(&format!("kill {service}/{instance}?")) {
                utils::info("aborted");
                return Ok(());
            }
            let id = parse_application_id(&id)?;
            let report = daemon.get_status(id).await.map_err(CliError::from)?;
            let client = MasterRpcClient::from_report(&report)?;
            client.kill_container(&service, instance).await?;
            utils::success(&format!("killed {service}/{instance}"));
        }
    }
    Ok(())
}
