//! `skein kv get|set|del|ls <id> [key] [val]` (§6 CLI surface).

use std::sync::Arc;

use clap::{Args, Subcommand};
use skein_client::{Daemon, ReqwestYarnClient};

use crate::cli_config::CliConfig;
use crate::commands::status::parse_application_id;
use crate::error::{CliError, Result};
use crate::rpc_client::MasterRpcClient;
use crate::utils;

#[derive(Args)]
pub struct KvArgs {
    #[command(subcommand)]
    command: KvCommand,
}

#[derive(Subcommand)]
enum KvCommand {
    Get { id: String, key: String },
    Set { id: String, key: String, value: String },
    Del { id: String, key: String },
    Ls { id: String },
}

pub async fn execute(args: KvArgs) -> Result<()> {
    let config = CliConfig::load()?;
    let yarn = Arc::new(ReqwestYarnClient::new(config.rm_webapp_address));
    let daemon = Daemon::new(yarn);

    match args.command {
        KvCommand::Get { id, key } => {
            let client = master_client(&daemon, &id).await?;
            let value = client.kv_get(&key).await?;
            println!("{value}");
        }
        KvCommand::Set { id, key, value } => {
            let client = master_client(&daemon, &id).await?;
            client.kv_set(&key, &value).await?;
            utils::success(&format!("set '{key}'"));
        }
        KvCommand::Del { id, key } => {
            let client = master_client(&daemon, &id).await?;
            client.kv_del(&key).await?;
            utils::success(&format!("deleted '{key}'"));
        }
        KvCommand::Ls { id } => {
            let client = master_client(&daemon, &id).await?;
            let entries = client.kv_list().await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}

async fn master_client(daemon: &Daemon, id: &str) -> Result<MasterRpcClient> {
    let id = parse_application_id(id)?;
    let report = daemon.get_status(id).await.map_err(CliError::from)?;
    MasterRpcClient::from_report(&report)
}
