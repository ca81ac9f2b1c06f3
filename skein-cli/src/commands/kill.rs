//! `skein kill <id>` (§6 CLI surface).

use std::sync::Arc;

use clap::Args;
use skein_client::{Daemon, ReqwestYarnClient};

use crate::cli_config::CliConfig;
use crate::commands::status::parse_application_id;
use crate::error::{CliError, Result};
use crate::utils;

#[derive(Args)]
pub struct KillArgs {
    /// Application id, as printed by `skein submit`.
    id: String,

    /// Skip the confirmation prompt.
    #[arg(long, short = 'y')]
    yes: bool,
}

pub async fn execute(args: KillArgs) -> Result<()> {
    let id = parse_application_id(&args.id)?;
    if !args.yes && !utils::confirm(&format!("kill application {id}?")) {
        utils::info("aborted");
        return Ok(());
    }

    let config = CliConfig::load()?;
    let yarn = Arc::new(ReqwestYarnClient::new(config.rm_webapp_address));
    let daemon = Daemon::new(yarn);

    daemon.kill(id).await.map_err(CliError::from)?;
    utils::success(&format!("killed application {id}"));
    Ok(())
}
