//! `skein application ls [--state ...]` (§6 CLI surface).

use std::sync::Arc;

use clap::Args;
use skein_client::{Daemon, ReqwestYarnClient};
use skein_core::ApplicationState;

use crate::cli_config::CliConfig;
use crate::error::{CliError, Result};

#[derive(Args)]
pub struct ApplicationArgs {
    /// Only list applications in this state (may be given more than once).
    #[arg(long = "state", value_enum)]
    states: Vec<ApplicationStateArg>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ApplicationStateArg {
    Running,
    Finished,
}

impl From<ApplicationStateArg> for ApplicationState {
    fn from(arg: ApplicationStateArg) -> Self {
        match arg {
            ApplicationStateArg::Running => ApplicationState::Running,
            ApplicationStateArg::Finished => ApplicationState::Finished,
        }
    }
}

pub async fn execute(args: ApplicationArgs) -> Result<()> {
    let config = CliConfig::load()?;
    let yarn = Arc::new(ReqwestYarnClient::new(config.rm_webapp_address));
    let daemon = Daemon::new(yarn);

    let states: Vec<ApplicationState> = args.states.into_iter().map(Into::into).collect();
    let filter = if states.is_empty() { None } else { Some(states.as_slice()) };

    let reports = daemon.get_applications(filter).await.map_err(CliError::from)?;
    println!("{}", serde_json::to_string_pretty(&reports)?);
    Ok(())
}
