//! `skein status <id>` (§6 CLI surface).

use std::sync::Arc;

use clap::Args;
use skein_client::{Daemon, ReqwestYarnClient};
use skein_core::ApplicationId;
use uuid::Uuid;

use crate::cli_config::CliConfig;
use crate::error::{CliError, Result};

#[derive(Args)]
pub struct StatusArgs {
    /// Application id, as printed by `skein submit`.
    id: String,

    /// Block until the Application Master has registered its endpoint.
    #[arg(long)]
    wait: bool,
}

pub async fn execute(args: StatusArgs) -> Result<()> {
    let config = CliConfig::load()?;
    let id = parse_application_id(&args.id)?;
    let yarn = Arc::new(ReqwestYarnClient::new(config.rm_webapp_address));
    let daemon = Daemon::new(yarn);

    let report = if args.wait {
        daemon
            .wait_for_start(id, config.wait_timeout())
            .await
            .map_err(CliError::from)?
    } else {
        daemon.get_status(id).await.map_err(CliError::from)?
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Parse a CLI-supplied application id. Accepts either the raw UUID or
/// the `application_<uuid>` display form `skein submit` prints; `Uuid`
/// parses both hyphenated and simple (no-hyphen) forms.
pub fn parse_application_id(raw: &str) -> Result<ApplicationId> {
    let hex = raw.strip_prefix("application_").unwrap_or(raw);
    let uuid = Uuid::parse_str(hex)
        .map_err(|_| CliError::InvalidArgument(format!("invalid application id '{raw}'")))?;
    Ok(ApplicationId::from_uuid(uuid))
}
