//! `skein submit <spec>` (§6 CLI surface): validate and submit an
//! application spec, printing the assigned application id.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use skein_client::{AmLaunchSpec, Daemon, ReqwestYarnClient};
use skein_core::spec::ApplicationSpec;

use crate::cli_config::CliConfig;
use crate::error::{CliError, Result};
use crate::utils;

#[derive(Args)]
pub struct SubmitArgs {
    /// Path to the application spec JSON file.
    spec: PathBuf,

    /// Memory, in MiB, to request for the Application Master container
    /// itself (not the services it launches).
    #[arg(long, default_value_t = 512)]
    am_memory_mib: u32,

    /// Virtual cores to request for the Application Master container.
    #[arg(long, default_value_t = 1)]
    am_vcores: u32,

    /// Command the cluster should run to start the Application Master.
    /// Defaults to the `skein-am` binary reading the submitted spec.
    #[arg(long)]
    am_command: Option<String>,
}

pub async fn execute(args: SubmitArgs) -> Result<()> {
    let config = CliConfig::load()?;
    let text = std::fs::read_to_string(&args.spec)?;
    let spec: ApplicationSpec = serde_json::from_str(&text)?;

    let am_command = args
        .am_command
        .unwrap_or_else(|| format!("skein-am --application-spec {}", args.spec.display()));
    let launch = AmLaunchSpec {
        command: am_command,
        memory_mib: args.am_memory_mib,
        vcores: args.am_vcores,
    };

    let yarn = Arc::new(ReqwestYarnClient::new(config.rm_webapp_address));
    let daemon = Daemon::new(yarn);

    let id = daemon.submit(&spec, launch).await.map_err(CliError::from)?;
    utils::success(&format!("submitted application {id}"));
    println!("{id}");
    Ok(())
}
