//! skein-am — the Skein Application Master binary: validates a submitted
//! application spec, registers with YARN, drives the reconciler against a
//! live cluster, and serves the Master RPC surface over HTTP.

mod config;
mod error;
mod rpc;
mod yarn;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use config::AmConfig;
use error::{AmError, Result};
use skein_core::cluster::{ClusterInterface, FinalStatus};
use skein_core::spec::{validate, ApplicationSpec};
use skein_core::MasterState;
use yarn::YarnRestCluster;

/// Skein Application Master - coordinates a multi-service YARN application
#[derive(Parser)]
#[command(name = "skein-am")]
#[command(version, about, long_about = None)]
struct Args {
    /// Optional TOML configuration file overlaying the built-in defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the application spec JSON this AM was launched with,
    /// overriding whatever the config file or defaults say.
    #[arg(long)]
    application_spec: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut am_config = AmConfig::load(args.config.as_deref())?;
    if let Some(path) = args.application_spec {
        am_config.application_spec_path = path;
    }

    if let Err(err) = run(am_config).await {
        error!(%err, "skein-am: fatal error");
        return Err(err);
    }
    Ok(())
}

async fn run(am_config: AmConfig) -> Result<()> {
    let spec_text = std::fs::read_to_string(&am_config.application_spec_path)?;
    let application_spec: ApplicationSpec = serde_json::from_str(&spec_text)?;

    let cluster_max = YarnRestCluster::fetch_cluster_max(&am_config.rm_webapp_address)
        .await
        .map_err(|err| AmError::Coordination(skein_core::SkeinError::Unavailable {
            operation: "cluster metrics".to_string(),
            source: Box::new(err),
        }))?;
    validate(&application_spec, cluster_max)
        .map_err(|err| AmError::Coordination(skein_core::SkeinError::InvalidArgument {
            message: err.to_string(),
        }))?;

    let bind_addr: SocketAddr = am_config
        .master
        .bind_addr
        .parse()
        .map_err(|_| AmError::Bind(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("invalid bind address '{}'", am_config.master.bind_addr),
        )))?;

    let application_id = skein_core::ApplicationId::new();
    let cluster: Arc<dyn ClusterInterface> = Arc::new(YarnRestCluster::new(
        am_config.rm_webapp_address.clone(),
        application_id,
        am_config.master.event_poll_timeout,
    ));

    let appmaster_address = format!("http://{bind_addr}");
    let master = Arc::new(MasterState::new(
        application_spec,
        am_config.master.clone(),
        Arc::clone(&cluster),
        appmaster_address.clone(),
        am_config.user.clone(),
    ));

    master
        .bootstrap(
            &bind_addr.ip().to_string(),
            bind_addr.port(),
            &appmaster_address,
        )
        .await?;
    info!(%bind_addr, "skein-am: registered with cluster, serving Master RPC");

    let server_master = Arc::clone(&master);
    let server = tokio::spawn(async move {
        if let Err(err) = rpc::serve(server_master, bind_addr).await {
            error!(%err, "skein-am: RPC server stopped");
        }
    });

    let reconciler_master = Arc::clone(&master);
    let reconciler = tokio::spawn(async move { reconciler_master.run().await });

    tokio::select! {
        result = reconciler => {
            if let Ok(Err(err)) = result {
                error!(%err, "skein-am: reconciler loop exited with an error");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("skein-am: received shutdown signal");
            master
                .shutdown(FinalStatus::Killed, "AM received SIGINT".to_string())
                .await?;
        }
    }

    server.abort();
    Ok(())
}
