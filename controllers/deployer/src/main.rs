//! MAAS Deployer
//!
//! Provisions bare-metal machines end to end from a declarative host
//! configuration:
//! - Commissions NEW machines carrying one of the configured tags
//! - Binds each commissioned machine to its host entry by IPMI address
//! - Rebuilds storage (partitions, volume groups, logical volumes),
//!   network (bonds, VLANs, subnet links) and tags
//! - Deploys the configured machines
//!
//! Exits 0 once the run completes, 1 on any fatal error.

mod context;
mod controller;
mod error;
mod lifecycle;
mod matcher;
mod poll;
mod reconciler;
mod sizing;

#[cfg(test)]
mod matcher_test;
#[cfg(test)]
mod test_utils;

use crate::error::ProvisionError;
use clap::{ArgAction, Parser};
use controller::Controller;
use host_config::Document;
use maas_client::MaasClient;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "maas-deployer")]
#[command(about = "Commission, configure and deploy MAAS machines from a host configuration")]
#[command(version)]
struct Args {
    /// Path to the host configuration document
    #[arg(short, long, env = "MAAS_DEPLOYER_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// MAAS region API URL (overrides `maas_url`)
    #[arg(long, env = "MAAS_URL")]
    maas_url: Option<String>,

    /// MAAS API key (overrides `maas_apikey`)
    #[arg(long, env = "MAAS_APIKEY", hide_env_values = true)]
    maas_apikey: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Stop after configuring machines, without deploying them
    #[arg(long)]
    skip_deploy: bool,
}

async fn run(args: Args) -> Result<(), ProvisionError> {
    let document = Document::load(&args.config)?;
    document.validate()?;
    info!(
        "Loaded {} host(s) from {}",
        document.hosts.len(),
        args.config.display()
    );

    let maas_url = args
        .maas_url
        .or_else(|| document.maas_url.clone())
        .ok_or_else(|| ProvisionError::InvalidConfig("MAAS URL is required (maas_url or MAAS_URL)".to_string()))?;
    let maas_apikey = args
        .maas_apikey
        .or_else(|| document.maas_apikey.clone())
        .ok_or_else(|| {
            ProvisionError::InvalidConfig("MAAS API key is required (maas_apikey or MAAS_APIKEY)".to_string())
        })?;

    info!("Configuration:");
    info!("  MAAS URL: {}", maas_url);
    info!("  Tag filter: {}", document.tag_filter.join(", "));

    let client = MaasClient::new(maas_url, &maas_apikey)?;
    let controller = Controller::new(Arc::new(client), document, args.skip_deploy).await?;
    let summary = controller.run().await?;
    summary.log();
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    info!("Starting MAAS Deployer");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
