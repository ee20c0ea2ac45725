use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::oneshot;
use tracing::{error, info};

use launchpad_chain::get_network_presets;
use launchpad_core::config::{ConsoleConfig, API_TOKEN_ENV};
use launchpad_core::logging;
use launchpad_deploy::cache::QueryCache;
use launchpad_deploy::job::JobOutcome;
use launchpad_deploy::poller::{PollCallbacks, PollPolicy, TaskPoller};
use launchpad_deploy::submitter::DeploymentSubmitter;
use launchpad_deploy::ConsoleApiClient;

#[derive(Parser)]
#[command(name = "launchpad")]
#[command(about = "Operator console for DRB node deployments")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Follow a deployment job until it finishes
    Watch {
        job_id: String,
        /// Stop after this many failed polls in a row
        #[arg(long)]
        max_failures: Option<u32>,
    },
    /// Remove the DRB integration from a resource
    Remove {
        /// Defaults to `default_resource_id` from the config file
        resource_id: Option<String>,
    },
    /// List known networks
    Networks,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn watch(config: &ConsoleConfig, job_id: String, max_failures: Option<u32>) -> Result<ExitCode> {
    let client = Arc::new(ConsoleApiClient::from_config(config)?);
    let poller = TaskPoller::new(client);
    let mut policy = PollPolicy::from_config(config);
    if max_failures.is_some() {
        policy = policy.with_max_failures(max_failures);
    }

    let (done_tx, done_rx) = oneshot::channel();
    let (fail_tx, fail_rx) = oneshot::channel();
    let callbacks = PollCallbacks::new()
        .on_update(|p| {
            println!("[{}] {:>3}% {} {}", p.status.as_str(), p.percentage, p.message, p.job_id);
        })
        .on_complete(move |p| {
            let _ = done_tx.send(p.clone());
        })
        .on_error(move |p| {
            let _ = fail_tx.send(p.clone());
        });

    let subscription = poller.start(job_id, policy, callbacks);
    let (outcome, progress) = tokio::select! {
        Ok(p) = done_rx => (JobOutcome::Succeeded, p),
        Ok(p) = fail_rx => (JobOutcome::Failed, p),
        _ = tokio::signal::ctrl_c() => {
            subscription.cancel();
            info!("Watch interrupted");
            return Ok(ExitCode::from(130));
        }
    };

    let elapsed = subscription.elapsed_label();
    match outcome {
        JobOutcome::Succeeded => {
            println!("Job {} completed in {elapsed}", progress.job_id);
            Ok(ExitCode::SUCCESS)
        }
        JobOutcome::Failed => {
            let reason = progress.last_error.unwrap_or(progress.message);
            eprintln!("Job {} failed after {elapsed}: {reason}", progress.job_id);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn remove(config: &ConsoleConfig, resource_id: Option<String>) -> Result<ExitCode> {
    let resource_id = resource_id
        .or_else(|| config.default_resource_id.clone())
        .context("no resource id given and default_resource_id is not configured")?;

    let client = Arc::new(ConsoleApiClient::from_config(config)?);
    let submitter = DeploymentSubmitter::new(client, Arc::new(QueryCache::new()));
    match submitter.remove(&resource_id).await {
        Ok(ack) => {
            match ack.job_id {
                Some(job_id) => println!("Removal started (job {job_id})"),
                None => println!("DRB integration removed from {resource_id}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("Removal failed: {e}");
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn networks() -> ExitCode {
    for preset in get_network_presets() {
        println!(
            "{:<16} {:<16} chain {:<14} {} (min {})",
            preset.key,
            preset.name,
            preset.chain_id,
            preset.native_token.symbol(),
            launchpad_chain::format_units(
                preset.native_token.min_recommended_balance(),
                preset.native_token.decimals()
            ),
        );
    }
    ExitCode::SUCCESS
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

fn load_config() -> Result<ConsoleConfig> {
    ConsoleConfig::ensure_dirs()?;
    let mut config = ConsoleConfig::load()?;
    config.apply_env(|key| std::env::var(key).ok());
    if config.api_token.is_none() {
        info!("{API_TOKEN_ENV} is not set; requests are sent without a token");
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = load_config()?;
    let _log_guard = logging::init_logging(&config.log_level)?;
    info!("Starting launchpad v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Watch {
            job_id,
            max_failures,
        } => watch(&config, job_id, max_failures).await,
        Commands::Remove { resource_id } => remove(&config, resource_id).await,
        Commands::Networks => Ok(networks()),
    }
}
