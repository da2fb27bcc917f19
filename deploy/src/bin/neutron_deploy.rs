use std::{
    backtrace::BacktraceStatus,
    env,
    path::PathBuf,
    process,
};

use anyhow::Context;
use clap::Parser;
use contract_deploy::{BalanceCheck, Deployment, DeploymentOutcome, Persistence};
use contract_types::deploy_config::{
    ArtifactConfig, DeployConfig, OutputConfig, TomlConfig, WASM_EXTENSION,
};
use dotenv::dotenv;
use log::{error, info, warn};
use packages::{
    artifact::{ArtifactSource, StdinPrompt},
    chain::RpcConnector,
    error::{troubleshooting_hints, DeployError},
    sink::RecordSink,
    utils::logging::setup_logging,
    wallet::WalletSource,
};

// default configuration path, should be overridden by environment variables
const DEPLOY_CFG_PATH: &str = "deploy/src/neutron.toml";
const DEPLOY: &str = "deploy";

/// Upload and instantiate a CosmWasm contract on Neutron
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// deployment configuration file
    #[arg(long, env = "DEPLOY_CFG_PATH", default_value = DEPLOY_CFG_PATH)]
    config: PathBuf,

    /// read the contract from this path instead of the configured source
    #[arg(long, conflicts_with = "interactive")]
    wasm: Option<PathBuf>,

    /// prompt for the contract file
    #[arg(long)]
    interactive: bool,

    /// write `deployment-<network>.json` into this directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    #[arg(long)]
    label: Option<String>,

    /// instantiate message as json
    #[arg(long)]
    init_msg: Option<String>,
}

impl Args {
    fn apply(&self, cfg: &mut DeployConfig) -> anyhow::Result<()> {
        if let Some(path) = &self.wasm {
            cfg.artifact = ArtifactConfig::Path { path: path.clone() };
        }
        if self.interactive {
            let extension = match &cfg.artifact {
                ArtifactConfig::Interactive { extension } => extension.clone(),
                ArtifactConfig::Path { .. } => WASM_EXTENSION.to_string(),
            };
            cfg.artifact = ArtifactConfig::Interactive { extension };
        }
        if let Some(dir) = &self.output_dir {
            let track_timestamp = match &cfg.output {
                OutputConfig::File {
                    track_timestamp, ..
                } => *track_timestamp,
                OutputConfig::Store { .. } => false,
            };
            cfg.output = OutputConfig::File {
                dir: dir.clone(),
                track_timestamp,
            };
        }
        if let Some(label) = &self.label {
            cfg.contract.label = label.clone();
        }
        if let Some(init_msg) = &self.init_msg {
            cfg.contract.init_msg = init_msg.clone();
        }

        cfg.validate().context("invalid configuration after applying overrides")
    }
}

async fn deploy(cfg: &DeployConfig) -> Result<DeploymentOutcome, DeployError> {
    let mnemonic = env::var("MNEMONIC").ok();

    // a terminal has no signer extension to offer
    let wallet = WalletSource::from_config(&cfg.wallet, mnemonic, None);
    let artifacts = ArtifactSource::from_config(&cfg.artifact, Box::new(StdinPrompt));
    let sink = RecordSink::from_config(&cfg.output);

    let mut deployment = Deployment::new(cfg, &wallet, &artifacts, &RpcConnector, &sink);
    deployment.run().await
}

fn report(outcome: &DeploymentOutcome) {
    let record = &outcome.record;

    info!(target: DEPLOY, "deployment successful");
    info!(target: DEPLOY, "network: {}", record.network());
    info!(target: DEPLOY, "code id: {}", record.code_id());
    info!(target: DEPLOY, "contract address: {}", record.contract_address());
    info!(target: DEPLOY, "deployer: {}", record.deployer());
    info!(target: DEPLOY, "upload tx: {}", record.upload_tx_hash());
    info!(target: DEPLOY, "instantiate tx: {}", record.instantiate_tx_hash());

    if let BalanceCheck::Unavailable(reason) = &outcome.balance {
        warn!(target: DEPLOY, "deployer balance was not verified: {reason}");
    }

    match &outcome.persistence {
        Persistence::Saved(target) => info!(target: DEPLOY, "deployment info saved to {target}"),
        Persistence::Failed(e) => warn!(
            target: DEPLOY,
            "contract deployed but the deployment info was not saved: {e}"
        ),
    }
}

/// lines logged for a fatal error before exiting
fn failure_report(err: &anyhow::Error) -> Vec<String> {
    let mut lines = vec![format!("deployment failed: {err}")];
    lines.extend(err.chain().skip(1).map(|cause| format!("caused by: {cause}")));

    let backtrace = err.backtrace();
    if backtrace.status() == BacktraceStatus::Captured {
        lines.push(format!("stack trace:\n{backtrace}"));
    }

    lines.push("troubleshooting:".to_string());
    lines.extend(
        troubleshooting_hints(&format!("{err:#}"))
            .into_iter()
            .map(|hint| format!("  - {hint}")),
    );
    lines
}

fn fail(err: &anyhow::Error) -> ! {
    for line in failure_report(err) {
        error!(target: DEPLOY, "{line}");
    }

    process::exit(1)
}

async fn run(args: Args) -> anyhow::Result<DeploymentOutcome> {
    let mut cfg = DeployConfig::from_file(&args.config)?;
    args.apply(&mut cfg)?;

    info!(
        target: DEPLOY,
        "loaded configuration from {}",
        args.config.display()
    );

    Ok(deploy(&cfg).await?)
}

#[tokio::main]
async fn main() {
    // load environment variables
    dotenv().ok();

    let args = Args::parse();

    if let Err(e) = setup_logging() {
        eprintln!("failed to initialize logging: {e}");
    }

    match run(args).await {
        Ok(outcome) => report(&outcome),
        Err(e) => fail(&e),
    }
}
