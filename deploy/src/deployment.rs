use chrono::Utc;
use contract_types::{
    deploy_config::DeployConfig,
    deployment::{Coin, DeploymentRecord},
};
use log::{debug, info};
use packages::{
    artifact::ArtifactLoader, chain::ChainConnector, error::DeployError, sink::ResultSink,
    wallet::WalletProvider,
};

const ORCHESTRATOR: &str = "orchestrator";

/// progress of a deployment; `Failed` is reachable from every state but `Done`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployState {
    Init,
    WalletReady,
    BalanceChecked,
    ArtifactLoaded,
    Uploaded,
    Instantiated,
    Persisted,
    Done,
    Failed(String),
}

/// result of the advisory balance check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceCheck {
    Confirmed(Coin),
    /// below the configured low balance threshold
    Low(Coin),
    /// the query failed, the deployment went ahead regardless
    Unavailable(String),
}

#[derive(Debug)]
pub enum Persistence {
    /// where the record was written
    Saved(String),
    Failed(DeployError),
}

impl Persistence {
    pub fn is_saved(&self) -> bool {
        matches!(self, Persistence::Saved(_))
    }
}

#[derive(Debug)]
pub struct DeploymentOutcome {
    pub record: DeploymentRecord,
    pub balance: BalanceCheck,
    pub persistence: Persistence,
}

/// drives one deployment from wallet acquisition to a persisted record.
/// every collaborator is a capability chosen by the caller
pub struct Deployment<'a> {
    pub(crate) cfg: &'a DeployConfig,
    pub(crate) wallet: &'a dyn WalletProvider,
    pub(crate) artifacts: &'a dyn ArtifactLoader,
    pub(crate) connector: &'a dyn ChainConnector,
    pub(crate) sink: &'a dyn ResultSink,
    state: DeployState,
}

impl<'a> Deployment<'a> {
    pub fn new(
        cfg: &'a DeployConfig,
        wallet: &'a dyn WalletProvider,
        artifacts: &'a dyn ArtifactLoader,
        connector: &'a dyn ChainConnector,
        sink: &'a dyn ResultSink,
    ) -> Self {
        Self {
            cfg,
            wallet,
            artifacts,
            connector,
            sink,
            state: DeployState::Init,
        }
    }

    pub fn state(&self) -> &DeployState {
        &self.state
    }

    fn advance(&mut self, next: DeployState) {
        debug!(target: ORCHESTRATOR, "{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// runs the workflow once. only fatal errors are returned, a failed
    /// balance check or record save is carried in the outcome
    pub async fn run(&mut self) -> Result<DeploymentOutcome, DeployError> {
        match self.execute().await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                self.advance(DeployState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn execute(&mut self) -> Result<DeploymentOutcome, DeployError> {
        let cfg = self.cfg;
        let network = &cfg.network;
        info!(
            target: ORCHESTRATOR,
            "deploying to {} ({})",
            network.display_name(),
            network.chain_id
        );

        let identity = self.wallet.obtain(network).await?;
        self.advance(DeployState::WalletReady);

        let client = self
            .connector
            .connect(network, identity.signer.clone())
            .await?;

        let balance = self.check_balance(client.as_ref(), &identity.address).await;
        self.advance(DeployState::BalanceChecked);

        let artifact = self.artifacts.load().await?;
        self.advance(DeployState::ArtifactLoaded);

        let upload = self
            .upload(client.as_ref(), &identity.address, &artifact)
            .await?;
        self.advance(DeployState::Uploaded);

        let instantiated = self
            .instantiate(client.as_ref(), &identity.address, upload.code_id)
            .await?;
        self.advance(DeployState::Instantiated);

        let record = DeploymentRecord::new(
            &network.name,
            &identity.address,
            &upload,
            &instantiated,
            Utc::now(),
        );

        let persistence = self.persist(&record).await;
        self.advance(DeployState::Persisted);

        info!(
            target: ORCHESTRATOR,
            "deployed code id {} at {}",
            record.code_id(),
            record.contract_address()
        );
        self.advance(DeployState::Done);

        Ok(DeploymentOutcome {
            record,
            balance,
            persistence,
        })
    }
}
