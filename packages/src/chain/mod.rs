use std::sync::Arc;

use async_trait::async_trait;
use contract_types::{
    deployment::{Coin, ContractArtifact, InstantiateOptions, InstantiateResult, UploadResult},
    neutron_config::{FeeMode, NetworkConfig},
};

use crate::{error::ChainError, wallet::OfflineSigner};

pub mod rpc;

pub use rpc::{RpcChainClient, RpcConnector};

pub(crate) const CHAIN: &str = "chain";

/// signing client for a single network
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn get_balance(&self, address: &str, denom: &str) -> Result<Coin, ChainError>;

    /// stores the bytecode, returning the assigned code id
    async fn upload(
        &self,
        sender: &str,
        artifact: &ContractArtifact,
        fee: FeeMode,
        memo: Option<&str>,
    ) -> Result<UploadResult, ChainError>;

    async fn instantiate(
        &self,
        sender: &str,
        code_id: u64,
        init_msg: &serde_json::Value,
        label: &str,
        fee: FeeMode,
        options: &InstantiateOptions,
    ) -> Result<InstantiateResult, ChainError>;
}

/// builds a [`ChainClient`] once the signer is known
#[async_trait]
pub trait ChainConnector: Send + Sync {
    async fn connect(
        &self,
        network: &NetworkConfig,
        signer: Arc<dyn OfflineSigner>,
    ) -> Result<Box<dyn ChainClient>, ChainError>;
}
