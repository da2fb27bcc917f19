use std::sync::Arc;

use async_trait::async_trait;
use contract_types::neutron_config::{ChainInfo, NetworkConfig};
use log::{info, warn};

use super::{OfflineSigner, WalletIdentity, WalletProvider, WALLET};
use crate::error::{BoxError, DeployError};

/// signer extension living outside of this process (keplr-like)
#[async_trait]
pub trait WalletExtension: Send + Sync {
    /// register the chain with the extension, a no-op if it is already known
    async fn suggest_chain(&self, chain: &ChainInfo) -> Result<(), BoxError>;

    /// ask the user to grant access to the chain
    async fn enable(&self, chain_id: &str) -> Result<(), BoxError>;

    fn offline_signer(&self, chain_id: &str) -> Arc<dyn OfflineSigner>;
}

pub struct ExtensionWallet {
    extension: Option<Arc<dyn WalletExtension>>,
}

impl ExtensionWallet {
    pub fn new(extension: Option<Arc<dyn WalletExtension>>) -> Self {
        Self { extension }
    }
}

#[async_trait]
impl WalletProvider for ExtensionWallet {
    async fn obtain(&self, network: &NetworkConfig) -> Result<WalletIdentity, DeployError> {
        let extension = self.extension.as_ref().ok_or_else(|| {
            DeployError::WalletUnavailable(
                "no signer extension found, install one or configure a mnemonic wallet"
                    .to_string(),
            )
        })?;

        // suggestion failures are common for already registered chains
        if let Err(e) = extension.suggest_chain(&network.chain_info()).await {
            warn!(target: WALLET, "chain suggestion for {} failed: {e}", network.chain_id);
        }

        extension
            .enable(&network.chain_id)
            .await
            .map_err(|e| DeployError::AuthorizationDenied(format!("{}: {e}", network.chain_id)))?;

        let signer = extension.offline_signer(&network.chain_id);
        let accounts = signer
            .accounts()
            .await
            .map_err(|e| DeployError::WalletUnavailable(format!("failed to list accounts: {e}")))?;

        let address = accounts
            .into_iter()
            .next()
            .map(|account| account.address)
            .filter(|address| !address.is_empty())
            .ok_or_else(|| DeployError::NoAccount {
                chain_id: network.chain_id.clone(),
            })?;

        info!(target: WALLET, "extension wallet connected: {address}");

        Ok(WalletIdentity { address, signer })
    }
}
