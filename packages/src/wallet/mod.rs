//! Signing identities: a key derived locally from a mnemonic, or one held by
//! a signer extension.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use contract_types::{deploy_config::WalletConfig, neutron_config::NetworkConfig};
use cosmrs::{
    crypto::PublicKey,
    tx::{Raw, SignDoc},
};

use crate::error::{BoxError, DeployError};

pub mod extension;
pub mod mnemonic;

pub use extension::{ExtensionWallet, WalletExtension};
pub use mnemonic::{MnemonicSigner, MnemonicWallet};

pub(crate) const WALLET: &str = "wallet";

#[derive(Debug, Clone)]
pub struct AccountData {
    pub address: String,
    pub public_key: PublicKey,
}

/// direct-mode signer bound to a chain
#[async_trait]
pub trait OfflineSigner: Send + Sync {
    async fn accounts(&self) -> Result<Vec<AccountData>, BoxError>;

    async fn sign_direct(&self, signer_address: &str, sign_doc: SignDoc)
        -> Result<Raw, BoxError>;
}

/// signer together with the account address the deployment is sent from
#[derive(Clone)]
pub struct WalletIdentity {
    pub address: String,
    pub signer: Arc<dyn OfflineSigner>,
}

impl fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletIdentity")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn obtain(&self, network: &NetworkConfig) -> Result<WalletIdentity, DeployError>;
}

/// wallet strategy selected at startup
pub enum WalletSource {
    Mnemonic(MnemonicWallet),
    Extension(ExtensionWallet),
}

impl WalletSource {
    /// `env_mnemonic` takes precedence over a mnemonic written in the wallet record.
    /// `extension` is whatever signer extension the host environment provides.
    pub fn from_config(
        cfg: &WalletConfig,
        env_mnemonic: Option<String>,
        extension: Option<Arc<dyn WalletExtension>>,
    ) -> Self {
        match cfg {
            WalletConfig::Mnemonic(record) => {
                WalletSource::Mnemonic(MnemonicWallet::new(record.clone(), env_mnemonic))
            }
            WalletConfig::Extension => WalletSource::Extension(ExtensionWallet::new(extension)),
        }
    }
}

#[async_trait]
impl WalletProvider for WalletSource {
    async fn obtain(&self, network: &NetworkConfig) -> Result<WalletIdentity, DeployError> {
        match self {
            WalletSource::Mnemonic(wallet) => wallet.obtain(network).await,
            WalletSource::Extension(wallet) => wallet.obtain(network).await,
        }
    }
}
