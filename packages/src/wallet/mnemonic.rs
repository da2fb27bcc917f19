use std::sync::Arc;

use async_trait::async_trait;
use bip32::{DerivationPath, XPrv};
use bip39::{Language, Mnemonic};
use contract_types::{deploy_config::WalletRecord, neutron_config::NetworkConfig};
use cosmrs::{
    crypto::{secp256k1::SigningKey, PublicKey},
    tx::{Raw, SignDoc},
};
use log::{info, warn};

use super::{AccountData, OfflineSigner, WalletIdentity, WalletProvider, WALLET};
use crate::error::{BoxError, DeployError};

/// first account of the cosmos hd wallet
pub const COSMOS_HD_PATH: &str = "m/44'/118'/0'/0/0";

/// wallet backed by a locally held mnemonic
pub struct MnemonicWallet {
    record: WalletRecord,
    mnemonic: Option<String>,
}

impl MnemonicWallet {
    pub fn new(record: WalletRecord, env_mnemonic: Option<String>) -> Self {
        let mnemonic = env_mnemonic
            .filter(|m| !m.trim().is_empty())
            .or_else(|| record.mnemonic.clone());

        Self { record, mnemonic }
    }

    fn check_pubkey(&self, configured: &str, derived: PublicKey) {
        let configured_key = serde_json::from_str::<serde_json::Value>(configured)
            .ok()
            .and_then(|v| v.get("key").and_then(|k| k.as_str()).map(str::to_string));
        let derived_key = serde_json::from_str::<serde_json::Value>(&derived.to_json())
            .ok()
            .and_then(|v| v.get("key").and_then(|k| k.as_str()).map(str::to_string));

        match configured_key {
            None => warn!(
                target: WALLET,
                "wallet `{}` pubkey is not a valid key json, skipping pubkey check",
                self.record.name
            ),
            Some(key) if Some(&key) != derived_key.as_ref() => warn!(
                target: WALLET,
                "wallet `{}` configured pubkey {key} does not match the derived key",
                self.record.name
            ),
            Some(_) => {}
        }
    }
}

#[async_trait]
impl WalletProvider for MnemonicWallet {
    async fn obtain(&self, network: &NetworkConfig) -> Result<WalletIdentity, DeployError> {
        let phrase = self.mnemonic.as_deref().ok_or_else(|| {
            DeployError::WalletUnavailable(format!(
                "no mnemonic available for wallet `{}`, set MNEMONIC",
                self.record.name
            ))
        })?;

        let signer = MnemonicSigner::derive(phrase, &network.bech32_prefix)?;
        let address = signer.address().to_string();

        // a mismatch is reported but the derived address is what signs
        if let Some(expected) = &self.record.address {
            if expected != &address {
                warn!(
                    target: WALLET,
                    "wallet `{}` derived address {address} differs from configured address {expected}, continuing with {address}",
                    self.record.name
                );
            }
        }
        if let Some(pubkey) = &self.record.pubkey {
            self.check_pubkey(pubkey, signer.public_key());
        }

        info!(target: WALLET, "using wallet `{}`: {address}", self.record.name);

        Ok(WalletIdentity {
            address,
            signer: Arc::new(signer),
        })
    }
}

/// secp256k1 key derived along [`COSMOS_HD_PATH`]
pub struct MnemonicSigner {
    // kept as raw bytes, a signing key is rebuilt for every signature
    secret: [u8; 32],
    public_key: PublicKey,
    address: String,
}

impl MnemonicSigner {
    pub fn derive(phrase: &str, prefix: &str) -> Result<Self, DeployError> {
        // 12 to 24 words
        let normalized = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
        let mnemonic = Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|e| DeployError::WalletUnavailable(format!("invalid mnemonic: {e}")))?;

        let path: DerivationPath = COSMOS_HD_PATH
            .parse()
            .map_err(|e| DeployError::WalletUnavailable(format!("invalid hd path: {e}")))?;
        let xprv = XPrv::derive_from_path(mnemonic.to_seed(""), &path)
            .map_err(|e| DeployError::WalletUnavailable(format!("key derivation failed: {e}")))?;

        let secret = xprv.to_bytes();
        let signing_key = SigningKey::from_slice(&secret)
            .map_err(|e| DeployError::WalletUnavailable(format!("invalid derived key: {e}")))?;
        let public_key = signing_key.public_key();
        let address = public_key
            .account_id(prefix)
            .map_err(|e| DeployError::WalletUnavailable(format!("invalid address prefix: {e}")))?
            .to_string();

        Ok(Self {
            secret,
            public_key,
            address,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }
}

#[async_trait]
impl OfflineSigner for MnemonicSigner {
    async fn accounts(&self) -> Result<Vec<AccountData>, BoxError> {
        Ok(vec![AccountData {
            address: self.address.clone(),
            public_key: self.public_key,
        }])
    }

    async fn sign_direct(
        &self,
        signer_address: &str,
        sign_doc: SignDoc,
    ) -> Result<Raw, BoxError> {
        if signer_address != self.address {
            return Err(format!("signer {signer_address} is not held by this wallet").into());
        }

        let key = SigningKey::from_slice(&self.secret).map_err(|e| e.to_string())?;
        let raw = sign_doc.sign(&key).map_err(|e| e.to_string())?;

        Ok(raw)
    }
}
