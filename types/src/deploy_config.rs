use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, ensure, Context};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::neutron_config::{FeeMode, NetworkConfig};

pub const DEFAULT_STORE_KEY: &str = "neutron-deployment";
pub const DEFAULT_CONTRACT_LABEL: &str = "My Contract";
pub const WASM_EXTENSION: &str = "wasm";

/// toml (de)serialization helpers for configuration files
pub trait TomlConfig: Sized + DeserializeOwned {
    fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

/// top-level deployment configuration, everything the orchestrator needs
/// to run a single upload + instantiate cycle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    pub network: NetworkConfig,
    pub wallet: WalletConfig,
    pub artifact: ArtifactConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub contract: ContractConfig,
}

impl DeployConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        self.network.validate()?;
        self.contract.validate()?;

        if let WalletConfig::Mnemonic(record) = &self.wallet {
            if let Some(address) = &record.address {
                ensure!(
                    address.starts_with(&self.network.bech32_prefix),
                    "wallet `{}` address {address} does not use the `{}` prefix",
                    record.name,
                    self.network.bech32_prefix
                );
            }
        }

        Ok(())
    }
}

impl TomlConfig for DeployConfig {
    fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let cfg: DeployConfig = toml::from_str(content)?;
        cfg.validate()?;
        Ok(cfg)
    }
}

/// where the signing identity comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WalletConfig {
    /// key derived locally from a mnemonic
    Mnemonic(WalletRecord),
    /// key held by a signer extension
    Extension,
}

/// static wallet record; the mnemonic is normally supplied through the
/// environment rather than written here
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct WalletRecord {
    pub name: String,
    /// address the mnemonic is expected to derive
    #[serde(default)]
    pub address: Option<String>,
    /// public key json as printed by `neutrond keys show`
    #[serde(default)]
    pub pubkey: Option<String>,
    #[serde(default)]
    pub mnemonic: Option<String>,
}

impl fmt::Debug for WalletRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletRecord")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("pubkey", &self.pubkey)
            .field("mnemonic", &self.mnemonic.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// where the contract bytecode comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactConfig {
    Path {
        path: PathBuf,
    },
    Interactive {
        #[serde(default = "default_artifact_extension")]
        extension: String,
    },
}

fn default_artifact_extension() -> String {
    WASM_EXTENSION.to_string()
}

/// where the deployment record is written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputConfig {
    /// `deployment-<network>.json` inside `dir`
    File {
        #[serde(default = "default_output_dir")]
        dir: PathBuf,
        /// include `deployedAt` in the record
        #[serde(default)]
        track_timestamp: bool,
    },
    /// json key/value store file, one entry under `key`
    Store {
        path: PathBuf,
        #[serde(default = "default_store_key")]
        key: String,
    },
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_store_key() -> String {
    DEFAULT_STORE_KEY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractConfig {
    #[serde(default = "default_label")]
    pub label: String,
    /// instantiate message as json text
    #[serde(default = "default_init_msg")]
    pub init_msg: String,
    /// contract admin, defaults to the deployer
    #[serde(default)]
    pub admin: Option<String>,
    /// instantiate without any admin
    #[serde(default)]
    pub no_admin: bool,
    #[serde(default)]
    pub upload_memo: Option<String>,
    #[serde(default)]
    pub instantiate_memo: Option<String>,
    #[serde(default)]
    pub fee: FeeMode,
}

fn default_label() -> String {
    DEFAULT_CONTRACT_LABEL.to_string()
}

fn default_init_msg() -> String {
    "{}".to_string()
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            label: default_label(),
            init_msg: default_init_msg(),
            admin: None,
            no_admin: false,
            upload_memo: None,
            instantiate_memo: None,
            fee: FeeMode::default(),
        }
    }
}

impl ContractConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(!self.label.trim().is_empty(), "contract label must not be empty");
        ensure!(
            !(self.no_admin && self.admin.is_some()),
            "`admin` and `no_admin` are mutually exclusive"
        );
        self.init_msg_json()?;
        Ok(())
    }

    pub fn init_msg_json(&self) -> anyhow::Result<serde_json::Value> {
        let msg: serde_json::Value = serde_json::from_str(&self.init_msg)
            .map_err(|e| anyhow!("instantiate message is not valid json: {e}"))?;
        ensure!(msg.is_object(), "instantiate message must be a json object");
        Ok(msg)
    }

    pub fn admin_for(&self, deployer: &str) -> Option<String> {
        if self.no_admin {
            return None;
        }
        Some(self.admin.clone().unwrap_or_else(|| deployer.to_string()))
    }
}
