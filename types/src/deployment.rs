use chrono::{DateTime, SecondsFormat, Utc};
use cosmwasm_std::Uint128;
use serde::{Deserialize, Serialize};

/// contract bytecode, never empty
#[derive(Clone, PartialEq, Eq)]
pub struct ContractArtifact {
    bytes: Vec<u8>,
}

impl ContractArtifact {
    /// returns `None` for an empty payload
    pub fn new(bytes: Vec<u8>) -> Option<Self> {
        if bytes.is_empty() {
            return None;
        }
        Some(Self { bytes })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for ContractArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractArtifact")
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: Uint128,
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.amount, self.denom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// code id assigned by the chain
    pub code_id: u64,
    pub transaction_hash: String,
    /// hex encoded checksum of the stored code
    pub checksum: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantiateResult {
    pub contract_address: String,
    pub transaction_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstantiateOptions {
    pub admin: Option<String>,
    pub memo: Option<String>,
}

/// outcome of a completed upload + instantiate, the only thing that gets persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRecord {
    network: String,
    code_id: u64,
    contract_address: String,
    deployer: String,
    upload_tx_hash: String,
    instantiate_tx_hash: String,
    deployed_at: DateTime<Utc>,
}

impl DeploymentRecord {
    pub fn new(
        network: &str,
        deployer: &str,
        upload: &UploadResult,
        instantiate: &InstantiateResult,
        deployed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            network: network.to_string(),
            code_id: upload.code_id,
            contract_address: instantiate.contract_address.clone(),
            deployer: deployer.to_string(),
            upload_tx_hash: upload.transaction_hash.clone(),
            instantiate_tx_hash: instantiate.transaction_hash.clone(),
            deployed_at,
        }
    }

    pub fn network(&self) -> &str {
        &self.network
    }

    pub fn code_id(&self) -> u64 {
        self.code_id
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    pub fn deployer(&self) -> &str {
        &self.deployer
    }

    pub fn upload_tx_hash(&self) -> &str {
        &self.upload_tx_hash
    }

    pub fn instantiate_tx_hash(&self) -> &str {
        &self.instantiate_tx_hash
    }

    pub fn deployed_at(&self) -> DateTime<Utc> {
        self.deployed_at
    }

    /// ISO-8601 with millisecond precision, e.g. `2025-01-01T00:00:00.000Z`
    pub fn deployed_at_iso(&self) -> String {
        self.deployed_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// shape written to `deployment-<network>.json`
    pub fn file_view(&self, with_timestamp: bool) -> DeploymentFileRecord<'_> {
        DeploymentFileRecord {
            network: &self.network,
            code_id: self.code_id,
            contract_address: &self.contract_address,
            deployer: &self.deployer,
            transaction_hash: &self.instantiate_tx_hash,
            deployed_at: with_timestamp.then(|| self.deployed_at_iso()),
        }
    }

    /// shape written to the key/value store
    pub fn store_view(&self) -> StoredDeploymentRecord<'_> {
        StoredDeploymentRecord {
            code_id: self.code_id,
            contract_address: &self.contract_address,
            upload_tx_hash: &self.upload_tx_hash,
            instantiate_tx_hash: &self.instantiate_tx_hash,
            deployed_at: self.deployed_at_iso(),
            deployer: &self.deployer,
            network: &self.network,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentFileRecord<'a> {
    pub network: &'a str,
    pub code_id: u64,
    pub contract_address: &'a str,
    pub deployer: &'a str,
    pub transaction_hash: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredDeploymentRecord<'a> {
    pub code_id: u64,
    pub contract_address: &'a str,
    pub upload_tx_hash: &'a str,
    pub instantiate_tx_hash: &'a str,
    pub deployed_at: String,
    pub deployer: &'a str,
    pub network: &'a str,
}
