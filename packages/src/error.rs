use std::{error::Error as StdError, path::PathBuf};

use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// failures while talking to the chain, surfaced unchanged from the rpc layer
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("rpc transport error: {0}")]
    Transport(String),
    #[error("abci query {path} failed with code {code}: {log}")]
    Query { path: String, code: u32, log: String },
    #[error("transaction refused at check_tx with code {code}: {log}")]
    Rejected { code: u32, log: String },
    #[error("transaction {hash} failed with code {code}: {log}")]
    TxFailed { hash: String, code: u32, log: String },
    #[error("transaction {hash} was not included within {timeout_ms}ms")]
    Timeout { hash: String, timeout_ms: u64 },
    #[error("failed to sign transaction: {0}")]
    Signing(String),
    #[error("failed to encode request: {0}")]
    Encode(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("wallet unavailable: {0}")]
    WalletUnavailable(String),
    #[error("wallet authorization denied: {0}")]
    AuthorizationDenied(String),
    #[error("no accounts found in wallet for chain {chain_id}")]
    NoAccount { chain_id: String },
    #[error("Failed to read WASM file {}: {source}", .path.display())]
    ArtifactNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("WASM file is empty")]
    EmptyArtifact,
    #[error("Please select a .{expected} file, got {name}")]
    InvalidArtifactType { name: String, expected: String },
    #[error("File selection cancelled")]
    SelectionCancelled,
    #[error("file prompt failed: {0}")]
    PromptFailed(#[source] std::io::Error),
    #[error("contract upload failed: {0}")]
    UploadFailed(#[source] ChainError),
    #[error("contract instantiation failed: {0}")]
    InstantiateFailed(#[source] ChainError),
    #[error("contract address not returned from instantiation (tx {transaction_hash})")]
    MissingContractAddress { transaction_hash: String },
    #[error("failed to save deployment record to {target}: {source}")]
    PersistenceFailed {
        target: String,
        #[source]
        source: BoxError,
    },
    #[error(transparent)]
    TransportError(#[from] ChainError),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl DeployError {
    /// whether the error aborts the deployment. a failed record save happens
    /// after the contract already exists on chain, so it never does
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DeployError::PersistenceFailed { .. })
    }
}

pub const GENERIC_HINTS: [&str; 4] = [
    "Check your network connection and that the rpc endpoint is reachable",
    "Check that the WASM artifact path is correct and the file is a compiled contract",
    "Check that the deployer account holds enough NTRN to pay for gas",
    "Try again later, the node may be temporarily unavailable",
];

/// troubleshooting hints for a fatal failure: hints specific to the error text
/// first, followed by the generic checklist
pub fn troubleshooting_hints(message: &str) -> Vec<&'static str> {
    let message = message.to_lowercase();
    let mut hints = vec![];

    if message.contains("insufficient funds") {
        hints.push("Not enough NTRN tokens for deployment, top up the deployer account");
    } else if message.contains("gas") {
        hints.push("Gas estimation failed, try again or configure a fixed gas limit");
    } else if message.contains("rejected") || message.contains("denied") {
        hints.push("Transaction or connection request was rejected by the user");
    }

    hints.extend(GENERIC_HINTS);
    hints
}
