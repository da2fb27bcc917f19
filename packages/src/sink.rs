use std::path::{Path, PathBuf};

use async_trait::async_trait;
use contract_types::{deploy_config::OutputConfig, deployment::DeploymentRecord};
use log::info;
use serde_json::{Map, Value};

use crate::error::{BoxError, DeployError};

const SINK: &str = "sink";

/// persists a finished deployment, returning where it went
#[async_trait]
pub trait ResultSink: Send + Sync {
    async fn save(&self, record: &DeploymentRecord) -> Result<String, DeployError>;
}

pub enum RecordSink {
    /// `deployment-<network>.json` inside `dir`
    File { dir: PathBuf, track_timestamp: bool },
    /// json object file holding one entry per key
    Store { path: PathBuf, key: String },
}

impl RecordSink {
    pub fn from_config(cfg: &OutputConfig) -> Self {
        match cfg {
            OutputConfig::File {
                dir,
                track_timestamp,
            } => RecordSink::File {
                dir: dir.clone(),
                track_timestamp: *track_timestamp,
            },
            OutputConfig::Store { path, key } => RecordSink::Store {
                path: path.clone(),
                key: key.clone(),
            },
        }
    }

    pub fn file_name(network: &str) -> String {
        format!("deployment-{network}.json")
    }
}

fn persistence_failed(target: &Path, source: impl Into<BoxError>) -> DeployError {
    DeployError::PersistenceFailed {
        target: target.display().to_string(),
        source: source.into(),
    }
}

async fn write_json(path: &Path, value: &impl serde::Serialize) -> Result<(), DeployError> {
    let content = serde_json::to_string_pretty(value).map_err(|e| persistence_failed(path, e))?;

    tokio::fs::write(path, content)
        .await
        .map_err(|e| persistence_failed(path, e))
}

/// existing store contents, an absent file is an empty store
async fn read_store(path: &Path) -> Result<Map<String, Value>, DeployError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(persistence_failed(path, e)),
    };

    if content.trim().is_empty() {
        return Ok(Map::new());
    }

    match serde_json::from_str(&content).map_err(|e| persistence_failed(path, e))? {
        Value::Object(entries) => Ok(entries),
        _ => Err(persistence_failed(path, "store file is not a json object")),
    }
}

#[async_trait]
impl ResultSink for RecordSink {
    async fn save(&self, record: &DeploymentRecord) -> Result<String, DeployError> {
        match self {
            RecordSink::File {
                dir,
                track_timestamp,
            } => {
                let path = dir.join(Self::file_name(record.network()));
                write_json(&path, &record.file_view(*track_timestamp)).await?;

                info!(target: SINK, "deployment record written to {}", path.display());
                Ok(path.display().to_string())
            }
            RecordSink::Store { path, key } => {
                let mut entries = read_store(path).await?;
                let entry =
                    serde_json::to_value(record.store_view()).map_err(|e| persistence_failed(path, e))?;
                entries.insert(key.clone(), entry);

                write_json(path, &entries).await?;

                info!(
                    target: SINK,
                    "deployment record stored under `{key}` in {}",
                    path.display()
                );
                Ok(format!("{}#{key}", path.display()))
            }
        }
    }
}
