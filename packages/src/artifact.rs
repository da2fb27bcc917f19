use std::{
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use contract_types::{deploy_config::ArtifactConfig, deployment::ContractArtifact};
use log::info;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::DeployError;

const ARTIFACT: &str = "artifact";

/// produces the contract bytecode to deploy
#[async_trait]
pub trait ArtifactLoader: Send + Sync {
    async fn load(&self) -> Result<ContractArtifact, DeployError>;
}

/// interactive file selection, `Ok(None)` when the user cancels
#[async_trait]
pub trait FilePrompt: Send + Sync {
    async fn pick(&self, accept: &str) -> io::Result<Option<PathBuf>>;
}

/// asks for a path on the terminal, an empty line or eof cancels
pub struct StdinPrompt;

#[async_trait]
impl FilePrompt for StdinPrompt {
    async fn pick(&self, accept: &str) -> io::Result<Option<PathBuf>> {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(format!("path to a .{accept} file (empty to cancel): ").as_bytes())
            .await?;
        stdout.flush().await?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }
        Ok(Some(PathBuf::from(line)))
    }
}

pub enum ArtifactSource {
    Path(PathBuf),
    Interactive {
        prompt: Box<dyn FilePrompt>,
        extension: String,
    },
}

impl ArtifactSource {
    pub fn from_config(cfg: &ArtifactConfig, prompt: Box<dyn FilePrompt>) -> Self {
        match cfg {
            ArtifactConfig::Path { path } => ArtifactSource::Path(path.clone()),
            ArtifactConfig::Interactive { extension } => ArtifactSource::Interactive {
                prompt,
                extension: extension.clone(),
            },
        }
    }
}

#[async_trait]
impl ArtifactLoader for ArtifactSource {
    async fn load(&self) -> Result<ContractArtifact, DeployError> {
        match self {
            ArtifactSource::Path(path) => read_artifact(path).await,
            ArtifactSource::Interactive { prompt, extension } => {
                let path = prompt
                    .pick(extension)
                    .await
                    .map_err(DeployError::PromptFailed)?
                    .ok_or(DeployError::SelectionCancelled)?;

                if !has_extension(&path, extension) {
                    return Err(DeployError::InvalidArtifactType {
                        name: path
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_else(|| path.display().to_string()),
                        expected: extension.clone(),
                    });
                }

                read_artifact(&path).await
            }
        }
    }
}

fn has_extension(path: &Path, expected: &str) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with(&format!(".{expected}")))
        .unwrap_or(false)
}

async fn read_artifact(path: &Path) -> Result<ContractArtifact, DeployError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| DeployError::ArtifactNotFound {
            path: path.to_path_buf(),
            source,
        })?;

    let artifact = ContractArtifact::new(bytes).ok_or(DeployError::EmptyArtifact)?;
    info!(
        target: ARTIFACT,
        "loaded {} ({} bytes)",
        path.display(),
        artifact.len()
    );

    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::*;

    struct ScriptedPrompt(Option<PathBuf>);

    #[async_trait]
    impl FilePrompt for ScriptedPrompt {
        async fn pick(&self, accept: &str) -> io::Result<Option<PathBuf>> {
            assert_eq!(accept, "wasm");
            Ok(self.0.clone())
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("artifact-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn interactive(path: Option<PathBuf>) -> ArtifactSource {
        ArtifactSource::Interactive {
            prompt: Box::new(ScriptedPrompt(path)),
            extension: "wasm".to_string(),
        }
    }

    #[tokio::test]
    async fn reads_artifact_from_path() {
        let dir = scratch_dir("path");
        let wasm = dir.join("contract.wasm");
        fs::write(&wasm, vec![0u8; 120]).unwrap();

        let artifact = ArtifactSource::Path(wasm).load().await.unwrap();
        assert_eq!(artifact.len(), 120);

        fs::remove_dir_all(dir).unwrap();
    }

    #[tokio::test]
    async fn missing_path_is_not_found() {
        let err = ArtifactSource::Path(PathBuf::from("does/not/exist.wasm"))
            .load()
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::ArtifactNotFound { .. }));
        assert!(err.to_string().contains("does/not/exist.wasm"));
    }

    #[tokio::test]
    async fn empty_file_is_rejected() {
        let dir = scratch_dir("empty");
        let wasm = dir.join("empty.wasm");
        fs::write(&wasm, []).unwrap();

        let err = ArtifactSource::Path(wasm.clone()).load().await.unwrap_err();
        assert!(matches!(err, DeployError::EmptyArtifact));

        let err = interactive(Some(wasm)).load().await.unwrap_err();
        assert!(matches!(err, DeployError::EmptyArtifact));

        fs::remove_dir_all(dir).unwrap();
    }

    struct BrokenPrompt;

    #[async_trait]
    impl FilePrompt for BrokenPrompt {
        async fn pick(&self, _accept: &str) -> io::Result<Option<PathBuf>> {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"))
        }
    }

    #[tokio::test]
    async fn prompt_io_error_is_not_a_config_error() {
        let source = ArtifactSource::Interactive {
            prompt: Box::new(BrokenPrompt),
            extension: "wasm".to_string(),
        };

        let err = source.load().await.unwrap_err();
        assert!(matches!(
            err,
            DeployError::PromptFailed(ref e) if e.kind() == io::ErrorKind::UnexpectedEof
        ));
        assert!(!err.to_string().contains("invalid configuration"));
    }

    #[tokio::test]
    async fn cancelled_selection() {
        let err = interactive(None).load().await.unwrap_err();
        assert!(matches!(err, DeployError::SelectionCancelled));
    }

    #[tokio::test]
    async fn wrong_extension_is_rejected_before_reading() {
        let err = interactive(Some(PathBuf::from("not/read/contract.txt")))
            .load()
            .await
            .unwrap_err();

        match err {
            DeployError::InvalidArtifactType { name, expected } => {
                assert_eq!(name, "contract.txt");
                assert_eq!(expected, "wasm");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn interactive_pick_reads_selected_file() {
        let dir = scratch_dir("pick");
        let wasm = dir.join("picked.wasm");
        fs::write(&wasm, b"\0asm\x01\0\0\0").unwrap();

        let artifact = interactive(Some(wasm)).load().await.unwrap();
        assert_eq!(&artifact.bytes()[..4], b"\0asm");

        fs::remove_dir_all(dir).unwrap();
    }
}
