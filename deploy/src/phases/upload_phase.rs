use contract_types::deployment::{ContractArtifact, UploadResult};
use log::info;
use packages::{chain::ChainClient, error::DeployError};

use crate::deployment::Deployment;

const UPLOAD_PHASE: &str = "upload";

impl Deployment<'_> {
    pub(crate) async fn upload(
        &self,
        client: &dyn ChainClient,
        sender: &str,
        artifact: &ContractArtifact,
    ) -> Result<UploadResult, DeployError> {
        info!(target: UPLOAD_PHASE, "uploading contract ({} bytes)", artifact.len());

        let contract = &self.cfg.contract;
        let result = client
            .upload(sender, artifact, contract.fee, contract.upload_memo.as_deref())
            .await
            .map_err(DeployError::UploadFailed)?;

        info!(
            target: UPLOAD_PHASE,
            "stored code id {} (tx {}, checksum {})",
            result.code_id,
            result.transaction_hash,
            result.checksum
        );

        Ok(result)
    }
}
