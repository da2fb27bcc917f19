use contract_types::deployment::{InstantiateOptions, InstantiateResult};
use log::info;
use packages::{chain::ChainClient, error::DeployError};

use crate::deployment::Deployment;

const INSTANTIATE_PHASE: &str = "instantiate";

impl Deployment<'_> {
    pub(crate) async fn instantiate(
        &self,
        client: &dyn ChainClient,
        sender: &str,
        code_id: u64,
    ) -> Result<InstantiateResult, DeployError> {
        let contract = &self.cfg.contract;
        let init_msg = contract
            .init_msg_json()
            .map_err(|e| DeployError::Config(e.to_string()))?;

        let options = InstantiateOptions {
            admin: contract.admin_for(sender),
            memo: contract.instantiate_memo.clone(),
        };

        info!(
            target: INSTANTIATE_PHASE,
            "instantiating code id {code_id} as `{}`", contract.label
        );

        let result = client
            .instantiate(sender, code_id, &init_msg, &contract.label, contract.fee, &options)
            .await
            .map_err(DeployError::InstantiateFailed)?;

        if result.contract_address.trim().is_empty() {
            return Err(DeployError::MissingContractAddress {
                transaction_hash: result.transaction_hash,
            });
        }

        info!(
            target: INSTANTIATE_PHASE,
            "contract instantiated at {} (tx {})", result.contract_address, result.transaction_hash
        );

        Ok(result)
    }
}
