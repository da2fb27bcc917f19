use contract_types::deployment::DeploymentRecord;
use log::{info, warn};

use crate::deployment::{Deployment, Persistence};

const PERSIST_PHASE: &str = "persist";

impl Deployment<'_> {
    /// the contract already exists on chain at this point, so a failed save
    /// is reported rather than propagated
    pub(crate) async fn persist(&self, record: &DeploymentRecord) -> Persistence {
        match self.sink.save(record).await {
            Ok(target) => {
                info!(target: PERSIST_PHASE, "deployment info saved to {target}");
                Persistence::Saved(target)
            }
            Err(e) => {
                warn!(target: PERSIST_PHASE, "{e}");
                Persistence::Failed(e)
            }
        }
    }
}
