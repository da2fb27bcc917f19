//! Upload + instantiate workflow for a single CosmWasm contract on Neutron

pub mod deployment;
mod phases;

pub use deployment::{BalanceCheck, DeployState, Deployment, DeploymentOutcome, Persistence};
