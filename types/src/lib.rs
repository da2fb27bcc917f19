//! Configuration and data model for the neutron contract deployer
//!
//! This crate contains:
//! - Network, wallet, artifact, output and contract configuration
//! - Gas price and fee mode types
//! - Upload / instantiate results and the persisted deployment record

pub mod deploy_config;
pub mod deployment;
pub mod neutron_config;
