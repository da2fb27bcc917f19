//! Building blocks for deploying CosmWasm contracts to Neutron
//!
//! This crate contains:
//! - Wallet providers (mnemonic derived keys and signer extensions)
//! - Contract artifact loaders
//! - A signing chain client over Tendermint RPC
//! - Deployment record sinks
//! - Error types and logging setup

pub mod artifact;
pub mod chain;
pub mod error;
pub mod sink;
pub mod utils;
pub mod wallet;
