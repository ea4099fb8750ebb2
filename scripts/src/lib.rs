//! Scripts for deploying the protocol's upgradeable modules, and for handing
//! their proxies over to freshly deployed implementations.

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod artifacts;
pub mod chain;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod errors;
#[cfg(test)]
mod mock;
pub mod orchestrator;
pub mod plan;
mod solidity;
pub mod types;
pub mod utils;
