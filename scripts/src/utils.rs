//! Utilities for the deploy scripts.

use std::{fs, path::Path, str::FromStr, sync::Arc, time::Duration};

use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
    transports::http::reqwest::Url,
};
use serde_json::{Map, Value};
use tracing::info;

use crate::{chain::AlloyChainClient, constants::DEPLOYMENTS_KEY, errors::ScriptError};

/// Sets up the chain client through which contracts are deployed, signing
/// with the given private key.
///
/// Returns the client along with the chain ID the RPC endpoint reports, which
/// must match `expected_chain_id` if one is given.
pub async fn setup_client(
    priv_key: &str,
    rpc_url: &str,
    expected_chain_id: Option<u64>,
    confirmations: u64,
    timeout: Duration,
) -> Result<(Arc<AlloyChainClient>, u64), ScriptError> {
    let url = Url::parse(rpc_url).map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let signer = PrivateKeySigner::from_str(priv_key)
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;
    let deployer = signer.address();

    let provider = DynProvider::new(ProviderBuilder::new().wallet(signer).connect_http(url));
    let chain_id = provider
        .get_chain_id()
        .await
        .map_err(|e| ScriptError::ClientInitialization(e.to_string()))?;

    if let Some(expected) = expected_chain_id {
        if chain_id != expected {
            return Err(ScriptError::ClientInitialization(format!(
                "{} reports chain ID {}, expected {}",
                rpc_url, chain_id, expected
            )));
        }
    }

    info!("Deploying from {:#x} on chain {}", deployer, chain_id);
    let client = AlloyChainClient::new(provider, confirmations, timeout);
    Ok((Arc::new(client), chain_id))
}

/// Read a JSON file
pub fn get_json_from_file(file_path: &Path) -> Result<Value, ScriptError> {
    let contents = fs::read_to_string(file_path)
        .map_err(|e| ScriptError::ReadDeployments(format!("{}: {}", file_path.display(), e)))?;

    serde_json::from_str(&contents).map_err(|e| ScriptError::ReadDeployments(e.to_string()))
}

/// Read the address recorded under `contract_key` in the deployments file,
/// if the file exists and has one
pub fn parse_addr_from_deployments_file(
    file_path: &Path,
    contract_key: &str,
) -> Result<Option<Address>, ScriptError> {
    if !file_path.exists() {
        return Ok(None);
    }

    let parsed_json = get_json_from_file(file_path)?;
    parsed_json[DEPLOYMENTS_KEY][contract_key]
        .as_str()
        .map(|addr| {
            Address::from_str(addr).map_err(|e| {
                ScriptError::ReadDeployments(format!("{} address {}: {}", contract_key, addr, e))
            })
        })
        .transpose()
}

/// Record a deployed contract's address under `contract_key` in the
/// deployments file, creating the file if it doesn't exist
pub fn write_deployed_address(
    file_path: &Path,
    contract_key: &str,
    address: Address,
) -> Result<(), ScriptError> {
    let mut parsed_json = if file_path.exists() {
        get_json_from_file(file_path)?
    } else {
        Value::Object(Map::new())
    };

    let deployments = parsed_json
        .as_object_mut()
        .ok_or_else(|| ScriptError::WriteDeployments("deployments file is not an object".into()))?
        .entry(DEPLOYMENTS_KEY)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| {
            ScriptError::WriteDeployments(format!("`{}` is not an object", DEPLOYMENTS_KEY))
        })?;
    deployments.insert(contract_key.to_string(), Value::String(format!("{address:#x}")));

    let contents = serde_json::to_string_pretty(&parsed_json)
        .map_err(|e| ScriptError::WriteDeployments(e.to_string()))?;
    fs::write(file_path, contents).map_err(|e| ScriptError::WriteDeployments(e.to_string()))
}
