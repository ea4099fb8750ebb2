//! Implementations of the various deploy scripts

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use alloy::primitives::Address;
use tracing::{info, warn};

use crate::{
    artifacts::ArtifactStore,
    chain::ChainClient,
    config::DeployConfig,
    errors::ScriptError,
    orchestrator::ProxyAdoptionOrchestrator,
    plan::{DeploymentPlan, Module},
    types::{AdoptionReceipt, AdoptionRequest, ImplementationRef, ProxyRef},
    utils::{parse_addr_from_deployments_file, write_deployed_address},
};

/// The options shared by every command
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// The path of the deployment config file
    pub config_path: PathBuf,
    /// The Hardhat artifacts directory
    pub artifacts_dir: PathBuf,
    /// The file deployed addresses are recorded in
    pub deployments_path: PathBuf,
    /// Whether to read back the proxy's implementation after adoption
    pub verify: bool,
}

/// The outcome of deploying a module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleReport {
    /// The module deployed
    pub module: Module,
    /// The deployed contracts and their addresses, in deployment order
    pub deployed: Vec<(String, Address)>,
    /// The proxy adoption, if the module uses one
    pub adoption: Option<AdoptionReceipt>,
}

impl ModuleReport {
    /// The address the named contract was deployed at
    fn address_of(&self, name: &str) -> Result<Address, ScriptError> {
        self.deployed
            .iter()
            .find(|(deployed, _)| deployed == name)
            .map(|(_, address)| *address)
            .ok_or_else(|| {
                ScriptError::InvalidPlan(format!("{} was not deployed by {}", name, self.module))
            })
    }
}

/// Plan and deploy a module with the config and artifacts named in `opts`
pub async fn deploy(
    module: Module,
    client: Arc<impl ChainClient>,
    chain_id: u64,
    opts: &DeployOptions,
) -> Result<(), ScriptError> {
    let config = DeployConfig::load(&opts.config_path)?;
    let plan = module.plan(&config, chain_id)?;
    let artifacts = ArtifactStore::load(&opts.artifacts_dir, plan.contract_names())?;

    let report =
        deploy_module(&plan, &artifacts, client, opts.verify, &opts.deployments_path).await?;

    info!(
        "Deployed {} contract(s) for the {} module",
        report.deployed.len(),
        report.module
    );
    Ok(())
}

/// Deploy the contracts of a plan in order, recording each address in the
/// deployments file, then run the proxy adoption if the plan uses one.
///
/// Addresses are recorded as soon as each contract is confirmed, so a failed
/// adoption can be repaired without redeploying.
pub async fn deploy_module<C: ChainClient>(
    plan: &DeploymentPlan,
    artifacts: &ArtifactStore,
    client: Arc<C>,
    verify: bool,
    deployments_path: &Path,
) -> Result<ModuleReport, ScriptError> {
    plan.validate()?;

    let mut report = ModuleReport {
        module: plan.module,
        deployed: Vec::with_capacity(plan.contracts.len()),
        adoption: None,
    };

    for contract in &plan.contracts {
        // Contracts deployed earlier in the plan take precedence over the file
        let args = contract.resolve_args(|name| match report.address_of(name) {
            Ok(address) => Ok(Some(address)),
            Err(_) => parse_addr_from_deployments_file(deployments_path, name),
        })?;

        let artifact = artifacts.get(&contract.name)?;
        let values = artifact.constructor_values(&args)?;
        let address = client.deploy(&artifact.bytecode, &values).await.map_err(|source| {
            ScriptError::ContractDeployment {
                contract: contract.name.clone(),
                source,
            }
        })?;

        info!("{} ({}) deployed at {:#x}", contract.name, contract.kind, address);
        write_deployed_address(deployments_path, &contract.name, address)?;
        report.deployed.push((contract.name.clone(), address));
    }

    if let Some((implementation, proxy)) = plan.adoption_pair() {
        let proxy = ProxyRef {
            address: report.address_of(&proxy.name)?,
            slots: plan.slots.clone(),
        };
        let candidate = ImplementationRef {
            address: report.address_of(&implementation.name)?,
            kind: implementation.kind,
        };

        let orchestrator = ProxyAdoptionOrchestrator::new(client).with_verification(verify);
        report.adoption = Some(orchestrator.adopt(&proxy, &candidate).await?);
    }

    Ok(report)
}

/// Run the full handshake between an already-deployed proxy and
/// implementation
pub async fn adopt<C: ChainClient>(
    request: AdoptionRequest,
    client: Arc<C>,
    verify: bool,
) -> Result<AdoptionReceipt, ScriptError> {
    let orchestrator = ProxyAdoptionOrchestrator::new(client).with_verification(verify);
    Ok(orchestrator.adopt(&request.proxy, &request.candidate).await?)
}

/// Retry only the acceptance step for a proxy left partially nominated
pub async fn accept<C: ChainClient>(
    request: AdoptionRequest,
    client: Arc<C>,
    verify: bool,
) -> Result<AdoptionReceipt, ScriptError> {
    let orchestrator = ProxyAdoptionOrchestrator::new(client).with_verification(verify);
    Ok(orchestrator.accept(&request.proxy, &request.candidate).await?)
}

/// Log a proxy's pending and current implementations
pub async fn inspect<C: ChainClient>(
    proxy: ProxyRef,
    client: Arc<C>,
) -> Result<(), ScriptError> {
    let orchestrator = ProxyAdoptionOrchestrator::new(client);
    let state = orchestrator
        .observe(&proxy)
        .await
        .map_err(ScriptError::ContractInteraction)?;

    info!("Proxy {:#x}", proxy.address);
    info!("  current implementation: {:#x}", state.current);
    info!("  pending implementation: {:#x}", state.pending);
    if state.pending != Address::ZERO && state.pending != state.current {
        warn!("Proxy {:#x} is partially nominated, run `accept` to finish", proxy.address);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use alloy::{
        dyn_abi::DynSolValue,
        primitives::{address, U256},
    };
    use serde_json::json;

    use super::*;
    use crate::{
        artifacts::ContractArtifact,
        constants::{
            BOUND_VALIDATOR_CONTRACT, MAXIMILLION_CONTRACT, RESILIENT_ORACLE_CONTRACT,
            TWAP_ORACLE_CONTRACT, UAI_CONTRACT, UAI_VAULT_CONTRACT, UAI_VAULT_PROXY_CONTRACT,
            URT_CONTRACT, URT_CONVERTER_CONTRACT, URT_CONVERTER_PROXY_CONTRACT,
            UCORE_TOKEN_CONTRACT, VCORE_CONTRACT,
        },
        errors::{AdoptionError, ChainError},
        mock::MockChain,
    };

    /// The admin used in the test configs
    const ADMIN: Address = address!("00000000000000000000000000000000000000aa");

    /// An artifact with a constructor of the given parameter types
    fn artifact(name: &str, inputs: &[&str]) -> ContractArtifact {
        let inputs = inputs
            .iter()
            .enumerate()
            .map(|(i, ty)| json!({ "name": format!("arg{i}"), "type": ty, "internalType": ty }))
            .collect::<Vec<_>>();
        let abi = if inputs.is_empty() {
            json!([])
        } else {
            json!([{ "type": "constructor", "stateMutability": "nonpayable", "inputs": inputs }])
        };

        let json = json!({ "contractName": name, "abi": abi, "bytecode": "0x6080" });
        ContractArtifact::from_json(&json.to_string()).unwrap()
    }

    /// A config with every address a module may require set
    fn config() -> DeployConfig {
        let mut config = DeployConfig::new(ADMIN);
        config.wcore = Some(address!("00000000000000000000000000000000000000bb"));
        config.unitroller = Some(address!("00000000000000000000000000000000000000cc"));
        config
    }

    #[tokio::test]
    async fn test_deploy_adopting_module() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        let chain = Arc::new(MockChain::new());
        let artifacts = ArtifactStore::from_artifacts([
            artifact(UAI_VAULT_CONTRACT, &[]),
            artifact(UAI_VAULT_PROXY_CONTRACT, &[]),
        ]);

        let plan = Module::UaiVault.plan(&config(), 1116).unwrap();
        let report = deploy_module(&plan, &artifacts, chain.clone(), true, &path).await.unwrap();

        let implementation = report.address_of(UAI_VAULT_CONTRACT).unwrap();
        let proxy = report.address_of(UAI_VAULT_PROXY_CONTRACT).unwrap();
        let adoption = report.adoption.unwrap();
        assert!(adoption.verified);
        assert_eq!(adoption.proxy, proxy);
        assert_eq!(chain.proxy_state(proxy).current, implementation);

        assert_eq!(
            parse_addr_from_deployments_file(&path, UAI_VAULT_PROXY_CONTRACT).unwrap(),
            Some(proxy)
        );
    }

    #[tokio::test]
    async fn test_failed_adoption_keeps_deployments() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        let chain = Arc::new(MockChain::new());
        chain.fail_acceptances(ChainError::CallReverted("change not authorized".to_string()));
        let artifacts = ArtifactStore::from_artifacts([
            artifact(UAI_VAULT_CONTRACT, &[]),
            artifact(UAI_VAULT_PROXY_CONTRACT, &[]),
        ]);

        let plan = Module::UaiVault.plan(&config(), 1116).unwrap();
        let err = deploy_module(&plan, &artifacts, chain.clone(), true, &path).await.unwrap_err();
        assert!(matches!(err, ScriptError::Adoption(AdoptionError::AcceptanceFailed { .. })));

        // Both contracts are recorded, and the proxy holds the candidate pending
        let implementation = parse_addr_from_deployments_file(&path, UAI_VAULT_CONTRACT)
            .unwrap()
            .unwrap();
        let proxy = parse_addr_from_deployments_file(&path, UAI_VAULT_PROXY_CONTRACT)
            .unwrap()
            .unwrap();
        assert!(chain.proxy_state(proxy).is_pending(implementation));
    }

    #[tokio::test]
    async fn test_converter_proxy_receives_implementation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        let urt = address!("00000000000000000000000000000000000000d1");
        let ucore = address!("00000000000000000000000000000000000000d2");
        write_deployed_address(&path, URT_CONTRACT, urt).unwrap();
        write_deployed_address(&path, UCORE_TOKEN_CONTRACT, ucore).unwrap();

        let chain = Arc::new(MockChain::new());
        let artifacts = ArtifactStore::from_artifacts([
            artifact(URT_CONVERTER_CONTRACT, &[]),
            artifact(
                URT_CONVERTER_PROXY_CONTRACT,
                &["address", "address", "address", "uint256", "uint256", "uint256"],
            ),
        ]);

        let plan = Module::UrtConverter.plan(&config(), 1116).unwrap();
        let report = deploy_module(&plan, &artifacts, chain.clone(), true, &path).await.unwrap();
        assert!(report.adoption.is_some());

        let implementation = report.address_of(URT_CONVERTER_CONTRACT).unwrap();
        let deployments = chain.deployments();
        assert_eq!(
            deployments[1].args[..3],
            [
                DynSolValue::Address(implementation),
                DynSolValue::Address(urt),
                DynSolValue::Address(ucore)
            ]
        );
        assert_eq!(deployments[1].args[3], DynSolValue::Uint(U256::ZERO, 256));
    }

    #[tokio::test]
    async fn test_references_resolved_in_plan_and_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        let vcore = address!("00000000000000000000000000000000000000d3");
        let uai = address!("00000000000000000000000000000000000000d4");
        write_deployed_address(&path, VCORE_CONTRACT, vcore).unwrap();
        write_deployed_address(&path, UAI_CONTRACT, uai).unwrap();

        let chain = Arc::new(MockChain::new());
        let artifacts = ArtifactStore::from_artifacts([
            artifact(TWAP_ORACLE_CONTRACT, &["address"]),
            artifact(BOUND_VALIDATOR_CONTRACT, &[]),
            artifact(RESILIENT_ORACLE_CONTRACT, &["address", "address", "address"]),
        ]);

        let plan = Module::Oracle.plan(&config(), 1116).unwrap();
        let report = deploy_module(&plan, &artifacts, chain.clone(), true, &path).await.unwrap();
        assert!(report.adoption.is_none());
        assert_eq!(chain.call_count(crate::constants::BECOME_SIGNATURE), 0);

        let validator = report.address_of(BOUND_VALIDATOR_CONTRACT).unwrap();
        assert_eq!(
            chain.deployments()[2].args,
            vec![
                DynSolValue::Address(vcore),
                DynSolValue::Address(uai),
                DynSolValue::Address(validator)
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_reference() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        let chain = Arc::new(MockChain::new());
        let artifacts =
            ArtifactStore::from_artifacts([artifact(MAXIMILLION_CONTRACT, &["address"])]);

        let plan = Module::Maximillion.plan(&config(), 1116).unwrap();
        let err = deploy_module(&plan, &artifacts, chain.clone(), true, &path).await.unwrap_err();

        assert!(matches!(err, ScriptError::ReadDeployments(_)));
        assert!(chain.deployments().is_empty());
    }

    #[tokio::test]
    async fn test_deployment_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployments.json");
        let chain = Arc::new(MockChain::new());
        chain.fail_deployments(ChainError::DeploymentFailed("out of gas".to_string()));
        let artifacts = ArtifactStore::from_artifacts([
            artifact(UAI_VAULT_CONTRACT, &[]),
            artifact(UAI_VAULT_PROXY_CONTRACT, &[]),
        ]);

        let plan = Module::UaiVault.plan(&config(), 1116).unwrap();
        let err = deploy_module(&plan, &artifacts, chain.clone(), true, &path).await.unwrap_err();

        assert!(matches!(
            err,
            ScriptError::ContractDeployment { ref contract, .. } if contract == UAI_VAULT_CONTRACT
        ));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_accept_repairs_partial_nomination() {
        let chain = Arc::new(MockChain::new());
        let request = AdoptionRequest {
            candidate: ImplementationRef {
                address: chain.deploy_empty(),
                kind: crate::types::ContractKind::Controller,
            },
            proxy: ProxyRef {
                address: chain.deploy_empty(),
                slots: Module::UaiController.implementation_slots(),
            },
        };

        // A first attempt fails at acceptance
        chain.fail_acceptances(ChainError::Timeout(std::time::Duration::from_secs(1)));
        let err = adopt(request.clone(), chain.clone(), true).await.unwrap_err();
        assert!(matches!(err, ScriptError::Adoption(ref e) if e.is_partially_nominated()));

        // Once the chain recovers, acceptance alone completes the handover
        chain.clear_failures();
        let receipt = accept(request.clone(), chain.clone(), true).await.unwrap();
        assert!(receipt.nomination.is_none());
        assert_eq!(chain.call_count(crate::constants::SET_PENDING_IMPLEMENTATION_SIGNATURE), 1);
        assert_eq!(
            chain.proxy_state(request.proxy.address).current,
            request.candidate.address
        );
        inspect(request.proxy, chain).await.unwrap();
    }
}
