//! Definitions of CLI arguments and commands for deploy scripts

use std::{path::PathBuf, sync::Arc, time::Duration};

use alloy::primitives::Address;
use clap::{Args, Parser, Subcommand};

use crate::{
    chain::ChainClient,
    commands::{accept, adopt, deploy, inspect, DeployOptions},
    config::Network,
    constants::{
        DEFAULT_ARTIFACTS_DIR, DEFAULT_CONFIG_PATH, DEFAULT_CONFIRMATIONS,
        DEFAULT_CONFIRMATION_TIMEOUT_SECS, PRIVATE_KEY_ENV_VAR,
    },
    errors::ScriptError,
    plan::Module,
    types::{AdoptionRequest, ContractKind, ImplementationRef, ImplementationSlots, ProxyRef},
};

/// Deploy the protocol's modules and hand their proxies over to their
/// implementations
#[derive(Parser)]
pub struct Cli {
    /// Private key of the deployer
    #[arg(short, long, env = PRIVATE_KEY_ENV_VAR, hide_env_values = true)]
    pub priv_key: String,

    /// The network to deploy to
    #[arg(short, long, default_value_t = Network::Localhost)]
    pub network: Network,

    /// Network RPC URL, overriding the network's default endpoint
    #[arg(short, long)]
    pub rpc_url: Option<String>,

    /// Path to the deployment config file
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Path to the Hardhat artifacts directory
    #[arg(short, long, default_value = DEFAULT_ARTIFACTS_DIR)]
    pub artifacts: PathBuf,

    /// Path to the file deployed addresses are recorded in, defaults to
    /// `deployments.<network>.json`
    #[arg(short, long)]
    pub deployments_path: Option<PathBuf>,

    /// Skip reading back the proxy's implementation after adoption
    #[arg(long)]
    pub no_verify: bool,

    /// The number of confirmations to wait for on each transaction
    #[arg(long, default_value_t = DEFAULT_CONFIRMATIONS)]
    pub confirmations: u64,

    /// How long to wait for each transaction to be confirmed, in seconds
    #[arg(long, default_value_t = DEFAULT_CONFIRMATION_TIMEOUT_SECS)]
    pub confirmation_timeout: u64,

    /// The command to run
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// The RPC URL to connect to
    pub fn rpc_url(&self) -> String {
        self.rpc_url
            .clone()
            .unwrap_or_else(|| self.network.profile().rpc_url.to_string())
    }

    /// The chain ID the RPC endpoint must report, unless the URL was
    /// overridden
    pub fn expected_chain_id(&self) -> Option<u64> {
        match self.rpc_url {
            Some(_) => None,
            None => self.network.profile().chain_id,
        }
    }

    /// The confirmation timeout for each transaction
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout)
    }

    /// The options passed to every command
    pub fn deploy_options(&self) -> DeployOptions {
        DeployOptions {
            config_path: self.config.clone(),
            artifacts_dir: self.artifacts.clone(),
            deployments_path: self
                .deployments_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("deployments.{}.json", self.network))),
            verify: !self.no_verify,
        }
    }
}

/// The deploy scripts
#[derive(Subcommand)]
pub enum Command {
    /// Deploy the lens
    DeployLens,
    /// Deploy the UCORE token
    DeployUcoreToken,
    /// Deploy the UAI stablecoin
    DeployUai,
    /// Deploy the URT token
    DeployUrt,
    /// Deploy the jump rate interest model
    DeployInterestModel,
    /// Deploy the vCORE market
    DeployVcore,
    /// Deploy the UAI vault and have its proxy adopt it
    DeployUaiVault,
    /// Deploy the UCORE vault and have its proxy adopt it
    DeployUcoreVault,
    /// Deploy the URT vault behind its proxy
    DeployUrtVault,
    /// Deploy the Maximillion repayment helper
    DeployMaximillion,
    /// Deploy the UCORE store
    DeployUcoreStore,
    /// Deploy the UAI controller and have its unitroller adopt it
    DeployUaiController,
    /// Deploy the governance timelock
    DeployTimelock,
    /// Deploy the governor behind its delegator
    DeployGovernor,
    /// Deploy the URT converter and have its proxy adopt it
    DeployUrtConverter,
    /// Deploy the TWAP, bound validator and resilient oracles
    DeployOracle,
    /// Hand an already-deployed proxy over to an implementation
    Adopt(AdoptArgs),
    /// Finish a handover whose acceptance step failed
    Accept(AdoptArgs),
    /// Show a proxy's pending and current implementations
    Inspect(InspectArgs),
}

impl Command {
    /// Run the command against the given chain
    pub async fn run(
        self,
        client: Arc<impl ChainClient>,
        chain_id: u64,
        opts: &DeployOptions,
    ) -> Result<(), ScriptError> {
        let module = match self {
            Command::DeployLens => Module::Lens,
            Command::DeployUcoreToken => Module::UcoreToken,
            Command::DeployUai => Module::Uai,
            Command::DeployUrt => Module::Urt,
            Command::DeployInterestModel => Module::InterestModel,
            Command::DeployVcore => Module::Vcore,
            Command::DeployUaiVault => Module::UaiVault,
            Command::DeployUcoreVault => Module::UcoreVault,
            Command::DeployUrtVault => Module::UrtVault,
            Command::DeployMaximillion => Module::Maximillion,
            Command::DeployUcoreStore => Module::UcoreStore,
            Command::DeployUaiController => Module::UaiController,
            Command::DeployTimelock => Module::Timelock,
            Command::DeployGovernor => Module::Governor,
            Command::DeployUrtConverter => Module::UrtConverter,
            Command::DeployOracle => Module::Oracle,
            Command::Adopt(args) => {
                return adopt(args.request(), client, opts.verify).await.map(|_| ());
            }
            Command::Accept(args) => {
                return accept(args.request(), client, opts.verify).await.map(|_| ());
            }
            Command::Inspect(args) => return inspect(args.proxy.target(), client).await,
        };

        deploy(module, client, chain_id, opts).await
    }
}

/// Identify a proxy and the getters exposing its implementation pointers
#[derive(Args, Clone)]
pub struct ProxyArgs {
    /// Address of the proxy contract
    #[arg(long)]
    pub proxy: Address,

    /// The module the proxy belongs to, selecting its implementation getters
    #[arg(short, long)]
    pub module: Option<Module>,

    /// Signature of the proxy's current implementation getter, overriding
    /// the module's
    #[arg(long)]
    pub implementation_getter: Option<String>,

    /// Signature of the proxy's pending implementation getter, overriding
    /// the module's
    #[arg(long)]
    pub pending_implementation_getter: Option<String>,
}

impl ProxyArgs {
    /// The proxy these arguments identify
    pub fn target(&self) -> ProxyRef {
        let defaults = self
            .module
            .map(|m| m.implementation_slots())
            .unwrap_or_default();

        ProxyRef {
            address: self.proxy,
            slots: ImplementationSlots {
                current: self.implementation_getter.clone().unwrap_or(defaults.current),
                pending: self
                    .pending_implementation_getter
                    .clone()
                    .unwrap_or(defaults.pending),
            },
        }
    }
}

/// Hand a proxy over to an implementation
#[derive(Args, Clone)]
pub struct AdoptArgs {
    /// The proxy being handed over
    #[command(flatten)]
    pub proxy: ProxyArgs,

    /// Address of the implementation contract
    #[arg(short, long)]
    pub implementation: Address,

    /// The kind of module the implementation provides
    #[arg(short, long, default_value_t = ContractKind::Vault)]
    pub kind: ContractKind,
}

impl AdoptArgs {
    /// The proxy and implementation these arguments identify
    pub fn request(&self) -> AdoptionRequest {
        AdoptionRequest {
            proxy: self.proxy.target(),
            candidate: ImplementationRef {
                address: self.implementation,
                kind: self.kind,
            },
        }
    }
}

/// Show a proxy's implementation pointers
#[derive(Args, Clone)]
pub struct InspectArgs {
    /// The proxy to inspect
    #[command(flatten)]
    pub proxy: ProxyArgs,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;
    use crate::constants::{
        DEFAULT_PENDING_IMPLEMENTATION_GETTER, UAI_VAULT_IMPLEMENTATION_GETTER,
        UAI_VAULT_PENDING_IMPLEMENTATION_GETTER,
    };

    /// Parse a command line, with a dummy private key
    fn parse(args: &[&str]) -> Cli {
        let argv = ["unity-deploy", "--priv-key", "0x01"].iter().chain(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_network_defaults() {
        let cli = parse(&["--network", "testnet", "deploy-uai-vault"]);
        assert_eq!(cli.rpc_url(), "https://rpc.test.btcs.network");
        assert_eq!(cli.expected_chain_id(), Some(1115));
        assert!(matches!(cli.command, Command::DeployUaiVault));

        let opts = cli.deploy_options();
        assert_eq!(opts.deployments_path, PathBuf::from("deployments.testnet.json"));
        assert!(opts.verify);
    }

    #[test]
    fn test_rpc_override_skips_chain_check() {
        let cli = parse(&["--rpc-url", "http://localhost:9000", "--no-verify", "deploy-oracle"]);
        assert_eq!(cli.rpc_url(), "http://localhost:9000");
        assert_eq!(cli.expected_chain_id(), None);
        assert!(!cli.deploy_options().verify);
    }

    #[test]
    fn test_adopt_getters() {
        let cli = parse(&[
            "adopt",
            "--proxy",
            "0x00000000000000000000000000000000000000bb",
            "--implementation",
            "0x00000000000000000000000000000000000000aa",
            "--module",
            "uai-vault",
        ]);
        let Command::Adopt(args) = cli.command else {
            panic!("expected adopt command");
        };

        let AdoptionRequest { proxy, candidate } = args.request();
        assert_eq!(candidate.address, Address::with_last_byte(0xaa));
        assert_eq!(candidate.kind, ContractKind::Vault);
        assert_eq!(proxy.address, Address::with_last_byte(0xbb));
        assert_eq!(proxy.slots.current, UAI_VAULT_IMPLEMENTATION_GETTER);
        assert_eq!(proxy.slots.pending, UAI_VAULT_PENDING_IMPLEMENTATION_GETTER);
    }

    #[test]
    fn test_getter_override() {
        let cli = parse(&[
            "inspect",
            "--proxy",
            "0x00000000000000000000000000000000000000bb",
            "--implementation-getter",
            "comptrollerImplementation()",
        ]);
        let Command::Inspect(args) = cli.command else {
            panic!("expected inspect command");
        };

        let proxy = args.proxy.target();
        assert_eq!(proxy.slots.current, "comptrollerImplementation()");
        assert_eq!(proxy.slots.pending, DEFAULT_PENDING_IMPLEMENTATION_GETTER);
    }
}
