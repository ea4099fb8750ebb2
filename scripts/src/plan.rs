//! Deployment plans: the ordered contracts each module deploys, and their
//! constructor arguments

use std::{
    collections::HashSet,
    fmt::{self, Display},
};

use alloy::primitives::{Address, U256};
use clap::ValueEnum;
use itertools::Itertools;

use crate::{
    config::DeployConfig,
    constants::{
        BOUND_VALIDATOR_CONTRACT, DEFAULT_IMPLEMENTATION_GETTER,
        DEFAULT_PENDING_IMPLEMENTATION_GETTER, GOVERNOR_DELEGATE_CONTRACT,
        GOVERNOR_DELEGATOR_CONTRACT, JUMP_RATE_MODEL_CONTRACT, LENS_CONTRACT, MAXIMILLION_CONTRACT,
        RESILIENT_ORACLE_CONTRACT, TIMELOCK_CONTRACT, TWAP_ORACLE_CONTRACT,
        UAI_CONTRACT, UAI_CONTROLLER_CONTRACT, UAI_CONTROLLER_IMPLEMENTATION_GETTER,
        UAI_CONTROLLER_PENDING_IMPLEMENTATION_GETTER, UAI_UNITROLLER_CONTRACT, UAI_VAULT_CONTRACT,
        UAI_VAULT_IMPLEMENTATION_GETTER, UAI_VAULT_PENDING_IMPLEMENTATION_GETTER,
        UAI_VAULT_PROXY_CONTRACT, UCORE_STORE_CONTRACT, UCORE_TOKEN_CONTRACT,
        UCORE_VAULT_CONTRACT, UCORE_VAULT_PENDING_IMPLEMENTATION_GETTER,
        UCORE_VAULT_PROXY_CONTRACT, URT_CONTRACT, URT_CONVERTER_CONTRACT,
        URT_CONVERTER_PROXY_CONTRACT, URT_VAULT_CONTRACT, URT_VAULT_PROXY_CONTRACT,
        VCORE_CONTRACT,
    },
    errors::ScriptError,
    types::{ContractKind, ContractRole, ImplementationSlots},
};

// -------------------------
// | Constructor Arguments |
// -------------------------

/// A constructor argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorArg {
    /// A fixed address
    Address(Address),
    /// An unsigned integer, typed by the constructor ABI
    Integer(U256),
    /// A string
    String(String),
    /// The address of the named contract, deployed earlier in the same plan
    /// or by a previous module
    Deployed(String),
}

impl ConstructorArg {
    /// A reference to the named contract's deployed address
    pub fn deployed(name: &str) -> Self {
        ConstructorArg::Deployed(name.to_string())
    }

    /// The given address if set, otherwise a reference to the named
    /// contract's deployed address
    pub fn address_or_deployed(address: Option<Address>, name: &str) -> Self {
        address.map_or_else(|| Self::deployed(name), ConstructorArg::Address)
    }
}

impl From<Address> for ConstructorArg {
    fn from(address: Address) -> Self {
        ConstructorArg::Address(address)
    }
}

impl From<U256> for ConstructorArg {
    fn from(value: U256) -> Self {
        ConstructorArg::Integer(value)
    }
}

impl From<u64> for ConstructorArg {
    fn from(value: u64) -> Self {
        ConstructorArg::Integer(U256::from(value))
    }
}

impl From<&str> for ConstructorArg {
    fn from(s: &str) -> Self {
        ConstructorArg::String(s.to_string())
    }
}

impl Display for ConstructorArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstructorArg::Address(address) => write!(f, "address {:#x}", address),
            ConstructorArg::Integer(value) => write!(f, "integer {}", value),
            ConstructorArg::String(s) => write!(f, "string {:?}", s),
            ConstructorArg::Deployed(name) => write!(f, "address of {}", name),
        }
    }
}

// ------------------------
// | Contract Deployments |
// ------------------------

/// A single contract deployed as part of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDeployment {
    /// The contract name, as in its compilation artifact
    pub name: String,
    /// The kind of module the contract belongs to
    pub kind: ContractKind,
    /// The part the contract plays in the deployment
    pub role: ContractRole,
    /// The constructor arguments
    pub args: Vec<ConstructorArg>,
}

impl ContractDeployment {
    /// A contract with no proxy relationship
    pub fn standalone(name: &str, kind: ContractKind, args: Vec<ConstructorArg>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            role: ContractRole::Standalone,
            args,
        }
    }

    /// A logic contract, deployed without constructor arguments
    pub fn implementation(name: &str, kind: ContractKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            role: ContractRole::Implementation,
            args: vec![],
        }
    }

    /// A proxy contract
    pub fn proxy(name: &str, kind: ContractKind, args: Vec<ConstructorArg>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            role: ContractRole::Proxy,
            args,
        }
    }

    /// The contracts this deployment's constructor references
    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.args.iter().filter_map(|arg| match arg {
            ConstructorArg::Deployed(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Replace references to deployed contracts with their addresses
    pub fn resolve_args<F>(&self, lookup: F) -> Result<Vec<ConstructorArg>, ScriptError>
    where
        F: Fn(&str) -> Result<Option<Address>, ScriptError>,
    {
        self.args
            .iter()
            .map(|arg| match arg {
                ConstructorArg::Deployed(name) => lookup(name)?
                    .map(ConstructorArg::Address)
                    .ok_or_else(|| {
                        ScriptError::ReadDeployments(format!(
                            "{} constructor needs {}, which is neither configured nor deployed",
                            self.name, name
                        ))
                    }),
                arg => Ok(arg.clone()),
            })
            .collect()
    }
}

// -----------
// | Modules |
// -----------

/// The modules the scripts can deploy
#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Module {
    /// The lens, aggregating protocol reads
    Lens,
    /// The UCORE governance token
    UcoreToken,
    /// The UAI stablecoin
    Uai,
    /// The URT reward token
    Urt,
    /// The jump rate interest model
    InterestModel,
    /// The vCORE market
    Vcore,
    /// The UAI vault and its proxy
    UaiVault,
    /// The UCORE vault and its proxy
    UcoreVault,
    /// The URT vault and its proxy
    UrtVault,
    /// The Maximillion repayment helper
    Maximillion,
    /// The UCORE store
    UcoreStore,
    /// The UAI controller and its unitroller
    UaiController,
    /// The governance timelock
    Timelock,
    /// The governor and its delegator
    Governor,
    /// The URT converter and its proxy
    UrtConverter,
    /// The TWAP oracle, bound validator and resilient oracle
    Oracle,
}

impl Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Module::Lens => write!(f, "lens"),
            Module::UcoreToken => write!(f, "ucore-token"),
            Module::Uai => write!(f, "uai"),
            Module::Urt => write!(f, "urt"),
            Module::InterestModel => write!(f, "interest-model"),
            Module::Vcore => write!(f, "vcore"),
            Module::UaiVault => write!(f, "uai-vault"),
            Module::UcoreVault => write!(f, "ucore-vault"),
            Module::UrtVault => write!(f, "urt-vault"),
            Module::Maximillion => write!(f, "maximillion"),
            Module::UcoreStore => write!(f, "ucore-store"),
            Module::UaiController => write!(f, "uai-controller"),
            Module::Timelock => write!(f, "timelock"),
            Module::Governor => write!(f, "governor"),
            Module::UrtConverter => write!(f, "urt-converter"),
            Module::Oracle => write!(f, "oracle"),
        }
    }
}

impl Module {
    /// The getters through which the module's proxy exposes its
    /// implementation pointers
    pub fn implementation_slots(&self) -> ImplementationSlots {
        match self {
            Module::UaiVault => ImplementationSlots::new(
                UAI_VAULT_IMPLEMENTATION_GETTER,
                UAI_VAULT_PENDING_IMPLEMENTATION_GETTER,
            ),
            Module::UcoreVault => ImplementationSlots::new(
                DEFAULT_IMPLEMENTATION_GETTER,
                UCORE_VAULT_PENDING_IMPLEMENTATION_GETTER,
            ),
            Module::UaiController => ImplementationSlots::new(
                UAI_CONTROLLER_IMPLEMENTATION_GETTER,
                UAI_CONTROLLER_PENDING_IMPLEMENTATION_GETTER,
            ),
            _ => ImplementationSlots::new(
                DEFAULT_IMPLEMENTATION_GETTER,
                DEFAULT_PENDING_IMPLEMENTATION_GETTER,
            ),
        }
    }

    /// Build the module's deployment plan from the config.
    ///
    /// `chain_id` is the ID of the chain being deployed to, which the UAI
    /// token commits to for its permit signatures.
    pub fn plan(
        &self,
        config: &DeployConfig,
        chain_id: u64,
    ) -> Result<DeploymentPlan, ScriptError> {
        use ConstructorArg as Arg;
        use ContractDeployment as Contract;

        let admin = Arg::Address(config.admin);
        let (contracts, uses_proxy_adoption) = match self {
            Module::Lens => (
                vec![Contract::standalone(LENS_CONTRACT, ContractKind::Periphery, vec![])],
                false,
            ),
            Module::UcoreToken => (
                vec![Contract::standalone(UCORE_TOKEN_CONTRACT, ContractKind::Token, vec![admin])],
                false,
            ),
            Module::Uai => (
                vec![Contract::standalone(
                    UAI_CONTRACT,
                    ContractKind::Token,
                    vec![chain_id.into()],
                )],
                false,
            ),
            Module::Urt => (
                vec![Contract::standalone(URT_CONTRACT, ContractKind::Token, vec![admin])],
                false,
            ),
            Module::InterestModel => {
                let params = &config.jump_rate_model;
                let args = vec![
                    params.base_rate_per_year.into(),
                    params.multiplier_per_year.into(),
                    params.jump_multiplier_per_year.into(),
                    params.kink.into(),
                ];
                (
                    vec![Contract::standalone(
                        JUMP_RATE_MODEL_CONTRACT,
                        ContractKind::InterestRateModel,
                        args,
                    )],
                    false,
                )
            }
            Module::Vcore => {
                let market = &config.vcore_market;
                let args = vec![
                    required(config.unitroller, "unitroller", *self)?.into(),
                    Arg::address_or_deployed(config.interest_rate_model, JUMP_RATE_MODEL_CONTRACT),
                    market.initial_exchange_rate_mantissa.into(),
                    market.name.as_str().into(),
                    market.symbol.as_str().into(),
                    market.decimals.into(),
                    admin,
                ];
                (
                    vec![Contract::standalone(VCORE_CONTRACT, ContractKind::Market, args)],
                    false,
                )
            }
            Module::UaiVault => (
                vec![
                    Contract::implementation(UAI_VAULT_CONTRACT, ContractKind::Vault),
                    Contract::proxy(UAI_VAULT_PROXY_CONTRACT, ContractKind::Vault, vec![]),
                ],
                true,
            ),
            Module::UcoreVault => (
                vec![
                    Contract::implementation(UCORE_VAULT_CONTRACT, ContractKind::Vault),
                    Contract::proxy(UCORE_VAULT_PROXY_CONTRACT, ContractKind::Vault, vec![]),
                ],
                true,
            ),
            Module::UrtVault => {
                // The URT vault proxy takes its implementation in its
                // constructor, so no handshake is needed
                let args = vec![
                    Arg::deployed(URT_VAULT_CONTRACT),
                    Arg::address_or_deployed(config.urt, URT_CONTRACT),
                    config.urt_vault.urt_per_block.into(),
                ];
                (
                    vec![
                        Contract::implementation(URT_VAULT_CONTRACT, ContractKind::Vault),
                        Contract::proxy(URT_VAULT_PROXY_CONTRACT, ContractKind::Vault, args),
                    ],
                    false,
                )
            }
            Module::Maximillion => (
                vec![Contract::standalone(
                    MAXIMILLION_CONTRACT,
                    ContractKind::Periphery,
                    vec![Arg::address_or_deployed(config.vcore, VCORE_CONTRACT)],
                )],
                false,
            ),
            Module::UcoreStore => (
                vec![Contract::standalone(UCORE_STORE_CONTRACT, ContractKind::Periphery, vec![])],
                false,
            ),
            Module::UaiController => (
                vec![
                    Contract::implementation(UAI_CONTROLLER_CONTRACT, ContractKind::Controller),
                    Contract::proxy(UAI_UNITROLLER_CONTRACT, ContractKind::Controller, vec![]),
                ],
                true,
            ),
            Module::Timelock => (
                vec![Contract::standalone(
                    TIMELOCK_CONTRACT,
                    ContractKind::Timelock,
                    vec![admin, config.timelock_params.delay.into()],
                )],
                false,
            ),
            Module::Governor => {
                let governor = &config.governor;
                let args = vec![
                    Arg::address_or_deployed(config.timelock, TIMELOCK_CONTRACT),
                    Arg::address_or_deployed(config.ucore_vault, UCORE_VAULT_PROXY_CONTRACT),
                    admin,
                    Arg::deployed(GOVERNOR_DELEGATE_CONTRACT),
                    governor.voting_period.into(),
                    governor.voting_delay.into(),
                    governor.proposal_threshold.into(),
                    Arg::Address(governor.guardian.unwrap_or(config.admin)),
                ];
                (
                    vec![
                        Contract::implementation(
                            GOVERNOR_DELEGATE_CONTRACT,
                            ContractKind::Governor,
                        ),
                        Contract::proxy(GOVERNOR_DELEGATOR_CONTRACT, ContractKind::Governor, args),
                    ],
                    false,
                )
            }
            Module::UrtConverter => {
                let converter = &config.urt_converter;
                let args = vec![
                    Arg::deployed(URT_CONVERTER_CONTRACT),
                    Arg::address_or_deployed(config.urt, URT_CONTRACT),
                    Arg::address_or_deployed(config.ucore_token, UCORE_TOKEN_CONTRACT),
                    converter.conversion_ratio.into(),
                    converter.conversion_start_time.into(),
                    converter.conversion_period.into(),
                ];
                (
                    vec![
                        Contract::implementation(URT_CONVERTER_CONTRACT, ContractKind::Converter),
                        Contract::proxy(
                            URT_CONVERTER_PROXY_CONTRACT,
                            ContractKind::Converter,
                            args,
                        ),
                    ],
                    true,
                )
            }
            Module::Oracle => (
                vec![
                    Contract::standalone(
                        TWAP_ORACLE_CONTRACT,
                        ContractKind::Oracle,
                        vec![required(config.wcore, "wcore", *self)?.into()],
                    ),
                    Contract::standalone(BOUND_VALIDATOR_CONTRACT, ContractKind::Oracle, vec![]),
                    Contract::standalone(
                        RESILIENT_ORACLE_CONTRACT,
                        ContractKind::Oracle,
                        vec![
                            Arg::address_or_deployed(config.vcore, VCORE_CONTRACT),
                            Arg::address_or_deployed(config.uai, UAI_CONTRACT),
                            Arg::deployed(BOUND_VALIDATOR_CONTRACT),
                        ],
                    ),
                ],
                false,
            ),
        };

        let plan = DeploymentPlan {
            module: *self,
            contracts,
            uses_proxy_adoption,
            slots: self.implementation_slots(),
        };
        plan.validate()?;
        Ok(plan)
    }
}

/// Require an address the module cannot deploy itself
fn required(address: Option<Address>, key: &str, module: Module) -> Result<Address, ScriptError> {
    address.ok_or_else(|| {
        ScriptError::Config(format!("`{}` must be set to deploy the {} module", key, module))
    })
}

// -------------------
// | Deployment Plan |
// -------------------

/// The ordered contracts one module deploys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
    /// The module being deployed
    pub module: Module,
    /// The contracts to deploy, in order
    pub contracts: Vec<ContractDeployment>,
    /// Whether the proxy adopts the implementation through the
    /// nominate-then-accept handshake once both are deployed
    pub uses_proxy_adoption: bool,
    /// The getters exposing the proxy's implementation pointers
    pub slots: ImplementationSlots,
}

impl DeploymentPlan {
    /// The names of the contracts in the plan, in deployment order
    pub fn contract_names(&self) -> impl Iterator<Item = &str> {
        self.contracts.iter().map(|c| c.name.as_str())
    }

    /// The implementation and proxy the handshake runs between, if the plan
    /// uses proxy adoption
    pub fn adoption_pair(&self) -> Option<(&ContractDeployment, &ContractDeployment)> {
        if !self.uses_proxy_adoption {
            return None;
        }

        let implementation = self.with_role(ContractRole::Implementation).next()?;
        let proxy = self.with_role(ContractRole::Proxy).next()?;
        Some((implementation, proxy))
    }

    /// The contracts in the plan with the given role
    fn with_role(&self, role: ContractRole) -> impl Iterator<Item = &ContractDeployment> {
        self.contracts.iter().filter(move |c| c.role == role)
    }

    /// Check that the plan can be executed in order
    pub fn validate(&self) -> Result<(), ScriptError> {
        let invalid =
            |reason: String| ScriptError::InvalidPlan(format!("{}: {}", self.module, reason));

        if self.contracts.is_empty() {
            return Err(invalid("no contracts".to_string()));
        }

        if let Some(name) = self.contract_names().duplicates().next() {
            return Err(invalid(format!("{} is deployed twice", name)));
        }

        // References to contracts in the plan must point backwards
        let all: HashSet<&str> = self.contract_names().collect();
        let mut deployed = HashSet::new();
        for contract in &self.contracts {
            if let Some(name) = contract
                .references()
                .find(|name| all.contains(name) && !deployed.contains(name))
            {
                return Err(invalid(format!(
                    "{} references {} before it is deployed",
                    contract.name, name
                )));
            }
            deployed.insert(contract.name.as_str());
        }

        if self.uses_proxy_adoption {
            let implementations = self.with_role(ContractRole::Implementation).count();
            let proxies = self.with_role(ContractRole::Proxy).count();
            if implementations != 1 || proxies != 1 {
                return Err(invalid(format!(
                    "proxy adoption needs one implementation and one proxy, found {} and {}",
                    implementations, proxies
                )));
            }
        }

        Ok(())
    }
}
