//! Definitions of errors that can occur during the execution of the deploy scripts

use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    time::Duration,
};

use alloy::primitives::{Address, U256};

use crate::{constants::UNAUTHORIZED_ERROR_CODE, types::AddressRole};

/// Errors reported by the chain client when deploying or calling contracts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The deployment transaction reverted or was rejected
    DeploymentFailed(String),
    /// A state-changing call reverted or was rejected
    CallReverted(String),
    /// The call was confirmed, but the contract reported a failure code
    /// instead of reverting
    ErrorCode {
        /// The error enum value
        error: U256,
        /// The failure info enum value, identifying the failing check
        info: U256,
        /// Additional detail, typically a nested error code
        detail: U256,
    },
    /// The transaction was not confirmed within the configured window
    Timeout(Duration),
    /// A deployment receipt did not carry a contract address
    MissingContractAddress,
    /// Error in the RPC transport
    Transport(String),
    /// Error ABI-encoding a call or constructor arguments
    Encoding(String),
    /// Error decoding a return value
    Decoding(String),
}

impl Display for ChainError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::DeploymentFailed(s) => write!(f, "deployment failed: {}", s),
            ChainError::CallReverted(s) => write!(f, "call reverted: {}", s),
            ChainError::ErrorCode {
                error,
                info,
                detail,
            } => {
                if *error == U256::from(UNAUTHORIZED_ERROR_CODE) {
                    write!(
                        f,
                        "contract reported UNAUTHORIZED (info = {}, detail = {})",
                        info, detail
                    )
                } else {
                    write!(
                        f,
                        "contract reported failure code {} (info = {}, detail = {})",
                        error, info, detail
                    )
                }
            }
            ChainError::Timeout(d) => {
                write!(f, "transaction not confirmed within {}s", d.as_secs())
            }
            ChainError::MissingContractAddress => {
                write!(f, "deployment receipt has no contract address")
            }
            ChainError::Transport(s) => write!(f, "transport error: {}", s),
            ChainError::Encoding(s) => write!(f, "error encoding calldata: {}", s),
            ChainError::Decoding(s) => write!(f, "error decoding return data: {}", s),
        }
    }
}

impl Error for ChainError {}

/// The two steps of the proxy adoption handshake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdoptionStep {
    /// The proxy nominates the candidate as its pending implementation
    Nomination,
    /// The candidate accepts control of the proxy
    Acceptance,
}

impl Display for AdoptionStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AdoptionStep::Nomination => write!(f, "nomination"),
            AdoptionStep::Acceptance => write!(f, "acceptance"),
        }
    }
}

/// Errors that can occur while transferring control of a proxy to a new
/// implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdoptionError {
    /// One of the addresses does not hold a deployed contract
    AddressUnresolved {
        /// Which side of the handshake the address belongs to
        role: AddressRole,
        /// The unresolved address
        address: Address,
        /// Why the address could not be resolved
        reason: String,
    },
    /// The proxy rejected the nomination; acceptance was not attempted
    NominationFailed {
        /// The proxy address
        proxy: Address,
        /// The candidate implementation address
        candidate: Address,
        /// The underlying chain failure
        source: ChainError,
    },
    /// The candidate failed to accept the proxy. The proxy is left with
    /// the candidate as its pending implementation.
    AcceptanceFailed {
        /// The proxy address
        proxy: Address,
        /// The candidate implementation address
        candidate: Address,
        /// The underlying chain failure
        source: ChainError,
    },
    /// Both steps reported success, but the proxy does not point at the
    /// candidate
    ConsistencyMismatch {
        /// The proxy address
        proxy: Address,
        /// The candidate implementation address
        expected: Address,
        /// The implementation the proxy actually reports
        observed: Address,
    },
    /// Both steps reported success, but the proxy's implementation could not
    /// be read back
    VerificationFailed {
        /// The proxy address
        proxy: Address,
        /// The candidate implementation address
        candidate: Address,
        /// The underlying chain failure
        source: ChainError,
    },
}

impl AdoptionError {
    /// The handshake step that failed, if the failure belongs to one
    pub fn failed_step(&self) -> Option<AdoptionStep> {
        match self {
            AdoptionError::NominationFailed { .. } => Some(AdoptionStep::Nomination),
            AdoptionError::AcceptanceFailed { .. } => Some(AdoptionStep::Acceptance),
            _ => None,
        }
    }

    /// Whether the proxy may have been left with the candidate pending, in
    /// which case only the acceptance step needs to be retried
    pub fn is_partially_nominated(&self) -> bool {
        matches!(self, AdoptionError::AcceptanceFailed { .. })
    }
}

impl Display for AdoptionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AdoptionError::AddressUnresolved {
                role,
                address,
                reason,
            } => write!(f, "{} address {:#x} is unresolved: {}", role, address, reason),
            AdoptionError::NominationFailed {
                proxy,
                candidate,
                source,
            } => write!(
                f,
                "proxy {:#x} failed to nominate implementation {:#x}: {}; proxy state unchanged",
                proxy, candidate, source
            ),
            AdoptionError::AcceptanceFailed {
                proxy,
                candidate,
                source,
            } => write!(
                f,
                "implementation {:#x} failed to accept proxy {:#x}: {}; \
                 proxy may hold {:#x} as pending, retry acceptance only",
                candidate, proxy, source, candidate
            ),
            AdoptionError::ConsistencyMismatch {
                proxy,
                expected,
                observed,
            } => write!(
                f,
                "proxy {:#x} reports implementation {:#x} after adopting {:#x}",
                proxy, observed, expected
            ),
            AdoptionError::VerificationFailed {
                proxy,
                candidate,
                source,
            } => write!(
                f,
                "could not verify proxy {:#x} adopted {:#x}: {}",
                proxy, candidate, source
            ),
        }
    }
}

impl Error for AdoptionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AdoptionError::NominationFailed { source, .. }
            | AdoptionError::AcceptanceFailed { source, .. }
            | AdoptionError::VerificationFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Errors that can occur during the execution of the deploy scripts
#[derive(Debug)]
pub enum ScriptError {
    /// Error reading the deployment config file
    Config(String),
    /// Error reading the deployments file
    ReadDeployments(String),
    /// Error writing the deployments file
    WriteDeployments(String),
    /// Error locating or parsing a compilation artifact
    ArtifactParsing(String),
    /// Error initializing the RPC client
    ClientInitialization(String),
    /// The deployment plan is malformed
    InvalidPlan(String),
    /// Error constructing constructor arguments or calldata
    CalldataConstruction(String),
    /// Error deploying a contract
    ContractDeployment {
        /// The name of the contract being deployed
        contract: String,
        /// The underlying chain failure
        source: ChainError,
    },
    /// Error reading contract state
    ContractInteraction(ChainError),
    /// Error adopting an implementation into its proxy
    Adoption(AdoptionError),
}

impl Display for ScriptError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Config(s) => write!(f, "error reading config: {}", s),
            ScriptError::ReadDeployments(s) => write!(f, "error reading deployments: {}", s),
            ScriptError::WriteDeployments(s) => write!(f, "error writing deployments: {}", s),
            ScriptError::ArtifactParsing(s) => write!(f, "error parsing artifact: {}", s),
            ScriptError::ClientInitialization(s) => write!(f, "error initializing client: {}", s),
            ScriptError::InvalidPlan(s) => write!(f, "invalid deployment plan: {}", s),
            ScriptError::CalldataConstruction(s) => write!(f, "error constructing calldata: {}", s),
            ScriptError::ContractDeployment { contract, source } => {
                write!(f, "error deploying {}: {}", contract, source)
            }
            ScriptError::ContractInteraction(e) => {
                write!(f, "error interacting with contract: {}", e)
            }
            ScriptError::Adoption(e) => write!(f, "error adopting implementation: {}", e),
        }
    }
}

impl Error for ScriptError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ScriptError::ContractDeployment { source, .. } => Some(source),
            ScriptError::ContractInteraction(e) => Some(e),
            ScriptError::Adoption(e) => Some(e),
            _ => None,
        }
    }
}

impl From<AdoptionError> for ScriptError {
    fn from(e: AdoptionError) -> Self {
        ScriptError::Adoption(e)
    }
}
