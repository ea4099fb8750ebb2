//! Type definitions used throughout the scripts

use std::fmt::{self, Display};

use alloy::primitives::{Address, B256};
use clap::ValueEnum;

use crate::constants::{DEFAULT_IMPLEMENTATION_GETTER, DEFAULT_PENDING_IMPLEMENTATION_GETTER};

/// The kind of on-chain module a contract belongs to
#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContractKind {
    /// A staking / reward vault
    Vault,
    /// A controller behind a unitroller
    Controller,
    /// A token conversion contract
    Converter,
    /// An ERC20 token
    Token,
    /// An interest rate model
    InterestRateModel,
    /// A lending market
    Market,
    /// A price oracle or oracle component
    Oracle,
    /// A governance contract
    Governor,
    /// A governance timelock
    Timelock,
    /// A read-only or helper contract
    Periphery,
}

impl Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractKind::Vault => write!(f, "vault"),
            ContractKind::Controller => write!(f, "controller"),
            ContractKind::Converter => write!(f, "converter"),
            ContractKind::Token => write!(f, "token"),
            ContractKind::InterestRateModel => write!(f, "interest-rate-model"),
            ContractKind::Market => write!(f, "market"),
            ContractKind::Oracle => write!(f, "oracle"),
            ContractKind::Governor => write!(f, "governor"),
            ContractKind::Timelock => write!(f, "timelock"),
            ContractKind::Periphery => write!(f, "periphery"),
        }
    }
}

/// The part a contract plays in its module's deployment
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContractRole {
    /// A contract with no proxy relationship
    Standalone,
    /// A logic contract adopted by a proxy
    Implementation,
    /// A proxy forwarding calls to an adopted implementation
    Proxy,
}

/// Which side of the adoption handshake an address is on
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AddressRole {
    /// The proxy being handed over
    Proxy,
    /// The candidate implementation
    Implementation,
}

impl Display for AddressRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressRole::Proxy => write!(f, "proxy"),
            AddressRole::Implementation => write!(f, "implementation"),
        }
    }
}

/// The getter signatures through which a proxy exposes its implementation
/// pointers.
///
/// Different proxy contracts name these differently, e.g. the UAI vault proxy
/// exposes `uaiVaultImplementation()` while a generic proxy exposes
/// `implementation()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementationSlots {
    /// The getter for the implementation currently receiving delegated calls
    pub current: String,
    /// The getter for the nominated, not yet accepted implementation
    pub pending: String,
}

impl ImplementationSlots {
    /// Construct a set of getters from their signatures
    pub fn new(current: &str, pending: &str) -> Self {
        Self {
            current: current.to_string(),
            pending: pending.to_string(),
        }
    }
}

impl Default for ImplementationSlots {
    fn default() -> Self {
        Self::new(
            DEFAULT_IMPLEMENTATION_GETTER,
            DEFAULT_PENDING_IMPLEMENTATION_GETTER,
        )
    }
}

/// A deployed logic contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImplementationRef {
    /// The address of the implementation
    pub address: Address,
    /// The kind of module the implementation provides
    pub kind: ContractKind,
}

/// A deployed proxy contract.
///
/// The proxy's pending and current implementation live on-chain and are only
/// ever read through `slots`, never cached here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRef {
    /// The address of the proxy
    pub address: Address,
    /// The getters exposing the proxy's implementation pointers
    pub slots: ImplementationSlots,
}

/// A request to hand a proxy over to a candidate implementation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdoptionRequest {
    /// The proxy being handed over
    pub proxy: ProxyRef,
    /// The implementation taking control
    pub candidate: ImplementationRef,
}

/// A snapshot of a proxy's implementation pointers
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ProxyState {
    /// The nominated implementation, zero if none
    pub pending: Address,
    /// The active implementation, zero if none
    pub current: Address,
}

impl ProxyState {
    /// Whether the proxy has `candidate` nominated but not yet accepted
    pub fn is_pending(&self, candidate: Address) -> bool {
        self.pending == candidate && self.current != candidate
    }
}

/// The confirmation of a state-changing call
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CallReceipt {
    /// The hash of the confirmed transaction
    pub tx_hash: B256,
    /// The block the transaction was included in
    pub block_number: Option<u64>,
}

/// The outcome of a successful adoption
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdoptionReceipt {
    /// The proxy that was handed over
    pub proxy: Address,
    /// The implementation now in control of the proxy
    pub implementation: Address,
    /// The nomination transaction, absent when only acceptance was run
    pub nomination: Option<CallReceipt>,
    /// The acceptance transaction
    pub acceptance: CallReceipt,
    /// Whether the proxy's current implementation was read back and matched
    pub verified: bool,
}
