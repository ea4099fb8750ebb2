//! Deployment configuration: network profiles and the constants passed to
//! contract constructors

use std::{
    fmt::{self, Display},
    fs,
    path::Path,
    str::FromStr,
};

use alloy::primitives::{Address, U256};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer};

use crate::{
    constants::{
        DEFAULT_BASE_RATE_PER_YEAR, DEFAULT_INITIAL_EXCHANGE_RATE_MANTISSA,
        DEFAULT_JUMP_MULTIPLIER_PER_YEAR, DEFAULT_KINK, DEFAULT_MULTIPLIER_PER_YEAR,
        DEFAULT_PROPOSAL_THRESHOLD, DEFAULT_TIMELOCK_DELAY, DEFAULT_URT_PER_BLOCK,
        DEFAULT_VCORE_DECIMALS, DEFAULT_VCORE_NAME, DEFAULT_VCORE_SYMBOL, DEFAULT_VOTING_DELAY,
        DEFAULT_VOTING_PERIOD, LOCALHOST_RPC_URL, MAINNET_CHAIN_ID, MAINNET_RPC_URL,
        TESTNET_CHAIN_ID, TESTNET_RPC_URL,
    },
    errors::ScriptError,
};

// ------------
// | Networks |
// ------------

/// The networks the scripts can deploy to
#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Network {
    /// The CORE mainnet
    Mainnet,
    /// The CORE testnet
    Testnet,
    /// A local development node
    Localhost,
}

/// The connection parameters of a network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkProfile {
    /// The default RPC endpoint
    pub rpc_url: &'static str,
    /// The chain ID the endpoint must report, if fixed
    pub chain_id: Option<u64>,
}

impl Network {
    /// The connection parameters of the network
    pub fn profile(&self) -> NetworkProfile {
        match self {
            Network::Mainnet => NetworkProfile {
                rpc_url: MAINNET_RPC_URL,
                chain_id: Some(MAINNET_CHAIN_ID),
            },
            Network::Testnet => NetworkProfile {
                rpc_url: TESTNET_RPC_URL,
                chain_id: Some(TESTNET_CHAIN_ID),
            },
            Network::Localhost => NetworkProfile {
                rpc_url: LOCALHOST_RPC_URL,
                chain_id: None,
            },
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
            Network::Localhost => write!(f, "localhost"),
        }
    }
}

// -----------------
// | Deploy Config |
// -----------------

/// Deserialize a `U256` from a decimal or `0x`-prefixed hex string
fn deserialize_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    U256::from_str(&s).map_err(serde::de::Error::custom)
}

/// The addresses and parameters passed to the contracts' constructors.
///
/// Addresses of contracts deployed by other modules of this repo are
/// optional; when absent they are read from the deployments file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployConfig {
    /// The admin of the deployed tokens, market and governor
    pub admin: Address,
    /// The wrapped CORE token, quoted by the TWAP oracle
    pub wcore: Option<Address>,
    /// The lending protocol's unitroller
    pub unitroller: Option<Address>,
    /// The governance timelock
    pub timelock: Option<Address>,
    /// The UCORE token
    pub ucore_token: Option<Address>,
    /// The UAI stablecoin
    pub uai: Option<Address>,
    /// The URT token
    pub urt: Option<Address>,
    /// The vCORE market
    pub vcore: Option<Address>,
    /// The interest rate model of the vCORE market
    pub interest_rate_model: Option<Address>,
    /// The UCORE vault (proxy) providing governance votes
    pub ucore_vault: Option<Address>,
    /// The jump rate model parameters
    #[serde(default)]
    pub jump_rate_model: JumpRateModelParams,
    /// The vCORE market parameters
    #[serde(default)]
    pub vcore_market: MarketParams,
    /// The URT vault parameters
    #[serde(default)]
    pub urt_vault: UrtVaultParams,
    /// The timelock parameters
    #[serde(default)]
    pub timelock_params: TimelockParams,
    /// The governor parameters
    #[serde(default)]
    pub governor: GovernorParams,
    /// The URT converter parameters
    #[serde(default)]
    pub urt_converter: UrtConverterParams,
}

impl DeployConfig {
    /// A config with the given admin and default parameters
    pub fn new(admin: Address) -> Self {
        Self {
            admin,
            wcore: None,
            unitroller: None,
            timelock: None,
            ucore_token: None,
            uai: None,
            urt: None,
            vcore: None,
            interest_rate_model: None,
            ucore_vault: None,
            jump_rate_model: JumpRateModelParams::default(),
            vcore_market: MarketParams::default(),
            urt_vault: UrtVaultParams::default(),
            timelock_params: TimelockParams::default(),
            governor: GovernorParams::default(),
            urt_converter: UrtConverterParams::default(),
        }
    }

    /// Read the config from a JSON file
    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ScriptError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&contents)
    }

    /// Parse the config from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, ScriptError> {
        serde_json::from_str(json).map_err(|e| ScriptError::Config(e.to_string()))
    }
}

/// The parameters of the jump rate interest model, all scaled by 1e18
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JumpRateModelParams {
    /// The utilization-independent yearly rate
    #[serde(deserialize_with = "deserialize_u256")]
    pub base_rate_per_year: U256,
    /// The yearly rate of increase with utilization, below the kink
    #[serde(deserialize_with = "deserialize_u256")]
    pub multiplier_per_year: U256,
    /// The yearly rate of increase with utilization, above the kink
    #[serde(deserialize_with = "deserialize_u256")]
    pub jump_multiplier_per_year: U256,
    /// The utilization at which the jump multiplier applies
    #[serde(deserialize_with = "deserialize_u256")]
    pub kink: U256,
}

impl Default for JumpRateModelParams {
    fn default() -> Self {
        Self {
            base_rate_per_year: U256::from(DEFAULT_BASE_RATE_PER_YEAR),
            multiplier_per_year: U256::from(DEFAULT_MULTIPLIER_PER_YEAR),
            jump_multiplier_per_year: U256::from(DEFAULT_JUMP_MULTIPLIER_PER_YEAR),
            kink: U256::from(DEFAULT_KINK),
        }
    }
}

/// The parameters of the vCORE market
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarketParams {
    /// The initial exchange rate between the market token and CORE
    #[serde(deserialize_with = "deserialize_u256")]
    pub initial_exchange_rate_mantissa: U256,
    /// The market token's name
    pub name: String,
    /// The market token's symbol
    pub symbol: String,
    /// The market token's decimals
    pub decimals: u64,
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            initial_exchange_rate_mantissa: U256::from(DEFAULT_INITIAL_EXCHANGE_RATE_MANTISSA),
            name: DEFAULT_VCORE_NAME.to_string(),
            symbol: DEFAULT_VCORE_SYMBOL.to_string(),
            decimals: DEFAULT_VCORE_DECIMALS,
        }
    }
}

/// The parameters of the URT vault
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UrtVaultParams {
    /// The URT distributed per block
    #[serde(deserialize_with = "deserialize_u256")]
    pub urt_per_block: U256,
}

impl Default for UrtVaultParams {
    fn default() -> Self {
        Self {
            urt_per_block: U256::from(DEFAULT_URT_PER_BLOCK),
        }
    }
}

/// The parameters of the governance timelock
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelockParams {
    /// The delay before a queued transaction may execute, in seconds
    pub delay: u64,
}

impl Default for TimelockParams {
    fn default() -> Self {
        Self {
            delay: DEFAULT_TIMELOCK_DELAY,
        }
    }
}

/// The parameters of the governor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GovernorParams {
    /// The voting period, in blocks
    pub voting_period: u64,
    /// The delay before voting starts, in blocks
    pub voting_delay: u64,
    /// The votes needed to create a proposal
    #[serde(deserialize_with = "deserialize_u256")]
    pub proposal_threshold: U256,
    /// The guardian able to cancel proposals, the admin if unset
    pub guardian: Option<Address>,
}

impl Default for GovernorParams {
    fn default() -> Self {
        Self {
            voting_period: DEFAULT_VOTING_PERIOD,
            voting_delay: DEFAULT_VOTING_DELAY,
            proposal_threshold: U256::from(DEFAULT_PROPOSAL_THRESHOLD),
            guardian: None,
        }
    }
}

/// The parameters of the URT converter
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UrtConverterParams {
    /// The UCORE received per URT, scaled by 1e18
    #[serde(deserialize_with = "deserialize_u256")]
    pub conversion_ratio: U256,
    /// The timestamp at which conversion opens
    #[serde(deserialize_with = "deserialize_u256")]
    pub conversion_start_time: U256,
    /// How long conversion stays open, in seconds
    #[serde(deserialize_with = "deserialize_u256")]
    pub conversion_period: U256,
}
