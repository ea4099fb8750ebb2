//! Constants used in the deploy scripts

/// The signature of the proxy method nominating a pending implementation
pub const SET_PENDING_IMPLEMENTATION_SIGNATURE: &str = "_setPendingImplementation(address)";

/// The signature of the implementation method accepting control of a proxy
pub const BECOME_SIGNATURE: &str = "_become(address)";

/// The default getter for a proxy's current implementation
pub const DEFAULT_IMPLEMENTATION_GETTER: &str = "implementation()";

/// The default getter for a proxy's pending implementation
pub const DEFAULT_PENDING_IMPLEMENTATION_GETTER: &str = "pendingImplementation()";

/// The error code Compound-style error reporters use for failed admin checks
pub const UNAUTHORIZED_ERROR_CODE: u64 = 1;

/// The number of confirmations to wait for each transaction by default
pub const DEFAULT_CONFIRMATIONS: u64 = 1;

/// The default confirmation timeout for each transaction, in seconds
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;

/// The number of bytes in an ABI-encoded return word
pub const NUM_BYTES_WORD: usize = 32;

/// The number of bytes in an Ethereum address
pub const NUM_BYTES_ADDRESS: usize = 20;

/// The default path of the deployment config file
pub const DEFAULT_CONFIG_PATH: &str = "deploy.config.json";

/// The default path of the Hardhat artifacts directory
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";

/// The directory within the artifacts directory holding build info, which
/// never contains contract artifacts
pub const BUILD_INFO_DIR: &str = "build-info";

/// The extension of a Hardhat artifact file
pub const ARTIFACT_EXTENSION: &str = "json";

/// The suffix of a Hardhat debug artifact file, skipped when searching
pub const DEBUG_ARTIFACT_SUFFIX: &str = ".dbg.json";

/// The deployments key in the deployments file
pub const DEPLOYMENTS_KEY: &str = "deployments";

/// The name of the environment variable holding the deployer private key
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";

// --------------------
// | Network Profiles |
// --------------------

/// The RPC URL of the CORE mainnet
pub const MAINNET_RPC_URL: &str = "https://rpc.coredao.org";

/// The chain ID of the CORE mainnet
pub const MAINNET_CHAIN_ID: u64 = 1116;

/// The RPC URL of the CORE testnet
pub const TESTNET_RPC_URL: &str = "https://rpc.test.btcs.network";

/// The chain ID of the CORE testnet
pub const TESTNET_CHAIN_ID: u64 = 1115;

/// The RPC URL of a local development node
pub const LOCALHOST_RPC_URL: &str = "http://127.0.0.1:8545";

// ------------------
// | Contract Names |
// ------------------

/// The lens contract
pub const LENS_CONTRACT: &str = "UcoreLens";
/// The UCORE governance token
pub const UCORE_TOKEN_CONTRACT: &str = "UCORE";
/// The UAI stablecoin
pub const UAI_CONTRACT: &str = "UAI";
/// The URT reward token
pub const URT_CONTRACT: &str = "URT";
/// The jump rate interest model
pub const JUMP_RATE_MODEL_CONTRACT: &str = "JumpRateModel";
/// The vCORE market
pub const VCORE_CONTRACT: &str = "VCORE";
/// The UAI vault implementation
pub const UAI_VAULT_CONTRACT: &str = "UAIVault";
/// The UAI vault proxy
pub const UAI_VAULT_PROXY_CONTRACT: &str = "UAIVaultProxy";
/// The UCORE vault implementation
pub const UCORE_VAULT_CONTRACT: &str = "UCOREVault";
/// The UCORE vault proxy
pub const UCORE_VAULT_PROXY_CONTRACT: &str = "UCOREVaultProxy";
/// The URT vault implementation
pub const URT_VAULT_CONTRACT: &str = "URTVault";
/// The URT vault proxy
pub const URT_VAULT_PROXY_CONTRACT: &str = "URTVaultProxy";
/// The Maximillion repayment helper
pub const MAXIMILLION_CONTRACT: &str = "Maximillion";
/// The UCORE store
pub const UCORE_STORE_CONTRACT: &str = "UCOREStore";
/// The UAI controller implementation
pub const UAI_CONTROLLER_CONTRACT: &str = "UAIController";
/// The UAI controller proxy
pub const UAI_UNITROLLER_CONTRACT: &str = "UAIUnitroller";
/// The governance timelock
pub const TIMELOCK_CONTRACT: &str = "Timelock";
/// The governor implementation
pub const GOVERNOR_DELEGATE_CONTRACT: &str = "GovernorBravoDelegate";
/// The governor proxy
pub const GOVERNOR_DELEGATOR_CONTRACT: &str = "GovernorBravoDelegator";
/// The URT converter implementation
pub const URT_CONVERTER_CONTRACT: &str = "URTConverter";
/// The URT converter proxy
pub const URT_CONVERTER_PROXY_CONTRACT: &str = "URTConverterProxy";
/// The TWAP oracle
pub const TWAP_ORACLE_CONTRACT: &str = "TwapOracleIce";
/// The oracle price bound validator
pub const BOUND_VALIDATOR_CONTRACT: &str = "BoundValidator";
/// The resilient oracle
pub const RESILIENT_ORACLE_CONTRACT: &str = "ResilientOracle";

// --------------------------------
// | Proxy Implementation Getters |
// --------------------------------

/// The UAI vault proxy's current implementation getter
pub const UAI_VAULT_IMPLEMENTATION_GETTER: &str = "uaiVaultImplementation()";
/// The UAI vault proxy's pending implementation getter
pub const UAI_VAULT_PENDING_IMPLEMENTATION_GETTER: &str = "pendingUAIVaultImplementation()";
/// The UCORE vault proxy's pending implementation getter
pub const UCORE_VAULT_PENDING_IMPLEMENTATION_GETTER: &str = "pendingUCOREVaultImplementation()";
/// The UAI unitroller's current implementation getter
pub const UAI_CONTROLLER_IMPLEMENTATION_GETTER: &str = "uaiControllerImplementation()";
/// The UAI unitroller's pending implementation getter
pub const UAI_CONTROLLER_PENDING_IMPLEMENTATION_GETTER: &str =
    "pendingUAIControllerImplementation()";

// ----------------------
// | Default Parameters |
// ----------------------

/// The jump rate model's base rate per year, in wei
pub const DEFAULT_BASE_RATE_PER_YEAR: u128 = 20_000_000_000_000_000;
/// The jump rate model's multiplier per year, in wei
pub const DEFAULT_MULTIPLIER_PER_YEAR: u128 = 200_000_000_000_000_000;
/// The jump rate model's jump multiplier per year, in wei
pub const DEFAULT_JUMP_MULTIPLIER_PER_YEAR: u128 = 2_000_000_000_000_000_000;
/// The jump rate model's utilization kink, in wei
pub const DEFAULT_KINK: u128 = 900_000_000_000_000_000;

/// The vCORE market's initial exchange rate mantissa
pub const DEFAULT_INITIAL_EXCHANGE_RATE_MANTISSA: u128 = 20_000_000_000_000_000;
/// The vCORE market's token name
pub const DEFAULT_VCORE_NAME: &str = "Unity Virtual CORE";
/// The vCORE market's token symbol
pub const DEFAULT_VCORE_SYMBOL: &str = "vCORE";
/// The vCORE market's token decimals
pub const DEFAULT_VCORE_DECIMALS: u64 = 8;

/// The URT vault's reward per block
pub const DEFAULT_URT_PER_BLOCK: u128 = 3_000_000_000;

/// The timelock's delay, in seconds (2 days)
pub const DEFAULT_TIMELOCK_DELAY: u64 = 172_800;

/// The governor's voting period, in blocks
pub const DEFAULT_VOTING_PERIOD: u64 = 28_800;
/// The governor's voting delay, in blocks
pub const DEFAULT_VOTING_DELAY: u64 = 1;
/// The governor's proposal threshold, in wei of UCORE
pub const DEFAULT_PROPOSAL_THRESHOLD: u128 = 300_000_000_000_000_000_000_000;
