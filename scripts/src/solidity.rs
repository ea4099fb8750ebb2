//! Definitions of Solidity events observed during deployment

use alloy::sol;

sol! {
    /// Emitted by Compound-style error reporters when a call fails without
    /// reverting, e.g. when a non-admin calls `_setPendingImplementation`
    event Failure(uint256 error, uint256 info, uint256 detail);
}
