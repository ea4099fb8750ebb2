//! An in-memory chain implementing the proxy handshake, for testing

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use alloy::{
    dyn_abi::DynSolValue,
    primitives::{Address, Bytes, B256, U256},
};
use async_trait::async_trait;

use crate::{
    chain::ChainClient,
    constants::{BECOME_SIGNATURE, SET_PENDING_IMPLEMENTATION_SIGNATURE},
    errors::ChainError,
    types::{CallReceipt, ProxyState},
};

/// A contract deployment recorded by the mock
#[derive(Debug, Clone)]
pub struct RecordedDeployment {
    /// The address assigned to the contract
    pub address: Address,
    /// The creation bytecode
    pub bytecode: Bytes,
    /// The constructor arguments
    pub args: Vec<DynSolValue>,
}

/// The mutable state of the mock chain
#[derive(Default)]
struct MockState {
    /// The number of transactions confirmed so far
    nonce: u64,
    /// The addresses holding contract code
    deployed: HashSet<Address>,
    /// The implementation pointers of every contract that has been used as
    /// a proxy
    proxies: HashMap<Address, ProxyState>,
    /// The deployments made, in order
    deployments: Vec<RecordedDeployment>,
    /// The state-changing calls made, as (target, signature)
    calls: Vec<(Address, String)>,
    /// An error to fail every deployment with
    deploy_failure: Option<ChainError>,
    /// An error to fail every nomination with
    nomination_failure: Option<ChainError>,
    /// An error to fail every acceptance with
    acceptance_failure: Option<ChainError>,
    /// An error to fail every read with
    read_failure: Option<ChainError>,
    /// Report acceptances as confirmed without applying them
    accept_without_effect: bool,
    /// An implementation nominated by another party right after each
    /// nomination this client makes
    racing_nomination: Option<Address>,
}

impl MockState {
    /// Confirm a transaction, returning its receipt
    fn confirm(&mut self) -> CallReceipt {
        self.nonce += 1;
        CallReceipt {
            tx_hash: B256::from(U256::from(self.nonce)),
            block_number: Some(self.nonce),
        }
    }

    /// The address the next deployed contract is assigned
    fn next_address(&self) -> Address {
        let index = self.deployments.len() as u64 + 1;
        Address::from_word(B256::from(U256::from(index)))
    }
}

/// A [`ChainClient`] that simulates Compound-style proxies in memory.
///
/// Any deployed contract accepts `_setPendingImplementation`, and any
/// deployed contract's `_become(proxy)` succeeds only when it is the proxy's
/// pending implementation.
#[derive(Default)]
pub struct MockChain {
    /// The chain state
    state: Mutex<MockState>,
}

impl MockChain {
    /// An empty chain
    pub fn new() -> Self {
        Self::default()
    }

    /// Deploy a contract with no code or arguments, returning its address
    pub fn deploy_empty(&self) -> Address {
        let mut state = self.state.lock().unwrap();
        let address = state.next_address();
        state.confirm();
        state.deployed.insert(address);
        state.deployments.push(RecordedDeployment {
            address,
            bytecode: Bytes::new(),
            args: vec![],
        });
        address
    }

    /// Overwrite a proxy's implementation pointers
    pub fn set_proxy_state(&self, proxy: Address, proxy_state: ProxyState) {
        self.state.lock().unwrap().proxies.insert(proxy, proxy_state);
    }

    /// The implementation pointers of a proxy
    pub fn proxy_state(&self, proxy: Address) -> ProxyState {
        self.state
            .lock()
            .unwrap()
            .proxies
            .get(&proxy)
            .copied()
            .unwrap_or_default()
    }

    /// The number of calls made with the given signature
    pub fn call_count(&self, signature: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|(_, sig)| sig == signature)
            .count()
    }

    /// The deployments made, in order
    pub fn deployments(&self) -> Vec<RecordedDeployment> {
        self.state.lock().unwrap().deployments.clone()
    }

    /// Fail every subsequent deployment
    pub fn fail_deployments(&self, error: ChainError) {
        self.state.lock().unwrap().deploy_failure = Some(error);
    }

    /// Fail every subsequent nomination
    pub fn fail_nominations(&self, error: ChainError) {
        self.state.lock().unwrap().nomination_failure = Some(error);
    }

    /// Fail every subsequent acceptance
    pub fn fail_acceptances(&self, error: ChainError) {
        self.state.lock().unwrap().acceptance_failure = Some(error);
    }

    /// Fail every subsequent read
    pub fn fail_reads(&self, error: ChainError) {
        self.state.lock().unwrap().read_failure = Some(error);
    }

    /// Stop injecting failures
    pub fn clear_failures(&self) {
        let mut state = self.state.lock().unwrap();
        state.deploy_failure = None;
        state.nomination_failure = None;
        state.acceptance_failure = None;
        state.read_failure = None;
    }

    /// Confirm subsequent acceptances without updating the proxy
    pub fn accept_without_effect(&self) {
        self.state.lock().unwrap().accept_without_effect = true;
    }

    /// Have `other` nominated right after each nomination this client makes
    pub fn race_nominations(&self, other: Address) {
        self.state.lock().unwrap().racing_nomination = Some(other);
    }
}

/// The address passed as a call's single argument
fn address_arg(signature: &str, args: &[DynSolValue]) -> Result<Address, ChainError> {
    match args {
        [DynSolValue::Address(address)] => Ok(*address),
        _ => Err(ChainError::Encoding(format!("{}: expected one address argument", signature))),
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn deploy(
        &self,
        bytecode: &Bytes,
        constructor_args: &[DynSolValue],
    ) -> Result<Address, ChainError> {
        let mut state = self.state.lock().unwrap();
        if let Some(e) = state.deploy_failure.clone() {
            return Err(e);
        }

        let address = state.next_address();
        state.confirm();
        state.deployed.insert(address);
        state.deployments.push(RecordedDeployment {
            address,
            bytecode: bytecode.clone(),
            args: constructor_args.to_vec(),
        });
        Ok(address)
    }

    async fn call(
        &self,
        address: Address,
        signature: &str,
        args: &[DynSolValue],
    ) -> Result<CallReceipt, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((address, signature.to_string()));

        match signature {
            SET_PENDING_IMPLEMENTATION_SIGNATURE => {
                if let Some(e) = state.nomination_failure.clone() {
                    return Err(e);
                }

                let candidate = address_arg(signature, args)?;
                let racer = state.racing_nomination;
                let proxy = state.proxies.entry(address).or_default();
                proxy.pending = racer.unwrap_or(candidate);
            }
            BECOME_SIGNATURE => {
                if let Some(e) = state.acceptance_failure.clone() {
                    return Err(e);
                }

                let proxy_address = address_arg(signature, args)?;
                let apply = !state.accept_without_effect;
                let proxy = state
                    .proxies
                    .get_mut(&proxy_address)
                    .filter(|proxy| proxy.pending == address)
                    .ok_or_else(|| ChainError::CallReverted("change not authorized".to_string()))?;

                if apply {
                    proxy.current = address;
                    proxy.pending = Address::ZERO;
                }
            }
            _ => {}
        }

        Ok(state.confirm())
    }

    async fn read_address(
        &self,
        address: Address,
        signature: &str,
    ) -> Result<Address, ChainError> {
        let state = self.state.lock().unwrap();
        if let Some(e) = state.read_failure.clone() {
            return Err(e);
        }
        if !state.deployed.contains(&address) {
            return Err(ChainError::Decoding("expected at least 32 bytes, got 0".to_string()));
        }

        let proxy = state.proxies.get(&address).copied().unwrap_or_default();
        if signature.starts_with("pending") {
            Ok(proxy.pending)
        } else {
            Ok(proxy.current)
        }
    }

    async fn is_deployed(&self, address: Address) -> Result<bool, ChainError> {
        Ok(self.state.lock().unwrap().deployed.contains(&address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_distinct_past_one_byte() {
        let chain = MockChain::new();
        let addresses: HashSet<Address> = (0..300).map(|_| chain.deploy_empty()).collect();
        assert_eq!(addresses.len(), 300);
        assert_eq!(chain.deployments()[0].address, Address::with_last_byte(1));
        assert_eq!(
            chain.deployments()[299].address,
            Address::from_word(B256::from(U256::from(300u64)))
        );
    }

    #[tokio::test]
    async fn test_receipts_distinct_past_one_byte() {
        let chain = MockChain::new();
        let target = chain.deploy_empty();

        let mut hashes = HashSet::new();
        for _ in 0..300 {
            let receipt = chain.call(target, "poke()", &[]).await.unwrap();
            hashes.insert(receipt.tx_hash);
        }
        assert_eq!(hashes.len(), 300);
    }
}
