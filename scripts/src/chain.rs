//! The chain client through which contracts are deployed and called

use std::time::Duration;

use alloy::{
    dyn_abi::{DynSolValue, JsonAbiExt},
    json_abi::Function,
    network::{ReceiptResponse, TransactionBuilder},
    primitives::{Address, Bytes},
    providers::{DynProvider, PendingTransactionError, Provider, WatchTxError},
    rpc::types::{TransactionReceipt, TransactionRequest},
    sol_types::SolEvent,
    transports::{RpcError, TransportError},
};
use async_trait::async_trait;

use crate::{
    constants::{NUM_BYTES_ADDRESS, NUM_BYTES_WORD},
    errors::ChainError,
    solidity::Failure,
    types::CallReceipt,
};

/// The operations the deploy scripts need from a chain.
///
/// Every state-changing method blocks until its transaction is confirmed, or
/// fails.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Deploy `bytecode` with the given constructor arguments, returning the
    /// address of the new contract once the deployment is confirmed
    async fn deploy(
        &self,
        bytecode: &Bytes,
        constructor_args: &[DynSolValue],
    ) -> Result<Address, ChainError>;

    /// Invoke the function with the given signature on the contract at
    /// `address`, returning once the call is confirmed
    async fn call(
        &self,
        address: Address,
        signature: &str,
        args: &[DynSolValue],
    ) -> Result<CallReceipt, ChainError>;

    /// Read an address returned by an argument-less view function
    async fn read_address(&self, address: Address, signature: &str)
        -> Result<Address, ChainError>;

    /// Whether there is contract code at `address`
    async fn is_deployed(&self, address: Address) -> Result<bool, ChainError>;
}

/// A [`ChainClient`] backed by an alloy provider with a signing wallet
#[derive(Clone)]
pub struct AlloyChainClient {
    /// The provider used to send transactions
    provider: DynProvider,
    /// The number of confirmations to wait for on each transaction
    confirmations: u64,
    /// How long to wait for each transaction to be confirmed
    timeout: Duration,
}

impl AlloyChainClient {
    /// Wrap a wallet-enabled provider
    pub fn new(provider: DynProvider, confirmations: u64, timeout: Duration) -> Self {
        Self {
            provider,
            confirmations,
            timeout,
        }
    }

    /// The underlying provider
    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    /// Send a transaction and wait for its receipt
    async fn send(&self, tx: TransactionRequest) -> Result<TransactionReceipt, ChainError> {
        let pending_tx = self.provider.send_transaction(tx).await.map_err(rpc_error)?;

        pending_tx
            .with_required_confirmations(self.confirmations)
            .with_timeout(Some(self.timeout))
            .get_receipt()
            .await
            .map_err(|e| confirmation_error(e, self.timeout))
    }
}

#[async_trait]
impl ChainClient for AlloyChainClient {
    async fn deploy(
        &self,
        bytecode: &Bytes,
        constructor_args: &[DynSolValue],
    ) -> Result<Address, ChainError> {
        let tx =
            TransactionRequest::default().with_deploy_code(deploy_code(bytecode, constructor_args));

        let receipt = self.send(tx).await.map_err(|e| match e {
            ChainError::CallReverted(reason) => ChainError::DeploymentFailed(reason),
            e => e,
        })?;

        if !succeeded(&receipt) {
            return Err(ChainError::DeploymentFailed(format!(
                "transaction {:#x} reverted",
                receipt.transaction_hash
            )));
        }

        receipt.contract_address.ok_or(ChainError::MissingContractAddress)
    }

    async fn call(
        &self,
        address: Address,
        signature: &str,
        args: &[DynSolValue],
    ) -> Result<CallReceipt, ChainError> {
        let tx = TransactionRequest::default()
            .with_to(address)
            .with_input(encode_call(signature, args)?);

        let receipt = self.send(tx).await?;
        if !succeeded(&receipt) {
            return Err(ChainError::CallReverted(format!(
                "transaction {:#x} reverted",
                receipt.transaction_hash
            )));
        }

        if let Some(failure) = find_failure(&receipt, address) {
            return Err(ChainError::ErrorCode {
                error: failure.error,
                info: failure.info,
                detail: failure.detail,
            });
        }

        Ok(CallReceipt {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }

    async fn read_address(
        &self,
        address: Address,
        signature: &str,
    ) -> Result<Address, ChainError> {
        let tx = TransactionRequest::default()
            .with_to(address)
            .with_input(encode_call(signature, &[])?);

        let output = self.provider.call(tx).await.map_err(rpc_error)?;
        decode_address_word(&output)
    }

    async fn is_deployed(&self, address: Address) -> Result<bool, ChainError> {
        let code = self.provider.get_code_at(address).await.map_err(rpc_error)?;
        Ok(!code.is_empty())
    }
}

/// Append the ABI-encoded constructor arguments to the creation bytecode
pub fn deploy_code(bytecode: &Bytes, constructor_args: &[DynSolValue]) -> Bytes {
    let mut code = bytecode.to_vec();
    code.extend(DynSolValue::Tuple(constructor_args.to_vec()).abi_encode_params());
    code.into()
}

/// ABI-encode a call to the function with the given signature, selector
/// included
pub fn encode_call(signature: &str, args: &[DynSolValue]) -> Result<Bytes, ChainError> {
    let function = Function::parse(signature).map_err(|e| ChainError::Encoding(e.to_string()))?;

    function
        .abi_encode_input(args)
        .map(Bytes::from)
        .map_err(|e| ChainError::Encoding(format!("{}: {}", signature, e)))
}

/// Decode an address from the first word of a call's return data
pub fn decode_address_word(output: &[u8]) -> Result<Address, ChainError> {
    if output.len() < NUM_BYTES_WORD {
        return Err(ChainError::Decoding(format!(
            "expected at least {} bytes, got {}",
            NUM_BYTES_WORD,
            output.len()
        )));
    }

    let (padding, address) = output[..NUM_BYTES_WORD].split_at(NUM_BYTES_WORD - NUM_BYTES_ADDRESS);
    if padding.iter().any(|b| *b != 0) {
        return Err(ChainError::Decoding(
            "return word is not a left-padded address".to_string(),
        ));
    }

    Ok(Address::from_slice(address))
}

/// Whether a confirmed transaction executed successfully
fn succeeded(receipt: &TransactionReceipt) -> bool {
    ReceiptResponse::status(receipt)
}

/// Find the first `Failure` event emitted by `emitter` in a receipt. Events
/// from other contracts touched by the call are ignored.
fn find_failure(receipt: &TransactionReceipt, emitter: Address) -> Option<Failure> {
    receipt
        .inner
        .logs()
        .iter()
        .filter(|log| log.address() == emitter)
        .filter(|log| log.topic0() == Some(&Failure::SIGNATURE_HASH))
        .find_map(|log| log.log_decode::<Failure>().ok())
        .map(|log| log.inner.data)
}

/// Convert an error raised while waiting for a transaction to be confirmed
fn confirmation_error(e: PendingTransactionError, timeout: Duration) -> ChainError {
    match e {
        PendingTransactionError::TxWatcher(WatchTxError::Timeout) => ChainError::Timeout(timeout),
        e => ChainError::Transport(e.to_string()),
    }
}

/// Convert a transport error, surfacing the node's error message and revert
/// data when it rejected the transaction
fn rpc_error(e: TransportError) -> ChainError {
    match e {
        RpcError::ErrorResp(err_payload) => {
            let data = err_payload
                .data
                .map(|d| d.get().to_string())
                .unwrap_or_default();
            ChainError::CallReverted(format!("{} (data = {})", err_payload.message, data))
        }
        e => ChainError::Transport(e.to_string()),
    }
}
