//! The nominate-then-accept handshake through which a proxy adopts a newly
//! deployed implementation

use std::sync::Arc;

use alloy::{dyn_abi::DynSolValue, primitives::Address};
use tracing::{info, warn};

use crate::{
    chain::ChainClient,
    constants::{BECOME_SIGNATURE, SET_PENDING_IMPLEMENTATION_SIGNATURE},
    errors::{AdoptionError, ChainError},
    types::{AddressRole, AdoptionReceipt, CallReceipt, ImplementationRef, ProxyRef, ProxyState},
};

/// The outcome of an adoption attempt
pub type AdoptionResult = Result<AdoptionReceipt, AdoptionError>;

/// Drives the two-step handover of a proxy to a candidate implementation.
///
/// The proxy first nominates the candidate as its pending implementation,
/// then the candidate accepts the proxy, flipping the proxy's current
/// implementation. The second step is only submitted once the first is
/// confirmed, and no step is ever retried automatically.
pub struct ProxyAdoptionOrchestrator<C: ChainClient> {
    /// The client used to call the proxy and implementation
    client: Arc<C>,
    /// Whether to read the proxy's current implementation back after
    /// acceptance
    verify: bool,
}

impl<C: ChainClient> ProxyAdoptionOrchestrator<C> {
    /// An orchestrator that verifies each adoption on-chain
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            verify: true,
        }
    }

    /// Enable or disable the post-acceptance read of the proxy's current
    /// implementation
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Transfer control of `proxy` to `candidate`
    pub async fn adopt(&self, proxy: &ProxyRef, candidate: &ImplementationRef) -> AdoptionResult {
        self.resolve(proxy.address, candidate.address).await?;

        let nomination = self.nominate(proxy.address, candidate.address).await?;
        let acceptance = self.accept_pending(proxy.address, candidate.address).await?;
        let verified = self.verify_adopted(proxy, candidate.address).await?;

        info!(
            "{} implementation {:#x} adopted by proxy {:#x}",
            candidate.kind, candidate.address, proxy.address
        );

        Ok(AdoptionReceipt {
            proxy: proxy.address,
            implementation: candidate.address,
            nomination: Some(nomination),
            acceptance,
            verified,
        })
    }

    /// Run only the acceptance step, for a proxy already holding `candidate`
    /// as its pending implementation
    pub async fn accept(&self, proxy: &ProxyRef, candidate: &ImplementationRef) -> AdoptionResult {
        self.resolve(proxy.address, candidate.address).await?;

        if self.verify {
            match self.observe(proxy).await {
                Ok(state) if !state.is_pending(candidate.address) => warn!(
                    "proxy {:#x} has {:#x} pending and {:#x} current, acceptance by {:#x} will \
                     likely fail",
                    proxy.address, state.pending, state.current, candidate.address
                ),
                Ok(_) => {}
                Err(e) => warn!("could not read state of proxy {:#x}: {}", proxy.address, e),
            }
        }

        let acceptance = self.accept_pending(proxy.address, candidate.address).await?;
        let verified = self.verify_adopted(proxy, candidate.address).await?;

        info!(
            "{} implementation {:#x} accepted proxy {:#x}",
            candidate.kind, candidate.address, proxy.address
        );

        Ok(AdoptionReceipt {
            proxy: proxy.address,
            implementation: candidate.address,
            nomination: None,
            acceptance,
            verified,
        })
    }

    /// Have `proxy` nominate `candidate` as its pending implementation
    pub async fn nominate(
        &self,
        proxy: Address,
        candidate: Address,
    ) -> Result<CallReceipt, AdoptionError> {
        let receipt = self
            .client
            .call(proxy, SET_PENDING_IMPLEMENTATION_SIGNATURE, &[DynSolValue::Address(candidate)])
            .await
            .map_err(|source| AdoptionError::NominationFailed {
                proxy,
                candidate,
                source,
            })?;

        info!("proxy {:#x} requested implementation {:#x}", proxy, candidate);
        Ok(receipt)
    }

    /// Have `candidate` accept control of `proxy`
    async fn accept_pending(
        &self,
        proxy: Address,
        candidate: Address,
    ) -> Result<CallReceipt, AdoptionError> {
        let receipt = self
            .client
            .call(candidate, BECOME_SIGNATURE, &[DynSolValue::Address(proxy)])
            .await
            .map_err(|source| AdoptionError::AcceptanceFailed {
                proxy,
                candidate,
                source,
            })?;

        info!("implementation {:#x} accepted proxy {:#x}", candidate, proxy);
        Ok(receipt)
    }

    /// Read the proxy's pending and current implementations
    pub async fn observe(&self, proxy: &ProxyRef) -> Result<ProxyState, ChainError> {
        let pending = self.client.read_address(proxy.address, &proxy.slots.pending).await?;
        let current = self.client.read_address(proxy.address, &proxy.slots.current).await?;
        Ok(ProxyState { pending, current })
    }

    /// Check that the proxy reports `candidate` as its current
    /// implementation, returning whether the check ran
    async fn verify_adopted(
        &self,
        proxy: &ProxyRef,
        candidate: Address,
    ) -> Result<bool, AdoptionError> {
        if !self.verify {
            return Ok(false);
        }

        let observed = self
            .client
            .read_address(proxy.address, &proxy.slots.current)
            .await
            .map_err(|source| AdoptionError::VerificationFailed {
                proxy: proxy.address,
                candidate,
                source,
            })?;

        if observed != candidate {
            return Err(AdoptionError::ConsistencyMismatch {
                proxy: proxy.address,
                expected: candidate,
                observed,
            });
        }

        Ok(true)
    }

    /// Check that both sides of the handshake hold contract code
    async fn resolve(&self, proxy: Address, candidate: Address) -> Result<(), AdoptionError> {
        for (role, address) in [
            (AddressRole::Proxy, proxy),
            (AddressRole::Implementation, candidate),
        ] {
            let deployed = self.client.is_deployed(address).await.map_err(|e| {
                AdoptionError::AddressUnresolved {
                    role,
                    address,
                    reason: e.to_string(),
                }
            })?;

            if !deployed {
                return Err(AdoptionError::AddressUnresolved {
                    role,
                    address,
                    reason: "no contract code at address".to_string(),
                });
            }
        }

        Ok(())
    }
}
