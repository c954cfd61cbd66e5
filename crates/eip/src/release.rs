//! Detaching and releasing one address.
//!
//! Release runs as a small state machine over one backoff schedule: each
//! attempt releases the address, and an "in use" answer switches the next
//! attempt to detach first. A failed inline detach ends the loop.

use tether_primitives::{AddressRecord, AssociationId};
use tether_provider::{ProviderError, codes};
use tether_wait::{WaitError, is_retryable, wait_for_with_retryable};
use tracing::{debug, info};

use crate::error::EipError;
use crate::events::{FAILED_DISASSOCIATE_ADDRESS, FAILED_RELEASE_ADDRESS};
use crate::service::ElasticIpService;

/// Codes retried while detaching.
const DISASSOCIATE_RETRYABLE: &[&str] = &[codes::AUTH_FAILURE, codes::REQUEST_LIMIT_EXCEEDED];

/// Codes retried while releasing.
const RELEASE_RETRYABLE: &[&str] = &[
    codes::AUTH_FAILURE,
    codes::REQUEST_LIMIT_EXCEEDED,
    codes::IN_USE_IP_ADDRESS,
];

/// Next action of the release loop.
#[derive(Debug, Clone, Copy)]
enum Step<'a> {
    Release,
    Disassociate(&'a AssociationId),
}

impl ElasticIpService {
    /// Detaches `address` if it is associated, then releases it.
    ///
    /// An association that no longer exists counts as detached.
    pub async fn release_address(&self, address: &AddressRecord) -> Result<(), EipError> {
        self.in_span(self.release_inner(address)).await
    }

    /// Detaches `address` from its target, retrying auth failures and throttling.
    ///
    /// Does nothing for an address without an association.
    pub async fn disassociate_address(&self, address: &AddressRecord) -> Result<(), EipError> {
        let Some(association_id) = &address.association_id else {
            return Ok(());
        };

        let outcome = wait_for_with_retryable(
            &self.backoff,
            DISASSOCIATE_RETRYABLE,
            move || async move {
                match self.provider.disassociate_address(association_id).await {
                    Ok(()) => Ok(true),
                    Err(err) if err.is_code(codes::ASSOCIATION_ID_NOT_FOUND) => {
                        debug!(%association_id, "association already gone");
                        Ok(true)
                    }
                    Err(err) => Err(err),
                }
            },
        )
        .await;

        outcome.map_err(|source| {
            self.warn_event(
                FAILED_DISASSOCIATE_ADDRESS,
                &format!(
                    "Failed to disassociate Elastic IP {} ({}): {source}",
                    address.allocation_id, address.public_ip
                ),
            );
            EipError::Disassociate {
                allocation_id: address.allocation_id.clone(),
                public_ip: address.public_ip,
                source,
            }
        })
    }

    async fn release_inner(&self, address: &AddressRecord) -> Result<(), EipError> {
        self.disassociate_address(address).await?;

        let mut step = Step::Release;
        let mut attempts = 0;
        let mut last = None;

        for delay in self.backoff.delays() {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempts += 1;

            if let Step::Disassociate(association_id) = step {
                self.disassociate_once(address, association_id).await?;
                step = Step::Release;
            }

            match self.provider.release_address(&address.allocation_id).await {
                Ok(()) => {
                    info!(
                        allocation_id = %address.allocation_id,
                        public_ip = %address.public_ip,
                        attempts,
                        "released address"
                    );
                    self.metrics.inc_released();
                    return Ok(());
                }
                Err(err) if is_retryable(&err, RELEASE_RETRYABLE) => {
                    debug!(allocation_id = %address.allocation_id, attempts, %err, "release not accepted yet");
                    if err.is_code(codes::IN_USE_IP_ADDRESS) {
                        if let Some(association_id) = &address.association_id {
                            step = Step::Disassociate(association_id);
                        }
                    }
                    self.metrics.inc_release_retries();
                    last = Some(err);
                }
                Err(err) => return Err(self.release_failed(address, WaitError::Terminal(err))),
            }
        }

        let source = match last {
            Some(last) => WaitError::Exhausted { attempts, last },
            None => WaitError::Timeout { attempts },
        };
        Err(self.release_failed(address, source))
    }

    /// One detach attempt from inside the release loop.
    async fn disassociate_once(
        &self,
        address: &AddressRecord,
        association_id: &AssociationId,
    ) -> Result<(), EipError> {
        match self.provider.disassociate_address(association_id).await {
            Ok(()) => Ok(()),
            Err(err) if err.is_code(codes::ASSOCIATION_ID_NOT_FOUND) => Ok(()),
            Err(source) => {
                self.warn_event(
                    FAILED_DISASSOCIATE_ADDRESS,
                    &format!(
                        "Failed to disassociate Elastic IP {} ({}) before release: {source}",
                        address.allocation_id, address.public_ip
                    ),
                );
                Err(EipError::StillAssociated {
                    allocation_id: address.allocation_id.clone(),
                    public_ip: address.public_ip,
                    association_id: association_id.clone(),
                    source,
                })
            }
        }
    }

    fn release_failed(&self, address: &AddressRecord, source: WaitError<ProviderError>) -> EipError {
        self.warn_event(
            FAILED_RELEASE_ADDRESS,
            &format!(
                "Failed to release Elastic IP {} ({}): {source}",
                address.allocation_id, address.public_ip
            ),
        );
        EipError::Release {
            allocation_id: address.allocation_id.clone(),
            public_ip: address.public_ip,
            source,
        }
    }
}
