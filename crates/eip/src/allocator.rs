//! Minting new addresses.

use tether_primitives::{AllocationId, BuildParams, ResourceLifecycle, ResourceType};
use tether_provider::AllocateRequest;
use tracing::info;

use crate::error::{EipError, PoolError};
use crate::events::{FAILED_ALLOCATE_ADDRESS, FAILED_ALLOCATE_FROM_POOL};
use crate::service::ElasticIpService;

impl ElasticIpService {
    /// Tag inputs for an address serving `role`.
    pub fn address_tag_params(&self, role: &str) -> BuildParams {
        let cluster = self.scope.cluster_name();
        BuildParams {
            cluster_name: cluster.to_owned(),
            lifecycle: ResourceLifecycle::Owned,
            name: Some(format!("{cluster}-eip-{role}")),
            role: Some(role.to_owned()),
            additional: self.scope.additional_tags().clone(),
        }
    }

    /// Allocates one new address for `role`, tagged at creation.
    pub async fn allocate_address(&self, role: &str) -> Result<AllocationId, EipError> {
        let tag_specification = self
            .address_tag_params(role)
            .to_tag_specification(ResourceType::ElasticIp);

        let selection = match self.resolve_pool().await {
            Ok(selection) => selection,
            Err(source) => {
                let reason = match source {
                    PoolError::Exhausted { .. } => FAILED_ALLOCATE_FROM_POOL,
                    _ => FAILED_ALLOCATE_ADDRESS,
                };
                self.warn_event(
                    reason,
                    &format!("Failed to allocate address for {role:?}: {source}"),
                );
                return Err(EipError::ResolvePool {
                    role: role.to_owned(),
                    source,
                });
            }
        };

        let request = AllocateRequest::new(tag_specification).with_pool(selection.pool_id().cloned());
        match self.provider.allocate_address(&request).await {
            Ok(allocated) => {
                info!(
                    role,
                    allocation_id = %allocated.allocation_id,
                    public_ip = %allocated.public_ip,
                    pool = %selection,
                    "allocated address"
                );
                self.metrics.inc_allocated();
                Ok(allocated.allocation_id)
            }
            Err(source) => {
                self.warn_event(
                    FAILED_ALLOCATE_ADDRESS,
                    &format!("Failed to allocate address for {role:?} from {selection}: {source}"),
                );
                Err(EipError::Allocate {
                    role: role.to_owned(),
                    pool: selection,
                    source,
                })
            }
        }
    }
}
