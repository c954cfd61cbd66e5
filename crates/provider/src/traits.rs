use async_trait::async_trait;
use tether_primitives::{AddressRecord, AllocationId, AssociationId, Filter, PoolId};

use crate::error::ProviderError;
use crate::types::{AllocateRequest, AllocatedAddress, AssociateRequest, PublicIpv4Pool};

/// Provider address API.
///
/// Every call reflects the provider's current view. Implementations must not
/// cache: addresses are mutated by actors outside this process at any time.
#[async_trait]
pub trait AddressProvider: Send + Sync {
    /// Addresses matching every filter.
    async fn describe_addresses(
        &self,
        filters: &[Filter],
    ) -> Result<Vec<AddressRecord>, ProviderError>;

    async fn allocate_address(
        &self,
        request: &AllocateRequest,
    ) -> Result<AllocatedAddress, ProviderError>;

    async fn associate_address(
        &self,
        request: &AssociateRequest,
    ) -> Result<AssociationId, ProviderError>;

    async fn disassociate_address(&self, association_id: &AssociationId)
    -> Result<(), ProviderError>;

    async fn release_address(&self, allocation_id: &AllocationId) -> Result<(), ProviderError>;

    async fn describe_public_ipv4_pools(
        &self,
        pool_ids: &[PoolId],
    ) -> Result<Vec<PublicIpv4Pool>, ProviderError>;
}
