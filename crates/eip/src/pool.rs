//! Allocation source policy for bring-your-own pools.

use std::slice;

use tether_primitives::{PoolId, PoolSelection};
use tracing::{debug, info};

use crate::error::PoolError;
use crate::service::ElasticIpService;

/// Pools are resolved per allocated address.
const ADDRESSES_PER_ALLOCATION: u64 = 1;

impl ElasticIpService {
    /// Picks the pool the next address is drawn from.
    ///
    /// Without a bring-your-own pool this is always the provider default pool.
    /// With one, the pool is used while it has a free address; once it is
    /// exhausted the provider pool is used unless the fallback order is `none`.
    pub async fn resolve_pool(&self) -> Result<PoolSelection, PoolError> {
        let network = self.scope.network();
        let Some(pool) = network.public_ipv4_pool() else {
            return Ok(PoolSelection::ProviderDefault);
        };

        let available = self.public_ipv4_pool_free_ips(pool).await?;
        if available >= ADDRESSES_PER_ALLOCATION {
            return Ok(PoolSelection::Byo(pool.clone()));
        }

        let fallback = network.fallback_order();
        if !fallback.allows_fallback() {
            return Err(PoolError::Exhausted {
                pool: pool.clone(),
                requested: ADDRESSES_PER_ALLOCATION,
                available,
                fallback,
            });
        }

        info!(%pool, "public IPv4 pool exhausted, falling back to provider pool");
        self.metrics.inc_pool_fallback();
        Ok(PoolSelection::ProviderDefault)
    }

    /// Free addresses left in `pool`.
    pub async fn public_ipv4_pool_free_ips(&self, pool: &PoolId) -> Result<u64, PoolError> {
        let pools = self
            .provider
            .describe_public_ipv4_pools(slice::from_ref(pool))
            .await
            .map_err(|source| PoolError::Describe {
                pool: pool.clone(),
                source,
            })?;

        let [description] = pools.as_slice() else {
            return Err(PoolError::UnexpectedCount {
                pool: pool.clone(),
                count: pools.len(),
            });
        };

        let available = description.total_available_address_count;
        debug!(
            %pool,
            available,
            total = description.total_address_count,
            "public IPv4 pool capacity"
        );
        Ok(available)
    }
}
