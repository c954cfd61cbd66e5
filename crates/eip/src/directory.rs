//! Read path: addresses visible to this cluster.

use tether_primitives::{AddressRecord, Filter};
use tracing::debug;

use crate::error::EipError;
use crate::service::ElasticIpService;

impl ElasticIpService {
    /// Filter selecting every address of this cluster.
    pub fn cluster_filters(&self) -> Vec<Filter> {
        vec![Filter::cluster(self.scope.cluster_name())]
    }

    /// Cluster filter, plus a role filter when `role` is not empty.
    pub fn address_filters(&self, role: &str) -> Vec<Filter> {
        let mut filters = self.cluster_filters();
        if !role.is_empty() {
            filters.push(Filter::role(role));
        }
        filters
    }

    /// Addresses of this cluster, narrowed to `role` unless it is empty.
    ///
    /// Always a fresh provider query.
    pub async fn describe_addresses(&self, role: &str) -> Result<Vec<AddressRecord>, EipError> {
        self.describe_with_filters(self.address_filters(role), (!role.is_empty()).then_some(role))
            .await
    }

    pub(crate) async fn describe_with_filters(
        &self,
        filters: Vec<Filter>,
        role: Option<&str>,
    ) -> Result<Vec<AddressRecord>, EipError> {
        let addresses = self
            .provider
            .describe_addresses(&filters)
            .await
            .map_err(|source| EipError::DescribeAddresses {
                role: role.map(str::to_owned),
                source,
            })?;

        debug!(role, count = addresses.len(), "described addresses");
        Ok(addresses)
    }
}
