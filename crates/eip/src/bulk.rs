//! Teardown of many addresses at once.

use tether_primitives::Filter;
use tracing::info;

use crate::error::EipError;
use crate::events::FAILED_DESCRIBE_ADDRESSES;
use crate::service::ElasticIpService;

impl ElasticIpService {
    /// Releases every address of this cluster.
    pub async fn release_addresses(&self) -> Result<(), EipError> {
        self.in_span(self.release_matching(self.cluster_filters(), None))
            .await
    }

    /// Releases the addresses of this cluster tagged with `role`.
    pub async fn release_address_by_role(&self, role: &str) -> Result<(), EipError> {
        let filters = vec![Filter::cluster(self.cluster_name()), Filter::role(role)];
        self.in_span(self.release_matching(filters, Some(role))).await
    }

    /// Releases matching addresses one by one, stopping at the first failure.
    ///
    /// Addresses released before the failure stay released.
    async fn release_matching(
        &self,
        filters: Vec<Filter>,
        role: Option<&str>,
    ) -> Result<(), EipError> {
        let addresses = self
            .describe_with_filters(filters, role)
            .await
            .inspect_err(|err| {
                self.normal_event(
                    FAILED_DESCRIBE_ADDRESSES,
                    &format!("Failed to query addresses for release: {err}"),
                );
            })?;

        let total = addresses.len();
        for address in &addresses {
            self.release_address(address).await?;
        }

        if total > 0 {
            info!(role, count = total, "released addresses");
        }
        Ok(())
    }
}
