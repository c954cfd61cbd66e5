//! Attaching addresses to instances.

use tether_primitives::AssociationId;
use tether_provider::{AssociateRequest, AssociationTarget};
use tracing::{debug, info};

use crate::error::EipError;
use crate::events::FAILED_ASSOCIATE_ADDRESS;
use crate::service::ElasticIpService;

/// Role under which the address of one instance is tracked.
pub fn instance_role(instance_id: &str) -> String {
    format!("instance-{instance_id}")
}

impl ElasticIpService {
    /// Gets or allocates one address for `role` and attaches it to `target`.
    pub async fn associate_address(
        &self,
        role: &str,
        target: AssociationTarget,
    ) -> Result<AssociationId, EipError> {
        let ids = self.get_or_allocate_addresses(1, role).await?;
        let [allocation_id] = <[_; 1]>::try_from(ids).map_err(|ids| EipError::CountMismatch {
            expected: 1,
            actual: ids.len(),
            target: target.to_string(),
        })?;

        let request = AssociateRequest {
            allocation_id,
            target,
        };
        match self.provider.associate_address(&request).await {
            Ok(association_id) => {
                info!(
                    role,
                    allocation_id = %request.allocation_id,
                    %association_id,
                    target = %request.target,
                    "associated address"
                );
                Ok(association_id)
            }
            Err(source) => {
                self.warn_event(
                    FAILED_ASSOCIATE_ADDRESS,
                    &format!(
                        "Failed to associate Elastic IP {} with {}: {source}",
                        request.allocation_id, request.target
                    ),
                );
                let AssociateRequest {
                    allocation_id,
                    target,
                } = request;
                Err(EipError::Associate {
                    role: role.to_owned(),
                    allocation_id,
                    target,
                    source,
                })
            }
        }
    }

    /// Makes sure `instance_id` has an address attached.
    ///
    /// Returns the existing association when the instance's role already has
    /// an attached address.
    pub async fn reconcile_instance_address(
        &self,
        instance_id: &str,
    ) -> Result<AssociationId, EipError> {
        let role = instance_role(instance_id);
        let addresses = self.describe_addresses(&role).await?;
        if let Some(association_id) = addresses.into_iter().find_map(|a| a.association_id) {
            debug!(instance_id, %association_id, "instance already has an address");
            return Ok(association_id);
        }

        self.associate_address(&role, AssociationTarget::Instance(instance_id.to_owned()))
            .await
    }

    /// Releases every address tracked for `instance_id`.
    pub async fn release_instance_address(&self, instance_id: &str) -> Result<(), EipError> {
        self.release_address_by_role(&instance_role(instance_id))
            .await
    }
}
