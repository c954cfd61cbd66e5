//! Addresses for load balancers drawn from a bring-your-own pool.

use strum::{Display, EnumString};
use tether_primitives::AllocationId;
use tracing::info;

use crate::error::EipError;
use crate::service::ElasticIpService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum LoadBalancerType {
    Application,
    Network,
    Gateway,
    Classic,
}

/// One subnet of a load balancer, optionally pinned to an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetMapping {
    pub subnet_id: String,
    pub allocation_id: Option<AllocationId>,
}

/// The parts of a load balancer creation request that carry addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBalancerRequest {
    pub name: String,
    pub lb_type: LoadBalancerType,
    pub subnets: Vec<String>,
    pub subnet_mappings: Vec<SubnetMapping>,
}

impl LoadBalancerRequest {
    pub fn new(name: impl Into<String>, lb_type: LoadBalancerType, subnets: Vec<String>) -> Self {
        Self {
            name: name.into(),
            lb_type,
            subnets,
            subnet_mappings: Vec::new(),
        }
    }
}

impl ElasticIpService {
    /// Pins one address per subnet of `request` when a pool is configured.
    ///
    /// The plain subnet list is replaced by subnet mappings. Leaves the request
    /// untouched when no bring-your-own pool is set.
    pub async fn assign_load_balancer_addresses(
        &self,
        request: &mut LoadBalancerRequest,
        role: &str,
    ) -> Result<(), EipError> {
        if self.scope.network().public_ipv4_pool().is_none() {
            return Ok(());
        }
        if request.lb_type != LoadBalancerType::Network {
            return Err(EipError::UnsupportedLoadBalancerType(request.lb_type));
        }
        if !request.subnet_mappings.is_empty() {
            return Err(EipError::SubnetMappingsConflict(request.subnet_mappings.len()));
        }

        let expected = request.subnets.len();
        let ids = self.get_or_allocate_addresses(expected, role).await?;
        if ids.len() != expected {
            return Err(EipError::CountMismatch {
                expected,
                actual: ids.len(),
                target: format!("load balancer {}", request.name),
            });
        }

        request.subnet_mappings = request
            .subnets
            .drain(..)
            .zip(ids)
            .map(|(subnet_id, allocation_id)| SubnetMapping {
                subnet_id,
                allocation_id: Some(allocation_id),
            })
            .collect();

        info!(
            load_balancer = %request.name,
            role,
            subnets = expected,
            "pinned load balancer subnets to addresses"
        );
        Ok(())
    }
}
