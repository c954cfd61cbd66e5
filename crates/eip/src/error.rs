use std::net::IpAddr;

use tether_primitives::{AllocationId, AssociationId, FallbackOrder, PoolId, PoolSelection};
use tether_provider::{AssociationTarget, ProviderError};
use tether_wait::WaitError;
use thiserror::Error;

use crate::load_balancer::LoadBalancerType;

/// Failure to pick an allocation source.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to describe public IPv4 pool {pool}")]
    Describe {
        pool: PoolId,
        #[source]
        source: ProviderError,
    },
    #[error("unexpected number of public IPv4 pools for {pool}: want 1, got {count}")]
    UnexpectedCount { pool: PoolId, count: usize },
    #[error(
        "public IPv4 pool {pool} cannot serve the allocation (want {requested}, available {available}) and fallback order is {fallback}"
    )]
    Exhausted {
        pool: PoolId,
        requested: u64,
        available: u64,
        fallback: FallbackOrder,
    },
}

#[derive(Debug, Error)]
pub enum EipError {
    #[error("failed to query addresses for role {role:?}")]
    DescribeAddresses {
        role: Option<String>,
        #[source]
        source: ProviderError,
    },
    #[error("role must not be empty")]
    EmptyRole,
    #[error("failed to select an allocation pool for role {role:?}")]
    ResolvePool {
        role: String,
        #[source]
        source: PoolError,
    },
    #[error("failed to allocate address for role {role:?} from {pool}")]
    Allocate {
        role: String,
        pool: PoolSelection,
        #[source]
        source: ProviderError,
    },
    #[error("expected {expected} addresses for {target}, got {actual}")]
    CountMismatch {
        expected: usize,
        actual: usize,
        target: String,
    },
    #[error("failed to associate address {allocation_id} for role {role:?} to {target}")]
    Associate {
        role: String,
        allocation_id: AllocationId,
        target: AssociationTarget,
        #[source]
        source: ProviderError,
    },
    #[error("failed to disassociate address {allocation_id} ({public_ip})")]
    Disassociate {
        allocation_id: AllocationId,
        public_ip: IpAddr,
        #[source]
        source: WaitError<ProviderError>,
    },
    #[error(
        "address {allocation_id} ({public_ip}) is still associated with {association_id}"
    )]
    StillAssociated {
        allocation_id: AllocationId,
        public_ip: IpAddr,
        association_id: AssociationId,
        #[source]
        source: ProviderError,
    },
    #[error("failed to release address {allocation_id} ({public_ip})")]
    Release {
        allocation_id: AllocationId,
        public_ip: IpAddr,
        #[source]
        source: WaitError<ProviderError>,
    },
    #[error("bring-your-own address pools require a network load balancer, got {0}")]
    UnsupportedLoadBalancerType(LoadBalancerType),
    #[error(
        "bring-your-own address pools are mutually exclusive with subnet mappings ({0} configured)"
    )]
    SubnetMappingsConflict(usize),
}

impl EipError {
    /// Underlying provider error, if the failure came from the provider.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::DescribeAddresses { source, .. }
            | Self::Allocate { source, .. }
            | Self::Associate { source, .. }
            | Self::StillAssociated { source, .. } => Some(source),
            Self::ResolvePool {
                source: PoolError::Describe { source, .. },
                ..
            } => Some(source),
            Self::Disassociate { source, .. } | Self::Release { source, .. } => {
                source.last_error()
            }
            _ => None,
        }
    }
}
