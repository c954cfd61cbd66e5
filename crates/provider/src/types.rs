//! Request and response shapes of the provider address API.

use std::fmt;
use std::net::IpAddr;

use tether_primitives::{ADDRESS_DOMAIN, AllocationId, PoolId, TagSpecification};

/// Request for a new address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocateRequest {
    pub domain: String,
    /// Bring-your-own pool to draw from; `None` draws from the provider default pool.
    pub public_ipv4_pool: Option<PoolId>,
    /// Tags applied atomically at creation.
    pub tag_specification: TagSpecification,
}

impl AllocateRequest {
    pub fn new(tag_specification: TagSpecification) -> Self {
        Self {
            domain: ADDRESS_DOMAIN.to_owned(),
            public_ipv4_pool: None,
            tag_specification,
        }
    }

    pub fn with_pool(mut self, pool: Option<PoolId>) -> Self {
        self.public_ipv4_pool = pool;
        self
    }
}

/// A freshly minted address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocatedAddress {
    pub allocation_id: AllocationId,
    pub public_ip: IpAddr,
}

/// What an address gets attached to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssociationTarget {
    Instance(String),
    NetworkInterface(String),
}

impl fmt::Display for AssociationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instance(id) => write!(f, "instance {id}"),
            Self::NetworkInterface(id) => write!(f, "network interface {id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociateRequest {
    pub allocation_id: AllocationId,
    pub target: AssociationTarget,
}

/// Capacity description of a bring-your-own pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicIpv4Pool {
    pub pool_id: PoolId,
    pub total_address_count: u64,
    pub total_available_address_count: u64,
}
