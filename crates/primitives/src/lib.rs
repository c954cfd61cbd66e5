//! Primitive types shared by the elastic address crates.
//!
//! Everything here is plain data: provider-assigned identifiers, the
//! [`AddressRecord`] view of a public address, the tag vocabulary used to scope
//! addresses to a cluster and role, the describe [`Filter`]s built from it, and
//! the per-allocation [`PoolSelection`].

mod address;
mod filter;
mod pool;
pub mod tags;

pub use address::{AddressRecord, AllocationId, AssociationId, PoolId};
pub use filter::Filter;
pub use pool::{FallbackOrder, PoolSelection};
pub use tags::{BuildParams, ResourceLifecycle, ResourceType, TagSpecification, Tags};

/// Allocation domain requested for every address.
pub const ADDRESS_DOMAIN: &str = "vpc";
