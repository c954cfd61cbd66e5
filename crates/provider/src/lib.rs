//! Provider address API consumed by the elastic address service.
//!
//! [`AddressProvider`] is the seam to the cloud: describe-by-filter, allocate,
//! associate, disassociate, release and pool capacity queries. [`MemoryProvider`]
//! implements it in process with the same error classification a real provider
//! uses, which the service tests drive directly.

pub mod codes;
mod error;
mod memory;
mod traits;
mod types;

pub use error::ProviderError;
pub use memory::{Call, MemoryProvider, Operation};
pub use traits::AddressProvider;
pub use types::{AllocateRequest, AllocatedAddress, AssociateRequest, AssociationTarget, PublicIpv4Pool};
