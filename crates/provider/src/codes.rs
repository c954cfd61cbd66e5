//! Provider error codes the service classifies.

/// Credentials not (yet) accepted. Seen transiently right after credential rotation.
pub const AUTH_FAILURE: &str = "AuthFailure";

/// Release refused because the address is still attached to a target.
pub const IN_USE_IP_ADDRESS: &str = "InvalidIPAddress.InUse";

/// Disassociation of an association that no longer exists.
pub const ASSOCIATION_ID_NOT_FOUND: &str = "InvalidAssociationID.NotFound";

/// Unknown allocation id.
pub const ALLOCATION_ID_NOT_FOUND: &str = "InvalidAllocationID.NotFound";

/// Unknown public address pool.
pub const PUBLIC_IPV4_POOL_NOT_FOUND: &str = "InvalidPublicIpv4PoolID.NotFound";

/// Pool has no free address left.
pub const INSUFFICIENT_ADDRESS_CAPACITY: &str = "InsufficientAddressCapacity";

/// Target already has an address attached.
pub const RESOURCE_ALREADY_ASSOCIATED: &str = "Resource.AlreadyAssociated";

/// API rate limit hit.
pub const REQUEST_LIMIT_EXCEEDED: &str = "RequestLimitExceeded";
