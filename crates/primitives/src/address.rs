//! Provider-assigned identifiers and the address record.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::tags::Tags;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({:?})", stringify!($name), self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Provider identity of an allocated address. Stable for the address lifetime.
    AllocationId
);

string_id!(
    /// Identity of a live attachment between an address and a target.
    AssociationId
);

string_id!(
    /// Identity of a bring-your-own public address pool.
    PoolId
);

/// Provider view of one public address.
///
/// `association_id` is `Some` while the address is attached to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub allocation_id: AllocationId,
    pub public_ip: IpAddr,
    pub association_id: Option<AssociationId>,
    #[serde(default)]
    pub tags: Tags,
}

impl AddressRecord {
    pub fn new(allocation_id: AllocationId, public_ip: IpAddr, tags: Tags) -> Self {
        Self {
            allocation_id,
            public_ip,
            association_id: None,
            tags,
        }
    }

    pub fn is_associated(&self) -> bool {
        self.association_id.is_some()
    }

    /// Role tag, if the address carries one.
    pub fn role(&self) -> Option<&str> {
        self.tags.role()
    }
}
