//! Allocation source selection.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::address::PoolId;

/// What to do when the bring-your-own pool has no free addresses.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum FallbackOrder {
    /// Fall back to the provider's default pool.
    #[default]
    ProviderPool,
    /// Fail the allocation instead.
    None,
}

impl FallbackOrder {
    pub fn allows_fallback(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Source of a single allocation. Recomputed for every address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolSelection {
    /// Draw from the configured bring-your-own pool.
    Byo(PoolId),
    /// Draw from the provider's default pool.
    ProviderDefault,
}

impl PoolSelection {
    pub fn pool_id(&self) -> Option<&PoolId> {
        match self {
            Self::Byo(id) => Some(id),
            Self::ProviderDefault => None,
        }
    }
}

impl fmt::Display for PoolSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byo(id) => write!(f, "pool {id}"),
            Self::ProviderDefault => f.write_str("provider default pool"),
        }
    }
}
