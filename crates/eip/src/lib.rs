//! Lifecycle management for cloud-assigned public addresses.
//!
//! [`ElasticIpService`] hands out addresses for a role, reusing unattached
//! addresses already tagged with that role before minting new ones, and draws
//! new addresses from a bring-your-own pool when one is configured. Teardown
//! detaches and releases addresses while tolerating the provider's eventual
//! consistency ("in use" after a detach, "not found" for a detach that already
//! happened).
//!
//! All provider calls of one operation are awaited one after the other. The
//! service holds no mutable state, so callers may share it freely; two callers
//! asking for the same role at once may both be handed the same free address.

mod allocator;
mod associate;
mod bulk;
pub mod config;
mod directory;
mod error;
pub mod events;
mod load_balancer;
mod metrics;
mod orchestrator;
mod pool;
mod release;
mod scope;
mod service;

pub use associate::instance_role;
pub use config::{ConfigError, EipConfig, ElasticIpPool, NetworkSpec, RetryConfig};
pub use error::{EipError, PoolError};
pub use events::{EventKind, EventRecorder, MemoryEventRecorder, RecordedEvent, TracingEventRecorder};
pub use load_balancer::{LoadBalancerRequest, LoadBalancerType, SubnetMapping};
pub use crate::metrics::EipMetrics;
pub use scope::{ClusterScope, EipScope, ObjectRef, ScopeStage};
pub use service::ElasticIpService;
