//! Read-only view of the cluster a service acts for.

use std::fmt;

use strum::Display;
use tether_primitives::Tags;

use crate::config::{EipConfig, NetworkSpec};

/// Calling context a scope was built for. Attached to every log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ScopeStage {
    Network,
    Instance,
    LoadBalancer,
}

/// Object events are attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub kind: String,
    pub name: String,
}

impl ObjectRef {
    pub fn cluster(name: impl Into<String>) -> Self {
        Self {
            kind: "Cluster".to_owned(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)
    }
}

/// Capabilities the address service needs from its caller.
pub trait EipScope: Send + Sync + fmt::Debug {
    fn cluster_name(&self) -> &str;
    fn additional_tags(&self) -> &Tags;
    fn network(&self) -> &NetworkSpec;
    fn infra_cluster(&self) -> &ObjectRef;
    fn stage(&self) -> ScopeStage;
}

/// Scope backed by a static [`EipConfig`] snapshot.
#[derive(Debug, Clone)]
pub struct ClusterScope {
    stage: ScopeStage,
    cluster: ObjectRef,
    config: EipConfig,
}

impl ClusterScope {
    pub fn new(stage: ScopeStage, config: EipConfig) -> Self {
        Self {
            stage,
            cluster: ObjectRef::cluster(config.cluster_name.clone()),
            config,
        }
    }

    /// Attributes events to `object` instead of the cluster itself.
    pub fn with_object(mut self, object: ObjectRef) -> Self {
        self.cluster = object;
        self
    }
}

impl EipScope for ClusterScope {
    fn cluster_name(&self) -> &str {
        &self.config.cluster_name
    }

    fn additional_tags(&self) -> &Tags {
        &self.config.additional_tags
    }

    fn network(&self) -> &NetworkSpec {
        &self.config.network
    }

    fn infra_cluster(&self) -> &ObjectRef {
        &self.cluster
    }

    fn stage(&self) -> ScopeStage {
        self.stage
    }
}
