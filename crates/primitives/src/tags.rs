//! Tag vocabulary and tag-specification builder.
//!
//! Every address created through this workspace carries a cluster ownership tag
//! (`tether.io/cluster/<cluster>`), a role tag and a `Name`. Describe filters
//! rely on the first two, so addresses of other clusters are never visible.

use std::collections::BTreeMap;
use std::collections::btree_map;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Human readable name tag.
pub const NAME_KEY: &str = "Name";

/// Prefix of the per-cluster ownership key. The value is a [`ResourceLifecycle`].
pub const CLUSTER_KEY_PREFIX: &str = "tether.io/cluster/";

/// Role tag key.
pub const ROLE_KEY: &str = "tether.io/role";

/// Ownership tag key for `cluster`.
pub fn cluster_key(cluster: &str) -> String {
    format!("{CLUSTER_KEY_PREFIX}{cluster}")
}

/// Ordered tag map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(BTreeMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn role(&self) -> Option<&str> {
        self.get(ROLE_KEY)
    }

    /// Lifecycle recorded for `cluster`, if this resource belongs to it.
    pub fn cluster_lifecycle(&self, cluster: &str) -> Option<&str> {
        self.get(&cluster_key(cluster))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Tags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Tags {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.0
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Whether the cluster owns the resource or merely uses it.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceLifecycle {
    #[default]
    Owned,
    Shared,
}

/// Provider resource type a tag specification applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum ResourceType {
    #[strum(serialize = "elastic-ip")]
    ElasticIp,
}

/// Tags attached to a resource at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpecification {
    pub resource_type: ResourceType,
    pub tags: Tags,
}

/// Inputs for building the tag set of a cluster resource.
#[derive(Debug, Clone, Default)]
pub struct BuildParams {
    pub cluster_name: String,
    pub lifecycle: ResourceLifecycle,
    pub name: Option<String>,
    pub role: Option<String>,
    pub additional: Tags,
}

impl BuildParams {
    /// Additional tags first, so the ownership, role and name keys always win.
    pub fn build(&self) -> Tags {
        let mut tags = self.additional.clone();
        tags.insert(cluster_key(&self.cluster_name), self.lifecycle.to_string());
        if let Some(role) = &self.role {
            tags.insert(ROLE_KEY, role.clone());
        }
        if let Some(name) = &self.name {
            tags.insert(NAME_KEY, name.clone());
        }
        tags
    }

    pub fn to_tag_specification(&self, resource_type: ResourceType) -> TagSpecification {
        TagSpecification {
            resource_type,
            tags: self.build(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_params_tags() {
        let params = BuildParams {
            cluster_name: "prod".into(),
            lifecycle: ResourceLifecycle::Owned,
            name: Some("prod-eip-bastion".into()),
            role: Some("bastion".into()),
            additional: [("team", "platform")].into_iter().collect(),
        };

        let spec = params.to_tag_specification(ResourceType::ElasticIp);
        assert_eq!(spec.resource_type.to_string(), "elastic-ip");
        assert_eq!(spec.tags.len(), 4);
        assert_eq!(spec.tags.get("tether.io/cluster/prod"), Some("owned"));
        assert_eq!(spec.tags.role(), Some("bastion"));
        assert_eq!(spec.tags.get(NAME_KEY), Some("prod-eip-bastion"));
        assert_eq!(spec.tags.get("team"), Some("platform"));
    }

    #[test]
    fn test_additional_tags_cannot_override_ownership() {
        let params = BuildParams {
            cluster_name: "prod".into(),
            role: Some("bastion".into()),
            additional: [(ROLE_KEY, "spoofed"), ("tether.io/cluster/prod", "shared")]
                .into_iter()
                .collect(),
            ..Default::default()
        };

        let tags = params.build();
        assert_eq!(tags.role(), Some("bastion"));
        assert_eq!(tags.cluster_lifecycle("prod"), Some("owned"));
    }

    #[test]
    fn test_lifecycle_parse() {
        assert_eq!("shared".parse::<ResourceLifecycle>().unwrap(), ResourceLifecycle::Shared);
        assert_eq!(ResourceLifecycle::Owned.to_string(), "owned");
    }
}
