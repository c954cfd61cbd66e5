//! Describe filters over resource tags.

use std::fmt;

use crate::tags::{ROLE_KEY, Tags, cluster_key};

/// A single describe filter. A describe call matches resources satisfying every filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// Resource has a tag with this key, whatever its value.
    TagKey(String),
    /// Resource has tag `key` with one of `values`.
    Tag { key: String, values: Vec<String> },
}

impl Filter {
    /// Resources owned by or shared with `cluster`.
    pub fn cluster(cluster: &str) -> Self {
        Self::TagKey(cluster_key(cluster))
    }

    /// Resources tagged with `role`.
    pub fn role(role: &str) -> Self {
        Self::Tag {
            key: ROLE_KEY.to_owned(),
            values: vec![role.to_owned()],
        }
    }

    pub fn matches(&self, tags: &Tags) -> bool {
        match self {
            Self::TagKey(key) => tags.contains_key(key),
            Self::Tag { key, values } => tags
                .get(key)
                .is_some_and(|value| values.iter().any(|v| v == value)),
        }
    }

    /// Returns true if all `filters` match `tags`.
    pub fn match_all(filters: &[Filter], tags: &Tags) -> bool {
        filters.iter().all(|f| f.matches(tags))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagKey(key) => write!(f, "tag-key={key}"),
            Self::Tag { key, values } => write!(f, "tag:{key}={}", values.join(",")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(cluster: &str, role: &str) -> Tags {
        [(cluster_key(cluster), "owned".to_owned()), (ROLE_KEY.to_owned(), role.to_owned())]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_cluster_filter() {
        let filter = Filter::cluster("prod");
        assert!(filter.matches(&tags("prod", "a")));
        assert!(!filter.matches(&tags("staging", "a")));
        assert_eq!(filter.to_string(), "tag-key=tether.io/cluster/prod");
    }

    #[test]
    fn test_role_filter() {
        let filter = Filter::role("bastion");
        assert!(filter.matches(&tags("prod", "bastion")));
        assert!(!filter.matches(&tags("prod", "bastion-2")));
        assert!(!filter.matches(&Tags::new()));
    }

    #[test]
    fn test_match_all() {
        let filters = [Filter::cluster("prod"), Filter::role("lb")];
        assert!(Filter::match_all(&filters, &tags("prod", "lb")));
        assert!(!Filter::match_all(&filters, &tags("staging", "lb")));
        assert!(!Filter::match_all(&filters, &tags("prod", "bastion")));
        assert!(Filter::match_all(&[], &Tags::new()));
    }
}
