//! Reuse-before-allocate entry point.

use tether_primitives::AllocationId;
use tracing::debug;

use crate::error::EipError;
use crate::events::FAILED_DESCRIBE_ADDRESSES;
use crate::service::ElasticIpService;

impl ElasticIpService {
    /// Returns `count` allocation ids for `role`, each unattached when read.
    ///
    /// Free addresses already tagged with `role` are handed out first; the rest
    /// are allocated one by one. The first failed allocation fails the call.
    /// Attaching the addresses is up to the caller, and two concurrent callers
    /// for the same role may be handed the same free address.
    pub async fn get_or_allocate_addresses(
        &self,
        count: usize,
        role: &str,
    ) -> Result<Vec<AllocationId>, EipError> {
        self.in_span(self.get_or_allocate_inner(count, role)).await
    }

    async fn get_or_allocate_inner(
        &self,
        count: usize,
        role: &str,
    ) -> Result<Vec<AllocationId>, EipError> {
        if role.is_empty() {
            return Err(EipError::EmptyRole);
        }

        let addresses = self.describe_addresses(role).await.inspect_err(|err| {
            self.normal_event(
                FAILED_DESCRIBE_ADDRESSES,
                &format!("Failed to query addresses for role {role:?}: {err}"),
            );
        })?;

        let mut ids: Vec<AllocationId> = addresses
            .into_iter()
            .filter(|address| !address.is_associated())
            .map(|address| address.allocation_id)
            .take(count)
            .collect();
        let reused = ids.len();
        self.metrics.inc_reused(reused);

        while ids.len() < count {
            ids.push(self.allocate_address(role).await?);
        }

        debug!(role, count, reused, allocated = count - reused, "addresses ready");
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use assert_matches::assert_matches;
    use tether_primitives::{AddressRecord, AssociationId, BuildParams, ResourceLifecycle};
    use tether_provider::{MemoryProvider, Operation, ProviderError};

    use super::*;
    use crate::config::EipConfig;
    use crate::events::MemoryEventRecorder;
    use crate::scope::ScopeStage;

    fn seed(provider: &MemoryProvider, id: &str, role: &str, associated: bool) -> AllocationId {
        let tags = BuildParams {
            cluster_name: "prod".into(),
            lifecycle: ResourceLifecycle::Owned,
            role: Some(role.into()),
            ..Default::default()
        }
        .build();
        let mut record =
            AddressRecord::new(AllocationId::new(id), "192.0.2.1".parse().unwrap(), tags);
        if associated {
            record.association_id = Some(AssociationId::new(format!("assoc-{id}")));
        }
        provider.insert(record).allocation_id
    }

    fn service(provider: Arc<MemoryProvider>) -> (ElasticIpService, Arc<MemoryEventRecorder>) {
        let events = Arc::new(MemoryEventRecorder::new());
        let svc = ElasticIpService::from_config(provider, ScopeStage::Network, EipConfig::new("prod"))
            .with_events(events.clone());
        (svc, events)
    }

    #[tokio::test]
    async fn test_empty_directory_allocates_exactly_count() {
        let provider = Arc::new(MemoryProvider::new());
        let (svc, _) = service(provider.clone());

        let ids = svc.get_or_allocate_addresses(3, "worker").await.unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 3);
        assert_eq!(provider.count(Operation::AllocateAddress), 3);
    }

    #[tokio::test]
    async fn test_reuses_free_addresses_first() {
        let provider = Arc::new(MemoryProvider::new());
        let free = seed(&provider, "free-1", "lb", false);
        seed(&provider, "busy-1", "lb", true);
        let (svc, _) = service(provider.clone());

        let ids = svc.get_or_allocate_addresses(2, "lb").await.unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], free);
        assert!(!ids.contains(&AllocationId::new("busy-1")));
        assert_eq!(provider.count(Operation::AllocateAddress), 1);
    }

    #[tokio::test]
    async fn test_more_free_than_needed_returns_exactly_count() {
        let provider = Arc::new(MemoryProvider::new());
        for i in 0..4 {
            seed(&provider, &format!("free-{i}"), "lb", false);
        }
        let (svc, _) = service(provider.clone());

        let ids = svc.get_or_allocate_addresses(2, "lb").await.unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(provider.count(Operation::AllocateAddress), 0);
    }

    #[tokio::test]
    async fn test_zero_count() {
        let provider = Arc::new(MemoryProvider::new());
        seed(&provider, "free-1", "lb", false);
        let (svc, _) = service(provider.clone());

        assert!(svc.get_or_allocate_addresses(0, "lb").await.unwrap().is_empty());
        assert_eq!(provider.count(Operation::AllocateAddress), 0);
    }

    #[tokio::test]
    async fn test_other_roles_are_not_reused() {
        let provider = Arc::new(MemoryProvider::new());
        let other = seed(&provider, "free-bastion", "bastion", false);
        let (svc, _) = service(provider.clone());

        let ids = svc.get_or_allocate_addresses(1, "lb").await.unwrap();
        assert_ne!(ids[0], other);
        assert_eq!(provider.count(Operation::AllocateAddress), 1);
    }

    #[tokio::test]
    async fn test_empty_role_rejected() {
        let (svc, _) = service(Arc::new(MemoryProvider::new()));
        assert_matches!(
            svc.get_or_allocate_addresses(1, "").await,
            Err(EipError::EmptyRole)
        );
    }

    #[tokio::test]
    async fn test_allocation_failure_aborts_whole_call() {
        let provider = Arc::new(MemoryProvider::new());
        provider.pass_next(Operation::AllocateAddress);
        provider.fail_next(Operation::AllocateAddress, ProviderError::transport("reset"));
        let (svc, _) = service(provider.clone());

        let err = svc.get_or_allocate_addresses(3, "worker").await.unwrap_err();
        assert_matches!(err, EipError::Allocate { .. });
        assert_eq!(provider.count(Operation::AllocateAddress), 2);
    }

    #[tokio::test]
    async fn test_describe_failure_records_event() {
        let provider = Arc::new(MemoryProvider::new());
        provider.fail_next(Operation::DescribeAddresses, ProviderError::auth_failure());
        let (svc, events) = service(provider.clone());

        let err = svc.get_or_allocate_addresses(1, "lb").await.unwrap_err();
        assert_matches!(err, EipError::DescribeAddresses { .. });
        assert_eq!(events.reasons(), vec![FAILED_DESCRIBE_ADDRESSES]);
        assert_eq!(provider.count(Operation::AllocateAddress), 0);
    }
}
