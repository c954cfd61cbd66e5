//! End-to-end address lifecycle against the in-memory provider.

use std::sync::Arc;

use assert_matches::assert_matches;
use tether_eip::{
    EipConfig, EipError, ElasticIpService, MemoryEventRecorder, PoolError, ScopeStage,
    events::FAILED_ALLOCATE_FROM_POOL,
};
use tether_observability::init_test_logging;
use tether_primitives::PoolId;
use tether_provider::{AddressProvider, AssociationTarget, MemoryProvider, Operation, ProviderError};
use tether_wait::{Backoff, WaitError};

const CONFIG: &str = r#"
cluster_name = "prod-eu"

[additional_tags]
team = "platform"

[network.elastic_ip_pool]
public_ipv4_pool = "ipv4pool-1"

[retry]
initial_delay_ms = 0
steps = 3
"#;

fn service(
    provider: Arc<MemoryProvider>,
    config: EipConfig,
) -> (ElasticIpService, Arc<MemoryEventRecorder>) {
    init_test_logging();
    let events = Arc::new(MemoryEventRecorder::new());
    let svc = ElasticIpService::from_config(provider, ScopeStage::Network, config)
        .with_backoff(Backoff::immediate(3))
        .with_events(events.clone());
    (svc, events)
}

#[tokio::test]
async fn test_pool_then_fallback_then_teardown() {
    let provider = Arc::new(MemoryProvider::new().with_pool("ipv4pool-1", 2));
    let (svc, events) = service(provider.clone(), EipConfig::from_toml_str(CONFIG).unwrap());

    let ids = svc.get_or_allocate_addresses(3, "worker").await.unwrap();
    assert_eq!(ids.len(), 3);

    let pool = PoolId::new("ipv4pool-1");
    let from_pool = ids
        .iter()
        .filter(|id| provider.address_pool(id).as_ref() == Some(&pool))
        .count();
    assert_eq!(from_pool, 2);
    assert_eq!(provider.pool_available(&pool), Some(0));
    assert!(events.is_empty());

    for address in provider.addresses() {
        assert_eq!(address.tags.get("team"), Some("platform"));
        assert_eq!(address.tags.get("Name"), Some("prod-eu-eip-worker"));
    }

    // Attach one, then tear the whole cluster down.
    provider
        .associate_address(&tether_provider::AssociateRequest {
            allocation_id: ids[0].clone(),
            target: AssociationTarget::Instance("i-1".into()),
        })
        .await
        .unwrap();

    svc.release_addresses().await.unwrap();
    assert!(provider.addresses().is_empty());
    assert_eq!(provider.pool_available(&pool), Some(2));
    assert_eq!(provider.count(Operation::DisassociateAddress), 1);
}

#[tokio::test]
async fn test_exhausted_pool_without_fallback() {
    let provider = Arc::new(MemoryProvider::new().with_pool("ipv4pool-1", 1));
    let config = EipConfig::from_toml_str(&CONFIG.replace(
        "public_ipv4_pool = \"ipv4pool-1\"",
        "public_ipv4_pool = \"ipv4pool-1\"\nfallback_order = \"none\"",
    ))
    .unwrap();
    let (svc, events) = service(provider.clone(), config);

    let err = svc.get_or_allocate_addresses(2, "lb").await.unwrap_err();
    assert_matches!(
        err,
        EipError::ResolvePool { source: PoolError::Exhausted { available: 0, .. }, .. }
    );
    // The first address was allocated before the pool ran dry.
    assert_eq!(provider.count(Operation::AllocateAddress), 1);
    assert_eq!(events.reasons(), vec![FAILED_ALLOCATE_FROM_POOL]);

    // The orphan is free and picked up on the next call once capacity returns.
    provider.set_pool_available("ipv4pool-1", 1);
    let ids = svc.get_or_allocate_addresses(2, "lb").await.unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(provider.count(Operation::AllocateAddress), 2);
}

#[tokio::test]
async fn test_exact_count_from_empty_directory() {
    let provider = Arc::new(MemoryProvider::new());
    let (svc, _) = service(provider.clone(), EipConfig::new("prod"));

    let ids = svc.get_or_allocate_addresses(3, "worker").await.unwrap();
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 3);
    for id in &ids {
        let record = provider.get(id).unwrap();
        assert_eq!(record.role(), Some("worker"));
        assert!(!record.is_associated());
    }
}

#[tokio::test]
async fn test_idempotent_disassociate_during_release() {
    let provider = Arc::new(MemoryProvider::new());
    let (svc, events) = service(provider.clone(), EipConfig::new("prod"));

    let association = svc.reconcile_instance_address("i-1").await.unwrap();
    let snapshot = svc.describe_addresses("instance-i-1").await.unwrap();
    assert_eq!(snapshot[0].association_id.as_ref(), Some(&association));

    // Someone else detaches the address between our read and our release.
    provider.detach_externally(&snapshot[0].allocation_id);
    svc.release_address(&snapshot[0]).await.unwrap();

    assert_eq!(provider.count(Operation::DisassociateAddress), 1);
    assert!(provider.addresses().is_empty());
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_release_retries_through_in_use() {
    let provider = Arc::new(MemoryProvider::new());
    let (svc, _) = service(provider.clone(), EipConfig::new("prod"));
    svc.reconcile_instance_address("i-1").await.unwrap();
    provider.clear_journal();

    // The provider keeps reporting "in use" for a moment after the detach.
    let id = provider.addresses()[0].allocation_id.clone();
    provider.fail_times(Operation::ReleaseAddress, ProviderError::in_use(id.as_str()), 2);

    svc.release_instance_address("i-1").await.unwrap();
    assert_eq!(
        provider.operations(),
        vec![
            Operation::DescribeAddresses,
            Operation::DisassociateAddress,
            Operation::ReleaseAddress,
            Operation::DisassociateAddress,
            Operation::ReleaseAddress,
            Operation::DisassociateAddress,
            Operation::ReleaseAddress,
        ]
    );
}

#[tokio::test]
async fn test_release_stops_when_inline_disassociate_fails() {
    let provider = Arc::new(MemoryProvider::new());
    let (svc, _) = service(provider.clone(), EipConfig::new("prod"));
    svc.reconcile_instance_address("i-1").await.unwrap();

    let id = provider.addresses()[0].allocation_id.clone();
    provider.fail_times(Operation::ReleaseAddress, ProviderError::in_use(id.as_str()), 5);
    provider.pass_next(Operation::DisassociateAddress);
    provider.fail_next(
        Operation::DisassociateAddress,
        ProviderError::api("UnauthorizedOperation", "not allowed"),
    );

    let err = svc.release_instance_address("i-1").await.unwrap_err();
    assert_matches!(err, EipError::StillAssociated { .. });
    assert_eq!(provider.count(Operation::ReleaseAddress), 1);
    assert!(provider.get(&id).is_some());
}

#[tokio::test]
async fn test_bulk_release_is_fail_fast() {
    let provider = Arc::new(MemoryProvider::new());
    let (svc, _) = service(provider.clone(), EipConfig::new("prod"));
    let ids = svc.get_or_allocate_addresses(3, "worker").await.unwrap();

    provider.pass_next(Operation::ReleaseAddress);
    provider.fail_next(
        Operation::ReleaseAddress,
        ProviderError::api("UnauthorizedOperation", "not allowed"),
    );

    let err = svc.release_address_by_role("worker").await.unwrap_err();
    assert_matches!(
        err,
        EipError::Release { source: WaitError::Terminal(_), ref allocation_id, .. }
            if *allocation_id == ids[1]
    );
    assert_eq!(provider.count(Operation::ReleaseAddress), 2);
    assert!(provider.get(&ids[0]).is_none());
    assert!(provider.get(&ids[2]).is_some());

    // Calling again finishes the job.
    svc.release_address_by_role("worker").await.unwrap();
    assert!(provider.addresses().is_empty());
}

#[tokio::test]
async fn test_provider_error_is_reachable_from_every_failure() {
    let provider = Arc::new(MemoryProvider::new());
    provider.fail_next(Operation::DescribeAddresses, ProviderError::auth_failure());
    let (svc, _) = service(provider, EipConfig::new("prod"));

    let err = svc.get_or_allocate_addresses(1, "lb").await.unwrap_err();
    assert!(err.provider_error().unwrap().is_code(tether_provider::codes::AUTH_FAILURE));
}
