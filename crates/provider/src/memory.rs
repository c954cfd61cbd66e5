//! In-memory provider (does not persist across restarts).
//!
//! Models the parts of provider behaviour the service depends on: releasing an
//! attached address fails with "in use", disassociating a vanished association
//! fails with "not found", and bring-your-own pools run out. Faults can be
//! scripted per operation, and every call is journaled for assertions.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::net::{IpAddr, Ipv4Addr};

use async_trait::async_trait;
use parking_lot::Mutex;
use strum::Display;
use tether_primitives::{
    AddressRecord, AllocationId, AssociationId, Filter, PoolId, ResourceType, Tags,
};
use tracing::trace;

use crate::codes;
use crate::error::ProviderError;
use crate::traits::AddressProvider;
use crate::types::{
    AllocateRequest, AllocatedAddress, AssociateRequest, AssociationTarget, PublicIpv4Pool,
};

/// Provider API operation, used to script faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Operation {
    DescribeAddresses,
    AllocateAddress,
    AssociateAddress,
    DisassociateAddress,
    ReleaseAddress,
    DescribePublicIpv4Pools,
}

/// Journal entry for one provider call, recorded before faults are applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    DescribeAddresses { filters: Vec<Filter> },
    AllocateAddress { pool: Option<PoolId>, tags: Tags },
    AssociateAddress { allocation_id: AllocationId, target: AssociationTarget },
    DisassociateAddress { association_id: AssociationId },
    ReleaseAddress { allocation_id: AllocationId },
    DescribePublicIpv4Pools { pool_ids: Vec<PoolId> },
}

impl Call {
    pub fn operation(&self) -> Operation {
        match self {
            Self::DescribeAddresses { .. } => Operation::DescribeAddresses,
            Self::AllocateAddress { .. } => Operation::AllocateAddress,
            Self::AssociateAddress { .. } => Operation::AssociateAddress,
            Self::DisassociateAddress { .. } => Operation::DisassociateAddress,
            Self::ReleaseAddress { .. } => Operation::ReleaseAddress,
            Self::DescribePublicIpv4Pools { .. } => Operation::DescribePublicIpv4Pools,
        }
    }
}

#[derive(Debug, Default)]
struct PoolState {
    total: u64,
    available: u64,
}

#[derive(Debug)]
struct Entry {
    record: AddressRecord,
    pool: Option<PoolId>,
    target: Option<AssociationTarget>,
}

#[derive(Debug, Default)]
struct State {
    /// Keyed by zero-padded ids, so iteration follows allocation order.
    addresses: BTreeMap<AllocationId, Entry>,
    associations: HashMap<AssociationId, AllocationId>,
    pools: HashMap<PoolId, PoolState>,
    next_id: u64,
    /// `None` entries let one call through before the next scripted fault.
    faults: HashMap<Operation, VecDeque<Option<ProviderError>>>,
    journal: Vec<Call>,
}

impl State {
    fn record(&mut self, call: Call) -> Result<(), ProviderError> {
        let op = call.operation();
        trace!(%op, "provider call");
        self.journal.push(call);
        match self.faults.get_mut(&op).and_then(VecDeque::pop_front) {
            Some(Some(err)) => Err(err),
            _ => Ok(()),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory provider for testing and local runs.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    state: Mutex<State>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bring-your-own pool with `available` free addresses.
    pub fn with_pool(self, pool_id: impl Into<PoolId>, available: u64) -> Self {
        self.set_pool_available(pool_id, available);
        self
    }

    pub fn set_pool_available(&self, pool_id: impl Into<PoolId>, available: u64) {
        let mut state = self.state.lock();
        let pool = state.pools.entry(pool_id.into()).or_default();
        pool.available = available;
        pool.total = pool.total.max(available);
    }

    pub fn pool_available(&self, pool_id: &PoolId) -> Option<u64> {
        self.state.lock().pools.get(pool_id).map(|p| p.available)
    }

    /// Inserts an address as if someone else had created it.
    pub fn insert(&self, record: AddressRecord) -> AddressRecord {
        let mut state = self.state.lock();
        let target = record.association_id.clone().map(|assoc| {
            state
                .associations
                .insert(assoc, record.allocation_id.clone());
            AssociationTarget::Instance(format!("i-external-{}", record.allocation_id))
        });
        state.addresses.insert(
            record.allocation_id.clone(),
            Entry {
                record: record.clone(),
                pool: None,
                target,
            },
        );
        record
    }

    /// Drops an association behind the caller's back, as another controller would.
    pub fn detach_externally(&self, allocation_id: &AllocationId) {
        let mut state = self.state.lock();
        let Some(entry) = state.addresses.get_mut(allocation_id) else {
            return;
        };
        entry.target = None;
        if let Some(assoc) = entry.record.association_id.take() {
            state.associations.remove(&assoc);
        }
    }

    /// Fails the next call of `op` with `err`.
    pub fn fail_next(&self, op: Operation, err: ProviderError) {
        self.state
            .lock()
            .faults
            .entry(op)
            .or_default()
            .push_back(Some(err));
    }

    /// Fails the next `times` calls of `op` with `err`.
    pub fn fail_times(&self, op: Operation, err: ProviderError, times: usize) {
        for _ in 0..times {
            self.fail_next(op, err.clone());
        }
    }

    /// Lets the next call of `op` through, ahead of any fault scripted after it.
    pub fn pass_next(&self, op: Operation) {
        self.state.lock().faults.entry(op).or_default().push_back(None);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().journal.clone()
    }

    pub fn count(&self, op: Operation) -> usize {
        self.state
            .lock()
            .journal
            .iter()
            .filter(|call| call.operation() == op)
            .count()
    }

    /// Operations in call order.
    pub fn operations(&self) -> Vec<Operation> {
        self.state
            .lock()
            .journal
            .iter()
            .map(Call::operation)
            .collect()
    }

    pub fn clear_journal(&self) {
        self.state.lock().journal.clear();
    }

    pub fn addresses(&self) -> Vec<AddressRecord> {
        self.state
            .lock()
            .addresses
            .values()
            .map(|e| e.record.clone())
            .collect()
    }

    pub fn get(&self, allocation_id: &AllocationId) -> Option<AddressRecord> {
        self.state
            .lock()
            .addresses
            .get(allocation_id)
            .map(|e| e.record.clone())
    }

    /// Pool the address was drawn from, `None` for the provider default pool.
    pub fn address_pool(&self, allocation_id: &AllocationId) -> Option<PoolId> {
        self.state
            .lock()
            .addresses
            .get(allocation_id)
            .and_then(|e| e.pool.clone())
    }

    pub fn target_of(&self, allocation_id: &AllocationId) -> Option<AssociationTarget> {
        self.state
            .lock()
            .addresses
            .get(allocation_id)
            .and_then(|e| e.target.clone())
    }
}

fn public_ip(n: u64, byo: bool) -> IpAddr {
    let host = (n % 254 + 1) as u8;
    let (a, b, c) = if byo { (198, 51, 100) } else { (203, 0, 113) };
    IpAddr::V4(Ipv4Addr::new(a, b, c, host))
}

#[async_trait]
impl AddressProvider for MemoryProvider {
    async fn describe_addresses(
        &self,
        filters: &[Filter],
    ) -> Result<Vec<AddressRecord>, ProviderError> {
        let mut state = self.state.lock();
        state.record(Call::DescribeAddresses {
            filters: filters.to_vec(),
        })?;

        Ok(state
            .addresses
            .values()
            .filter(|e| Filter::match_all(filters, &e.record.tags))
            .map(|e| e.record.clone())
            .collect())
    }

    async fn allocate_address(
        &self,
        request: &AllocateRequest,
    ) -> Result<AllocatedAddress, ProviderError> {
        let mut state = self.state.lock();
        state.record(Call::AllocateAddress {
            pool: request.public_ipv4_pool.clone(),
            tags: request.tag_specification.tags.clone(),
        })?;

        if request.tag_specification.resource_type != ResourceType::ElasticIp {
            return Err(ProviderError::api(
                "InvalidParameterValue",
                format!(
                    "tag specification resource type {} does not apply to addresses",
                    request.tag_specification.resource_type
                ),
            ));
        }

        if let Some(pool_id) = &request.public_ipv4_pool {
            let Some(pool) = state.pools.get_mut(pool_id) else {
                return Err(ProviderError::api(
                    codes::PUBLIC_IPV4_POOL_NOT_FOUND,
                    format!("The pool ID '{pool_id}' does not exist"),
                ));
            };
            if pool.available == 0 {
                return Err(ProviderError::api(
                    codes::INSUFFICIENT_ADDRESS_CAPACITY,
                    format!("Pool {pool_id} has no free addresses"),
                ));
            }
            pool.available -= 1;
        }

        let n = state.next_id();
        let allocation_id = AllocationId::new(format!("eipalloc-{n:08x}"));
        let public_ip = public_ip(n, request.public_ipv4_pool.is_some());
        let record = AddressRecord::new(
            allocation_id.clone(),
            public_ip,
            request.tag_specification.tags.clone(),
        );
        state.addresses.insert(
            allocation_id.clone(),
            Entry {
                record,
                pool: request.public_ipv4_pool.clone(),
                target: None,
            },
        );

        Ok(AllocatedAddress {
            allocation_id,
            public_ip,
        })
    }

    async fn associate_address(
        &self,
        request: &AssociateRequest,
    ) -> Result<AssociationId, ProviderError> {
        let mut state = self.state.lock();
        state.record(Call::AssociateAddress {
            allocation_id: request.allocation_id.clone(),
            target: request.target.clone(),
        })?;

        let n = state.next_id();
        let Some(entry) = state.addresses.get_mut(&request.allocation_id) else {
            return Err(ProviderError::api(
                codes::ALLOCATION_ID_NOT_FOUND,
                format!("The allocation ID '{}' does not exist", request.allocation_id),
            ));
        };
        if entry.record.association_id.is_some() {
            return Err(ProviderError::api(
                codes::RESOURCE_ALREADY_ASSOCIATED,
                format!("Address {} is already associated", request.allocation_id),
            ));
        }

        let association_id = AssociationId::new(format!("eipassoc-{n:08x}"));
        entry.record.association_id = Some(association_id.clone());
        entry.target = Some(request.target.clone());
        state
            .associations
            .insert(association_id.clone(), request.allocation_id.clone());

        Ok(association_id)
    }

    async fn disassociate_address(
        &self,
        association_id: &AssociationId,
    ) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        state.record(Call::DisassociateAddress {
            association_id: association_id.clone(),
        })?;

        let Some(allocation_id) = state.associations.remove(association_id) else {
            return Err(ProviderError::association_not_found(association_id.as_str()));
        };
        if let Some(entry) = state.addresses.get_mut(&allocation_id) {
            entry.record.association_id = None;
            entry.target = None;
        }
        Ok(())
    }

    async fn release_address(&self, allocation_id: &AllocationId) -> Result<(), ProviderError> {
        let mut state = self.state.lock();
        state.record(Call::ReleaseAddress {
            allocation_id: allocation_id.clone(),
        })?;

        let Some(entry) = state.addresses.get(allocation_id) else {
            return Err(ProviderError::api(
                codes::ALLOCATION_ID_NOT_FOUND,
                format!("The allocation ID '{allocation_id}' does not exist"),
            ));
        };
        if entry.record.association_id.is_some() {
            return Err(ProviderError::in_use(allocation_id.as_str()));
        }

        let pool = entry.pool.clone();
        state.addresses.remove(allocation_id);
        if let Some(pool) = pool.and_then(|id| state.pools.get_mut(&id)) {
            pool.available += 1;
        }
        Ok(())
    }

    async fn describe_public_ipv4_pools(
        &self,
        pool_ids: &[PoolId],
    ) -> Result<Vec<PublicIpv4Pool>, ProviderError> {
        let mut state = self.state.lock();
        state.record(Call::DescribePublicIpv4Pools {
            pool_ids: pool_ids.to_vec(),
        })?;

        Ok(pool_ids
            .iter()
            .filter_map(|id| {
                state.pools.get(id).map(|pool| PublicIpv4Pool {
                    pool_id: id.clone(),
                    total_address_count: pool.total,
                    total_available_address_count: pool.available,
                })
            })
            .collect())
    }
}
