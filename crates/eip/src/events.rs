//! Fire-and-forget event sink.
//!
//! Recorders never fail and never block the caller; whatever happens to an
//! event after `record` returns cannot change the outcome of an operation.

use parking_lot::Mutex;
use strum::Display;
use tracing::{info, warn};

use crate::scope::ObjectRef;

pub const FAILED_DESCRIBE_ADDRESSES: &str = "FailedDescribeAddresses";
pub const FAILED_ALLOCATE_ADDRESS: &str = "FailedAllocateAddress";
pub const FAILED_ALLOCATE_FROM_POOL: &str = "FailedAllocateFromPool";
pub const FAILED_DISASSOCIATE_ADDRESS: &str = "FailedDisassociateAddress";
pub const FAILED_RELEASE_ADDRESS: &str = "FailedReleaseAddress";
pub const FAILED_ASSOCIATE_ADDRESS: &str = "FailedAssociateAddress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum EventKind {
    Normal,
    Warning,
}

pub trait EventRecorder: Send + Sync {
    fn record(&self, object: &ObjectRef, kind: EventKind, reason: &str, message: &str);

    fn event(&self, object: &ObjectRef, reason: &str, message: &str) {
        self.record(object, EventKind::Normal, reason, message);
    }

    fn warn(&self, object: &ObjectRef, reason: &str, message: &str) {
        self.record(object, EventKind::Warning, reason, message);
    }
}

/// Emits events as log lines and counts them per reason.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventRecorder;

impl EventRecorder for TracingEventRecorder {
    fn record(&self, object: &ObjectRef, kind: EventKind, reason: &str, message: &str) {
        match kind {
            EventKind::Normal => info!(%object, reason, detail = message, "event"),
            EventKind::Warning => warn!(%object, reason, detail = message, "event"),
        }
        metrics::counter!(
            "eip.events_total",
            "kind" => kind.to_string(),
            "reason" => reason.to_owned()
        )
        .increment(1);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub object: ObjectRef,
    pub kind: EventKind,
    pub reason: String,
    pub message: String,
}

/// Keeps every event in memory, for tests.
#[derive(Debug, Default)]
pub struct MemoryEventRecorder {
    events: Mutex<Vec<RecordedEvent>>,
}

impl MemoryEventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().clone()
    }

    pub fn reasons(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.reason.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventRecorder for MemoryEventRecorder {
    fn record(&self, object: &ObjectRef, kind: EventKind, reason: &str, message: &str) {
        self.events.lock().push(RecordedEvent {
            object: object.clone(),
            kind,
            reason: reason.to_owned(),
            message: message.to_owned(),
        });
    }
}
