use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tether_provider::AddressProvider;
use tether_wait::Backoff;
use tracing::{Instrument, Span, info_span};

use crate::config::EipConfig;
use crate::events::{EventRecorder, TracingEventRecorder};
use crate::metrics::EipMetrics;
use crate::scope::{ClusterScope, EipScope, ScopeStage};

/// Elastic address service for one cluster.
///
/// Holds no mutable state: every operation re-reads the provider, so the
/// service is cheap to share between tasks.
pub struct ElasticIpService {
    pub(crate) provider: Arc<dyn AddressProvider>,
    pub(crate) scope: Arc<dyn EipScope>,
    pub(crate) events: Arc<dyn EventRecorder>,
    pub(crate) backoff: Backoff,
    pub(crate) metrics: EipMetrics,
}

impl fmt::Debug for ElasticIpService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElasticIpService")
            .field("scope", &self.scope)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl ElasticIpService {
    pub fn new(provider: Arc<dyn AddressProvider>, scope: Arc<dyn EipScope>) -> Self {
        Self {
            provider,
            scope,
            events: Arc::new(TracingEventRecorder),
            backoff: Backoff::default(),
            metrics: EipMetrics::default(),
        }
    }

    /// Service over a [`ClusterScope`] built from `config`, using its retry schedule.
    pub fn from_config(
        provider: Arc<dyn AddressProvider>,
        stage: ScopeStage,
        config: EipConfig,
    ) -> Self {
        let backoff = config.retry.backoff();
        Self::new(provider, Arc::new(ClusterScope::new(stage, config))).with_backoff(backoff)
    }

    pub fn with_events(mut self, events: Arc<dyn EventRecorder>) -> Self {
        self.events = events;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn cluster_name(&self) -> &str {
        self.scope.cluster_name()
    }

    pub fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    pub(crate) fn warn_event(&self, reason: &str, message: &str) {
        self.events.warn(self.scope.infra_cluster(), reason, message);
    }

    pub(crate) fn normal_event(&self, reason: &str, message: &str) {
        self.events
            .event(self.scope.infra_cluster(), reason, message);
    }

    fn span(&self) -> Span {
        info_span!(
            "eip",
            cluster = self.scope.cluster_name(),
            stage = %self.scope.stage()
        )
    }

    /// Runs `fut` inside the service span.
    pub(crate) fn in_span<F: Future>(&self, fut: F) -> tracing::instrument::Instrumented<F> {
        fut.instrument(self.span())
    }
}
