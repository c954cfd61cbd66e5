//! Address lifecycle metrics

use metrics::Counter;

/// Address lifecycle metrics
#[derive(Clone, Debug)]
pub struct EipMetrics {
    /// Number of free addresses handed out again instead of allocating
    pub(crate) reused_total: Counter,
    /// Number of newly allocated addresses
    pub(crate) allocated_total: Counter,
    /// Number of allocations that fell back from an exhausted pool to the provider pool
    pub(crate) pool_fallback_total: Counter,
    /// Number of released addresses
    pub(crate) released_total: Counter,
    /// Number of release attempts retried after a retryable error
    pub(crate) release_retries_total: Counter,
}

impl Default for EipMetrics {
    fn default() -> Self {
        Self {
            reused_total: metrics::counter!("eip.addresses.reused_total"),
            allocated_total: metrics::counter!("eip.addresses.allocated_total"),
            pool_fallback_total: metrics::counter!("eip.addresses.pool_fallback_total"),
            released_total: metrics::counter!("eip.addresses.released_total"),
            release_retries_total: metrics::counter!("eip.addresses.release_retries_total"),
        }
    }
}

impl EipMetrics {
    pub(crate) fn inc_reused(&self, n: usize) {
        self.reused_total.increment(n as u64);
    }

    pub(crate) fn inc_allocated(&self) {
        self.allocated_total.increment(1);
    }

    pub(crate) fn inc_pool_fallback(&self) {
        self.pool_fallback_total.increment(1);
    }

    pub(crate) fn inc_released(&self) {
        self.released_total.increment(1);
    }

    pub(crate) fn inc_release_retries(&self) {
        self.release_retries_total.increment(1);
    }
}
