use std::time::Duration;

/// Fire-and-forget staging metrics.
///
/// Passed explicitly to the dispatcher and the completion endpoint.
pub trait MetricsSink: Send + Sync + 'static {
    /// A staging task finished successfully on the fleet after `elapsed`.
    fn staging_succeeded(&self, elapsed: Duration);

    /// A staging task failed on the fleet after `elapsed`.
    fn staging_failed(&self, elapsed: Duration);

    /// A claimed task could not be delivered to the control plane.
    fn failed_to_resolve(&self);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsSink for NoopMetrics {
    fn staging_succeeded(&self, _elapsed: Duration) {}
    fn staging_failed(&self, _elapsed: Duration) {}
    fn failed_to_resolve(&self) {}
}

pub(crate) fn record_outcome(metrics: &dyn MetricsSink, failed: bool, elapsed: Duration) {
    if failed {
        metrics.staging_failed(elapsed);
    } else {
        metrics.staging_succeeded(elapsed);
    }
}
