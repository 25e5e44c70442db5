use std::time::Duration;

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder, proto::MetricFamily};
use stager_core::MetricsSink;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    RegistrationFailed(#[from] prometheus::Error),

    #[error("failed to encode metrics: {0}")]
    EncodingFailed(String),
}

#[derive(Clone)]
pub struct PrometheusMetrics {
    registry: Registry,
    succeeded: IntCounter,
    failed: IntCounter,
    failed_to_resolve: IntCounter,
    succeeded_duration: IntGauge,
    failed_duration: IntGauge,
}

impl PrometheusMetrics {
    /// Metrics registered in a fresh registry.
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> Result<Self, MetricsError> {
        let succeeded = IntCounter::new(
            "stager_staging_requests_succeeded_total",
            "Staging tasks that succeeded on the fleet",
        )?;
        registry.register(Box::new(succeeded.clone()))?;

        let failed = IntCounter::new(
            "stager_staging_requests_failed_total",
            "Staging tasks that failed on the fleet",
        )?;
        registry.register(Box::new(failed.clone()))?;

        let failed_to_resolve = IntCounter::new(
            "stager_staging_failed_to_resolve_total",
            "Claimed staging tasks whose result never reached the control plane",
        )?;
        registry.register(Box::new(failed_to_resolve.clone()))?;

        let succeeded_duration = IntGauge::new(
            "stager_staging_request_succeeded_duration_nanoseconds",
            "Duration of the last successful staging task",
        )?;
        registry.register(Box::new(succeeded_duration.clone()))?;

        let failed_duration = IntGauge::new(
            "stager_staging_request_failed_duration_nanoseconds",
            "Duration of the last failed staging task",
        )?;
        registry.register(Box::new(failed_duration.clone()))?;

        Ok(Self {
            registry,
            succeeded,
            failed,
            failed_to_resolve,
            succeeded_duration,
            failed_duration,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Registry contents in the Prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.gather(), &mut buf)
            .map_err(|e| MetricsError::EncodingFailed(e.to_string()))?;
        String::from_utf8(buf).map_err(|e| MetricsError::EncodingFailed(e.to_string()))
    }
}

fn nanos(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

impl MetricsSink for PrometheusMetrics {
    fn staging_succeeded(&self, elapsed: Duration) {
        self.succeeded.inc();
        self.succeeded_duration.set(nanos(elapsed));
    }

    fn staging_failed(&self, elapsed: Duration) {
        self.failed.inc();
        self.failed_duration.set(nanos(elapsed));
    }

    fn failed_to_resolve(&self) {
        self.failed_to_resolve.inc();
    }
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics")
            .field("succeeded", &self.succeeded.get())
            .field("failed", &self.failed.get())
            .field("failed_to_resolve", &self.failed_to_resolve.get())
            .finish()
    }
}
