//! Prometheus metrics for the stager.
//!
//! [`PrometheusMetrics`] implements [`stager_core::MetricsSink`]; hand it to the dispatcher and
//! the completion service, then expose [`PrometheusMetrics::encode_text`] on `/metrics`.
//!
//! ## Metrics
//! - `stager_staging_requests_succeeded_total` - Counter
//! - `stager_staging_requests_failed_total` - Counter
//! - `stager_staging_failed_to_resolve_total` - Counter
//! - `stager_staging_request_succeeded_duration_nanoseconds` - Gauge, last observed
//! - `stager_staging_request_failed_duration_nanoseconds` - Gauge, last observed

mod backend;
pub use backend::{MetricsError, PrometheusMetrics};

pub use prometheus::{Encoder, Registry, TextEncoder};
