//! Test doubles for the collaborator ports.

use std::sync::{
    Mutex, PoisonError,
    atomic::{AtomicI64, AtomicU64, Ordering},
};
use std::time::Duration;

use async_trait::async_trait;
use stager_model::{TaskGuid, UnixNanos};

use crate::ports::{Clock, ControlPlaneClient, DeliveryError, MetricsSink};

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn new(now: UnixNanos) -> Self {
        Self(AtomicI64::new(now))
    }

    pub fn advance(&self, by: Duration) {
        let nanos = UnixNanos::try_from(by.as_nanos()).unwrap_or(UnixNanos::MAX);
        self.0.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_unix_nanos(&self) -> UnixNanos {
        self.0.load(Ordering::SeqCst)
    }
}

/// Control-plane client that records every delivery and answers with a canned result.
#[derive(Debug, Default)]
pub struct RecordingClient {
    calls: Mutex<Vec<(TaskGuid, Vec<u8>)>>,
    fail_with: Mutex<Option<DeliveryError>>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following delivery fail with `err`.
    pub fn fail_with(&self, err: DeliveryError) {
        *self.fail_with.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
    }

    pub fn calls(&self) -> Vec<(TaskGuid, Vec<u8>)> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Deliveries decoded as JSON, in order.
    pub fn payloads(&self) -> Vec<serde_json::Value> {
        self.calls()
            .into_iter()
            .filter_map(|(_, body)| serde_json::from_slice(&body).ok())
            .collect()
    }
}

#[async_trait]
impl ControlPlaneClient for RecordingClient {
    async fn deliver(&self, guid: &TaskGuid, payload: Vec<u8>) -> Result<(), DeliveryError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((guid.clone(), payload));
        match self
            .fail_with
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Metrics sink that keeps counters and the last reported durations.
#[derive(Debug, Default)]
pub struct RecordingMetrics {
    succeeded: AtomicU64,
    failed: AtomicU64,
    failed_to_resolve: AtomicU64,
    last_succeeded: Mutex<Option<Duration>>,
    last_failed: Mutex<Option<Duration>>,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn succeeded_count(&self) -> u64 {
        self.succeeded.load(Ordering::SeqCst)
    }

    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn failed_to_resolve_count(&self) -> u64 {
        self.failed_to_resolve.load(Ordering::SeqCst)
    }

    pub fn last_succeeded_duration(&self) -> Option<Duration> {
        *self
            .last_succeeded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn last_failed_duration(&self) -> Option<Duration> {
        *self.last_failed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MetricsSink for RecordingMetrics {
    fn staging_succeeded(&self, elapsed: Duration) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
        *self
            .last_succeeded
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(elapsed);
    }

    fn staging_failed(&self, elapsed: Duration) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        *self.last_failed.lock().unwrap_or_else(PoisonError::into_inner) = Some(elapsed);
    }

    fn failed_to_resolve(&self) {
        self.failed_to_resolve.fetch_add(1, Ordering::SeqCst);
    }
}
