//! Resolution of one completed staging task.

use std::sync::Arc;

use stager_model::CompletedTask;
use thiserror::Error;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{
    backend::{Backend, BackendRouter, TranslateError},
    ports::{
        Clock, ControlPlaneClient, CoordinatorError, DeliveryError, FleetCoordinator, MetricsSink,
        NoopMetrics, SystemClock, elapsed_since, record_outcome,
    },
};

#[derive(Debug, Error)]
pub enum DispatchError {
    /// Another dispatch owns the task, or the coordinator does not know it.
    #[error("mark resolving: {0}")]
    Claim(#[source] CoordinatorError),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Deliver(#[from] DeliveryError),

    #[error("mark resolved: {0}")]
    Acknowledge(#[source] CoordinatorError),
}

impl DispatchError {
    /// Task is left in `Resolving` without reaching the control plane.
    fn is_unresolved(&self) -> bool {
        matches!(
            self,
            DispatchError::Translate(_) | DispatchError::Encode(_) | DispatchError::Deliver(_)
        )
    }
}

/// Claims, translates and delivers completed tasks.
///
/// Every failure is terminal for its task and only logged; `handle` never fails.
#[derive(Clone)]
pub struct Dispatcher {
    coordinator: Arc<dyn FleetCoordinator>,
    client: Arc<dyn ControlPlaneClient>,
    backends: Arc<BackendRouter>,
    metrics: Arc<dyn MetricsSink>,
    clock: Arc<dyn Clock>,
}

impl Dispatcher {
    pub fn new(
        coordinator: Arc<dyn FleetCoordinator>,
        client: Arc<dyn ControlPlaneClient>,
        backends: Arc<BackendRouter>,
    ) -> Self {
        Self {
            coordinator,
            client,
            backends,
            metrics: Arc::new(NoopMetrics),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSink>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[instrument(level = "debug", skip_all, fields(guid = %task.task_guid, domain = %task.domain))]
    pub async fn handle(&self, task: CompletedTask) {
        let Some(backend) = self.backends.for_domain(&task.domain).cloned() else {
            trace!("not a staging domain, ignored");
            return;
        };

        let elapsed = elapsed_since(self.clock.as_ref(), task.created_at);
        record_outcome(self.metrics.as_ref(), task.failed, elapsed);

        match self.resolve(backend.as_ref(), &task).await {
            Ok(()) => info!(failed = task.failed, ?elapsed, "staging task resolved"),
            Err(e @ DispatchError::Claim(_)) => debug!(error = %e, "task not claimed"),
            Err(e) => {
                if e.is_unresolved() {
                    self.metrics.failed_to_resolve();
                    warn!(error = %e, "failed to resolve staging task");
                } else {
                    error!(error = %e, "staging result delivered but not acknowledged");
                }
            }
        }
    }

    async fn resolve(&self, backend: &dyn Backend, task: &CompletedTask) -> Result<(), DispatchError> {
        self.coordinator
            .mark_resolving(&task.task_guid)
            .await
            .map_err(DispatchError::Claim)?;

        let response = backend.build_response(task)?;
        let payload = response.to_json()?;
        self.client.deliver(&task.task_guid, payload).await?;

        self.coordinator
            .mark_resolved(&task.task_guid)
            .await
            .map_err(DispatchError::Acknowledge)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("backends", &self.backends)
            .finish_non_exhaustive()
    }
}
