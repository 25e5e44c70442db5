//! Synchronous completion path: the fleet posts a finished task directly instead of streaming it.

use std::sync::Arc;

use stager_model::{CompletedTask, StagingTaskAnnotation, TaskGuid};
use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    backend::{BackendRouter, TranslateError},
    ports::{
        Clock, ControlPlaneClient, DeliveryError, MetricsSink, NoopMetrics, SystemClock,
        elapsed_since, record_outcome,
    },
};

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("task guid {path} does not match payload task guid {payload}")]
    GuidMismatch { path: TaskGuid, payload: TaskGuid },

    #[error("invalid annotation: {0}")]
    InvalidAnnotation(String),

    /// Annotation lifecycle is absent or has no registered backend.
    #[error("no backend for lifecycle {0:?}")]
    UnknownLifecycle(String),

    #[error(transparent)]
    Translate(#[from] TranslateError),

    #[error("encode response: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Deliver(#[from] DeliveryError),
}

#[derive(Clone)]
pub struct CompletionService {
    client: Arc<dyn ControlPlaneClient>,
    backends: Arc<BackendRouter>,
    metrics: Arc<dyn MetricsSink>,
    clock: Arc<dyn Clock>,
}

impl CompletionService {
    pub fn new(client: Arc<dyn ControlPlaneClient>, backends: Arc<BackendRouter>) -> Self {
        Self {
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

    /// Translate `task` with the backend named by its annotation and deliver the result.
    ///
    /// Metrics are recorded only after a successful delivery.
    #[instrument(level = "debug", skip_all, fields(%guid))]
    pub async fn complete(&self, guid: &TaskGuid, task: CompletedTask) -> Result<(), CompletionError> {
        if *guid != task.task_guid {
            return Err(CompletionError::GuidMismatch {
                path: guid.clone(),
                payload: task.task_guid,
            });
        }

        if task.annotation.trim().is_empty() {
            return Err(CompletionError::InvalidAnnotation("annotation is empty".into()));
        }
        let annotation = StagingTaskAnnotation::parse(&task.annotation)
            .map_err(|e| CompletionError::InvalidAnnotation(e.to_string()))?;

        let tag = annotation.lifecycle.unwrap_or_default();
        let backend = self
            .backends
            .for_lifecycle(&tag)
            .ok_or(CompletionError::UnknownLifecycle(tag))?;

        let response = backend.build_response(&task)?;
        self.client.deliver(guid, response.to_json()?).await?;

        let elapsed = elapsed_since(self.clock.as_ref(), task.created_at);
        record_outcome(self.metrics.as_ref(), task.failed, elapsed);
        info!(lifecycle = %backend.lifecycle(), failed = task.failed, ?elapsed, "staging completion delivered");
        Ok(())
    }
}

impl std::fmt::Debug for CompletionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionService")
            .field("backends", &self.backends)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{
        backend::{BuildpackBackend, DockerBackend},
        testing::{FixedClock, RecordingClient, RecordingMetrics},
    };

    const ANNOTATION: &str = r#"{"lifecycle":"buildpack","app_id":"app","task_id":"task"}"#;

    struct Fixture {
        client: Arc<RecordingClient>,
        metrics: Arc<RecordingMetrics>,
        service: CompletionService,
    }

    fn fixture() -> Fixture {
        let client = Arc::new(RecordingClient::new());
        let metrics = Arc::new(RecordingMetrics::new());
        let router = BackendRouter::new()
            .with(Arc::new(BuildpackBackend::default()))
            .and_then(|r| r.with(Arc::new(DockerBackend::default())))
            .unwrap();
        let service = CompletionService::new(client.clone(), Arc::new(router))
            .with_metrics(metrics.clone())
            .with_clock(Arc::new(FixedClock::new(10_000)));
        Fixture {
            client,
            metrics,
            service,
        }
    }

    fn task(guid: &str, annotation: &str) -> CompletedTask {
        CompletedTask {
            task_guid: TaskGuid::from(guid),
            domain: String::new(),
            created_at: 4_000,
            failed: false,
            failure_reason: String::new(),
            result: r#"{"buildpack_key":"bp1","detected_buildpack":"Ruby"}"#.into(),
            annotation: annotation.into(),
        }
    }

    #[tokio::test]
    async fn delivers_and_records_success() {
        let f = fixture();
        f.service
            .complete(&TaskGuid::from("abc"), task("abc", ANNOTATION))
            .await
            .unwrap();

        assert_eq!(f.client.call_count(), 1);
        assert_eq!(f.client.payloads()[0]["detected_buildpack"], "Ruby");
        assert_eq!(f.metrics.succeeded_count(), 1);
        assert_eq!(f.metrics.last_succeeded_duration(), Some(Duration::from_nanos(6_000)));
    }

    #[tokio::test]
    async fn failed_task_counts_as_failed_staging() {
        let f = fixture();
        let mut t = task("abc", ANNOTATION);
        t.failed = true;
        t.failure_reason = "out of memory".into();

        f.service.complete(&TaskGuid::from("abc"), t).await.unwrap();

        assert_eq!(f.metrics.failed_count(), 1);
        assert_eq!(f.metrics.succeeded_count(), 0);
        assert_eq!(f.client.payloads()[0]["error"], "out of memory");
    }

    #[tokio::test]
    async fn guid_mismatch() {
        let f = fixture();
        let err = f
            .service
            .complete(&TaskGuid::from("abc"), task("xyz", ANNOTATION))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::GuidMismatch { .. }));
        assert_eq!(f.client.call_count(), 0);
    }

    #[tokio::test]
    async fn annotation_errors() {
        let f = fixture();
        let guid = TaskGuid::from("abc");

        for bad in ["", ",goo", "[]", r#"["buildpack","app","task"]"#] {
            let err = f.service.complete(&guid, task("abc", bad)).await.unwrap_err();
            assert!(matches!(err, CompletionError::InvalidAnnotation(_)), "{bad:?}: {err}");
        }
        assert_eq!(f.client.call_count(), 0);

        let err = f
            .service
            .complete(&guid, task("abc", r#"{"app_id":"app","task_id":"task"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::UnknownLifecycle(tag) if tag.is_empty()));

        let err = f
            .service
            .complete(&guid, task("abc", r#"{"lifecycle":"windows","app_id":"a","task_id":"t"}"#))
            .await
            .unwrap_err();
        assert!(matches!(err, CompletionError::UnknownLifecycle(tag) if tag == "windows"));
        assert_eq!(f.metrics.succeeded_count(), 0);
    }

    #[tokio::test]
    async fn translation_error() {
        let f = fixture();
        let mut t = task("abc", ANNOTATION);
        t.result = "not json".into();

        let err = f.service.complete(&TaskGuid::from("abc"), t).await.unwrap_err();
        assert!(matches!(err, CompletionError::Translate(TranslateError::InvalidResult(_))));
    }

    #[tokio::test]
    async fn delivery_errors_are_surfaced() {
        let f = fixture();
        f.client.fail_with(DeliveryError::BadResponse { status: 504 });

        let err = f
            .service
            .complete(&TaskGuid::from("abc"), task("abc", ANNOTATION))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CompletionError::Deliver(DeliveryError::BadResponse { status: 504 })
        ));
        assert_eq!(f.metrics.succeeded_count(), 0);
    }
}
