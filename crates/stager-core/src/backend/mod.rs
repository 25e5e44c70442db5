//! Lifecycle backends: translate a completed fleet task into a control-plane response.

mod buildpack;
pub use buildpack::BuildpackBackend;

mod docker;
pub use docker::DockerBackend;

mod router;
pub use router::{BackendRouter, RouterError};

use stager_model::{CompletedTask, Lifecycle, StagingResponse, StagingTaskAnnotation};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranslateError {
    #[error("invalid annotation: {0}")]
    InvalidAnnotation(String),

    #[error("invalid result: {0}")]
    InvalidResult(String),
}

/// One staging lifecycle.
///
/// Implementations are pure: no I/O, no clock.
pub trait Backend: Send + Sync + 'static {
    fn lifecycle(&self) -> Lifecycle;

    /// Task domain this backend's tasks are submitted under.
    fn task_domain(&self) -> &str;

    fn build_response(&self, task: &CompletedTask) -> Result<StagingResponse, TranslateError>;
}

/// App and task identities recovered from the annotation.
pub(crate) fn identities(annotation: &str) -> Result<(String, String), TranslateError> {
    let ann = StagingTaskAnnotation::parse(annotation)
        .map_err(|e| TranslateError::InvalidAnnotation(e.to_string()))?;

    match (ann.app_id, ann.task_id) {
        (Some(app_id), Some(task_id)) if !app_id.is_empty() && !task_id.is_empty() => {
            Ok((app_id, task_id))
        }
        _ => Err(TranslateError::InvalidAnnotation(
            "app_id and task_id are required".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identities_require_both_ids() {
        assert_eq!(
            identities(r#"{"app_id":"a","task_id":"t"}"#).unwrap(),
            ("a".to_string(), "t".to_string())
        );
        assert!(matches!(
            identities(r#"{"app_id":"a"}"#),
            Err(TranslateError::InvalidAnnotation(_))
        ));
        assert!(matches!(
            identities(r#"{"app_id":"","task_id":"t"}"#),
            Err(TranslateError::InvalidAnnotation(_))
        ));
        assert!(matches!(
            identities("not json"),
            Err(TranslateError::InvalidAnnotation(_))
        ));
        assert!(matches!(
            identities(r#"["buildpack","a","t"]"#),
            Err(TranslateError::InvalidAnnotation(_))
        ));
    }
}
