use stager_core::{BuildError, CompletionError, DeliveryError, StageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// The control plane answered the delivery with a non-success status.
    #[error("control plane responded with status {0}")]
    Upstream(u16),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CompletionError> for ApiError {
    fn from(err: CompletionError) -> Self {
        match err {
            CompletionError::UnknownLifecycle(_) => ApiError::NotFound(err.to_string()),
            CompletionError::GuidMismatch { .. }
            | CompletionError::InvalidAnnotation(_)
            | CompletionError::Translate(_) => ApiError::InvalidRequest(err.to_string()),
            CompletionError::Deliver(DeliveryError::BadResponse { status }) => {
                ApiError::Upstream(status)
            }
            CompletionError::Deliver(DeliveryError::Transport(msg)) => ApiError::Unavailable(msg),
            CompletionError::Encode(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<StageError> for ApiError {
    fn from(err: StageError) -> Self {
        match err {
            StageError::Build(BuildError::MissingIdentity | BuildError::NoCompilerForStack(_)) => {
                ApiError::InvalidRequest(err.to_string())
            }
            StageError::Build(BuildError::ArtifactLocationUnavailable(_)) | StageError::Submit(_) => {
                ApiError::Unavailable(err.to_string())
            }
        }
    }
}

#[cfg(feature = "http")]
impl axum::response::IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream(code) => {
                StatusCode::from_u16(*code).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::debug!(status = status.as_u16(), error = %self, "request failed");
        status.into_response()
    }
}
