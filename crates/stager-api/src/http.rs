use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
};
use serde::{Serialize, de::DeserializeOwned};
use stager_model::{CompletedTask, StagingRequest, TaskGuid};
use tracing::debug;

use crate::{error::ApiError, handler::ApiHandler};

/// HTTP API service builder.
pub struct HttpApi<H> {
    handler: Arc<H>,
}

impl<H> HttpApi<H>
where
    H: ApiHandler,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    /// Build axum router with mounted endpoints.
    ///
    /// Routes:
    /// - PUT /v1/staging/{guid} - Stage an application
    /// - POST /v1/staging/{guid}/completed - Report a completed staging task
    pub fn router(self) -> Router {
        Router::new()
            .route("/v1/staging/{guid}", put(stage::<H>))
            .route("/v1/staging/{guid}/completed", post(staging_completed::<H>))
            .with_state(self.handler)
    }
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct StageResponse {
    task_guid: String,
}

/// Bodies are decoded by hand so that any malformed payload is a plain 400.
fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidRequest(format!("malformed body: {e}")))
}

// ============================================================================
// Handlers
// ============================================================================

/// PUT /v1/staging/{guid}
async fn stage<H>(
    State(handler): State<Arc<H>>,
    Path(guid): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let request: StagingRequest = decode(&body)?;
    debug!(task_id = %guid, app_id = %request.app_id, "staging request received");

    let task_guid = handler.stage(&guid, request).await?;

    let response = StageResponse {
        task_guid: task_guid.to_string(),
    };
    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// POST /v1/staging/{guid}/completed
async fn staging_completed<H>(
    State(handler): State<Arc<H>>,
    Path(guid): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError>
where
    H: ApiHandler,
{
    let task: CompletedTask = decode(&body)?;
    let guid = TaskGuid::from(guid);
    debug!(%guid, failed = task.failed, "staging completion received");

    handler.staging_completed(&guid, task).await?;
    Ok(StatusCode::OK)
}
