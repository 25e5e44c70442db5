use async_trait::async_trait;
use stager_model::TaskGuid;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The control plane answered, but not with success.
    #[error("control plane responded with status {status}")]
    BadResponse { status: u16 },

    /// The request never produced a response (connect, timeout, IO).
    #[error("delivery failed: {0}")]
    Transport(String),
}

/// Sink for staging results on the control plane.
#[async_trait]
pub trait ControlPlaneClient: Send + Sync + 'static {
    /// Post a serialized `StagingResponse` for `guid`.
    async fn deliver(&self, guid: &TaskGuid, payload: Vec<u8>) -> Result<(), DeliveryError>;
}
