use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use stager_core::{ControlPlaneClient, DeliveryError};
use stager_model::TaskGuid;
use tracing::{debug, instrument};
use url::Url;

use crate::{config::CcClientConfig, error::ClientError};

/// Delivers staging responses to `POST {base}/internal/staging/{guid}/completed`.
#[derive(Debug, Clone)]
pub struct CcClient {
    http: reqwest::Client,
    base: Url,
    username: Option<String>,
    password: Option<String>,
}

impl CcClient {
    pub fn new(config: &CcClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let base = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidConfig(e.to_string()))?;
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            http,
            base,
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn completion_url(&self, guid: &TaskGuid) -> Result<Url, DeliveryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| DeliveryError::Transport("cloud controller url cannot be a base".into()))?
            .pop_if_empty()
            .extend(["internal", "staging", guid.as_str(), "completed"]);
        Ok(url)
    }
}

#[async_trait]
impl ControlPlaneClient for CcClient {
    #[instrument(level = "debug", skip_all, fields(%guid, bytes = payload.len()))]
    async fn deliver(&self, guid: &TaskGuid, payload: Vec<u8>) -> Result<(), DeliveryError> {
        let url = self.completion_url(guid)?;

        let mut request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(user) = &self.username {
            request = request.basic_auth(user, self.password.as_ref());
        }

        let response = request
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), "cloud controller responded");
        if status != reqwest::StatusCode::OK {
            return Err(DeliveryError::BadResponse {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
