use std::time::Duration;

use url::Url;

use crate::error::ClientError;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CcClientConfig {
    /// Internal API base of the cloud controller.
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Whole-request timeout for one delivery.
    pub timeout: Duration,
}

impl Default for CcClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9022".to_string(),
            username: None,
            password: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CcClientConfig {
    pub fn validate(&self) -> Result<(), ClientError> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| ClientError::InvalidConfig(format!("base url {:?}: {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::InvalidConfig(format!(
                "base url scheme must be http or https, got {:?}",
                url.scheme()
            )));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::InvalidConfig("timeout must be greater than zero".into()));
        }
        if self.password.is_some() && self.username.is_none() {
            return Err(ClientError::InvalidConfig("password set without username".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(CcClientConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let bad = [
            CcClientConfig {
                base_url: "ftp://cc".into(),
                ..CcClientConfig::default()
            },
            CcClientConfig {
                base_url: "not a url".into(),
                ..CcClientConfig::default()
            },
            CcClientConfig {
                timeout: Duration::ZERO,
                ..CcClientConfig::default()
            },
            CcClientConfig {
                password: Some("secret".into()),
                ..CcClientConfig::default()
            },
        ];
        for cfg in bad {
            assert!(matches!(cfg.validate(), Err(ClientError::InvalidConfig(_))), "{cfg:?}");
        }
    }
}
