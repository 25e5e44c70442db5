use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid client config: {0}")]
    InvalidConfig(String),

    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}
