//! Control-plane client: posts staging results back to the cloud controller.

mod config;
pub use config::{CcClientConfig, DEFAULT_TIMEOUT};

mod error;
pub use error::ClientError;

mod client;
pub use client::CcClient;
