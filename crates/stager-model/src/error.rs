use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("missing app id")]
    MissingAppId,
    #[error("unknown lifecycle: {0}")]
    UnknownLifecycle(String),
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition {
        from: crate::TaskState,
        to: crate::TaskState,
    },
}
