mod action;
pub use action::Action;

mod log;
pub use log::LogConfig;

mod envelope;
pub use envelope::TaskEnvelope;

mod completed;
pub use completed::CompletedTask;

mod duration_ms;
