mod error;
pub use error::ModelError;

mod domain;
pub use domain::*;

mod staging;
pub use staging::*;

mod task;
pub use task::*;
