mod request;
pub use request::{Buildpack, StagingRequest};

mod annotation;
pub use annotation::StagingTaskAnnotation;

mod result;
pub use result::{DockerStagingResult, StagingResult, StartCommands};

mod response;
pub use response::{StagingOutcome, StagingResponse};
