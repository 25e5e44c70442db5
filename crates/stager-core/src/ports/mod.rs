//! Collaborators the stager talks to but does not own.

mod coordinator;
pub use coordinator::{CompletionWatch, CoordinatorError, FleetCoordinator};

mod control_plane;
pub use control_plane::{ControlPlaneClient, DeliveryError};

mod metrics;
pub use metrics::{MetricsSink, NoopMetrics};
pub(crate) use metrics::record_outcome;

mod clock;
pub use clock::{Clock, SystemClock};
pub(crate) use clock::elapsed_since;
