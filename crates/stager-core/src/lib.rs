pub mod ports;
pub use ports::{
    Clock, CompletionWatch, ControlPlaneClient, CoordinatorError, DeliveryError, FleetCoordinator,
    MetricsSink, NoopMetrics, SystemClock,
};

pub mod builder;
pub use builder::{BuildError, BuildOptions, CompilerTable, TaskBuilder};

pub mod backend;
pub use backend::{
    Backend, BackendRouter, BuildpackBackend, DockerBackend, RouterError, TranslateError,
};

mod dispatch;
pub use dispatch::{DispatchError, Dispatcher};

mod pool;
pub use pool::{PoolClosed, WorkerPool};

mod watch;
pub use watch::{CompletionWatcher, WatchError, WatcherConfig};

mod completion;
pub use completion::{CompletionError, CompletionService};

mod stager;
pub use stager::{StageError, Stager};

mod memory;
pub use memory::MemoryCoordinator;

mod config;
pub use config::{ConfigError, StagerConfig};

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
