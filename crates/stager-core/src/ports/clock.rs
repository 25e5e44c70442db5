use std::time::{Duration, SystemTime, UNIX_EPOCH};

use stager_model::UnixNanos;

pub trait Clock: Send + Sync + 'static {
    fn now_unix_nanos(&self) -> UnixNanos;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix_nanos(&self) -> UnixNanos {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| UnixNanos::try_from(d.as_nanos()).unwrap_or(UnixNanos::MAX))
            .unwrap_or(0)
    }
}

/// Time since `created_at`; zero when the timestamp lies in the future.
pub(crate) fn elapsed_since(clock: &dyn Clock, created_at: UnixNanos) -> Duration {
    let delta = clock.now_unix_nanos().saturating_sub(created_at);
    Duration::from_nanos(u64::try_from(delta).unwrap_or(0))
}
