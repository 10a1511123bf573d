use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
/// Waits between UI actions. Every wait gives way to cancellation.
pub struct Pacing {}

impl Pacing {
    pub fn new() -> Self {
        Self {}
    }

    /// Random duration between `min` and `max` milliseconds, inclusive.
    pub fn pick(&self, min: u64, max: u64) -> Duration {
        if min >= max {
            return Duration::from_millis(min);
        }
        let mut rng = OsRng;
        Duration::from_millis(rng.gen_range(min..=max))
    }

    /// Random count between `min` and `max`, inclusive.
    pub fn pick_count(&self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        let mut rng = OsRng;
        rng.gen_range(min..=max)
    }

    /// Sleep for `duration`. Returns `false` if `cancel` fired first.
    pub async fn pause(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        if duration.is_zero() {
            return !cancel.is_cancelled();
        }
        tokio::select! {
            _ = cancel.cancelled() => false,
            _ = sleep(duration) => true,
        }
    }
}
