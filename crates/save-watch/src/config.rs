use std::time::Duration;

/// Timing and size limits of a supervised run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverConfig {
    /// Events this soon after launch are startup noise.
    pub grace: Duration,
    /// Extra wait after exit for in-flight events.
    pub quiesce: Duration,
    /// Interval between process liveness checks.
    pub poll_interval: Duration,
    /// Upper bound on the watched run.
    pub max_wait: Duration,
    /// Most directories returned.
    pub max_results: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(2),
            quiesce: Duration::from_secs(2),
            poll_interval: Duration::from_secs(2),
            max_wait: Duration::from_secs(300),
            max_results: 20,
        }
    }
}
