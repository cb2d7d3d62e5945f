//! Controller tuning knobs.

use std::time::Duration;

/// Timing configuration for the generation controller.
#[derive(Debug, Clone, Copy)]
pub struct GenerationConfig {
    /// Pause between consecutive batch-job dispatches, so a burst of jobs
    /// does not overwhelm the backend.
    pub dispatch_delay: Duration,
    /// Interval between status reads while polling one intent.
    pub poll_interval: Duration,
    /// Maximum total wait for one intent to reach a terminal status. Past
    /// this the poll is inconclusive and the intent is left for a later
    /// resume.
    pub max_poll_wait: Duration,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            dispatch_delay: Duration::from_millis(500),
            poll_interval: Duration::from_secs(2),
            max_poll_wait: Duration::from_secs(120),
        }
    }
}

impl GenerationConfig {
    /// Near-zero delays for tests.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            dispatch_delay: Duration::from_millis(1),
            poll_interval: Duration::from_millis(1),
            max_poll_wait: Duration::from_millis(20),
        }
    }
}
