//! Tunables of the engine cycles.

use chrono::Duration;

use stovepanel_domain::pid::DEFAULT_INTEGRAL_LIMIT;

/// Cycle tunables. None of these are invariants; the binary reads them
/// from configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Minimum time between two boost applications.
    pub min_reapply_interval: Duration,
    /// How long coordination stays paused after a manual override.
    pub pause_duration: Duration,
    /// End time handed to thermostats for a boosted setpoint.
    pub boost_max_duration: Duration,
    /// Upper bound for a whole coordination cycle.
    pub cycle_timeout: std::time::Duration,
    /// Cadence of the power-control cycle.
    pub control_interval: Duration,
    /// Anti-windup bound for the raw PID integral.
    pub integral_limit: f64,
    /// Controller memory older than this many intervals is discarded.
    pub stale_intervals: i32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            min_reapply_interval: Duration::minutes(5),
            pause_duration: Duration::minutes(30),
            boost_max_duration: Duration::hours(4),
            cycle_timeout: std::time::Duration::from_secs(25),
            control_interval: Duration::minutes(5),
            integral_limit: DEFAULT_INTEGRAL_LIMIT,
            stale_intervals: 3,
        }
    }
}

impl EngineSettings {
    /// Age beyond which persisted PID state counts as a cold start.
    #[must_use]
    pub fn pid_state_max_age(&self) -> Duration {
        self.control_interval * self.stale_intervals
    }
}
