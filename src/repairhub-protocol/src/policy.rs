//! Session timeout policy.

use std::time::Duration;

/// Idle timeout configuration for a tab's session.
///
/// The defaults are the production values: a 30 minute total timeout with
/// a 2 minute warning window and a once-per-second countdown. Tests and
/// embedders inject tighter values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Total idle timeout `T`. The session expires after this much
    /// inactivity.
    pub total_timeout: Duration,
    /// Warning lead time `W`. The warning fires at `T - W` and the visible
    /// countdown starts at `W`.
    pub warning_lead: Duration,
    /// Granularity of the visible countdown.
    pub countdown_tick: Duration,
    /// Consecutive refresh failures tolerated before the controller
    /// escalates to a forced logout.
    pub max_refresh_failures: u32,
}

impl SessionPolicy {
    /// Delay from (re)arming until the warning fires: `T - W`.
    pub fn warning_delay(&self) -> Duration {
        self.total_timeout.saturating_sub(self.warning_lead)
    }

    /// Seconds shown when the countdown starts.
    pub fn countdown_start_secs(&self) -> u64 {
        self.warning_lead.as_secs()
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            total_timeout: Duration::from_secs(30 * 60),
            warning_lead: Duration::from_secs(2 * 60),
            countdown_tick: Duration::from_secs(1),
            max_refresh_failures: 3,
        }
    }
}
